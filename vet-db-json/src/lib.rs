//! Flat-file JSON storage for the estimate book.
//!
//! Each resource is one JSON document in the data directory:
//!
//! | file             | contents                                  |
//! |------------------|-------------------------------------------|
//! | `company.json`   | the clinic profile (object)               |
//! | `estimates.json` | every estimate (array)                    |
//! | `sequence.json`  | `{"lastEstimateNumber": n}`               |
//!
//! A missing file reads as an absent profile or an empty collection.
//! Creating an estimate writes `sequence.json` before `estimates.json`.

mod factory;
mod repository;

pub use factory::JsonFileRepositoryFactory;
pub use repository::JsonFileRepository;
