//! SQLite storage for the estimate book.
//!
//! Money and quantities are stored as exact decimal text, timestamps as
//! RFC 3339 text. The schema lives in `migrations/` and is applied when the
//! repository is created through [`SqliteRepositoryFactory`].

mod decimal;
mod factory;
mod repository;

pub use factory::SqliteRepositoryFactory;
pub use repository::SqliteRepository;
