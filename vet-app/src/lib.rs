//! `vetquote`: command-line front end for the veterinary estimate book.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
pub mod report;
pub mod utils;
