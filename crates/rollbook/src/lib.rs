//! `rollbook` - student records kept in a single JSON file
//!
//! This library provides the record store (load, save, add, update, delete
//! and search over a flat file) together with the configuration, logging and
//! command-line plumbing used by the `rollbook` binary.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod record;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{validate_new_record, Record, RecordUpdate};
pub use store::{RecordMap, RecordStore, StoreStats, WriteOptions};
