//! SQL Sandbox Core
//!
//! An in-memory mock of a T-SQL server for teaching environments. Three
//! seeded databases (UniversityDB, ShopDB, LibraryDB) are queried through
//! [`SqlEngine`], which hosts reach either directly or over the C ABI in
//! [`ffi`].

#![allow(clippy::missing_safety_doc)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod ffi;
pub mod schema;
pub mod session;
pub mod sql;

pub use config::{ConfigBuilder, EngineConfig, Environment};
pub use error::{Error, ErrorKind, Result};
pub use schema::SchemaSnapshot;
pub use session::SqlEngine;
pub use sql::{QueryResult, SqlType, SqlValue};

/// Get version information
#[no_mangle]
pub extern "C" fn sqlsandbox_version() -> *const libc::c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const libc::c_char
}
