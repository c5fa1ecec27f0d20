//! SQLite storage: schema setup and the pooled store implementation

pub mod init;
pub mod sqlite_store;

pub use init::*;
pub use sqlite_store::SqliteStore;
