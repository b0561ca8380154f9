//! Database access and schema initialization

pub mod init;

pub use init::*;
