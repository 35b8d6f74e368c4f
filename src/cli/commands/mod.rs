//! CLI command implementations.

pub mod init;
pub mod proxy;
pub mod registry;
pub mod repo;
pub mod resolve;
pub mod space;
pub mod watch;
