pub mod manager;
pub mod migrations;

pub use manager::{ConnectionInfo, DatabaseError, DatabaseManager};
