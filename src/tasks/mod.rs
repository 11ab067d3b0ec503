//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache sweep: removes expired entries and stale listing-index records

mod cleanup;

pub use cleanup::spawn_cleanup_task;
