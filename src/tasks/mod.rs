//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Expired-entry purge: reclaims entries the in-memory KV backend has only
//!   expired lazily

mod purge;

pub use purge::spawn_purge_task;
