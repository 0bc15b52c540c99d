//! Command handlers
//!
//! Thin request/response mapping over [`AppState`](crate::AppState), one
//! handler per API route.

pub mod operations;
pub mod remote;
pub mod repository;
