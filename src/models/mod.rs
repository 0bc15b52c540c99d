//! Data models for Titan

pub mod commit;
pub mod operation;
pub mod remote;
pub mod repository;

pub use commit::*;
pub use operation::*;
pub use remote::*;
pub use repository::*;
