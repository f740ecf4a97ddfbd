//! altchan/crates/ac-core/src/lib.rs
//!
//! The central domain types and interface definitions for altchan.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
