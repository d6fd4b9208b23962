//! API Routes
//!
//! Route handlers organized by functionality.

pub mod hashtags;
pub mod health;
pub mod metadata;
pub mod snapshot;
pub mod stats;
