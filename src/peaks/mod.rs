//! Peak aggregation modules
//!
//! - Incremental bucket aggregation
//! - Per-channel resumption cursors
//! - Output and metadata types

pub mod aggregator;
pub mod cursor;
pub mod output;
