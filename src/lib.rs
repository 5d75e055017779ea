//! Advancing-front surface reconstruction: per-vertex front bookkeeping,
//! deferred incidence requests and non-manifold vertex resolution.

pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod topology;

pub use error::{AfrontError, Result};
