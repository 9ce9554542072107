//! lion-core: shared foundation for the lion cell simulator.
//!
//! Contains:
//! - units (uom SI types, constructors, raw hot-path conversions)
//! - numeric (Real + finiteness and range checks)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{LionError, LionResult};
pub use numeric::*;
pub use units::*;
