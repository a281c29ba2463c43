//! cs-core: stable foundation for cosim.
//!
//! Contains:
//! - value (tagged parameter values exchanged between models)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact system ids and system/parameter keys)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod value;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
pub use value::*;
