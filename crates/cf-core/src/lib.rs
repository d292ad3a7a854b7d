//! cf-core: stable foundation for cosimflow.
//!
//! Contains:
//! - nsti (the four-field execution-instance index)
//! - template (path template substitution)
//! - interp (linear interpolation between iteration time grids)
//! - error (shared error types)

pub mod error;
pub mod interp;
pub mod nsti;
pub mod template;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use interp::interp_onto;
pub use nsti::Nsti;
pub use template::{TemplateContext, resolve_template};
