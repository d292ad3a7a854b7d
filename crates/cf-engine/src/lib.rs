//! cf-engine: co-simulation orchestration.
//!
//! Drives a set of heterogeneous external simulation tools through the
//! three-stage lifecycle (pre-cosim, iterative co-simulation, post-cosim),
//! exchanging boundary data between them through the local filesystem until
//! every model's designated output signals agree between consecutive
//! iterations.
//!
//! External collaborators enter through three traits:
//! - [`DriverRunner`] launches one tool run and reports success or failure
//! - [`InputWriter`] materializes a model's input files with overrides
//! - [`cf_signals::SignalReader`] extracts named signals from output files

pub mod convergence;
pub mod driver;
pub mod error;
pub mod exchange;
pub mod input;
pub mod layout;
pub mod orchestrator;
pub mod overrides;
pub mod workarea;

pub use convergence::{ConvergenceHistory, TolerancePolicy};
pub use driver::{DriverRunner, ProcessDriver, ToolPaths};
pub use error::{EngineError, EngineResult};
pub use input::{Cardinality, InputWriter};
pub use layout::{FolderLayout, layout_for};
pub use orchestrator::{Orchestrator, RunOptions, RunSummary};
pub use overrides::PendingOverrides;
pub use workarea::WorkAreaLock;
