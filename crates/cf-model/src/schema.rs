//! Co-simulation configuration schema.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration document.
///
/// `models` is ordered: the declared order is the execution order within a
/// stage, and it is the orchestrator's only notion of dependency resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CosimDefinition {
    pub cosim_name: String,
    /// Root of the local working area all tool folders live under.
    pub work_root: PathBuf,
    #[serde(default)]
    pub models: Vec<ModelSpec>,
}

impl CosimDefinition {
    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// 0-based model-set index of a model, i.e. its position in declared
    /// execution order.
    pub fn model_set(&self, name: &str) -> Option<u32> {
        self.models
            .iter()
            .position(|m| m.name == name)
            .map(|p| p as u32)
    }
}

/// One participating external simulation tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    pub tool: ToolKind,
    /// Tool-local simulation number; part of the on-disk layout for the
    /// circuit-solver kinds.
    #[serde(default)]
    pub simulation_number: u32,

    #[serde(default)]
    pub run_pre_cosim: bool,
    #[serde(default)]
    pub run_cosim: bool,
    #[serde(default)]
    pub run_post_cosim: bool,

    /// Working folder for the Generic kind, whose layout is caller-defined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_folder: Option<PathBuf>,

    #[serde(default)]
    pub files_to_copy_after: Staged<FileExchange>,
    #[serde(default)]
    pub variables_to_copy_after: Staged<VariableExchange>,

    /// Only meaningful for the co-simulation stage.
    #[serde(default)]
    pub convergence_checks: Vec<ConvergenceCheck>,

    /// Static parameter overrides, one set per time window. Non-empty lists
    /// must have the same length across every model with `run_cosim` set;
    /// that common length is the number of time windows.
    #[serde(default)]
    pub window_overrides: Vec<OverrideSet>,
}

impl ModelSpec {
    pub fn runs_in(&self, stage: Stage) -> bool {
        match stage {
            Stage::PreCosim => self.run_pre_cosim,
            Stage::Cosim => self.run_cosim,
            Stage::PostCosim => self.run_post_cosim,
        }
    }
}

/// Kind of external tool a model is simulated with.
///
/// The serialized names double as the tool folder segment of the on-disk
/// layout, which downstream tooling consumes and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolKind {
    /// Field solver whose output folder depends on its own input file.
    FiQuS,
    /// Lumped-element electro-thermal solver.
    LEDET,
    /// Circuit solver (PSPICE flavor).
    PSPICE,
    /// Circuit solver (XYCE flavor).
    XYCE,
    /// Externally managed tool; folder layout and invocation are the
    /// caller's contract.
    Generic,
}

impl ToolKind {
    pub fn dir_name(&self) -> &'static str {
        match self {
            ToolKind::FiQuS => "FiQuS",
            ToolKind::LEDET => "LEDET",
            ToolKind::PSPICE => "PSPICE",
            ToolKind::XYCE => "XYCE",
            ToolKind::Generic => "Generic",
        }
    }
}

/// One of the three orchestration stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    PreCosim,
    Cosim,
    PostCosim,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Stage::PreCosim => "pre-cosim",
            Stage::Cosim => "cosim",
            Stage::PostCosim => "post-cosim",
        };
        write!(f, "{name}")
    }
}

/// A list per stage, for directives scoped to the stage they follow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Staged<T> {
    #[serde(default = "Vec::new")]
    pub pre_cosim: Vec<T>,
    #[serde(default = "Vec::new")]
    pub cosim: Vec<T>,
    #[serde(default = "Vec::new")]
    pub post_cosim: Vec<T>,
}

// Not derived: `T` itself has no reason to be `Default`.
impl<T> Default for Staged<T> {
    fn default() -> Self {
        Self {
            pre_cosim: Vec::new(),
            cosim: Vec::new(),
            post_cosim: Vec::new(),
        }
    }
}

impl<T> Staged<T> {
    pub fn for_stage(&self, stage: Stage) -> &[T] {
        match stage {
            Stage::PreCosim => &self.pre_cosim,
            Stage::Cosim => &self.cosim,
            Stage::PostCosim => &self.post_cosim,
        }
    }
}

/// Copy a whole output artifact to another model's working folder after a
/// run. Both paths are templates resolved against an NSTI context; the
/// source path is relative to the source model's output folder, the target
/// path to the target model's input folder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileExchange {
    pub source: String,
    pub target_model: String,
    /// Defaults to `source` when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl FileExchange {
    pub fn target_template(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source)
    }
}

/// Read one named signal from an output artifact and queue it as a
/// parameter override for the target model's next run in the same stage
/// category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableExchange {
    /// Template of the source file path, relative to the source model's
    /// output folder.
    pub file: String,
    pub signal: String,
    pub target_model: String,
    /// Dotted attribute path in the target model's input data.
    pub target_attribute: String,
}

/// Per-signal tolerance test comparing consecutive iterations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergenceCheck {
    /// Template of the output file path, relative to the model's output
    /// folder.
    pub file: String,
    pub signal: String,
    /// Time base of `signal`. When present, the current iteration is
    /// interpolated onto the previous iteration's grid before comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signal: Option<String>,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
}

/// A set of (attribute path, value) overrides applied when generating a
/// model's input files.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OverrideSet {
    #[serde(default)]
    pub entries: Vec<Override>,
}

/// One parameter override. Values are kept as loose JSON values since each
/// tool's input schema interprets them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Override {
    pub path: String,
    pub value: serde_json::Value,
}
