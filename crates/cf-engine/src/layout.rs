//! Per-tool working-folder layouts.
//!
//! The on-disk layout `{work_root}/{cosim_name}/{tool}/...` is consumed by
//! downstream tooling and must stay stable. Each tool kind has its own
//! sub-layout, kept behind [`FolderLayout`] so the quirks stay isolated.
//!
//! `input_folder` is a pure function of the NSTI and model name: inputs can
//! be generated before anything else exists on disk. `output_folder` may
//! read generated inputs back; for the field-solver kind the output location
//! depends on a run-type value stored inside the input artifact the
//! orchestrator just wrote. The two must not be conflated.

use crate::error::{EngineError, EngineResult};
use cf_core::Nsti;
use cf_model::{CosimDefinition, ModelSpec, ToolKind};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub trait FolderLayout: fmt::Debug {
    /// Folder input files are generated into. Pure in NSTI and model name.
    fn input_folder(&self, nsti: Nsti) -> PathBuf;

    /// Folder output artifacts are harvested from.
    fn output_folder(&self, nsti: Nsti) -> EngineResult<PathBuf>;
}

/// Select the layout for a model's tool kind.
pub fn layout_for(
    definition: &CosimDefinition,
    model: &ModelSpec,
) -> EngineResult<Box<dyn FolderLayout>> {
    let prefix = definition
        .work_root
        .join(&definition.cosim_name)
        .join(model.tool.dir_name());
    match model.tool {
        ToolKind::FiQuS => Ok(Box::new(FieldSolverLayout {
            prefix,
            model_name: model.name.clone(),
        })),
        ToolKind::LEDET => Ok(Box::new(LumpedElementLayout {
            prefix,
            model_name: model.name.clone(),
        })),
        ToolKind::PSPICE | ToolKind::XYCE => Ok(Box::new(CircuitSolverLayout {
            prefix,
            model_name: model.name.clone(),
            simulation_number: model.simulation_number,
        })),
        ToolKind::Generic => match &model.work_folder {
            Some(folder) => Ok(Box::new(GenericLayout {
                folder: folder.clone(),
            })),
            None => Err(EngineError::UnsupportedTool {
                tool: model.tool.dir_name().to_string(),
                what: "folder layout without a declared work_folder",
            }),
        },
    }
}

/// Name of the field-solver input artifact for one execution instance.
pub fn field_solver_input_name(model_name: &str, nsti: Nsti) -> String {
    format!("{}_{}_FiQuS.yaml", model_name, nsti.joined())
}

/// Field-solver layout: inputs land in `{prefix}/{model}`, outputs in a
/// geometry/mesh/solution chain whose segments come from the input artifact.
#[derive(Debug)]
pub struct FieldSolverLayout {
    prefix: PathBuf,
    model_name: String,
}

impl FolderLayout for FieldSolverLayout {
    fn input_folder(&self, _nsti: Nsti) -> PathBuf {
        self.prefix.join(&self.model_name)
    }

    fn output_folder(&self, nsti: Nsti) -> EngineResult<PathBuf> {
        let input_file = self
            .input_folder(nsti)
            .join(field_solver_input_name(&self.model_name, nsti));
        let content = std::fs::read_to_string(&input_file)?;
        let input: FieldSolverInput = serde_yaml::from_str(&content)?;
        let run = input.run;

        let base = self
            .input_folder(nsti)
            .join(format!("Geometry_{}", run.geometry));
        if run.run_type == "geometry_only" {
            return Ok(base);
        }
        let mesh = run.mesh.ok_or_else(|| EngineError::MissingRunField {
            model: self.model_name.clone(),
            field: "run.mesh",
        })?;
        let solution = run.solution.ok_or_else(|| EngineError::MissingRunField {
            model: self.model_name.clone(),
            field: "run.solution",
        })?;
        Ok(base
            .join(format!("Mesh_{mesh}"))
            .join(format!("Solution_{solution}")))
    }
}

/// The slice of the field-solver input file the layout needs.
#[derive(Deserialize)]
struct FieldSolverInput {
    run: FieldSolverRun,
}

#[derive(Deserialize)]
struct FieldSolverRun {
    #[serde(rename = "type")]
    run_type: String,
    geometry: Segment,
    #[serde(default)]
    mesh: Option<Segment>,
    #[serde(default)]
    solution: Option<Segment>,
}

/// Folder-name segment that may be written as a number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum Segment {
    Num(i64),
    Text(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Num(n) => write!(f, "{n}"),
            Segment::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Lumped-element layout: `{prefix}/{simulation_number}/{model}`, identical
/// for inputs and outputs.
#[derive(Debug)]
pub struct LumpedElementLayout {
    prefix: PathBuf,
    model_name: String,
}

impl FolderLayout for LumpedElementLayout {
    fn input_folder(&self, nsti: Nsti) -> PathBuf {
        self.prefix.join(nsti.n.to_string()).join(&self.model_name)
    }

    fn output_folder(&self, nsti: Nsti) -> EngineResult<PathBuf> {
        Ok(self.input_folder(nsti))
    }
}

/// Circuit-solver layout: `{prefix}/{n_s_t_i}/{model}/{simulation_number}`,
/// identical for inputs and outputs.
#[derive(Debug)]
pub struct CircuitSolverLayout {
    prefix: PathBuf,
    model_name: String,
    simulation_number: u32,
}

impl FolderLayout for CircuitSolverLayout {
    fn input_folder(&self, nsti: Nsti) -> PathBuf {
        self.prefix
            .join(nsti.joined())
            .join(&self.model_name)
            .join(self.simulation_number.to_string())
    }

    fn output_folder(&self, nsti: Nsti) -> EngineResult<PathBuf> {
        Ok(self.input_folder(nsti))
    }
}

/// Generic layout: the caller owns the folder contract.
#[derive(Debug)]
pub struct GenericLayout {
    folder: PathBuf,
}

impl FolderLayout for GenericLayout {
    fn input_folder(&self, _nsti: Nsti) -> PathBuf {
        self.folder.clone()
    }

    fn output_folder(&self, _nsti: Nsti) -> EngineResult<PathBuf> {
        Ok(self.folder.clone())
    }
}
