//! Driver boundary: launching one external tool run.

use crate::error::{EngineError, EngineResult};
use crate::layout::field_solver_input_name;
use cf_core::Nsti;
use cf_model::{ModelSpec, ToolKind};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Launch the tool of `model` in `folder` and wait for it.
///
/// Implementations must report failure explicitly; the orchestrator never
/// proceeds to data exchange or convergence evaluation after a failed run.
pub trait DriverRunner {
    fn run(&self, model: &ModelSpec, folder: &Path, nsti: Nsti) -> EngineResult<()>;
}

/// Executable locations for the supported tools, typically read from a
/// user-level settings file.
#[derive(Clone, Debug, Default)]
pub struct ToolPaths {
    pub fiqus: Option<PathBuf>,
    pub getdp: Option<PathBuf>,
    pub ledet: Option<PathBuf>,
    pub pspice: Option<PathBuf>,
    pub xyce: Option<PathBuf>,
}

/// Default driver: one blocking external process per run, exit status
/// checked.
pub struct ProcessDriver {
    pub paths: ToolPaths,
}

impl ProcessDriver {
    pub fn new(paths: ToolPaths) -> Self {
        Self { paths }
    }

    fn command(&self, model: &ModelSpec, folder: &Path, nsti: Nsti) -> EngineResult<Command> {
        let mut cmd = match model.tool {
            ToolKind::FiQuS => {
                let exe = require(&self.paths.fiqus, "FiQuS")?;
                let mut cmd = Command::new(exe);
                cmd.arg(folder.join(field_solver_input_name(&model.name, nsti)));
                if let Some(getdp) = &self.paths.getdp {
                    cmd.arg("--getdp").arg(getdp);
                }
                cmd
            }
            ToolKind::LEDET => {
                let exe = require(&self.paths.ledet, "LEDET")?;
                let mut cmd = Command::new(exe);
                // LEDET selects the simulation inside the folder by the
                // joined index.
                cmd.arg(folder).arg(&model.name).arg(nsti.joined());
                cmd
            }
            ToolKind::PSPICE => {
                let exe = require(&self.paths.pspice, "PSPICE")?;
                let mut cmd = Command::new(exe);
                cmd.arg(folder.join(format!("{}.cir", model.name)));
                cmd
            }
            ToolKind::XYCE => {
                let exe = require(&self.paths.xyce, "XYCE")?;
                let mut cmd = Command::new(exe);
                cmd.arg(folder.join(format!("{}.cir", model.name)));
                cmd
            }
            ToolKind::Generic => {
                return Err(EngineError::UnsupportedTool {
                    tool: model.tool.dir_name().to_string(),
                    what: "automated running",
                });
            }
        };
        cmd.current_dir(folder);
        Ok(cmd)
    }
}

impl DriverRunner for ProcessDriver {
    fn run(&self, model: &ModelSpec, folder: &Path, nsti: Nsti) -> EngineResult<()> {
        let mut cmd = self.command(model, folder, nsti)?;
        debug!(model = %model.name, %nsti, "launching {:?}", cmd);
        let status = cmd.status().map_err(|e| EngineError::DriverFailed {
            model: model.name.clone(),
            nsti,
            details: format!("failed to launch: {e}"),
        })?;
        if !status.success() {
            return Err(EngineError::DriverFailed {
                model: model.name.clone(),
                nsti,
                details: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

fn require<'a>(path: &'a Option<PathBuf>, tool: &'static str) -> EngineResult<&'a PathBuf> {
    path.as_ref()
        .ok_or(EngineError::MissingToolPath { tool })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(tool: ToolKind) -> ModelSpec {
        ModelSpec {
            name: "MQXA".to_string(),
            tool,
            simulation_number: 0,
            run_pre_cosim: false,
            run_cosim: false,
            run_post_cosim: false,
            work_folder: None,
            files_to_copy_after: Default::default(),
            variables_to_copy_after: Default::default(),
            convergence_checks: vec![],
            window_overrides: vec![],
        }
    }

    #[test]
    fn missing_tool_path_is_reported() {
        let driver = ProcessDriver::new(ToolPaths::default());
        let err = driver
            .command(&model(ToolKind::LEDET), Path::new("/work"), Nsti::new(1, 0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingToolPath { tool: "LEDET" }));
    }

    #[test]
    fn generic_kind_is_not_runnable() {
        let driver = ProcessDriver::new(ToolPaths::default());
        let err = driver
            .command(&model(ToolKind::Generic), Path::new("/work"), Nsti::new(1, 0, 0, 0))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedTool { .. }));
    }

    #[test]
    fn field_solver_command_points_at_input_artifact() {
        let driver = ProcessDriver::new(ToolPaths {
            fiqus: Some("/opt/fiqus".into()),
            ..ToolPaths::default()
        });
        let cmd = driver
            .command(&model(ToolKind::FiQuS), Path::new("/work/m"), Nsti::new(55, 0, 1, 2))
            .unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert!(args[0].ends_with("MQXA_55_0_1_2_FiQuS.yaml"));
    }

    #[test]
    fn nonzero_exit_is_a_driver_failure() {
        let driver = ProcessDriver::new(ToolPaths {
            // `false` exits 1 on any POSIX host.
            pspice: Some("false".into()),
            ..ToolPaths::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let err = driver
            .run(&model(ToolKind::PSPICE), dir.path(), Nsti::new(1, 0, 1, 0))
            .unwrap_err();
        match err {
            EngineError::DriverFailed { model, nsti, .. } => {
                assert_eq!(model, "MQXA");
                assert_eq!(nsti, Nsti::new(1, 0, 1, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
