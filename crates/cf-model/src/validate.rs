//! Eager configuration validation, run before any external process launch.

use crate::schema::{CosimDefinition, Stage, ToolKind};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate model name: {name}")]
    DuplicateModel { name: String },

    #[error("Unknown target model '{target}' in {context} of model '{model}'")]
    UnknownTargetModel {
        target: String,
        model: String,
        context: String,
    },

    #[error(
        "Mismatched window_overrides lengths across cosim models: \
         '{model_a}' has {len_a}, '{model_b}' has {len_b}"
    )]
    WindowOverrideMismatch {
        model_a: String,
        len_a: usize,
        model_b: String,
        len_b: usize,
    },

    #[error("Model '{model}' is a Generic tool flagged to run but declares no work_folder")]
    GenericWithoutFolder { model: String },

    #[error("Invalid tolerance for model '{model}' signal '{signal}': {reason}")]
    InvalidTolerance {
        model: String,
        signal: String,
        reason: String,
    },
}

pub fn validate_definition(definition: &CosimDefinition) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for model in &definition.models {
        if !names.insert(&model.name) {
            return Err(ValidationError::DuplicateModel {
                name: model.name.clone(),
            });
        }
    }

    for model in &definition.models {
        for stage in [Stage::PreCosim, Stage::Cosim, Stage::PostCosim] {
            for file in model.files_to_copy_after.for_stage(stage) {
                check_target(definition, &model.name, &file.target_model, "files_to_copy_after")?;
            }
            for var in model.variables_to_copy_after.for_stage(stage) {
                check_target(
                    definition,
                    &model.name,
                    &var.target_model,
                    "variables_to_copy_after",
                )?;
            }
        }

        for check in &model.convergence_checks {
            if !(check.relative_tolerance.is_finite() && check.relative_tolerance > 0.0) {
                return Err(ValidationError::InvalidTolerance {
                    model: model.name.clone(),
                    signal: check.signal.clone(),
                    reason: "relative_tolerance must be finite and positive".to_string(),
                });
            }
            if !(check.absolute_tolerance.is_finite() && check.absolute_tolerance >= 0.0) {
                return Err(ValidationError::InvalidTolerance {
                    model: model.name.clone(),
                    signal: check.signal.clone(),
                    reason: "absolute_tolerance must be finite and non-negative".to_string(),
                });
            }
        }

        let flagged = model.run_pre_cosim || model.run_cosim || model.run_post_cosim;
        if model.tool == ToolKind::Generic && flagged && model.work_folder.is_none() {
            return Err(ValidationError::GenericWithoutFolder {
                model: model.name.clone(),
            });
        }
    }

    // Every cosim-participating model with a non-empty override list must
    // agree on the length; the agreed length is the time-window count.
    let mut first_nonempty: Option<(&str, usize)> = None;
    for model in definition.models.iter().filter(|m| m.run_cosim) {
        let len = model.window_overrides.len();
        if len == 0 {
            continue;
        }
        match first_nonempty {
            None => first_nonempty = Some((&model.name, len)),
            Some((other, other_len)) if other_len != len => {
                return Err(ValidationError::WindowOverrideMismatch {
                    model_a: other.to_string(),
                    len_a: other_len,
                    model_b: model.name.clone(),
                    len_b: len,
                });
            }
            Some(_) => {}
        }
    }

    Ok(())
}

/// Number of co-simulation time windows, derived from the per-window
/// override lists. Call after `validate_definition` so the lengths agree.
pub fn time_window_count(definition: &CosimDefinition) -> usize {
    definition
        .models
        .iter()
        .filter(|m| m.run_cosim)
        .map(|m| m.window_overrides.len())
        .max()
        .unwrap_or(0)
}

fn check_target(
    definition: &CosimDefinition,
    model: &str,
    target: &str,
    context: &str,
) -> Result<(), ValidationError> {
    if definition.model(target).is_none() {
        return Err(ValidationError::UnknownTargetModel {
            target: target.to_string(),
            model: model.to_string(),
            context: context.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn model(name: &str, tool: ToolKind) -> ModelSpec {
        ModelSpec {
            name: name.to_string(),
            tool,
            simulation_number: 0,
            run_pre_cosim: false,
            run_cosim: true,
            run_post_cosim: false,
            work_folder: None,
            files_to_copy_after: Staged::default(),
            variables_to_copy_after: Staged::default(),
            convergence_checks: vec![],
            window_overrides: vec![],
        }
    }

    fn definition(models: Vec<ModelSpec>) -> CosimDefinition {
        CosimDefinition {
            cosim_name: "RQX".to_string(),
            work_root: "/tmp/cosim".into(),
            models,
        }
    }

    #[test]
    fn accepts_minimal_definition() {
        let def = definition(vec![model("A", ToolKind::LEDET)]);
        validate_definition(&def).unwrap();
        assert_eq!(time_window_count(&def), 0);
    }

    #[test]
    fn rejects_duplicate_model_names() {
        let def = definition(vec![model("A", ToolKind::LEDET), model("A", ToolKind::PSPICE)]);
        let err = validate_definition(&def).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateModel { .. }));
    }

    #[test]
    fn rejects_unknown_exchange_target() {
        let mut a = model("A", ToolKind::LEDET);
        a.files_to_copy_after.cosim.push(FileExchange {
            source: "out.csv".to_string(),
            target_model: "missing".to_string(),
            target: None,
        });
        let err = validate_definition(&definition(vec![a])).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownTargetModel { .. }));
    }

    #[test]
    fn rejects_mismatched_window_override_lengths() {
        let mut a = model("A", ToolKind::LEDET);
        a.window_overrides = vec![OverrideSet::default(), OverrideSet::default()];
        let mut b = model("B", ToolKind::PSPICE);
        b.window_overrides = vec![OverrideSet::default()];
        let err = validate_definition(&definition(vec![a, b])).unwrap_err();
        assert!(matches!(err, ValidationError::WindowOverrideMismatch { .. }));
    }

    #[test]
    fn empty_override_list_does_not_constrain() {
        let mut a = model("A", ToolKind::LEDET);
        a.window_overrides = vec![OverrideSet::default(), OverrideSet::default()];
        let b = model("B", ToolKind::PSPICE);
        let def = definition(vec![a, b]);
        validate_definition(&def).unwrap();
        assert_eq!(time_window_count(&def), 2);
    }

    #[test]
    fn rejects_generic_without_folder() {
        let def = definition(vec![model("A", ToolKind::Generic)]);
        let err = validate_definition(&def).unwrap_err();
        assert!(matches!(err, ValidationError::GenericWithoutFolder { .. }));
    }

    #[test]
    fn rejects_nonpositive_relative_tolerance() {
        let mut a = model("A", ToolKind::PSPICE);
        a.convergence_checks.push(ConvergenceCheck {
            file: "out.csv".to_string(),
            signal: "V".to_string(),
            time_signal: None,
            relative_tolerance: 0.0,
            absolute_tolerance: 1e-6,
        });
        let err = validate_definition(&definition(vec![a])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidTolerance { .. }));
    }
}
