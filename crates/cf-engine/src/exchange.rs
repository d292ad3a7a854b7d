//! Application of data-exchange directives after a model run.

use crate::error::{EngineError, EngineResult};
use crate::input::InputWriter;
use crate::layout::FolderLayout;
use crate::overrides::PendingOverrides;
use cf_core::{Nsti, TemplateContext, resolve_template};
use cf_model::{CosimDefinition, ModelSpec, Override, Stage};
use cf_signals::{SignalReader, SignalRequest};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Folder layouts for every model, built once at preflight.
pub type LayoutMap = HashMap<String, Box<dyn FolderLayout>>;

/// NSTI a directive's target model is addressed at.
///
/// A target declared later in execution order (set >= source set) has not
/// run yet in this iteration, so it receives the data at the current
/// iteration; a target declared earlier already ran, so it receives the
/// data for its next iteration.
pub(crate) fn target_nsti(source: Nsti, target_set: u32) -> Nsti {
    let iteration = if target_set >= source.s {
        source.i
    } else {
        source.i + 1
    };
    Nsti::new(source.n, target_set, source.t, iteration)
}

/// Copy the file artifacts declared for `stage` from the just-finished run
/// of `model` into the target models' input folders.
pub fn apply_file_exchanges(
    definition: &CosimDefinition,
    model: &ModelSpec,
    stage: Stage,
    nsti: Nsti,
    layouts: &LayoutMap,
) -> EngineResult<()> {
    let directives = model.files_to_copy_after.for_stage(stage);
    if directives.is_empty() {
        return Ok(());
    }

    let source_folder = layouts[&model.name].output_folder(nsti)?;
    let source_ctx = TemplateContext {
        model_name: &model.name,
        nsti,
    };
    for directive in directives {
        let target_set = definition
            .model_set(&directive.target_model)
            .expect("exchange targets are validated at startup");
        let target_nsti = target_nsti(nsti, target_set);
        let target_ctx = TemplateContext {
            model_name: &directive.target_model,
            nsti: target_nsti,
        };

        let from = source_folder.join(resolve_template(&directive.source, &source_ctx));
        let to = layouts[&directive.target_model]
            .input_folder(target_nsti)
            .join(resolve_template(directive.target_template(), &target_ctx));

        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent)?;
        }
        info!(from = %from.display(), to = %to.display(), "copying exchange artifact");
        std::fs::copy(&from, &to).map_err(|source| EngineError::CopyFailed {
            from: from.display().to_string(),
            to: to.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Read the signals declared for `stage` from the just-finished run of
/// `model` and queue them as pending overrides for their target models.
pub fn apply_variable_exchanges(
    definition: &CosimDefinition,
    model: &ModelSpec,
    stage: Stage,
    nsti: Nsti,
    layouts: &LayoutMap,
    reader: &dyn SignalReader,
    inputs: &dyn InputWriter,
    pending: &mut PendingOverrides,
) -> EngineResult<()> {
    let directives = model.variables_to_copy_after.for_stage(stage);
    if directives.is_empty() {
        return Ok(());
    }

    let source_folder = layouts[&model.name].output_folder(nsti)?;
    let ctx = TemplateContext {
        model_name: &model.name,
        nsti,
    };
    for directive in directives {
        let target = definition
            .model(&directive.target_model)
            .expect("exchange targets are validated at startup");
        let hint = inputs
            .declared_cardinality(target, &directive.target_attribute)?
            .shape_hint();

        let file = source_folder.join(resolve_template(&directive.file, &ctx));
        let request = SignalRequest {
            name: directive.signal.clone(),
            hint,
        };
        let mut signals = reader.read_signals(&file, std::slice::from_ref(&request))?;
        let data = signals
            .remove(&directive.signal)
            .expect("reader returns every requested signal");

        debug!(
            source = %model.name,
            target = %directive.target_model,
            attribute = %directive.target_attribute,
            "queueing variable override"
        );
        pending.push(
            &directive.target_model,
            stage,
            Override {
                path: directive.target_attribute.clone(),
                value: data.to_json(),
            },
        );
    }
    Ok(())
}
