//! Per-model convergence evaluation between consecutive iterations.

use crate::error::{EngineError, EngineResult};
use crate::layout::FolderLayout;
use cf_core::{Nsti, TemplateContext, interp_onto, resolve_template};
use cf_model::{ConvergenceCheck, ModelSpec};
use cf_signals::{SignalReader, SignalRequest};
use std::collections::HashMap;
use tracing::{debug, info};

/// How the relative and absolute tolerances of a check combine.
///
/// The historical behavior is `Either`: a check passes when one of the two
/// tolerances is satisfied. That leniency is easy to mis-read as an AND, so
/// it is a named policy here rather than a hard-coded expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TolerancePolicy {
    #[default]
    Either,
    Both,
}

/// Signals observed for one check in one iteration.
#[derive(Clone, Debug)]
struct Observed {
    values: Vec<f64>,
    time: Option<Vec<f64>>,
}

/// Previous-iteration observations, per model.
///
/// Only the last iteration of the current window is retained: iteration `i`
/// is compared against `i - 1` and nothing older. Reset at every window
/// boundary.
#[derive(Debug, Default)]
pub struct ConvergenceHistory {
    slots: HashMap<String, WindowSlot>,
}

#[derive(Debug)]
struct WindowSlot {
    window: u32,
    checks: Vec<Observed>,
}

impl ConvergenceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.slots.clear();
    }
}

/// Evaluate the convergence checks of `model` for the iteration identified
/// by `nsti`, reading current outputs from the model's output folder and
/// comparing against the previous iteration recorded in `history`.
///
/// Returns whether every check passed. Zero declared checks is a vacuous
/// pass; iteration 0 of a window never passes because there is nothing to
/// compare against.
pub fn evaluate_model(
    model: &ModelSpec,
    nsti: Nsti,
    layout: &dyn FolderLayout,
    reader: &dyn SignalReader,
    policy: TolerancePolicy,
    history: &mut ConvergenceHistory,
) -> EngineResult<bool> {
    if model.convergence_checks.is_empty() {
        debug!(model = %model.name, "no convergence checks declared, vacuous pass");
        return Ok(true);
    }

    let output_folder = layout.output_folder(nsti)?;
    let ctx = TemplateContext {
        model_name: &model.name,
        nsti,
    };
    let mut current = Vec::with_capacity(model.convergence_checks.len());
    for check in &model.convergence_checks {
        let file = output_folder.join(resolve_template(&check.file, &ctx));
        let mut requests = vec![SignalRequest::one_d(&check.signal)];
        if let Some(time_signal) = &check.time_signal {
            requests.push(SignalRequest::one_d(time_signal));
        }
        let mut signals = reader.read_signals(&file, &requests)?;
        let values = signals
            .remove(&check.signal)
            .map(|d| d.as_slice().to_vec())
            .unwrap_or_default();
        let time = check
            .time_signal
            .as_ref()
            .and_then(|name| signals.remove(name))
            .map(|d| d.as_slice().to_vec());
        current.push(Observed { values, time });
    }

    let previous = history
        .slots
        .get(&model.name)
        .filter(|slot| slot.window == nsti.t);

    let verdict = match previous {
        None => {
            debug!(model = %model.name, %nsti, "first observation of this window");
            false
        }
        Some(slot) if nsti.i == 0 => {
            // A stale slot can only mean the caller skipped the window
            // reset; first iteration still cannot converge.
            debug!(model = %model.name, window = slot.window, "iteration 0, not converged");
            false
        }
        Some(slot) => {
            let mut all_pass = true;
            for (check, (cur, prev)) in model
                .convergence_checks
                .iter()
                .zip(current.iter().zip(&slot.checks))
            {
                let pass = check_passes(model, check, cur, prev, policy)?;
                debug!(
                    model = %model.name,
                    signal = %check.signal,
                    pass,
                    "convergence check evaluated"
                );
                all_pass &= pass;
            }
            all_pass
        }
    };

    history.slots.insert(
        model.name.clone(),
        WindowSlot {
            window: nsti.t,
            checks: current,
        },
    );

    info!(model = %model.name, %nsti, converged = verdict, "convergence verdict");
    Ok(verdict)
}

fn check_passes(
    model: &ModelSpec,
    check: &ConvergenceCheck,
    cur: &Observed,
    prev: &Observed,
    policy: TolerancePolicy,
) -> EngineResult<bool> {
    // With a declared time base, project the current iteration onto the
    // previous iteration's grid; the two tools' grids may legitimately
    // differ between iterations.
    let cur_values = match (&cur.time, &prev.time) {
        (Some(cur_time), Some(prev_time)) => interp_onto(cur_time, &cur.values, prev_time)?,
        _ => cur.values.clone(),
    };

    if cur_values.len() != prev.values.len() {
        return Err(EngineError::Convergence {
            model: model.name.clone(),
            signal: check.signal.clone(),
            what: format!(
                "cannot compare {} current values against {} previous values \
                 without a time signal",
                cur_values.len(),
                prev.values.len()
            ),
        });
    }

    for (&c, &p) in cur_values.iter().zip(&prev.values) {
        let abs_err = (c - p).abs();
        let abs_ok = abs_err <= check.absolute_tolerance;
        // Relative error is undefined against a zero previous value; those
        // elements are judged on the absolute tolerance alone.
        let rel_ok = if p == 0.0 {
            None
        } else {
            Some(abs_err / p.abs() < check.relative_tolerance)
        };
        let element_ok = match (policy, rel_ok) {
            (_, None) => abs_ok,
            (TolerancePolicy::Either, Some(rel_ok)) => rel_ok || abs_ok,
            (TolerancePolicy::Both, Some(rel_ok)) => rel_ok && abs_ok,
        };
        if !element_ok {
            return Ok(false);
        }
    }
    Ok(true)
}
