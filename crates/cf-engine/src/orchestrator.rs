//! Stage state machine driving the whole co-simulation.

use crate::convergence::{ConvergenceHistory, TolerancePolicy, evaluate_model};
use crate::driver::DriverRunner;
use crate::error::EngineResult;
use crate::exchange::{LayoutMap, apply_file_exchanges, apply_variable_exchanges};
use crate::input::InputWriter;
use crate::layout::layout_for;
use crate::overrides::PendingOverrides;
use crate::workarea::WorkAreaLock;
use cf_core::Nsti;
use cf_model::{
    CosimDefinition, ModelSpec, Override, Stage, time_window_count, validate_definition,
};
use cf_signals::SignalReader;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Knobs for one orchestration run.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub policy: TolerancePolicy,
    /// Safety cap per time window; a window that never converges becomes a
    /// reported error instead of an endless loop.
    pub max_iterations: usize,
    pub lock_work_area: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            policy: TolerancePolicy::default(),
            max_iterations: 100,
            lock_work_area: true,
        }
    }
}

/// What a finished run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub windows: usize,
    /// Iterations each window needed to converge.
    pub iterations_per_window: Vec<u32>,
    pub model_runs: usize,
}

/// Drives the `PreRun -> CoSim(window, iteration) -> PostRun -> Done`
/// lifecycle over all configured models.
///
/// All mutable run state (NSTI cursor, pending overrides, convergence
/// history) lives in [`Orchestrator::run`]; stages and iterations never
/// execute concurrently, and every model runs strictly in declared order.
pub struct Orchestrator<'a> {
    definition: &'a CosimDefinition,
    sim_number: u32,
    driver: &'a dyn DriverRunner,
    inputs: &'a dyn InputWriter,
    reader: &'a dyn SignalReader,
    options: RunOptions,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        definition: &'a CosimDefinition,
        sim_number: u32,
        driver: &'a dyn DriverRunner,
        inputs: &'a dyn InputWriter,
        reader: &'a dyn SignalReader,
    ) -> Self {
        Self {
            definition,
            sim_number,
            driver,
            inputs,
            reader,
            options: RunOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Cooperative cancellation, checked between model runs.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn run(&self) -> EngineResult<RunSummary> {
        // Everything that can be rejected is rejected before any external
        // process launches.
        validate_definition(self.definition)?;
        let layouts = self.build_layouts()?;
        let windows = time_window_count(self.definition);

        let _lock = if self.options.lock_work_area {
            Some(WorkAreaLock::acquire(&self.definition.work_root)?)
        } else {
            None
        };

        info!(
            cosim = %self.definition.cosim_name,
            sim_number = self.sim_number,
            windows,
            "co-simulation started"
        );

        let mut pending = PendingOverrides::new();
        let mut history = ConvergenceHistory::new();
        let mut summary = RunSummary {
            windows,
            ..RunSummary::default()
        };

        // Pre-cosim stage.
        for (set, model) in self.participants(Stage::PreCosim) {
            let nsti = Nsti::new(self.sim_number, set, 0, 0);
            let overrides = pending.take(&model.name, Stage::PreCosim);
            self.run_model(model, Stage::PreCosim, nsti, &layouts, overrides, &mut pending)?;
            summary.model_runs += 1;
        }

        // Iterative co-simulation, one window at a time.
        for window in 1..=windows as u32 {
            pending.reset();
            history.reset();
            let mut iteration = 0_u32;
            loop {
                if iteration as usize >= self.options.max_iterations {
                    return Err(crate::error::EngineError::MaxIterationsExceeded {
                        window,
                        limit: self.options.max_iterations,
                    });
                }

                let mut window_converged = true;
                for (set, model) in self.participants(Stage::Cosim) {
                    let nsti = Nsti::new(self.sim_number, set, window, iteration);

                    // Static per-window overrides first, then whatever other
                    // models queued for this one.
                    let mut overrides: Vec<Override> = model
                        .window_overrides
                        .get(window as usize - 1)
                        .map(|window_set| window_set.entries.clone())
                        .unwrap_or_default();
                    overrides.extend(pending.take(&model.name, Stage::Cosim));

                    self.run_model(model, Stage::Cosim, nsti, &layouts, overrides, &mut pending)?;
                    summary.model_runs += 1;

                    let converged = evaluate_model(
                        model,
                        nsti,
                        &*layouts[&model.name],
                        self.reader,
                        self.options.policy,
                        &mut history,
                    )?;
                    // One lagging model forces another iteration for all.
                    window_converged &= converged;
                }

                info!(window, iteration, window_converged, "window iteration finished");
                if window_converged {
                    summary.iterations_per_window.push(iteration + 1);
                    break;
                }
                iteration += 1;
            }
        }

        // Post-cosim stage, fed by the tail of the last window.
        for (set, model) in self.participants(Stage::PostCosim) {
            let nsti = Nsti::new(self.sim_number, set, windows as u32 + 1, 0);
            let overrides = pending.take(&model.name, Stage::PostCosim);
            self.run_model(model, Stage::PostCosim, nsti, &layouts, overrides, &mut pending)?;
            summary.model_runs += 1;
        }

        info!(
            cosim = %self.definition.cosim_name,
            model_runs = summary.model_runs,
            "co-simulation finished"
        );
        Ok(summary)
    }

    /// Models participating in `stage`, with their model-set indices, in
    /// declared order.
    fn participants(&self, stage: Stage) -> impl Iterator<Item = (u32, &ModelSpec)> {
        self.definition
            .models
            .iter()
            .enumerate()
            .filter(move |(_, m)| m.runs_in(stage))
            .map(|(set, m)| (set as u32, m))
    }

    /// Build folder layouts for every model that runs in some stage or is
    /// addressed by an exchange directive. Fails eagerly for layouts that
    /// cannot be constructed.
    fn build_layouts(&self) -> EngineResult<LayoutMap> {
        let mut involved: HashSet<&str> = HashSet::new();
        for model in &self.definition.models {
            if model.run_pre_cosim || model.run_cosim || model.run_post_cosim {
                involved.insert(&model.name);
            }
            for stage in [Stage::PreCosim, Stage::Cosim, Stage::PostCosim] {
                for file in model.files_to_copy_after.for_stage(stage) {
                    involved.insert(&file.target_model);
                }
                for var in model.variables_to_copy_after.for_stage(stage) {
                    involved.insert(&var.target_model);
                }
            }
        }

        let mut layouts = LayoutMap::new();
        for model in &self.definition.models {
            if involved.contains(model.name.as_str()) {
                layouts.insert(model.name.clone(), layout_for(self.definition, model)?);
            }
        }
        Ok(layouts)
    }

    fn run_model(
        &self,
        model: &ModelSpec,
        stage: Stage,
        nsti: Nsti,
        layouts: &LayoutMap,
        overrides: Vec<Override>,
        pending: &mut PendingOverrides,
    ) -> EngineResult<()> {
        if let Some(cancel) = &self.cancel
            && cancel.load(Ordering::Relaxed)
        {
            return Err(crate::error::EngineError::Cancelled);
        }

        info!(model = %model.name, %stage, %nsti, "running model");
        let input_folder = layouts[&model.name].input_folder(nsti);
        std::fs::create_dir_all(&input_folder)?;

        debug!(model = %model.name, overrides = overrides.len(), "generating inputs");
        self.inputs
            .write_inputs(model, &input_folder, nsti, &overrides)?;

        // A failed driver is fatal: exchanges and convergence must never
        // see stale or partial output files.
        self.driver.run(model, &input_folder, nsti)?;

        apply_file_exchanges(self.definition, model, stage, nsti, layouts)?;
        apply_variable_exchanges(
            self.definition,
            model,
            stage,
            nsti,
            layouts,
            self.reader,
            self.inputs,
            pending,
        )?;
        Ok(())
    }
}
