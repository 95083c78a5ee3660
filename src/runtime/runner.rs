//! Runner - dependency-ordered batch execution with tokio
//!
//! Every requested backend gets its own task and a completion signal.
//! A task first waits for the signals of its in-batch dependencies, then
//! runs, then sets its own signal whatever the outcome. Dependencies that
//! are not part of the batch are not waited on.
//!
//! There is no cycle resolution: backends in a dependency cycle never
//! start, and the batch never finishes. A warning is logged up front.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use indexmap::IndexSet;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::backend::Backend;
use crate::config::BackendSet;
use crate::dag::DependencyGraph;
use crate::store::StateStore;

use super::report::{BackendOutcome, RunReport};
use super::signal::{CompletionSignal, CompletionWaiter};

pub struct Runner {
    backends: Arc<BackendSet>,
    state: StateStore,
}

impl Runner {
    pub fn new(backends: Arc<BackendSet>, state: StateStore) -> Self {
        Self { backends, state }
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    /// Run every configured backend
    pub async fn run_all(&self) -> RunReport {
        self.run(&self.backends.names()).await
    }

    /// Run the named backends as one batch
    ///
    /// Returns once every launched task has finished. Individual failures
    /// are recorded in the report, never propagated.
    #[instrument(skip(self, names), fields(batch = names.len()))]
    pub async fn run(&self, names: &[String]) -> RunReport {
        let batch: Vec<String> = names
            .iter()
            .cloned()
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let total = batch.len();

        if total == 0 {
            info!("Nothing to run");
            return RunReport::default();
        }

        if let Err(e) = DependencyGraph::for_batch(&self.backends, &batch).detect_cycles() {
            warn!(error = %e, "Batch contains a dependency cycle; backends in it will never start");
        }

        let mut signals = Vec::with_capacity(total);
        let mut waiters: HashMap<&str, CompletionWaiter> = HashMap::with_capacity(total);
        for name in &batch {
            let (signal, waiter) = CompletionSignal::new();
            signals.push(signal);
            waiters.insert(name, waiter);
        }

        info!(backends = total, "Starting batch");
        println!("{} Running {} backends...\n", "→".cyan(), total);

        let mut join_set = JoinSet::new();
        for (name, signal) in batch.iter().zip(signals) {
            let backend = self.backends.get(name).cloned();
            if backend.is_none() {
                warn!(
                    backend = %name,
                    available = ?self.backends.names(),
                    "Backend not found"
                );
            }

            let dependencies: Vec<(String, CompletionWaiter)> = backend
                .iter()
                .flat_map(|b| b.depends().iter())
                .filter_map(|dep| waiters.get(dep.as_str()).map(|w| (dep.clone(), w.clone())))
                .collect();

            join_set.spawn(Self::run_one(
                name.clone(),
                backend,
                self.state.clone(),
                dependencies,
                signal,
            ));
        }
        drop(waiters);

        let mut report = RunReport::default();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => {
                    Self::print_progress(&outcome, report.len() + 1, total);
                    report.push(outcome);
                }
                // run_one isolates backend panics itself; this is the driver's own task
                Err(e) => error!(error = %e, "Runner task aborted"),
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.len() - report.succeeded(),
            "Batch finished"
        );
        report
    }

    /// Wait for dependencies, run, then release dependents through `signal`
    ///
    /// Every exit path sets the signal: explicitly after a run, by drop otherwise.
    async fn run_one(
        name: String,
        backend: Option<Arc<dyn Backend>>,
        state: StateStore,
        dependencies: Vec<(String, CompletionWaiter)>,
        signal: CompletionSignal,
    ) -> BackendOutcome {
        for (dependency, waiter) in dependencies {
            if !waiter.is_complete() {
                debug!(backend = %name, %dependency, "Waiting for dependency");
            }
            waiter.wait().await;
        }

        let start = Instant::now();
        let Some(backend) = backend else {
            return BackendOutcome::failed(name, "backend not configured", start.elapsed());
        };

        info!(backend = %name, "Running {}", name);
        // Separate task so a panic inside run() is caught here
        let outcome = match tokio::spawn(async move { backend.run(&state).await }).await {
            Ok(Ok(())) => BackendOutcome::success(name, start.elapsed()),
            Ok(Err(e)) => {
                warn!(backend = %name, error = %e, "Backend failed");
                BackendOutcome::failed(name, e.to_string(), start.elapsed())
            }
            Err(e) => {
                error!(backend = %name, error = %e, "Backend panicked");
                BackendOutcome::failed(name, format!("backend panicked: {}", e), start.elapsed())
            }
        };

        signal.complete();
        outcome
    }

    fn print_progress(outcome: &BackendOutcome, completed: usize, total: usize) {
        let counter = format!("[{}/{}]", completed, total);
        let (counter, symbol) = if outcome.is_success() {
            (counter.green(), "✓".green())
        } else {
            (counter.red(), "✗".red())
        };
        let duration = format!("({:.1}s)", outcome.duration.as_secs_f32()).dimmed();

        println!("  {} {} {} {}", counter, outcome.name, symbol, duration);
        if let Some(err) = outcome.error() {
            println!("      {} {}", "Error:".red(), err);
        }
    }
}
