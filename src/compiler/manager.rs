//! Pass manager: runs a configured pipeline over a scope.

use std::{collections::BTreeMap, fmt, time::Duration, time::Instant};

use log::info;

use crate::{
    compiler::{Config, Metrics, Pass},
    metadata::Scope,
    Result,
};

/// Outcome of one pass invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassRun {
    /// Name of the pass
    pub name: &'static str,
    /// Counters recorded by the pass, sorted by name
    pub metrics: BTreeMap<String, i64>,
    /// Wall clock time spent in the pass
    pub elapsed: Duration,
}

impl PassRun {
    /// Value of the counter `metric`, zero if the pass never recorded it.
    #[must_use]
    pub fn metric(&self, metric: &str) -> i64 {
        self.metrics.get(metric).copied().unwrap_or(0)
    }
}

/// Per-pass results of a [`PassManager::run`], in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// One entry per executed pass
    pub runs: Vec<PassRun>,
}

impl PassReport {
    /// The first run of the pass named `pass`.
    #[must_use]
    pub fn pass(&self, pass: &str) -> Option<&PassRun> {
        self.runs.iter().find(|run| run.name == pass)
    }

    /// Value of `metric` as recorded by the first run of `pass`.
    #[must_use]
    pub fn metric(&self, pass: &str, metric: &str) -> Option<i64> {
        self.pass(pass).map(|run| run.metric(metric))
    }

    /// Total time spent in all passes.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.runs.iter().map(|run| run.elapsed).sum()
    }
}

impl fmt::Display for PassReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            writeln!(f, "{} ({:?})", run.name, run.elapsed)?;
            for (name, value) in &run.metrics {
                writeln!(f, "  {name}: {value}")?;
            }
        }
        Ok(())
    }
}

/// Runs a sequence of passes over a [`Scope`].
///
/// Each pass is configured from [`Config::pass_config`] before the run and records its
/// counters into a fresh [`Metrics`] sink.
///
/// # Examples
///
/// ```rust
/// use jarscope::compiler::{CfgCheckPass, Config, PassManager, RemoveGotosPass};
/// use jarscope::metadata::Scope;
///
/// let mut manager = PassManager::new(Config::default())
///     .with_pass(RemoveGotosPass::new())
///     .with_pass(CfgCheckPass::new());
///
/// let mut scope = Scope::new();
/// let report = manager.run(&mut scope)?;
/// assert_eq!(report.metric("RemoveGotosPass", "num_goto_removed"), Some(0));
/// # Ok::<(), jarscope::Error>(())
/// ```
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    config: Config,
}

impl PassManager {
    /// Creates a manager without passes.
    #[must_use]
    pub fn new(config: Config) -> Self {
        PassManager {
            passes: Vec::new(),
            config,
        }
    }

    /// Appends `pass` to the pipeline.
    #[must_use]
    pub fn with_pass(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Appends a boxed pass to the pipeline.
    pub fn add_pass(&mut self, pass: Box<dyn Pass>) {
        self.passes.push(pass);
    }

    /// The configured passes in execution order.
    pub fn passes(&self) -> impl Iterator<Item = &dyn Pass> + '_ {
        self.passes.iter().map(|pass| pass.as_ref() as &dyn Pass)
    }

    /// The pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configures every pass, then runs them in order over `scope`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or pass error. Passes that already ran keep
    /// their changes to `scope`.
    pub fn run(&mut self, scope: &mut Scope) -> Result<PassReport> {
        for pass in &mut self.passes {
            pass.configure(&self.config.pass_config(pass.name()))?;
        }

        info!(
            "Running {} passes over {} classes ({} method bodies)",
            self.passes.len(),
            scope.len(),
            scope.count_bodies()
        );

        let mut report = PassReport::default();
        for pass in &self.passes {
            info!("Running {}: {}", pass.name(), pass.description());
            let metrics = Metrics::new();
            let start = Instant::now();

            pass.run_pass(scope, &self.config, &metrics)?;

            let run = PassRun {
                name: pass.name(),
                metrics: metrics.snapshot(),
                elapsed: start.elapsed(),
            };
            for (metric, value) in &run.metrics {
                info!("{}: {} = {}", run.name, metric, value);
            }
            info!("Finished {} in {:?}", run.name, run.elapsed);
            report.runs.push(run);
        }

        Ok(report)
    }
}
