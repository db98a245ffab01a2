//! Suite runner: turns CLI arguments into suite runs

use std::sync::Arc;

use wikiprobe::{DriverFactory, ProbeConfig, RunObserver, SuiteKind, SuiteRunner};

use crate::commands::{resolve_suites, RunArgs};
use crate::output::RunSummary;

/// Everything a run needs besides the driver factory
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Suites in run order
    pub suites: Vec<SuiteKind>,
    /// Case name filter
    pub filter: Option<String>,
    /// Stop a suite after its first failure
    pub fail_fast: bool,
    /// Configuration with the command line applied
    pub config: Arc<ProbeConfig>,
}

impl RunPlan {
    /// Apply `args` on top of `config`
    #[must_use]
    pub fn new(mut config: ProbeConfig, args: &RunArgs) -> Self {
        if args.headed {
            config.browser.headless = false;
        }
        if let Some(ms) = args.pacing_ms {
            config.pacing.action_ms = ms;
        }
        Self {
            suites: resolve_suites(&args.suites),
            filter: args.filter.clone().filter(|f| !f.is_empty()),
            fail_fast: args.fail_fast,
            config: Arc::new(config),
        }
    }

    /// Cases the run will report on
    #[must_use]
    pub fn case_count(&self) -> usize {
        self.suites
            .iter()
            .map(|kind| {
                kind.build::<wikiprobe::MockDriver>()
                    .selected_count(self.filter.as_deref())
            })
            .sum()
    }

    /// Run every planned suite in order
    pub async fn execute<F>(&self, factory: &F, observer: Arc<dyn RunObserver>) -> RunSummary
    where
        F: DriverFactory,
        F::Driver: 'static,
    {
        let runner = SuiteRunner::new(Arc::clone(&self.config))
            .with_filter(self.filter.clone())
            .with_fail_fast(self.fail_fast)
            .with_observer(observer);

        let mut reports = Vec::with_capacity(self.suites.len());
        for kind in &self.suites {
            let suite = kind.build::<F::Driver>();
            if suite.selected_count(self.filter.as_deref()) == 0 {
                tracing::debug!(suite = %kind, "no cases selected");
                continue;
            }
            reports.push(runner.run(factory, &suite).await);
        }
        RunSummary::new(reports)
    }
}
