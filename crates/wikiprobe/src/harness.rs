//! Test harness for running test suites.
//!
//! A [`TestSuite`] is an ordered set of [`TestCase`]s sharing a session scope
//! and an optional `before_each` hook. [`SuiteRunner`] launches browser
//! sessions through a [`DriverFactory`], runs the cases one at a time and
//! collects a serializable [`SuiteReport`].

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ProbeConfig;
use crate::driver::{DriverFactory, WebDriver};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;

/// How a case ended when it did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// All checks held
    Passed,
    /// Ran to completion, but something expected was absent
    Warned(String),
    /// Did not apply in this run
    Skipped(String),
}

/// Body of a case
pub type CaseFn<D> = Arc<
    dyn for<'a> Fn(&'a mut Session<D>) -> BoxFuture<'a, ProbeResult<CaseOutcome>> + Send + Sync,
>;

/// Hook run before each case
pub type HookFn<D> =
    Arc<dyn for<'a> Fn(&'a mut Session<D>) -> BoxFuture<'a, ProbeResult<()>> + Send + Sync>;

/// A single test case
pub struct TestCase<D> {
    /// Case name, `name[label]` for data rows
    pub name: String,
    /// One-line description
    pub description: String,
    /// Lower runs first; ties keep registration order
    pub priority: u32,
    /// Case that must pass (or warn) before this one runs
    pub depends_on: Option<String>,
    run: CaseFn<D>,
}

impl<D> Clone for TestCase<D> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            priority: self.priority,
            depends_on: self.depends_on.clone(),
            run: Arc::clone(&self.run),
        }
    }
}

impl<D> fmt::Debug for TestCase<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

impl<D: WebDriver + 'static> TestCase<D> {
    /// Create a new test case
    #[must_use]
    pub fn new<F>(name: impl Into<String>, run: F) -> Self
    where
        F: for<'a> Fn(&'a mut Session<D>) -> BoxFuture<'a, ProbeResult<CaseOutcome>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            description: String::new(),
            priority: 0,
            depends_on: None,
            run: Arc::new(run),
        }
    }

    /// Expand one definition into a case per data row, named `name[label]`
    #[must_use]
    pub fn with_rows<T, F>(
        name: &str,
        description: &str,
        priority: u32,
        rows: impl IntoIterator<Item = (&'static str, T)>,
        run: F,
    ) -> Vec<Self>
    where
        T: Clone + Send + Sync + 'static,
        F: for<'a> Fn(&'a mut Session<D>, T) -> BoxFuture<'a, ProbeResult<CaseOutcome>>
            + Send
            + Sync
            + 'static,
    {
        let run = Arc::new(run);
        rows.into_iter()
            .map(|(label, row)| {
                let run = Arc::clone(&run);
                Self::new(format!("{name}[{label}]"), move |session| {
                    run(session, row.clone())
                })
                .with_description(description)
                .with_priority(priority)
            })
            .collect()
    }

    /// Set description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set priority
    #[must_use]
    pub const fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Require another case to pass first
    #[must_use]
    pub fn depends_on(mut self, case: impl Into<String>) -> Self {
        self.depends_on = Some(case.into());
        self
    }
}

/// Whether cases share one browser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// Fresh browser for every case
    #[default]
    PerCase,
    /// One browser for the whole suite
    PerSuite,
}

/// A test suite containing multiple tests
pub struct TestSuite<D> {
    /// Suite name
    pub name: String,
    /// Session scope
    pub scope: SessionScope,
    before_each: Option<HookFn<D>>,
    cases: Vec<TestCase<D>>,
}

impl<D> fmt::Debug for TestSuite<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSuite")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("before_each", &self.before_each.is_some())
            .field("cases", &self.cases)
            .finish()
    }
}

impl<D: WebDriver + 'static> TestSuite<D> {
    /// Create a new test suite
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: SessionScope::PerCase,
            before_each: None,
            cases: Vec::new(),
        }
    }

    /// Set session scope
    #[must_use]
    pub const fn with_scope(mut self, scope: SessionScope) -> Self {
        self.scope = scope;
        self
    }

    /// Run `hook` on the session before every case
    #[must_use]
    pub fn before_each<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut Session<D>) -> BoxFuture<'a, ProbeResult<()>> + Send + Sync + 'static,
    {
        self.before_each = Some(Arc::new(hook));
        self
    }

    /// Add a test case
    #[must_use]
    pub fn case(mut self, case: TestCase<D>) -> Self {
        self.cases.push(case);
        self
    }

    /// Add several test cases
    #[must_use]
    pub fn cases(mut self, cases: impl IntoIterator<Item = TestCase<D>>) -> Self {
        self.cases.extend(cases);
        self
    }

    /// Get the number of tests
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.cases.len()
    }

    /// Cases in run order (priority, then registration order)
    #[must_use]
    pub fn ordered(&self) -> Vec<&TestCase<D>> {
        let mut ordered: Vec<&TestCase<D>> = self.cases.iter().collect();
        ordered.sort_by_key(|case| case.priority);
        ordered
    }

    /// Case names in run order
    #[must_use]
    pub fn case_names(&self) -> Vec<String> {
        self.ordered().into_iter().map(|c| c.name.clone()).collect()
    }

    /// Number of cases a run with `filter` will report on
    #[must_use]
    pub fn selected_count(&self, filter: Option<&str>) -> usize {
        self.selected(filter.filter(|f| !f.is_empty())).len()
    }

    /// Cases selected by a name filter, plus whatever they depend on
    fn selected(&self, filter: Option<&str>) -> Vec<&TestCase<D>> {
        let ordered = self.ordered();
        let Some(filter) = filter else {
            return ordered;
        };
        let by_name: HashMap<&str, &TestCase<D>> =
            ordered.iter().map(|c| (c.name.as_str(), *c)).collect();
        let mut keep: HashSet<&str> = HashSet::new();
        for case in ordered.iter().filter(|c| c.name.contains(filter)) {
            let mut current = Some(*case);
            while let Some(c) = current {
                if !keep.insert(c.name.as_str()) {
                    break;
                }
                current = c
                    .depends_on
                    .as_deref()
                    .and_then(|dep| by_name.get(dep).copied());
            }
        }
        ordered
            .into_iter()
            .filter(|c| keep.contains(c.name.as_str()))
            .collect()
    }
}

/// Final status of a case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Passed
    Passed,
    /// Passed with a warning
    Warned,
    /// Failed
    Failed,
    /// Not run
    Skipped,
}

impl CaseStatus {
    /// Whether dependents may run
    #[must_use]
    pub const fn satisfies_dependency(self) -> bool {
        matches!(self, Self::Passed | Self::Warned)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Passed => "PASS",
            Self::Warned => "WARN",
            Self::Failed => "FAIL",
            Self::Skipped => "SKIP",
        };
        f.write_str(label)
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseReport {
    /// Case name
    pub name: String,
    /// Final status
    pub status: CaseStatus,
    /// Failure, warning or skip reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl CaseReport {
    fn new(name: &str, status: CaseStatus, message: Option<String>, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            status,
            message,
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Results from running a test suite
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite: String,
    /// Case reports in run order
    pub cases: Vec<CaseReport>,
    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl SuiteReport {
    fn count(&self, status: CaseStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    /// Count passed tests
    #[must_use]
    pub fn passed(&self) -> usize {
        self.count(CaseStatus::Passed)
    }

    /// Count warned tests
    #[must_use]
    pub fn warned(&self) -> usize {
        self.count(CaseStatus::Warned)
    }

    /// Count failed tests
    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(CaseStatus::Failed)
    }

    /// Count skipped tests
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(CaseStatus::Skipped)
    }

    /// No case failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Report for a case by name
    #[must_use]
    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }
}

/// Receives progress while a suite runs
pub trait RunObserver: Send + Sync {
    /// A case is about to start
    fn case_started(&self, _suite: &str, _case: &str) {}

    /// A case has finished
    fn case_finished(&self, _suite: &str, _report: &CaseReport) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Runs suites case by case
#[derive(Clone)]
pub struct SuiteRunner {
    config: Arc<ProbeConfig>,
    filter: Option<String>,
    fail_fast: bool,
    observer: Arc<dyn RunObserver>,
}

impl fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("filter", &self.filter)
            .field("fail_fast", &self.fail_fast)
            .finish_non_exhaustive()
    }
}

impl SuiteRunner {
    /// Runner using `config` for sessions and timeouts
    #[must_use]
    pub fn new(config: Arc<ProbeConfig>) -> Self {
        Self {
            config,
            filter: None,
            fail_fast: false,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Only run cases whose name contains `filter` (and their dependencies)
    #[must_use]
    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter.filter(|f| !f.is_empty());
        self
    }

    /// Skip remaining cases after the first failure
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Report progress to `observer`
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run every selected case of `suite`
    pub async fn run<F>(&self, factory: &F, suite: &TestSuite<F::Driver>) -> SuiteReport
    where
        F: DriverFactory,
        F::Driver: 'static,
    {
        let started = Instant::now();
        let selected = suite.selected(self.filter.as_deref());
        tracing::info!(
            suite = %suite.name,
            cases = selected.len(),
            scope = ?suite.scope,
            "running suite"
        );

        let mut shared: Option<Session<F::Driver>> = None;
        let mut shared_launch_error: Option<String> = None;
        if suite.scope == SessionScope::PerSuite && !selected.is_empty() {
            match factory.launch().await {
                Ok(driver) => shared = Some(Session::new(driver, Arc::clone(&self.config))),
                Err(e) => shared_launch_error = Some(e.to_string()),
            }
        }

        let mut statuses: HashMap<String, CaseStatus> = HashMap::new();
        let mut reports = Vec::with_capacity(selected.len());
        let mut halted = false;

        for case in selected {
            self.observer.case_started(&suite.name, &case.name);
            let case_started = Instant::now();

            let blocked = if halted {
                Some("fail-fast: an earlier case failed".to_string())
            } else {
                case.depends_on.as_ref().and_then(|dep| {
                    let satisfied = statuses
                        .get(dep)
                        .is_some_and(|status| status.satisfies_dependency());
                    (!satisfied).then(|| format!("depends on {dep}, which did not pass"))
                })
            };

            let (status, message) = if let Some(reason) = blocked {
                (CaseStatus::Skipped, Some(reason))
            } else if let Some(error) = &shared_launch_error {
                (CaseStatus::Failed, Some(error.clone()))
            } else if let Some(session) = shared.as_mut() {
                self.run_case(suite, case, session).await
            } else {
                match factory.launch().await {
                    Ok(driver) => {
                        let mut session = Session::new(driver, Arc::clone(&self.config));
                        let result = self.run_case(suite, case, &mut session).await;
                        if let Err(e) = session.close().await {
                            tracing::warn!(case = %case.name, error = %e, "failed to close session");
                        }
                        result
                    }
                    Err(e) => (CaseStatus::Failed, Some(e.to_string())),
                }
            };

            if status == CaseStatus::Failed && self.fail_fast {
                halted = true;
            }
            let report = CaseReport::new(&case.name, status, message, case_started.elapsed());
            log_report(&suite.name, &report);
            self.observer.case_finished(&suite.name, &report);
            statuses.insert(case.name.clone(), status);
            reports.push(report);
        }

        if let Some(mut session) = shared {
            if let Err(e) = session.close().await {
                tracing::warn!(suite = %suite.name, error = %e, "failed to close session");
            }
        }

        SuiteReport {
            suite: suite.name.clone(),
            cases: reports,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_case<D: WebDriver + 'static>(
        &self,
        suite: &TestSuite<D>,
        case: &TestCase<D>,
        session: &mut Session<D>,
    ) -> (CaseStatus, Option<String>) {
        let limit = self.config.timeouts.case();
        let body = async {
            if let Some(hook) = &suite.before_each {
                hook(session).await.map_err(|e| ProbeError::Page {
                    message: format!("before_each failed: {e}"),
                })?;
            }
            (case.run)(session).await
        };
        match tokio::time::timeout(limit, body).await {
            Ok(Ok(CaseOutcome::Passed)) => (CaseStatus::Passed, None),
            Ok(Ok(CaseOutcome::Warned(reason))) => (CaseStatus::Warned, Some(reason)),
            Ok(Ok(CaseOutcome::Skipped(reason))) => (CaseStatus::Skipped, Some(reason)),
            Ok(Err(e)) => (CaseStatus::Failed, Some(e.to_string())),
            Err(_) => (
                CaseStatus::Failed,
                Some(format!("case exceeded {}ms", self.config.timeouts.case_ms)),
            ),
        }
    }
}

fn log_report(suite: &str, report: &CaseReport) {
    let message = report.message.as_deref().unwrap_or("");
    match report.status {
        CaseStatus::Passed => {
            tracing::info!(suite, case = %report.name, duration_ms = report.duration_ms, "passed");
        }
        CaseStatus::Warned => {
            tracing::warn!(suite, case = %report.name, reason = message, "passed with warning");
        }
        CaseStatus::Skipped => {
            tracing::info!(suite, case = %report.name, reason = message, "skipped");
        }
        CaseStatus::Failed => {
            tracing::error!(suite, case = %report.name, error = message, "failed");
        }
    }
}
