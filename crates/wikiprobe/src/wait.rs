//! Polling waits on expected conditions.
//!
//! The only synchronization mechanism the suites use: poll the page until a
//! condition holds, or fail with `Timeout` naming what was waited for.

use futures::future::{BoxFuture, FutureExt};
use regex::Regex;
use std::time::{Duration, Instant};

use crate::driver::{ElementId, WebDriver};
use crate::locator::By;
use crate::result::{ProbeError, ProbeResult};

/// Default timeout for wait operations (10 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Something the page should eventually satisfy
#[derive(Debug, Clone)]
pub enum Condition {
    /// Current URL equals the value
    UrlIs(String),
    /// Current URL differs from the value
    UrlIsNot(String),
    /// Current URL contains the value
    UrlContains(String),
    /// Regex finds a match in the current URL
    UrlMatches(Regex),
    /// Title contains the value
    TitleContains(String),
    /// An element matching the selector exists
    Present(By),
    /// The first matching element is displayed
    Visible(By),
    /// The first matching element is displayed and enabled
    Clickable(By),
    /// Any of the member conditions holds
    Any(Vec<Condition>),
}

enum Probe {
    Unmet,
    Met(Option<ElementId>),
}

impl Condition {
    /// URL equals `url`
    #[must_use]
    pub fn url_is(url: impl Into<String>) -> Self {
        Self::UrlIs(url.into())
    }

    /// URL has moved away from `url`
    #[must_use]
    pub fn url_is_not(url: impl Into<String>) -> Self {
        Self::UrlIsNot(url.into())
    }

    /// URL contains `fragment`
    #[must_use]
    pub fn url_contains(fragment: impl Into<String>) -> Self {
        Self::UrlContains(fragment.into())
    }

    /// URL matches a regular expression
    pub fn url_matches(pattern: &str) -> ProbeResult<Self> {
        Regex::new(pattern)
            .map(Self::UrlMatches)
            .map_err(|e| ProbeError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// Title contains `text`
    #[must_use]
    pub fn title_contains(text: impl Into<String>) -> Self {
        Self::TitleContains(text.into())
    }

    /// Element present
    #[must_use]
    pub const fn present(by: By) -> Self {
        Self::Present(by)
    }

    /// Element visible
    #[must_use]
    pub const fn visible(by: By) -> Self {
        Self::Visible(by)
    }

    /// Element clickable
    #[must_use]
    pub const fn clickable(by: By) -> Self {
        Self::Clickable(by)
    }

    /// Any of `conditions`, with nested `Any` flattened
    #[must_use]
    pub fn any(conditions: impl IntoIterator<Item = Self>) -> Self {
        let mut flat = Vec::new();
        for condition in conditions {
            match condition {
                Self::Any(members) => flat.extend(members),
                other => flat.push(other),
            }
        }
        Self::Any(flat)
    }

    /// Human-readable description used in timeout errors
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::UrlIs(url) => format!("url to be \"{url}\""),
            Self::UrlIsNot(url) => format!("url to change from \"{url}\""),
            Self::UrlContains(s) => format!("url to contain \"{s}\""),
            Self::UrlMatches(re) => format!("url to match \"{}\"", re.as_str()),
            Self::TitleContains(s) => format!("title to contain \"{s}\""),
            Self::Present(by) => format!("presence of element located by {by}"),
            Self::Visible(by) => format!("visibility of element located by {by}"),
            Self::Clickable(by) => format!("element to be clickable: {by}"),
            Self::Any(members) => {
                let parts: Vec<String> = members.iter().map(Self::description).collect();
                format!("at least one condition to be valid: {}", parts.join(" || "))
            }
        }
    }

    fn probe<'a, D: WebDriver + ?Sized>(&'a self, driver: &'a D) -> BoxFuture<'a, ProbeResult<Probe>> {
        async move {
            let outcome = match self {
                Self::UrlIs(url) => met_if(driver.current_url().await? == *url),
                Self::UrlIsNot(url) => met_if(driver.current_url().await? != *url),
                Self::UrlContains(s) => met_if(driver.current_url().await?.contains(s.as_str())),
                Self::UrlMatches(re) => met_if(re.is_match(&driver.current_url().await?)),
                Self::TitleContains(s) => met_if(driver.title().await?.contains(s.as_str())),
                Self::Present(by) => match driver.find_first(by).await {
                    Ok(Some(el)) => Ok(Probe::Met(Some(el))),
                    Ok(None) => Ok(Probe::Unmet),
                    Err(e) => Err(e),
                },
                Self::Visible(by) => element_state(driver, by, false).await,
                Self::Clickable(by) => element_state(driver, by, true).await,
                Self::Any(members) => {
                    for member in members {
                        if let Probe::Met(el) = member.probe(driver).await? {
                            return Ok(Probe::Met(el));
                        }
                    }
                    Ok(Probe::Unmet)
                }
            };
            match outcome {
                Err(e) if e.is_transient() => Ok(Probe::Unmet),
                other => other,
            }
        }
        .boxed()
    }
}

fn met_if(holds: bool) -> ProbeResult<Probe> {
    Ok(if holds { Probe::Met(None) } else { Probe::Unmet })
}

async fn element_state<D: WebDriver + ?Sized>(
    driver: &D,
    by: &By,
    require_enabled: bool,
) -> ProbeResult<Probe> {
    let Some(el) = driver.find_first(by).await? else {
        return Ok(Probe::Unmet);
    };
    if !driver.is_displayed(el).await? {
        return Ok(Probe::Unmet);
    }
    if require_enabled && !driver.is_enabled(el).await? {
        return Ok(Probe::Unmet);
    }
    Ok(Probe::Met(Some(el)))
}

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }
}

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
    /// Element satisfying an element condition
    pub element: Option<ElementId>,
}

/// Polls conditions against a driver
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a new waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Poll until `condition` holds or the timeout passes.
    ///
    /// The condition is always checked at least once, then re-checked every
    /// poll interval. A missing element or stale handle counts as "not yet";
    /// any other driver error ends the wait.
    pub async fn until<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
        condition: &Condition,
    ) -> ProbeResult<WaitResult> {
        let start = Instant::now();
        let timeout = Duration::from_millis(self.options.timeout_ms);
        let poll_interval = Duration::from_millis(self.options.poll_interval_ms.max(1));

        loop {
            if let Probe::Met(element) = condition.probe(driver).await? {
                let elapsed = start.elapsed();
                tracing::debug!(
                    waited_for = %condition.description(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "condition met"
                );
                return Ok(WaitResult {
                    elapsed,
                    waited_for: condition.description(),
                    element,
                });
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(ProbeError::Timeout {
                    ms: self.options.timeout_ms,
                    waited_for: condition.description(),
                });
            }
            tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
        }
    }

    /// Wait for an element condition and return the element
    pub async fn element<D: WebDriver + ?Sized>(
        &self,
        driver: &D,
        condition: &Condition,
    ) -> ProbeResult<ElementId> {
        let result = self.until(driver, condition).await?;
        match result.element {
            Some(el) => Ok(el),
            None => driver.find(&first_selector(condition)?).await,
        }
    }
}

fn first_selector(condition: &Condition) -> ProbeResult<By> {
    match condition {
        Condition::Present(by) | Condition::Visible(by) | Condition::Clickable(by) => Ok(by.clone()),
        Condition::Any(members) => members
            .iter()
            .find_map(|m| first_selector(m).ok())
            .ok_or_else(|| no_element(condition)),
        _ => Err(no_element(condition)),
    }
}

fn no_element(condition: &Condition) -> ProbeError {
    ProbeError::ElementNotFound {
        selector: format!("{} (not an element condition)", condition.description()),
    }
}
