//! Wikiprobe: end-to-end UI test suites for Wikipedia
//!
//! Four suites (navigation, authentication, content, search) drive a real
//! browser against the live site through a small WebDriver-style seam.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    WIKIPROBE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Suites     │    │ Session    │    │ WebDriver  │            │
//! │   │ (cases)    │───►│ + Waiter   │───►│ CDP / mock │            │
//! │   │            │    │            │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! │         ▲                                                       │
//! │   ┌────────────┐                                                │
//! │   │SuiteRunner │  sessions, ordering, dependencies, reports     │
//! │   └────────────┘                                                │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wikiprobe::prelude::*;
//!
//! # async fn demo() -> ProbeResult<()> {
//! let config = Arc::new(ProbeConfig::default().with_env_overrides());
//! let launcher = ChromiumLauncher::new(Arc::clone(&config));
//! let suite = SuiteKind::Search.build();
//! let report = SuiteRunner::new(config).run(&launcher, &suite).await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod assertion;
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
mod browser;
mod config;
mod driver;
mod harness;
mod locator;
mod mock;
mod result;
mod session;
mod wait;

/// The Wikipedia suites
#[allow(clippy::missing_errors_doc)]
pub mod suites;

pub use assertion::{Assertion, AssertionResult};
#[cfg(feature = "browser")]
pub use browser::{ChromiumDriver, ChromiumLauncher, HANDLE_ATTR};
pub use config::{
    BrowserSettings, Credentials, Pacing, ProbeConfig, Timeouts, ENV_CHROMIUM_PATH, ENV_HEADLESS,
    ENV_PACING_MS, ENV_PASSWORD, ENV_USERNAME,
};
pub use driver::{DriverFactory, ElementId, WebDriver};
pub use harness::{
    CaseFn, CaseOutcome, CaseReport, CaseStatus, HookFn, NoopObserver, RunObserver, SessionScope,
    SuiteReport, SuiteRunner, TestCase, TestSuite,
};
pub use locator::{js_string, xpath_literal, By};
pub use mock::{FormValues, MockDriver, MockElement, MockLauncher, MockPage, MockSite, Route};
pub use result::{ProbeError, ProbeResult};
pub use session::Session;
pub use suites::SuiteKind;
pub use wait::{
    Condition, WaitOptions, WaitResult, Waiter, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::assertion::*;
    #[cfg(feature = "browser")]
    pub use super::browser::{ChromiumDriver, ChromiumLauncher};
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::harness::*;
    pub use super::locator::By;
    pub use super::mock::*;
    pub use super::result::*;
    pub use super::session::*;
    pub use super::suites::SuiteKind;
    pub use super::wait::*;
}
