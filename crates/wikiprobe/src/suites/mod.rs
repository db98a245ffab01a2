//! The Wikipedia test suites.
//!
//! Each submodule exposes `suite()` building a [`TestSuite`] over any
//! [`WebDriver`], plus one `pub async fn` per case so a case can also be
//! driven on its own.

pub mod authentication;
pub mod content;
pub mod navigation;
pub mod search;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::driver::WebDriver;
use crate::harness::TestSuite;
use crate::mock::MockDriver;
use crate::result::{ProbeError, ProbeResult};

/// Registry of the available suites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteKind {
    /// Site navigation
    Navigation,
    /// Login and logout
    Authentication,
    /// Article content
    Content,
    /// Search
    Search,
}

impl SuiteKind {
    /// Every suite, in default run order
    pub const ALL: [Self; 4] = [
        Self::Navigation,
        Self::Authentication,
        Self::Content,
        Self::Search,
    ];

    /// Suite name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::Authentication => "authentication",
            Self::Content => "content",
            Self::Search => "search",
        }
    }

    /// Build the suite for a driver type
    #[must_use]
    pub fn build<D: WebDriver + 'static>(self) -> TestSuite<D> {
        match self {
            Self::Navigation => navigation::suite(),
            Self::Authentication => authentication::suite(),
            Self::Content => content::suite(),
            Self::Search => search::suite(),
        }
    }

    /// Case names in run order
    #[must_use]
    pub fn case_names(self) -> Vec<String> {
        // Any driver type will do; nothing is launched.
        self.build::<MockDriver>().case_names()
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SuiteKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ProbeError::config(format!(
                    "unknown suite '{s}' (expected one of: navigation, authentication, content, search)"
                ))
            })
    }
}

/// Millisecond timestamp used to make throwaway names unique
pub(crate) fn unique_suffix() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis())
}

/// Treat a wait timeout as "nothing showed up" rather than a failure
pub(crate) fn tolerate_timeout<T>(result: ProbeResult<T>) -> ProbeResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ProbeError::Timeout { ms, waited_for }) => {
            tracing::debug!(ms, waited_for = %waited_for, "wait timed out, continuing");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
