//! Assertions for test validation.
//!
//! Each helper produces an [`AssertionResult`]; `check()` turns a failure into
//! `ProbeError::AssertionFailed` so case bodies can use `?`. An optional
//! context message is prefixed to the failure, mirroring the message argument
//! of classic xUnit asserts.

use std::fmt::Debug;

use crate::result::{ProbeError, ProbeResult};

/// Result of an assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    /// Whether the assertion passed
    pub passed: bool,
    /// Human-readable message
    pub message: String,
}

impl AssertionResult {
    /// Create a passing assertion result
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    /// Create a failing assertion result
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }

    /// Prefix a failure message with context
    #[must_use]
    pub fn context(mut self, context: &str) -> Self {
        if !self.passed && !context.is_empty() {
            self.message = format!("{context}: {}", self.message);
        }
        self
    }

    /// Convert into a result
    pub fn check(self) -> ProbeResult<()> {
        if self.passed {
            Ok(())
        } else {
            Err(ProbeError::assertion(self.message))
        }
    }
}

/// Assertion helpers for testing
#[derive(Debug)]
pub struct Assertion;

impl Assertion {
    /// Assert two values are equal
    #[must_use]
    pub fn equals<T: PartialEq + Debug + ?Sized>(expected: &T, actual: &T) -> AssertionResult {
        if expected == actual {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {expected:?}, got {actual:?}"))
        }
    }

    /// Assert two values differ
    #[must_use]
    pub fn not_equals<T: PartialEq + Debug + ?Sized>(left: &T, right: &T) -> AssertionResult {
        if left == right {
            AssertionResult::fail(format!("expected values to differ, both were {left:?}"))
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert a string contains a substring
    #[must_use]
    pub fn contains(haystack: &str, needle: &str) -> AssertionResult {
        if haystack.contains(needle) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{}' to contain '{needle}'", excerpt(haystack)))
        }
    }

    /// Assert a string starts with a prefix
    #[must_use]
    pub fn starts_with(value: &str, prefix: &str) -> AssertionResult {
        if value.starts_with(prefix) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected '{}' to start with '{prefix}'", excerpt(value)))
        }
    }

    /// Assert a condition is true
    #[must_use]
    pub fn is_true(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(message)
        }
    }

    /// Assert a condition is false
    #[must_use]
    pub fn is_false(condition: bool, message: &str) -> AssertionResult {
        if condition {
            AssertionResult::fail(message)
        } else {
            AssertionResult::pass()
        }
    }

    /// Assert an option holds a value
    #[must_use]
    pub fn is_some<T>(opt: &Option<T>, what: &str) -> AssertionResult {
        if opt.is_some() {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!("expected {what}, found none"))
        }
    }

    /// Assert a count reaches a minimum
    #[must_use]
    pub fn at_least(count: usize, minimum: usize, what: &str) -> AssertionResult {
        if count >= minimum {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expected at least {minimum} {what}, found {count}"
            ))
        }
    }
}

/// Long page texts are cut down in failure messages
fn excerpt(text: &str) -> String {
    const LIMIT: usize = 120;
    if text.chars().count() <= LIMIT {
        text.to_string()
    } else {
        let cut: String = text.chars().take(LIMIT).collect();
        format!("{cut}...")
    }
}
