//! WebDriver - the browser session seam.
//!
//! Test cases only ever talk to a [`WebDriver`]. The CDP implementation lives
//! in [`crate::browser`] behind the `browser` feature; [`crate::mock`] provides
//! a scripted in-memory one for unit tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::locator::By;
use crate::result::{ProbeError, ProbeResult};

/// Handle to an element located in the current document.
///
/// A handle belongs to the document generation it was found in; once the
/// page navigates or reloads, operations on it fail with `StaleElement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId {
    /// Document generation
    pub generation: u64,
    /// Index within that generation
    pub index: u64,
}

impl ElementId {
    /// Create a handle
    #[must_use]
    pub const fn new(generation: u64, index: u64) -> Self {
        Self { generation, index }
    }

    /// Stale-handle error for this id
    #[must_use]
    pub fn stale(self) -> ProbeError {
        ProbeError::StaleElement {
            id: self.to_string(),
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.generation, self.index)
    }
}

/// Browser session operations used by the suites
#[async_trait]
pub trait WebDriver: Send + Sync {
    /// Navigate to a URL and wait for the load to finish
    async fn goto(&mut self, url: &str) -> ProbeResult<()>;

    /// URL of the current document
    async fn current_url(&self) -> ProbeResult<String>;

    /// Title of the current document
    async fn title(&self) -> ProbeResult<String>;

    /// Serialized HTML of the current document
    async fn page_source(&self) -> ProbeResult<String>;

    /// Go back one history entry
    async fn back(&mut self) -> ProbeResult<()>;

    /// Go forward one history entry
    async fn forward(&mut self) -> ProbeResult<()>;

    /// Reload the current document
    async fn refresh(&mut self) -> ProbeResult<()>;

    /// Evaluate a script and return its JSON value
    async fn execute(&self, script: &str) -> ProbeResult<serde_json::Value>;

    /// All elements matching `by`, in document order
    async fn find_all(&self, by: &By) -> ProbeResult<Vec<ElementId>>;

    /// All elements matching `by` below `parent`
    async fn find_all_within(&self, parent: ElementId, by: &By) -> ProbeResult<Vec<ElementId>>;

    /// Rendered text of an element
    async fn text(&self, el: ElementId) -> ProbeResult<String>;

    /// Attribute (or live property for `href`, `src`, `value`)
    async fn attribute(&self, el: ElementId, name: &str) -> ProbeResult<Option<String>>;

    /// Whether the element is rendered
    async fn is_displayed(&self, el: ElementId) -> ProbeResult<bool>;

    /// Whether the element is not disabled
    async fn is_enabled(&self, el: ElementId) -> ProbeResult<bool>;

    /// Click with real input events
    async fn click(&self, el: ElementId) -> ProbeResult<()>;

    /// Click through the DOM `click()` method
    async fn js_click(&self, el: ElementId) -> ProbeResult<()>;

    /// Clear an input's value
    async fn clear(&self, el: ElementId) -> ProbeResult<()>;

    /// Type text into an element
    async fn send_keys(&self, el: ElementId, text: &str) -> ProbeResult<()>;

    /// Submit the form owning the element
    async fn submit(&self, el: ElementId) -> ProbeResult<()>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, el: ElementId) -> ProbeResult<()>;

    /// End the session
    async fn close(&mut self) -> ProbeResult<()>;

    /// First element matching `by`, if any
    async fn find_first(&self, by: &By) -> ProbeResult<Option<ElementId>> {
        Ok(self.find_all(by).await?.into_iter().next())
    }

    /// First element matching `by`
    async fn find(&self, by: &By) -> ProbeResult<ElementId> {
        self.find_first(by)
            .await?
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: by.to_string(),
            })
    }

    /// First element matching `by` below `parent`
    async fn find_within(&self, parent: ElementId, by: &By) -> ProbeResult<ElementId> {
        self.find_all_within(parent, by)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProbeError::ElementNotFound {
                selector: format!("{by} within {parent}"),
            })
    }

    /// Attribute of each element, in order. An element that went stale
    /// reads as `None`.
    async fn attribute_all(
        &self,
        els: &[ElementId],
        name: &str,
    ) -> ProbeResult<Vec<Option<String>>> {
        let mut out = Vec::with_capacity(els.len());
        for el in els {
            match self.attribute(*el, name).await {
                Ok(value) => out.push(value),
                Err(ProbeError::StaleElement { .. }) => out.push(None),
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Text of each element, in order. An element that went stale reads
    /// as empty.
    async fn text_all(&self, els: &[ElementId]) -> ProbeResult<Vec<String>> {
        let mut out = Vec::with_capacity(els.len());
        for el in els {
            match self.text(*el).await {
                Ok(text) => out.push(text),
                Err(ProbeError::StaleElement { .. }) => out.push(String::new()),
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }
}

/// Creates fresh browser sessions
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Driver type produced
    type Driver: WebDriver;

    /// Launch a new session
    async fn launch(&self) -> ProbeResult<Self::Driver>;
}
