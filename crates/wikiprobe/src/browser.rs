//! Chromium over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`ChromiumLauncher`] starts a chromium process
//! through chromiumoxide and hands out [`ChromiumDriver`] sessions.
//!
//! Element handles are implemented by tagging matched DOM nodes with a
//! `data-wikiprobe-id` token (`<document>:<node>`). A node is tagged once and
//! keeps its token for every later lookup. The document part is the lookup
//! that first tagged the document, so once the document is replaced a handle
//! from the previous one resolves to nothing and reports `StaleElement`.

use crate::driver::ElementId;
use crate::locator::js_string;

/// Attribute carrying element handle tokens
pub const HANDLE_ATTR: &str = "data-wikiprobe-id";

/// Attributes read as live DOM properties
const PROPERTY_ATTRS: [&str; 3] = ["href", "src", "value"];

/// Attributes reported as `"true"` when present
const BOOLEAN_ATTRS: [&str; 8] = [
    "checked", "disabled", "hidden", "multiple", "readonly", "required", "selected", "open",
];

// ============================================================================
// Script builders
// ============================================================================

/// Window slot holding the document part of handle tokens
const DOC_SLOT: &str = "__wikiprobeDoc";

/// Window slot counting tagged nodes
const NODE_SLOT: &str = "__wikiprobeNodes";

/// CSS selector addressing one handle
#[must_use]
pub fn handle_selector(id: ElementId) -> String {
    format!("[{HANDLE_ATTR}=\"{id}\"]")
}

/// Tag every untagged element of `query` (an array expression) and evaluate
/// to the `[document, node]` pair of each match.
///
/// `lookup` becomes the document part when this is the document's first
/// lookup.
#[must_use]
pub fn tag_script(query: &str, lookup: u64) -> String {
    format!(
        "(() => {{ const els = {query}; \
         if (window.{DOC_SLOT} === undefined) {{ window.{DOC_SLOT} = {lookup}; window.{NODE_SLOT} = 0; }} \
         return els.map((el) => {{ \
         let tok = el.getAttribute('{HANDLE_ATTR}'); \
         if (!tok || !tok.startsWith(window.{DOC_SLOT} + ':')) {{ \
         tok = window.{DOC_SLOT} + ':' + window.{NODE_SLOT}++; \
         el.setAttribute('{HANDLE_ATTR}', tok); }} \
         return tok.split(':').map(Number); }}); }})()"
    )
}

/// Handles from a [`tag_script`] result
#[must_use]
pub fn parse_handles(value: &serde_json::Value) -> Vec<ElementId> {
    value
        .as_array()
        .map(|pairs| {
            pairs
                .iter()
                .filter_map(|pair| {
                    let doc = pair.get(0)?.as_u64()?;
                    let node = pair.get(1)?.as_u64()?;
                    Some(ElementId::new(doc, node))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Run `body` against every handle in one evaluation.
///
/// Evaluates to an array holding the body result per handle, or `null`
/// where the node is gone.
#[must_use]
pub fn with_each_element(ids: &[ElementId], body: &str) -> String {
    let selectors: Vec<String> = ids.iter().map(|id| handle_selector(*id)).collect();
    let selectors = serde_json::Value::from(selectors);
    format!(
        "(() => {selectors}.map((sel) => {{ const el = document.querySelector(sel); \
         if (!el) return null; \
         const value = (() => {{ {body} }})(); \
         return value === undefined ? null : value; }}))()"
    )
}

/// Run `body` with `el` bound to the handle's node.
///
/// Evaluates to `{ "stale": true }` when the node is gone, otherwise to
/// `{ "stale": false, "value": <body result> }`.
#[must_use]
pub fn with_element(id: ElementId, body: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return {{ stale: true }}; \
         const value = (() => {{ {body} }})(); \
         return {{ stale: false, value: value === undefined ? null : value }}; }})()",
        js_string(&handle_selector(id))
    )
}

/// Body reading an attribute the way WebDriver `getAttribute` does
#[must_use]
pub fn attribute_body(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    let quoted = js_string(name);
    if PROPERTY_ATTRS.contains(&lower.as_str()) {
        format!(
            "const v = el[{quoted}]; \
             if (v !== undefined && v !== null) return String(v); \
             return el.getAttribute({quoted});"
        )
    } else if BOOLEAN_ATTRS.contains(&lower.as_str()) {
        format!("return el.hasAttribute({quoted}) ? 'true' : null;")
    } else {
        format!("return el.getAttribute({quoted});")
    }
}

/// Body evaluating to the rendered text
pub const TEXT_BODY: &str = "return (el.innerText || el.textContent || '').trim();";

/// Body evaluating to whether the element is rendered
pub const DISPLAYED_BODY: &str = "const st = window.getComputedStyle(el); \
     const r = el.getBoundingClientRect(); \
     return st.display !== 'none' && st.visibility !== 'hidden' \
     && (r.width > 0 || r.height > 0);";

/// Body evaluating to whether the element accepts input
pub const ENABLED_BODY: &str = "return !el.disabled;";

/// Body clicking through the DOM
pub const JS_CLICK_BODY: &str = "el.click(); return true;";

/// Body emptying an input and notifying listeners
pub const CLEAR_BODY: &str = "el.focus(); el.value = ''; \
     el.dispatchEvent(new Event('input', { bubbles: true })); \
     el.dispatchEvent(new Event('change', { bubbles: true })); return true;";

/// Body submitting the owning form, running constraint validation first
pub const SUBMIT_BODY: &str = "const form = el.form || el.closest('form'); \
     if (!form) return false; \
     if (typeof form.requestSubmit === 'function') form.requestSubmit(); else form.submit(); \
     return true;";

/// Body scrolling the element to the middle of the viewport
pub const SCROLL_BODY: &str = "el.scrollIntoView({ block: 'center', inline: 'nearest' }); return true;";

/// Messages CDP returns when the document changed under an evaluation
const DOCUMENT_GONE: [&str; 3] = [
    "Execution context was destroyed",
    "Cannot find context with specified id",
    "Inspected target navigated or closed",
];

/// Whether a CDP failure means the document was replaced mid-call
#[must_use]
pub fn is_document_gone(message: &str) -> bool {
    DOCUMENT_GONE.iter().any(|needle| message.contains(needle))
}

// ============================================================================
// CDP driver (browser feature)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn
)]
mod cdp {
    use super::{
        attribute_body, handle_selector, is_document_gone, parse_handles, tag_script,
        with_each_element, with_element, CLEAR_BODY, DISPLAYED_BODY, ENABLED_BODY, JS_CLICK_BODY,
        SCROLL_BODY, SUBMIT_BODY, TEXT_BODY,
    };
    use crate::config::ProbeConfig;
    use crate::driver::{DriverFactory, ElementId, WebDriver};
    use crate::locator::By;
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::page::{
        GetNavigationHistoryParams, NavigateToHistoryEntryParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::element::Element as CdpElement;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Launches a fresh chromium per session
    #[derive(Debug, Clone)]
    pub struct ChromiumLauncher {
        config: Arc<ProbeConfig>,
    }

    impl ChromiumLauncher {
        /// Launcher using the browser settings and timeouts of `config`
        pub fn new(config: Arc<ProbeConfig>) -> Self {
            Self { config }
        }

        fn cdp_config(&self) -> ProbeResult<CdpConfig> {
            let settings = &self.config.browser;
            let mut builder = CdpConfig::builder()
                .window_size(settings.window_width, settings.window_height)
                .viewport(Viewport {
                    width: settings.window_width,
                    height: settings.window_height,
                    ..Viewport::default()
                })
                .request_timeout(self.config.timeouts.page_load());

            if !settings.headless {
                builder = builder.with_head();
            }

            if !settings.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = settings.chromium_path {
                builder = builder.chrome_executable(path);
            }

            builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunch { message })
        }
    }

    #[async_trait]
    impl DriverFactory for ChromiumLauncher {
        type Driver = ChromiumDriver;

        async fn launch(&self) -> ProbeResult<ChromiumDriver> {
            let cdp_config = self.cdp_config()?;
            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                ProbeError::BrowserLaunch {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;

            tracing::debug!(
                headless = self.config.browser.headless,
                width = self.config.browser.window_width,
                height = self.config.browser.window_height,
                "chromium launched"
            );

            Ok(ChromiumDriver {
                browser,
                page,
                handle,
                lookups: AtomicU64::new(0),
                closed: false,
            })
        }
    }

    /// One chromium process with a single page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: CdpBrowser,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
        lookups: AtomicU64,
        closed: bool,
    }

    impl ChromiumDriver {
        fn page_error(e: impl std::fmt::Display) -> ProbeError {
            ProbeError::Page {
                message: e.to_string(),
            }
        }

        fn ensure_open(&self) -> ProbeResult<()> {
            if self.closed {
                return Err(ProbeError::Page {
                    message: "session already closed".to_string(),
                });
            }
            Ok(())
        }

        /// Evaluate an expression, awaiting promises, and return its value
        async fn eval(&self, expression: &str) -> ProbeResult<serde_json::Value> {
            self.ensure_open()?;
            let params = EvaluateParams::builder()
                .expression(expression)
                .return_by_value(true)
                .await_promise(true)
                .build()
                .map_err(|message| ProbeError::Script { message })?;

            let result = self.page.evaluate_expression(params).await.map_err(|e| {
                let message = e.to_string();
                if is_document_gone(&message) {
                    ProbeError::StaleElement {
                        id: "document".to_string(),
                    }
                } else {
                    ProbeError::Script { message }
                }
            })?;

            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        /// Run an element body, mapping a vanished node to `StaleElement`
        async fn on_element(&self, id: ElementId, body: &str) -> ProbeResult<serde_json::Value> {
            let mut outcome = self.eval(&with_element(id, body)).await?;
            if outcome
                .get("stale")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(true)
            {
                return Err(id.stale());
            }
            Ok(outcome
                .get_mut("value")
                .map(serde_json::Value::take)
                .unwrap_or_default())
        }

        async fn tag(&self, query: &str, scope: Option<ElementId>) -> ProbeResult<Vec<ElementId>> {
            let lookup = self.lookups.fetch_add(1, Ordering::Relaxed) + 1;
            let tagged = match scope {
                None => self.eval(&tag_script(query, lookup)).await?,
                Some(parent) => {
                    let body = format!("return {};", tag_script(query, lookup));
                    self.on_element(parent, &body).await?
                }
            };
            Ok(parse_handles(&tagged))
        }

        /// One body result per handle, `None` where the node is gone
        async fn on_each_element(
            &self,
            ids: &[ElementId],
            body: &str,
        ) -> ProbeResult<Vec<serde_json::Value>> {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            let values = self.eval(&with_each_element(ids, body)).await?;
            let mut values = match values {
                serde_json::Value::Array(values) => values,
                other => {
                    return Err(ProbeError::Script {
                        message: format!("expected one result per element, got {other}"),
                    })
                }
            };
            values.resize(ids.len(), serde_json::Value::Null);
            Ok(values)
        }

        async fn element(&self, id: ElementId) -> ProbeResult<CdpElement> {
            self.ensure_open()?;
            self.page
                .find_element(handle_selector(id))
                .await
                .map_err(|_| id.stale())
        }

        async fn history_step(&self, delta: i64) -> ProbeResult<()> {
            self.ensure_open()?;
            let history = self
                .page
                .execute(GetNavigationHistoryParams::default())
                .await
                .map_err(Self::page_error)?;
            let target = history.result.current_index + delta;
            let Some(entry) = usize::try_from(target)
                .ok()
                .and_then(|i| history.result.entries.get(i))
            else {
                tracing::debug!(delta, "no history entry to move to");
                return Ok(());
            };

            let url = entry.url.clone();
            self.page
                .execute(NavigateToHistoryEntryParams::new(entry.id))
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| ProbeError::Navigation {
                    url,
                    message: e.to_string(),
                })?;
            Ok(())
        }
    }

    #[async_trait]
    impl WebDriver for ChromiumDriver {
        async fn goto(&mut self, url: &str) -> ProbeResult<()> {
            self.ensure_open()?;
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            self.ensure_open()?;
            let url = self.page.url().await.map_err(Self::page_error)?;
            Ok(url.unwrap_or_default())
        }

        async fn title(&self) -> ProbeResult<String> {
            self.ensure_open()?;
            let title = self.page.get_title().await.map_err(Self::page_error)?;
            Ok(title.unwrap_or_default())
        }

        async fn page_source(&self) -> ProbeResult<String> {
            self.ensure_open()?;
            self.page.content().await.map_err(Self::page_error)
        }

        async fn back(&mut self) -> ProbeResult<()> {
            self.history_step(-1).await
        }

        async fn forward(&mut self) -> ProbeResult<()> {
            self.history_step(1).await
        }

        async fn refresh(&mut self) -> ProbeResult<()> {
            self.ensure_open()?;
            self.page.reload().await.map_err(Self::page_error)?;
            Ok(())
        }

        async fn execute(&self, script: &str) -> ProbeResult<serde_json::Value> {
            self.eval(script).await
        }

        async fn find_all(&self, by: &By) -> ProbeResult<Vec<ElementId>> {
            self.tag(&by.to_query_all(), None).await
        }

        async fn find_all_within(&self, parent: ElementId, by: &By) -> ProbeResult<Vec<ElementId>> {
            self.tag(&by.to_query_within("el"), Some(parent)).await
        }

        async fn text(&self, el: ElementId) -> ProbeResult<String> {
            let value = self.on_element(el, TEXT_BODY).await?;
            Ok(value.as_str().unwrap_or_default().to_string())
        }

        async fn attribute(&self, el: ElementId, name: &str) -> ProbeResult<Option<String>> {
            let value = self.on_element(el, &attribute_body(name)).await?;
            Ok(value.as_str().map(str::to_string))
        }

        async fn attribute_all(
            &self,
            els: &[ElementId],
            name: &str,
        ) -> ProbeResult<Vec<Option<String>>> {
            let values = self.on_each_element(els, &attribute_body(name)).await?;
            Ok(values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect())
        }

        async fn text_all(&self, els: &[ElementId]) -> ProbeResult<Vec<String>> {
            let values = self.on_each_element(els, TEXT_BODY).await?;
            Ok(values
                .iter()
                .map(|v| v.as_str().unwrap_or_default().to_string())
                .collect())
        }

        async fn is_displayed(&self, el: ElementId) -> ProbeResult<bool> {
            let value = self.on_element(el, DISPLAYED_BODY).await?;
            Ok(value.as_bool().unwrap_or(false))
        }

        async fn is_enabled(&self, el: ElementId) -> ProbeResult<bool> {
            let value = self.on_element(el, ENABLED_BODY).await?;
            Ok(value.as_bool().unwrap_or(false))
        }

        async fn click(&self, el: ElementId) -> ProbeResult<()> {
            let element = self.element(el).await?;
            element.click().await.map_err(|e| ProbeError::Input {
                message: format!("click on {el}: {e}"),
            })?;
            Ok(())
        }

        async fn js_click(&self, el: ElementId) -> ProbeResult<()> {
            self.on_element(el, JS_CLICK_BODY).await?;
            Ok(())
        }

        async fn clear(&self, el: ElementId) -> ProbeResult<()> {
            self.on_element(el, CLEAR_BODY).await?;
            Ok(())
        }

        async fn send_keys(&self, el: ElementId, text: &str) -> ProbeResult<()> {
            let element = self.element(el).await?;
            let input_error = |e: chromiumoxide::error::CdpError| ProbeError::Input {
                message: format!("typing into {el}: {e}"),
            };
            element.focus().await.map_err(input_error)?;

            // Newlines become Enter presses
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    element.press_key("Enter").await.map_err(input_error)?;
                }
                if !line.is_empty() {
                    element.type_str(line).await.map_err(input_error)?;
                }
            }
            Ok(())
        }

        async fn submit(&self, el: ElementId) -> ProbeResult<()> {
            let submitted = self.on_element(el, SUBMIT_BODY).await?;
            if submitted.as_bool() == Some(true) {
                Ok(())
            } else {
                Err(ProbeError::Input {
                    message: format!("element {el} is not inside a form"),
                })
            }
        }

        async fn scroll_into_view(&self, el: ElementId) -> ProbeResult<()> {
            self.on_element(el, SCROLL_BODY).await?;
            Ok(())
        }

        async fn close(&mut self) -> ProbeResult<()> {
            if self.closed {
                return Ok(());
            }
            self.closed = true;
            let closed = self.browser.close().await;
            self.handle.abort();
            closed.map_err(Self::page_error)?;
            tracing::debug!("chromium closed");
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumLauncher};
