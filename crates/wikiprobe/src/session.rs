//! A browser session as seen by a test case.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProbeConfig;
use crate::driver::{ElementId, WebDriver};
use crate::locator::By;
use crate::result::ProbeResult;
use crate::wait::{Condition, WaitOptions, WaitResult, Waiter};

/// Driver plus the configuration and waiter a case runs with
#[derive(Debug)]
pub struct Session<D> {
    driver: D,
    config: Arc<ProbeConfig>,
    waiter: Waiter,
}

impl<D: WebDriver> Session<D> {
    /// Wrap a freshly launched driver
    #[must_use]
    pub fn new(driver: D, config: Arc<ProbeConfig>) -> Self {
        let waiter = Waiter::with_options(
            WaitOptions::new()
                .with_timeout(config.timeouts.wait_ms)
                .with_poll_interval(config.timeouts.poll_interval_ms),
        );
        Self {
            driver,
            config,
            waiter,
        }
    }

    /// Underlying driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// Underlying driver, mutably (navigation)
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Configuration in effect
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Waiter in effect
    pub const fn waiter(&self) -> Waiter {
        self.waiter
    }

    /// Navigate to `url`
    pub async fn open(&mut self, url: &str) -> ProbeResult<()> {
        tracing::debug!(url, "open");
        self.driver.goto(url).await?;
        self.pace().await;
        Ok(())
    }

    /// Wait for any condition
    pub async fn wait_for(&self, condition: &Condition) -> ProbeResult<WaitResult> {
        self.waiter.until(&self.driver, condition).await
    }

    /// Wait until an element matching `by` exists
    pub async fn wait_present(&self, by: By) -> ProbeResult<ElementId> {
        self.waiter
            .element(&self.driver, &Condition::present(by))
            .await
    }

    /// Wait until the first element matching `by` is displayed
    pub async fn wait_visible(&self, by: By) -> ProbeResult<ElementId> {
        self.waiter
            .element(&self.driver, &Condition::visible(by))
            .await
    }

    /// Wait until the first element matching `by` is displayed and enabled
    pub async fn wait_clickable(&self, by: By) -> ProbeResult<ElementId> {
        self.waiter
            .element(&self.driver, &Condition::clickable(by))
            .await
    }

    /// Presentation delay after a notable action. Zero unless configured.
    pub async fn pace(&self) {
        let ms = self.config.pacing.action_ms;
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }

    /// Clear a field and type `text` into it
    pub async fn fill(&self, el: ElementId, text: &str) -> ProbeResult<()> {
        self.driver.clear(el).await?;
        if !text.is_empty() {
            self.driver.send_keys(el, text).await?;
        }
        Ok(())
    }

    /// Type `text` one character at a time, pausing `keystroke_ms` between keys
    pub async fn type_slowly(&self, el: ElementId, text: &str) -> ProbeResult<()> {
        let delay = Duration::from_millis(self.config.pacing.keystroke_ms);
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.driver.send_keys(el, ch.encode_utf8(&mut buf)).await?;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(())
    }

    /// Scroll the window to `fraction` of the document height
    pub async fn scroll_to_fraction(&self, fraction: f64) -> ProbeResult<()> {
        let fraction = fraction.clamp(0.0, 1.0);
        self.driver
            .execute(&format!(
                "window.scrollTo(0, document.body.scrollHeight * {fraction})"
            ))
            .await?;
        Ok(())
    }

    /// End the browser session
    pub async fn close(&mut self) -> ProbeResult<()> {
        tracing::debug!("closing session");
        self.driver.close().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockDriver, MockElement, MockPage, MockSite};

    const LOGIN: &str = "https://en.wikipedia.org/wiki/Special:UserLogin";

    fn session() -> (Session<MockDriver>, MockDriver) {
        let site = MockSite::new().page(
            LOGIN,
            MockPage::new("Log in").element(
                MockElement::new(By::id("wpPassword1"))
                    .attr("name", "wpPassword")
                    .attr("type", "password"),
            ),
        );
        let driver = MockDriver::new(site);
        let mut config = ProbeConfig::default();
        config.timeouts.wait_ms = 200;
        config.timeouts.poll_interval_ms = 10;
        (Session::new(driver.clone(), Arc::new(config)), driver)
    }

    #[tokio::test]
    async fn test_waiter_uses_configured_timeouts() {
        let (session, _) = session();
        assert_eq!(
            session.waiter().options(),
            WaitOptions::new().with_timeout(200).with_poll_interval(10)
        );
    }

    #[tokio::test]
    async fn test_open_and_wait_visible() {
        let (mut session, _) = session();
        session.open(LOGIN).await.unwrap();
        let field = session.wait_visible(By::id("wpPassword1")).await.unwrap();
        assert_eq!(
            session
                .driver()
                .attribute(field, "type")
                .await
                .unwrap()
                .as_deref(),
            Some("password")
        );
    }

    #[tokio::test]
    async fn test_type_slowly_sends_each_character() {
        let (mut session, observer) = session();
        session.open(LOGIN).await.unwrap();
        let field = session.wait_present(By::id("wpPassword1")).await.unwrap();
        session.type_slowly(field, "Pässword1").await.unwrap();
        assert_eq!(observer.field_value("wpPassword").as_deref(), Some("Pässword1"));

        session.fill(field, "").await.unwrap();
        assert_eq!(observer.field_value("wpPassword").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_scroll_to_fraction_runs_script() {
        let (session, observer) = session();
        session.scroll_to_fraction(0.8).await.unwrap();
        session.scroll_to_fraction(4.0).await.unwrap();
        let scripts = observer.scripts();
        assert_eq!(
            scripts[0],
            "window.scrollTo(0, document.body.scrollHeight * 0.8)"
        );
        assert!(scripts[1].ends_with("* 1"));
    }

    #[tokio::test]
    async fn test_close_ends_session() {
        let (mut session, observer) = session();
        session.close().await.unwrap();
        assert!(observer.is_closed());
    }
}
