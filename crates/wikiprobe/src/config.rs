//! Run configuration.
//!
//! Loaded from YAML (every field has a default), then overridden from the
//! environment. Credentials are never baked in: cases that need a real
//! account are skipped when none are configured.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::result::{ProbeError, ProbeResult};

/// Environment variable holding the login name
pub const ENV_USERNAME: &str = "WIKIPROBE_USERNAME";
/// Environment variable holding the login password
pub const ENV_PASSWORD: &str = "WIKIPROBE_PASSWORD";
/// Environment variable toggling headless mode
pub const ENV_HEADLESS: &str = "WIKIPROBE_HEADLESS";
/// Environment variable setting the action pacing
pub const ENV_PACING_MS: &str = "WIKIPROBE_PACING_MS";
/// Environment variable pointing at a chromium binary
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

/// Browser launch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chromium_path: None,
            sandbox: true,
        }
    }
}

/// Timeouts, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Page load (CDP request) timeout
    pub page_load_ms: u64,
    /// Default wait for expected conditions
    pub wait_ms: u64,
    /// Polling interval for waits
    pub poll_interval_ms: u64,
    /// Upper bound for a whole case
    pub case_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            page_load_ms: 30_000,
            wait_ms: 10_000,
            poll_interval_ms: 250,
            case_ms: 120_000,
        }
    }
}

impl Timeouts {
    /// Page load timeout as Duration
    #[must_use]
    pub const fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load_ms)
    }

    /// Case timeout as Duration
    #[must_use]
    pub const fn case(&self) -> Duration {
        Duration::from_millis(self.case_ms)
    }
}

/// Optional slow-down so a human can follow a headed run.
///
/// Zero by default. Never used for synchronization: waits poll instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Pause after each notable action
    pub action_ms: u64,
    /// Pause between keystrokes when typing character by character
    pub keystroke_ms: u64,
}

/// Login credentials for the authentication suite
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name
    pub username: String,
    /// Account password (never serialized back out)
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Credentials {
    /// Create credentials
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Multilingual portal
    pub portal_url: String,
    /// Article base of the English edition, without trailing slash
    pub wiki_base: String,
    /// Browser settings
    pub browser: BrowserSettings,
    /// Timeouts
    pub timeouts: Timeouts,
    /// Pacing
    pub pacing: Pacing,
    /// Account for login/logout cases
    pub credentials: Option<Credentials>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            portal_url: "https://www.wikipedia.org/".to_string(),
            wiki_base: "https://en.wikipedia.org/wiki".to_string(),
            browser: BrowserSettings::default(),
            timeouts: Timeouts::default(),
            pacing: Pacing::default(),
            credentials: None,
        }
    }
}

impl ProbeConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> ProbeResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Apply overrides from the process environment
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        match (lookup(ENV_USERNAME), lookup(ENV_PASSWORD)) {
            (Some(user), Some(pass)) if !user.is_empty() => {
                self.credentials = Some(Credentials::new(user, pass));
            }
            (Some(user), None) if !user.is_empty() => {
                let pass = self
                    .credentials
                    .take()
                    .map(|c| c.password)
                    .unwrap_or_default();
                self.credentials = Some(Credentials::new(user, pass));
            }
            (None, Some(pass)) => {
                if let Some(creds) = self.credentials.as_mut() {
                    creds.password = pass;
                }
            }
            _ => {}
        }
        if let Some(value) = lookup(ENV_HEADLESS) {
            self.browser.headless = !matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        if let Some(ms) = lookup(ENV_PACING_MS).and_then(|v| v.trim().parse().ok()) {
            self.pacing.action_ms = ms;
        }
        if let Some(path) = lookup(ENV_CHROMIUM_PATH).filter(|p| !p.is_empty()) {
            self.browser.chromium_path = Some(path);
        }
        self
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> ProbeResult<()> {
        for (name, url) in [("portal_url", &self.portal_url), ("wiki_base", &self.wiki_base)] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ProbeError::config(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.wiki_base.ends_with('/') {
            return Err(ProbeError::config("wiki_base must not end with '/'"));
        }
        let t = &self.timeouts;
        if t.page_load_ms == 0 || t.wait_ms == 0 || t.case_ms == 0 {
            return Err(ProbeError::config("timeouts must be non-zero"));
        }
        if t.poll_interval_ms == 0 || t.poll_interval_ms >= t.wait_ms {
            return Err(ProbeError::config(format!(
                "poll_interval_ms ({}) must be between 1 and wait_ms ({})",
                t.poll_interval_ms, t.wait_ms
            )));
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ProbeError::config("window size must be non-zero"));
        }
        Ok(())
    }

    /// English main page
    #[must_use]
    pub fn main_page_url(&self) -> String {
        self.article_url("Main_Page")
    }

    /// URL of an English article by its page name
    #[must_use]
    pub fn article_url(&self, page: &str) -> String {
        format!("{}/{page}", self.wiki_base)
    }
}
