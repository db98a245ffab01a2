//! Authentication: rejected logins, field validation, password masking,
//! injection strings, login/logout and the CAPTCHA probe.
//!
//! Cases that need a real account read it from the configuration and are
//! skipped when none is set.

use futures::FutureExt;

use crate::assertion::Assertion;
use crate::config::Credentials;
use crate::driver::WebDriver;
use crate::harness::{CaseOutcome, TestCase, TestSuite};
use crate::locator::{xpath_literal, By};
use crate::result::ProbeResult;
use crate::session::Session;
use crate::wait::Condition;

use super::{tolerate_timeout, unique_suffix};

const LOGIN_LINK: &str = "//li[@id='pt-login-2']/a";
const USERNAME: &str = "wpName1";
const PASSWORD: &str = "wpPassword1";
const LOGIN_BUTTON: &str = "wpLoginAttempt";
const ERROR_BOX: &str =
    "form[name='userlogin'] .cdx-message--error, form[name='userlogin'] .mw-message-box-error";
const ANY_ERROR: &str = ".mw-message-box-error, .cdx-message--error";
const BAD_CREDENTIALS: &str = "Incorrect username or password";
const USER_PAGE: &str = "//li[@id='pt-userpage-2']/a";
const USER_MENU: &str = "vector-user-links-dropdown-checkbox";
const LOGOUT_LINK: &str = "//li[@id='pt-logout']/a";

const CAPTCHA_SELECTORS: [&str; 3] = [
    ".mw-captcha-container, #mw-input-captcha, .captcha",
    "input[name='wpCaptchaWord'], input.mw-captcha-input",
    "img.captcha, img[src*='captcha']",
];
const CAPTCHA_MARKERS: [&str; 3] = ["captcha", "human verification", "not a robot"];
const MAX_CAPTCHA_ATTEMPTS: u32 = 5;

/// Username used when a case needs some account name but none is configured
const FALLBACK_USERNAME: &str = "WikiprobeNoSuchUser";
/// Password used when a case needs some password but none is configured
const FALLBACK_PASSWORD: &str = "not-the-password-0";
const DEMO_PASSWORD: &str = "Password123";
const NO_ACCOUNT: &str = "no credentials configured (set WIKIPROBE_USERNAME and WIKIPROBE_PASSWORD)";

const SQL_INJECTIONS: [(&str, &str); 4] = [
    ("quoted or", "' OR '1'='1"),
    ("comment", "admin' --"),
    ("numeric or", "' OR 1=1;--"),
    ("union select", "' UNION SELECT 1,username,password FROM users--"),
];

/// Which login fields are left blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlankFields {
    /// Username only
    Username,
    /// Password only
    Password,
    /// Both fields
    Both,
}

impl BlankFields {
    const fn username(self) -> bool {
        matches!(self, Self::Username | Self::Both)
    }

    const fn password(self) -> bool {
        matches!(self, Self::Password | Self::Both)
    }
}

/// Build the authentication suite
#[must_use]
pub fn suite<D: WebDriver + 'static>() -> TestSuite<D> {
    TestSuite::new("authentication")
        .case(
            TestCase::new("invalid_username", |s| invalid_username(s).boxed())
                .with_description("Unknown username is rejected with an error message")
                .with_priority(1),
        )
        .case(
            TestCase::new("invalid_password", |s| invalid_password(s).boxed())
                .with_description("Wrong password is rejected with an error message")
                .with_priority(2),
        )
        .cases(TestCase::with_rows(
            "empty_credentials",
            "Blank login fields are flagged",
            3,
            [
                ("empty username", BlankFields::Username),
                ("empty password", BlankFields::Password),
                ("both empty", BlankFields::Both),
            ],
            |s, blank| empty_credentials(s, blank).boxed(),
        ))
        .case(
            TestCase::new("password_masking", |s| password_masking(s).boxed())
                .with_description("Password field masks its input")
                .with_priority(4),
        )
        .case(
            TestCase::new("successful_login", |s| successful_login(s).boxed())
                .with_description("Configured account logs in")
                .with_priority(5),
        )
        .cases(TestCase::with_rows(
            "sql_injection_prevention",
            "SQL injection strings do not log in",
            6,
            SQL_INJECTIONS,
            |s, injection| sql_injection_prevention(s, injection).boxed(),
        ))
        .case(
            TestCase::new("successful_logout", |s| successful_logout(s).boxed())
                .with_description("Logged-in account logs out through the user menu")
                .with_priority(7)
                .depends_on("successful_login"),
        )
        .case(
            TestCase::new("captcha_after_failed_attempts", |s| {
                captcha_after_failed_attempts(s).boxed()
            })
            .with_description("Repeated failed logins may bring up a CAPTCHA")
            .with_priority(8),
        )
}

fn user_page_link(username: &str) -> By {
    By::xpath(format!("{USER_PAGE}/span[text()={}]", xpath_literal(username)))
}

fn account<D: WebDriver>(s: &Session<D>) -> Option<Credentials> {
    s.config().credentials.clone()
}

async fn navigate_to_login_page<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<()> {
    let main_page = s.config().main_page_url();
    s.open(&main_page).await?;
    let link = s.wait_clickable(By::xpath(LOGIN_LINK)).await?;
    s.driver().click(link).await?;
    s.pace().await;
    s.wait_visible(By::id(USERNAME)).await?;
    Ok(())
}

async fn perform_login<D: WebDriver>(
    s: &Session<D>,
    username: &str,
    password: &str,
) -> ProbeResult<()> {
    let user_field = s.wait_visible(By::id(USERNAME)).await?;
    let password_field = s.driver().find(&By::id(PASSWORD)).await?;
    let button = s.driver().find(&By::id(LOGIN_BUTTON)).await?;

    s.fill(user_field, username).await?;
    s.fill(password_field, password).await?;
    s.pace().await;
    s.driver().click(button).await?;
    s.pace().await;
    Ok(())
}

async fn expect_rejected<D: WebDriver>(s: &Session<D>) -> ProbeResult<()> {
    let error = s.wait_visible(By::css(ERROR_BOX)).await?;
    let text = s.driver().text(error).await?;
    Assertion::contains(&text, BAD_CREDENTIALS)
        .context("error should indicate invalid credentials")
        .check()
}

async fn field_is_required<D: WebDriver>(s: &Session<D>, id: &str) -> ProbeResult<bool> {
    // The submit may have re-rendered the form; look the field up again.
    let Some(field) = s.driver().find_first(&By::id(id)).await? else {
        return Ok(false);
    };
    Ok(s
        .driver()
        .attribute(field, "required")
        .await?
        .is_some_and(|v| !v.is_empty()))
}

/// Whether visible page text hints at a CAPTCHA challenge
#[must_use]
pub fn text_suggests_captcha(text: &str) -> bool {
    let lower = text.to_lowercase();
    CAPTCHA_MARKERS.iter().any(|marker| lower.contains(marker))
}

async fn captcha_present<D: WebDriver>(s: &Session<D>) -> ProbeResult<bool> {
    for css in CAPTCHA_SELECTORS {
        if s.driver().find_first(&By::css(css)).await?.is_some() {
            return Ok(true);
        }
    }
    let body = match s.driver().find_first(&By::tag_name("body")).await? {
        Some(body) => s.driver().text(body).await?,
        None => String::new(),
    };
    Ok(text_suggests_captcha(&body))
}

/// A made-up username is rejected
pub async fn invalid_username<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let password = account(s).map_or_else(|| FALLBACK_PASSWORD.to_string(), |c| c.password);
    let username = format!("invalid_user_{}", unique_suffix());

    navigate_to_login_page(s).await?;
    tracing::debug!(%username, "logging in with unknown username");
    perform_login(s, &username, &password).await?;
    expect_rejected(s).await?;
    Ok(CaseOutcome::Passed)
}

/// A wrong password is rejected
pub async fn invalid_password<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let username = account(s).map_or_else(|| FALLBACK_USERNAME.to_string(), |c| c.username);
    let password = format!("invalid_pass_{}", unique_suffix());

    navigate_to_login_page(s).await?;
    perform_login(s, &username, &password).await?;
    expect_rejected(s).await?;
    Ok(CaseOutcome::Passed)
}

/// Submitting with blank fields is flagged, by an error box or a `required` field
pub async fn empty_credentials<D: WebDriver>(
    s: &mut Session<D>,
    blank: BlankFields,
) -> ProbeResult<CaseOutcome> {
    let configured = account(s);
    let username = if blank.username() {
        String::new()
    } else {
        configured
            .as_ref()
            .map_or(FALLBACK_USERNAME, |c| c.username.as_str())
            .to_string()
    };
    let password = if blank.password() {
        String::new()
    } else {
        configured
            .as_ref()
            .map_or(FALLBACK_PASSWORD, |c| c.password.as_str())
            .to_string()
    };

    navigate_to_login_page(s).await?;
    perform_login(s, &username, &password).await?;

    let mut flagged = !s.driver().find_all(&By::css(ANY_ERROR)).await?.is_empty();
    if !flagged && username.is_empty() {
        flagged = field_is_required(s, USERNAME).await?;
    }
    if !flagged && password.is_empty() {
        flagged = field_is_required(s, PASSWORD).await?;
    }
    Assertion::is_true(flagged, &format!("validation error should be detected for {blank:?}"))
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The password field is of type `password` while typing into it
pub async fn password_masking<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    navigate_to_login_page(s).await?;
    let field = s.wait_visible(By::id(PASSWORD)).await?;
    s.driver().clear(field).await?;
    s.type_slowly(field, DEMO_PASSWORD).await?;

    let typed = s.driver().attribute(field, "value").await?;
    Assertion::equals(&Some(DEMO_PASSWORD.to_string()), &typed)
        .context("password field value")
        .check()?;
    let kind = s.driver().attribute(field, "type").await?;
    Assertion::equals(&Some("password".to_string()), &kind)
        .context("password field should be masked")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The configured account logs in and its user page link appears
pub async fn successful_login<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let Some(account) = account(s) else {
        return Ok(CaseOutcome::Skipped(NO_ACCOUNT.to_string()));
    };
    navigate_to_login_page(s).await?;
    perform_login(s, &account.username, &account.password).await?;

    let link = s.wait_visible(user_page_link(&account.username)).await?;
    Assertion::is_true(
        s.driver().is_displayed(link).await?,
        "user should be logged in",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// An injection string used as both username and password does not log in
pub async fn sql_injection_prevention<D: WebDriver>(
    s: &mut Session<D>,
    injection: &str,
) -> ProbeResult<CaseOutcome> {
    navigate_to_login_page(s).await?;
    perform_login(s, injection, injection).await?;

    tolerate_timeout(
        s.wait_for(&Condition::any([
            Condition::visible(By::css(ERROR_BOX)),
            Condition::present(By::xpath(USER_PAGE)),
        ]))
        .await,
    )?;

    let links = s.driver().find_all(&By::xpath(USER_PAGE)).await?;
    let rejected = match links.first() {
        None => true,
        Some(&first) => s.driver().text(first).await?.trim() != injection,
    };
    Assertion::is_true(
        rejected,
        "SQL injection attempt should not result in a successful login",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// A logged-in account logs out through the user menu
pub async fn successful_logout<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let Some(account) = account(s) else {
        return Ok(CaseOutcome::Skipped(NO_ACCOUNT.to_string()));
    };
    navigate_to_login_page(s).await?;
    perform_login(s, &account.username, &account.password).await?;
    s.wait_visible(user_page_link(&account.username)).await?;

    // The dropdown toggle is a visually hidden checkbox.
    let menu = s.wait_present(By::id(USER_MENU)).await?;
    s.driver().js_click(menu).await?;
    s.pace().await;

    let logout = s.wait_clickable(By::xpath(LOGOUT_LINK)).await?;
    s.driver().click(logout).await?;
    s.pace().await;

    let login = s.wait_clickable(By::xpath(LOGIN_LINK)).await?;
    Assertion::is_true(
        s.driver().is_displayed(login).await?,
        "login link should be visible after logout",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// Fail logins repeatedly and look for a CAPTCHA. Its absence is only a warning.
pub async fn captcha_after_failed_attempts<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    navigate_to_login_page(s).await?;
    let login_url = s.driver().current_url().await?;
    let shown = Condition::any(
        std::iter::once(Condition::visible(By::css(ERROR_BOX)))
            .chain(CAPTCHA_SELECTORS.map(|css| Condition::present(By::css(css)))),
    );

    for attempt in 1..=MAX_CAPTCHA_ATTEMPTS {
        let suffix = unique_suffix();
        perform_login(
            s,
            &format!("invalid_user_{suffix}"),
            &format!("invalid_pass_{suffix}"),
        )
        .await?;
        tolerate_timeout(s.wait_for(&shown).await)?;

        if captcha_present(s).await? {
            tracing::info!(attempt, "CAPTCHA shown");
            return Ok(CaseOutcome::Passed);
        }
        tracing::debug!(attempt, "no CAPTCHA yet");
        if attempt < MAX_CAPTCHA_ATTEMPTS {
            s.open(&login_url).await?;
            s.wait_visible(By::id(USERNAME)).await?;
        }
    }

    Ok(CaseOutcome::Warned(format!(
        "no CAPTCHA after {MAX_CAPTCHA_ATTEMPTS} failed login attempts"
    )))
}
