//! Navigation: portal, logo, links, random article, history, talk,
//! category, table of contents and language switching.
//!
//! Every case gets a fresh browser that `before_each` has already pointed at
//! the English main page.

use futures::FutureExt;

use crate::assertion::Assertion;
use crate::driver::WebDriver;
use crate::harness::{CaseOutcome, TestCase, TestSuite};
use crate::locator::By;
use crate::result::ProbeResult;
use crate::session::Session;
use crate::wait::Condition;

const ARTICLE: &str = "Selenium_(software)";

const LOGO: &str = "a.mw-logo";
const FIRST_CONTENT_LINK: &str = "div#mw-content-text p a[href*='/wiki/']:not([href*=':'])";
const MAIN_MENU_TOGGLE: &str = "vector-main-menu-dropdown-checkbox";
const MAIN_MENU_LIST: &str = "ul.vector-menu-content-list";
const RANDOM_PAGE_LINK: &str = "li#n-randompage a";
const LANGUAGE_BUTTON: &str = "p-lang-btn";
const LANGUAGE_MENU: &str = "div.uls-menu ul";
const FRENCH_LINK: &str = "li.interwiki-fr > a.autonym[lang='fr']";
const FIRST_HEADING: &str = "firstHeading";
const HISTORY_TAB: &str = "#ca-history a";
const PAGE_HISTORY: &str = "pagehistory";
const TALK_TAB: &str = "#ca-talk a";
const CATEGORY_LINK: &str = ".mw-normal-catlinks ul li a";
const TOC_LINK: &str = "ul#mw-panel-toc-list li a[href*='#']:not([href$='#'])";

/// Build the navigation suite
#[must_use]
pub fn suite<D: WebDriver + 'static>() -> TestSuite<D> {
    TestSuite::new("navigation")
        .before_each(|s| open_main_page(s).boxed())
        .case(
            TestCase::new("open_home_page", |s| open_home_page(s).boxed())
                .with_description("Portal page title contains 'Wikipedia'")
                .with_priority(1),
        )
        .case(
            TestCase::new("click_logo_returns_home", |s| click_logo_returns_home(s).boxed())
                .with_description("Clicking the logo on an article returns to the main page")
                .with_priority(2),
        )
        .case(
            TestCase::new("click_first_internal_link", |s| {
                click_first_internal_link(s).boxed()
            })
            .with_description("First internal link in the article body opens another article")
            .with_priority(3),
        )
        .case(
            TestCase::new("open_random_article", |s| open_random_article(s).boxed())
                .with_description("Random article link from the main menu opens a titled page")
                .with_priority(4),
        )
        .case(
            TestCase::new("navigate_back_and_forward", |s| {
                navigate_back_and_forward(s).boxed()
            })
            .with_description("Browser history moves between main page and article")
            .with_priority(5),
        )
        .case(
            TestCase::new("change_language_link", |s| change_language_link(s).boxed())
                .with_description("Interlanguage menu switches the article to French")
                .with_priority(6),
        )
        .case(
            TestCase::new("open_history_tab", |s| open_history_tab(s).boxed())
                .with_description("History tab shows the revision list")
                .with_priority(7),
        )
        .case(
            TestCase::new("open_talk_page", |s| open_talk_page(s).boxed())
                .with_description("Talk tab opens the article's Talk page")
                .with_priority(8),
        )
        .case(
            TestCase::new("navigate_to_category_page", |s| {
                navigate_to_category_page(s).boxed()
            })
            .with_description("Category link in the footer opens a Category page")
            .with_priority(9),
        )
        .case(
            TestCase::new("table_of_contents_navigation", |s| {
                table_of_contents_navigation(s).boxed()
            })
            .with_description("Table of contents entry jumps to a visible section")
            .with_priority(10),
        )
}

async fn open_main_page<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<()> {
    let url = s.config().main_page_url();
    s.open(&url).await
}

async fn open_article<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<String> {
    let url = s.config().article_url(ARTICLE);
    s.open(&url).await?;
    Ok(url)
}

fn any_article<D: WebDriver>(s: &Session<D>) -> ProbeResult<Condition> {
    Condition::url_matches(&format!("^{}/.+", regex::escape(&s.config().wiki_base)))
}

/// The multilingual portal loads with "Wikipedia" in its title
pub async fn open_home_page<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let portal = s.config().portal_url.clone();
    s.open(&portal).await?;
    let title = s.driver().title().await?;
    Assertion::contains(&title, "Wikipedia")
        .context("portal page title")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The logo on an article leads back to the main page
pub async fn click_logo_returns_home<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let logo = s.wait_clickable(By::css(LOGO)).await?;
    s.driver().click(logo).await?;
    s.pace().await;

    let main_page = s.config().main_page_url();
    s.wait_for(&Condition::url_is(main_page.as_str())).await?;
    let url = s.driver().current_url().await?;
    Assertion::equals(main_page.as_str(), url.as_str())
        .context("clicking the logo should navigate to the main page")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The first body link of an article opens a different article
pub async fn click_first_internal_link<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let link = s.wait_clickable(By::css(FIRST_CONTENT_LINK)).await?;
    let original = s.driver().current_url().await?;

    s.driver().click(link).await?;
    s.pace().await;

    s.wait_for(&Condition::url_is_not(original.as_str())).await?;
    s.wait_for(&any_article(s)?).await?;
    let url = s.driver().current_url().await?;
    Assertion::starts_with(&url, &format!("{}/", s.config().wiki_base))
        .context("should navigate to another article")
        .check()?;
    Assertion::not_equals(original.as_str(), url.as_str())
        .context("URL must change after clicking the first link")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The main menu's random-article link opens a page with a title
pub async fn open_random_article<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let article = open_article(s).await?;

    // The menu toggle is a visually hidden checkbox; only a DOM click reaches it.
    let toggle = s.wait_present(By::id(MAIN_MENU_TOGGLE)).await?;
    s.driver().js_click(toggle).await?;
    s.pace().await;
    s.wait_visible(By::css(MAIN_MENU_LIST)).await?;

    let random = s.wait_clickable(By::css(RANDOM_PAGE_LINK)).await?;
    s.driver().click(random).await?;
    s.pace().await;

    s.wait_for(&Condition::url_is_not(article.as_str())).await?;
    s.wait_for(&any_article(s)?).await?;
    let title = s.driver().title().await?;
    Assertion::is_false(
        title.trim().is_empty(),
        "random article should have a non-empty title",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// History back returns to the main page, forward returns to the article
pub async fn navigate_back_and_forward<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let main_page = s.config().main_page_url();
    s.open(&main_page).await?;
    open_article(s).await?;

    s.driver_mut().back().await?;
    s.pace().await;
    s.wait_for(&Condition::url_is(main_page.as_str())).await?;
    let url = s.driver().current_url().await?;
    Assertion::is_true(
        url.ends_with("Main_Page"),
        "back navigation should return to the main page",
    )
    .check()?;

    s.driver_mut().forward().await?;
    s.pace().await;
    s.wait_for(&Condition::url_contains(ARTICLE)).await?;
    let url = s.driver().current_url().await?;
    Assertion::contains(&url, ARTICLE)
        .context("forward navigation should return to the article")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The interlanguage menu switches the article to the French edition
pub async fn change_language_link<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;

    let toggle = s.wait_clickable(By::id(LANGUAGE_BUTTON)).await?;
    s.driver().click(toggle).await?;
    s.wait_visible(By::css(LANGUAGE_MENU)).await?;

    let french = s.wait_clickable(By::css(FRENCH_LINK)).await?;
    s.driver().scroll_into_view(french).await?;
    s.driver().click(french).await?;

    s.wait_for(&Condition::url_contains("fr.wikipedia.org")).await?;
    let url = s.driver().current_url().await?;
    Assertion::contains(&url, "fr.wikipedia.org")
        .context("should be on the French Wikipedia subdomain")
        .check()?;

    let html = s.wait_present(By::tag_name("html")).await?;
    let lang = s.driver().attribute(html, "lang").await?;
    Assertion::equals(&Some("fr".to_string()), &lang)
        .context("<html> lang attribute")
        .check()?;

    let heading = s.wait_visible(By::id(FIRST_HEADING)).await?;
    let heading = s.driver().text(heading).await?;
    Assertion::contains(&heading, "(informatique)")
        .context("heading should show the French article title")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The history tab shows the revision list
pub async fn open_history_tab<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let tab = s.wait_clickable(By::css(HISTORY_TAB)).await?;
    s.driver().click(tab).await?;
    s.pace().await;

    let history = s.wait_visible(By::id(PAGE_HISTORY)).await?;
    Assertion::is_true(
        s.driver().is_displayed(history).await?,
        "revision history list should be displayed",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// The talk tab opens the article's Talk page
pub async fn open_talk_page<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let tab = s.wait_clickable(By::css(TALK_TAB)).await?;
    s.driver().click(tab).await?;
    s.pace().await;

    s.wait_for(&Condition::url_contains(format!("Talk:{ARTICLE}")))
        .await?;
    let title = s.driver().title().await?;
    Assertion::starts_with(&title, "Talk:")
        .context("talk page title")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// A category link at the foot of the article opens a Category page
pub async fn navigate_to_category_page<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let category = s.wait_clickable(By::css(CATEGORY_LINK)).await?;
    s.driver().click(category).await?;
    s.pace().await;

    s.wait_for(&Condition::url_contains("/wiki/Category:")).await?;
    let title = s.driver().title().await?;
    Assertion::starts_with(&title, "Category:")
        .context("category page title")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// A table of contents entry moves to a fragment whose section is visible
pub async fn table_of_contents_navigation<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let entry = s.wait_clickable(By::css(TOC_LINK)).await?;
    s.driver().click(entry).await?;
    s.pace().await;

    s.wait_for(&Condition::url_contains("#")).await?;
    let url = s.driver().current_url().await?;
    let fragment = url.split_once('#').map_or("", |(_, f)| f).to_string();
    Assertion::is_false(fragment.is_empty(), "fragment after '#' should not be empty").check()?;

    let section = s.wait_visible(By::id(fragment)).await?;
    Assertion::is_true(
        s.driver().is_displayed(section).await?,
        "section heading should be visible",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::harness::{CaseStatus, SuiteRunner};
    use crate::mock::{MockDriver, MockElement, MockLauncher, MockPage, MockSite};
    use std::sync::Arc;

    const PORTAL: &str = "https://www.wikipedia.org/";
    const MAIN: &str = "https://en.wikipedia.org/wiki/Main_Page";
    const SELENIUM: &str = "https://en.wikipedia.org/wiki/Selenium_(software)";
    const SELENIUM_FR: &str = "https://fr.wikipedia.org/wiki/Selenium_(informatique)";
    const TESTING: &str = "https://en.wikipedia.org/wiki/Software_testing";
    const RANDOM: &str = "https://en.wikipedia.org/wiki/Special:Random";
    const HISTORY: &str = "https://en.wikipedia.org/w/index.php?title=Selenium_(software)&action=history";
    const TALK: &str = "https://en.wikipedia.org/wiki/Talk:Selenium_(software)";
    const CATEGORY: &str = "https://en.wikipedia.org/wiki/Category:Software_testing_tools";

    fn article() -> MockPage {
        MockPage::new("Selenium (software) - Wikipedia")
            .element(MockElement::new(By::css(LOGO)).navigates_to(MAIN))
            .element(
                MockElement::new(By::css(FIRST_CONTENT_LINK))
                    .text("software testing")
                    .navigates_to(TESTING),
            )
            .element(
                MockElement::new(By::id(MAIN_MENU_TOGGLE))
                    .hidden()
                    .reveals(By::css(MAIN_MENU_LIST)),
            )
            .element(
                MockElement::new(By::css(MAIN_MENU_LIST))
                    .hidden()
                    .child(MockElement::new(By::css(RANDOM_PAGE_LINK)).navigates_to(RANDOM)),
            )
            .element(MockElement::new(By::id(LANGUAGE_BUTTON)).reveals(By::css(LANGUAGE_MENU)))
            .element(
                MockElement::new(By::css(LANGUAGE_MENU))
                    .hidden()
                    .child(MockElement::new(By::css(FRENCH_LINK)).navigates_to(SELENIUM_FR)),
            )
            .element(MockElement::new(By::css(HISTORY_TAB)).navigates_to(HISTORY))
            .element(MockElement::new(By::css(TALK_TAB)).navigates_to(TALK))
            .element(MockElement::new(By::css(CATEGORY_LINK)).navigates_to(CATEGORY))
            .element(
                MockElement::new(By::css(TOC_LINK))
                    .text("History")
                    .navigates_to(format!("{SELENIUM}#History")),
            )
            .element(MockElement::new(By::id("History")).text("History"))
    }

    fn site() -> MockSite {
        MockSite::new()
            .page(PORTAL, MockPage::new("Wikipedia"))
            .page(MAIN, MockPage::new("Wikipedia, the free encyclopedia"))
            .page(SELENIUM, article())
            .page(
                SELENIUM_FR,
                MockPage::new("Selenium (informatique) — Wikipédia")
                    .element(MockElement::new(By::tag_name("html")).attr("lang", "fr"))
                    .element(
                        MockElement::new(By::id(FIRST_HEADING)).text("Selenium (informatique)"),
                    ),
            )
            .page(TESTING, MockPage::new("Software testing - Wikipedia"))
            .page(RANDOM, MockPage::new("Gustav Klimt - Wikipedia"))
            .page(
                HISTORY,
                MockPage::new("Selenium (software): Revision history")
                    .element(MockElement::new(By::id(PAGE_HISTORY))),
            )
            .page(TALK, MockPage::new("Talk:Selenium (software) - Wikipedia"))
            .page(
                CATEGORY,
                MockPage::new("Category:Software testing tools - Wikipedia"),
            )
    }

    fn config() -> Arc<ProbeConfig> {
        let mut config = ProbeConfig::default();
        config.timeouts.wait_ms = 200;
        config.timeouts.poll_interval_ms = 10;
        Arc::new(config)
    }

    #[tokio::test]
    async fn test_suite_passes_against_scripted_site() {
        let launcher = MockLauncher::new(site());
        let report = SuiteRunner::new(config())
            .run(&launcher, &suite())
            .await;
        for case in &report.cases {
            assert_eq!(case.status, CaseStatus::Passed, "{case:?}");
        }
        assert_eq!(report.passed(), 10);
        let launched = launcher.launched();
        assert_eq!(launched.len(), 10);
        assert!(launched
            .iter()
            .all(|d| d.history().first().map(String::as_str) == Some(MAIN)));
    }

    #[tokio::test]
    async fn test_wrong_language_fails() {
        let site = site().page(
            SELENIUM_FR,
            MockPage::new("Selenium")
                .element(MockElement::new(By::tag_name("html")).attr("lang", "en"))
                .element(MockElement::new(By::id(FIRST_HEADING)).text("Selenium")),
        );
        let report = SuiteRunner::new(config())
            .with_filter(Some("change_language_link".into()))
            .run(&MockLauncher::new(site), &suite())
            .await;
        let case = report.case("change_language_link").unwrap();
        assert_eq!(case.status, CaseStatus::Failed);
        assert!(case.message.as_deref().unwrap().contains("lang"));
    }

    #[tokio::test]
    async fn test_dead_logo_times_out() {
        let site = site().page(
            SELENIUM,
            MockPage::new("Selenium (software) - Wikipedia")
                .element(MockElement::new(By::css(LOGO))),
        );
        let report = SuiteRunner::new(config())
            .with_filter(Some("click_logo".into()))
            .run(&MockLauncher::new(site), &suite())
            .await;
        let message = report.cases[0].message.clone().unwrap();
        assert!(message.contains("Timed out"), "{message}");
        assert!(message.contains("Main_Page"), "{message}");
    }

    #[tokio::test]
    async fn test_hidden_section_fails_toc_case() {
        let site = site().page(
            SELENIUM,
            MockPage::new("Selenium (software) - Wikipedia")
                .element(
                    MockElement::new(By::css(TOC_LINK))
                        .navigates_to(format!("{SELENIUM}#History")),
                )
                .element(MockElement::new(By::id("History")).hidden()),
        );
        let mut session = Session::new(MockDriver::new(site), config());
        let err = table_of_contents_navigation(&mut session).await.unwrap_err();
        assert!(err.to_string().contains("By.id: History"));
    }
}
