//! Search from the portal: plain queries, several keywords, special
//! characters, suggestions, empty input, another language, exact phrases,
//! numbers, case and misspelling.

use futures::FutureExt;

use crate::assertion::Assertion;
use crate::driver::{ElementId, WebDriver};
use crate::harness::{CaseOutcome, TestCase, TestSuite};
use crate::locator::By;
use crate::result::ProbeResult;
use crate::session::Session;
use crate::wait::Condition;

const SPANISH_PORTAL: &str = "https://es.wikipedia.org/";

const SEARCH_INPUT: &str = "searchInput";
const SEARCH_RESULTS: &str = "mw-search-results";
const SUGGESTION: &str = "suggestion-link";
const CONTENT_TEXT: &str = "mw-content-text";

/// Build the search suite
#[must_use]
pub fn suite<D: WebDriver + 'static>() -> TestSuite<D> {
    TestSuite::new("search")
        .case(
            TestCase::new("basic_search", |s| basic_search(s).boxed())
                .with_description("Basic search for Albert Einstein")
                .with_priority(1),
        )
        .case(
            TestCase::new("search_with_multiple_keywords", |s| {
                search_with_multiple_keywords(s).boxed()
            })
            .with_description("Search with multiple keywords")
            .with_priority(2),
        )
        .case(
            TestCase::new("search_with_special_characters", |s| {
                search_with_special_characters(s).boxed()
            })
            .with_description("Search with special characters (C++)")
            .with_priority(3),
        )
        .case(
            TestCase::new("search_suggestions", |s| search_suggestions(s).boxed())
                .with_description("Search suggestions appear on typing")
                .with_priority(4),
        )
        .case(
            TestCase::new("empty_search", |s| empty_search(s).boxed())
                .with_description("Submit an empty search and verify behavior")
                .with_priority(5),
        )
        .case(
            TestCase::new("search_in_different_language", |s| {
                search_in_different_language(s).boxed()
            })
            .with_description("Search in Spanish Wikipedia")
            .with_priority(6),
        )
        .case(
            TestCase::new("search_with_quotation_marks", |s| {
                search_with_quotation_marks(s).boxed()
            })
            .with_description("Search with quotation marks for exact phrase")
            .with_priority(7),
        )
        .case(
            TestCase::new("search_with_numbers_and_dates", |s| {
                search_with_numbers_and_dates(s).boxed()
            })
            .with_description("Search with numbers and dates (World War 1914)")
            .with_priority(8),
        )
        .case(
            TestCase::new("search_case_sensitivity", |s| {
                search_case_sensitivity(s).boxed()
            })
            .with_description("Search case sensitivity check")
            .with_priority(9),
        )
        .case(
            TestCase::new("misspelled_search", |s| misspelled_search(s).boxed())
                .with_description("Misspelled search suggestion or redirect for Einstein")
                .with_priority(10),
        )
}

fn title_or_results(title: &str) -> Condition {
    Condition::any([
        Condition::title_contains(title),
        Condition::present(By::class_name(SEARCH_RESULTS)),
    ])
}

/// Open `url` and wait for its search box
async fn search_box<D: WebDriver>(s: &mut Session<D>, url: &str) -> ProbeResult<ElementId> {
    s.open(url).await?;
    s.wait_clickable(By::id(SEARCH_INPUT)).await
}

/// Open `url`, type `query` into the search box and submit it
async fn search<D: WebDriver>(s: &mut Session<D>, url: &str, query: &str) -> ProbeResult<()> {
    let input = search_box(s, url).await?;
    s.driver().send_keys(input, query).await?;
    s.pace().await;
    tracing::debug!(query, "submitting search");
    s.driver().submit(input).await
}

async fn body_text<D: WebDriver>(s: &Session<D>) -> ProbeResult<String> {
    let body = s.driver().find(&By::tag_name("body")).await?;
    s.driver().text(body).await
}

async fn has_results<D: WebDriver>(s: &Session<D>) -> ProbeResult<bool> {
    Ok(!s
        .driver()
        .find_all(&By::class_name(SEARCH_RESULTS))
        .await?
        .is_empty())
}

fn portal<D: WebDriver>(s: &Session<D>) -> String {
    s.config().portal_url.clone()
}

/// A plain query lands on the matching article
pub async fn basic_search<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    search(s, &portal, "Albert Einstein").await?;
    s.wait_for(&Condition::title_contains("Albert Einstein")).await?;
    let title = s.driver().title().await?;
    Assertion::contains(&title, "Albert Einstein")
        .context("page title")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// A several-word query lists results mentioning one of the words
pub async fn search_with_multiple_keywords<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    search(s, &portal, "quantum physics nobel prize").await?;
    let results = s.wait_present(By::class_name(SEARCH_RESULTS)).await?;
    let text = s.driver().text(results).await?.to_lowercase();
    Assertion::is_true(
        ["quantum", "physics", "nobel"]
            .iter()
            .any(|keyword| text.contains(keyword)),
        "results should contain at least one keyword",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// "C++" finds its article or a results list
pub async fn search_with_special_characters<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    search(s, &portal, "C++").await?;
    s.wait_for(&title_or_results("C++")).await?;

    let on_article = s.driver().title().await?.contains("C++");
    let listed = has_results(s).await?;
    Assertion::is_true(on_article || listed, "should find the C++ page or search results")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// Typing a prefix brings up the suggestion dropdown
pub async fn search_suggestions<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    let input = search_box(s, &portal).await?;
    s.type_slowly(input, "United Stat").await?;

    let suggestion = s.wait_visible(By::class_name(SUGGESTION)).await?;
    Assertion::is_true(
        s.driver().is_displayed(suggestion).await?,
        "suggestions should be displayed",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// An empty query either stays put or opens the search page
pub async fn empty_search<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    let input = search_box(s, &portal).await?;
    let original = s.driver().current_url().await?;

    s.driver().clear(input).await?;
    s.pace().await;
    s.driver().submit(input).await?;

    s.wait_for(&Condition::any([
        Condition::url_is(original.as_str()),
        Condition::url_contains("Special:Search"),
    ]))
    .await?;
    let url = s.driver().current_url().await?;
    Assertion::is_true(
        url == original || url.contains("Special:Search"),
        &format!("empty search should stay on the portal or open the search page; was: {url}"),
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// The Spanish edition finds Madrid and shows Spanish text
pub async fn search_in_different_language<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    search(s, SPANISH_PORTAL, "Madrid").await?;
    s.wait_for(&Condition::title_contains("Madrid")).await?;

    let content = s.driver().find(&By::id(CONTENT_TEXT)).await?;
    let text = s.driver().text(content).await?.to_lowercase();
    Assertion::is_true(
        text.contains("españa") || text.contains("capital"),
        "content should be in Spanish about Madrid",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// A quoted phrase finds pages with that exact phrase
pub async fn search_with_quotation_marks<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    let input = search_box(s, &portal).await?;
    s.type_slowly(input, "\"to be or not to be\"").await?;
    s.pace().await;
    s.driver().submit(input).await?;

    s.wait_for(&title_or_results("To be, or not to be")).await?;
    let body = body_text(s).await?.to_lowercase();
    Assertion::contains(&body, "to be or not to be")
        .context("results should contain the exact phrase")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// A query with a year finds the First World War
pub async fn search_with_numbers_and_dates<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    search(s, &portal, "World War 1914").await?;
    s.wait_for(&title_or_results("World War")).await?;

    let body = body_text(s).await?.to_lowercase();
    let first_world_war = body.contains("world war")
        && ["1914", "wwi", "first world war"]
            .iter()
            .any(|marker| body.contains(marker));
    Assertion::is_true(first_world_war, "results should mention World War I").check()?;
    Ok(CaseOutcome::Passed)
}

/// The same words in different case end up on the same page
pub async fn search_case_sensitivity<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);

    search(s, &portal, "python programming").await?;
    s.wait_for(&title_or_results("Python")).await?;
    let lower = s.driver().current_url().await?;

    search(s, &portal, "Python Programming").await?;
    s.wait_for(&title_or_results("Python")).await?;
    let upper = s.driver().current_url().await?;

    Assertion::equals(lower.as_str(), upper.as_str())
        .context("search should be case-insensitive and yield the same URL")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// A misspelled name still surfaces Einstein
pub async fn misspelled_search<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    let portal = portal(s);
    search(s, &portal, "Albrt Einstien").await?;
    s.wait_for(&title_or_results("Einstein")).await?;

    let body = body_text(s).await?.to_lowercase();
    Assertion::contains(&body, "einstein")
        .context("misspelled search should suggest or show Einstein")
        .check()?;
    Ok(CaseOutcome::Passed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::harness::{CaseStatus, SuiteRunner};
    use crate::mock::{FormValues, MockElement, MockLauncher, MockPage, MockSite};
    use std::sync::Arc;

    const PORTAL: &str = "https://www.wikipedia.org/";
    const EINSTEIN: &str = "https://en.wikipedia.org/wiki/Albert_Einstein";
    const CPP: &str = "https://en.wikipedia.org/wiki/C%2B%2B";
    const PYTHON: &str = "https://en.wikipedia.org/wiki/Python_(programming_language)";
    const HAMLET: &str = "https://en.wikipedia.org/wiki/To_be,_or_not_to_be";
    const RESULTS: &str = "https://en.wikipedia.org/w/index.php?title=Special:Search";
    const MADRID: &str = "https://es.wikipedia.org/wiki/Madrid";

    fn body(text: &str) -> MockElement {
        MockElement::new(By::tag_name("body")).text(text)
    }

    fn results(query: &str, listing: &str) -> MockPage {
        MockPage::new(format!("{query} - Search results - Wikipedia"))
            .element(body(&format!("Search results for {query}\n{listing}")))
            .element(MockElement::new(By::class_name(SEARCH_RESULTS)).text(listing))
    }

    fn english_route(form: &FormValues) -> String {
        let query = form.get("search").map_or("", String::as_str);
        match query {
            "" => PORTAL.to_string(),
            "Albert Einstein" => EINSTEIN.to_string(),
            "C++" => CPP.to_string(),
            "\"to be or not to be\"" => HAMLET.to_string(),
            q if q.eq_ignore_ascii_case("python programming") => PYTHON.to_string(),
            q => format!("{RESULTS}&search={}", q.replace(' ', "+")),
        }
    }

    fn portal_page(route: fn(&FormValues) -> String) -> MockPage {
        MockPage::new("Wikipedia")
            .element(MockElement::new(By::id(SEARCH_INPUT)).attr("name", "search"))
            .element(MockElement::new(By::class_name(SUGGESTION)).text("United States"))
            .on_submit(route)
    }

    fn site() -> MockSite {
        MockSite::new()
            .page(PORTAL, portal_page(english_route))
            .page(
                EINSTEIN,
                MockPage::new("Albert Einstein - Wikipedia").element(body("Albert Einstein was a physicist")),
            )
            .page(CPP, MockPage::new("C++ - Wikipedia").element(body("C++ is a language")))
            .page(
                PYTHON,
                MockPage::new("Python (programming language) - Wikipedia")
                    .element(body("Python is a programming language")),
            )
            .page(
                HAMLET,
                MockPage::new("To be, or not to be - Wikipedia")
                    .element(body("\"To be or not to be\" redirects here.")),
            )
            .page(
                format!("{RESULTS}&search=quantum+physics+nobel+prize"),
                results("quantum physics nobel prize", "Nobel Prize in Physics"),
            )
            .page(
                format!("{RESULTS}&search=World+War+1914"),
                results("World War 1914", "World War I began in 1914"),
            )
            .page(
                format!("{RESULTS}&search=Albrt+Einstien"),
                results("Albrt Einstien", "Did you mean: albert einstein"),
            )
            .page(
                SPANISH_PORTAL,
                MockPage::new("Wikipedia, la enciclopedia libre")
                    .element(MockElement::new(By::id(SEARCH_INPUT)).attr("name", "search"))
                    .on_submit(|_: &FormValues| MADRID.to_string()),
            )
            .page(
                MADRID,
                MockPage::new("Madrid - Wikipedia, la enciclopedia libre").element(
                    MockElement::new(By::id(CONTENT_TEXT))
                        .text("Madrid es la capital de España"),
                ),
            )
    }

    fn config() -> Arc<ProbeConfig> {
        let mut config = ProbeConfig::default();
        config.timeouts.wait_ms = 150;
        config.timeouts.poll_interval_ms = 10;
        Arc::new(config)
    }

    async fn run(site: MockSite, filter: Option<&str>) -> crate::harness::SuiteReport {
        SuiteRunner::new(config())
            .with_filter(filter.map(str::to_string))
            .run(&MockLauncher::new(site), &suite())
            .await
    }

    #[tokio::test]
    async fn test_suite_passes_against_scripted_site() {
        let report = run(site(), None).await;
        for case in &report.cases {
            assert_eq!(case.status, CaseStatus::Passed, "{case:?}");
        }
        assert_eq!(report.passed(), 10);
    }

    #[tokio::test]
    async fn test_case_sensitive_urls_fail() {
        fn route(form: &FormValues) -> String {
            let query = form.get("search").map_or("", String::as_str);
            format!("{RESULTS}&search={}", query.replace(' ', "+"))
        }
        let site = site()
            .page(PORTAL, portal_page(route))
            .page(format!("{RESULTS}&search=python+programming"), results("python programming", "Python"))
            .page(format!("{RESULTS}&search=Python+Programming"), results("Python Programming", "Python"));
        let report = run(site, Some("case_sensitivity")).await;
        let case = &report.cases[0];
        assert_eq!(case.status, CaseStatus::Failed);
        assert!(case.message.as_deref().unwrap().contains("case-insensitive"));
    }

    #[tokio::test]
    async fn test_empty_search_landing_elsewhere_fails() {
        fn route(_: &FormValues) -> String {
            "https://www.wikipedia.org/?redirected".to_string()
        }
        let site = site().page(PORTAL, portal_page(route));
        let report = run(site, Some("empty_search")).await;
        let message = report.cases[0].message.clone().unwrap();
        assert!(message.contains("Special:Search"), "{message}");
    }

    #[tokio::test]
    async fn test_hidden_suggestions_fail() {
        let site = site().page(
            PORTAL,
            MockPage::new("Wikipedia")
                .element(MockElement::new(By::id(SEARCH_INPUT)).attr("name", "search"))
                .element(MockElement::new(By::class_name(SUGGESTION)).hidden()),
        );
        let report = run(site, Some("suggestions")).await;
        assert_eq!(report.cases[0].status, CaseStatus::Failed);
    }

    #[tokio::test]
    async fn test_quoted_phrase_is_typed_verbatim() {
        let launcher = MockLauncher::new(site());
        SuiteRunner::new(config())
            .with_filter(Some("quotation".into()))
            .run(&launcher, &suite())
            .await;
        assert_eq!(launcher.launched()[0].history(), vec![PORTAL, HAMLET]);
    }
}
