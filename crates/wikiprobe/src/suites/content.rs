//! Article content: featured article, language links, table of contents,
//! external links, images, references, citations, infobox, related articles
//! and footer.
//!
//! The whole suite shares one browser session. Markup differs between skins
//! and over time, so several cases try more than one lookup before giving up.

use futures::FutureExt;
use regex::Regex;

use crate::assertion::Assertion;
use crate::driver::{ElementId, WebDriver};
use crate::harness::{CaseOutcome, SessionScope, TestCase, TestSuite};
use crate::locator::{xpath_literal, By};
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use crate::wait::Condition;

use super::tolerate_timeout;

const ARTICLE: &str = "Java_(programming_language)";

const FEATURED_ARTICLE: &str = "mp-tfa";

const LANGUAGE_BUTTON: &str = ".mw-interlanguage-selector, .uls-settings-trigger, \
     .interlanguage-link-target, .vector-dropdown-label-language, a[data-jsl10n='otherlanguages']";
const LANGUAGE_MENU_LINKS: &str =
    ".uls-language-list a, .interlanguage-link a, .mw-interlanguage-selector + * a";
const INTERLANGUAGE_LINKS: &str = ".interlanguage-link a, .mw-interwiki-container a";
const OTHER_EDITION: &str = r"^https?://([a-z]{2})(\.m)?\.wikipedia\.org/";

const TOC_ID: &str = "toc";
const TOC_CONTAINER: &str = ".vector-toc, .mw-table-of-contents";
const HEADLINES: &str = ".mw-headline";
const TOC_TOPICS: [&str; 3] = ["history", "syntax", "feature"];

const EXTERNAL_LINKS_ID: &str = "External_links";
const EXTERNAL_LINKS_HEADING: &str = "//span[contains(text(), 'External links')]";
const EXTERNAL_CLASS: &str = ".external";

const INFOBOX_IMAGES: &str = ".infobox img";
const REFERENCES_ID: &str = "References";
const REFERENCE_ITEMS: &str = ".references li";
const REFERENCES_CLASS: &str = "references";
const CITATIONS: &str = ".references cite";
const CITATION_LINKS: &str = ".references a.external";
const INFOBOX_CLASS: &str = "infobox";
const INFOBOX_TOPICS: [&str; 3] = ["paradigm", "developer", "version"];
const SEE_ALSO_ID: &str = "See_also";
const RELATED_LIMIT: usize = 5;

const FOOTER: &str = "#footer, .mw-footer, footer";
const COPYRIGHT_CLASS: &str = ".copyright";

/// Build the content suite
#[must_use]
pub fn suite<D: WebDriver + 'static>() -> TestSuite<D> {
    TestSuite::new("content")
        .with_scope(SessionScope::PerSuite)
        .case(
            TestCase::new("featured_article_section", |s| {
                featured_article_section(s).boxed()
            })
            .with_description("Main page shows a substantial featured article blurb")
            .with_priority(1),
        )
        .case(
            TestCase::new("language_links", |s| language_links(s).boxed())
                .with_description("Article links to other language editions")
                .with_priority(2),
        )
        .case(
            TestCase::new("table_of_contents", |s| table_of_contents(s).boxed())
                .with_description("Table of contents lists the expected sections")
                .with_priority(3),
        )
        .case(
            TestCase::new("external_links", |s| external_links(s).boxed())
                .with_description("Article has external links with absolute URLs")
                .with_priority(4),
        )
        .case(
            TestCase::new("image_presence", |s| image_presence(s).boxed())
                .with_description("Infobox image has a source URL and alt text")
                .with_priority(5),
        )
        .case(
            TestCase::new("references_section", |s| references_section(s).boxed())
                .with_description("References section lists at least five entries")
                .with_priority(6),
        )
        .case(
            TestCase::new("citation_format", |s| citation_format(s).boxed())
                .with_description("Citations use <cite> and link out")
                .with_priority(7),
        )
        .case(
            TestCase::new("infobox_content", |s| infobox_content(s).boxed())
                .with_description("Infobox has rows of key details")
                .with_priority(8),
        )
        .case(
            TestCase::new("related_articles", |s| related_articles(s).boxed())
                .with_description("See also links to other articles")
                .with_priority(9),
        )
        .case(
            TestCase::new("page_footer", |s| page_footer(s).boxed())
                .with_description("Footer carries policy, terms, about and copyright")
                .with_priority(10),
        )
}

async fn open_article<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<()> {
    let url = s.config().article_url(ARTICLE);
    s.open(&url).await
}

/// Language code of the edition a wiki base URL points at (`en` for `https://en.wikipedia.org/wiki`)
#[must_use]
pub fn edition_code(wiki_base: &str) -> Option<&str> {
    let host = wiki_base
        .strip_prefix("https://")
        .or_else(|| wiki_base.strip_prefix("http://"))?;
    host.split(['.', '/']).next().filter(|code| !code.is_empty())
}

/// Absolute link leaving Wikipedia
#[must_use]
pub fn is_external_href(href: &str) -> bool {
    href.starts_with("http") && !href.contains("wikipedia.org")
}

/// Lists following a section heading, for legacy and current heading
/// markup. Headings are matched by anchor id or by their visible title.
#[must_use]
pub fn section_list_xpaths(section_id: &str) -> [String; 3] {
    let title = xpath_literal(&section_id.replace('_', " "));
    [
        format!(
            "//span[@id='{section_id}' or contains(text(), {title})]\
             /ancestor::h2/following-sibling::ul[1]"
        ),
        format!("//h2[@id='{section_id}']/parent::div/following-sibling::ul[1]"),
        format!("//h2[contains(text(), {title})]/parent::div/following-sibling::ul[1]"),
    ]
}

async fn section_links<D: WebDriver>(
    s: &Session<D>,
    section_id: &str,
) -> ProbeResult<Vec<ElementId>> {
    for xpath in section_list_xpaths(section_id) {
        if let Some(list) = s.driver().find_first(&By::xpath(xpath)).await? {
            let links = s.driver().find_all_within(list, &By::tag_name("a")).await?;
            if !links.is_empty() {
                return Ok(links);
            }
        }
    }
    Ok(Vec::new())
}

/// Anchors on the page whose `href` satisfies `keep`, in document order
async fn links_where<D: WebDriver>(
    s: &Session<D>,
    keep: impl Fn(&str) -> bool + Send,
    limit: usize,
) -> ProbeResult<Vec<ElementId>> {
    let anchors = s.driver().find_all(&By::tag_name("a")).await?;
    let hrefs = s.driver().attribute_all(&anchors, "href").await?;
    Ok(anchors
        .into_iter()
        .zip(hrefs)
        .filter(|(_, href)| href.as_deref().is_some_and(|h| keep(h)))
        .map(|(el, _)| el)
        .take(limit)
        .collect())
}

async fn exists<D: WebDriver>(s: &Session<D>, by: By) -> ProbeResult<bool> {
    Ok(s.driver().find_first(&by).await?.is_some())
}

/// The main page's featured article blurb is visible and substantial
pub async fn featured_article_section<D: WebDriver>(
    s: &mut Session<D>,
) -> ProbeResult<CaseOutcome> {
    let main_page = s.config().main_page_url();
    s.open(&main_page).await?;

    let section = s.wait_visible(By::id(FEATURED_ARTICLE)).await?;
    let text = s.driver().text(section).await?;
    Assertion::is_true(
        s.driver().is_displayed(section).await?,
        "featured article section is not displayed",
    )
    .check()?;
    Assertion::is_false(text.trim().is_empty(), "featured article section is empty").check()?;
    Assertion::is_true(
        text.chars().count() > 100,
        "featured article content is too short",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

async fn find_language_links<D: WebDriver>(
    s: &Session<D>,
    pattern: &Regex,
    own_edition: Option<&str>,
) -> ProbeResult<Vec<ElementId>> {
    if let Some(button) = s.driver().find_first(&By::css(LANGUAGE_BUTTON)).await? {
        match s.driver().click(button).await {
            Ok(()) => s.pace().await,
            Err(e) => tracing::debug!(error = %e, "language selector not clickable"),
        }
        let links = s.driver().find_all(&By::css(LANGUAGE_MENU_LINKS)).await?;
        if !links.is_empty() {
            return Ok(links);
        }
    }

    let links = s.driver().find_all(&By::css(INTERLANGUAGE_LINKS)).await?;
    if !links.is_empty() {
        return Ok(links);
    }

    links_where(
        s,
        |href| {
            pattern
                .captures(href)
                .and_then(|caps| caps.get(1))
                .is_some_and(|code| Some(code.as_str()) != own_edition)
        },
        usize::MAX,
    )
    .await
}

/// The article links to other language editions. None found is a warning.
pub async fn language_links<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let pattern = Regex::new(OTHER_EDITION).map_err(|e| ProbeError::InvalidPattern {
        pattern: OTHER_EDITION.to_string(),
        message: e.to_string(),
    })?;
    let own_edition = edition_code(&s.config().wiki_base).map(str::to_string);

    let links = match find_language_links(s, &pattern, own_edition.as_deref()).await {
        Ok(links) => links,
        Err(e) => return Ok(CaseOutcome::Warned(format!("language link lookup failed: {e}"))),
    };
    let Some(&first) = links.first() else {
        return Ok(CaseOutcome::Warned("no language links found".to_string()));
    };
    tracing::debug!(count = links.len(), "language links found");

    let href = match s.driver().attribute(first, "href").await {
        Ok(href) => href,
        Err(e) => return Ok(CaseOutcome::Warned(format!("language link unreadable: {e}"))),
    };
    Assertion::is_some(&href, "href on the language link").check()?;
    Assertion::starts_with(href.as_deref().unwrap_or_default(), "http")
        .context("language link should have a valid URL")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The table of contents is visible and names familiar sections
pub async fn table_of_contents<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let toc = s
        .waiter()
        .element(
            s.driver(),
            &Condition::any([
                Condition::visible(By::id(TOC_ID)),
                Condition::visible(By::css(TOC_CONTAINER)),
            ]),
        )
        .await?;
    Assertion::is_true(
        s.driver().is_displayed(toc).await?,
        "table of contents is not displayed",
    )
    .check()?;

    let mut entries = s.driver().find_all_within(toc, &By::tag_name("a")).await?;
    if entries.is_empty() {
        entries = s.driver().find_all(&By::css(HEADLINES)).await?;
    }
    Assertion::at_least(entries.len(), 3, "sections in the table of contents").check()?;

    let texts = s.driver().text_all(&entries).await?;
    let familiar = texts.iter().map(|t| t.to_lowercase()).any(|text| {
        TOC_TOPICS.iter().any(|topic| text.contains(topic))
    });
    Assertion::is_true(
        familiar,
        "article should include a History, Syntax or Features section",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

/// The article has at least one external link with an absolute URL
pub async fn external_links<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    s.scroll_to_fraction(1.0).await?;
    s.pace().await;

    tolerate_timeout(
        s.wait_for(&Condition::any([
            Condition::visible(By::id(EXTERNAL_LINKS_ID)),
            Condition::visible(By::xpath(EXTERNAL_LINKS_HEADING)),
        ]))
        .await,
    )?;

    let mut links = section_links(s, EXTERNAL_LINKS_ID).await?;
    if links.is_empty() {
        links = s.driver().find_all(&By::css(EXTERNAL_CLASS)).await?;
    }
    if links.is_empty() {
        links = links_where(s, is_external_href, usize::MAX).await?;
    }

    let Some(&first) = links.first() else {
        return Err(ProbeError::assertion(
            "article should have at least one external link",
        ));
    };
    let href = s.driver().attribute(first, "href").await?;
    Assertion::is_some(&href, "href on the external link").check()?;
    Assertion::starts_with(href.as_deref().unwrap_or_default(), "http")
        .context("external link should have a valid URL")
        .check()?;
    Ok(CaseOutcome::Passed)
}

/// The infobox carries an image with an absolute source and alt text
pub async fn image_presence<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let images = s.driver().find_all(&By::css(INFOBOX_IMAGES)).await?;
    let Some(&image) = images.first() else {
        return Err(ProbeError::assertion(
            "article should have at least one image in the infobox",
        ));
    };

    let src = s.driver().attribute(image, "src").await?.unwrap_or_default();
    Assertion::starts_with(&src, "http")
        .context("image source should be a valid URL")
        .check()?;
    let alt = s.driver().attribute(image, "alt").await?;
    Assertion::is_some(&alt, "alt text on the infobox image").check()?;
    Ok(CaseOutcome::Passed)
}

/// The references section is visible with at least five entries
pub async fn references_section<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    s.scroll_to_fraction(0.8).await?;
    s.pace().await;

    let heading = s.wait_visible(By::id(REFERENCES_ID)).await?;
    Assertion::is_true(
        s.driver().is_displayed(heading).await?,
        "references section should be present",
    )
    .check()?;
    let references = s.driver().find_all(&By::css(REFERENCE_ITEMS)).await?;
    Assertion::at_least(references.len(), 5, "references").check()?;
    Ok(CaseOutcome::Passed)
}

/// Citations are marked up with `<cite>` and some link out
pub async fn citation_format<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    s.scroll_to_fraction(0.8).await?;
    s.pace().await;

    s.wait_present(By::class_name(REFERENCES_CLASS)).await?;
    let citations = s.driver().find_all(&By::css(CITATIONS)).await?;
    Assertion::at_least(citations.len(), 1, "<cite> elements in the references").check()?;
    let links = s.driver().find_all(&By::css(CITATION_LINKS)).await?;
    Assertion::at_least(links.len(), 1, "external links in the citations").check()?;
    Ok(CaseOutcome::Passed)
}

/// The infobox has several rows naming key details
pub async fn infobox_content<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    let infobox = s.wait_visible(By::class_name(INFOBOX_CLASS)).await?;
    Assertion::is_true(
        s.driver().is_displayed(infobox).await?,
        "infobox should be displayed",
    )
    .check()?;

    let rows = s.driver().find_all_within(infobox, &By::tag_name("tr")).await?;
    Assertion::at_least(rows.len(), 3, "infobox rows").check()?;

    let text = s.driver().text(infobox).await?.to_lowercase();
    Assertion::is_true(
        INFOBOX_TOPICS.iter().any(|topic| text.contains(topic)),
        "infobox should mention paradigm, developer or version",
    )
    .check()?;
    Ok(CaseOutcome::Passed)
}

async fn related_links<D: WebDriver>(s: &Session<D>) -> ProbeResult<Vec<ElementId>> {
    let links = section_links(s, SEE_ALSO_ID).await?;
    if !links.is_empty() {
        return Ok(links);
    }
    links_where(
        s,
        |href| href.contains("wikipedia.org/wiki/") && !href.contains(ARTICLE),
        RELATED_LIMIT,
    )
    .await
}

/// "See also" links to other articles. None found is a warning.
pub async fn related_articles<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    s.scroll_to_fraction(0.7).await?;
    s.pace().await;

    let links = match related_links(s).await {
        Ok(links) => links,
        Err(e) => return Ok(CaseOutcome::Warned(format!("related article lookup failed: {e}"))),
    };
    let Some(&first) = links.first() else {
        return Ok(CaseOutcome::Warned("no related article links found".to_string()));
    };
    let href = match s.driver().attribute(first, "href").await {
        Ok(href) => href,
        Err(e) => return Ok(CaseOutcome::Warned(format!("related article link unreadable: {e}"))),
    };
    Assertion::is_some(&href, "href on the related article link").check()?;
    Assertion::contains(href.as_deref().unwrap_or_default(), "wikipedia.org/wiki/")
        .context("related article should link to another Wikipedia page")
        .check()?;
    Ok(CaseOutcome::Passed)
}

async fn check_footer<D: WebDriver>(s: &Session<D>, footer: ElementId) -> ProbeResult<()> {
    let text = s.driver().text(footer).await?.to_lowercase();

    let privacy =
        text.contains("privacy") || exists(s, By::link_text("Privacy policy")).await?;
    let terms = text.contains("terms") || exists(s, By::partial_link_text("Terms of Use")).await?;
    let about =
        text.contains("about wikipedia") || exists(s, By::partial_link_text("About")).await?;
    Assertion::is_true(privacy, "footer should link to the Privacy Policy").check()?;
    Assertion::is_true(terms, "footer should link to the Terms of Use").check()?;
    Assertion::is_true(about, "footer should link to About Wikipedia").check()?;

    let copyright = text.contains('©')
        || text.contains("copyright")
        || text.contains("wikimedia foundation")
        || exists(s, By::css(COPYRIGHT_CLASS)).await?;
    Assertion::is_true(copyright, "footer should carry copyright information").check()
}

async fn check_policy_links<D: WebDriver>(s: &Session<D>) -> ProbeResult<()> {
    let anchors = s.driver().find_all(&By::tag_name("a")).await?;
    let texts = s.driver().text_all(&anchors).await?;
    let found = texts.iter().map(|t| t.to_lowercase()).any(|text| {
        text.contains("privacy") || text.contains("terms") || text.contains("about")
    });
    Assertion::is_true(
        found,
        "page should link to the Privacy Policy, Terms of Use or About Wikipedia",
    )
    .check()
}

/// The footer carries the policy, terms, about and copyright notices
pub async fn page_footer<D: WebDriver>(s: &mut Session<D>) -> ProbeResult<CaseOutcome> {
    open_article(s).await?;
    s.scroll_to_fraction(1.0).await?;
    s.pace().await;

    match s.wait_visible(By::css(FOOTER)).await {
        Ok(footer) => check_footer(s, footer).await?,
        Err(ProbeError::Timeout { .. }) => {
            tracing::warn!("footer never became visible, scanning page links instead");
            check_policy_links(s).await?;
        }
        Err(e) => return Err(e),
    }
    Ok(CaseOutcome::Passed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ProbeConfig;
    use crate::harness::{CaseStatus, SuiteRunner};
    use crate::mock::{MockElement, MockLauncher, MockPage, MockSite};
    use std::sync::Arc;

    const MAIN: &str = "https://en.wikipedia.org/wiki/Main_Page";
    const JAVA: &str = "https://en.wikipedia.org/wiki/Java_(programming_language)";

    fn link(by: By, href: &str, text: &str) -> MockElement {
        MockElement::new(by)
            .matching(By::tag_name("a"))
            .attr("href", href)
            .text(text)
    }

    fn anchor(href: &str, text: &str) -> MockElement {
        MockElement::new(By::tag_name("a")).attr("href", href).text(text)
    }

    fn main_page() -> MockPage {
        MockPage::new("Wikipedia, the free encyclopedia").element(
            MockElement::new(By::id(FEATURED_ARTICLE)).text(
                "The Battle of Hastings was fought on 14 October 1066 between the Norman-French \
                 army of William, the Duke of Normandy, and an English army. (Full article...)",
            ),
        )
    }

    fn article() -> MockPage {
        let mut page = MockPage::new("Java (programming language) - Wikipedia")
            .element(MockElement::new(By::css(LANGUAGE_BUTTON)).text("45 languages"))
            .element(link(
                By::css(LANGUAGE_MENU_LINKS),
                "https://de.wikipedia.org/wiki/Java_(Programmiersprache)",
                "Deutsch",
            ))
            .element(
                MockElement::new(By::css(TOC_CONTAINER))
                    .child(anchor("#History", "History"))
                    .child(anchor("#Syntax", "Syntax"))
                    .child(anchor("#Editions", "Editions")),
            )
            .element(MockElement::new(By::id(EXTERNAL_LINKS_ID)).text("External links"))
            .element(
                MockElement::new(By::xpath(section_list_xpaths(EXTERNAL_LINKS_ID)[1].clone()))
                    .child(anchor("https://dev.java/", "Official website")),
            )
            .element(
                MockElement::new(By::css(INFOBOX_IMAGES))
                    .attr("src", "https://upload.wikimedia.org/java-logo.svg.png")
                    .attr("alt", "Java logo"),
            )
            .element(
                MockElement::new(By::class_name(INFOBOX_CLASS))
                    .child(MockElement::new(By::tag_name("tr")).text("Paradigm Multi-paradigm"))
                    .child(MockElement::new(By::tag_name("tr")).text("Developer Oracle"))
                    .child(MockElement::new(By::tag_name("tr")).text("First appeared 1995")),
            )
            .element(MockElement::new(By::id(REFERENCES_ID)).text("References"))
            .element(
                MockElement::new(By::class_name(REFERENCES_CLASS))
                    .child(MockElement::new(By::css(CITATIONS)).text("Gosling, James"))
                    .child(MockElement::new(By::css(CITATION_LINKS)).attr("href", "https://example.com")),
            )
            .element(
                MockElement::new(By::xpath(section_list_xpaths(SEE_ALSO_ID)[0].clone()))
                    .child(anchor("https://en.wikipedia.org/wiki/JavaScript", "JavaScript")),
            )
            .element(
                MockElement::new(By::css(FOOTER)).text(
                    "Text is available under the Creative Commons License. Wikipedia is a \
                     registered trademark of the Wikimedia Foundation. Privacy policy \
                     About Wikipedia Terms of Use",
                ),
            );
        for n in 1..=6 {
            page = page.element(MockElement::new(By::css(REFERENCE_ITEMS)).text(format!("ref {n}")));
        }
        page
    }

    fn site(article: MockPage) -> MockSite {
        MockSite::new().page(MAIN, main_page()).page(JAVA, article)
    }

    fn config() -> Arc<ProbeConfig> {
        let mut config = ProbeConfig::default();
        config.timeouts.wait_ms = 150;
        config.timeouts.poll_interval_ms = 10;
        Arc::new(config)
    }

    async fn run_one(article: MockPage, case: &str) -> crate::harness::CaseReport {
        let report = SuiteRunner::new(config())
            .with_filter(Some(case.to_string()))
            .run(&MockLauncher::new(site(article)), &suite())
            .await;
        report.case(case).cloned().unwrap()
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn test_edition_code() {
            assert_eq!(edition_code("https://en.wikipedia.org/wiki"), Some("en"));
            assert_eq!(edition_code("http://fr.wikipedia.org"), Some("fr"));
            assert_eq!(edition_code("en.wikipedia.org/wiki"), None);
        }

        #[test]
        fn test_is_external_href() {
            assert!(is_external_href("https://dev.java/"));
            assert!(!is_external_href("https://en.wikipedia.org/wiki/Java"));
            assert!(!is_external_href("/wiki/Java"));
        }

        #[test]
        fn test_section_xpaths_cover_both_markups() {
            let [legacy, current, titled] = section_list_xpaths("See_also");
            assert_eq!(
                legacy,
                "//span[@id='See_also' or contains(text(), 'See also')]\
                 /ancestor::h2/following-sibling::ul[1]"
            );
            assert!(current.starts_with("//h2[@id='See_also']"));
            assert!(titled.starts_with("//h2[contains(text(), 'See also')]"));
        }

        #[test]
        fn test_other_edition_pattern() {
            let pattern = Regex::new(OTHER_EDITION).unwrap();
            let code = |href: &str| {
                pattern
                    .captures(href)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            };
            assert_eq!(code("https://de.wikipedia.org/wiki/Java").as_deref(), Some("de"));
            assert_eq!(code("https://fr.m.wikipedia.org/wiki/Java").as_deref(), Some("fr"));
            assert_eq!(code("https://commons.wikimedia.org/wiki/Java"), None);
        }
    }

    mod suite_tests {
        use super::*;

        #[tokio::test]
        async fn test_suite_passes_in_one_session() {
            let launcher = MockLauncher::new(site(article()));
            let report = SuiteRunner::new(config()).run(&launcher, &suite()).await;
            for case in &report.cases {
                assert_eq!(case.status, CaseStatus::Passed, "{case:?}");
            }
            assert_eq!(report.passed(), 10);
            assert_eq!(launcher.launched().len(), 1);
            assert!(launcher.launched()[0].is_closed());
        }

        #[tokio::test]
        async fn test_language_scan_skips_own_edition() {
            let page = MockPage::new("Java")
                .element(anchor("https://en.wikipedia.org/wiki/Java", "Java"))
                .element(anchor("https://fr.wikipedia.org/wiki/Java_(langage)", "Français"));
            let case = run_one(page, "language_links").await;
            assert_eq!(case.status, CaseStatus::Passed);
        }

        #[tokio::test]
        async fn test_no_language_links_warns() {
            let page = MockPage::new("Java")
                .element(anchor("https://en.wikipedia.org/wiki/Java", "Java"));
            let case = run_one(page, "language_links").await;
            assert_eq!(case.status, CaseStatus::Warned);
            assert_eq!(case.message.as_deref(), Some("no language links found"));
        }

        #[tokio::test]
        async fn test_external_links_fall_back_to_href_scan() {
            let page = MockPage::new("Java")
                .element(anchor("https://en.wikipedia.org/wiki/Sun", "Sun"))
                .element(anchor("https://openjdk.org/", "OpenJDK"));
            let case = run_one(page, "external_links").await;
            assert_eq!(case.status, CaseStatus::Passed);
        }

        #[tokio::test]
        async fn test_missing_infobox_image_fails() {
            let case = run_one(MockPage::new("Java"), "image_presence").await;
            assert_eq!(case.status, CaseStatus::Failed);
            assert!(case.message.unwrap().contains("image in the infobox"));
        }

        #[tokio::test]
        async fn test_too_few_references_fail() {
            let page = MockPage::new("Java")
                .element(MockElement::new(By::id(REFERENCES_ID)))
                .element(MockElement::new(By::css(REFERENCE_ITEMS)));
            let case = run_one(page, "references_section").await;
            assert_eq!(case.status, CaseStatus::Failed);
            assert!(case.message.unwrap().contains("expected at least 5 references, found 1"));
        }

        #[tokio::test]
        async fn test_related_articles_fall_back_then_warn() {
            let page = MockPage::new("Java")
                .element(anchor(JAVA, "Java"))
                .element(anchor("https://en.wikipedia.org/wiki/Kotlin", "Kotlin"));
            assert_eq!(run_one(page, "related_articles").await.status, CaseStatus::Passed);

            let case = run_one(MockPage::new("Java").element(anchor(JAVA, "Java")), "related_articles").await;
            assert_eq!(case.status, CaseStatus::Warned);
        }

        #[tokio::test]
        async fn test_related_articles_found_by_heading_title() {
            // Only the section list can yield a link back into the Java family
            let page = MockPage::new("Java").element(
                MockElement::new(By::xpath(section_list_xpaths(SEE_ALSO_ID)[2].clone())).child(
                    anchor(
                        "https://en.wikipedia.org/wiki/Java_(programming_language)_syntax",
                        "Java syntax",
                    ),
                ),
            );
            assert_eq!(run_one(page, "related_articles").await.status, CaseStatus::Passed);
        }

        #[tokio::test]
        async fn test_hidden_footer_falls_back_to_links() {
            let page = MockPage::new("Java")
                .element(MockElement::new(By::css(FOOTER)).hidden())
                .element(anchor("https://foundation.wikimedia.org/wiki/Privacy_policy", "Privacy policy"));
            assert_eq!(run_one(page, "page_footer").await.status, CaseStatus::Passed);

            let page = MockPage::new("Java").element(MockElement::new(By::css(FOOTER)).hidden());
            let case = run_one(page, "page_footer").await;
            assert_eq!(case.status, CaseStatus::Failed);
        }

        #[tokio::test]
        async fn test_footer_without_copyright_fails() {
            let page = MockPage::new("Java").element(
                MockElement::new(By::css(FOOTER)).text("Privacy policy About Wikipedia Terms of Use"),
            );
            let case = run_one(page, "page_footer").await;
            assert_eq!(case.status, CaseStatus::Failed);
            assert!(case.message.unwrap().contains("copyright"));
        }
    }
}
