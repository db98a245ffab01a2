//! Element location strategies.
//!
//! A `By` compiles to a JavaScript expression that evaluates to an array of
//! DOM elements, rooted either at `document` or at an element expression.
//! Drivers that speak CDP evaluate these expressions; the mock driver matches
//! `By` values structurally.

use std::fmt;

/// Selector strategy for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    /// Element id attribute
    Id(String),
    /// CSS selector
    Css(String),
    /// XPath expression
    XPath(String),
    /// Single class name
    ClassName(String),
    /// Tag name
    TagName(String),
    /// Exact visible text of a link
    LinkText(String),
    /// Substring of the visible text of a link
    PartialLinkText(String),
}

impl By {
    /// Locate by id
    #[must_use]
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Locate by XPath
    #[must_use]
    pub fn xpath(expr: impl Into<String>) -> Self {
        Self::XPath(expr.into())
    }

    /// Locate by class name
    #[must_use]
    pub fn class_name(name: impl Into<String>) -> Self {
        Self::ClassName(name.into())
    }

    /// Locate by tag name
    #[must_use]
    pub fn tag_name(name: impl Into<String>) -> Self {
        Self::TagName(name.into())
    }

    /// Locate a link by its exact text
    #[must_use]
    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    /// Locate a link by part of its text
    #[must_use]
    pub fn partial_link_text(text: impl Into<String>) -> Self {
        Self::PartialLinkText(text.into())
    }

    /// Expression yielding every match in the document
    #[must_use]
    pub fn to_query_all(&self) -> String {
        self.to_query_within("document")
    }

    /// Expression yielding every match below `root`, itself a JS expression
    #[must_use]
    pub fn to_query_within(&self, root: &str) -> String {
        match self {
            Self::Id(id) => format!(
                "Array.from({root}.querySelectorAll('#' + CSS.escape({})))",
                js_string(id)
            ),
            Self::Css(css) => format!("Array.from({root}.querySelectorAll({}))", js_string(css)),
            Self::XPath(xpath) => format!(
                "(() => {{ const r = document.evaluate({}, {root}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) {{ const n = r.snapshotItem(i); \
                 if (n.nodeType === 1) out.push(n); }} return out; }})()",
                js_string(xpath)
            ),
            Self::ClassName(name) => format!(
                "Array.from({root}.getElementsByClassName({}))",
                js_string(name)
            ),
            Self::TagName(name) => format!(
                "Array.from({root}.getElementsByTagName({}))",
                js_string(name)
            ),
            Self::LinkText(text) => format!(
                "Array.from({root}.querySelectorAll('a')).filter(a => \
                 (a.innerText || a.textContent || '').trim() === {})",
                js_string(text)
            ),
            Self::PartialLinkText(text) => format!(
                "Array.from({root}.querySelectorAll('a')).filter(a => \
                 (a.innerText || a.textContent || '').includes({}))",
                js_string(text)
            ),
        }
    }
}

impl fmt::Display for By {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "By.id: {v}"),
            Self::Css(v) => write!(f, "By.cssSelector: {v}"),
            Self::XPath(v) => write!(f, "By.xpath: {v}"),
            Self::ClassName(v) => write!(f, "By.className: {v}"),
            Self::TagName(v) => write!(f, "By.tagName: {v}"),
            Self::LinkText(v) => write!(f, "By.linkText: {v}"),
            Self::PartialLinkText(v) => write!(f, "By.partialLinkText: {v}"),
        }
    }
}

/// Quote a Rust string as a JavaScript string literal
#[must_use]
pub fn js_string(value: &str) -> String {
    // JSON string literals are valid JS string literals
    serde_json::Value::String(value.to_string()).to_string()
}

/// Quote a string as an XPath 1.0 literal.
///
/// XPath has no escape syntax, so a value holding both quote kinds is
/// split into pieces joined with `concat()`.
#[must_use]
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }
    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query() {
            let query = By::css("#mw-content-text a").to_query_all();
            assert_eq!(
                query,
                "Array.from(document.querySelectorAll(\"#mw-content-text a\"))"
            );
        }

        #[test]
        fn test_id_query_escapes() {
            let query = By::id("searchInput").to_query_all();
            assert!(query.contains("CSS.escape(\"searchInput\")"));
        }

        #[test]
        fn test_xpath_query_uses_root_as_context() {
            let query = By::xpath(".//a").to_query_within("el");
            assert!(query.contains("document.evaluate(\".//a\", el,"));
            assert!(query.contains("ORDERED_NODE_SNAPSHOT_TYPE"));
        }

        #[test]
        fn test_link_text_exact_vs_partial() {
            let exact = By::link_text("Talk").to_query_all();
            let partial = By::partial_link_text("Talk").to_query_all();
            assert!(exact.contains("=== \"Talk\""));
            assert!(partial.contains(".includes(\"Talk\")"));
        }

        #[test]
        fn test_class_and_tag_queries() {
            assert!(By::class_name("mw-logo")
                .to_query_all()
                .contains("getElementsByClassName(\"mw-logo\")"));
            assert!(By::tag_name("h1")
                .to_query_within("root")
                .starts_with("Array.from(root.getElementsByTagName"));
        }

        #[test]
        fn test_quotes_are_escaped() {
            let query = By::css("a[title=\"Main Page\"]").to_query_all();
            assert!(query.contains(r#"a[title=\"Main Page\"]"#));
        }
    }

    mod display_tests {
        use super::*;

        #[test]
        fn test_display_names_strategy() {
            assert_eq!(By::id("firstHeading").to_string(), "By.id: firstHeading");
            assert_eq!(
                By::partial_link_text("Edit").to_string(),
                "By.partialLinkText: Edit"
            );
        }
    }

    mod literal_tests {
        use super::*;

        #[test]
        fn test_xpath_literal_plain() {
            assert_eq!(xpath_literal("Main Page"), "'Main Page'");
        }

        #[test]
        fn test_xpath_literal_single_quote() {
            assert_eq!(xpath_literal("Don't"), "\"Don't\"");
        }

        #[test]
        fn test_xpath_literal_both_quotes() {
            assert_eq!(
                xpath_literal("a'b\"c"),
                "concat('a', \"'\", 'b\"c')"
            );
        }

        #[test]
        fn test_js_string_escapes_newlines() {
            assert_eq!(js_string("a\nb"), "\"a\\nb\"");
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn css_query_embeds_selector_as_json(selector in ".{0,40}") {
                let query = By::css(selector.clone()).to_query_all();
                let literal = js_string(&selector);
                prop_assert!(query.contains(&literal));
                let start = query.find(&literal).unwrap();
                let parsed: String = serde_json::from_str(&query[start..start + literal.len()]).unwrap();
                prop_assert_eq!(parsed, selector);
            }

            #[test]
            fn every_strategy_yields_array(text in "[a-zA-Z0-9 _-]{1,20}") {
                for by in [
                    By::id(text.clone()),
                    By::css(text.clone()),
                    By::xpath(text.clone()),
                    By::class_name(text.clone()),
                    By::tag_name(text.clone()),
                    By::link_text(text.clone()),
                    By::partial_link_text(text.clone()),
                ] {
                    let query = by.to_query_within("root");
                    prop_assert!(query.starts_with("Array.from(root") || query.starts_with("(() =>"));
                }
            }
        }
    }
}
