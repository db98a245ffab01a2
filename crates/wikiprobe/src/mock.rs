//! Scripted in-memory driver.
//!
//! A [`MockSite`] maps URLs to [`MockPage`]s built from [`MockElement`] trees.
//! Elements are matched by exact [`By`] equality: an element answers to the
//! selectors it was declared with and nothing else. Loading a page flattens
//! its tree into a fresh document generation, so handles from the previous
//! page go stale the way they do in a browser.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::driver::{DriverFactory, ElementId, WebDriver};
use crate::locator::By;
use crate::result::{ProbeError, ProbeResult};

/// Form field values by field name (or id when unnamed)
pub type FormValues = BTreeMap<String, String>;

/// Computes the URL a form submission lands on
pub type Route = Arc<dyn Fn(&FormValues) -> String + Send + Sync>;

/// What clicking an element does
#[derive(Clone)]
enum ClickAction {
    Navigate(String),
    Reveal(By),
    Submit,
}

impl fmt::Debug for ClickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigate(url) => write!(f, "Navigate({url})"),
            Self::Reveal(by) => write!(f, "Reveal({by})"),
            Self::Submit => f.write_str("Submit"),
        }
    }
}

/// A scripted element
#[derive(Debug, Clone)]
pub struct MockElement {
    selectors: Vec<By>,
    text: String,
    attrs: BTreeMap<String, String>,
    displayed: bool,
    enabled: bool,
    children: Vec<MockElement>,
    action: Option<ClickAction>,
}

impl MockElement {
    /// Element answering to `by`
    #[must_use]
    pub fn new(by: By) -> Self {
        Self {
            selectors: vec![by],
            text: String::new(),
            attrs: BTreeMap::new(),
            displayed: true,
            enabled: true,
            children: Vec::new(),
            action: None,
        }
    }

    /// Also answer to `by`
    #[must_use]
    pub fn matching(mut self, by: By) -> Self {
        self.selectors.push(by);
        self
    }

    /// Rendered text
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Start hidden
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Start disabled
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Add a child element
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Clicking navigates to `url` (which also becomes the `href`)
    #[must_use]
    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.attrs.entry("href".to_string()).or_insert_with(|| url.clone());
        self.action = Some(ClickAction::Navigate(url));
        self
    }

    /// Clicking reveals every element matching `by`
    #[must_use]
    pub fn reveals(mut self, by: By) -> Self {
        self.action = Some(ClickAction::Reveal(by));
        self
    }

    /// Clicking submits the page form
    #[must_use]
    pub fn submits(mut self) -> Self {
        self.action = Some(ClickAction::Submit);
        self
    }
}

/// A scripted page
#[derive(Clone, Default)]
pub struct MockPage {
    title: String,
    source: Option<String>,
    elements: Vec<MockElement>,
    on_submit: Option<Route>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("title", &self.title)
            .field("elements", &self.elements.len())
            .field("on_submit", &self.on_submit.is_some())
            .finish()
    }
}

impl MockPage {
    /// Page with a title
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Add a top-level element
    #[must_use]
    pub fn element(mut self, element: MockElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Explicit page source
    #[must_use]
    pub fn source(mut self, html: impl Into<String>) -> Self {
        self.source = Some(html.into());
        self
    }

    /// Route for form submission
    #[must_use]
    pub fn on_submit(mut self, route: impl Fn(&FormValues) -> String + Send + Sync + 'static) -> Self {
        self.on_submit = Some(Arc::new(route));
        self
    }
}

/// URL to page map
#[derive(Debug, Clone, Default)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
}

impl MockSite {
    /// Empty site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` at `url` (any fragment is ignored)
    #[must_use]
    pub fn page(mut self, url: impl Into<String>, page: MockPage) -> Self {
        let url = url.into();
        self.pages.insert(strip_fragment(&url).to_string(), page);
        self
    }

    fn lookup(&self, url: &str) -> MockPage {
        self.pages
            .get(strip_fragment(url))
            .cloned()
            .unwrap_or_default()
    }
}

fn strip_fragment(url: &str) -> &str {
    url.split_once('#').map_or(url, |(base, _)| base)
}

#[derive(Debug)]
struct Node {
    selectors: Vec<By>,
    text: String,
    attrs: BTreeMap<String, String>,
    displayed: bool,
    enabled: bool,
    parent: Option<usize>,
    action: Option<ClickAction>,
    value: String,
}

#[derive(Debug, Default)]
struct Document {
    url: String,
    generation: u64,
    nodes: Vec<Node>,
    page: MockPage,
}

impl Document {
    fn load(url: &str, generation: u64, page: MockPage) -> Self {
        let mut nodes = Vec::new();
        for element in &page.elements {
            flatten(element, None, &mut nodes);
        }
        Self {
            url: url.to_string(),
            generation,
            nodes,
            page,
        }
    }

    fn is_descendant(&self, mut index: usize, ancestor: usize) -> bool {
        while let Some(parent) = self.nodes[index].parent {
            if parent == ancestor {
                return true;
            }
            index = parent;
        }
        false
    }

    fn form_values(&self) -> FormValues {
        self.nodes
            .iter()
            .filter_map(|node| {
                let key = node.attrs.get("name").or_else(|| node.attrs.get("id"))?;
                Some((key.clone(), node.value.clone()))
            })
            .collect()
    }
}

fn flatten(element: &MockElement, parent: Option<usize>, nodes: &mut Vec<Node>) {
    let index = nodes.len();
    nodes.push(Node {
        selectors: element.selectors.clone(),
        text: element.text.clone(),
        attrs: element.attrs.clone(),
        displayed: element.displayed,
        enabled: element.enabled,
        parent,
        action: element.action.clone(),
        value: element.attrs.get("value").cloned().unwrap_or_default(),
    });
    for child in &element.children {
        flatten(child, Some(index), nodes);
    }
}

#[derive(Debug, Default)]
struct State {
    site: MockSite,
    doc: Document,
    generations: u64,
    history: Vec<String>,
    position: usize,
    scripts: Vec<String>,
    script_results: Vec<(String, serde_json::Value)>,
    closed: bool,
}

impl State {
    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed {
            return Err(ProbeError::Page {
                message: "session is closed".to_string(),
            });
        }
        Ok(())
    }

    fn load(&mut self, url: &str) {
        self.generations += 1;
        let page = self.site.lookup(url);
        self.doc = Document::load(url, self.generations, page);
    }

    fn navigate(&mut self, url: &str) {
        let same_document = !self.doc.url.is_empty()
            && url.contains('#')
            && strip_fragment(url) == strip_fragment(&self.doc.url);
        if same_document {
            self.doc.url = url.to_string();
        } else {
            self.load(url);
        }
        if !self.history.is_empty() {
            self.history.truncate(self.position + 1);
        }
        self.history.push(url.to_string());
        self.position = self.history.len() - 1;
    }

    fn node(&self, el: ElementId) -> ProbeResult<(usize, &Node)> {
        self.ensure_open()?;
        let index = usize::try_from(el.index).map_err(|_| el.stale())?;
        if el.generation != self.doc.generation {
            return Err(el.stale());
        }
        self.doc
            .nodes
            .get(index)
            .map(|node| (index, node))
            .ok_or_else(|| el.stale())
    }

    fn node_mut(&mut self, el: ElementId) -> ProbeResult<&mut Node> {
        let (index, _) = self.node(el)?;
        Ok(&mut self.doc.nodes[index])
    }

    fn handle(&self, index: usize) -> ElementId {
        ElementId::new(self.doc.generation, index as u64)
    }

    fn reveal(&mut self, by: &By) {
        for node in &mut self.doc.nodes {
            if node.selectors.contains(by) {
                node.displayed = true;
            }
        }
    }

    fn submit_form(&mut self) -> ProbeResult<()> {
        let route = self.doc.page.on_submit.clone().ok_or_else(|| ProbeError::Script {
            message: format!("no form to submit on {}", self.doc.url),
        })?;
        let target = route(&self.doc.form_values());
        self.navigate(&target);
        Ok(())
    }

    fn activate(&mut self, el: ElementId) -> ProbeResult<()> {
        let (_, node) = self.node(el)?;
        match node.action.clone() {
            Some(ClickAction::Navigate(url)) => self.navigate(&url),
            Some(ClickAction::Reveal(by)) => self.reveal(&by),
            Some(ClickAction::Submit) => self.submit_form()?,
            None => {}
        }
        Ok(())
    }
}

/// Scripted driver. Clones share the same session state.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<State>>,
}

impl MockDriver {
    /// Driver serving `site`, starting on `about:blank`
    #[must_use]
    pub fn new(site: MockSite) -> Self {
        let state = State {
            site,
            ..State::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answer scripts containing `needle` with `value`
    pub fn script_result(&self, needle: impl Into<String>, value: serde_json::Value) {
        self.lock().script_results.push((needle.into(), value));
    }

    /// Reveal matching elements, as if page script had shown them
    pub fn reveal(&self, by: &By) {
        self.lock().reveal(by);
    }

    /// Scripts executed so far
    #[must_use]
    pub fn scripts(&self) -> Vec<String> {
        self.lock().scripts.clone()
    }

    /// Visited URLs, in navigation order
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current value of a form field, by field name or id
    #[must_use]
    pub fn field_value(&self, key: &str) -> Option<String> {
        self.lock().doc.form_values().get(key).cloned()
    }
}

#[async_trait]
impl WebDriver for MockDriver {
    async fn goto(&mut self, url: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        state.ensure_open()?;
        state.navigate(url);
        Ok(())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let state = self.lock();
        state.ensure_open()?;
        Ok(state.doc.url.clone())
    }

    async fn title(&self) -> ProbeResult<String> {
        let state = self.lock();
        state.ensure_open()?;
        Ok(state.doc.page.title.clone())
    }

    async fn page_source(&self) -> ProbeResult<String> {
        let state = self.lock();
        state.ensure_open()?;
        if let Some(source) = &state.doc.page.source {
            return Ok(source.clone());
        }
        let body: Vec<&str> = state.doc.nodes.iter().map(|n| n.text.as_str()).collect();
        Ok(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            state.doc.page.title,
            body.join("\n")
        ))
    }

    async fn back(&mut self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.ensure_open()?;
        if state.position > 0 {
            state.position -= 1;
            let url = state.history[state.position].clone();
            state.load(&url);
        }
        Ok(())
    }

    async fn forward(&mut self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.ensure_open()?;
        if state.position + 1 < state.history.len() {
            state.position += 1;
            let url = state.history[state.position].clone();
            state.load(&url);
        }
        Ok(())
    }

    async fn refresh(&mut self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.ensure_open()?;
        let url = state.doc.url.clone();
        state.load(&url);
        Ok(())
    }

    async fn execute(&self, script: &str) -> ProbeResult<serde_json::Value> {
        let mut state = self.lock();
        state.ensure_open()?;
        state.scripts.push(script.to_string());
        Ok(state
            .script_results
            .iter()
            .find(|(needle, _)| script.contains(needle.as_str()))
            .map_or(serde_json::Value::Null, |(_, value)| value.clone()))
    }

    async fn find_all(&self, by: &By) -> ProbeResult<Vec<ElementId>> {
        let state = self.lock();
        state.ensure_open()?;
        Ok(state
            .doc
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.selectors.contains(by))
            .map(|(index, _)| state.handle(index))
            .collect())
    }

    async fn find_all_within(&self, parent: ElementId, by: &By) -> ProbeResult<Vec<ElementId>> {
        let state = self.lock();
        let (root, _) = state.node(parent)?;
        Ok(state
            .doc
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| {
                node.selectors.contains(by) && state.doc.is_descendant(*index, root)
            })
            .map(|(index, _)| state.handle(index))
            .collect())
    }

    async fn text(&self, el: ElementId) -> ProbeResult<String> {
        let state = self.lock();
        let (index, node) = state.node(el)?;
        if !node.displayed {
            return Ok(String::new());
        }
        let mut parts = vec![node.text.clone()];
        for (child, child_node) in state.doc.nodes.iter().enumerate() {
            if child_node.displayed
                && !child_node.text.is_empty()
                && state.doc.is_descendant(child, index)
            {
                parts.push(child_node.text.clone());
            }
        }
        parts.retain(|part| !part.is_empty());
        Ok(parts.join("\n"))
    }

    async fn attribute(&self, el: ElementId, name: &str) -> ProbeResult<Option<String>> {
        let state = self.lock();
        let (_, node) = state.node(el)?;
        if name == "value" {
            return Ok(Some(node.value.clone()));
        }
        Ok(node.attrs.get(name).cloned())
    }

    async fn is_displayed(&self, el: ElementId) -> ProbeResult<bool> {
        let state = self.lock();
        Ok(state.node(el)?.1.displayed)
    }

    async fn is_enabled(&self, el: ElementId) -> ProbeResult<bool> {
        let state = self.lock();
        Ok(state.node(el)?.1.enabled)
    }

    async fn click(&self, el: ElementId) -> ProbeResult<()> {
        let mut state = self.lock();
        let (_, node) = state.node(el)?;
        if !node.displayed {
            return Err(ProbeError::Input {
                message: format!("element {el} is not interactable"),
            });
        }
        state.activate(el)
    }

    async fn js_click(&self, el: ElementId) -> ProbeResult<()> {
        let mut state = self.lock();
        state.activate(el)
    }

    async fn clear(&self, el: ElementId) -> ProbeResult<()> {
        let mut state = self.lock();
        state.node_mut(el)?.value.clear();
        Ok(())
    }

    async fn send_keys(&self, el: ElementId, text: &str) -> ProbeResult<()> {
        let mut state = self.lock();
        let node = state.node_mut(el)?;
        if !node.displayed {
            return Err(ProbeError::Input {
                message: format!("element {el} is not interactable"),
            });
        }
        node.value.push_str(text);
        Ok(())
    }

    async fn submit(&self, el: ElementId) -> ProbeResult<()> {
        let mut state = self.lock();
        state.node(el)?;
        state.submit_form()
    }

    async fn scroll_into_view(&self, el: ElementId) -> ProbeResult<()> {
        let state = self.lock();
        state.node(el)?;
        Ok(())
    }

    async fn close(&mut self) -> ProbeResult<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// Factory handing out drivers over one site, remembering each launch
#[derive(Debug, Clone, Default)]
pub struct MockLauncher {
    site: MockSite,
    launched: Arc<Mutex<Vec<MockDriver>>>,
    fail_with: Option<String>,
}

impl MockLauncher {
    /// Launcher serving `site`
    #[must_use]
    pub fn new(site: MockSite) -> Self {
        Self {
            site,
            ..Self::default()
        }
    }

    /// Every launch fails with `message`
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            ..Self::default()
        }
    }

    /// Drivers launched so far
    #[must_use]
    pub fn launched(&self) -> Vec<MockDriver> {
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DriverFactory for MockLauncher {
    type Driver = MockDriver;

    async fn launch(&self) -> ProbeResult<MockDriver> {
        if let Some(message) = &self.fail_with {
            return Err(ProbeError::BrowserLaunch {
                message: message.clone(),
            });
        }
        let driver = MockDriver::new(self.site.clone());
        self.launched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(driver.clone());
        Ok(driver)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const HOME: &str = "https://example.org/home";
    const ARTICLE: &str = "https://example.org/article";

    fn site() -> MockSite {
        MockSite::new()
            .page(
                HOME,
                MockPage::new("Home")
                    .element(
                        MockElement::new(By::css("a.next"))
                            .text("Next")
                            .navigates_to(ARTICLE),
                    )
                    .element(
                        MockElement::new(By::id("menu-toggle")).reveals(By::css("ul.menu")),
                    )
                    .element(
                        MockElement::new(By::css("ul.menu"))
                            .hidden()
                            .child(MockElement::new(By::tag_name("a")).text("Item")),
                    )
                    .element(
                        MockElement::new(By::id("q"))
                            .attr("name", "search")
                            .matching(By::css("input[name='search']")),
                    )
                    .on_submit(|form| format!("{ARTICLE}?q={}", form["search"])),
            )
            .page(
                ARTICLE,
                MockPage::new("Article").element(
                    MockElement::new(By::id("History")).text("History"),
                ),
            )
    }

    mod lookup_tests {
        use super::*;

        #[tokio::test]
        async fn test_exact_selector_matching() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            assert_eq!(driver.find_all(&By::id("q")).await.unwrap().len(), 1);
            assert_eq!(
                driver
                    .find_all(&By::css("input[name='search']"))
                    .await
                    .unwrap()
                    .len(),
                1
            );
            assert!(driver.find_all(&By::css("#q")).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_find_missing_is_not_found() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let err = driver.find(&By::id("nope")).await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotFound { .. }));
        }

        #[tokio::test]
        async fn test_find_within_limits_to_descendants() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let menu = driver.find(&By::css("ul.menu")).await.unwrap();
            let links = driver
                .find_all_within(menu, &By::tag_name("a"))
                .await
                .unwrap();
            assert_eq!(links.len(), 1);
            let next = driver.find(&By::css("a.next")).await.unwrap();
            assert!(driver
                .find_all_within(next, &By::tag_name("a"))
                .await
                .unwrap()
                .is_empty());
        }

        #[tokio::test]
        async fn test_batch_reads_skip_stale_handles() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let next = driver.find(&By::css("a.next")).await.unwrap();
            driver.goto(ARTICLE).await.unwrap();
            let history = driver.find(&By::id("History")).await.unwrap();

            assert_eq!(
                driver.text_all(&[next, history]).await.unwrap(),
                vec![String::new(), "History".to_string()]
            );
            assert_eq!(
                driver.attribute_all(&[next], "href").await.unwrap(),
                vec![None]
            );
        }

        #[tokio::test]
        async fn test_unknown_url_is_empty_page() {
            let mut driver = MockDriver::new(site());
            driver.goto("https://example.org/missing").await.unwrap();
            assert_eq!(driver.title().await.unwrap(), "");
            assert!(driver.find_first(&By::id("q")).await.unwrap().is_none());
        }
    }

    mod interaction_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_navigates_and_stales_handles() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let next = driver.find(&By::css("a.next")).await.unwrap();
            assert_eq!(
                driver.attribute(next, "href").await.unwrap().as_deref(),
                Some(ARTICLE)
            );
            driver.click(next).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), ARTICLE);
            assert_eq!(driver.title().await.unwrap(), "Article");
            let err = driver.text(next).await.unwrap_err();
            assert!(matches!(err, ProbeError::StaleElement { .. }));
        }

        #[tokio::test]
        async fn test_reveal_and_hidden_text() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let menu = driver.find(&By::css("ul.menu")).await.unwrap();
            assert!(!driver.is_displayed(menu).await.unwrap());
            assert_eq!(driver.text(menu).await.unwrap(), "");
            let hidden_click = driver.click(menu).await.unwrap_err();
            assert!(matches!(hidden_click, ProbeError::Input { .. }));

            let toggle = driver.find(&By::id("menu-toggle")).await.unwrap();
            driver.js_click(toggle).await.unwrap();
            assert!(driver.is_displayed(menu).await.unwrap());
            assert_eq!(driver.text(menu).await.unwrap(), "Item");
        }

        #[tokio::test]
        async fn test_typing_and_submit_route() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            let input = driver.find(&By::id("q")).await.unwrap();
            driver.send_keys(input, "C").await.unwrap();
            driver.send_keys(input, "++").await.unwrap();
            assert_eq!(driver.field_value("search").as_deref(), Some("C++"));
            assert_eq!(
                driver.attribute(input, "value").await.unwrap().as_deref(),
                Some("C++")
            );
            driver.clear(input).await.unwrap();
            driver.send_keys(input, "rust").await.unwrap();
            driver.submit(input).await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                format!("{ARTICLE}?q=rust")
            );
        }

        #[tokio::test]
        async fn test_submit_without_form_fails() {
            let mut driver = MockDriver::new(site());
            driver.goto(ARTICLE).await.unwrap();
            let heading = driver.find(&By::id("History")).await.unwrap();
            assert!(matches!(
                driver.submit(heading).await.unwrap_err(),
                ProbeError::Script { .. }
            ));
        }
    }

    mod history_tests {
        use super::*;

        #[tokio::test]
        async fn test_back_forward_refresh() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            driver.goto(ARTICLE).await.unwrap();
            driver.back().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), HOME);
            driver.forward().await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), ARTICLE);

            let heading = driver.find(&By::id("History")).await.unwrap();
            driver.refresh().await.unwrap();
            assert!(driver.text(heading).await.is_err());
            assert_eq!(driver.history(), vec![HOME, ARTICLE]);
        }

        #[tokio::test]
        async fn test_goto_truncates_forward_history() {
            let mut driver = MockDriver::new(site());
            driver.goto(HOME).await.unwrap();
            driver.goto(ARTICLE).await.unwrap();
            driver.back().await.unwrap();
            driver.goto("https://example.org/other").await.unwrap();
            driver.forward().await.unwrap();
            assert_eq!(
                driver.current_url().await.unwrap(),
                "https://example.org/other"
            );
            assert_eq!(
                driver.history(),
                vec![HOME.to_string(), "https://example.org/other".to_string()]
            );
        }

        #[tokio::test]
        async fn test_fragment_navigation_keeps_document() {
            let mut driver = MockDriver::new(site());
            driver.goto(ARTICLE).await.unwrap();
            let heading = driver.find(&By::id("History")).await.unwrap();
            driver.goto(&format!("{ARTICLE}#History")).await.unwrap();
            assert_eq!(driver.text(heading).await.unwrap(), "History");
            assert_eq!(
                driver.current_url().await.unwrap(),
                format!("{ARTICLE}#History")
            );
        }
    }

    mod session_tests {
        use super::*;

        #[tokio::test]
        async fn test_scripts_are_logged_and_answered() {
            let driver = MockDriver::new(site());
            driver.script_result("scrollHeight", serde_json::json!(4000));
            let value = driver
                .execute("return document.body.scrollHeight")
                .await
                .unwrap();
            assert_eq!(value, serde_json::json!(4000));
            assert_eq!(
                driver.execute("1 + 1").await.unwrap(),
                serde_json::Value::Null
            );
            assert_eq!(driver.scripts().len(), 2);
        }

        #[tokio::test]
        async fn test_closed_session_rejects_calls() {
            let mut driver = MockDriver::new(site());
            let observer = driver.clone();
            driver.close().await.unwrap();
            assert!(observer.is_closed());
            assert!(driver.goto(HOME).await.is_err());
        }

        #[tokio::test]
        async fn test_launcher_records_and_fails() {
            let launcher = MockLauncher::new(site());
            launcher.launch().await.unwrap();
            launcher.launch().await.unwrap();
            assert_eq!(launcher.launched().len(), 2);

            let err = MockLauncher::failing("no chromium").launch().await.unwrap_err();
            assert!(matches!(err, ProbeError::BrowserLaunch { .. }));
        }
    }
}
