//! In-process TodoMVC double.
//!
//! Behaves like the reference app as seen through a browser: every state
//! change is rendered only after `latency_ms`, the destroy button needs a
//! hover, the edit input exists only while an item is in edit mode, and the
//! task list survives a reload (the real app keeps it in localStorage).
//! Faults can be injected to check the harness reports them instead of
//! hanging or passing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tickmark_common::{FilterKind, ObservedTask};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::page::{keys, Page, PageFactory, WaitOutcome, WaitState};
use crate::selectors;

const WAIT_POLL: Duration = Duration::from_millis(10);

/// Configuration for the simulated instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// Delay between a state change and it becoming visible
    pub latency_ms: u64,

    /// Destroy clicks are accepted but do nothing
    pub ignore_deletes: bool,

    /// Edit commits close the editor without renaming
    pub ignore_edits: bool,

    /// Every navigation fails, as if the host were unreachable
    pub fail_navigation: bool,

    /// Tasks already in storage when the page first loads
    pub seed: Vec<ObservedTask>,
}

#[derive(Debug, Clone)]
struct Item {
    id: u64,
    title: String,
    completed: bool,
}

#[derive(Debug, Clone)]
struct Editing {
    id: u64,
    value: String,
}

/// What the user currently sees
#[derive(Debug, Clone, Default)]
struct Frame {
    items: Vec<Item>,
    filter: FilterKind,
    editing: Option<u64>,
}

impl Frame {
    fn visible(&self) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|i| match self.filter {
                FilterKind::All => true,
                FilterKind::Active => !i.completed,
                FilterKind::Completed => i.completed,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    None,
    NewTodo,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Row,
    Label,
    Toggle,
    Destroy,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Body,
    Header,
    NewTodo,
    Items,
    CompletedItems,
    EditInputs,
    FilterLink(FilterKind),
    Item { nth: isize, part: Part },
}

static FILTER_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\.filters a:has-text\('([^']+)'\)$").expect("valid filter link regex")
});
static NTH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^nth=(-?\d+)$").expect("valid nth regex"));

fn parse_target(selector: &str) -> E2eResult<Target> {
    let unsupported = || E2eError::UnsupportedSelector(selector.to_string());
    let segments: Vec<&str> = selector.split(">>").map(str::trim).collect();

    let base = match segments[0] {
        selectors::BODY => Target::Body,
        selectors::HEADER => Target::Header,
        selectors::NEW_TODO | ".new-todo" => Target::NewTodo,
        selectors::ITEMS => Target::Items,
        selectors::COMPLETED_ITEMS => Target::CompletedItems,
        selectors::EDIT_INPUT | ".edit" => Target::EditInputs,
        other => match FILTER_LINK_RE.captures(other) {
            Some(caps) => Target::FilterLink(caps[1].parse().map_err(|_| unsupported())?),
            None => return Err(unsupported()),
        },
    };

    match (base, &segments[1..]) {
        (target, []) => Ok(target),
        (Target::Items, [nth, rest @ ..]) if rest.len() <= 1 => {
            let caps = NTH_RE.captures(nth).ok_or_else(unsupported)?;
            let nth: isize = caps[1].parse().map_err(|_| unsupported())?;
            let part = match rest.first().copied() {
                None => Part::Row,
                Some("label") => Part::Label,
                Some("input.toggle") | Some(".toggle") => Part::Toggle,
                Some("button.destroy") | Some(".destroy") => Part::Destroy,
                Some(selectors::EDIT_INPUT) | Some(".edit") => Part::Edit,
                Some(_) => return Err(unsupported()),
            };
            Ok(Target::Item { nth, part })
        }
        _ => Err(unsupported()),
    }
}

struct Inner {
    config: SimulatedConfig,
    url: Option<String>,
    closed: bool,
    next_id: u64,

    // Application state, applied immediately
    items: Vec<Item>,
    filter: FilterKind,
    editing: Option<Editing>,

    // Rendering lags the application state by `latency_ms`
    frames: VecDeque<(Instant, Frame)>,
    rendered: Frame,

    new_todo: String,
    focus: Focus,
    hovered: Option<u64>,
}

impl Inner {
    fn new(config: SimulatedConfig) -> Self {
        let mut inner = Self {
            url: None,
            closed: false,
            next_id: 0,
            items: Vec::new(),
            filter: FilterKind::All,
            editing: None,
            frames: VecDeque::new(),
            rendered: Frame::default(),
            new_todo: String::new(),
            focus: Focus::None,
            hovered: None,
            config,
        };
        for seed in inner.config.seed.clone() {
            let id = inner.allocate_id();
            inner.items.push(Item {
                id,
                title: seed.title,
                completed: seed.completed,
            });
        }
        inner
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_open(&self) -> E2eResult<()> {
        if self.closed {
            return Err(E2eError::Driver("page has been closed".to_string()));
        }
        Ok(())
    }

    fn loaded(&self) -> bool {
        self.url.is_some()
    }

    fn snapshot(&self) -> Frame {
        Frame {
            items: self.items.clone(),
            filter: self.filter,
            editing: self.editing.as_ref().map(|e| e.id),
        }
    }

    /// Schedule the current application state for display
    fn render(&mut self) {
        let frame = self.snapshot();
        if self.config.latency_ms == 0 {
            self.frames.clear();
            self.rendered = frame;
        } else {
            let due = Instant::now() + Duration::from_millis(self.config.latency_ms);
            self.frames.push_back((due, frame));
        }
    }

    /// Show the current application state right away (page load)
    fn render_now(&mut self) {
        self.frames.clear();
        self.rendered = self.snapshot();
    }

    fn current(&mut self) -> &Frame {
        let now = Instant::now();
        while let Some((due, _)) = self.frames.front() {
            if *due > now {
                break;
            }
            if let Some((_, frame)) = self.frames.pop_front() {
                self.rendered = frame;
            }
        }
        &self.rendered
    }

    /// Resolve an `nth=` against the rendered view
    fn resolve(&mut self, nth: isize) -> Option<Item> {
        let visible = self.current().visible();
        let len = visible.len() as isize;
        let index = if nth < 0 { len + nth } else { nth };
        if index < 0 || index >= len {
            return None;
        }
        visible.get(index as usize).map(|item| (*item).clone())
    }

    fn resolve_or_missing(&mut self, nth: isize, selector: &str) -> E2eResult<Item> {
        if !self.loaded() {
            return Err(E2eError::ElementNotFound(selector.to_string()));
        }
        self.resolve(nth)
            .ok_or_else(|| E2eError::ElementNotFound(selector.to_string()))
    }

    fn require_loaded(&self, selector: &str) -> E2eResult<()> {
        if self.loaded() {
            Ok(())
        } else {
            Err(E2eError::ElementNotFound(selector.to_string()))
        }
    }

    fn is_visible(&mut self, target: Target) -> bool {
        if !self.loaded() {
            return false;
        }
        match target {
            Target::Body | Target::Header | Target::NewTodo => true,
            Target::Items => !self.current().visible().is_empty(),
            Target::CompletedItems => self.current().visible().iter().any(|i| i.completed),
            Target::EditInputs => {
                let frame = self.current();
                let visible = frame.visible();
                frame
                    .editing
                    .map(|id| visible.iter().any(|i| i.id == id))
                    .unwrap_or(false)
            }
            // The footer with the filter bar is hidden while the list is empty
            Target::FilterLink(_) => !self.current().items.is_empty(),
            Target::Item { nth, part } => match self.resolve(nth) {
                None => false,
                Some(item) => match part {
                    Part::Row | Part::Toggle => true,
                    Part::Label => self.rendered.editing != Some(item.id),
                    Part::Destroy => self.hovered == Some(item.id),
                    Part::Edit => self.rendered.editing == Some(item.id),
                },
            },
        }
    }

    fn add_todo(&mut self) {
        let title = self.new_todo.trim().to_string();
        if title.is_empty() {
            return;
        }
        let id = self.allocate_id();
        debug!("[simulated] add #{} '{}'", id, title);
        self.items.push(Item {
            id,
            title,
            completed: false,
        });
        self.new_todo.clear();
        self.render();
    }

    fn commit_edit(&mut self) {
        self.focus = Focus::None;
        let Some(editing) = self.editing.take() else {
            return;
        };
        if !self.config.ignore_edits {
            let title = editing.value.trim().to_string();
            if title.is_empty() {
                self.items.retain(|i| i.id != editing.id);
            } else if let Some(item) = self.items.iter_mut().find(|i| i.id == editing.id) {
                item.title = title;
            }
        }
        self.render();
    }

    fn cancel_edit(&mut self) {
        self.focus = Focus::None;
        if self.editing.take().is_some() {
            self.render();
        }
    }

    /// Focus moving elsewhere commits an open edit
    fn blur(&mut self) {
        if self.focus == Focus::Edit || self.editing.is_some() {
            self.commit_edit();
        }
        self.focus = Focus::None;
    }

    fn load(&mut self, url: &str) {
        self.url = Some(url.to_string());
        self.editing = None;
        self.new_todo.clear();
        self.focus = Focus::None;
        self.hovered = None;
        self.render_now();
    }
}

/// Handle for inspecting and steering a [`SimulatedPage`] from tests
#[derive(Clone)]
pub struct SimulatedHandle {
    inner: Arc<Mutex<Inner>>,
}

impl SimulatedHandle {
    /// Application state, regardless of what is rendered yet
    pub fn stored(&self) -> Vec<ObservedTask> {
        self.inner
            .lock()
            .items
            .iter()
            .map(|i| ObservedTask::new(i.title.clone(), i.completed))
            .collect()
    }

    /// Add a task the way another client sharing the storage would
    pub fn insert_external(&self, title: &str) {
        let mut inner = self.inner.lock();
        let id = inner.allocate_id();
        inner.items.push(Item {
            id,
            title: title.to_string(),
            completed: false,
        });
        inner.render();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn set_ignore_deletes(&self, ignore: bool) {
        self.inner.lock().config.ignore_deletes = ignore;
    }

    pub fn set_ignore_edits(&self, ignore: bool) {
        self.inner.lock().config.ignore_edits = ignore;
    }

    pub fn set_latency(&self, latency: Duration) {
        self.inner.lock().config.latency_ms = latency.as_millis() as u64;
    }
}

/// Simulated live instance
pub struct SimulatedPage {
    inner: Arc<Mutex<Inner>>,
}

impl SimulatedPage {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new(config))),
        }
    }

    pub fn handle(&self) -> SimulatedHandle {
        SimulatedHandle {
            inner: self.inner.clone(),
        }
    }
}

impl Default for SimulatedPage {
    fn default() -> Self {
        Self::new(SimulatedConfig::default())
    }
}

#[async_trait]
impl Page for SimulatedPage {
    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if inner.config.fail_navigation {
            return Err(E2eError::Navigation(format!("{} is unreachable", url)));
        }
        inner.filter = selectors::route_filter(url);
        inner.load(url);
        debug!("[simulated] navigated to {}", url);
        Ok(())
    }

    async fn is_visible(&mut self, selector: &str) -> E2eResult<bool> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        Ok(inner.is_visible(target))
    }

    async fn text_of(&mut self, selector: &str) -> E2eResult<String> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;
        match target {
            Target::Header => Ok(selectors::HEADER_TEXT.to_string()),
            Target::FilterLink(kind) => Ok(kind.label().to_string()),
            Target::Items => inner
                .resolve(0)
                .map(|i| i.title)
                .ok_or_else(|| E2eError::ElementNotFound(selector.to_string())),
            Target::Item {
                nth,
                part: Part::Row | Part::Label,
            } => Ok(inner.resolve_or_missing(nth, selector)?.title),
            Target::Item { .. } | Target::NewTodo | Target::EditInputs => Ok(String::new()),
            Target::Body | Target::CompletedItems => Err(E2eError::UnsupportedSelector(
                format!("text of '{}'", selector),
            )),
        }
    }

    async fn attribute_of(&mut self, selector: &str, name: &str) -> E2eResult<Option<String>> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;

        let row_class = |inner: &Inner, item: &Item| {
            let mut tokens = Vec::new();
            if item.completed {
                tokens.push("completed");
            }
            if inner.rendered.editing == Some(item.id) {
                tokens.push("editing");
            }
            tokens.join(" ")
        };

        let value = match (target, name) {
            (Target::NewTodo, "placeholder") => Some(selectors::NEW_TODO_PLACEHOLDER.to_string()),
            (Target::NewTodo, "value") => Some(inner.new_todo.clone()),
            (Target::Items, "class") => {
                let item = inner.resolve_or_missing(0, selector)?;
                Some(row_class(&inner, &item))
            }
            (Target::Item { nth, part: Part::Row }, "class") => {
                let item = inner.resolve_or_missing(nth, selector)?;
                Some(row_class(&inner, &item))
            }
            (Target::Item { nth, part: Part::Edit }, "value") => {
                let item = inner.resolve_or_missing(nth, selector)?;
                inner
                    .editing
                    .as_ref()
                    .filter(|e| e.id == item.id)
                    .map(|e| e.value.clone())
            }
            (Target::FilterLink(kind), "class") => {
                let selected = inner.current().filter == kind;
                Some(if selected { "selected" } else { "" }.to_string())
            }
            (Target::FilterLink(kind), "href") => {
                Some(format!("#/{}", kind.label().to_ascii_lowercase()).replace("#/all", "#/"))
            }
            _ => None,
        };
        Ok(value)
    }

    async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        if !inner.loaded() {
            return Ok(0);
        }
        let count = match target {
            Target::Items => inner.current().visible().len(),
            Target::CompletedItems => inner.current().visible().iter().filter(|i| i.completed).count(),
            Target::EditInputs => usize::from(inner.is_visible(Target::EditInputs)),
            Target::Item { nth, .. } => usize::from(inner.resolve(nth).is_some()),
            Target::Body | Target::Header | Target::NewTodo | Target::FilterLink(_) => 1,
        };
        Ok(count)
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;
        match target {
            Target::NewTodo => {
                if inner.focus == Focus::Edit {
                    inner.blur();
                }
                inner.new_todo = text.to_string();
                inner.focus = Focus::NewTodo;
                Ok(())
            }
            Target::Item { nth, part: Part::Edit } => {
                let item = inner.resolve_or_missing(nth, selector)?;
                if inner.rendered.editing != Some(item.id) {
                    return Err(E2eError::NotActionable {
                        selector: selector.to_string(),
                        reason: "edit input is not visible".to_string(),
                    });
                }
                match inner.editing.as_mut() {
                    Some(editing) if editing.id == item.id => {
                        editing.value = text.to_string();
                        inner.focus = Focus::Edit;
                        Ok(())
                    }
                    _ => Err(E2eError::NotActionable {
                        selector: selector.to_string(),
                        reason: "item is no longer in edit mode".to_string(),
                    }),
                }
            }
            _ => Err(E2eError::NotActionable {
                selector: selector.to_string(),
                reason: "element is not an editable input".to_string(),
            }),
        }
    }

    async fn press_key(&mut self, key: &str) -> E2eResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        match (inner.focus, key) {
            (Focus::NewTodo, keys::ENTER) => inner.add_todo(),
            (Focus::NewTodo, keys::TAB) => inner.focus = Focus::None,
            (Focus::Edit, keys::ENTER) | (Focus::Edit, keys::TAB) => inner.commit_edit(),
            (Focus::Edit, keys::ESCAPE) => inner.cancel_edit(),
            _ => debug!("[simulated] key '{}' has no effect", key),
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> E2eResult<()> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;

        if !inner.is_visible(target) {
            return Err(E2eError::NotActionable {
                selector: selector.to_string(),
                reason: "element is not visible".to_string(),
            });
        }

        match target {
            Target::Body | Target::Header => inner.blur(),
            Target::NewTodo => {
                inner.blur();
                inner.focus = Focus::NewTodo;
            }
            Target::FilterLink(kind) => {
                inner.blur();
                inner.filter = kind;
                inner.render();
            }
            Target::Item { nth, part } => {
                let item = inner.resolve_or_missing(nth, selector)?;
                match part {
                    Part::Toggle => {
                        inner.blur();
                        if let Some(stored) = inner.items.iter_mut().find(|i| i.id == item.id) {
                            stored.completed = !stored.completed;
                        }
                        inner.render();
                    }
                    Part::Destroy => {
                        inner.blur();
                        if inner.config.ignore_deletes {
                            debug!("[simulated] ignoring delete of #{}", item.id);
                        } else {
                            inner.items.retain(|i| i.id != item.id);
                            inner.hovered = None;
                            inner.render();
                        }
                    }
                    Part::Edit => inner.focus = Focus::Edit,
                    Part::Row | Part::Label => {
                        if inner.editing.as_ref().map(|e| e.id) != Some(item.id) {
                            inner.blur();
                        }
                    }
                }
            }
            Target::Items | Target::CompletedItems | Target::EditInputs => {
                return Err(E2eError::UnsupportedSelector(format!(
                    "click on '{}' needs an nth= index",
                    selector
                )));
            }
        }
        Ok(())
    }

    async fn double_click(&mut self, selector: &str) -> E2eResult<()> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;
        match target {
            Target::Item {
                nth,
                part: Part::Row | Part::Label,
            } => {
                let item = inner.resolve_or_missing(nth, selector)?;
                if inner.editing.is_some() {
                    inner.commit_edit();
                }
                inner.editing = Some(Editing {
                    id: item.id,
                    value: item.title.clone(),
                });
                inner.focus = Focus::Edit;
                inner.render();
                Ok(())
            }
            _ => Err(E2eError::NotActionable {
                selector: selector.to_string(),
                reason: "double-click has no handler here".to_string(),
            }),
        }
    }

    async fn hover(&mut self, selector: &str) -> E2eResult<()> {
        let target = parse_target(selector)?;
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        inner.require_loaded(selector)?;
        inner.hovered = match target {
            Target::Item { nth, .. } => Some(inner.resolve_or_missing(nth, selector)?.id),
            _ => None,
        };
        Ok(())
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<WaitOutcome> {
        let target = parse_target(selector)?;
        let deadline = Instant::now() + timeout;
        loop {
            let visible = {
                let mut inner = self.inner.lock();
                inner.ensure_open()?;
                inner.is_visible(target)
            };
            let satisfied = match state {
                WaitState::Visible => visible,
                WaitState::Hidden => !visible,
            };
            if satisfied {
                return Ok(WaitOutcome::Satisfied);
            }
            if Instant::now() >= deadline {
                return Ok(WaitOutcome::TimedOut);
            }
            sleep(WAIT_POLL).await;
        }
    }

    async fn reload(&mut self) -> E2eResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_open()?;
        let url = inner
            .url
            .clone()
            .ok_or_else(|| E2eError::Navigation("reload before first navigation".to_string()))?;
        inner.load(&url);
        Ok(())
    }

    async fn close(&mut self) -> E2eResult<()> {
        self.inner.lock().closed = true;
        Ok(())
    }
}

/// Provisions a fresh [`SimulatedPage`] per group
pub struct SimulatedFactory {
    config: SimulatedConfig,
    provisioned: Mutex<Vec<SimulatedHandle>>,
}

impl SimulatedFactory {
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            config,
            provisioned: Mutex::new(Vec::new()),
        }
    }

    /// Handles to every page provisioned so far, oldest first
    pub fn handles(&self) -> Vec<SimulatedHandle> {
        self.provisioned.lock().clone()
    }
}

#[async_trait]
impl PageFactory for SimulatedFactory {
    async fn provision(&self) -> E2eResult<Box<dyn Page>> {
        let page = SimulatedPage::new(self.config.clone());
        self.provisioned.lock().push(page.handle());
        Ok(Box::new(page))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_targets() {
        assert_eq!(parse_target("body").unwrap(), Target::Body);
        assert_eq!(parse_target(".todo-list li").unwrap(), Target::Items);
        assert_eq!(
            parse_target(&selectors::destroy(3)).unwrap(),
            Target::Item {
                nth: 3,
                part: Part::Destroy
            }
        );
        assert_eq!(
            parse_target(".todo-list li >> nth=-1").unwrap(),
            Target::Item {
                nth: -1,
                part: Part::Row
            }
        );
        assert_eq!(
            parse_target(&selectors::filter_link(FilterKind::Active)).unwrap(),
            Target::FilterLink(FilterKind::Active)
        );
        assert!(parse_target("#main .whatever").is_err());
        assert!(parse_target(".todo-list li >> nth=x").is_err());
    }

    #[tokio::test]
    async fn test_create_is_rendered_after_latency() {
        tokio::time::pause();
        let mut page = SimulatedPage::new(SimulatedConfig {
            latency_ms: 200,
            ..Default::default()
        });
        page.navigate("sim://todo/").await.unwrap();
        page.type_text(selectors::NEW_TODO, "  milk ").await.unwrap();
        page.press_key(keys::ENTER).await.unwrap();

        assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 0);
        tokio::time::advance(Duration::from_millis(250)).await;
        assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 1);
        assert_eq!(page.text_of(&selectors::label(0)).await.unwrap(), "milk");
    }

    #[tokio::test]
    async fn test_destroy_requires_hover() {
        let mut page = SimulatedPage::new(SimulatedConfig {
            seed: vec![ObservedTask::new("a", false)],
            ..Default::default()
        });
        page.navigate("sim://todo/").await.unwrap();

        let err = page.click(&selectors::destroy(0)).await.unwrap_err();
        assert!(matches!(err, E2eError::NotActionable { .. }));

        page.hover(&selectors::item(0)).await.unwrap();
        page.click(&selectors::destroy(0)).await.unwrap();
        assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_edit_input_only_while_editing() {
        let mut page = SimulatedPage::new(SimulatedConfig {
            seed: vec![ObservedTask::new("a", false)],
            ..Default::default()
        });
        page.navigate("sim://todo/").await.unwrap();
        assert!(!page.is_visible(&selectors::edit_input(0)).await.unwrap());
        assert!(page.type_text(&selectors::edit_input(0), "b").await.is_err());

        page.double_click(&selectors::label(0)).await.unwrap();
        assert!(page.is_visible(&selectors::edit_input(0)).await.unwrap());
        page.type_text(&selectors::edit_input(0), "b").await.unwrap();
        page.press_key(keys::ESCAPE).await.unwrap();
        assert_eq!(page.text_of(&selectors::label(0)).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn test_reload_keeps_items_and_drops_edit() {
        let mut page = SimulatedPage::new(SimulatedConfig {
            seed: vec![ObservedTask::new("a", true)],
            ..Default::default()
        });
        page.navigate("sim://todo/").await.unwrap();
        page.double_click(&selectors::label(0)).await.unwrap();
        page.reload().await.unwrap();

        assert_eq!(page.count(selectors::ITEMS).await.unwrap(), 1);
        assert!(!page.is_visible(selectors::EDIT_INPUT).await.unwrap());
        let class = page.attribute_of(&selectors::item(0), "class").await.unwrap();
        assert_eq!(class.as_deref(), Some("completed"));
    }

    #[tokio::test]
    async fn test_closed_page_is_fatal() {
        let mut page = SimulatedPage::default();
        page.close().await.unwrap();
        let err = page.navigate("sim://todo/").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
