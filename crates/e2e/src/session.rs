//! Scenario session: drives one live instance against the [`TodoList`] oracle.
//!
//! Every mutating command follows the same shape: act on the page, apply the
//! same change to the oracle, settle on a probe derived from the oracle, then
//! compare the visible list with the oracle's view.

use std::fmt;

use serde::{Deserialize, Serialize};
use tickmark_common::{EditOutcome, FilterKind, ObservedTask, TaskId, TodoList};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{keys, Page, WaitOutcome, WaitState};
use crate::selectors;
use crate::settle::{format_list, observe_list, settle, Probe, SettleConfig};
use crate::spec::Step;

/// Where a session is in its command cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// Entry view reachable, list not yet adopted
    Navigated,
    Ready,
    Filtered(FilterKind),
    AwaitingSettle,
    Completed,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Navigated => f.write_str("navigated"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::Filtered(kind) => write!(f, "filtered({})", kind),
            SessionState::AwaitingSettle => f.write_str("awaiting-settle"),
            SessionState::Completed => f.write_str("completed"),
            SessionState::Failed => f.write_str("failed"),
        }
    }
}

/// How an edit is committed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditGesture {
    #[default]
    Enter,
    Tab,
    ClickOutside,
}

impl fmt::Display for EditGesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditGesture::Enter => f.write_str("enter"),
            EditGesture::Tab => f.write_str("tab"),
            EditGesture::ClickOutside => f.write_str("click_outside"),
        }
    }
}

pub struct Session<'a> {
    page: &'a mut dyn Page,
    settle: SettleConfig,
    oracle: TodoList,
    state: SessionState,
    filter: FilterKind,
    entry_url: String,
    soft_failures: Vec<String>,
}

impl<'a> Session<'a> {
    pub fn new(page: &'a mut dyn Page, entry_url: impl Into<String>, settle: SettleConfig) -> Self {
        Self {
            page,
            settle,
            oracle: TodoList::new(),
            state: SessionState::Idle,
            filter: FilterKind::All,
            entry_url: entry_url.into(),
            soft_failures: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn oracle(&self) -> &TodoList {
        &self.oracle
    }

    pub fn soft_failures(&self) -> &[String] {
        &self.soft_failures
    }

    pub fn take_soft_failures(&mut self) -> Vec<String> {
        std::mem::take(&mut self.soft_failures)
    }

    /// Prepare for the next scenario on the same instance, opening the
    /// entry view if nothing has yet
    pub async fn begin_scenario(&mut self) -> E2eResult<()> {
        match self.state {
            SessionState::Idle => {
                let url = self.entry_url.clone();
                let result = self.load(&url).await;
                self.end_command(result)
            }
            SessionState::Failed | SessionState::AwaitingSettle => self.recover().await,
            SessionState::Completed => {
                self.state = self.resting_state();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn finish_scenario(&mut self) {
        if matches!(self.state, SessionState::Ready | SessionState::Filtered(_)) {
            self.state = SessionState::Completed;
        }
    }

    /// Return a failed session to a known state: reload the entry view
    /// (dropping any stray edit and filter) and adopt what it shows.
    pub async fn recover(&mut self) -> E2eResult<()> {
        warn!("Recovering session from state '{}'", self.state);
        let url = self.entry_url.clone();
        let result = self.load(&url).await;
        self.end_command(result)
    }

    /// Run one scenario step
    pub async fn execute(&mut self, step: &Step) -> E2eResult<()> {
        debug!("Executing step: {}", step.name());

        match step {
            Step::Navigate { url } => self.navigate(url.as_deref()).await,
            Step::ExpectLoaded => self.expect_loaded().await,
            Step::Inspect => self.inspect().await.map(|_| ()),
            Step::Create { title } => self.create(title).await,
            Step::Toggle { title } => self.toggle(title).await.map(|_| ()),
            Step::Delete { title, best_effort } => match self.delete(title).await {
                Err(e) if *best_effort && e.is_settle_timeout() => {
                    error!("Failed to delete task '{}': {}", title, e);
                    self.soft_failures.push(format!("delete '{}': {}", title, e));
                    let filter = self.filter;
                    self.recover().await?;
                    if filter != FilterKind::All {
                        self.filter_view(filter).await?;
                    }
                    Ok(())
                }
                other => other,
            },
            Step::DeleteAll => self.delete_all().await,
            Step::Edit {
                title,
                new_title,
                gesture,
            } => self.edit(title, new_title, *gesture).await,
            Step::CancelEdit { title, draft } => self.cancel_edit(title, draft).await,
            Step::Filter { kind } => self.filter_view(*kind).await,
            Step::FilterRoundTrip { via } => self.filter_round_trip(*via).await,
            Step::Reload => self.reload().await,
            Step::ExpectCount { count } => self.expect_count(*count).await,
            Step::ExpectTitles { titles } => self.expect_titles(titles).await,
            Step::ExpectVisible { title } => self.expect_presence(title, true).await,
            Step::ExpectAbsent { title } => self.expect_presence(title, false).await,
            Step::ExpectCompleted { title, completed } => {
                self.expect_completed(title, *completed).await
            }
            Step::Fail { reason } => {
                self.state = SessionState::Failed;
                Err(E2eError::IntentionalFailure(reason.clone()))
            }
        }
    }

    /// Open the entry view (or `url`) and adopt the list it shows
    pub async fn navigate(&mut self, url: Option<&str>) -> E2eResult<()> {
        if matches!(self.state, SessionState::Failed | SessionState::AwaitingSettle) {
            return Err(self.invalid_transition("navigate"));
        }
        let url = url.unwrap_or(&self.entry_url).to_string();
        if selectors::route_filter(&url) != FilterKind::All {
            return Err(E2eError::Config(format!(
                "'{}' opens a filtered view; navigate to the unfiltered view and use a filter step",
                url
            )));
        }
        let result = self.load(&url).await;
        self.end_command(result)
    }

    /// Header, input and placeholder of the entry view
    pub async fn expect_loaded(&mut self) -> E2eResult<()> {
        self.begin_command("expect_loaded")?;
        let result = self.expect_loaded_inner().await;
        self.end_command(result)
    }

    /// Count and visibility of the task list agree. Returns the count.
    pub async fn inspect(&mut self) -> E2eResult<usize> {
        self.begin_command("inspect")?;
        let result = self.inspect_inner().await;
        self.end_command(result)
    }

    pub async fn create(&mut self, title: &str) -> E2eResult<()> {
        self.begin_command("create")?;
        let result = self.create_inner(title).await;
        self.end_command(result)
    }

    /// Flip a task's completion. Returns the new flag.
    pub async fn toggle(&mut self, title: &str) -> E2eResult<bool> {
        self.begin_command("toggle")?;
        let result = self.toggle_inner(title).await;
        self.end_command(result)
    }

    pub async fn delete(&mut self, title: &str) -> E2eResult<()> {
        self.begin_command("delete")?;
        let result = self.delete_inner(title).await;
        self.end_command(result)
    }

    /// Delete every visible task, last to first
    pub async fn delete_all(&mut self) -> E2eResult<()> {
        self.begin_command("delete_all")?;
        let result = self.delete_all_inner().await;
        self.end_command(result)
    }

    pub async fn edit(&mut self, title: &str, new_title: &str, gesture: EditGesture) -> E2eResult<()> {
        self.begin_command("edit")?;
        let result = self.edit_inner(title, new_title, Some(gesture)).await;
        self.end_command(result)
    }

    /// Open the editor, type `draft`, then abandon it with Escape
    pub async fn cancel_edit(&mut self, title: &str, draft: &str) -> E2eResult<()> {
        self.begin_command("cancel_edit")?;
        let result = self.edit_inner(title, draft, None).await;
        self.end_command(result)
    }

    pub async fn filter_view(&mut self, kind: FilterKind) -> E2eResult<()> {
        self.begin_command("filter")?;
        let result = self.filter_inner(kind).await;
        self.end_command(result)
    }

    /// Switch to `via` and back, the visible set must be reproduced exactly
    pub async fn filter_round_trip(&mut self, via: FilterKind) -> E2eResult<()> {
        self.begin_command("filter_round_trip")?;
        let result = self.filter_round_trip_inner(via).await;
        self.end_command(result)
    }

    pub async fn reload(&mut self) -> E2eResult<()> {
        self.begin_command("reload")?;
        let result = self.reload_inner().await;
        self.end_command(result)
    }

    pub async fn expect_count(&mut self, count: usize) -> E2eResult<()> {
        self.begin_command("expect_count")?;
        let result = self.expect_count_inner(count).await;
        self.end_command(result)
    }

    pub async fn expect_titles(&mut self, titles: &[String]) -> E2eResult<()> {
        self.begin_command("expect_titles")?;
        let result = self.expect_titles_inner(titles).await;
        self.end_command(result)
    }

    /// A task titled exactly `title` is (or is not) in the visible list
    pub async fn expect_presence(&mut self, title: &str, present: bool) -> E2eResult<()> {
        let command = if present { "expect_visible" } else { "expect_absent" };
        self.begin_command(command)?;
        let result = self.expect_presence_inner(command, title, present).await;
        self.end_command(result)
    }

    pub async fn expect_completed(&mut self, title: &str, completed: bool) -> E2eResult<()> {
        self.begin_command("expect_completed")?;
        let result = self.expect_completed_inner(title, completed).await;
        self.end_command(result)
    }

    // --- state machine ---

    fn resting_state(&self) -> SessionState {
        match self.filter {
            FilterKind::All => SessionState::Ready,
            kind => SessionState::Filtered(kind),
        }
    }

    fn invalid_transition(&self, command: &str) -> E2eError {
        E2eError::InvalidTransition {
            from: self.state.to_string(),
            to: command.to_string(),
        }
    }

    fn begin_command(&mut self, command: &str) -> E2eResult<()> {
        match self.state {
            SessionState::Ready | SessionState::Filtered(_) => {
                self.state = SessionState::AwaitingSettle;
                Ok(())
            }
            _ => Err(self.invalid_transition(command)),
        }
    }

    fn end_command<T>(&mut self, result: E2eResult<T>) -> E2eResult<T> {
        self.state = match &result {
            Ok(_) => self.resting_state(),
            Err(_) => SessionState::Failed,
        };
        result
    }

    // --- command bodies ---

    async fn load(&mut self, url: &str) -> E2eResult<()> {
        self.page.navigate(url).await.map_err(|e| match e {
            E2eError::Navigation(_) => e,
            e if e.is_fatal() => e,
            e => E2eError::Navigation(format!("{}: {}", url, e)),
        })?;
        self.wait_for_entry_view(url).await?;
        self.state = SessionState::Navigated;

        let observed = observe_list(self.page).await?;
        self.oracle.adopt(&observed)?;
        self.filter = FilterKind::All;
        info!("Opened {} with {} task(s)", url, observed.len());
        Ok(())
    }

    async fn wait_for_entry_view(&mut self, url: &str) -> E2eResult<()> {
        let outcome = self
            .page
            .wait_for(selectors::NEW_TODO, WaitState::Visible, self.settle.timeout())
            .await?;
        match outcome {
            WaitOutcome::Satisfied => Ok(()),
            WaitOutcome::TimedOut => Err(E2eError::Navigation(format!(
                "{} never showed '{}' within {} ms",
                url,
                selectors::NEW_TODO,
                self.settle.timeout_ms
            ))),
        }
    }

    async fn expect_loaded_inner(&mut self) -> E2eResult<()> {
        let body = self.page.is_visible(selectors::BODY).await?;
        self.check("expect_loaded", selectors::BODY, "visible", body, "hidden")?;

        let header = self.page.text_of(selectors::HEADER).await?;
        let header = header.trim();
        if header != selectors::HEADER_TEXT {
            return Err(assertion(
                "expect_loaded",
                selectors::HEADER,
                selectors::HEADER_TEXT,
                header,
            ));
        }

        let input = self.page.is_visible(selectors::NEW_TODO).await?;
        self.check("expect_loaded", selectors::NEW_TODO, "visible", input, "hidden")?;

        let placeholder = self
            .page
            .attribute_of(selectors::NEW_TODO, "placeholder")
            .await?;
        if placeholder.as_deref() != Some(selectors::NEW_TODO_PLACEHOLDER) {
            return Err(assertion(
                "expect_loaded",
                selectors::NEW_TODO,
                format!("placeholder {:?}", selectors::NEW_TODO_PLACEHOLDER),
                format!("placeholder {:?}", placeholder),
            ));
        }
        Ok(())
    }

    async fn inspect_inner(&mut self) -> E2eResult<usize> {
        self.settle_on(Probe::List {
            expected: self.oracle.snapshot(self.filter),
        })
        .await?;

        let count = self.page.count(selectors::ITEMS).await?;
        let visible = self.page.is_visible(selectors::ITEMS).await?;
        if visible != (count > 0) {
            return Err(assertion(
                "inspect",
                selectors::ITEMS,
                format!("visible={} for {} task(s)", count > 0, count),
                format!("visible={}", visible),
            ));
        }

        if count == 0 {
            info!("No tasks on the page");
        } else {
            info!("{} task(s) on the page", count);
        }
        Ok(count)
    }

    async fn create_inner(&mut self, title: &str) -> E2eResult<()> {
        let task = self.oracle.create(title)?;
        debug!("Creating task '{}' ({})", task.title, task.id);

        self.page.type_text(selectors::NEW_TODO, title).await?;
        self.page.press_key(keys::ENTER).await?;

        self.settle_on(self.count_probe()).await?;
        self.verify("create").await
    }

    async fn toggle_inner(&mut self, title: &str) -> E2eResult<bool> {
        let (id, index) = self.locate(title)?;
        self.page.click(&selectors::toggle(index)).await?;
        let completed = self.oracle.toggle(id)?;

        let probe = match self.oracle.position_in_view(self.filter, id) {
            Some(position) => Probe::completed_marker(selectors::item(position), completed),
            None => self.count_probe(),
        };
        self.settle_on(probe).await?;
        self.verify("toggle").await?;
        Ok(completed)
    }

    async fn delete_inner(&mut self, title: &str) -> E2eResult<()> {
        let (id, index) = self.locate(title)?;
        self.page.hover(&selectors::item(index)).await?;
        self.page.click(&selectors::destroy(index)).await?;
        self.oracle.delete(id)?;

        self.settle_on(self.count_probe()).await?;
        self.verify("delete").await
    }

    async fn delete_all_inner(&mut self) -> E2eResult<()> {
        self.settle_on(self.count_probe()).await?;
        let initial = self.page.count(selectors::ITEMS).await?;
        debug!("Deleting {} task(s)", initial);

        for _ in 0..initial {
            let remaining = self.page.count(selectors::ITEMS).await?;
            if remaining == 0 {
                break;
            }
            let last = remaining - 1;
            self.page.hover(&selectors::item(last)).await?;
            self.page.click(&selectors::destroy(last)).await?;

            let id = self.oracle.view(self.filter).last().map(|task| task.id);
            if let Some(id) = id {
                self.oracle.delete(id)?;
            }
            self.settle_on(Probe::count(selectors::ITEMS, last)).await?;
        }

        let remaining = self.page.count(selectors::ITEMS).await?;
        if remaining != 0 {
            return Err(assertion(
                "delete_all",
                selectors::ITEMS,
                "0",
                remaining.to_string(),
            ));
        }
        self.verify("delete_all").await
    }

    /// Shared by edit (`gesture` set) and cancel (`gesture` absent)
    async fn edit_inner(
        &mut self,
        title: &str,
        draft: &str,
        gesture: Option<EditGesture>,
    ) -> E2eResult<()> {
        let command = if gesture.is_some() { "edit" } else { "cancel_edit" };
        let (id, index) = self.locate(title)?;
        let mut session = self.oracle.begin_edit(id)?;

        self.page.double_click(&selectors::label(index)).await?;
        let opened = self
            .settle_on(Probe::Visible {
                selector: selectors::edit_input(index),
                visible: true,
            })
            .await;
        if let Err(e) = opened {
            self.oracle.cancel_edit(session)?;
            return Err(e);
        }

        session.set_draft(draft);
        self.page
            .type_text(&selectors::edit_input(index), session.draft())
            .await?;

        match gesture {
            Some(EditGesture::Enter) => self.page.press_key(keys::ENTER).await?,
            Some(EditGesture::Tab) => self.page.press_key(keys::TAB).await?,
            Some(EditGesture::ClickOutside) => self.page.click(selectors::OUTSIDE).await?,
            None => self.page.press_key(keys::ESCAPE).await?,
        }

        if gesture.is_some() {
            let new_title = session.draft().to_string();
            match self.oracle.commit_edit(session, &new_title)? {
                EditOutcome::Renamed { previous, title } => {
                    debug!("Renamed '{}' to '{}'", previous, title)
                }
                EditOutcome::Deleted(task) => debug!("Empty edit deleted '{}'", task.title),
            }
        } else {
            self.oracle.cancel_edit(session)?;
        }

        self.settle_on(Probe::hidden(selectors::EDIT_INPUT)).await?;
        self.settle_on(self.count_probe()).await?;
        self.verify(command).await
    }

    async fn filter_inner(&mut self, kind: FilterKind) -> E2eResult<()> {
        self.page.click(&selectors::filter_link(kind)).await?;
        self.filter = kind;
        // Two views can hold the same number of tasks, so wait for the list itself
        self.settle_on(Probe::List {
            expected: self.oracle.snapshot(kind),
        })
        .await?;
        self.verify("filter").await
    }

    async fn filter_round_trip_inner(&mut self, via: FilterKind) -> E2eResult<()> {
        let home = self.filter;
        let before = self.observe_settled().await?;

        self.filter_inner(via).await?;
        self.filter_inner(home).await?;

        let after = observe_list(self.page).await?;
        if before != after {
            return Err(assertion(
                "filter_round_trip",
                selectors::ITEMS,
                format_list(&before),
                format_list(&after),
            ));
        }
        Ok(())
    }

    async fn reload_inner(&mut self) -> E2eResult<()> {
        self.page.reload().await?;
        let url = self.entry_url.clone();
        self.wait_for_entry_view(&url).await?;

        self.settle_on(self.count_probe()).await?;
        self.verify("reload").await
    }

    async fn expect_count_inner(&mut self, count: usize) -> E2eResult<()> {
        let observed = self.observe_settled().await?;
        if observed.len() != count {
            return Err(assertion(
                "expect_count",
                selectors::ITEMS,
                count.to_string(),
                observed.len().to_string(),
            ));
        }
        Ok(())
    }

    async fn expect_titles_inner(&mut self, titles: &[String]) -> E2eResult<()> {
        let observed = self.observe_settled().await?;
        let actual: Vec<&str> = observed.iter().map(|t| t.title.as_str()).collect();
        if actual != titles {
            return Err(assertion(
                "expect_titles",
                selectors::ITEMS,
                format!("{:?}", titles),
                format!("{:?}", actual),
            ));
        }
        Ok(())
    }

    async fn expect_presence_inner(
        &mut self,
        command: &str,
        title: &str,
        present: bool,
    ) -> E2eResult<()> {
        let observed = self.observe_settled().await?;
        let found = observed.iter().any(|t| t.title == title);
        if found != present {
            let describe = |p: bool| if p { "present" } else { "absent" };
            return Err(assertion(
                command,
                selectors::ITEMS,
                format!("'{}' {}", title, describe(present)),
                format!("'{}' {} in {}", title, describe(found), format_list(&observed)),
            ));
        }
        Ok(())
    }

    async fn expect_completed_inner(&mut self, title: &str, completed: bool) -> E2eResult<()> {
        let observed = self.observe_settled().await?;
        let selector = self
            .oracle
            .find_by_title(title)
            .and_then(|task| self.oracle.position_in_view(self.filter, task.id))
            .map(selectors::item)
            .unwrap_or_else(|| selectors::ITEMS.to_string());

        match observed.iter().find(|t| t.title == title) {
            None => Err(assertion(
                "expect_completed",
                selector,
                format!("'{}' present", title),
                format_list(&observed),
            )),
            Some(task) if task.completed != completed => Err(assertion(
                "expect_completed",
                selector,
                format!("completed={}", completed),
                format!("completed={}", task.completed),
            )),
            Some(_) => Ok(()),
        }
    }

    // --- helpers ---

    /// Position of the task titled exactly `title` in the current view
    fn locate(&self, title: &str) -> E2eResult<(TaskId, usize)> {
        let task = self
            .oracle
            .find_by_title(title)
            .ok_or_else(|| tickmark_common::Error::title_not_found(title))?;
        let index = self
            .oracle
            .position_in_view(self.filter, task.id)
            .ok_or_else(|| {
                E2eError::ElementNotFound(format!(
                    "task '{}' is not in the {} view",
                    title, self.filter
                ))
            })?;
        Ok((task.id, index))
    }

    fn count_probe(&self) -> Probe {
        Probe::count(selectors::ITEMS, self.oracle.view(self.filter).len())
    }

    async fn settle_on(&mut self, probe: Probe) -> E2eResult<()> {
        settle(self.page, &probe, &self.settle).await.map(|_| ())
    }

    /// Wait for the page to show the oracle's view, then read it
    async fn observe_settled(&mut self) -> E2eResult<Vec<ObservedTask>> {
        let expected = self.oracle.snapshot(self.filter);
        match self.settle_on(Probe::List { expected }).await {
            Ok(()) => {}
            // Assert against the caller's expectation, but keep the divergence
            Err(e) if e.is_settle_timeout() => {
                warn!("Page never matched the model: {}", e);
                self.soft_failures.push(format!("page diverged from model: {}", e));
            }
            Err(e) => return Err(e),
        }
        observe_list(self.page).await
    }

    /// The visible list matches the oracle's view
    async fn verify(&mut self, command: &str) -> E2eResult<()> {
        let expected = self.oracle.snapshot(self.filter);
        let observed = observe_list(self.page).await?;
        if observed != expected {
            return Err(assertion(
                command,
                selectors::ITEMS,
                format_list(&expected),
                format_list(&observed),
            ));
        }
        Ok(())
    }

    fn check(
        &self,
        command: &str,
        selector: &str,
        expected: &str,
        holds: bool,
        observed: &str,
    ) -> E2eResult<()> {
        if holds {
            Ok(())
        } else {
            Err(assertion(command, selector, expected, observed))
        }
    }
}

fn assertion(
    command: &str,
    selector: impl Into<String>,
    expected: impl Into<String>,
    observed: impl Into<String>,
) -> E2eError {
    E2eError::AssertionFailed {
        command: command.to_string(),
        selector: selector.into(),
        expected: expected.into(),
        observed: observed.into(),
    }
}
