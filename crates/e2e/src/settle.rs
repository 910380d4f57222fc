//! Bounded waits for asynchronous page updates.
//!
//! A command's visible effect lags its issuance, so every read-back goes
//! through [`settle`]: poll a [`Probe`] until it holds or the bound elapses.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tickmark_common::ObservedTask;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::selectors;

/// Settle timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettleConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            poll_interval_ms: 50,
        }
    }
}

impl SettleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// An observable predicate over the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    Count {
        selector: String,
        expected: usize,
    },
    Visible {
        selector: String,
        visible: bool,
    },
    /// Whitespace-separated token present (or absent) in an attribute
    AttributeToken {
        selector: String,
        name: String,
        token: String,
        present: bool,
    },
    /// The visible list, titles and completion markers, in order
    List { expected: Vec<ObservedTask> },
}

impl Probe {
    pub fn count(selector: impl Into<String>, expected: usize) -> Self {
        Probe::Count {
            selector: selector.into(),
            expected,
        }
    }

    pub fn hidden(selector: impl Into<String>) -> Self {
        Probe::Visible {
            selector: selector.into(),
            visible: false,
        }
    }

    pub fn completed_marker(selector: impl Into<String>, completed: bool) -> Self {
        Probe::AttributeToken {
            selector: selector.into(),
            name: "class".to_string(),
            token: "completed".to_string(),
            present: completed,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Probe::Count { selector, .. } => format!("count of '{}'", selector),
            Probe::Visible { selector, .. } => format!("visibility of '{}'", selector),
            Probe::AttributeToken { selector, name, .. } => {
                format!("attribute '{}' of '{}'", name, selector)
            }
            Probe::List { .. } => format!("visible list '{}'", selectors::ITEMS),
        }
    }

    pub fn expected(&self) -> String {
        match self {
            Probe::Count { expected, .. } => expected.to_string(),
            Probe::Visible { visible, .. } => visibility(*visible).to_string(),
            Probe::AttributeToken { token, present, .. } => {
                if *present {
                    format!("contains '{}'", token)
                } else {
                    format!("lacks '{}'", token)
                }
            }
            Probe::List { expected } => format_list(expected),
        }
    }

    /// Read the page once. `Ok(None)` means the predicate holds.
    async fn observe(&self, page: &mut dyn Page) -> E2eResult<Option<String>> {
        match self {
            Probe::Count { selector, expected } => {
                let actual = page.count(selector).await?;
                Ok((actual != *expected).then(|| actual.to_string()))
            }
            Probe::Visible { selector, visible } => {
                let actual = page.is_visible(selector).await?;
                Ok((actual != *visible).then(|| visibility(actual).to_string()))
            }
            Probe::AttributeToken {
                selector,
                name,
                token,
                present,
            } => {
                let value = page.attribute_of(selector, name).await?;
                let has = value
                    .as_deref()
                    .map(|v| has_token(v, token))
                    .unwrap_or(false);
                Ok((has != *present).then(|| format!("{:?}", value)))
            }
            Probe::List { expected } => {
                let actual = observe_list(page).await?;
                Ok((actual != *expected).then(|| format_list(&actual)))
            }
        }
    }
}

/// Poll `probe` until it holds. Returns the time it took.
///
/// Fatal driver errors end the wait immediately; other read errors (an
/// element detached between two reads) count as "not settled yet".
pub async fn settle(
    page: &mut dyn Page,
    probe: &Probe,
    config: &SettleConfig,
) -> E2eResult<Duration> {
    let start = Instant::now();
    let deadline = start + config.timeout();
    let mut attempts = 0u32;
    let mut observed = String::from("<nothing observed>");

    loop {
        attempts += 1;
        match probe.observe(page).await {
            Ok(None) => {
                let elapsed = start.elapsed();
                debug!(
                    "Settled {} after {} attempt(s) ({:?})",
                    probe.describe(),
                    attempts,
                    elapsed
                );
                return Ok(elapsed);
            }
            Ok(Some(actual)) => observed = actual,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => observed = format!("<{}>", e),
        }

        if Instant::now() >= deadline {
            return Err(E2eError::SettleTimeout {
                probe: probe.describe(),
                expected: probe.expected(),
                observed,
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }

        sleep(config.poll_interval()).await;
    }
}

/// Read the visible list: title and completion marker of every item
pub async fn observe_list(page: &mut dyn Page) -> E2eResult<Vec<ObservedTask>> {
    let count = page.count(selectors::ITEMS).await?;
    let mut items = Vec::with_capacity(count);

    for index in 0..count {
        let title = page.text_of(&selectors::label(index)).await?;
        let class = page.attribute_of(&selectors::item(index), "class").await?;
        items.push(ObservedTask {
            title: title.trim().to_string(),
            completed: class.as_deref().map(|c| has_token(c, "completed")).unwrap_or(false),
        });
    }

    Ok(items)
}

pub fn format_list(items: &[ObservedTask]) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|t| {
            if t.completed {
                format!("[x] {}", t.title)
            } else {
                format!("[ ] {}", t.title)
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

fn visibility(visible: bool) -> &'static str {
    if visible {
        "visible"
    } else {
        "hidden"
    }
}

fn has_token(value: &str, token: &str) -> bool {
    value.split_whitespace().any(|t| t == token)
}
