//! Page-interaction interface the harness drives a live instance through

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;

/// Element state a wait can target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitOutcome {
    Satisfied,
    TimedOut,
}

/// Key names understood by every driver
pub mod keys {
    pub const ENTER: &str = "Enter";
    pub const TAB: &str = "Tab";
    pub const ESCAPE: &str = "Escape";
}

/// A live instance of the application under test.
///
/// Methods take `&mut self`: one caller, one command in flight.
#[async_trait]
pub trait Page: Send {
    async fn navigate(&mut self, url: &str) -> E2eResult<()>;

    async fn is_visible(&mut self, selector: &str) -> E2eResult<bool>;

    /// Rendered text of the first match
    async fn text_of(&mut self, selector: &str) -> E2eResult<String>;

    /// Attribute of the first match, `None` when the attribute is absent
    async fn attribute_of(&mut self, selector: &str, name: &str) -> E2eResult<Option<String>>;

    async fn count(&mut self, selector: &str) -> E2eResult<usize>;

    /// Replace the value of an input with `text`
    async fn type_text(&mut self, selector: &str, text: &str) -> E2eResult<()>;

    async fn press_key(&mut self, key: &str) -> E2eResult<()>;

    async fn click(&mut self, selector: &str) -> E2eResult<()>;

    async fn double_click(&mut self, selector: &str) -> E2eResult<()>;

    async fn hover(&mut self, selector: &str) -> E2eResult<()>;

    async fn wait_for(
        &mut self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> E2eResult<WaitOutcome>;

    async fn reload(&mut self) -> E2eResult<()>;

    /// Tear the instance down. Further calls are errors.
    async fn close(&mut self) -> E2eResult<()>;
}

/// Provisions one independent live instance per scenario group
#[async_trait]
pub trait PageFactory: Send + Sync {
    async fn provision(&self) -> E2eResult<Box<dyn Page>>;

    fn name(&self) -> &'static str;
}
