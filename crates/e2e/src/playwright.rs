//! Playwright browser automation
//!
//! A single Node.js process per live instance runs an embedded driver
//! script. Requests and responses are newline-delimited JSON over the child's
//! stdin/stdout, one request in flight at a time.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{Page, PageFactory, WaitOutcome, WaitState};

const DRIVER_SCRIPT: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const config = JSON.parse(process.argv[2]);
const send = (msg) => process.stdout.write(JSON.stringify(msg) + '\n');

class NotFound extends Error {
  constructor(selector) {
    super(`no element matches ${selector}`);
    this.name = 'NotFound';
  }
}

(async () => {
  const browser = await playwright[config.browser].launch({ headless: config.headless });
  const context = await browser.newContext({
    viewport: { width: config.viewport_width, height: config.viewport_height },
  });
  const page = await context.newPage();
  page.setDefaultTimeout(config.action_timeout_ms);

  const existing = async (selector) => {
    const locator = page.locator(selector);
    if ((await locator.count()) === 0) throw new NotFound(selector);
    return locator.first();
  };

  const handlers = {
    navigate: async (r) => { await page.goto(r.url); return null; },
    is_visible: async (r) => page.locator(r.selector).first().isVisible(),
    text_of: async (r) => (await existing(r.selector)).innerText(),
    attribute_of: async (r) => (await existing(r.selector)).getAttribute(r.name),
    count: async (r) => page.locator(r.selector).count(),
    type_text: async (r) => { await (await existing(r.selector)).fill(r.text); return null; },
    press_key: async (r) => { await page.keyboard.press(r.key); return null; },
    click: async (r) => { await (await existing(r.selector)).click(); return null; },
    double_click: async (r) => { await (await existing(r.selector)).dblclick(); return null; },
    hover: async (r) => { await (await existing(r.selector)).hover(); return null; },
    wait_for: async (r) => {
      try {
        await page.locator(r.selector).first().waitFor({ state: r.state, timeout: r.timeout_ms });
        return 'satisfied';
      } catch (e) {
        if (e.name === 'TimeoutError') return 'timed_out';
        throw e;
      }
    },
    reload: async () => { await page.reload(); return null; },
    close: async () => { await browser.close(); return null; },
  };

  send({ id: 0, ok: true, value: 'ready' });

  const lines = readline.createInterface({ input: process.stdin });
  for await (const line of lines) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
    } catch (e) {
      send({ id: -1, ok: false, kind: 'error', error: `bad request: ${e.message}` });
      continue;
    }
    try {
      const handler = handlers[req.op];
      if (!handler) throw new Error(`unknown op '${req.op}'`);
      const value = await handler(req);
      send({ id: req.id, ok: true, value: value === undefined ? null : value });
      if (req.op === 'close') process.exit(0);
    } catch (e) {
      let kind = 'error';
      if (req.op === 'navigate' || req.op === 'reload') kind = 'navigation';
      else if (e.name === 'NotFound') kind = 'not_found';
      else if (e.name === 'TimeoutError') kind = 'timeout';
      send({ id: req.id, ok: false, kind, error: e.message });
    }
  }
  await browser.close();
})().catch((e) => {
  send({ id: 0, ok: false, kind: 'launch', error: e.message });
  process.exit(1);
});
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Node.js executable used to run the driver
    pub node_binary: PathBuf,

    /// Upper bound for a single browser action
    pub action_timeout_ms: u64,

    /// Time allowed for the browser to start
    pub launch_timeout_ms: u64,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1280,
            viewport_height: 720,
            node_binary: PathBuf::from("node"),
            action_timeout_ms: 5000,
            launch_timeout_ms: 30_000,
        }
    }
}

/// Arguments handed to the driver script
#[derive(Serialize)]
struct LaunchArgs<'a> {
    browser: &'a str,
    headless: bool,
    viewport_width: u32,
    viewport_height: u32,
    action_timeout_ms: u64,
}

impl<'a> From<&'a PlaywrightConfig> for LaunchArgs<'a> {
    fn from(config: &'a PlaywrightConfig) -> Self {
        Self {
            browser: config.browser.as_str(),
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            action_timeout_ms: config.action_timeout_ms,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request<'r> {
    Navigate { url: &'r str },
    IsVisible { selector: &'r str },
    TextOf { selector: &'r str },
    AttributeOf { selector: &'r str, name: &'r str },
    Count { selector: &'r str },
    TypeText { selector: &'r str, text: &'r str },
    PressKey { key: &'r str },
    Click { selector: &'r str },
    DoubleClick { selector: &'r str },
    Hover { selector: &'r str },
    WaitFor {
        selector: &'r str,
        state: WaitState,
        timeout_ms: u64,
    },
    Reload,
    Close,
}

impl Request<'_> {
    fn target(&self) -> &str {
        match self {
            Request::Navigate { url } => url,
            Request::IsVisible { selector }
            | Request::TextOf { selector }
            | Request::AttributeOf { selector, .. }
            | Request::Count { selector }
            | Request::TypeText { selector, .. }
            | Request::Click { selector }
            | Request::DoubleClick { selector }
            | Request::Hover { selector }
            | Request::WaitFor { selector, .. } => selector,
            Request::PressKey { key } => key,
            Request::Reload | Request::Close => "page",
        }
    }
}

#[derive(Serialize)]
struct Envelope<'r> {
    id: u64,
    #[serde(flatten)]
    request: Request<'r>,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: i64,
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl Response {
    fn into_result(self, target: &str) -> E2eResult<serde_json::Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.error.unwrap_or_else(|| "unknown driver error".to_string());
        Err(match self.kind.as_deref() {
            Some("not_found") => E2eError::ElementNotFound(target.to_string()),
            Some("timeout") => E2eError::NotActionable {
                selector: target.to_string(),
                reason: message,
            },
            Some("navigation") => E2eError::Navigation(format!("{}: {}", target, message)),
            _ => E2eError::Driver(message),
        })
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value) -> E2eResult<T> {
    serde_json::from_value(value).map_err(E2eError::from)
}

/// Check if Playwright is installed
pub async fn check_playwright_installed() -> E2eResult<()> {
    let output = Command::new("npx")
        .args(["playwright", "--version"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match output {
        Ok(status) if status.success() => Ok(()),
        _ => Err(E2eError::PlaywrightNotFound),
    }
}

/// A browser page driven through a persistent Playwright process
pub struct PlaywrightPage {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    closed: bool,
    response_timeout: Duration,

    /// Holds the driver script for the life of the process
    _workdir: TempDir,
}

impl PlaywrightPage {
    /// Start a browser and wait until the driver reports ready
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        check_playwright_installed().await?;

        let workdir = tempfile::tempdir()?;
        let script_path = workdir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let args = serde_json::to_string(&LaunchArgs::from(&config))?;
        let node_path = std::env::current_dir()?.join("node_modules");

        info!(
            "Launching {} ({}headless)",
            config.browser.as_str(),
            if config.headless { "" } else { "not " }
        );

        let mut child = Command::new(&config.node_binary)
            .arg(&script_path)
            .arg(args)
            .env("NODE_PATH", node_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Driver(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Driver("driver stdout unavailable".to_string()))?;

        let mut page = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 0,
            closed: false,
            response_timeout: Duration::from_millis(config.action_timeout_ms)
                + Duration::from_secs(5),
            _workdir: workdir,
        };

        let ready = timeout(
            Duration::from_millis(config.launch_timeout_ms),
            page.read_response(0),
        )
        .await
        .map_err(|_| {
            E2eError::Driver(format!(
                "browser did not start within {} ms",
                config.launch_timeout_ms
            ))
        })??;
        ready.into_result("browser")?;

        debug!("Playwright driver ready (pid {:?})", page.child.id());
        Ok(page)
    }

    async fn read_response(&mut self, id: u64) -> E2eResult<Response> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await
                .map_err(|e| E2eError::Driver(format!("driver stdout: {}", e)))?
                .ok_or_else(|| E2eError::Driver("driver exited".to_string()))?;

            let response: Response = match serde_json::from_str(&line) {
                Ok(response) => response,
                Err(_) => {
                    debug!("[driver] {}", line);
                    continue;
                }
            };
            if response.id != id as i64 {
                warn!("Discarding driver response {} (waiting for {})", response.id, id);
                continue;
            }
            return Ok(response);
        }
    }

    async fn request(&mut self, request: Request<'_>) -> E2eResult<serde_json::Value> {
        if self.closed {
            return Err(E2eError::Driver("browser has been closed".to_string()));
        }

        self.next_id += 1;
        let id = self.next_id;
        let target = request.target().to_string();

        let mut line = serde_json::to_string(&Envelope { id, request })?;
        line.push('\n');
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| E2eError::Driver(format!("driver stdin: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| E2eError::Driver(format!("driver stdin: {}", e)))?;

        let response = timeout(self.response_timeout, self.read_response(id))
            .await
            .map_err(|_| {
                E2eError::Driver(format!(
                    "no response for '{}' within {:?}",
                    target, self.response_timeout
                ))
            })??;
        response.into_result(&target)
    }

    /// SIGTERM, a short grace period, then kill
    async fn terminate(&mut self) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok()
                    && timeout(Duration::from_millis(500), self.child.wait())
                        .await
                        .is_ok()
                {
                    return;
                }
            }
        }

        let _ = self.child.kill().await;
    }
}

#[async_trait]
impl Page for PlaywrightPage {
    async fn navigate(&mut self, url: &str) -> E2eResult<()> {
        self.request(Request::Navigate { url }).await.map(|_| ())
    }

    async fn is_visible(&mut self, selector: &str) -> E2eResult<bool> {
        decode(self.request(Request::IsVisible { selector }).await?)
    }

    async fn text_of(&mut self, selector: &str) -> E2eResult<String> {
        decode(self.request(Request::TextOf { selector }).await?)
    }

    async fn attribute_of(&mut self, selector: &str, name: &str) -> E2eResult<Option<String>> {
        decode(self.request(Request::AttributeOf { selector, name }).await?)
    }

    async fn count(&mut self, selector: &str) -> E2eResult<usize> {
        decode(self.request(Request::Count { selector }).await?)
    }

    async fn type_text(&mut self, selector: &str, text: &str) -> E2eResult<()> {
        self.request(Request::TypeText { selector, text })
            .await
            .map(|_| ())
    }

    async fn press_key(&mut self, key: &str) -> E2eResult<()> {
        self.request(Request::PressKey { key }).await.map(|_| ())
    }

    async fn click(&mut self, selector: &str) -> E2eResult<()> {
        self.request(Request::Click { selector }).await.map(|_| ())
    }

    async fn double_click(&mut self, selector: &str) -> E2eResult<()> {
        self.request(Request::DoubleClick { selector })
            .await
            .map(|_| ())
    }

    async fn hover(&mut self, selector: &str) -> E2eResult<()> {
        self.request(Request::Hover { selector }).await.map(|_| ())
    }

    async fn wait_for(
        &mut self,
        selector: &str,
        state: WaitState,
        wait: Duration,
    ) -> E2eResult<WaitOutcome> {
        decode(
            self.request(Request::WaitFor {
                selector,
                state,
                timeout_ms: wait.as_millis() as u64,
            })
            .await?,
        )
    }

    async fn reload(&mut self) -> E2eResult<()> {
        self.request(Request::Reload).await.map(|_| ())
    }

    async fn close(&mut self) -> E2eResult<()> {
        if self.closed {
            return Ok(());
        }
        if let Err(e) = self.request(Request::Close).await {
            warn!("Browser close failed: {}", e);
        }
        self.closed = true;
        self.terminate().await;
        info!("Browser closed");
        Ok(())
    }
}

impl Drop for PlaywrightPage {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = self.child.id() {
                let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
            }
        }
        let _ = self.child.start_kill();
    }
}

/// Launches one browser per scenario group
pub struct PlaywrightFactory {
    config: PlaywrightConfig,
}

impl PlaywrightFactory {
    pub fn new(config: PlaywrightConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PageFactory for PlaywrightFactory {
    async fn provision(&self) -> E2eResult<Box<dyn Page>> {
        let page = PlaywrightPage::launch(self.config.clone()).await?;
        Ok(Box::new(page))
    }

    fn name(&self) -> &'static str {
        "playwright"
    }
}
