//! Tickmark E2E Harness
//!
//! Drives a live TodoMVC instance through declarative YAML scenarios and
//! checks every command against the [`tickmark_common::TodoList`] model:
//! - Sends each command through the [`Page`] interface
//! - Waits for the visible effect with a bounded poll before asserting
//! - Provisions one instance per scenario group and closes it afterwards
//! - Reports pytest-style outcomes, including expected failures
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TestRunner (Rust)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  run_group(group)                                           │
//! │    ├── PageFactory::provision() -> Box<dyn Page>            │
//! │    ├── Session::new(&mut page, url, settle)                 │
//! │    │     ├── execute(step) -> act, model, settle, verify    │
//! │    │     └── recover() after a non-fatal failure            │
//! │    └── page.close()                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page                                                       │
//! │    ├── PlaywrightPage  (node driver, JSON lines)            │
//! │    └── SimulatedPage   (in-process, latency + faults)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ScenarioGroup (YAML)                                       │
//! │    ├── name, url?                                           │
//! │    └── scenarios: [Scenario]                                │
//! │          ├── create { title } / toggle / delete / edit      │
//! │          ├── filter { kind } / filter_round_trip { via }    │
//! │          └── expect_count / expect_titles / expect_visible  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod selectors;
pub mod session;
pub mod settle;
pub mod simulated;
pub mod spec;

pub use config::{Driver, HarnessConfig};
pub use error::{E2eError, E2eResult};
pub use page::{Page, PageFactory, WaitOutcome, WaitState};
pub use runner::{Outcome, ScenarioResult, SuiteResult, TestRunner};
pub use session::{EditGesture, Session, SessionState};
pub use settle::{settle, Probe, SettleConfig};
pub use simulated::{SimulatedConfig, SimulatedFactory, SimulatedHandle, SimulatedPage};
pub use spec::{Scenario, ScenarioGroup, Step};
