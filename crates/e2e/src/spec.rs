//! Declarative YAML scenario definitions

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tickmark_common::FilterKind;

use crate::error::{E2eError, E2eResult};
use crate::session::EditGesture;

const BUILTIN_SUITE: &str = include_str!("../scenarios/todomvc.yaml");

/// Scenarios that share one live instance, run in file order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioGroup {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Entry URL; the configured base URL when absent
    #[serde(default)]
    pub url: Option<String>,

    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Known-failing: a failure is reported as XFAIL with this reason
    #[serde(default)]
    pub expect_failure: Option<String>,

    pub steps: Vec<Step>,
}

/// A single step of a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Open the entry view (or `url`) and adopt whatever it shows
    Navigate {
        #[serde(default)]
        url: Option<String>,
    },

    /// Header, new-task input and its placeholder are in place
    ExpectLoaded,

    /// Report the tasks present, checking count and visibility agree
    Inspect,

    Create {
        title: String,
    },

    Toggle {
        title: String,
    },

    Delete {
        title: String,
        /// A deletion that never shows up is logged and recorded instead of
        /// ending the scenario
        #[serde(default)]
        best_effort: bool,
    },

    DeleteAll,

    Edit {
        title: String,
        new_title: String,
        #[serde(default)]
        gesture: EditGesture,
    },

    CancelEdit {
        title: String,
        draft: String,
    },

    Filter {
        kind: FilterKind,
    },

    /// Switch to `via` and back; the visible set must be unchanged
    FilterRoundTrip {
        via: FilterKind,
    },

    Reload,

    ExpectCount {
        count: usize,
    },

    ExpectTitles {
        titles: Vec<String>,
    },

    ExpectVisible {
        title: String,
    },

    ExpectAbsent {
        title: String,
    },

    ExpectCompleted {
        title: String,
        completed: bool,
    },

    /// Always fails
    Fail {
        reason: String,
    },
}

impl Step {
    pub fn name(&self) -> String {
        match self {
            Step::Navigate { url } => match url {
                Some(url) => format!("navigate:{}", url),
                None => "navigate".to_string(),
            },
            Step::ExpectLoaded => "expect_loaded".to_string(),
            Step::Inspect => "inspect".to_string(),
            Step::Create { title } => format!("create:{}", title),
            Step::Toggle { title } => format!("toggle:{}", title),
            Step::Delete { title, .. } => format!("delete:{}", title),
            Step::DeleteAll => "delete_all".to_string(),
            Step::Edit { title, gesture, .. } => format!("edit:{}:{}", title, gesture),
            Step::CancelEdit { title, .. } => format!("cancel_edit:{}", title),
            Step::Filter { kind } => format!("filter:{}", kind),
            Step::FilterRoundTrip { via } => format!("filter_round_trip:{}", via),
            Step::Reload => "reload".to_string(),
            Step::ExpectCount { count } => format!("expect_count:{}", count),
            Step::ExpectTitles { titles } => format!("expect_titles:{}", titles.len()),
            Step::ExpectVisible { title } => format!("expect_visible:{}", title),
            Step::ExpectAbsent { title } => format!("expect_absent:{}", title),
            Step::ExpectCompleted { title, .. } => format!("expect_completed:{}", title),
            Step::Fail { .. } => "fail".to_string(),
        }
    }
}

impl ScenarioGroup {
    /// Parse a group from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let group: Self = serde_yaml::from_str(yaml)?;
        group.validate()?;
        Ok(group)
    }

    /// Parse a group from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every group under a directory, sorted by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut groups = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            groups.push(Self::from_file(entry.path())?);
        }

        Ok(groups)
    }

    /// The TodoMVC suite shipped with the harness
    pub fn builtin() -> E2eResult<Self> {
        Self::from_yaml(BUILTIN_SUITE)
    }

    pub fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::ScenarioParse("group name is empty".to_string()));
        }
        if self.scenarios.is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "group '{}' has no scenarios",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(E2eError::ScenarioParse(format!(
                    "group '{}' defines scenario '{}' twice",
                    self.name, scenario.name
                )));
            }
            if scenario.steps.is_empty() {
                return Err(E2eError::ScenarioParse(format!(
                    "scenario '{}' has no steps",
                    scenario.name
                )));
            }
        }
        Ok(())
    }

    /// Scenarios carrying `tag`
    pub fn filter_by_tag<'a>(&'a self, tag: &str) -> Vec<&'a Scenario> {
        self.scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}
