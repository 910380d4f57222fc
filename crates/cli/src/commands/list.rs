//! List Command

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use tickmark_e2e::{Scenario, TestRunner};

use super::{load_config, select_tagged};
use crate::output::{print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct ListArgs {
    /// Only list scenarios with one of these tags
    #[arg(short, long)]
    tag: Vec<String>,
}

/// Scenario display wrapper for serialization
#[derive(Serialize)]
pub struct ScenarioDisplay {
    pub group: String,
    pub name: String,
    pub tags: Vec<String>,
    pub steps: usize,
    pub expect_failure: Option<String>,
}

impl ScenarioDisplay {
    fn new(group: &str, scenario: &Scenario) -> Self {
        Self {
            group: group.to_string(),
            name: scenario.name.clone(),
            tags: scenario.tags.clone(),
            steps: scenario.steps.len(),
            expect_failure: scenario.expect_failure.clone(),
        }
    }
}

impl TableDisplay for ScenarioDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Group", "Scenario", "Tags", "Steps", "Expected Failure"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.group.clone(),
            self.name.clone(),
            self.tags.join(", "),
            self.steps.to_string(),
            self.expect_failure.clone().unwrap_or_default(),
        ]
    }
}

pub fn execute(args: ListArgs, config_path: &Path, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;

    let runner = TestRunner::from_config(config);
    let groups = select_tagged(runner.load_groups()?, &args.tag);

    let displays: Vec<ScenarioDisplay> = groups
        .iter()
        .flat_map(|g| g.scenarios.iter().map(|s| ScenarioDisplay::new(&g.name, s)))
        .collect();
    print_list(&displays, format);
    Ok(())
}
