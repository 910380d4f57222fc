//! Run Command

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use tracing::info;

use tickmark_e2e::playwright::check_playwright_installed;
use tickmark_e2e::{Driver, HarnessConfig, TestRunner};

use super::{load_config, select_tagged};
use crate::output::{print_suite, print_warning, OutputFormat};

#[derive(Args)]
pub struct RunArgs {
    /// Only run scenarios with one of these tags
    #[arg(short, long)]
    tag: Vec<String>,

    /// Page driver (playwright or simulated)
    #[arg(long)]
    driver: Option<String>,

    /// Entry URL of the application under test
    #[arg(long)]
    base_url: Option<String>,

    /// Directory of extra scenario groups
    #[arg(long)]
    scenarios_dir: Option<PathBuf>,

    /// Skip the built-in TodoMVC suite
    #[arg(long)]
    no_builtin: bool,

    /// Directory for test-results.json
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Do not write test-results.json
    #[arg(long)]
    no_write: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut HarnessConfig) -> Result<()> {
        if let Some(driver) = &self.driver {
            config.driver = driver.parse()?;
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(dir) = &self.scenarios_dir {
            config.scenarios_dir = Some(dir.clone());
        }
        if self.no_builtin {
            config.include_builtin = false;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        Ok(())
    }
}

pub async fn execute(args: RunArgs, config_path: &Path, format: OutputFormat) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config)?;
    config.validate()?;

    if config.driver == Driver::Playwright {
        check_playwright_installed().await?;
    }

    let runner = TestRunner::from_config(config);
    let groups = select_tagged(runner.load_groups()?, &args.tag);
    if groups.is_empty() {
        bail!("no scenarios match tags {:?}", args.tag);
    }
    if !args.tag.is_empty() {
        print_warning("tag selection skips earlier scenarios; later ones may depend on their state");
    }

    let suite = runner.run_groups(&groups).await;

    if !args.no_write {
        runner.write_results(&suite)?;
    }
    print_suite(&suite, format);

    if suite.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        info!("{} scenario(s) failed or were skipped", suite.failed + suite.skipped);
        Ok(ExitCode::FAILURE)
    }
}
