//! Init Command

use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;

use tickmark_e2e::HarnessConfig;

use crate::output::print_success;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    force: bool,

    /// Page driver (playwright or simulated)
    #[arg(long)]
    driver: Option<String>,

    /// Entry URL of the application under test
    #[arg(long)]
    base_url: Option<String>,
}

pub fn execute(args: InitArgs, config_path: &Path) -> Result<()> {
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let mut config = HarnessConfig::default();
    if let Some(driver) = &args.driver {
        config.driver = driver.parse()?;
    }
    if let Some(url) = args.base_url {
        config.base_url = url;
    }
    config.validate()?;
    config.save(config_path)?;

    print_success(&format!("Wrote {}", config_path.display()));
    Ok(())
}
