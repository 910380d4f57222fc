//! Check Command

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use tokio::process::Command;

use tickmark_e2e::playwright::check_playwright_installed;

use super::load_config;
use crate::output::{print_error, print_success};

pub async fn execute(config_path: &Path) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let node = &config.playwright.node_binary;

    let mut ok = true;
    match Command::new(node).arg("--version").output().await {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout);
            print_success(&format!("Node.js {} ({})", version.trim(), node.display()));
        }
        _ => {
            print_error(&format!("Node.js not runnable at {}", node.display()));
            ok = false;
        }
    }

    match check_playwright_installed().await {
        Ok(()) => print_success("Playwright is installed"),
        Err(e) => {
            print_error(&e.to_string());
            ok = false;
        }
    }

    println!("Target: {} ({:?} driver)", config.base_url, config.driver);

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
