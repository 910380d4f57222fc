//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use serde::Serialize;

use tickmark_e2e::{Outcome, ScenarioResult, SuiteResult};

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }

            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
    }
}

/// One pytest-style line per scenario
pub fn outcome_line(result: &ScenarioResult) -> String {
    let id = format!("{}::{}", result.group, result.name);
    let label = match result.outcome {
        Outcome::Passed => result.outcome.label().green(),
        Outcome::Failed => result.outcome.label().red().bold(),
        Outcome::Skipped => result.outcome.label().yellow(),
        Outcome::ExpectedFailure => result.outcome.label().yellow(),
        Outcome::UnexpectedPass => result.outcome.label().magenta().bold(),
    };

    let detail = match result.outcome {
        Outcome::Failed => result.error.clone(),
        Outcome::Skipped | Outcome::ExpectedFailure => result.reason.clone(),
        _ => None,
    };

    match detail {
        Some(detail) => format!("{} {} - {}", id, label, detail.dimmed()),
        None => format!("{} {} ({} ms)", id, label, result.duration_ms),
    }
}

fn summary_table(suite: &SuiteResult) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Total", "Passed", "Failed", "Skipped", "XFAIL", "XPASS", "Duration"]);
    table.add_row(vec![
        Cell::new(suite.total),
        Cell::new(suite.passed).fg(Color::Green),
        Cell::new(suite.failed).fg(if suite.failed > 0 { Color::Red } else { Color::Reset }),
        Cell::new(suite.skipped),
        Cell::new(suite.xfailed),
        Cell::new(suite.xpassed),
        Cell::new(format!("{} ms", suite.duration_ms)),
    ]);
    table
}

/// Print a finished suite
pub fn print_suite(suite: &SuiteResult, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!();
            for result in &suite.results {
                println!("{}", outcome_line(result));
                for soft in &result.soft_failures {
                    println!("    {} {}", "soft:".yellow(), soft);
                }
            }
            println!();
            println!("{}", summary_table(suite));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(suite).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(suite).unwrap_or_default());
        }
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}
