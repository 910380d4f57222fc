//! CLI Commands

use std::path::Path;

use anyhow::{Context, Result};
use tickmark_e2e::{HarnessConfig, ScenarioGroup};

pub mod check;
pub mod init;
pub mod list;
pub mod run;

/// Load the configuration file (defaults when absent) with env overrides
pub fn load_config(path: &Path) -> Result<HarnessConfig> {
    let mut config = HarnessConfig::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    config.apply_env()?;
    Ok(config)
}

/// Keep scenarios carrying any of `tags`; groups left empty are dropped
pub fn select_tagged(groups: Vec<ScenarioGroup>, tags: &[String]) -> Vec<ScenarioGroup> {
    if tags.is_empty() {
        return groups;
    }
    groups
        .into_iter()
        .filter_map(|mut group| {
            group
                .scenarios
                .retain(|s| s.tags.iter().any(|t| tags.contains(t)));
            (!group.scenarios.is_empty()).then_some(group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_tagged() {
        let groups = vec![ScenarioGroup::builtin().unwrap()];

        let edits = select_tagged(groups.clone(), &["edit".to_string()]);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].scenarios.len(), 4);

        let none = select_tagged(groups.clone(), &["nonexistent".to_string()]);
        assert!(none.is_empty());

        let all = select_tagged(groups, &[]);
        assert_eq!(all[0].scenarios.len(), 14);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert!(config.include_builtin);
    }
}
