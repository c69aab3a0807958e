//! Subcommand implementations and the helpers they share.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use studycoach_core::coach::StudyCoach;
use studycoach_providers::config::load_config_from;
use studycoach_providers::StudycoachConfig;

pub mod advice;
pub mod check;
pub mod init;
pub mod list_models;
pub mod plan;
pub mod quiz;
pub mod stats;

/// Load the config and bind a coach to its default provider.
pub(crate) fn build_coach(
    config_path: Option<PathBuf>,
    model: Option<String>,
) -> Result<(StudyCoach, StudycoachConfig)> {
    let config = load_config_from(config_path.as_deref())?;
    let provider = config.default_provider_instance()?;
    let model = model.unwrap_or_else(|| config.default_model.clone());

    tracing::debug!(provider = provider.name(), %model, "using provider");

    let coach = StudyCoach::new(Arc::from(provider), model)
        .with_temperature(config.default_temperature);
    Ok((coach, config))
}

/// Read a saved study plan to pass along as advice context.
pub(crate) fn read_plan(path: Option<&Path>) -> Result<Option<String>> {
    path.map(|p| {
        std::fs::read_to_string(p)
            .with_context(|| format!("failed to read plan file: {}", p.display()))
    })
    .transpose()
}

/// Fail unless `value` lies in `range`, naming the offending flag.
pub(crate) fn ensure_range<T>(name: &str, value: T, range: std::ops::RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    anyhow::ensure!(
        range.contains(&value),
        "{name} must be between {} and {}, got {value}",
        range.start(),
        range.end()
    );
    Ok(())
}
