//! The `studycoach plan` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use studycoach_core::model::Difficulty;

use super::{build_coach, ensure_range};

pub async fn execute(
    topic: String,
    days: u32,
    hours: u32,
    difficulty: Difficulty,
    output: Option<PathBuf>,
    model: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(!topic.trim().is_empty(), "topic must not be empty");
    ensure_range("days", days, 1..=60)?;
    ensure_range("hours", hours, 1..=12)?;

    let (coach, _) = build_coach(config_path, model)?;
    eprintln!(
        "Planning {days} day(s) of {topic} ({difficulty}) with {} / {}",
        coach.provider_name(),
        coach.model()
    );

    let plan = coach
        .create_plan(topic.trim(), difficulty, days, hours)
        .await?;
    println!("{plan}");

    if let Some(path) = output {
        std::fs::write(&path, &plan)
            .with_context(|| format!("failed to write plan: {}", path.display()))?;
        eprintln!("Plan saved to: {}", path.display());
    }

    Ok(())
}
