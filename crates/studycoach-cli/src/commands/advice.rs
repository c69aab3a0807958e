//! The `studycoach advice` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{build_coach, read_plan};

pub async fn execute(
    topic: String,
    score: u32,
    total: u32,
    plan_file: Option<PathBuf>,
    model: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(total >= 1, "total must be at least 1");
    anyhow::ensure!(
        score <= total,
        "score ({score}) cannot exceed total ({total})"
    );

    let plan = read_plan(plan_file.as_deref())?;
    let (coach, _) = build_coach(config_path, model)?;

    let advice = coach
        .give_advice(topic.trim(), score, total, plan.as_deref())
        .await?;
    println!("{advice}");

    Ok(())
}
