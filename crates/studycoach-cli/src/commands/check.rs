//! The `studycoach check` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use studycoach_core::compiler::compile_detailed;

pub fn execute(file: PathBuf, expected: Option<usize>) -> Result<()> {
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let compilation = compile_detailed(&raw, expected)
        .with_context(|| format!("failed to compile {}", file.display()))?;

    match expected {
        Some(n) => println!("Compiled {} of {n} question(s)", compilation.items.len()),
        None => println!("Compiled {} question(s)", compilation.items.len()),
    }

    for (i, item) in compilation.items.iter().enumerate() {
        println!("\n{}. {}", i + 1, item.question());
        for (j, option) in item.options().iter().enumerate() {
            let marker = if option == item.correct_option() {
                "*"
            } else {
                " "
            };
            println!("  {marker} {}) {option}", j + 1);
        }
    }

    if !compilation.repaired.is_empty() {
        println!();
        for r in &compilation.repaired {
            println!(
                "  [{}] REPAIRED: answer {:?} -> {:?}",
                r.index, r.original, r.repaired
            );
        }
    }

    if !compilation.dropped.is_empty() {
        println!();
        for d in &compilation.dropped {
            println!("  [{}] DROPPED: {}", d.index, d.reason);
        }
        println!("\n{} element(s) dropped.", compilation.dropped.len());
    } else {
        println!("\nNo elements dropped.");
    }

    Ok(())
}
