//! The `studycoach init` command.

use std::path::Path;

use anyhow::Result;

pub fn execute() -> Result<()> {
    let config_path = Path::new("studycoach.toml");
    if config_path.exists() {
        println!("studycoach.toml already exists, skipping.");
    } else {
        std::fs::write(config_path, SAMPLE_CONFIG)?;
        println!("Created studycoach.toml");
    }

    let env_path = Path::new(".env.example");
    if env_path.exists() {
        println!(".env.example already exists, skipping.");
    } else {
        std::fs::write(env_path, SAMPLE_ENV)?;
        println!("Created .env.example");
    }

    println!("\nNext steps:");
    println!("  1. Put your GROQ_API_KEY in .env (see .env.example)");
    println!("  2. Run: studycoach plan --topic \"Rust ownership\" --days 5 --output plan.txt");
    println!("  3. Run: studycoach quiz --topic \"Rust ownership\" --plan-file plan.txt --export history.json");
    println!("  4. Run: studycoach stats --history history.json");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# studycoach configuration

default_provider = "groq"
default_model = "llama-3.1-8b-instant"
default_temperature = 0.7
# Regenerate a quiz this many times when the model output is unusable.
max_retries = 3
retry_delay_ms = 1000

[providers.groq]
type = "groq"
api_key = "${GROQ_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"
"#;

const SAMPLE_ENV: &str = "GROQ_API_KEY=\n";
