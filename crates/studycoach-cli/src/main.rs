//! studycoach CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use studycoach_core::model::Difficulty;

mod commands;

#[derive(Parser)]
#[command(
    name = "studycoach",
    version,
    about = "LLM study planner and timed quiz coach"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a day-by-day study plan
    Plan {
        /// What to study
        #[arg(long)]
        topic: String,

        /// Number of study days (1-60)
        #[arg(long, default_value = "7")]
        days: u32,

        /// Study hours per day (1-12)
        #[arg(long, default_value = "2")]
        hours: u32,

        /// beginner, intermediate or advanced
        #[arg(long, default_value = "beginner")]
        difficulty: Difficulty,

        /// Save the plan to this file as well as printing it
        #[arg(long)]
        output: Option<PathBuf>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Take a timed multiple-choice quiz
    Quiz {
        /// Quiz topic
        #[arg(long)]
        topic: String,

        /// Number of questions (3-10)
        #[arg(long, default_value = "5")]
        questions: usize,

        /// Seconds allowed per question (10-30)
        #[arg(long, default_value = "15")]
        time_per_question: u32,

        /// Study plan to reference in the advice
        #[arg(long)]
        plan_file: Option<PathBuf>,

        /// History JSON to extend and write back after each quiz
        #[arg(long)]
        export: Option<PathBuf>,

        /// Also write an HTML progress report
        #[arg(long)]
        html: Option<PathBuf>,

        /// Number of quizzes to run back to back
        #[arg(long, default_value = "1")]
        rounds: u32,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Get coaching advice for a quiz score
    Advice {
        /// Quiz topic
        #[arg(long)]
        topic: String,

        /// Correct answers
        #[arg(long)]
        score: u32,

        /// Questions asked
        #[arg(long)]
        total: u32,

        /// Study plan to reference in the advice
        #[arg(long)]
        plan_file: Option<PathBuf>,

        /// Model override
        #[arg(long)]
        model: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compile a saved model response into quiz questions (offline)
    Check {
        /// File holding the raw model response
        #[arg(long)]
        file: PathBuf,

        /// Number of questions that were requested
        #[arg(long)]
        expected: Option<usize>,
    },

    /// Show analytics for an exported quiz history
    Stats {
        /// History JSON written by `quiz --export`
        #[arg(long)]
        history: PathBuf,

        /// Also write an HTML progress report
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// List available models
    ListModels {
        /// Filter to specific provider
        #[arg(long)]
        provider: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studycoach=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Plan {
            topic,
            days,
            hours,
            difficulty,
            output,
            model,
            config,
        } => {
            commands::plan::execute(topic, days, hours, difficulty, output, model, config).await
        }
        Commands::Quiz {
            topic,
            questions,
            time_per_question,
            plan_file,
            export,
            html,
            rounds,
            model,
            config,
        } => {
            commands::quiz::execute(commands::quiz::QuizArgs {
                topic,
                questions,
                time_per_question,
                plan_file,
                export,
                html,
                rounds,
                model,
                config,
            })
            .await
        }
        Commands::Advice {
            topic,
            score,
            total,
            plan_file,
            model,
            config,
        } => commands::advice::execute(topic, score, total, plan_file, model, config).await,
        Commands::Check { file, expected } => commands::check::execute(file, expected),
        Commands::Stats { history, html } => commands::stats::execute(history, html),
        Commands::ListModels { provider, config } => {
            commands::list_models::execute(provider, config)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
