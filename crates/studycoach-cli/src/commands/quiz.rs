//! The `studycoach quiz` command.
//!
//! Generates a quiz (regenerating on unusable output), then drives a
//! [`QuizSession`] by polling its clock every 500 ms while answers arrive
//! from stdin.

use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use studycoach_core::coach::StudyCoach;
use studycoach_core::compiler::compile;
use studycoach_core::model::{QuizItem, QuizResult};
use studycoach_core::{Advance, HistoryAggregator, ProviderError, QuizSession};
use studycoach_report::write_html_report;

use super::{build_coach, ensure_range, read_plan};

const POLL_INTERVAL: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

pub struct QuizArgs {
    pub topic: String,
    pub questions: usize,
    pub time_per_question: u32,
    pub plan_file: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub html: Option<PathBuf>,
    pub rounds: u32,
    pub model: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn execute(args: QuizArgs) -> Result<()> {
    let topic = args.topic.trim().to_string();
    anyhow::ensure!(!topic.is_empty(), "topic must not be empty");
    ensure_range("questions", args.questions, 3..=10)?;
    ensure_range("time-per-question", args.time_per_question, 10..=30)?;
    anyhow::ensure!(args.rounds >= 1, "rounds must be at least 1");

    let plan = read_plan(args.plan_file.as_deref())?;
    let (coach, config) = build_coach(args.config, args.model)?;

    let mut history = match &args.export {
        Some(path) if path.exists() => HistoryAggregator::load_json(path)?,
        _ => HistoryAggregator::new(),
    };

    let mut answers = spawn_stdin_reader();
    let mut input_open = true;
    let retry_delay = Duration::from_millis(config.retry_delay_ms);

    for round in 1..=args.rounds {
        if args.rounds > 1 {
            println!("\n=== Round {round} of {} ===", args.rounds);
        }
        eprintln!(
            "Generating {} question(s) about {topic} with {} / {}...",
            args.questions,
            coach.provider_name(),
            coach.model()
        );

        let items = generate_items(
            &coach,
            &topic,
            args.questions,
            config.max_retries,
            retry_delay,
        )
        .await?;

        // Drop anything typed while the quiz was being generated.
        while answers.try_recv().is_ok() {}

        let mut session = QuizSession::start(items, f64::from(args.time_per_question))?;
        run_session(&mut session, &mut answers, &mut input_open).await?;

        let result = session.result()?;
        print_result(&result);

        match coach
            .give_advice(&topic, result.score, result.total, plan.as_deref())
            .await
        {
            Ok(advice) => println!("\nCoach says:\n{advice}"),
            Err(e) => eprintln!("Warning: {e:#}"),
        }

        history.append(session.history_record(&topic)?);

        if let Some(path) = &args.export {
            history.save_json(path)?;
            eprintln!("History saved to: {}", path.display());
        }
    }

    if let Some(path) = &args.html {
        write_html_report(&history, path)?;
        eprintln!("HTML report: {}", path.display());
    }

    println!(
        "\nQuizzes taken: {} | average accuracy {:.1}%",
        history.total_quizzes(),
        history.average_accuracy() * 100.0
    );

    Ok(())
}

/// Ask the coach for a quiz and compile it, regenerating with exponential
/// backoff when the output is unusable or the provider fails transiently.
pub(crate) async fn generate_items(
    coach: &StudyCoach,
    topic: &str,
    count: usize,
    max_retries: u32,
    retry_delay: Duration,
) -> Result<Vec<QuizItem>> {
    let mut last_error = None;
    let mut delay = retry_delay;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                "retrying quiz generation"
            );
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(MAX_RETRY_DELAY);
        }

        let raw = match coach.generate_quiz(topic, count).await {
            Ok(raw) => raw,
            Err(e) => {
                if let Some(provider_err) = e.downcast_ref::<ProviderError>() {
                    if provider_err.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_err.retry_after_ms() {
                        delay = Duration::from_millis(ms);
                    }
                }
                last_error = Some(e);
                continue;
            }
        };

        match compile(&raw, Some(count)) {
            Ok(items) => return Ok(items),
            Err(e) if e.is_generation_failure() => {
                tracing::warn!("quiz output unusable: {e}");
                last_error = Some(e.into());
            }
            Err(e) => return Err(e.into()),
        }
    }

    let err = last_error.unwrap_or_else(|| anyhow::anyhow!("no quiz generated"));
    Err(err.context(format!(
        "could not build a quiz after {} attempt(s)",
        max_retries + 1
    )))
}

/// Forward stdin lines to the quiz loop.
///
/// Runs on a plain thread since stdin reads cannot be cancelled; the
/// channel closes at end of input.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn run_session(
    session: &mut QuizSession,
    answers: &mut mpsc::Receiver<String>,
    input_open: &mut bool,
) -> Result<()> {
    print_question(session)?;

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let step = tokio::select! {
            line = answers.recv(), if *input_open => {
                let Some(line) = line else {
                    *input_open = false;
                    eprintln!("Input closed; remaining questions will time out.");
                    continue;
                };
                let options = session.current_question()?.options();
                match parse_choice(&line, options) {
                    Some(choice) => {
                        let choice = choice.to_string();
                        session.submit_answer(choice)?;
                        session.advance(true)?
                    }
                    None => {
                        println!("Enter a number from 1 to {}.", options.len());
                        continue;
                    }
                }
            }
            _ = ticker.tick() => {
                let step = session.advance(false)?;
                if step != Advance::Waiting {
                    println!("Time's up!");
                }
                step
            }
        };

        match step {
            Advance::Waiting => {}
            Advance::Next(_) => print_question(session)?,
            Advance::Finished => return Ok(()),
        }
    }
}

fn print_question(session: &QuizSession) -> Result<()> {
    let (index, total) = session.progress();
    let item = session.current_question()?;
    println!(
        "\nQuestion {} of {total} ({}s):",
        index + 1,
        session.remaining().as_secs()
    );
    println!("{}", item.question());
    for (i, option) in item.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
    Ok(())
}

/// Map a typed answer to an option: its number (`1`-`4`) or letter (`a`-`d`).
fn parse_choice<'a>(input: &str, options: &'a [String]) -> Option<&'a str> {
    let input = input.trim();
    let index = match input.parse::<usize>() {
        Ok(n) => n.checked_sub(1)?,
        Err(_) => {
            let mut chars = input.chars();
            let c = chars.next()?.to_ascii_lowercase();
            if chars.next().is_some() || !c.is_ascii_lowercase() {
                return None;
            }
            (c as u8 - b'a') as usize
        }
    };
    options.get(index).map(String::as_str)
}

fn print_result(result: &QuizResult) {
    println!("\nResults:");
    for (i, outcome) in result.outcomes.iter().enumerate() {
        let mark = if outcome.is_correct { "OK" } else { "WRONG" };
        let submitted = if outcome.submitted.is_empty() {
            "(no answer)"
        } else {
            outcome.submitted.as_str()
        };
        println!("  {}. [{mark}] {}", i + 1, outcome.question);
        if !outcome.is_correct {
            println!("       you: {submitted} | correct: {}", outcome.correct);
        }
    }
    println!(
        "\nScore: {}/{} ({:.1}%, {}) in {:.0}s",
        result.score,
        result.total,
        result.accuracy(),
        result.level(),
        result.elapsed_seconds
    );
}
