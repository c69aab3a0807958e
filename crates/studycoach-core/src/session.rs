//! Timed quiz session state machine.
//!
//! A session owns the compiled questions and walks them one at a time.
//! It never runs on its own: the host polls [`QuizSession::remaining`] on
//! whatever cadence it likes and calls [`QuizSession::advance`] when the
//! budget runs out or the user moves on.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike, Utc};
use uuid::Uuid;

use crate::clock::{Clock, Mark};
use crate::error::QuizError;
use crate::model::{HistoryRecord, QuestionOutcome, QuizItem, QuizResult};

/// Recorded in place of an answer when a question is left unanswered.
pub const NO_ANSWER: &str = "";

/// Lifecycle of a quiz session. Nothing leaves `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// What a call to [`QuizSession::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Budget not spent and advancement not forced; nothing changed.
    Waiting,
    /// Moved on to the question at this index.
    Next(usize),
    /// The last question was left; the session is complete.
    Finished,
}

/// A single run through a quiz.
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    items: Vec<QuizItem>,
    budget: Duration,
    current_index: usize,
    answers: BTreeMap<usize, String>,
    state: SessionState,
    clock: Clock,
    session_started: Option<Mark>,
    question_started: Option<Mark>,
    /// Wall-clock completion time, stamped on the history record.
    completed_at: Option<DateTime<Utc>>,
    /// Monotonic time from `begin` to completion.
    duration: Option<Duration>,
}

impl QuizSession {
    /// Build a session in `NotStarted`; call [`QuizSession::begin`] to run it.
    ///
    /// Fails with `InvalidConfiguration` when `items` is empty or the
    /// per-question budget is not a positive number of seconds.
    pub fn new(
        items: Vec<QuizItem>,
        budget_secs: f64,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        if items.is_empty() {
            return Err(QuizError::InvalidConfiguration(
                "a quiz needs at least one question".into(),
            ));
        }
        if budget_secs <= 0.0 {
            return Err(QuizError::InvalidConfiguration(format!(
                "per-question time must be positive, got {budget_secs}"
            )));
        }
        let budget = Duration::try_from_secs_f64(budget_secs).map_err(|_| {
            QuizError::InvalidConfiguration(format!(
                "per-question time out of range: {budget_secs}"
            ))
        })?;

        Ok(Self {
            id: Uuid::new_v4(),
            items,
            budget,
            current_index: 0,
            answers: BTreeMap::new(),
            state: SessionState::NotStarted,
            clock,
            session_started: None,
            question_started: None,
            completed_at: None,
            duration: None,
        })
    }

    /// Build a session on the system clock and start it immediately.
    pub fn start(items: Vec<QuizItem>, budget_secs: f64) -> Result<Self, QuizError> {
        Self::start_with_clock(items, budget_secs, Clock::system())
    }

    pub fn start_with_clock(
        items: Vec<QuizItem>,
        budget_secs: f64,
        clock: Clock,
    ) -> Result<Self, QuizError> {
        let mut session = Self::new(items, budget_secs, clock)?;
        session.begin();
        Ok(session)
    }

    /// Start the clock on the first question. Only acts on `NotStarted`.
    pub fn begin(&mut self) {
        if self.state != SessionState::NotStarted {
            return;
        }
        let now = self.clock.mark();
        self.session_started = Some(now);
        self.question_started = Some(now);
        self.state = SessionState::InProgress;
        tracing::info!(
            session = %self.id,
            questions = self.items.len(),
            "quiz session started"
        );
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// `(index of the active question, total questions)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index, self.items.len())
    }

    /// The answer recorded for a question so far, if any.
    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    /// The question currently on screen.
    pub fn current_question(&self) -> Result<&QuizItem, QuizError> {
        if self.state != SessionState::InProgress {
            return Err(QuizError::NoActiveQuestion);
        }
        self.items
            .get(self.current_index)
            .ok_or(QuizError::NoActiveQuestion)
    }

    /// Time spent on the active question; zero when none is active.
    ///
    /// Measured on the clock's monotonic timeline, so wall-clock steps
    /// neither refill nor drain the budget.
    pub fn elapsed(&self) -> Duration {
        self.question_started
            .map_or(Duration::ZERO, |started| self.clock.since(started))
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.elapsed())
    }

    /// Whether the active question has used up its budget.
    pub fn is_expired(&self) -> bool {
        self.state == SessionState::InProgress && self.elapsed() >= self.budget
    }

    /// Record (or replace) the answer to the active question.
    ///
    /// Any text is accepted; it is only compared against the correct
    /// option when the session is graded.
    pub fn submit_answer(&mut self, option: impl Into<String>) -> Result<(), QuizError> {
        self.current_question()?;
        self.answers.insert(self.current_index, option.into());
        Ok(())
    }

    /// Move past the active question once its budget is spent, or
    /// unconditionally when `force` is set.
    pub fn advance(&mut self, force: bool) -> Result<Advance, QuizError> {
        self.current_question()?;
        if !force && !self.is_expired() {
            return Ok(Advance::Waiting);
        }

        self.answers
            .entry(self.current_index)
            .or_insert_with(|| NO_ANSWER.to_string());
        self.current_index += 1;

        if self.current_index == self.items.len() {
            self.state = SessionState::Completed;
            self.completed_at = Some(self.clock.now());
            self.duration = self.session_started.map(|started| self.clock.since(started));
            self.question_started = None;
            tracing::info!(session = %self.id, "quiz session completed");
            Ok(Advance::Finished)
        } else {
            self.question_started = Some(self.clock.mark());
            tracing::debug!(session = %self.id, index = self.current_index, "next question");
            Ok(Advance::Next(self.current_index))
        }
    }

    /// Grade a completed session.
    pub fn result(&self) -> Result<QuizResult, QuizError> {
        let Some(duration) = self.duration else {
            return Err(QuizError::SessionNotComplete);
        };
        if self.state != SessionState::Completed {
            return Err(QuizError::SessionNotComplete);
        }

        let outcomes: Vec<QuestionOutcome> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let submitted = self.answer(index).unwrap_or(NO_ANSWER).to_string();
                let is_correct = submitted == item.correct_option();
                QuestionOutcome {
                    question: item.question().to_string(),
                    submitted,
                    correct: item.correct_option().to_string(),
                    is_correct,
                }
            })
            .collect();

        let score = outcomes.iter().filter(|o| o.is_correct).count() as u32;
        let elapsed_seconds = duration.as_secs_f64();

        Ok(QuizResult {
            score,
            total: self.items.len() as u32,
            outcomes,
            elapsed_seconds,
        })
    }

    /// The progress-history entry for this completed session.
    pub fn history_record(&self, topic: &str) -> Result<HistoryRecord, QuizError> {
        let result = self.result()?;
        let completed = self.completed_at.ok_or(QuizError::SessionNotComplete)?;

        let local = completed.with_timezone(&Local).naive_local();
        let date = local
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(local);

        Ok(HistoryRecord {
            topic: topic.to_string(),
            score: result.score,
            total: result.total,
            date,
            duration: Duration::from_secs(result.elapsed_seconds as u64),
        })
    }
}
