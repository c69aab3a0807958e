//! studycoach-core: quiz compiler, timed quiz sessions, and progress history.
//!
//! This crate holds the parts of studycoach that do not touch the network:
//! turning model output into gradable questions, running a timed quiz over
//! them, and aggregating results. The `coach` module builds the requests
//! sent through an [`traits::LlmProvider`].

pub mod clock;
pub mod coach;
pub mod compiler;
pub mod error;
pub mod history;
pub mod model;
pub mod session;
pub mod traits;

pub use clock::Clock;
pub use compiler::compile;
pub use error::{ProviderError, QuizError};
pub use history::HistoryAggregator;
pub use model::{HistoryRecord, QuizItem, QuizResult};
pub use session::{Advance, QuizSession, SessionState};
