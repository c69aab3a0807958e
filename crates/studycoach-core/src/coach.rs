//! Study coach: the plan, quiz, and advice requests sent to the model.
//!
//! Each call is a single request/response exchange. Nothing here retries;
//! the host decides whether a failed generation is worth another attempt.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::model::{accuracy_percent, Difficulty, SkillLevel};
use crate::traits::{GenerateRequest, LlmProvider};

/// Default model for the Groq-hosted chat API.
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
/// Default sampling temperature for plans and quizzes.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Plan text passed to the advice request is cut to this many characters.
pub const PLAN_SUMMARY_CHARS: usize = 400;

const PLAN_MAX_TOKENS: u32 = 1200;
const QUIZ_MAX_TOKENS: u32 = 2000;
const ADVICE_MAX_TOKENS: u32 = 1024;

const PLANNER_SYSTEM_PROMPT: &str =
    "You are an expert academic planner creating clear, actionable schedules.";
const QUIZ_SYSTEM_PROMPT: &str = "You are a quiz generator that returns only valid JSON arrays.";
const ADVICE_SYSTEM_PROMPT: &str =
    "You are an experienced academic coach giving actionable learning advice.";

/// Sends study-plan, quiz, and advice requests through one provider.
#[derive(Clone)]
pub struct StudyCoach {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f64,
}

impl StudyCoach {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generate a day-by-day study plan.
    pub async fn create_plan(
        &self,
        topic: &str,
        difficulty: Difficulty,
        days: u32,
        hours: u32,
    ) -> Result<String> {
        let prompt = plan_prompt(topic, difficulty, days, hours);
        let text = self
            .ask(PLANNER_SYSTEM_PROMPT, prompt, PLAN_MAX_TOKENS)
            .await
            .context("failed to generate study plan")?;
        Ok(text)
    }

    /// Ask for `count` multiple-choice questions and return the raw text.
    ///
    /// The response is not checked here; feed it to
    /// [`crate::compiler::compile`].
    pub async fn generate_quiz(&self, topic: &str, count: usize) -> Result<String> {
        let raw = self
            .ask(QUIZ_SYSTEM_PROMPT, quiz_prompt(topic, count), QUIZ_MAX_TOKENS)
            .await
            .context("failed to generate quiz")?;
        tracing::debug!(chars = raw.len(), "quiz response received");
        Ok(raw)
    }

    /// Personalized advice for a quiz score.
    pub async fn give_advice(
        &self,
        topic: &str,
        score: u32,
        total: u32,
        plan_summary: Option<&str>,
    ) -> Result<String> {
        let prompt = advice_prompt(topic, score, total, plan_summary);
        let text = self
            .ask(ADVICE_SYSTEM_PROMPT, prompt, ADVICE_MAX_TOKENS)
            .await
            .context("failed to generate advice")?;
        Ok(text)
    }

    async fn ask(&self, system: &str, prompt: String, max_tokens: u32) -> Result<String> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt,
            system_prompt: Some(system.to_string()),
            max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.generate(&request).await?;
        Ok(response.content.trim().to_string())
    }
}

fn plan_prompt(topic: &str, difficulty: Difficulty, days: u32, hours: u32) -> String {
    format!(
        "Create a detailed study plan for learning **{topic} (Difficulty: {difficulty})** \
in {days} days, with about {hours} hours of study per day.

Format the response as:
- Clear daily breakdown (Day 1, Day 2, etc.)
- Include key topics, tasks, and small review goals.
- Use short, action-focused sentences."
    )
}

fn quiz_prompt(topic: &str, count: usize) -> String {
    format!(
        r#"Generate exactly {count} multiple choice questions about {topic}.

Return ONLY a valid JSON array with this exact structure:
[
  {{
    "question": "What is the capital of France?",
    "options": ["London", "Paris", "Berlin", "Madrid"],
    "answer": "Paris"
  }}
]

Requirements:
- Return ONLY the JSON array, no other text
- Each question must have exactly 4 options
- The answer must be one of the options (exact match)
- No markdown, no explanations, just JSON"#
    )
}

fn advice_prompt(topic: &str, score: u32, total: u32, plan_summary: Option<&str>) -> String {
    let accuracy = accuracy_percent(score, total);
    let level = SkillLevel::from_accuracy(accuracy);

    let mut prompt = format!(
        "The user studied {topic} and scored {score}/{total} ({accuracy:.1}%).
The user's level is roughly {level}.
Give clear, practical, and motivational advice on:
1. What concepts to focus on next
2. Study methods or resources that match their level
3. How to improve retention and confidence.
Keep it concise, professional, and encouraging."
    );

    if let Some(plan) = plan_summary.map(str::trim).filter(|p| !p.is_empty()) {
        let summary: String = plan.chars().take(PLAN_SUMMARY_CHARS).collect();
        prompt.push_str(&format!("\nTheir plan summary: {summary}"));
    }
    prompt
}
