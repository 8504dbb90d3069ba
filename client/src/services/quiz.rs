//! Quiz taking and editing
//!
//! A student answers a quiz once. Answers live only in this session;
//! after submitting (or when an attempt already exists) they are used to
//! show which selections were wrong.

use crate::config::MAX_QUIZ_OPTIONS;
use crate::error::{AppError, Result};
use crate::models::*;
use crate::remote::{QuestionDraft, RemoteGateway, Removable};
use num_format::{Locale, ToFormattedString};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

/// Percentage of questions answered correctly, rounded to two decimals.
///
/// An answer is correct when it equals the stored answer after trimming,
/// ignoring case. No questions scores zero.
pub fn score(questions: &[Question], answers: &HashMap<String, String>) -> f64 {
    if questions.is_empty() {
        return 0.0;
    }

    let correct = questions
        .iter()
        .filter(|q| is_correct(q, answers.get(&q.id).map(String::as_str)))
        .count();

    let percentage = correct as f64 / questions.len() as f64 * 100.0;
    (percentage * 100.0).round_ties_even() / 100.0
}

fn is_correct(question: &Question, selected: Option<&str>) -> bool {
    let selected = selected.unwrap_or("").trim();
    selected.to_lowercase() == question.answer.trim().to_lowercase()
}

/// Two decimals with a thousands separator, e.g. "66.67" or "1,250.00"
pub fn format_score(value: f64) -> String {
    let cents = (value * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!(
        "{}{}.{:02}",
        sign,
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

/// Why a submit did nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// Teachers review quizzes but never take them
    Teacher,
    AlreadyAnswered,
    NoSession,
    NoQuestions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    Recorded { score: String },
    Skipped(SkipReason),
}

/// One question as shown after answering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    pub question_id: String,
    pub prompt: String,
    pub selected: Option<String>,
    pub answer: String,
    pub correct: bool,
}

pub struct QuizSession {
    gateway: RemoteGateway,
    viewer_id: String,
    quiz_id: String,
    role: ClassRole,
    questions: Mutex<Vec<Question>>,
    answers: Mutex<HashMap<String, String>>,
    attempt: Mutex<Option<QuizAttempt>>,
}

impl QuizSession {
    pub fn new(gateway: RemoteGateway, session: &Session, quiz_id: &str, role: ClassRole) -> Self {
        Self {
            gateway,
            viewer_id: session.user_id.clone(),
            quiz_id: quiz_id.to_string(),
            role,
            questions: Mutex::new(Vec::new()),
            answers: Mutex::new(HashMap::new()),
            attempt: Mutex::new(None),
        }
    }

    /// Load the questions and the viewer's existing attempt
    pub async fn load(&self) -> Result<()> {
        let (questions, attempts) = tokio::join!(
            self.gateway.list_questions(&self.quiz_id),
            self.gateway.list_quiz_attempts(&self.quiz_id)
        );

        let questions = questions?;
        tracing::debug!("Quiz {} has {} questions", self.quiz_id, questions.len());
        *self.questions.lock() = questions;

        let mine = attempts?
            .into_iter()
            .find(|a| a.user_id == self.viewer_id);
        *self.attempt.lock() = mine;
        Ok(())
    }

    pub fn questions(&self) -> Vec<Question> {
        self.questions.lock().clone()
    }

    pub fn attempt(&self) -> Option<QuizAttempt> {
        self.attempt.lock().clone()
    }

    pub fn has_answered(&self) -> bool {
        self.attempt.lock().is_some()
    }

    /// Record a selection; ignored once the quiz is answered
    pub fn select(&self, question_id: &str, option: &str) {
        if self.has_answered() {
            return;
        }
        self.answers
            .lock()
            .insert(question_id.to_string(), option.to_string());
    }

    pub fn selected(&self, question_id: &str) -> Option<String> {
        self.answers.lock().get(question_id).cloned()
    }

    fn skip_reason(&self) -> Option<SkipReason> {
        if self.role.is_teacher() {
            Some(SkipReason::Teacher)
        } else if self.has_answered() {
            Some(SkipReason::AlreadyAnswered)
        } else if !is_known_user(&self.viewer_id) {
            Some(SkipReason::NoSession)
        } else if self.questions.lock().is_empty() {
            Some(SkipReason::NoQuestions)
        } else {
            None
        }
    }

    pub fn can_submit(&self) -> bool {
        self.skip_reason().is_none()
    }

    /// Score the current answers and record the attempt.
    ///
    /// Does nothing (and calls nothing) for a teacher, when an attempt
    /// already exists, when there is no valid user or when the quiz has
    /// no questions.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        if let Some(reason) = self.skip_reason() {
            tracing::debug!("Quiz {} submit skipped: {:?}", self.quiz_id, reason);
            return Ok(SubmitOutcome::Skipped(reason));
        }

        let score = {
            let questions = self.questions.lock();
            let answers = self.answers.lock();
            format_score(score(&questions, &answers))
        };

        tracing::info!("Recording quiz {} attempt: {}", self.quiz_id, score);
        self.gateway
            .record_quiz_attempt(&self.quiz_id, &self.viewer_id, &score)
            .await?;

        *self.attempt.lock() = Some(QuizAttempt {
            id: String::new(),
            quiz_id: self.quiz_id.clone(),
            user_id: self.viewer_id.clone(),
            score: score.clone(),
            taken_at: None,
        });

        Ok(SubmitOutcome::Recorded { score })
    }

    /// Each question with this session's selection; empty until answered
    pub fn review(&self) -> Vec<ReviewItem> {
        if !self.has_answered() {
            return Vec::new();
        }
        let answers = self.answers.lock();
        self.questions
            .lock()
            .iter()
            .map(|q| {
                let selected = answers.get(&q.id).cloned();
                ReviewItem {
                    question_id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    correct: is_correct(q, selected.as_deref()),
                    selected,
                    answer: q.answer.clone(),
                }
            })
            .collect()
    }

    // ===== Editing =====

    fn require_teacher(&self, action: &str) -> Result<()> {
        if self.role.is_teacher() {
            Ok(())
        } else {
            Err(AppError::NotAuthorized(action.to_string()))
        }
    }

    async fn reload_questions(&self) -> Result<()> {
        let questions = self.gateway.list_questions(&self.quiz_id).await?;
        *self.questions.lock() = questions;
        Ok(())
    }

    pub async fn add_question(&self, draft: &QuestionDraft) -> Result<()> {
        self.require_teacher("edit questions")?;
        let draft = validate_question(draft)?;
        tracing::info!("Adding question to quiz {}", self.quiz_id);
        self.gateway.create_question(&self.quiz_id, &draft).await?;
        self.reload_questions().await
    }

    pub async fn update_question(&self, question_id: &str, draft: &QuestionDraft) -> Result<()> {
        self.require_teacher("edit questions")?;
        let draft = validate_question(draft)?;
        tracing::info!("Updating question {}", question_id);
        self.gateway.update_question(question_id, &draft).await?;
        self.reload_questions().await
    }

    pub async fn delete_question(&self, question_id: &str) -> Result<()> {
        self.require_teacher("delete questions")?;
        tracing::info!("Deleting question {}", question_id);
        self.gateway.delete(Removable::Question, question_id).await?;
        self.answers.lock().remove(question_id);
        self.reload_questions().await
    }
}

/// Prompt and answer required; blank options dropped; at most four kept
fn validate_question(draft: &QuestionDraft) -> Result<QuestionDraft> {
    let prompt = draft.prompt.trim();
    let answer = draft.answer.trim();
    if prompt.is_empty() || answer.is_empty() {
        return Err(AppError::Validation("Completa todos los campos".to_string()));
    }

    let options: Vec<String> = draft
        .options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();
    if options.len() > MAX_QUIZ_OPTIONS {
        return Err(AppError::Validation(format!(
            "Máximo {} opciones",
            MAX_QUIZ_OPTIONS
        )));
    }

    Ok(QuestionDraft {
        prompt: prompt.to_string(),
        options,
        answer: answer.to_string(),
    })
}
