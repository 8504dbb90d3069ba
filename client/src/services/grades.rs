//! Grade report for one student in one class
//!
//! Task grades come from each task's submission history, quiz grades
//! from each quiz's attempt history. A task or quiz the student never
//! handed in contributes no row.

use crate::config::{BLANK_GRADE, SERVER_DATETIME_FORMAT};
use crate::error::Result;
use crate::models::*;
use crate::remote::RemoteGateway;
use chrono::NaiveDateTime;
use serde::Serialize;

/// Both sections of the report; a failed section is empty and noted in `errors`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeReport {
    pub tasks: Vec<GradeRow>,
    pub quizzes: Vec<GradeRow>,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct GradeAggregator {
    gateway: RemoteGateway,
}

impl GradeAggregator {
    pub fn new(gateway: RemoteGateway) -> Self {
        Self { gateway }
    }

    pub async fn report(&self, class_id: &str, user_id: &str) -> GradeReport {
        tracing::debug!("Building grade report for user {} in class {}", user_id, class_id);

        let (tasks, quizzes) = tokio::join!(
            self.task_grades(class_id, user_id),
            self.quiz_grades(class_id, user_id)
        );

        let mut report = GradeReport::default();
        match tasks {
            Ok(rows) => report.tasks = rows,
            Err(e) => {
                tracing::warn!("Task grades for class {} failed: {}", class_id, e);
                report.errors.push(e.to_string());
            }
        }
        match quizzes {
            Ok(rows) => report.quizzes = rows,
            Err(e) => {
                tracing::warn!("Quiz grades for class {} failed: {}", class_id, e);
                report.errors.push(e.to_string());
            }
        }
        report
    }

    /// Latest submission per task, sorted by title
    pub async fn task_grades(&self, class_id: &str, user_id: &str) -> Result<Vec<GradeRow>> {
        let tasks = self.gateway.list_tasks(class_id).await?;

        let mut rows = Vec::new();
        for task in &tasks {
            let history = self.gateway.list_submissions(&task.id).await?;
            let mine: Vec<Submission> = history
                .into_iter()
                .filter(|s| s.user_id == user_id)
                .collect();

            if let Some(latest) = latest_submission(&mine) {
                rows.push(GradeRow {
                    title: task.title.clone(),
                    date: latest.submitted_at.clone().unwrap_or_default(),
                    grade: display_grade(latest.grade.as_deref()),
                });
            }
        }

        sort_by_title(&mut rows);
        Ok(rows)
    }

    /// The student's attempt per quiz across every topic, sorted by title
    pub async fn quiz_grades(&self, class_id: &str, user_id: &str) -> Result<Vec<GradeRow>> {
        let topics = self.gateway.list_topics(class_id).await?;

        let mut rows = Vec::new();
        for topic in &topics {
            for quiz in self.gateway.list_quizzes(&topic.id).await? {
                let attempt = self
                    .gateway
                    .list_quiz_attempts(&quiz.id)
                    .await?
                    .into_iter()
                    .find(|a| a.user_id == user_id);

                if let Some(attempt) = attempt {
                    rows.push(GradeRow {
                        title: quiz.title,
                        date: attempt.taken_at.unwrap_or_default(),
                        grade: display_grade(Some(&attempt.score)),
                    });
                }
            }
        }

        sort_by_title(&mut rows);
        Ok(rows)
    }
}

/// Most recent by date; on equal or missing dates the later entry wins
fn latest_submission(history: &[Submission]) -> Option<&Submission> {
    let mut best: Option<&Submission> = None;
    for entry in history {
        best = match best {
            Some(current) if date_key(entry) < date_key(current) => Some(current),
            _ => Some(entry),
        };
    }
    best
}

/// Parsed timestamps order chronologically; anything else by its text
fn date_key(submission: &Submission) -> (Option<NaiveDateTime>, String) {
    let raw = submission.submitted_at.as_deref().unwrap_or("").trim();
    let parsed = NaiveDateTime::parse_from_str(raw, SERVER_DATETIME_FORMAT).ok();
    (parsed, raw.to_string())
}

fn display_grade(grade: Option<&str>) -> String {
    match grade.map(str::trim) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => BLANK_GRADE.to_string(),
    }
}

fn sort_by_title(rows: &mut [GradeRow]) {
    rows.sort_by_cached_key(|row| row.title.to_lowercase());
}
