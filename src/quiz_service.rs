use anyhow::Result;
use std::time::Instant;

use crate::analytics::{AttemptAnalytics, top_performers};
use crate::database::Database;
use crate::errors::QuizError;
use crate::models::*;
use crate::quiz_scorer;

// Import logging macros
use crate::{log_service_start, log_service_success, log_service_warn};

pub const ANONYMOUS_STUDENT: &str = "Anonymous";

#[derive(Clone)]
pub struct QuizService {
    db: Database,
}

impl QuizService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Scores a submission against the stored questions and records the attempt.
    pub async fn submit(&self, submission: QuizSubmission) -> Result<SubmissionOutcome> {
        let started = Instant::now();
        log_service_start!("quiz_service", "submit", quiz_id = submission.quiz_id);

        if self.db.get_quiz(submission.quiz_id).await?.is_none() {
            return Err(QuizError::QuizNotFound(submission.quiz_id).into());
        }

        let questions = self.db.get_questions_for_quiz(submission.quiz_id).await?;
        if questions.is_empty() {
            log_service_warn!("quiz_service", "submit", "quiz has no questions, scoring as zero");
        }

        let result = quiz_scorer::score(&questions, &submission.answers);

        let student_name = submission
            .student_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(ANONYMOUS_STUDENT);

        self.db
            .record_attempt(
                student_name,
                submission.quiz_id,
                result.score_percent,
                result.detail_json(),
            )
            .await?;

        log_service_success!(
            "quiz_service",
            "submit",
            quiz_id = submission.quiz_id,
            duration_ms = started.elapsed().as_millis() as u64
        );

        Ok(SubmissionOutcome {
            score: result.score_percent,
            recommendations: result.recommendations,
        })
    }

    /// All attempts, newest first, with summary analytics.
    pub async fn attempt_report(&self) -> Result<AttemptReport> {
        log_service_start!("quiz_service", "attempt_report");

        let attempts = self.db.get_attempts().await?;
        let analytics = AttemptAnalytics::from_attempts(&attempts);
        let top_performers = top_performers(&attempts);

        log_service_success!("quiz_service", "attempt_report", "report built");
        Ok(AttemptReport {
            attempts,
            top_performers,
            analytics,
        })
    }
}
