use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::{
    errors::{ApiError, ErrorContext, classify_service_error},
    intent_matcher::IntentMatcher,
    models::*,
    quiz_service::QuizService,
};

// Import logging macros
use crate::{log_api_error, log_api_start, log_api_success, log_api_warn};

const MAX_STUDENT_NAME_CHARS: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub quiz_service: QuizService,
    pub tutor: Arc<IntentMatcher>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// Tutor endpoint
pub async fn chatbot(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    log_api_start!("chatbot");

    let question = request.q.unwrap_or_default();
    let reply = state.tutor.classify(&question);
    debug!(intent = %reply.intent, "Tutor answered");

    Json(ChatResponse { answer: reply.text })
}

// Quiz endpoints
pub async fn submit_quiz(
    State(state): State<AppState>,
    Json(submission): Json<QuizSubmission>,
) -> Result<Json<SubmissionOutcome>, (StatusCode, Json<ApiResponse<()>>)> {
    let quiz_id = submission.quiz_id;
    log_api_start!("submit_quiz", quiz_id = quiz_id);

    if let Some(name) = &submission.student_name {
        if name.chars().count() > MAX_STUDENT_NAME_CHARS {
            let error = ApiError::ValidationError(format!(
                "student_name must be at most {} characters",
                MAX_STUDENT_NAME_CHARS
            ));
            let context = ErrorContext::new("submit_quiz", "quiz").with_id(&quiz_id.to_string());
            return Err(error.to_response_with_context(context));
        }
    }

    match state.quiz_service.submit(submission).await {
        Ok(outcome) => {
            log_api_success!("submit_quiz", quiz_id = quiz_id, "attempt scored");
            Ok(Json(outcome))
        }
        Err(e) => {
            let classified_error = classify_service_error(e);
            let mut context = ErrorContext::new("submit_quiz", "quiz").with_id(&quiz_id.to_string());
            if matches!(classified_error, ApiError::NotFound(_)) {
                log_api_warn!("submit_quiz", quiz_id = quiz_id, "quiz not found");
                context = context.with_user_message(&format!("Quiz with id '{}' not found", quiz_id));
            } else {
                log_api_error!("submit_quiz", quiz_id = quiz_id, error = classified_error, "scoring failed");
            }
            Err(classified_error.to_response_with_context(context))
        }
    }
}

pub async fn get_attempts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AttemptReport>>, (StatusCode, Json<ApiResponse<()>>)> {
    log_api_start!("get_attempts");

    match state.quiz_service.attempt_report().await {
        Ok(report) => {
            log_api_success!("get_attempts", count = report.attempts.len(), "attempts listed");
            Ok(Json(ApiResponse::success(report)))
        }
        Err(e) => {
            log_api_error!("get_attempts", error = e, "failed to load attempts");
            let error = classify_service_error(e);
            let context = ErrorContext::new("get_attempts", "attempt");
            Err(error.to_response_with_context(context))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Tutor routes
        .route("/api/chatbot", post(chatbot))

        // Quiz routes
        .route("/api/submit_quiz", post(submit_quiz))
        .route("/api/attempts", get(get_attempts))

        .with_state(state)
}
