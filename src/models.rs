use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;

use crate::analytics::AttemptAnalytics;
use crate::quiz_scorer::{AnswerMap, Recommendation};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
}

/// Question data as supplied by the authoring side, before it has an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: i64,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub student_name: String,
    pub quiz_id: i64,
    pub score: f64,
    pub detail: String, // JSON object of topic -> {right, total}
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    #[serde(deserialize_with = "lenient_id")]
    pub quiz_id: i64,
    #[serde(default)]
    pub answers: AnswerMap,
    pub student_name: Option<String>,
}

/// Accepts `3` as well as `"3"`; form posts often send ids as strings.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("quiz_id '{}' is not an integer", text))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub score: f64,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub attempts: Vec<Attempt>,
    pub top_performers: Vec<Attempt>,
    pub analytics: Option<AttemptAnalytics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}
