pub mod analytics;
pub mod api;
pub mod config;
pub mod database;
pub mod errors;
pub mod intent_matcher;
pub mod knowledge_base;
pub mod logging;
pub mod models;
pub mod quiz_scorer;
pub mod quiz_service;
pub mod similarity;

pub use analytics::AttemptAnalytics;
pub use config::Config;
pub use database::Database;
pub use errors::*;
pub use intent_matcher::{Intent, IntentMatcher, MatcherSettings, Reply};
pub use knowledge_base::{Corpus, KnowledgeEntry};
pub use models::*;
pub use quiz_scorer::{AnswerMap, Question, Recommendation, ScoreResult, TopicTally, score};
pub use quiz_service::QuizService;
pub use similarity::{SimilarityIndex, SimilarityMatch};
