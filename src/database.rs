use anyhow::Result;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::time::Instant;
use uuid::Uuid;

use crate::models::*;
use crate::quiz_scorer::Question;

// Import logging macros
use crate::log_db_operation;

#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        let db = Database { pool };
        db.migrate().await?;
        log_db_operation!(info, "migrate", "database initialized");
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quizzes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS questions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL,
                prompt TEXT NOT NULL,
                options TEXT NOT NULL,
                correct_option_index INTEGER NOT NULL,
                topic TEXT,
                FOREIGN KEY (quiz_id) REFERENCES quizzes(id) ON DELETE CASCADE
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                student_name TEXT NOT NULL,
                quiz_id INTEGER NOT NULL,
                score REAL NOT NULL,
                detail TEXT NOT NULL,
                taken_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // Quiz operations
    pub async fn create_quiz(&self, title: &str) -> Result<Quiz> {
        let result = sqlx::query("INSERT INTO quizzes (title) VALUES (?1)")
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(Quiz {
            id: result.last_insert_rowid(),
            title: title.to_string(),
        })
    }

    pub async fn get_quiz(&self, id: i64) -> Result<Option<Quiz>> {
        let row = sqlx::query("SELECT id, title FROM quizzes WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| Quiz {
            id: row.get("id"),
            title: row.get("title"),
        }))
    }

    /// Stores a question for an existing quiz. Used for seeding; authoring
    /// lives outside this service.
    pub async fn add_question(&self, quiz_id: i64, question: NewQuestion) -> Result<Question> {
        let options_json = serde_json::to_string(&question.options)?;

        let result = sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, prompt, options, correct_option_index, topic)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(quiz_id)
        .bind(&question.prompt)
        .bind(&options_json)
        .bind(question.correct_option_index)
        .bind(&question.topic)
        .execute(&self.pool)
        .await?;

        Ok(Question {
            id: result.last_insert_rowid(),
            prompt: question.prompt,
            options: question.options,
            correct_option_index: question.correct_option_index,
            topic: question.topic,
        })
    }

    pub async fn get_questions_for_quiz(&self, quiz_id: i64) -> Result<Vec<Question>> {
        let started = Instant::now();
        let rows = sqlx::query(
            "SELECT id, prompt, options, correct_option_index, topic FROM questions WHERE quiz_id = ?1 ORDER BY id ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(Question {
                id: row.get("id"),
                prompt: row.get("prompt"),
                options: serde_json::from_str(&row.get::<String, _>("options"))?,
                correct_option_index: row.get("correct_option_index"),
                topic: row.get("topic"),
            });
        }

        log_db_operation!(
            debug,
            "get_questions_for_quiz",
            count = questions.len(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(questions)
    }

    // Attempt operations
    pub async fn record_attempt(
        &self,
        student_name: &str,
        quiz_id: i64,
        score: f64,
        detail: String,
    ) -> Result<Attempt> {
        let attempt = Attempt {
            id: Uuid::new_v4(),
            student_name: student_name.to_string(),
            quiz_id,
            score,
            detail,
            taken_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO attempts (id, student_name, quiz_id, score, detail, taken_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.student_name)
        .bind(attempt.quiz_id)
        .bind(attempt.score)
        .bind(&attempt.detail)
        .bind(attempt.taken_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(attempt)
    }

    pub async fn get_attempts(&self) -> Result<Vec<Attempt>> {
        let rows = sqlx::query("SELECT * FROM attempts ORDER BY taken_at DESC")
            .fetch_all(&self.pool)
            .await?;

        let mut attempts = Vec::with_capacity(rows.len());
        for row in rows {
            attempts.push(Attempt {
                id: Uuid::parse_str(&row.get::<String, _>("id"))?,
                student_name: row.get("student_name"),
                quiz_id: row.get("quiz_id"),
                score: row.get("score"),
                detail: row.get("detail"),
                taken_at: chrono::DateTime::parse_from_rfc3339(&row.get::<String, _>("taken_at"))?
                    .with_timezone(&Utc),
            });
        }

        Ok(attempts)
    }
}
