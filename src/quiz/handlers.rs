//! Flash-card quiz handlers.
//!
//! Straight-line CRUD glue behind the dispatch core: create a session,
//! serve the next question, record submitted answers, report results.
//! Business outcomes ("not found", "bad request") are expressed as return
//! values, never as propagated errors.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::dispatch::error::HandlerError;
use crate::dispatch::router::{Handler, HandlerParams, ParamSource, Route, RouteTable};
use crate::quiz::arith;
use crate::storage::{QueryMode, Row, Storage, StorageError};

/// Questions seeded into every new session.
pub const DEFAULT_QUESTION_BANK: &[&str] = &[
    "2 + 2",
    "7 * 6",
    "(10 - 4) / 3",
    "9 - 2 * 3",
    "5 * (3 - 8)",
];

/// Shared state for the quiz route family.
pub struct QuizService {
    sessions: Arc<dyn Storage>,
    questions: Arc<dyn Storage>,
    answers: Arc<dyn Storage>,
    question_bank: Vec<String>,
}

impl QuizService {
    pub fn new(
        sessions: Arc<dyn Storage>,
        questions: Arc<dyn Storage>,
        answers: Arc<dyn Storage>,
    ) -> Self {
        Self::with_question_bank(
            sessions,
            questions,
            answers,
            DEFAULT_QUESTION_BANK.iter().map(|q| q.to_string()).collect(),
        )
    }

    pub fn with_question_bank(
        sessions: Arc<dyn Storage>,
        questions: Arc<dyn Storage>,
        answers: Arc<dyn Storage>,
        question_bank: Vec<String>,
    ) -> Self {
        Self {
            sessions,
            questions,
            answers,
            question_bank,
        }
    }

    /// `POST /sessions` — create a quiz session and seed its questions.
    pub async fn create_session(&self, params: &HandlerParams) -> Result<Value, HandlerError> {
        let uid = text_param(params, "uid");
        let session = Uuid::new_v4().to_string();

        let mut row = Row::new();
        row.insert("session".to_string(), json!(session));
        row.insert("uid".to_string(), json!(uid));
        if let Some(name) = params.get("name") {
            row.insert("name".to_string(), name.clone());
        }
        self.sessions
            .create(row)
            .await
            .map_err(|source| storage_failure("create session", source))?;

        for (question_id, question) in self.question_bank.iter().enumerate() {
            let mut row = Row::new();
            row.insert("session".to_string(), json!(session));
            row.insert("question_id".to_string(), json!(question_id));
            row.insert("question".to_string(), json!(question));
            self.questions
                .create(row)
                .await
                .map_err(|source| storage_failure("seed questions", source))?;
        }

        Ok(creation_note(&session, &uid))
    }

    /// `GET /questions` — next unanswered question for a session.
    pub async fn next_question(&self, params: &HandlerParams) -> Result<Value, HandlerError> {
        let session = text_param(params, "session");
        if !self.session_exists(&session).await? {
            return Ok(session_not_found(&session));
        }

        match self.next_unanswered(&session).await? {
            Some(question) => Ok(question),
            None => self.results_summary(&session).await,
        }
    }

    /// `POST /questions` — record an answer, then return the next question
    /// or the session results when none remain.
    pub async fn submit_answer(&self, params: &HandlerParams) -> Result<Value, HandlerError> {
        let session = text_param(params, "session");
        if !self.session_exists(&session).await? {
            return Ok(session_not_found(&session));
        }

        let current = match self.next_unanswered(&session).await? {
            Some(question) => question,
            None => {
                return Ok(json!({
                    "Error": format!("Session {session} has no open question")
                }))
            }
        };

        let given = match numeric_param(params, "answer") {
            Some(value) => value,
            None => {
                return Ok(json!({ "Error": "Bad Request: answer must be a number" }))
            }
        };

        let question = current["question"].as_str().unwrap_or_default().to_string();
        let expected = arith::eval(&question).map_err(|error| {
            HandlerError::Other(format!("failed to evaluate question `{question}`: {error}"))
        })?;
        let correct = (expected - given).abs() < 1e-9;

        let mut row = Row::new();
        row.insert("session".to_string(), json!(session));
        row.insert("question_id".to_string(), current["question_id"].clone());
        row.insert("question".to_string(), json!(question));
        row.insert("answer".to_string(), json!(given));
        row.insert("correct".to_string(), json!(correct));
        self.answers
            .put(row)
            .await
            .map_err(|source| storage_failure("save answer", source))?;

        match self.next_unanswered(&session).await? {
            Some(question) => Ok(question),
            None => self.results_summary(&session).await,
        }
    }

    /// `GET /results` — all recorded answer rows for a session.
    pub async fn session_results(&self, params: &HandlerParams) -> Result<Value, HandlerError> {
        let session = text_param(params, "session");
        if !self.session_exists(&session).await? {
            return Ok(session_not_found(&session));
        }

        let rows = self
            .answer_rows(&session)
            .await?
            .into_iter()
            .map(Value::Object)
            .collect();
        Ok(Value::Array(rows))
    }

    async fn session_exists(&self, session: &str) -> Result<bool, HandlerError> {
        let keys = session_key(session);
        let found = self
            .sessions
            .get_by_query(&keys, QueryMode::Count)
            .await
            .map_err(|source| storage_failure("load session", source))?;
        Ok(found.count() > 0)
    }

    /// First question of the session without a recorded answer, in
    /// `question_id` order.
    async fn next_unanswered(&self, session: &str) -> Result<Option<Value>, HandlerError> {
        let keys = session_key(session);
        let mut questions = self
            .questions
            .get_by_query(&keys, QueryMode::AllFields)
            .await
            .map_err(|source| storage_failure("load questions", source))?
            .into_rows();
        questions.sort_by_key(|row| row.get("question_id").and_then(Value::as_u64));

        let answered: Vec<Value> = self
            .answer_rows(session)
            .await?
            .iter()
            .filter_map(|row| row.get("question_id").cloned())
            .collect();

        for row in questions {
            let id = row.get("question_id").cloned().unwrap_or(Value::Null);
            if !answered.contains(&id) {
                return Ok(Some(json!({
                    "session": session,
                    "question_id": id,
                    "question": row.get("question").cloned().unwrap_or(Value::Null),
                })));
            }
        }
        Ok(None)
    }

    async fn results_summary(&self, session: &str) -> Result<Value, HandlerError> {
        let answers = self.answer_rows(session).await?;
        let correct = answers
            .iter()
            .filter(|row| row.get("correct") == Some(&json!(true)))
            .count();
        Ok(json!({
            "session": session,
            "total": answers.len(),
            "correct": correct,
        }))
    }

    async fn answer_rows(&self, session: &str) -> Result<Vec<Row>, HandlerError> {
        let keys = session_key(session);
        let mut rows = self
            .answers
            .get_by_query(&keys, QueryMode::AllFields)
            .await
            .map_err(|source| storage_failure("load answers", source))?
            .into_rows();
        rows.sort_by_key(|row| row.get("question_id").and_then(Value::as_u64));
        Ok(rows)
    }
}

/// Build the quiz route table. Query-only reads, body-only session creation,
/// both sources for answer submission.
pub fn routes(service: Arc<QuizService>) -> RouteTable {
    RouteTable::builder()
        .route(
            "/sessions",
            Method::POST,
            Route::new(Arc::new(CreateSession(service.clone())))
                .required(["uid"])
                .optional(["name"])
                .sources([ParamSource::Body]),
        )
        .route(
            "/questions",
            Method::GET,
            Route::new(Arc::new(NextQuestion(service.clone())))
                .required(["session"])
                .sources([ParamSource::Query]),
        )
        .route(
            "/questions",
            Method::POST,
            Route::new(Arc::new(SubmitAnswer(service.clone())))
                .required(["session", "answer"])
                .optional(["uid", "name"]),
        )
        .route(
            "/results",
            Method::GET,
            Route::new(Arc::new(SessionResults(service)))
                .required(["session"])
                .sources([ParamSource::Query]),
        )
        .build()
}

struct CreateSession(Arc<QuizService>);

#[async_trait]
impl Handler for CreateSession {
    async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError> {
        self.0.create_session(&params).await
    }
}

struct NextQuestion(Arc<QuizService>);

#[async_trait]
impl Handler for NextQuestion {
    async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError> {
        self.0.next_question(&params).await
    }
}

struct SubmitAnswer(Arc<QuizService>);

#[async_trait]
impl Handler for SubmitAnswer {
    async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError> {
        self.0.submit_answer(&params).await
    }
}

struct SessionResults(Arc<QuizService>);

#[async_trait]
impl Handler for SessionResults {
    async fn call(&self, params: HandlerParams) -> Result<Value, HandlerError> {
        self.0.session_results(&params).await
    }
}

/// Creation outcome for `POST /sessions`: the structured fields JSON-encoded
/// into a string value. Status classification assigns 201 only to strings
/// carrying the creation note (an object without an `"Error"` key always
/// classifies as 200), so the `session` and `uid` fields ride inside one.
/// Clients parse the body string as JSON and read `session`.
fn creation_note(session: &str, uid: &str) -> Value {
    let note = json!({
        "session": session,
        "uid": uid,
        "message": format!("Session {session} successfully created"),
    });
    Value::String(note.to_string())
}

fn session_key(session: &str) -> Row {
    let mut keys = Map::new();
    keys.insert("session".to_string(), json!(session));
    keys
}

fn session_not_found(session: &str) -> Value {
    json!({ "Error": format!("Session {session} not found") })
}

fn storage_failure(operation: &'static str, source: StorageError) -> HandlerError {
    HandlerError::Storage { operation, source }
}

fn text_param(params: &HandlerParams, name: &str) -> String {
    match params.get(name) {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn numeric_param(params: &HandlerParams, name: &str) -> Option<f64> {
    match params.get(name)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
