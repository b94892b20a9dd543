//! Diary endpoints - exchange, comments, lookup

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::repos::{Comment, CommentRepo, DiaryRepo, DiaryWithComments};
use crate::http::error::ApiError;
use crate::http::extractors::{ValidDiaryId, ValidJson};
use crate::http::server::AppState;
use crate::models::{AuthorName, CommentContent, DiaryContent};

/// Submit-and-exchange request
#[derive(Deserialize)]
pub struct ExchangeRequest {
    pub author: String,
    pub content: String,
}

/// Add comment request
#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub author: String,
    pub content: String,
    pub diary_id: i64,
}

/// Comment response
#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub create_time: String,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author: c.author,
            content: c.content,
            create_time: c.create_time.to_rfc3339(),
        }
    }
}

/// Diary response, comments nested
#[derive(Debug, Serialize, Deserialize)]
pub struct DiaryResponse {
    pub id: i64,
    pub author: String,
    pub content: String,
    pub create_time: String,
    pub comments: Vec<CommentResponse>,
}

impl From<DiaryWithComments> for DiaryResponse {
    fn from(d: DiaryWithComments) -> Self {
        Self {
            id: d.diary.id,
            author: d.diary.author,
            content: d.diary.content,
            create_time: d.diary.create_time.to_rfc3339(),
            comments: d.comments.into_iter().map(CommentResponse::from).collect(),
        }
    }
}

/// POST /diary/exchange - store a diary, get someone else's back
async fn exchange_diary(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<ExchangeRequest>,
) -> Result<Json<DiaryResponse>, ApiError> {
    let author = AuthorName::new(&req.author)?;
    let content = DiaryContent::new(&req.content)?;

    let exchange = DiaryRepo::new(&state.pool).exchange(&author, &content).await?;
    tracing::info!(
        submitted_id = exchange.submitted_id,
        received_id = exchange.received.diary.id,
        "diary exchanged"
    );

    Ok(Json(DiaryResponse::from(exchange.received)))
}

/// POST /diary/add-comments - comment on an existing diary
async fn add_comment(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let author = AuthorName::new(&req.author)?;
    let content = CommentContent::new(&req.content)?;

    let comment = CommentRepo::new(&state.pool)
        .create(req.diary_id, &author, &content)
        .await?;

    Ok(Json(CommentResponse::from(comment)))
}

/// GET /diary/{id} - a single diary with its comments
async fn get_diary(
    State(state): State<Arc<AppState>>,
    ValidDiaryId(id): ValidDiaryId,
) -> Result<Json<DiaryResponse>, ApiError> {
    let diary = DiaryRepo::new(&state.pool).get_with_comments(id).await?;
    Ok(Json(DiaryResponse::from(diary)))
}

/// Diary routes
///
/// The web client posts comments with a trailing slash, so both spellings
/// are routed.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/diary/exchange", post(exchange_diary))
        .route("/diary/add-comments", post(add_comment))
        .route("/diary/add-comments/", post(add_comment))
        .route("/diary/{id}", get(get_diary))
}
