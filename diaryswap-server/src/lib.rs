//! diaryswap-server: HTTP backend for a diary exchange
//!
//! Users submit a diary and receive someone else's, picked at random, in
//! return. Diaries can be commented on, and images for the rich-text editor
//! are uploaded to local disk and served from `/resources`.
//!
//! Layers, outermost first: [`http`] (axum router, errors), [`db`] (sqlx
//! SQLite pool, migrations, repositories), [`models`] (validated input),
//! [`uploads`] (image files).

pub mod db;
pub mod http;
pub mod models;
pub mod uploads;

pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
