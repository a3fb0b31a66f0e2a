use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use rocket::serde::json::Json;

/// The four user-visible error classes plus an opaque internal failure.
///
/// `Conflict` is deliberately absent: transactional claim/complete/fail
/// guards absorb conflicting job-state transitions and the losing side
/// simply sees its post-condition fail as `NotFound` (see `queue.rs`).
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("rate limited")]
    RateLimited { retry_after_secs: u64, limit: usize },
    #[error(transparent)]
    Internal(#[from] rusqlite::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl<'r, 'o: 'r> Responder<'r, 'o> for AppError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let (status, body) = match &self {
            AppError::BadRequest(msg) => (Status::BadRequest, serde_json::json!({"error": msg})),
            AppError::Unauthorized => {
                (Status::Unauthorized, serde_json::json!({"error": "invalid or missing api key"}))
            }
            AppError::NotFound(msg) => (Status::NotFound, serde_json::json!({"error": msg})),
            AppError::RateLimited { retry_after_secs, limit } => (
                Status::TooManyRequests,
                serde_json::json!({
                    "error": "rate limited",
                    "retry_after_secs": retry_after_secs,
                    "limit": limit,
                }),
            ),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal store error");
                (Status::InternalServerError, serde_json::json!({"error": e.to_string()}))
            }
        };

        let mut response = Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .finalize();

        if let AppError::RateLimited { retry_after_secs, .. } = &self {
            response.set_header(rocket::http::Header::new(
                "Retry-After",
                retry_after_secs.to_string(),
            ));
        }

        Ok(response)
    }
}
