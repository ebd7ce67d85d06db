use actix_web::{web, HttpResponse};
use shared::ApiError;

use crate::services::validation::ValidationError;
#[cfg(test)]
use crate::models::AppState;

pub mod aliases;
pub mod todos;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(todos::configure)
            .configure(aliases::configure),
    );
}

fn error_body(error: &str, message: impl Into<String>) -> ApiError {
    ApiError {
        error: error.to_string(),
        message: message.into(),
    }
}

pub(crate) fn validation_error(err: &ValidationError) -> HttpResponse {
    HttpResponse::BadRequest().json(error_body(err.code(), err.to_string()))
}

pub(crate) fn bad_request(error: &str, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(error_body(error, message))
}

pub(crate) fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(error_body("not_found", message))
}

/// Storage details stay in the log; clients only see `message`.
pub(crate) fn internal_error(message: &str) -> HttpResponse {
    HttpResponse::InternalServerError().json(error_body("internal_error", message))
}

#[cfg(test)]
pub(crate) async fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState {
        db: crate::db::test_pool().await,
        config: crate::config::Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "sqlite::memory:".to_string(),
            static_files_path: None,
            cors_origins: Vec::new(),
        },
    })
}
