use actix_web::{web, HttpResponse, Result};
use shared::{ApiSuccess, DateAlias};

use super::{internal_error, not_found, validation_error};
use crate::models::AppState;
use crate::services::aliases::{self as alias_service, AliasError};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/date-aliases")
            .route("", web::get().to(list_aliases))
            .route("", web::post().to(set_alias))
            .route("/{date}", web::delete().to(delete_alias)),
    );
}

async fn list_aliases(state: web::Data<AppState>) -> Result<HttpResponse> {
    match alias_service::get_all(&state.db).await {
        Ok(aliases) => Ok(HttpResponse::Ok().json(ApiSuccess::new(aliases))),
        Err(e) => {
            log::error!("Error listing aliases: {:?}", e);
            Ok(internal_error("Failed to list aliases"))
        }
    }
}

async fn set_alias(
    state: web::Data<AppState>,
    body: web::Json<DateAlias>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    match alias_service::set(&state.db, &request.date, &request.alias).await {
        Ok(alias) => Ok(HttpResponse::Ok().json(ApiSuccess::new(DateAlias {
            date: request.date,
            alias,
        }))),
        Err(AliasError::Validation(e)) => Ok(validation_error(&e)),
        Err(e) => {
            log::error!("Error setting alias for {}: {:?}", request.date, e);
            Ok(internal_error("Failed to set alias"))
        }
    }
}

async fn delete_alias(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let date = path.into_inner();

    match alias_service::delete(&state.db, &date).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(not_found("Alias not found")),
        Err(e) => {
            log::error!("Error deleting alias for {}: {:?}", date, e);
            Ok(internal_error("Failed to delete alias"))
        }
    }
}
