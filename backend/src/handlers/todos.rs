use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Result};
use chrono::Local;
use serde::Deserialize;
use shared::{
    ApiSuccess, CollectionId, CopyCollectionRequest, CopyCollectionResponse, CreateTodoRequest,
    DeleteCollectionResponse, UpdateTodoRequest,
};

use super::{bad_request, internal_error, not_found, validation_error};
use crate::models::AppState;
use crate::services::collections::{self as collection_service, CollectionError, TodoChanges};
use crate::services::validation::{self, ValidationError};
use crate::services::{aliases as alias_service, export};

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/todos")
            .route("", web::get().to(list_todos))
            .route("", web::post().to(create_todo))
            // Collection-level routes (must come before /{todo_id} routes)
            .route("/counts", web::get().to(get_counts))
            .route("/collections", web::get().to(list_collections))
            .route("/copy-date", web::post().to(copy_collection))
            .route("/date/{date}", web::delete().to(delete_collection))
            .route("/export/{date}", web::get().to(export_collection))
            // Single todo routes
            .route("/{todo_id}", web::get().to(get_todo))
            .route("/{todo_id}", web::put().to(update_todo))
            .route("/{todo_id}", web::delete().to(delete_todo))
            .route("/{todo_id}/copy", web::post().to(duplicate_todo)),
    );
}

fn today() -> CollectionId {
    CollectionId::from_date(Local::now().date_naive())
}

/// Identifier from an optional client value, defaulting to today.
fn date_or_today(raw: Option<&str>) -> Result<CollectionId, ValidationError> {
    match raw {
        Some(raw) => validation::parse_identifier(raw),
        None => Ok(today()),
    }
}

/// Identifier from a value the client must supply.
fn required_date(raw: Option<&str>) -> Result<CollectionId, HttpResponse> {
    let raw = raw.ok_or_else(|| bad_request("missing_date", "Date parameter is required"))?;
    validation::parse_identifier(raw).map_err(|e| validation_error(&e))
}

fn order_overflow() -> HttpResponse {
    bad_request("order_out_of_range", "No order left after the last todo")
}

/// Respond with a single todo after it has been written.
async fn respond_with_todo(
    state: &AppState,
    id: &CollectionId,
    todo_id: i64,
    created: bool,
) -> HttpResponse {
    match collection_service::get_task(&state.db, id, todo_id).await {
        Ok(Some(todo)) if created => HttpResponse::Created().json(ApiSuccess::new(todo)),
        Ok(Some(todo)) => HttpResponse::Ok().json(ApiSuccess::new(todo)),
        Ok(None) => not_found("Todo not found"),
        Err(e) => {
            log::error!("Error fetching todo {} in {}: {:?}", todo_id, id, e);
            internal_error("Failed to fetch todo")
        }
    }
}

async fn list_todos(
    state: web::Data<AppState>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    let id = match date_or_today(query.date.as_deref()) {
        Ok(id) => id,
        Err(e) => return Ok(validation_error(&e)),
    };

    match collection_service::list_tasks(&state.db, &id).await {
        Ok(todos) => Ok(HttpResponse::Ok().json(ApiSuccess::new(todos))),
        Err(e) => {
            log::error!("Error listing todos for {}: {:?}", id, e);
            Ok(internal_error("Failed to list todos"))
        }
    }
}

async fn create_todo(
    state: web::Data<AppState>,
    body: web::Json<CreateTodoRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    let id = match date_or_today(request.date.as_deref()) {
        Ok(id) => id,
        Err(e) => return Ok(validation_error(&e)),
    };
    let content = match validation::validate_content(&request.content) {
        Ok(content) => content,
        Err(e) => return Ok(validation_error(&e)),
    };

    match collection_service::add_task(&state.db, &id, &content, request.order).await {
        Ok(todo_id) => Ok(respond_with_todo(&state, &id, todo_id, true).await),
        Err(CollectionError::OrderOverflow) => Ok(order_overflow()),
        Err(e) => {
            log::error!("Error creating todo in {}: {:?}", id, e);
            Ok(internal_error("Failed to create todo"))
        }
    }
}

async fn get_counts(state: web::Data<AppState>) -> Result<HttpResponse> {
    match collection_service::counts(&state.db).await {
        Ok(counts) => Ok(HttpResponse::Ok().json(ApiSuccess::new(counts))),
        Err(e) => {
            log::error!("Error counting todos: {:?}", e);
            Ok(internal_error("Failed to count todos"))
        }
    }
}

async fn list_collections(state: web::Data<AppState>) -> Result<HttpResponse> {
    match collection_service::list_collections(&state.db).await {
        Ok(ids) => Ok(HttpResponse::Ok().json(ApiSuccess::new(ids))),
        Err(e) => {
            log::error!("Error listing collections: {:?}", e);
            Ok(internal_error("Failed to list collections"))
        }
    }
}

async fn copy_collection(
    state: web::Data<AppState>,
    body: web::Json<CopyCollectionRequest>,
) -> Result<HttpResponse> {
    let request = body.into_inner();

    let source = match validation::parse_identifier(&request.source_date) {
        Ok(id) => id,
        Err(e) => return Ok(validation_error(&e)),
    };
    // Validate the label up front so a bad alias never leaves a copy behind.
    let alias = match request.alias.as_deref().map(validation::validate_alias).transpose() {
        Ok(alias) => alias,
        Err(e) => return Ok(validation_error(&e)),
    };

    let (table_id, count) = match collection_service::copy_collection(&state.db, &source).await {
        Ok(copy) => copy,
        Err(e) => {
            log::error!("Error copying collection {}: {:?}", source, e);
            return Ok(internal_error("Failed to copy collection"));
        }
    };

    if let Some(alias) = alias {
        if let Err(e) = alias_service::set(&state.db, table_id.as_str(), &alias).await {
            log::error!("Error setting alias for copy {}: {:?}", table_id, e);
        }
    }

    Ok(HttpResponse::Ok().json(ApiSuccess::new(CopyCollectionResponse { table_id, count })))
}

async fn delete_collection(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = match validation::parse_identifier(&path.into_inner()) {
        Ok(id) => id,
        Err(e) => return Ok(validation_error(&e)),
    };

    let count = match collection_service::delete_collection(&state.db, &id).await {
        Ok(count) => count,
        Err(e) => {
            log::error!("Error deleting collection {}: {:?}", id, e);
            return Ok(internal_error("Failed to delete collection"));
        }
    };

    // Alias cleanup must not fail the deletion
    if let Err(e) = alias_service::delete(&state.db, id.as_str()).await {
        log::warn!("Failed to delete alias of {}: {:?}", id, e);
    }

    Ok(HttpResponse::Ok().json(ApiSuccess::new(DeleteCollectionResponse { count })))
}

async fn export_collection(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let id = match validation::parse_identifier(&path.into_inner()) {
        Ok(id) => id,
        Err(e) => return Ok(validation_error(&e)),
    };

    let todos = match collection_service::list_tasks(&state.db, &id).await {
        Ok(todos) => todos,
        Err(e) => {
            log::error!("Error exporting {}: {:?}", id, e);
            return Ok(internal_error("Failed to export todos"));
        }
    };

    Ok(HttpResponse::Ok()
        .content_type("text/markdown; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(export::file_name(&id))],
        })
        .body(export::render_markdown(&id, &todos)))
}

async fn get_todo(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    let id = match required_date(query.date.as_deref()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    Ok(respond_with_todo(&state, &id, path.into_inner(), false).await)
}

async fn update_todo(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateTodoRequest>,
) -> Result<HttpResponse> {
    let todo_id = path.into_inner();
    let request = body.into_inner();

    let id = match required_date(request.date.as_deref()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };
    let content = match request.content.as_deref().map(validation::validate_content).transpose() {
        Ok(content) => content,
        Err(e) => return Ok(validation_error(&e)),
    };

    let changes = TodoChanges {
        content,
        completed: request.completed,
        order: request.order,
    };

    match collection_service::update_task(&state.db, &id, todo_id, &changes).await {
        Ok(true) => Ok(respond_with_todo(&state, &id, todo_id, false).await),
        Ok(false) => Ok(not_found("Todo not found or nothing to update")),
        Err(e) => {
            log::error!("Error updating todo {} in {}: {:?}", todo_id, id, e);
            Ok(internal_error("Failed to update todo"))
        }
    }
}

async fn delete_todo(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    let todo_id = path.into_inner();
    let id = match required_date(query.date.as_deref()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match collection_service::delete_task(&state.db, &id, todo_id).await {
        Ok(true) => Ok(HttpResponse::NoContent().finish()),
        Ok(false) => Ok(not_found("Todo not found")),
        Err(e) => {
            log::error!("Error deleting todo {} in {}: {:?}", todo_id, id, e);
            Ok(internal_error("Failed to delete todo"))
        }
    }
}

async fn duplicate_todo(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    query: web::Query<DateQuery>,
) -> Result<HttpResponse> {
    let todo_id = path.into_inner();
    let id = match required_date(query.date.as_deref()) {
        Ok(id) => id,
        Err(resp) => return Ok(resp),
    };

    match collection_service::duplicate_task(&state.db, &id, todo_id).await {
        Ok(Some(new_id)) => Ok(respond_with_todo(&state, &id, new_id, true).await),
        Ok(None) => Ok(not_found("Todo not found")),
        Err(CollectionError::OrderOverflow) => Ok(order_overflow()),
        Err(e) => {
            log::error!("Error copying todo {} in {}: {:?}", todo_id, id, e);
            Ok(internal_error("Failed to copy todo"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::json;
    use shared::{ApiError, Todo};
    use std::collections::BTreeMap;

    use crate::handlers::{configure_routes, test_state};

    #[actix_web::test]
    async fn test_create_list_and_complete() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/todos")
            .set_json(json!({"content": "  Plan sprint ", "date": "2025-07-29"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: ApiSuccess<Todo> = test::read_body_json(resp).await;
        assert_eq!(created.data.content, "Plan sprint");
        assert_eq!(created.data.date.as_str(), "2025-07-29");

        let req = test::TestRequest::put()
            .uri(&format!("/api/todos/{}", created.data.id))
            .set_json(json!({"date": "2025-07-29", "completed": true}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: ApiSuccess<Todo> = test::read_body_json(resp).await;
        assert!(updated.data.completed);
        assert!(updated.data.completed_at.is_some());

        let req = test::TestRequest::get()
            .uri("/api/todos?date=2025-07-29")
            .to_request();
        let listed: ApiSuccess<Vec<Todo>> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.data.len(), 1);

        let req = test::TestRequest::get().uri("/api/todos/counts").to_request();
        let counts: ApiSuccess<BTreeMap<String, i64>> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(counts.data.get("2025-07-29"), Some(&1));
    }

    #[actix_web::test]
    async fn test_validation_errors() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/todos")
            .set_json(json!({"content": "<script>alert(1)</script>", "date": "2025-07-29"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = test::read_body_json(resp).await;
        assert_eq!(error.error, "invalid_content");

        let req = test::TestRequest::get()
            .uri("/api/todos?date=29.07.2025")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = test::read_body_json(resp).await;
        assert_eq!(error.error, "invalid_identifier");

        let req = test::TestRequest::delete().uri("/api/todos/1").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = test::read_body_json(resp).await;
        assert_eq!(error.error, "missing_date");

        // Nothing was written.
        assert!(collection_service::list_collections(&state.db)
            .await
            .unwrap()
            .is_empty());
    }

    #[actix_web::test]
    async fn test_missing_todo_is_not_found() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/todos/42?date=2025-07-29")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::put()
            .uri("/api/todos/42")
            .set_json(json!({"date": "2025-07-29", "content": "x"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_copy_with_alias_then_delete() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;
        let source: CollectionId = "2025-07-29".parse().unwrap();
        collection_service::add_task(&state.db, &source, "a", None)
            .await
            .unwrap();

        let req = test::TestRequest::post()
            .uri("/api/todos/copy-date")
            .set_json(json!({"source_date": "2025-07-29", "alias": "07.29-copy"}))
            .to_request();
        let copied: ApiSuccess<CopyCollectionResponse> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(copied.data.count, 1);
        assert!(copied.data.table_id.is_copy());

        let aliases = alias_service::get_all(&state.db).await.unwrap();
        assert_eq!(
            aliases.get(copied.data.table_id.as_str()).map(String::as_str),
            Some("07.29-copy")
        );

        let req = test::TestRequest::delete()
            .uri(&format!("/api/todos/date/{}", copied.data.table_id))
            .to_request();
        let deleted: ApiSuccess<DeleteCollectionResponse> =
            test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted.data.count, 1);

        assert!(!collection_service::exists(&state.db, &copied.data.table_id)
            .await
            .unwrap());
        assert!(alias_service::get_all(&state.db).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_export_markdown() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;
        let day: CollectionId = "2025-07-29".parse().unwrap();
        collection_service::add_task(&state.db, &day, "Write docs", None)
            .await
            .unwrap();

        let req = test::TestRequest::get()
            .uri("/api/todos/export/2025-07-29")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get("content-disposition")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(disposition.contains("07.29-todo.md"));

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("- [ ] Write docs"));
        assert!(text.ends_with("Total: 1 tasks, completed: 0\n"));
    }

    #[actix_web::test]
    async fn test_order_overflow_is_a_bad_request() {
        let state = test_state().await;
        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/todos")
            .set_json(json!({"content": "last", "date": "2025-07-29", "order": i64::MAX}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let last: ApiSuccess<Todo> = test::read_body_json(resp).await;

        let req = test::TestRequest::post()
            .uri("/api/todos")
            .set_json(json!({"content": "next", "date": "2025-07-29"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let error: ApiError = test::read_body_json(resp).await;
        assert_eq!(error.error, "order_out_of_range");

        let req = test::TestRequest::post()
            .uri(&format!("/api/todos/{}/copy?date=2025-07-29", last.data.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_storage_failure_hides_details() {
        let state = test_state().await;
        let day: CollectionId = "2025-07-29".parse().unwrap();
        let table = collection_service::ensure_collection(&state.db, &day)
            .await
            .unwrap();
        sqlx::query(&format!(
            r#"CREATE TRIGGER reject_insert BEFORE INSERT ON "{}" BEGIN SELECT RAISE(ABORT, 'disk quota exceeded'); END"#,
            table
        ))
        .execute(&state.db)
        .await
        .unwrap();

        let app = test::init_service(
            App::new().app_data(state.clone()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/todos")
            .set_json(json!({"content": "x", "date": "2025-07-29"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ApiError = test::read_body_json(resp).await;
        assert_eq!(error.error, "internal_error");
        assert_eq!(error.message, "Failed to create todo");

        assert!(collection_service::list_tasks(&state.db, &day)
            .await
            .unwrap()
            .is_empty());
    }
}
