use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Local;
use shared::CollectionId;

mod config;
mod db;
mod handlers;
mod models;
mod services;

use config::Config;
use services::collections;

async fn index(state: web::Data<models::AppState>) -> actix_web::Result<NamedFile> {
    let static_path = state.config.static_files_path.as_deref().unwrap_or("./static");
    Ok(NamedFile::open(format!("{}/index.html", static_path))?)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Load configuration
    let config = Config::from_env().expect("Failed to load configuration");

    log::info!("Starting server at {}:{}", config.host, config.port);

    if let Some(ref path) = config.static_files_path {
        log::info!("Serving static files from: {}", path);
    }

    // Create database pool and run migrations
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to open database");

    log::info!("Database migrations completed");

    // Today's list always exists, even before its first task
    let today = CollectionId::from_date(Local::now().date_naive());
    if !collections::exists(&pool, &today)
        .await
        .expect("Failed to inspect today's collection")
    {
        let table = collections::ensure_collection(&pool, &today)
            .await
            .expect("Failed to create today's collection");
        log::info!("Created collection {} for today", table);
    }

    // Create app state
    let app_state = web::Data::new(models::AppState {
        db: pool,
        config: config.clone(),
    });

    let static_files_path = config.static_files_path.clone();
    let allowed_origins = config.cors_origins.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let allowed_origins = allowed_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _req_head| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed_origins
                    .iter()
                    .any(|allowed| origin_str.starts_with(allowed))
            })
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec!["Content-Type"])
            .max_age(3600);

        let mut app = App::new()
            .app_data(app_state.clone())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(handlers::configure_routes);

        // Serve the frontend if a path is configured
        if let Some(ref path) = static_files_path {
            app = app
                .service(Files::new("/static", path.clone()))
                .default_service(web::route().to(index));
        }

        app
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
