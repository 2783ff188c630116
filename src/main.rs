use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod classifier;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod geofence;
mod location;
mod model;
mod photo;
mod routes;
mod service;
mod store;

use config::Config;
use db::init_db;

use crate::clock::SystemClock;
use crate::docs::ApiDoc;
use crate::location::NoLocationProvider;
use crate::location::geocode::{NominatimGeocoder, NoopGeocoder, ReverseGeocoder};
use crate::model::settings::StaticSettingsSource;
use crate::photo::NoPhotoCapture;
use crate::service::AttendanceService;
use crate::store::mysql::MySqlAttendanceStore;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Attendance service is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    let config = Config::from_env();

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Attendance server starting...");

    let pool = init_db(&config.database_url).await;

    // The server itself has no position source; clients submit coordinates
    // with each request. Reverse geocoding is optional per config.
    let geocoder: Arc<dyn ReverseGeocoder> = match config.geocoder_url.clone() {
        Some(url) => Arc::new(NominatimGeocoder::new(url)),
        None => Arc::new(NoopGeocoder),
    };
    let service = Data::new(AttendanceService::new(
        Arc::new(MySqlAttendanceStore::new(pool)),
        Arc::new(StaticSettingsSource::new(config.attendance_settings())),
        Arc::new(NoLocationProvider),
        geocoder,
        Arc::new(NoPhotoCapture),
        Arc::new(SystemClock),
    ));

    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
