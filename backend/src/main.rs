mod config;
mod error;
mod identifiers;
mod images;
mod services;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::images::ImageStore;
use crate::state::{AppState, RecordClock};
use crate::store::Database;
use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let db = Database::open(&config.database_path).map_err(|e| {
        error!("cannot open {}: {}", config.database_path.display(), e);
        io::Error::other(e.to_string())
    })?;
    let images = ImageStore::new(config.uploads_dir.clone())
        .map_err(|e| io::Error::other(e.to_string()))?;
    std::fs::create_dir_all(images.dir())?;

    let state = web::Data::new(AppState {
        db,
        images,
        clock: RecordClock::new(config.record_offset),
    });

    info!(
        "Server running at http://{}:{} (database {}, uploads {})",
        config.host,
        config.port,
        config.database_path.display(),
        config.uploads_dir.display()
    );

    let uploads_dir = config.uploads_dir.clone();
    let json_limit = config.json_limit_bytes;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(services::json_config(json_limit))
            .app_data(state.clone())
            .service(services::applications::configure_routes())
            .service(Files::new("/uploads", uploads_dir.clone()))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
