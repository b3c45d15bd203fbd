use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use tripsplit::config::Config;
use tripsplit::routes::{self, SharedStore};
use tripsplit::TripStore;

fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header(),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let store = if config.seed_sample_data {
        TripStore::with_sample_data().map_err(std::io::Error::other)?
    } else {
        TripStore::new()
    };
    info!(trips = store.trips().len(), "store ready");

    let store: web::Data<SharedStore> = web::Data::new(RwLock::new(store));
    let cors_origin = config.cors_origin.clone();
    info!(bind = %config.bind, port = config.port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(cors(cors_origin.as_deref()))
            .app_data(store.clone())
            .configure(routes::configure)
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await
}
