mod config;
mod conversation;
mod error;
mod model;
mod relay;
mod web;

use std::sync::Arc;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use config::Config;
use conversation::Transcript;
use model::CerebrasClient;
use relay::Relay;
use web::routes;

// App state structure
pub struct AppState {
    relay: Relay,
    allowed_origins: Vec<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting Bodha relay");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    let upstream = match CerebrasClient::new(
        config.api_url.clone(),
        config.api_key.clone(),
        config.sampling.clone(),
        config.timeout,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to initialize completion client: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Model {} with history limit {}, allowed origins: {}",
        config.sampling.model,
        config.history_limit,
        config.allowed_origins.join(", ")
    );

    let transcript = Transcript::new(config.system_prompt.clone(), config.history_limit);
    let app_state = Data::new(AppState {
        relay: Relay::new(transcript, upstream),
        allowed_origins: config.allowed_origins.clone(),
    });

    info!("Starting server on :{}", config.port);

    // Start web server
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await
}
