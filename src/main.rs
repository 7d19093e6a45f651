use actix_files::Files;
use actix_web::middleware::Logger;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use std::io;
use std::sync::Arc;

use wildfire_leads::config::AppConfig;
use wildfire_leads::db::Database;
use wildfire_leads::web::{self, security, AppState};

const DEFAULT_RESEND_LIMIT: i64 = 50;

fn startup_error(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e.to_string())
}

/// `wildfire-leads resend-unsent [limit]` retries CRM forwards for
/// completed leads that were never acknowledged, then exits.
async fn resend_unsent(state: &AppState, limit: i64) -> io::Result<()> {
    let outcomes = state
        .gateway
        .resend_unsent(limit)
        .await
        .map_err(startup_error)?;

    let delivered = outcomes.iter().filter(|(_, o)| o.is_delivered()).count();
    for (id, outcome) in &outcomes {
        log::info!("Lead {}: {:?}", id, outcome);
    }
    log::info!("Resent {} of {} unsent leads", delivered, outcomes.len());
    Ok(())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    let config = AppConfig::from_env().map_err(startup_error)?;
    let db = Database::new(&config.database_url)
        .await
        .map_err(startup_error)?;
    let state = AppState::from_config(&config, Arc::new(db)).map_err(startup_error)?;

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        if command != "resend-unsent" {
            return Err(startup_error(format!("Unknown command '{}'", command)));
        }
        let limit = match args.next() {
            Some(raw) => raw.parse().map_err(|_| {
                startup_error(format!("Invalid resend limit '{}'", raw))
            })?,
            None => DEFAULT_RESEND_LIMIT,
        };
        return resend_unsent(&state, limit).await;
    }

    log::info!("Listening on {}", config.bind_addr);
    let state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(security::security_headers())
            .wrap(Logger::default())
            .configure(web::configure)
            .service(Files::new("/static", "./static").prefer_utf8(true))
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
