use std::io;

use actix_identity::IdentityMiddleware;
use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};

use pushkind_hr::broadcast::TerminationBroadcaster;
use pushkind_hr::db::establish_connection_pool;
use pushkind_hr::models::config::ServerConfig;
use pushkind_hr::repository::DieselRepository;
use pushkind_hr::routes::configure;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = ServerConfig::load().map_err(|e| {
        log::error!("Failed to load configuration: {e}");
        io::Error::other(e)
    })?;

    let pool = establish_connection_pool(&server_config.database_url).map_err(|e| {
        log::error!("Failed to establish database connection pool: {e}");
        io::Error::other(e)
    })?;

    let secret_key = Key::try_from(server_config.secret.as_bytes()).map_err(|e| {
        log::error!("Secret must be at least 64 bytes long: {e}");
        io::Error::other(e)
    })?;

    let repo = web::Data::new(DieselRepository::new(pool));
    let broadcaster = web::Data::new(TerminationBroadcaster::new(
        server_config.broadcast_capacity,
    ));
    let bind_to = (server_config.address.clone(), server_config.port);
    let server_config = web::Data::new(server_config);

    log::info!("Starting HR service on {}:{}", bind_to.0, bind_to.1);

    HttpServer::new(move || {
        App::new()
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false)
                    .build(),
            )
            .wrap(Logger::default())
            .app_data(server_config.clone())
            .app_data(repo.clone())
            .app_data(broadcaster.clone())
            .configure(configure)
    })
    .bind(bind_to)?
    .run()
    .await
}
