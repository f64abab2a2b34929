use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};

use exam_session_server::{
    app_state::AppState, auth::JwtService, config::Config, handlers, middleware::RequestIdMiddleware,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if config.is_production() {
        config.validate_for_production();
    }

    let jwt_service = web::Data::new(JwtService::new(&config.jwt_secret, config.jwt_expiration_hours));
    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let allowed_origin = config.cors_allowed_origin.clone();

    let state = match AppState::new(config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            log::error!("Failed to initialize application state: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = match &allowed_origin {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST"])
                .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
                .max_age(3600),
            None => Cors::permissive(),
        };

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(jwt_service.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
