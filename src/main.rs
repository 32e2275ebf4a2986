mod handlers;
mod middleware;
mod models;
mod routes;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, HttpResponse};
use handlers::{
    auth::{TokenIssuer, TokenValidator},
    config::JwtOptions,
    directory::UserDirectory,
};
use log::{error, info};
use middleware::request_logger::RequestLogger;
use routes::users::config_user_routes;
use shuttle_actix_web::ShuttleActixWeb;
use shuttle_runtime::SecretStore;
use std::sync::Arc;

#[shuttle_runtime::main]
async fn main(
    #[shuttle_runtime::Secrets] secrets: SecretStore,
) -> ShuttleActixWeb<impl FnOnce(&mut web::ServiceConfig) + Send + Clone + 'static> {
    info!("=== Rolegate Token Server Starting ===");

    // No traffic is served without a complete token configuration
    let options = match JwtOptions::from_secrets(&secrets) {
        Ok(options) => Arc::new(options),
        Err(e) => {
            error!("Invalid token configuration: {}", e);
            return Err(shuttle_runtime::Error::Custom(anyhow::anyhow!(
                "Invalid token configuration: {}",
                e
            )));
        }
    };
    info!(
        "Tokens issued by '{}' for '{}', valid {} hours",
        options.issuer,
        options.audience,
        options.validity.num_hours()
    );

    let directory = web::Data::new(UserDirectory::seeded());
    info!("User directory seeded with {} users", directory.list_all().len());

    let issuer = web::Data::new(TokenIssuer::new(
        directory.clone().into_inner(),
        options.clone(),
    ));
    let validator = web::Data::new(TokenValidator::new(options));

    let config = move |cfg: &mut web::ServiceConfig| {
        let cors = Cors::default()
            .allowed_origin_fn(|_origin, _req_head| true)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        cfg.app_data(directory);
        cfg.app_data(issuer);
        cfg.app_data(validator);
        cfg.service(
            web::scope("")
                .wrap(Logger::new("%t [%s] \"%r\" %b %D ms \"%{User-Agent}i\" %a"))
                .wrap(RequestLogger)
                .wrap(cors)
                .configure(config_user_routes)
                .route(
                    "/",
                    web::get().to(|| async {
                        HttpResponse::Ok().body("Welcome to the Rolegate token server")
                    }),
                ),
        );
    };

    Ok(config.into())
}
