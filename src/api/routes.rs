// API route configuration

use crate::api::error::ApiError;
use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Malformed JSON bodies answer in the same envelope as every other 400
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            ApiError::bad_request(format!("invalid JSON body: {err}")).into()
        }))
        .route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api")
                .route("/movies/upload", web::post().to(handlers::upload_movies))
                .service(
                    web::resource("/movies")
                        .route(web::get().to(handlers::list_movies))
                        .route(web::post().to(handlers::upsert_movies))
                        .route(web::put().to(handlers::upsert_movies))
                        .default_service(web::to(handlers::method_not_allowed)),
                )
                .route(
                    "/producers/intervals",
                    web::get().to(handlers::producer_intervals),
                )
                .service(
                    web::resource("/producers")
                        .route(web::get().to(handlers::list_all_producers))
                        .default_service(web::to(handlers::method_not_allowed)),
                ),
        );
}
