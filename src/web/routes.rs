use actix_web::{http::Method, middleware::from_fn, web};

use crate::web::{cors, handlers};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api").wrap(from_fn(cors::cors)).service(
            web::resource("/chat")
                .route(web::post().to(handlers::chat))
                .route(web::method(Method::OPTIONS).to(handlers::preflight))
                .default_service(web::to(handlers::method_not_allowed)),
        ),
    )
    .route("/health", web::get().to(handlers::health_check));
}
