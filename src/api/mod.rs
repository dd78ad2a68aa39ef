// ============================================================================
// HTTP API - thin actix-web adapter over OrderService
// ============================================================================
//
//   POST  /orders                               create (201)
//   GET   /orders/{id}                          fetch
//   POST  /orders/{orderId}/assign/{deliveryId} assign a courier
//   PATCH /orders/{id}/status                   {"status": "..."}
//   PATCH /orders/{id}/tracking                 courier location
//
// An optional `x-timeout-ms` header overrides the operation timeout.
//
// ============================================================================

mod errors;
mod handlers;

use actix_web::{error::JsonPayloadError, web, App, HttpRequest, HttpServer};

use crate::domain::order::{OrderError, OrderService};

pub use errors::ErrorBody;

pub const TIMEOUT_HEADER: &str = "x-timeout-ms";

/// Registers the order routes and the JSON error handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .service(
            web::scope("/orders")
                .route("", web::post().to(handlers::create_order))
                .route("/{id}", web::get().to(handlers::get_order))
                .route("/{order_id}/assign/{delivery_id}", web::post().to(handlers::assign_delivery))
                .route("/{id}/status", web::patch().to(handlers::update_status))
                .route("/{id}/tracking", web::patch().to(handlers::record_location)),
        );
}

fn json_error(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    OrderError::ValidationFailed(error.to_string()).into()
}

/// Start the order API server
pub async fn start_api_server(service: OrderService, host: String, port: u16) -> std::io::Result<()> {
    tracing::info!("🚀 Starting order API on http://{}:{}/orders", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(service.clone()))
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
