use actix_web::web;

use crate::web::handlers::{
  courier_handlers, delivery_handlers, order_handlers, payment_handlers, variant_handlers,
};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Called from main.rs to configure services for the Actix App.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      // Health Check Route
      .route("/health", web::get().to(health_check_handler))
      // Order Routes
      .service(
        web::scope("/orders")
          .route("/checkout", web::post().to(order_handlers::checkout_handler))
          .route("/{order_id}/pay", web::post().to(order_handlers::pay_order_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler)),
      )
      // Payment Routes
      .service(
        web::scope("/payments")
          .route("/webhook", web::post().to(payment_handlers::webhook_handler))
          .route("/{order_id}/create", web::post().to(payment_handlers::create_intent_handler)),
      )
      // Courier Routes
      .service(
        web::scope("/couriers")
          .route("", web::post().to(courier_handlers::register_handler))
          .route("", web::get().to(courier_handlers::list_all_handler))
          .route("/available", web::get().to(courier_handlers::list_available_handler))
          .route("/{courier_id}", web::put().to(courier_handlers::update_handler))
          .route("/{courier_id}/location", web::post().to(courier_handlers::update_location_handler))
          .route(
            "/{courier_id}/availability",
            web::post().to(courier_handlers::set_availability_handler),
          ),
      )
      // Delivery / Dispatch Routes
      .service(
        web::scope("/deliveries")
          .route("/order/{order_id}", web::get().to(delivery_handlers::get_delivery_handler))
          .route("/{order_id}/assign", web::post().to(delivery_handlers::assign_handler))
          .route("/{order_id}/status", web::post().to(delivery_handlers::update_status_handler)),
      )
      // Catalog read interface
      .service(
        web::scope("/variants")
          .route("/{variant_id}", web::get().to(variant_handlers::get_variant_handler)),
      ),
  );
}
