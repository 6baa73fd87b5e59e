use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde_json::json;

use crate::error::RelayError;
use crate::web::models::{ChatReply, ChatRequest};
use crate::AppState;

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// CORS preflight, headers come from the middleware
pub async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed().body("Only POST allowed")
}

// Chat API endpoint
//
// The body is decoded by hand rather than through `web::Json` so that a bad
// payload gets the same `500 {"error": ...}` shape as every other failure and
// the Content-Type header is not enforced.
pub async fn chat(
    data: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, RelayError> {
    let req: ChatRequest = serde_json::from_slice(&body).map_err(RelayError::InvalidJson)?;
    info!("Chat request: {} characters", req.message.len());

    let reply = data.relay.chat(&req.message).await?;

    Ok(HttpResponse::Ok().json(ChatReply { reply }))
}
