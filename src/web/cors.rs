use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN, VARY,
};
use actix_web::middleware::Next;
use actix_web::{web, Error};
use log::debug;

use crate::AppState;

const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization";

/// Adds CORS headers to every response. The requesting origin is echoed back
/// only when it is on the allow-list; any other origin gets no
/// `Access-Control-Allow-Origin` and is left for the browser to block.
pub async fn cors(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let origin = req.headers().get(ORIGIN).cloned();
    let allowed = match (&origin, req.app_data::<web::Data<AppState>>()) {
        (Some(origin), Some(state)) => is_allowed(&state.allowed_origins, origin),
        _ => false,
    };
    if let (Some(origin), false) = (&origin, allowed) {
        debug!("Origin {:?} is not on the allow-list", origin);
    }

    let mut res = next.call(req).await?;

    let headers = res.headers_mut();
    if let (Some(origin), true) = (origin, allowed) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(VARY, HeaderValue::from_static("Origin"));
    }
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    Ok(res)
}

// Exact match only, no wildcards or suffix matching.
fn is_allowed(allowed: &[String], origin: &HeaderValue) -> bool {
    match origin.to_str() {
        Ok(origin) => allowed.iter().any(|o| o == origin),
        Err(_) => false,
    }
}
