use actix_web::HttpResponse;
use serde::Serialize;
use serde_json::json;

pub mod document;
pub mod holiday;
pub mod notification;
pub mod organization;
pub mod performance;
pub mod policy;
pub mod settings;

/// `{success: true, data}` envelope.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

/// `{success: true, message}` envelope.
pub fn ok_message(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "message": message }))
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
    HttpResponse::Created().json(json!({
        "success": true,
        "message": message,
        "data": data,
    }))
}
