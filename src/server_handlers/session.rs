use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::models::IdentityContext;
use crate::server_handlers::error_response;
use crate::service::PlanService;

/// POST /session
/// Abre la sesión con la identidad recibida y carga el plan. Si la carga
/// falla la sesión queda abierta (se puede reintentar con /graph/load).
pub async fn start_session_handler(service: web::Data<PlanService>, body: web::Json<IdentityContext>) -> impl Responder {
    let identity = body.into_inner();
    if identity.student_id.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({"error": "student_id is required"}));
    }

    match service.start_session(identity).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": "ok", "outcome": outcome})),
        Err(e) => error_response(&e),
    }
}

/// DELETE /session
pub async fn end_session_handler(service: web::Data<PlanService>) -> impl Responder {
    service.end_session().await;
    HttpResponse::Ok().json(json!({"status": "ok"}))
}
