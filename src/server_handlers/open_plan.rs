use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::models::Semester;
use crate::server_handlers::error_response;
use crate::service::PlanService;

#[derive(Debug, Deserialize)]
pub struct OpenPlanToggleRequest {
    pub code: String,
    pub semester: Semester,
    pub checked: bool,
}

/// GET /open-plan
pub async fn open_plan_handler(service: web::Data<PlanService>) -> impl Responder {
    match service.fetch_open_plan().await {
        Ok(table) => HttpResponse::Ok().json(table),
        Err(e) => error_response(&e),
    }
}

/// POST /open-plan/toggle
/// Si la API rechaza el cambio la fila vuelve a su estado previo y se
/// devuelve el error.
pub async fn open_plan_toggle_handler(service: web::Data<PlanService>, body: web::Json<OpenPlanToggleRequest>) -> impl Responder {
    let req = body.into_inner();
    match service.toggle_open_plan(&req.code, req.semester, req.checked).await {
        Ok(table) => HttpResponse::Ok().json(table),
        Err(e) => error_response(&e),
    }
}
