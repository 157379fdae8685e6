use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use crate::layout::colors::ColorScheme;
use crate::models::{InstanceId, MutationKind};
use crate::server_handlers::error_response;
use crate::service::PlanService;

#[derive(Debug, Deserialize)]
pub struct SchemeRequest {
    pub scheme: ColorScheme,
}

#[derive(Debug, Deserialize)]
pub struct FocusRequest {
    /// `null` suelta el foco.
    pub instance_id: Option<InstanceId>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleCourseRequest {
    pub instance_id: InstanceId,
    pub kind: MutationKind,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSemesterRequest {
    pub year_index: usize,
    pub semester_index: usize,
}

/// POST /graph/load
pub async fn load_handler(service: web::Data<PlanService>) -> impl Responder {
    match service.load().await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": "ok", "outcome": outcome})),
        Err(e) => error_response(&e),
    }
}

/// GET /graph
pub async fn view_handler(service: web::Data<PlanService>) -> impl Responder {
    match service.view().await {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}

/// POST /graph/scheme
pub async fn scheme_handler(service: web::Data<PlanService>, body: web::Json<SchemeRequest>) -> impl Responder {
    let scheme = body.into_inner().scheme;
    match service.set_scheme(scheme).await {
        Ok(()) => HttpResponse::Ok().json(json!({"status": "ok", "scheme": scheme})),
        Err(e) => error_response(&e),
    }
}

/// POST /graph/focus
pub async fn focus_handler(service: web::Data<PlanService>, body: web::Json<FocusRequest>) -> impl Responder {
    match body.into_inner().instance_id {
        None => {
            service.clear_focus().await;
            HttpResponse::Ok().json(json!({"focused": null}))
        }
        Some(id) => match service.click(id).await {
            Ok(focused) => HttpResponse::Ok().json(json!({"focused": focused})),
            Err(e) => error_response(&e),
        },
    }
}

/// POST /graph/toggle-course
pub async fn toggle_course_handler(service: web::Data<PlanService>, body: web::Json<ToggleCourseRequest>) -> impl Responder {
    let req = body.into_inner();
    match service.toggle_course(&req.instance_id, req.kind).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": "ok", "outcome": outcome})),
        Err(e) => error_response(&e),
    }
}

/// POST /graph/toggle-semester
pub async fn toggle_semester_handler(service: web::Data<PlanService>, body: web::Json<ToggleSemesterRequest>) -> impl Responder {
    let req = body.into_inner();
    match service.toggle_semester(req.year_index, req.semester_index).await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": "ok", "outcome": outcome})),
        Err(e) => error_response(&e),
    }
}

/// POST /graph/simulate
pub async fn simulate_handler(service: web::Data<PlanService>) -> impl Responder {
    match service.simulate().await {
        Ok(report) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "outcome": report.outcome,
            "submitted": report.payload.courses,
            "desynced": report.payload.desynced.iter().map(|k| k.instance_id()).collect::<Vec<_>>(),
        })),
        Err(e) => error_response(&e),
    }
}

/// POST /graph/reset
pub async fn reset_handler(service: web::Data<PlanService>) -> impl Responder {
    match service.reset().await {
        Ok(outcome) => HttpResponse::Ok().json(json!({"status": "ok", "outcome": outcome})),
        Err(e) => error_response(&e),
    }
}
