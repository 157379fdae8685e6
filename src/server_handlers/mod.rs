pub mod session;
pub mod graph;
pub mod open_plan;
pub mod docs;

pub use session::*;
pub use graph::*;
pub use open_plan::*;
pub use docs::*;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::EngineError;

/// Traduce un error del motor a la respuesta HTTP correspondiente.
pub fn error_response(e: &EngineError) -> HttpResponse {
    let body = json!({"error": e.to_string()});
    match e {
        EngineError::NoSession => HttpResponse::Unauthorized().json(body),
        EngineError::UnknownInstance(_) | EngineError::UnknownCourse(_) => HttpResponse::NotFound().json(body),
        // advertencia bloqueante: el UI muestra el mensaje tal cual
        EngineError::Guard(g) => HttpResponse::Conflict().json(json!({"error": g.message, "course": g.course_code, "warning": true})),
        EngineError::SubmissionPending => HttpResponse::Conflict().json(body),
        EngineError::Collaborator(_) => HttpResponse::BadGateway().json(body),
        EngineError::MalformedDocument(_)
        | EngineError::NotEditable(_)
        | EngineError::NoSuchSemester { .. }
        | EngineError::NothingToSimulate => HttpResponse::BadRequest().json(body),
    }
}
