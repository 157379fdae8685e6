use actix_web::{HttpResponse, Responder};
use serde_json::json;

pub async fn help_handler() -> impl Responder {
    let help = json!({
        "description": "API del grafo curricular. Abrir sesión con POST /session, luego leer GET /graph y marcar cursos Failed/Dropped antes de simular.",
        "session_example": {"student_id": "6410545541", "plan_id": 12, "access_token": "<token>"},
        "routes": {
            "POST /session": "abre sesión y carga plan + prerequisitos",
            "DELETE /session": "cierra la sesión",
            "POST /graph/load": "recarga el plan",
            "GET /graph": "vista con posiciones, colores, bandas y casillas",
            "POST /graph/scheme": {"scheme": "normal | group | time"},
            "POST /graph/focus": {"instance_id": "01418111-66-1"},
            "POST /graph/toggle-course": {"instance_id": "01418111-66-1", "kind": "Failed"},
            "POST /graph/toggle-semester": {"year_index": 0, "semester_index": 1},
            "POST /graph/simulate": "envía las marcas y muestra el plan simulado",
            "POST /graph/reset": "limpia marcas y recarga el plan original",
            "GET /open-plan": "tabla de cursos abiertos por semestre",
            "POST /open-plan/toggle": {"code": "01418111", "semester": 2, "checked": false}
        },
        "note": "Sólo los cursos sin nota (\"-\") se pueden marcar, y no después de simular. Un curso del plan abierto debe quedar abierto en al menos un semestre."
    });

    HttpResponse::Ok().json(help)
}
