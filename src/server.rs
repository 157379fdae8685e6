use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use tracing::info;

use crate::client::HttpGradingApi;
use crate::config::AppConfig;
use crate::server_handlers::{
    end_session_handler, focus_handler, help_handler, load_handler, open_plan_handler, open_plan_toggle_handler,
    reset_handler, scheme_handler, simulate_handler, start_session_handler, toggle_course_handler, toggle_semester_handler,
    view_handler,
};
use crate::service::PlanService;
use crate::store::CurriculumStore;

/// Registra las rutas sobre un `App`; compartido con los tests de integración.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/session", web::post().to(start_session_handler))
        .route("/session", web::delete().to(end_session_handler))
        .route("/graph/load", web::post().to(load_handler))
        .route("/graph", web::get().to(view_handler))
        .route("/graph/scheme", web::post().to(scheme_handler))
        .route("/graph/focus", web::post().to(focus_handler))
        .route("/graph/toggle-course", web::post().to(toggle_course_handler))
        .route("/graph/toggle-semester", web::post().to(toggle_semester_handler))
        .route("/graph/simulate", web::post().to(simulate_handler))
        .route("/graph/reset", web::post().to(reset_handler))
        .route("/open-plan", web::get().to(open_plan_handler))
        .route("/open-plan/toggle", web::post().to(open_plan_toggle_handler))
        .route("/help", web::get().to(help_handler));
}

pub fn build_service(config: &AppConfig) -> std::io::Result<PlanService> {
    let api = HttpGradingApi::new(&config.api_url, config.http_timeout).map_err(std::io::Error::other)?;
    let api = Arc::new(api);
    let store = CurriculumStore::new(config.layout, config.color_seed);
    Ok(PlanService::new(store, api.clone(), api.clone(), api))
}

pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let service = web::Data::new(build_service(&config)?);
    info!(bind = %config.bind, api = %config.api_url, "starting HTTP server");

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(service.clone())
            .configure(configure)
    })
    .bind(&config.bind)?
    .run()
    .await
}
