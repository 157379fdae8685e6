// Biblioteca raíz del crate `eduplan`.
// Motor del grafo curricular (modelo, prerequisitos, extracción, simulación,
// layout) más el store de sesión, los colaboradores remotos y el servidor HTTP.
pub mod models;
pub mod error;
pub mod algorithm;
pub mod layout;
pub mod api_json;
pub mod client;
pub mod config;
pub mod store;
pub mod service;
pub mod server;
pub mod server_handlers;

/// Ejecuta el servidor HTTP (reexport para facilitar uso desde `main`)
pub use server::run_server;
pub use config::AppConfig;
pub use error::{EngineError, Result};
pub use service::PlanService;
pub use store::CurriculumStore;
