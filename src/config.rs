// Configuración del servicio: `.env` (si existe) y luego variables de entorno.
use std::env;
use std::time::Duration;

use crate::layout::LayoutConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_url: String,
    pub bind: String,
    pub layout: LayoutConfig,
    pub http_timeout: Duration,
    /// Semilla fija para los pasteles generados (colores reproducibles).
    pub color_seed: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api_url: DEFAULT_API_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            layout: LayoutConfig::default(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            color_seed: None,
        }
    }
}

// load .env if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Valores ausentes o que no parsean se quedan en el default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let text = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let number = |key: &str, fallback: f64| {
            text(key).and_then(|v| v.parse::<f64>().ok()).filter(|v| *v > 0.0).unwrap_or(fallback)
        };

        AppConfig {
            api_url: text("EDUPLAN_API_URL").unwrap_or(defaults.api_url),
            bind: text("EDUPLAN_BIND").unwrap_or(defaults.bind),
            layout: LayoutConfig {
                unit_width: number("EDUPLAN_NODE_WIDTH", defaults.layout.unit_width),
                unit_height: number("EDUPLAN_NODE_HEIGHT", defaults.layout.unit_height),
                band_offset: number("EDUPLAN_BAND_OFFSET", defaults.layout.band_offset),
            },
            http_timeout: text("EDUPLAN_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            color_seed: text("EDUPLAN_COLOR_SEED").and_then(|v| v.parse::<u64>().ok()),
        }
    }
}
