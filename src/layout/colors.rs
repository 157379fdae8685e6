//! Esquemas de color de los nodos.
//!
//! - `Semester` ("normal"): un color por columna, nueve pasteles fijos y luego
//!   pasteles generados de a dos.
//! - `Group`: un pastel generado por grupo de asignatura.
//! - `Time`: pasado / presente / futuro respecto del año académico actual.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::{Color, CourseInstanceNode, YearLabel};

pub const BASE_PALETTE: [&str; 9] = [
    "#DDFFF6", "#D6F1FF", "#CCC9FF", "#EFD3FF", "#FFB4CF", "#BAF8FD", "#FFD7AF", "#EAD1DC", "#C3CB6E",
];

pub const PAST_COLOR: &str = "#D7F4E3";
pub const PRESENT_COLOR: &str = "#F3E8D9";
pub const FUTURE_COLOR: &str = "#FFE8E6";

const PASTEL_SATURATION: u32 = 70;
const PASTEL_LIGHTNESS: u32 = 85;
// distancia mínima de tono frente a los pasteles ya generados
const MIN_HUE_GAP: u32 = 12;
const MAX_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    #[default]
    #[serde(rename = "normal")]
    Semester,
    #[serde(rename = "group")]
    Group,
    #[serde(rename = "time")]
    Time,
}

fn pastel(hue: u32) -> Color {
    Color(format!("hsl({}, {}%, {}%)", hue, PASTEL_SATURATION, PASTEL_LIGHTNESS))
}

fn hue_of(color: &Color) -> Option<u32> {
    let inner = color.as_str().strip_prefix("hsl(")?;
    inner.split(',').next()?.trim().parse::<u32>().ok()
}

fn hue_distance(a: u32, b: u32) -> u32 {
    let d = a.abs_diff(b) % 360;
    d.min(360 - d)
}

/// Genera un pastel `hsl(h, 70%, 85%)` que no esté en `existing` ni demasiado
/// cerca en tono de otro pastel generado. Tras `MAX_ATTEMPTS` intentos acepta
/// el primer tono libre; sólo repite color si los 360 tonos están usados.
pub fn generate_pastel<R: Rng>(existing: &[Color], rng: &mut R) -> Color {
    let used: Vec<u32> = existing.iter().filter_map(hue_of).collect();

    for _ in 0..MAX_ATTEMPTS {
        let hue = rng.gen_range(0..360);
        if used.iter().all(|&h| hue_distance(h, hue) >= MIN_HUE_GAP) {
            return pastel(hue);
        }
    }

    match (0..360).find(|h| !used.contains(h)) {
        Some(hue) => pastel(hue),
        None => pastel(rng.gen_range(0..360)),
    }
}

/// Paleta por columna: al menos `num_years * 2` colores.
pub fn semester_palette<R: Rng>(num_years: usize, rng: &mut R) -> Vec<Color> {
    let mut colors: Vec<Color> = BASE_PALETTE.iter().map(|c| Color::new(c)).collect();
    while colors.len() < num_years * 2 {
        for _ in 0..2 {
            let next = generate_pastel(&colors, rng);
            colors.push(next);
        }
    }
    colors
}

/// Un color por grupo distinto, en orden de primera aparición.
pub fn group_palette<'a, R: Rng>(groups: impl IntoIterator<Item = &'a str>, rng: &mut R) -> HashMap<String, Color> {
    let mut out: HashMap<String, Color> = HashMap::new();
    let mut taken: Vec<Color> = Vec::new();
    for group in groups {
        if out.contains_key(group) {
            continue;
        }
        let color = generate_pastel(&taken, rng);
        taken.push(color.clone());
        out.insert(group.to_string(), color);
    }
    out
}

/// Año académico (dos dígitos de la era budista) de una fecha gregoriana.
pub fn current_academic_year(today: NaiveDate) -> YearLabel {
    let buddhist = today.year() + 543 - 1;
    YearLabel::new(buddhist.rem_euclid(100) as u16)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeStatus {
    Past,
    Present,
    Future,
}

impl TimeStatus {
    pub fn of(year: YearLabel, current: YearLabel) -> TimeStatus {
        match year.cmp(&current) {
            std::cmp::Ordering::Less => TimeStatus::Past,
            std::cmp::Ordering::Equal => TimeStatus::Present,
            std::cmp::Ordering::Greater => TimeStatus::Future,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            TimeStatus::Past => Color::new(PAST_COLOR),
            TimeStatus::Present => Color::new(PRESENT_COLOR),
            TimeStatus::Future => Color::new(FUTURE_COLOR),
        }
    }
}

/// Lo que hace falta para colorear un nodo bajo el esquema activo.
#[derive(Debug, Clone)]
pub struct ColorContext {
    pub scheme: ColorScheme,
    pub groups: HashMap<String, Color>,
    pub current_year: YearLabel,
}

impl ColorContext {
    pub fn new(scheme: ColorScheme, groups: HashMap<String, Color>, current_year: YearLabel) -> Self {
        ColorContext { scheme, groups, current_year }
    }

    pub fn color_of(&self, node: &CourseInstanceNode) -> Color {
        match self.scheme {
            ColorScheme::Semester => node.color.clone(),
            ColorScheme::Group => node
                .group
                .as_ref()
                .and_then(|g| self.groups.get(g))
                .cloned()
                .unwrap_or_else(Color::white),
            ColorScheme::Time => TimeStatus::of(node.year, self.current_year).color(),
        }
    }
}
