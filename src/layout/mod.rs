// Geometría del lienzo: posición de cada nodo a partir de (level, layer) y
// puntos de anclaje de las aristas. Colores, foco y vista en submódulos.
pub mod colors;
pub mod focus;
pub mod view;

use serde::{Deserialize, Serialize};

use crate::models::CourseInstanceNode;

pub use colors::{
    current_academic_year, generate_pastel, group_palette, semester_palette, ColorContext, ColorScheme, TimeStatus,
};
pub use focus::{edge_color, edge_visible, highlight_state, is_editable, node_fill, FocusState, Highlight};
pub use view::{build_view, EdgeView, GraphView, NodeView, SemesterBand, YearBand};

/// Separación vertical entre filas, en múltiplos de la altura del nodo.
pub const ROW_SPACING: f64 = 1.75;

/// Altura mínima del lienzo cuando no hay nodos.
pub const EMPTY_CANVAS_HEIGHT: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub unit_width: f64,
    pub unit_height: f64,
    /// Desplazamiento vertical bajo las bandas de año/semestre.
    pub band_offset: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig { unit_width: 150.0, unit_height: 80.0, band_offset: 150.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl LayoutConfig {
    /// Esquina superior izquierda del nodo.
    pub fn position(&self, node: &CourseInstanceNode) -> Point {
        Point {
            x: node.level as f64 * self.unit_width * 2.0 + self.unit_width / 2.0,
            y: node.layer as f64 * self.unit_height * ROW_SPACING + self.band_offset,
        }
    }

    /// Lado derecho, a media altura.
    pub fn source_anchor(&self, node: &CourseInstanceNode) -> Point {
        let p = self.position(node);
        Point { x: p.x + self.unit_width, y: p.y + self.unit_height / 2.0 }
    }

    /// Lado izquierdo, a media altura.
    pub fn target_anchor(&self, node: &CourseInstanceNode) -> Point {
        let p = self.position(node);
        Point { x: p.x, y: p.y + self.unit_height / 2.0 }
    }

    pub fn canvas_height<'a>(&self, nodes: impl IntoIterator<Item = &'a CourseInstanceNode>) -> f64 {
        nodes
            .into_iter()
            .map(|n| self.position(n).y + self.unit_height + 50.0)
            .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |m| m.max(y))))
            .unwrap_or(EMPTY_CANVAS_HEIGHT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Grade, InstanceId, Semester, YearLabel};

    fn node(level: usize, layer: usize) -> CourseInstanceNode {
        CourseInstanceNode {
            instance_id: InstanceId::from("X-66-1"),
            original_code: "X".to_string(),
            name: "X".to_string(),
            level,
            layer,
            color: Color::white(),
            grade: Grade::Ungraded,
            group: None,
            year: YearLabel::new(66),
            semester: Semester::First,
        }
    }

    #[test]
    fn test_position_formula() {
        let cfg = LayoutConfig::default();
        assert_eq!(cfg.position(&node(0, 0)), Point { x: 75.0, y: 150.0 });
        assert_eq!(cfg.position(&node(3, 2)), Point { x: 975.0, y: 430.0 });
    }

    #[test]
    fn test_anchors() {
        let cfg = LayoutConfig::default();
        let n = node(1, 0);
        assert_eq!(cfg.source_anchor(&n), Point { x: 525.0, y: 190.0 });
        assert_eq!(cfg.target_anchor(&n), Point { x: 375.0, y: 190.0 });
    }

    #[test]
    fn test_canvas_height() {
        let cfg = LayoutConfig::default();
        assert_eq!(cfg.canvas_height(&[]), EMPTY_CANVAS_HEIGHT);
        let nodes = vec![node(0, 0), node(0, 1)];
        assert_eq!(cfg.canvas_height(&nodes), 150.0 + 140.0 + 80.0 + 50.0);
    }
}
