// Foco de un nodo: resalta el nodo, sus vecinos directos y las aristas que lo tocan.
use serde::Serialize;

use crate::algorithm::extract::CurriculumGraph;
use crate::layout::colors::ColorContext;
use crate::models::{Color, CourseInstanceNode, InstanceId, PrerequisiteEdge};

pub const FOCUS_COLOR: &str = "#FFD700";
pub const DIMMED_COLOR: &str = "#D3D3D3";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FocusState {
    focused: Option<InstanceId>,
}

impl FocusState {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<&InstanceId> {
        self.focused.as_ref()
    }

    /// Click sobre el nodo enfocado lo desenfoca; sobre otro cambia el foco.
    pub fn click(&mut self, id: InstanceId) {
        if self.focused.as_ref() == Some(&id) {
            self.focused = None;
        } else {
            self.focused = Some(id);
        }
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }

    /// Si el nodo enfocado ya no existe tras regenerar el grafo se suelta el foco.
    pub fn retain_in(&mut self, graph: &CurriculumGraph) {
        if let Some(id) = &self.focused {
            if !graph.contains(id) {
                self.focused = None;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Highlight {
    Focused,
    Related,
    Dimmed,
    Normal,
}

pub fn highlight_state(node: &CourseInstanceNode, focus: &FocusState, graph: &CurriculumGraph) -> Highlight {
    match focus.focused() {
        None => Highlight::Normal,
        Some(f) if f == &node.instance_id => Highlight::Focused,
        Some(f) if graph.is_related(f, &node.instance_id) => Highlight::Related,
        Some(_) => Highlight::Dimmed,
    }
}

/// Sin foco no se dibuja ninguna arista.
pub fn edge_visible(edge: &PrerequisiteEdge, focus: &FocusState) -> bool {
    focus.focused().is_some_and(|f| edge.touches(f))
}

/// Color del extremo no enfocado, bajo el esquema activo.
pub fn edge_color(
    edge: &PrerequisiteEdge,
    focus: &FocusState,
    graph: &CurriculumGraph,
    ctx: &ColorContext,
) -> Option<Color> {
    let focused = focus.focused()?;
    let other = edge.other_end(focused)?;
    graph.node(other).map(|n| ctx.color_of(n))
}

pub fn node_fill(node: &CourseInstanceNode, focus: &FocusState, graph: &CurriculumGraph, ctx: &ColorContext) -> Color {
    match highlight_state(node, focus, graph) {
        Highlight::Focused => Color::new(FOCUS_COLOR),
        Highlight::Dimmed => Color::new(DIMMED_COLOR),
        Highlight::Related | Highlight::Normal => ctx.color_of(node),
    }
}

/// Sólo los cursos sin nota, y nunca con una simulación ya aplicada.
pub fn is_editable(node: &CourseInstanceNode, simulated: bool) -> bool {
    node.grade.is_ungraded() && !simulated
}
