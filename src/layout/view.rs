// Vista lista para dibujar: el UI sólo pinta lo que viene aquí.
use serde::Serialize;

use crate::algorithm::extract::CurriculumGraph;
use crate::algorithm::simulation::SimulationState;
use crate::layout::colors::{ColorContext, ColorScheme};
use crate::layout::focus::{edge_color, edge_visible, highlight_state, is_editable, node_fill, FocusState, Highlight};
use crate::layout::{LayoutConfig, Point};
use crate::models::{Color, CurriculumYear, InstanceId, MutationKind, Semester, YearLabel};

#[derive(Debug, Clone, Serialize)]
pub struct NodeView {
    pub id: InstanceId,
    pub code: String,
    pub name: String,
    pub grade: String,
    pub x: f64,
    pub y: f64,
    pub fill: Color,
    pub highlight: Highlight,
    pub editable: bool,
    pub mark: Option<MutationKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeView {
    pub source: InstanceId,
    pub target: InstanceId,
    pub from: Point,
    pub to: Point,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearBand {
    pub year: YearLabel,
    pub label: String,
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemesterBand {
    pub year_index: usize,
    pub semester: Semester,
    pub x: f64,
    pub width: f64,
    /// `None` cuando no se ofrece la casilla "Drop Semester".
    pub drop_checkbox: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphView {
    pub scheme: ColorScheme,
    pub simulated: bool,
    pub focused: Option<InstanceId>,
    pub node_width: f64,
    pub node_height: f64,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub years: Vec<YearBand>,
    pub semesters: Vec<SemesterBand>,
    pub height: f64,
}

pub fn year_label(year: YearLabel) -> String {
    format!("ปีการศึกษา 25{}", year)
}

pub fn build_view(
    years: &[CurriculumYear],
    graph: &CurriculumGraph,
    simulation: &SimulationState,
    focus: &FocusState,
    ctx: &ColorContext,
    config: &LayoutConfig,
) -> GraphView {
    let simulated = simulation.is_committed();

    let nodes = graph
        .nodes
        .iter()
        .map(|n| {
            let p = config.position(n);
            NodeView {
                id: n.instance_id.clone(),
                code: n.original_code.clone(),
                name: n.name.clone(),
                grade: n.grade.to_string(),
                x: p.x,
                y: p.y,
                fill: node_fill(n, focus, graph, ctx),
                highlight: highlight_state(n, focus, graph),
                editable: is_editable(n, simulated),
                mark: simulation.pending(&n.key()),
            }
        })
        .collect();

    let edges = graph
        .edges
        .iter()
        .filter(|e| edge_visible(e, focus))
        .filter_map(|e| {
            let source = graph.node(&e.source)?;
            let target = graph.node(&e.target)?;
            Some(EdgeView {
                source: e.source.clone(),
                target: e.target.clone(),
                from: config.source_anchor(source),
                to: config.target_anchor(target),
                color: edge_color(e, focus, graph, ctx)?,
            })
        })
        .collect();

    let mut year_bands = Vec::with_capacity(years.len());
    let mut semester_bands = Vec::with_capacity(years.len() * 2);
    for (year_index, year) in years.iter().enumerate() {
        year_bands.push(YearBand {
            year: year.year,
            label: year_label(year.year),
            x: year_index as f64 * config.unit_width * 4.0,
            width: config.unit_width * 4.0,
        });

        for semester in Semester::BOTH {
            let droppable = year.semester(semester).is_some_and(|s| s.droppable().next().is_some());
            let drop_checkbox = if droppable && !simulated {
                Some(simulation.is_semester_dropped(years, year_index, semester.index()))
            } else {
                None
            };
            semester_bands.push(SemesterBand {
                year_index,
                semester,
                x: (year_index * 2 + semester.index()) as f64 * config.unit_width * 2.0,
                width: config.unit_width * 2.0,
                drop_checkbox,
            });
        }
    }

    GraphView {
        scheme: ctx.scheme,
        simulated,
        focused: focus.focused().cloned(),
        node_width: config.unit_width,
        node_height: config.unit_height,
        nodes,
        edges,
        years: year_bands,
        semesters: semester_bands,
        height: config.canvas_height(&graph.nodes),
    }
}

impl GraphView {
    pub fn node(&self, id: &InstanceId) -> Option<&NodeView> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn dimmed(&self) -> impl Iterator<Item = &NodeView> {
        self.nodes.iter().filter(|n| n.highlight == Highlight::Dimmed)
    }
}
