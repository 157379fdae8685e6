use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::algorithm::resolver::{resolve_edges, InstanceIndex};
use crate::models::{
    Color, CourseInstanceNode, CurriculumYear, InstanceId, PrerequisiteEdge, PrerequisiteRelation, Semester,
};

/// Grafo derivado del documento: nodos por instancia y aristas de
/// prerequisito. Se regenera completo ante cualquier cambio, nunca se parchea.
#[derive(Debug, Clone, Default)]
pub struct CurriculumGraph {
    pub nodes: Vec<CourseInstanceNode>,
    pub edges: Vec<PrerequisiteEdge>,
    graph: DiGraph<usize, usize>,
    by_id: HashMap<InstanceId, NodeIndex>,
    index: InstanceIndex,
}

impl CurriculumGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &InstanceId) -> Option<&CourseInstanceNode> {
        self.by_id.get(id).map(|idx| &self.nodes[self.graph[*idx]])
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Instancias de un código en orden (año, semestre).
    pub fn instances_of(&self, code: &str) -> Vec<&CourseInstanceNode> {
        self.index.instances(code).iter().filter_map(|slot| self.node(&slot.id)).collect()
    }

    /// True si hay una arista entre `a` y `b` en cualquier sentido.
    pub fn is_related(&self, a: &InstanceId, b: &InstanceId) -> bool {
        match (self.by_id.get(a), self.by_id.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge_undirected(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Vecinos directos (entrantes y salientes) de una instancia.
    pub fn related_ids(&self, id: &InstanceId) -> Vec<&InstanceId> {
        let Some(&idx) = self.by_id.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<&InstanceId> = self
            .graph
            .neighbors_undirected(idx)
            .map(|n| &self.nodes[self.graph[n]].instance_id)
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn edges_touching<'a>(&'a self, id: &'a InstanceId) -> impl Iterator<Item = &'a PrerequisiteEdge> + 'a {
        self.edges.iter().filter(move |e| e.touches(id))
    }
}

/// Recorre años → semestre 1, 2 → asignaturas y genera un nodo por instancia.
/// Luego resuelve las aristas con el índice construido en el mismo recorrido.
///
/// `palette` es el color por columna (`level`); si se queda corta se usa blanco.
pub fn extract_graph(
    years: &[CurriculumYear],
    relations: &[PrerequisiteRelation],
    palette: &[Color],
) -> CurriculumGraph {
    let mut nodes: Vec<CourseInstanceNode> = Vec::new();
    let mut index = InstanceIndex::new();
    let mut graph: DiGraph<usize, usize> = DiGraph::new();
    let mut by_id: HashMap<InstanceId, NodeIndex> = HashMap::new();

    for (year_index, year) in years.iter().enumerate() {
        if year.semesters.is_empty() {
            warn!(year = %year.year, "year has no semesters, skipping");
            continue;
        }

        for semester in Semester::BOTH {
            let level = year_index * 2 + semester.index();
            // un slot ausente o vacío no aporta nodos pero conserva el nivel
            let Some(slot) = year.semester(semester) else { continue };

            for (layer, subject) in slot.subjects.iter().enumerate() {
                let instance_id = InstanceId::new(&subject.code, year.year, semester);
                if by_id.contains_key(&instance_id) {
                    // mismo código dos veces en el mismo semestre: se queda el primero
                    warn!(id = %instance_id, "duplicated course instance in one semester");
                    continue;
                }
                by_id.insert(instance_id.clone(), graph.add_node(nodes.len()));
                index.insert(&subject.code, instance_id.clone(), year.year, semester);

                nodes.push(CourseInstanceNode {
                    instance_id,
                    original_code: subject.code.clone(),
                    name: subject.name.clone(),
                    level,
                    layer,
                    color: palette.get(level).cloned().unwrap_or_else(Color::white),
                    grade: subject.grade.clone(),
                    group: subject.group.clone(),
                    year: year.year,
                    semester,
                });
            }
        }
    }

    let edges = resolve_edges(&index, relations);

    for (pos, edge) in edges.iter().enumerate() {
        if let (Some(&from), Some(&to)) = (by_id.get(&edge.source), by_id.get(&edge.target)) {
            if graph.find_edge(from, to).is_none() {
                graph.add_edge(from, to, pos);
            }
        }
    }

    debug!(nodes = nodes.len(), edges = edges.len(), codes = index.codes(), "curriculum graph extracted");

    CurriculumGraph { nodes, edges, graph, by_id, index }
}
