// Resolución de prerequisitos: de relaciones entre cursos abstractos a aristas
// entre instancias concretas (curso, año, semestre).
use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::models::{InstanceId, PrerequisiteEdge, PrerequisiteRelation, Semester, YearLabel};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSlot {
    pub id: InstanceId,
    pub year: YearLabel,
    pub semester: Semester,
}

impl InstanceSlot {
    fn when(&self) -> (YearLabel, Semester) {
        (self.year, self.semester)
    }
}

/// Índice código → instancias, en orden de inserción (orden del documento).
#[derive(Debug, Clone, Default)]
pub struct InstanceIndex {
    by_code: HashMap<String, Vec<InstanceSlot>>,
}

impl InstanceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: &str, id: InstanceId, year: YearLabel, semester: Semester) {
        self.by_code.entry(code.to_string()).or_default().push(InstanceSlot { id, year, semester });
    }

    /// Instancias de un código; vacío si el curso no está en el plan.
    pub fn instances(&self, code: &str) -> &[InstanceSlot] {
        self.by_code.get(code).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn codes(&self) -> usize {
        self.by_code.len()
    }
}

/// Colapsa relaciones repetidas (mismo par prerequisito/actual). Se queda con
/// la primera y mantiene el orden.
pub fn dedup_relations(relations: &[PrerequisiteRelation]) -> Vec<PrerequisiteRelation> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut out = Vec::with_capacity(relations.len());
    for r in relations {
        if seen.insert((r.prerequisite.id.as_str(), r.current.id.as_str())) {
            out.push(r.clone());
        }
    }
    out
}

/// Expande cada relación al producto cartesiano de instancias, quedándose
/// sólo con los pares donde el destino es estrictamente posterior al origen.
pub fn resolve_edges(index: &InstanceIndex, relations: &[PrerequisiteRelation]) -> Vec<PrerequisiteEdge> {
    let mut edges = Vec::new();

    for relation in dedup_relations(relations) {
        let sources = index.instances(&relation.prerequisite.id);
        let targets = index.instances(&relation.current.id);

        if sources.is_empty() || targets.is_empty() {
            trace!(
                prerequisite = %relation.prerequisite.id,
                current = %relation.current.id,
                "relation without instances in plan"
            );
            continue;
        }

        for source in sources {
            for target in targets {
                if target.when() > source.when() {
                    edges.push(PrerequisiteEdge {
                        source: source.id.clone(),
                        target: target.id.clone(),
                        original_source: relation.prerequisite.id.clone(),
                        original_target: relation.current.id.clone(),
                    });
                }
            }
        }
    }

    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(index: &mut InstanceIndex, code: &str, year: u16, sem: Semester) -> InstanceId {
        let id = InstanceId::new(code, YearLabel::new(year), sem);
        index.insert(code, id.clone(), YearLabel::new(year), sem);
        id
    }

    #[test]
    fn test_edges_only_flow_forward() {
        let mut index = InstanceIndex::new();
        let a1 = slot(&mut index, "A", 65, Semester::First);
        let _b0 = slot(&mut index, "B", 65, Semester::First);
        let b1 = slot(&mut index, "B", 65, Semester::Second);
        let b2 = slot(&mut index, "B", 66, Semester::First);

        let edges = resolve_edges(&index, &[PrerequisiteRelation::between("A", "B")]);
        let targets: Vec<&InstanceId> = edges.iter().map(|e| &e.target).collect();
        assert_eq!(targets, vec![&b1, &b2]);
        assert!(edges.iter().all(|e| e.source == a1));
    }

    #[test]
    fn test_duplicate_relations_collapse() {
        let mut index = InstanceIndex::new();
        slot(&mut index, "A", 65, Semester::First);
        slot(&mut index, "B", 65, Semester::Second);

        let rel = PrerequisiteRelation::between("A", "B");
        let edges = resolve_edges(&index, &[rel.clone(), rel.clone(), rel]);
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_missing_side_produces_nothing() {
        let mut index = InstanceIndex::new();
        slot(&mut index, "A", 65, Semester::First);
        let edges = resolve_edges(&index, &[PrerequisiteRelation::between("A", "Z")]);
        assert!(edges.is_empty());
    }
}
