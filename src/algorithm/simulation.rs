//! Estado de simulación: marcas "Failed"/"Dropped" pendientes por instancia,
//! agregados por semestre y armado del payload que se envía a la API.

use serde::Serialize;
use tracing::warn;

use crate::algorithm::extract::CurriculumGraph;
use crate::error::{EngineError, GuardViolation, Result};
use crate::models::{
    CurriculumYear, DropFailMutation, IdentityContext, InstanceId, MutationKey, MutationKind, Semester, YearLabel,
    UNKNOWN_NAME,
};

/// Resultado de un toggle individual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToggleOutcome {
    Added,
    Replaced,
    Removed,
}

/// Resultado de un toggle de semestre completo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SemesterToggle {
    /// Se marcaron como Dropped todas las asignaturas sin nota.
    Checked(usize),
    /// Se quitaron las marcas Dropped del semestre.
    Unchecked(usize),
    /// No hay asignaturas que se puedan marcar.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedCourse {
    pub code: String,
    pub name: String,
    pub year: YearLabel,
    pub semester: Semester,
    pub kind: MutationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub student_id: String,
    pub plan_id: i64,
    pub courses: Vec<SubmittedCourse>,
    /// Marcas cuya instancia ya no está en el grafo (nombre "Unknown").
    #[serde(skip)]
    pub desynced: Vec<MutationKey>,
}

#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    // lista con clave única (MutationKey); se conserva el orden de inserción
    mutations: Vec<DropFailMutation>,
    committed: bool,
}

impl SimulationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mutations(&self) -> &[DropFailMutation] {
        &self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// True cuando ya se envió una simulación y el plan mostrado es el simulado.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn pending(&self, key: &MutationKey) -> Option<MutationKind> {
        self.mutations.iter().find(|m| &m.key == key).map(|m| m.kind)
    }

    fn upsert(&mut self, key: MutationKey, kind: MutationKind) -> ToggleOutcome {
        match self.mutations.iter_mut().find(|m| m.key == key) {
            Some(existing) => {
                existing.kind = kind;
                ToggleOutcome::Replaced
            }
            None => {
                self.mutations.push(DropFailMutation { key, kind });
                ToggleOutcome::Added
            }
        }
    }

    fn remove(&mut self, key: &MutationKey) -> bool {
        let before = self.mutations.len();
        self.mutations.retain(|m| &m.key != key);
        before != self.mutations.len()
    }

    /// Invierte la marca `kind` de una instancia. Marcar Failed sobre una
    /// instancia Dropped (o al revés) reemplaza la marca anterior.
    pub fn toggle_course(&mut self, graph: &CurriculumGraph, id: &InstanceId, kind: MutationKind) -> Result<ToggleOutcome> {
        let node = graph.node(id).ok_or_else(|| EngineError::UnknownInstance(id.to_string()))?;
        if self.committed || !node.grade.is_ungraded() {
            return Err(EngineError::NotEditable(id.to_string()));
        }

        let key = node.key();
        if self.pending(&key) == Some(kind) {
            self.remove(&key);
            return Ok(ToggleOutcome::Removed);
        }
        Ok(self.upsert(key, kind))
    }

    /// True si todas las asignaturas sin nota del semestre están Dropped.
    /// Un semestre sin asignaturas marcables nunca está "dropped".
    pub fn is_semester_dropped(&self, years: &[CurriculumYear], year_index: usize, semester_index: usize) -> bool {
        let Some((year, semester)) = locate(years, year_index, semester_index) else {
            return false;
        };
        let Some(slot) = year.semester(semester) else {
            return false;
        };
        let mut droppable = slot.droppable().peekable();
        if droppable.peek().is_none() {
            return false;
        }
        droppable.all(|s| self.pending(&MutationKey::new(&s.code, year.year, semester)) == Some(MutationKind::Dropped))
    }

    /// Marca/desmarca "Drop Semester". Las asignaturas con nota no se tocan.
    pub fn toggle_semester(&mut self, years: &[CurriculumYear], year_index: usize, semester_index: usize) -> Result<SemesterToggle> {
        let (year, semester) = locate(years, year_index, semester_index)
            .ok_or(EngineError::NoSuchSemester { year_index, semester_index })?;
        if self.committed {
            return Err(EngineError::NotEditable(format!("{}-{}", year.year, semester)));
        }

        let keys: Vec<MutationKey> = match year.semester(semester) {
            Some(slot) => slot.droppable().map(|s| MutationKey::new(&s.code, year.year, semester)).collect(),
            None => Vec::new(),
        };
        if keys.is_empty() {
            return Ok(SemesterToggle::Unchanged);
        }

        if self.is_semester_dropped(years, year_index, semester_index) {
            for key in &keys {
                self.remove(key);
            }
            Ok(SemesterToggle::Unchecked(keys.len()))
        } else {
            let n = keys.len();
            for key in keys {
                self.upsert(key, MutationKind::Dropped);
            }
            Ok(SemesterToggle::Checked(n))
        }
    }

    /// Reescribe los flags `dropped` del documento a partir de las marcas.
    pub fn sync_dropped_flags(&self, years: &mut [CurriculumYear]) {
        let current: &[CurriculumYear] = years;
        let flags: Vec<Vec<bool>> = (0..current.len())
            .map(|yi| (0..2).map(|si| self.is_semester_dropped(current, yi, si)).collect())
            .collect();
        for (year, year_flags) in years.iter_mut().zip(flags) {
            for semester in year.semesters.iter_mut() {
                semester.dropped = year_flags.get(semester.semester.index()).copied().unwrap_or(false);
            }
        }
    }

    /// Limpia todas las marcas y sale del modo simulado. El documento original
    /// lo vuelve a pedir el store a la API.
    pub fn reset(&mut self) {
        self.mutations.clear();
        self.committed = false;
    }

    /// Llamar sólo tras la confirmación de la API.
    pub fn mark_committed(&mut self) {
        self.mutations.clear();
        self.committed = true;
    }

    /// Arma el payload de envío. Nunca falla: si una marca ya no tiene nodo se
    /// envía con nombre "Unknown" y queda anotada en `desynced`.
    pub fn build_submission_payload(&self, graph: &CurriculumGraph, identity: &IdentityContext) -> SubmissionPayload {
        let mut desynced = Vec::new();
        let courses = self
            .mutations
            .iter()
            .map(|m| {
                let name = match graph.node(&m.key.instance_id()) {
                    Some(node) => node.name.clone(),
                    None => {
                        warn!(instance = %m.key.instance_id(), "mutation references a course instance no longer in the graph");
                        desynced.push(m.key.clone());
                        UNKNOWN_NAME.to_string()
                    }
                };
                SubmittedCourse {
                    code: m.key.course_code.clone(),
                    name,
                    year: m.key.year,
                    semester: m.key.semester,
                    kind: m.kind,
                }
            })
            .collect();

        SubmissionPayload {
            student_id: identity.student_id.clone(),
            plan_id: identity.plan_id,
            courses,
            desynced,
        }
    }
}

fn locate(years: &[CurriculumYear], year_index: usize, semester_index: usize) -> Option<(&CurriculumYear, Semester)> {
    let year = years.get(year_index)?;
    let semester = Semester::from_index(semester_index)?;
    Some((year, semester))
}

/// Un curso tiene que quedar abierto en al menos un semestre. `sem1`/`sem2`
/// son los valores actuales; `checked` el valor que se quiere poner.
pub fn ensure_still_scheduled(
    course_code: &str,
    sem1: bool,
    sem2: bool,
    semester: Semester,
    checked: bool,
) -> std::result::Result<(), GuardViolation> {
    let other_open = match semester {
        Semester::First => sem2,
        Semester::Second => sem1,
    };
    if !checked && !other_open {
        return Err(GuardViolation {
            course_code: course_code.to_string(),
            message: "A course must be open in at least one semester. If you want to remove this semester, please allow the other semester first.".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::extract::extract_graph;
    use crate::models::{Grade, SubjectRecord};

    fn plan() -> Vec<CurriculumYear> {
        let mut y = CurriculumYear::new(YearLabel::new(66));
        y.semesters[0].subjects.push(SubjectRecord::new("A", "Alpha", Grade::Ungraded));
        y.semesters[0].subjects.push(SubjectRecord::new("B", "Beta", Grade::parse("B+")));
        y.semesters[1].subjects.push(SubjectRecord::new("C", "Gamma", Grade::Ungraded));
        vec![y]
    }

    fn id(code: &str, sem: Semester) -> InstanceId {
        InstanceId::new(code, YearLabel::new(66), sem)
    }

    #[test]
    fn test_graded_course_is_not_editable() {
        let years = plan();
        let g = extract_graph(&years, &[], &[]);
        let mut sim = SimulationState::new();
        let err = sim.toggle_course(&g, &id("B", Semester::First), MutationKind::Failed).unwrap_err();
        assert!(matches!(err, EngineError::NotEditable(_)));
        assert!(sim.is_empty());
    }

    #[test]
    fn test_unknown_instance() {
        let g = extract_graph(&plan(), &[], &[]);
        let mut sim = SimulationState::new();
        let err = sim.toggle_course(&g, &InstanceId::from("nope"), MutationKind::Dropped).unwrap_err();
        assert!(matches!(err, EngineError::UnknownInstance(_)));
    }

    #[test]
    fn test_committed_blocks_toggles() {
        let years = plan();
        let g = extract_graph(&years, &[], &[]);
        let mut sim = SimulationState::new();
        sim.mark_committed();
        assert!(sim.toggle_course(&g, &id("A", Semester::First), MutationKind::Failed).is_err());
        assert!(sim.toggle_semester(&years, 0, 0).is_err());
        sim.reset();
        assert!(!sim.is_committed());
        assert!(sim.toggle_course(&g, &id("A", Semester::First), MutationKind::Failed).is_ok());
    }

    #[test]
    fn test_semester_toggle_roundtrip_and_flags() {
        let mut years = plan();
        let mut sim = SimulationState::new();
        assert_eq!(sim.toggle_semester(&years, 0, 0).unwrap(), SemesterToggle::Checked(1));
        assert!(sim.is_semester_dropped(&years, 0, 0));
        sim.sync_dropped_flags(&mut years);
        assert!(years[0].semesters[0].dropped);
        assert!(!years[0].semesters[1].dropped);

        assert_eq!(sim.toggle_semester(&years, 0, 0).unwrap(), SemesterToggle::Unchecked(1));
        assert!(sim.is_empty());
        assert!(matches!(sim.toggle_semester(&years, 3, 0), Err(EngineError::NoSuchSemester { .. })));
        assert!(matches!(sim.toggle_semester(&years, 0, 2), Err(EngineError::NoSuchSemester { .. })));
    }

    #[test]
    fn test_semester_check_replaces_failed() {
        let years = plan();
        let g = extract_graph(&years, &[], &[]);
        let mut sim = SimulationState::new();
        sim.toggle_course(&g, &id("C", Semester::Second), MutationKind::Failed).unwrap();
        sim.toggle_semester(&years, 0, 1).unwrap();
        assert_eq!(sim.mutations().len(), 1);
        assert_eq!(sim.mutations()[0].kind, MutationKind::Dropped);
    }

    #[test]
    fn test_guard_keeps_one_semester_open() {
        assert!(ensure_still_scheduled("X", true, false, Semester::First, false).is_err());
        assert!(ensure_still_scheduled("X", true, true, Semester::First, false).is_ok());
        assert!(ensure_still_scheduled("X", false, true, Semester::Second, false).is_err());
        assert!(ensure_still_scheduled("X", false, false, Semester::Second, true).is_ok());
    }
}
