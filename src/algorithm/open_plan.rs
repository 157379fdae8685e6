// Tabla de plan abierto (vista de administrador): qué cursos del plan se
// ofrecen en cada semestre. Los cambios se aplican de forma optimista y, si
// la API falla, se revierte sólo la casilla tocada.
use serde::Serialize;
use tracing::debug;

use crate::algorithm::simulation::ensure_still_scheduled;
use crate::error::{EngineError, Result};
use crate::models::Semester;

/// Una fila cruda ya tipada: un curso abierto en un semestre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPlanEntry {
    pub code: String,
    pub name: String,
    pub group_id: Option<i64>,
    pub group: Option<String>,
    pub allow_year: Option<i64>,
    pub open_semester: Option<Semester>,
}

/// Un curso con sus dos casillas de semestre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPlanRow {
    pub code: String,
    pub name: String,
    pub group_id: Option<i64>,
    pub group: Option<String>,
    pub plan_id: i64,
    pub allow_year: Option<i64>,
    pub sem1: bool,
    pub sem2: bool,
}

impl OpenPlanRow {
    pub fn is_open(&self, semester: Semester) -> bool {
        match semester {
            Semester::First => self.sem1,
            Semester::Second => self.sem2,
        }
    }

    fn set_open(&mut self, semester: Semester, open: bool) {
        match semester {
            Semester::First => self.sem1 = open,
            Semester::Second => self.sem2 = open,
        }
    }
}

/// Cambio validado, listo para aplicarse y enviarse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPlanToggle {
    pub row: OpenPlanRow,
    pub semester: Semester,
    pub checked: bool,
}

/// Valor previo de la casilla que cambió. Otros cambios en vuelo sobre la
/// misma fila no se pisan al revertir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPlanSnapshot {
    pub code: String,
    pub semester: Semester,
    pub was_open: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OpenPlanTable {
    pub plan_id: i64,
    pub rows: Vec<OpenPlanRow>,
}

impl OpenPlanTable {
    /// Agrupa las filas por código (orden de primera aparición) y marca los
    /// semestres en que cada curso está abierto.
    pub fn from_entries(plan_id: i64, entries: Vec<OpenPlanEntry>) -> Self {
        let mut rows: Vec<OpenPlanRow> = Vec::new();
        for entry in entries {
            let pos = match rows.iter().position(|r| r.code == entry.code) {
                Some(p) => p,
                None => {
                    rows.push(OpenPlanRow {
                        code: entry.code.clone(),
                        name: entry.name.clone(),
                        group_id: entry.group_id,
                        group: entry.group.clone(),
                        plan_id,
                        allow_year: entry.allow_year,
                        sem1: false,
                        sem2: false,
                    });
                    rows.len() - 1
                }
            };
            if let Some(semester) = entry.open_semester {
                rows[pos].set_open(semester, true);
            }
        }
        debug!(plan_id, courses = rows.len(), "open plan table built");
        OpenPlanTable { plan_id, rows }
    }

    pub fn row(&self, code: &str) -> Option<&OpenPlanRow> {
        self.rows.iter().find(|r| r.code == code)
    }

    /// Valida el cambio sin tocar la tabla.
    pub fn propose_toggle(&self, code: &str, semester: Semester, checked: bool) -> Result<OpenPlanToggle> {
        let row = self.row(code).ok_or_else(|| EngineError::UnknownCourse(code.to_string()))?;
        ensure_still_scheduled(code, row.sem1, row.sem2, semester, checked)?;
        Ok(OpenPlanToggle { row: row.clone(), semester, checked })
    }

    pub fn apply_optimistic(&mut self, toggle: &OpenPlanToggle) -> Result<OpenPlanSnapshot> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.code == toggle.row.code)
            .ok_or_else(|| EngineError::UnknownCourse(toggle.row.code.clone()))?;
        let snapshot =
            OpenPlanSnapshot { code: row.code.clone(), semester: toggle.semester, was_open: row.is_open(toggle.semester) };
        row.set_open(toggle.semester, toggle.checked);
        Ok(snapshot)
    }

    /// Si la fila ya no existe (la tabla se recargó) no hay nada que restaurar.
    pub fn rollback(&mut self, snapshot: &OpenPlanSnapshot) -> bool {
        match self.rows.iter_mut().find(|r| r.code == snapshot.code) {
            Some(row) => {
                row.set_open(snapshot.semester, snapshot.was_open);
                true
            }
            None => false,
        }
    }
}
