use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

use crate::algorithm::open_plan::{OpenPlanEntry, OpenPlanToggle};
use crate::algorithm::resolver::dedup_relations;
use crate::algorithm::simulation::SubmissionPayload;
use crate::error::{EngineError, Result};
use crate::models::{
    CourseRef, CurriculumYear, Grade, NumOrText, PrerequisiteRelation, Semester, SubjectRecord,
    YearLabel,
};

/// Fila del plan de estudio tal como la devuelve la API remota.
///
/// ```json
/// { "CID": "01418111", "CNAME": "Intro", "YEAR": 66, "SEM": 1,
///   "REGISTERSEM": null, "GRADE": "Undefined", "GNAME": "Core" }
/// ```
///
/// `SEM` tiene prioridad; si falta (o es 0) se usa `REGISTERSEM`.
#[derive(Debug, Clone, Deserialize)]
pub struct StudyPlanRow {
    #[serde(rename = "CID")]
    pub code: String,
    #[serde(rename = "CNAME", default)]
    pub name: String,
    #[serde(rename = "YEAR")]
    pub year: Option<NumOrText>,
    #[serde(rename = "SEM", default)]
    pub sem: Option<NumOrText>,
    #[serde(rename = "REGISTERSEM", default)]
    pub register_sem: Option<NumOrText>,
    #[serde(rename = "GRADE", default)]
    pub grade: Grade,
    #[serde(rename = "GNAME", default)]
    pub group: Option<String>,
}

impl StudyPlanRow {
    fn semester(&self) -> Option<Semester> {
        let sem = self.sem.as_ref().and_then(NumOrText::as_i64).filter(|n| *n != 0);
        let reg = self.register_sem.as_ref().and_then(NumOrText::as_i64);
        sem.or(reg).and_then(Semester::from_number)
    }

    fn year_label(&self) -> Option<YearLabel> {
        let raw = self.year.clone()?;
        YearLabel::try_from(raw).ok()
    }
}

/// Respuesta de `/student_data/{id}`; sólo interesa el plan.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentDataRow {
    #[serde(rename = "PlanID")]
    pub plan_id: NumOrText,
}

/// Problemas encontrados al leer un documento. No detienen la carga: el
/// elemento afectado se omite o se deja vacío.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
pub enum DocumentIssue {
    #[error("row {code} has no valid year/semester")]
    InvalidRow { code: String },

    #[error("year entry {index} could not be read: {reason}")]
    InvalidYear { index: usize, reason: String },

    #[error("year {year} has no semesters")]
    YearWithoutSemesters { year: YearLabel },

    #[error("semester {semester} of year {year} has no subject list")]
    SemesterWithoutSubjects { year: YearLabel, semester: Semester },
}

/// Agrupa filas en años (orden numérico) con los dos semestres, manteniendo
/// el orden de las filas dentro de cada semestre.
pub fn assemble_years(rows: &[StudyPlanRow]) -> (Vec<CurriculumYear>, Vec<DocumentIssue>) {
    let mut by_year: BTreeMap<YearLabel, CurriculumYear> = BTreeMap::new();
    let mut issues = Vec::new();

    for row in rows {
        let (Some(year), Some(semester)) = (row.year_label(), row.semester()) else {
            warn!(code = %row.code, "study plan row without valid year/semester, skipping");
            issues.push(DocumentIssue::InvalidRow { code: row.code.clone() });
            continue;
        };

        let entry = by_year.entry(year).or_insert_with(|| CurriculumYear::new(year));
        if let Some(slot) = entry.semester_mut(semester) {
            let mut subject = SubjectRecord::new(&row.code, &row.name, row.grade.clone());
            subject.group = row.group.clone().filter(|g| !g.trim().is_empty());
            slot.subjects.push(subject);
        }
    }

    (by_year.into_values().collect(), issues)
}

#[derive(Debug, Deserialize)]
struct RawSemester {
    semester: Semester,
    #[serde(default)]
    subjects: Option<Vec<SubjectRecord>>,
}

#[derive(Debug, Deserialize)]
struct RawYear {
    year: YearLabel,
    #[serde(default)]
    semesters: Option<Vec<RawSemester>>,
}

/// Lee un documento ya agrupado (`[{year, semesters: [{semester, subjects}]}]`).
///
/// Un año sin semestres se omite, un semestre sin lista de asignaturas queda
/// vacío. Sólo falla si la raíz no es un arreglo.
pub fn parse_curriculum_document(value: &Value) -> Result<(Vec<CurriculumYear>, Vec<DocumentIssue>)> {
    let entries = value
        .as_array()
        .ok_or_else(|| EngineError::MalformedDocument("expected an array of years".to_string()))?;

    let mut years = Vec::with_capacity(entries.len());
    let mut issues = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let raw: RawYear = match serde_json::from_value(entry.clone()) {
            Ok(r) => r,
            Err(e) => {
                warn!(index, error = %e, "unreadable year entry");
                issues.push(DocumentIssue::InvalidYear { index, reason: e.to_string() });
                continue;
            }
        };

        let semesters = match raw.semesters {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!(year = %raw.year, "year has no semesters, skipping");
                issues.push(DocumentIssue::YearWithoutSemesters { year: raw.year });
                continue;
            }
        };

        let mut year = CurriculumYear::new(raw.year);
        for sem in semesters {
            let subjects = match sem.subjects {
                Some(s) => s,
                None => {
                    warn!(year = %raw.year, semester = %sem.semester, "semester without subjects, treating as empty");
                    issues.push(DocumentIssue::SemesterWithoutSubjects { year: raw.year, semester: sem.semester });
                    Vec::new()
                }
            };
            if let Some(slot) = year.semester_mut(sem.semester) {
                slot.subjects.extend(subjects);
            }
        }
        years.push(year);
    }

    Ok((years, issues))
}

fn text_of(raw: &NumOrText) -> String {
    match raw {
        NumOrText::Num(n) => n.to_string(),
        NumOrText::Text(s) => s.trim().to_string(),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCourseRef {
    #[serde(rename = "ID")]
    pub id: NumOrText,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "AllowedYear", default)]
    pub allowed_year: Option<NumOrText>,
    #[serde(rename = "OpenSemester", default)]
    pub open_semester: Option<NumOrText>,
}

impl From<&RawCourseRef> for CourseRef {
    fn from(raw: &RawCourseRef) -> Self {
        CourseRef {
            id: text_of(&raw.id),
            name: raw.name.clone().unwrap_or_default(),
            allowed_year: raw.allowed_year.as_ref().and_then(NumOrText::as_i64),
            open_semester: raw.open_semester.as_ref().and_then(NumOrText::as_i64),
        }
    }
}

/// Fila de `/pre_course/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PrerequisiteRow {
    #[serde(rename = "PrerequisiteCourse")]
    pub prerequisite: RawCourseRef,
    #[serde(rename = "CurrentCourse")]
    pub current: RawCourseRef,
}

/// Convierte y colapsa relaciones repetidas.
pub fn parse_prerequisites(rows: &[PrerequisiteRow]) -> Vec<PrerequisiteRelation> {
    let relations: Vec<PrerequisiteRelation> = rows
        .iter()
        .map(|r| PrerequisiteRelation { prerequisite: (&r.prerequisite).into(), current: (&r.current).into() })
        .collect();
    dedup_relations(&relations)
}

/// Cuerpo de `POST /open_plan/submit_drop_fail_course/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(rename = "StdID")]
    pub student_id: String,
    #[serde(rename = "Plan_ID")]
    pub plan_id: i64,
    #[serde(rename = "Courses")]
    pub courses: Vec<SubmissionCourse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionCourse {
    #[serde(rename = "CID")]
    pub code: String,
    #[serde(rename = "CName")]
    pub name: String,
    #[serde(rename = "Year")]
    pub year: u16,
    #[serde(rename = "Sem")]
    pub semester: u8,
    #[serde(rename = "Type")]
    pub kind: String,
}

impl From<&SubmissionPayload> for SubmissionRequest {
    fn from(payload: &SubmissionPayload) -> Self {
        SubmissionRequest {
            student_id: payload.student_id.clone(),
            plan_id: payload.plan_id,
            courses: payload
                .courses
                .iter()
                .map(|c| SubmissionCourse {
                    code: c.code.clone(),
                    name: c.name.clone(),
                    year: c.year.value(),
                    semester: c.semester.number(),
                    kind: c.kind.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanIdRequest {
    #[serde(rename = "Plan_ID")]
    pub plan_id: i64,
}

/// Fila de `POST /open_plan`: un curso abierto en un semestre.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenPlanRawRow {
    #[serde(rename = "CID")]
    pub code: String,
    #[serde(rename = "CNAME", default)]
    pub name: String,
    #[serde(rename = "GID", default)]
    pub group_id: Option<NumOrText>,
    #[serde(rename = "GNAME", default)]
    pub group: Option<String>,
    #[serde(rename = "ALLOWYEAR", default)]
    pub allow_year: Option<NumOrText>,
    #[serde(rename = "OPENSEM", default)]
    pub open_semester: Option<NumOrText>,
}

impl From<&OpenPlanRawRow> for OpenPlanEntry {
    fn from(raw: &OpenPlanRawRow) -> Self {
        OpenPlanEntry {
            code: raw.code.clone(),
            name: raw.name.clone(),
            group_id: raw.group_id.as_ref().and_then(NumOrText::as_i64),
            group: raw.group.clone(),
            allow_year: raw.allow_year.as_ref().and_then(NumOrText::as_i64),
            open_semester: raw.open_semester.as_ref().and_then(NumOrText::as_i64).and_then(Semester::from_number),
        }
    }
}

/// Cuerpo de `/added_course_open_plan` y `/removed_course_open_plan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenPlanChangeRequest {
    #[serde(rename = "Plan_ID")]
    pub plan_id: i64,
    #[serde(rename = "CID")]
    pub code: String,
    #[serde(rename = "CNAME")]
    pub name: String,
    #[serde(rename = "GID")]
    pub group_id: Option<i64>,
    #[serde(rename = "GNAME")]
    pub group: Option<String>,
    #[serde(rename = "ALLOWYEAR")]
    pub allow_year: Option<i64>,
    #[serde(rename = "OPENSEM")]
    pub open_semester: u8,
}

impl From<&OpenPlanToggle> for OpenPlanChangeRequest {
    fn from(toggle: &OpenPlanToggle) -> Self {
        OpenPlanChangeRequest {
            plan_id: toggle.row.plan_id,
            code: toggle.row.code.clone(),
            name: toggle.row.name.clone(),
            group_id: toggle.row.group_id,
            group: toggle.row.group.clone(),
            allow_year: toggle.row.allow_year,
            open_semester: toggle.semester.number(),
        }
    }
}
