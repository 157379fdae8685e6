//! Modelo del documento curricular y de las estructuras derivadas del grafo.
//!
//! Contiene:
//! - el documento (años → semestres → asignaturas) tal como lo arma `api_json`
//! - las relaciones de prerequisitos entre cursos abstractos
//! - los nodos/aristas derivados (una instancia por (curso, año, semestre))
//! - las marcas de simulación (Failed / Dropped)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Marca de "sin nota": el curso está planificado y puede simularse.
pub const UNGRADED: &str = "-";

/// Nombre usado cuando una marca ya no encuentra su nodo.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Valor que llega desde la API como número o como texto ("66", 66).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumOrText {
    Num(i64),
    Text(String),
}

impl NumOrText {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumOrText::Num(n) => Some(*n),
            NumOrText::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

/// Año académico de dos dígitos (p. ej. `66` para 2566).
///
/// Se compara numéricamente. Un año de cuatro dígitos se reduce a sus dos
/// últimos dígitos al parsear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "NumOrText", into = "u16")]
pub struct YearLabel(u16);

impl YearLabel {
    pub fn new(value: u16) -> Self {
        if value >= 100 { YearLabel(value % 100) } else { YearLabel(value) }
    }

    pub fn value(&self) -> u16 {
        self.0
    }
}

impl TryFrom<NumOrText> for YearLabel {
    type Error = String;

    fn try_from(raw: NumOrText) -> Result<Self, Self::Error> {
        match raw.as_i64() {
            Some(n) if (0..=9999).contains(&n) => Ok(YearLabel::new(n as u16)),
            _ => Err(format!("invalid academic year: {:?}", raw)),
        }
    }
}

impl From<YearLabel> for u16 {
    fn from(y: YearLabel) -> u16 {
        y.0
    }
}

impl fmt::Display for YearLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Semestre dentro de un año. En la API viaja como `1` o `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "NumOrText", into = "u8")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub const BOTH: [Semester; 2] = [Semester::First, Semester::Second];

    pub fn number(&self) -> u8 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }

    /// Posición del slot dentro de `CurriculumYear::semesters` (0 o 1).
    pub fn index(&self) -> usize {
        self.number() as usize - 1
    }

    pub fn from_number(n: i64) -> Option<Semester> {
        match n {
            1 => Some(Semester::First),
            2 => Some(Semester::Second),
            _ => None,
        }
    }

    pub fn from_index(i: usize) -> Option<Semester> {
        Semester::from_number(i as i64 + 1)
    }
}

impl TryFrom<NumOrText> for Semester {
    type Error = String;

    fn try_from(raw: NumOrText) -> Result<Self, Self::Error> {
        raw.as_i64()
            .and_then(Semester::from_number)
            .ok_or_else(|| format!("invalid semester: {:?}", raw))
    }
}

impl From<Semester> for u8 {
    fn from(s: Semester) -> u8 {
        s.number()
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Nota de una asignatura. `"Undefined"`, vacío o `null` se normalizan a
/// `Ungraded` al deserializar, así el resto del crate nunca ve esos valores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum Grade {
    Ungraded,
    Letter(String),
}

impl Grade {
    pub fn parse(raw: &str) -> Grade {
        let t = raw.trim();
        if t.is_empty() || t == UNGRADED || t.eq_ignore_ascii_case("undefined") || t.eq_ignore_ascii_case("null") {
            Grade::Ungraded
        } else {
            Grade::Letter(t.to_string())
        }
    }

    pub fn is_ungraded(&self) -> bool {
        matches!(self, Grade::Ungraded)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Grade::Ungraded => UNGRADED,
            Grade::Letter(l) => l.as_str(),
        }
    }
}

impl Default for Grade {
    fn default() -> Self {
        Grade::Ungraded
    }
}

impl From<Option<String>> for Grade {
    fn from(raw: Option<String>) -> Grade {
        match raw {
            Some(s) => Grade::parse(&s),
            None => Grade::Ungraded,
        }
    }
}

impl From<Grade> for String {
    fn from(g: Grade) -> String {
        g.as_str().to_string()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Color CSS (`#RRGGBB` o `hsl(h, s%, l%)`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub String);

impl Color {
    pub fn new(css: &str) -> Self {
        Color(css.to_string())
    }

    pub fn white() -> Self {
        Color::new("#FFFFFF")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub grade: Grade,
    #[serde(default)]
    pub group: Option<String>,
}

impl SubjectRecord {
    pub fn new(code: &str, name: &str, grade: Grade) -> Self {
        SubjectRecord { code: code.to_string(), name: name.to_string(), grade, group: None }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumSemester {
    pub semester: Semester,
    pub subjects: Vec<SubjectRecord>,
    /// Derivado de la simulación; no es dato del servidor.
    #[serde(default)]
    pub dropped: bool,
}

impl CurriculumSemester {
    pub fn empty(semester: Semester) -> Self {
        CurriculumSemester { semester, subjects: Vec::new(), dropped: false }
    }

    pub fn droppable(&self) -> impl Iterator<Item = &SubjectRecord> {
        self.subjects.iter().filter(|s| s.grade.is_ungraded())
    }
}

/// Un año del plan. Siempre tiene los dos slots de semestre (índice 0 = 1er
/// semestre, índice 1 = 2do), aunque estén vacíos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumYear {
    pub year: YearLabel,
    pub semesters: Vec<CurriculumSemester>,
}

impl CurriculumYear {
    pub fn new(year: YearLabel) -> Self {
        CurriculumYear {
            year,
            semesters: Semester::BOTH.iter().map(|s| CurriculumSemester::empty(*s)).collect(),
        }
    }

    /// Busca el slot por número de semestre (no por posición).
    pub fn semester(&self, semester: Semester) -> Option<&CurriculumSemester> {
        self.semesters.iter().find(|s| s.semester == semester)
    }

    pub fn semester_mut(&mut self, semester: Semester) -> Option<&mut CurriculumSemester> {
        self.semesters.iter_mut().find(|s| s.semester == semester)
    }
}

/// Curso abstracto referido por una relación de prerequisito.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub id: String,
    pub name: String,
    pub allowed_year: Option<i64>,
    pub open_semester: Option<i64>,
}

impl CourseRef {
    pub fn new(id: &str, name: &str) -> Self {
        CourseRef { id: id.to_string(), name: name.to_string(), allowed_year: None, open_semester: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteRelation {
    pub prerequisite: CourseRef,
    pub current: CourseRef,
}

impl PrerequisiteRelation {
    pub fn between(prerequisite: &str, current: &str) -> Self {
        PrerequisiteRelation {
            prerequisite: CourseRef::new(prerequisite, prerequisite),
            current: CourseRef::new(current, current),
        }
    }
}

/// Identidad de una instancia: `"{codigo}-{año}-{semestre}"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn new(code: &str, year: YearLabel, semester: Semester) -> Self {
        InstanceId(format!("{}-{}-{}", code, year, semester.number()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseInstanceNode {
    pub instance_id: InstanceId,
    pub original_code: String,
    pub name: String,
    /// Columna: `yearIndex * 2 + (semestre - 1)`.
    pub level: usize,
    /// Fila dentro de la columna del semestre.
    pub layer: usize,
    pub color: Color,
    pub grade: Grade,
    pub group: Option<String>,
    pub year: YearLabel,
    pub semester: Semester,
}

impl CourseInstanceNode {
    pub fn key(&self) -> MutationKey {
        MutationKey::new(&self.original_code, self.year, self.semester)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PrerequisiteEdge {
    pub source: InstanceId,
    pub target: InstanceId,
    pub original_source: String,
    pub original_target: String,
}

impl PrerequisiteEdge {
    pub fn touches(&self, id: &InstanceId) -> bool {
        &self.source == id || &self.target == id
    }

    /// Extremo opuesto a `id`, si la arista lo toca.
    pub fn other_end(&self, id: &InstanceId) -> Option<&InstanceId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    Failed,
    Dropped,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Failed => f.write_str("Failed"),
            MutationKind::Dropped => f.write_str("Dropped"),
        }
    }
}

/// Clave de una marca: a lo sumo una marca por (curso, año, semestre).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MutationKey {
    pub course_code: String,
    pub year: YearLabel,
    pub semester: Semester,
}

impl MutationKey {
    pub fn new(course_code: &str, year: YearLabel, semester: Semester) -> Self {
        MutationKey { course_code: course_code.to_string(), year, semester }
    }

    pub fn instance_id(&self) -> InstanceId {
        InstanceId::new(&self.course_code, self.year, self.semester)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropFailMutation {
    pub key: MutationKey,
    pub kind: MutationKind,
}

/// Contexto de identidad; opaco para el motor, se reenvía tal cual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub student_id: String,
    pub plan_id: i64,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grade_normalizes_undefined_and_null() {
        assert_eq!(Grade::parse("Undefined"), Grade::Ungraded);
        assert_eq!(Grade::parse(" - "), Grade::Ungraded);
        assert_eq!(Grade::from(None), Grade::Ungraded);
        assert_eq!(Grade::parse("B+"), Grade::Letter("B+".to_string()));

        let g: Grade = serde_json::from_str("null").unwrap();
        assert!(g.is_ungraded());
        assert_eq!(serde_json::to_string(&Grade::Ungraded).unwrap(), "\"-\"");
    }

    #[test]
    fn year_and_semester_accept_numbers_or_text() {
        let y: YearLabel = serde_json::from_str("\"66\"").unwrap();
        assert_eq!(y, YearLabel::new(66));
        let y4: YearLabel = serde_json::from_str("2567").unwrap();
        assert_eq!(y4.value(), 67);
        let s: Semester = serde_json::from_str("2").unwrap();
        assert_eq!(s, Semester::Second);
        assert!(serde_json::from_str::<Semester>("3").is_err());
        assert!(serde_json::from_str::<YearLabel>("\"abc\"").is_err());
    }

    #[test]
    fn instance_id_is_composite() {
        let id = InstanceId::new("CS101", YearLabel::new(66), Semester::First);
        assert_eq!(id.as_str(), "CS101-66-1");
        let key = MutationKey::new("CS101", YearLabel::new(66), Semester::First);
        assert_eq!(key.instance_id(), id);
    }

    #[test]
    fn new_year_has_both_slots() {
        let y = CurriculumYear::new(YearLabel::new(65));
        assert_eq!(y.semesters.len(), 2);
        assert_eq!(y.semesters[0].semester, Semester::First);
        assert_eq!(y.semesters[1].semester, Semester::Second);
    }
}
