//! Errores del motor y de los colaboradores remotos.

use thiserror::Error;

/// Una acción que dejaría un curso sin semestre asignado. Se rechaza sin
/// tocar el estado y el mensaje se muestra tal cual al usuario.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct GuardViolation {
    pub course_code: String,
    pub message: String,
}

/// Fallos de red/autenticación/formato al hablar con la API remota.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("request to remote API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote API answered {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    #[error("failed to decode remote payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid remote payload: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("malformed curriculum document: {0}")]
    MalformedDocument(String),

    #[error("course instance {0} is not in the current graph")]
    UnknownInstance(String),

    #[error("course instance {0} cannot be marked (graded or simulation already committed)")]
    NotEditable(String),

    #[error("no semester {semester_index} in year index {year_index}")]
    NoSuchSemester { year_index: usize, semester_index: usize },

    #[error("course {0} is not in the open plan")]
    UnknownCourse(String),

    #[error("no session: call init with an identity first")]
    NoSession,

    #[error("no failed/dropped courses selected")]
    NothingToSimulate,

    #[error("a simulation submission is still pending")]
    SubmissionPending,

    #[error(transparent)]
    Guard(#[from] GuardViolation),

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
