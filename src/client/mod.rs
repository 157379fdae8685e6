//! Colaboradores remotos: la API de notas/inscripción.
//!
//! El motor sólo conoce los traits; `HttpGradingApi` es la implementación
//! real sobre `reqwest`. Los tests usan implementaciones en memoria.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::api_json::{
    OpenPlanChangeRequest, OpenPlanRawRow, PlanIdRequest, PrerequisiteRow, StudentDataRow, StudyPlanRow,
    SubmissionRequest,
};
use crate::error::CollaboratorError;
use crate::models::IdentityContext;

type CollabResult<T> = std::result::Result<T, CollaboratorError>;

/// Fuente del plan de estudio y de las relaciones de prerequisitos.
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn fetch_study_plan(&self, identity: &IdentityContext) -> CollabResult<Vec<StudyPlanRow>>;

    async fn fetch_prerequisites(&self, identity: &IdentityContext) -> CollabResult<Vec<PrerequisiteRow>>;
}

/// Recibe la simulación y devuelve el plan recalculado (mismas filas que el plan).
#[async_trait]
pub trait SimulationSink: Send + Sync {
    async fn submit(&self, identity: &IdentityContext, request: &SubmissionRequest) -> CollabResult<Vec<StudyPlanRow>>;
}

#[async_trait]
pub trait OpenPlanSource: Send + Sync {
    /// Devuelve el `Plan_ID` resuelto y las filas crudas.
    async fn fetch_open_plan(&self, identity: &IdentityContext) -> CollabResult<(i64, Vec<OpenPlanRawRow>)>;

    async fn set_course_open(
        &self,
        identity: &IdentityContext,
        change: &OpenPlanChangeRequest,
        open: bool,
    ) -> CollabResult<()>;
}

pub struct HttpGradingApi {
    http: Client,
    base_url: String,
}

impl HttpGradingApi {
    pub fn new(base_url: &str, timeout: Duration) -> CollabResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> CollabResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::Status { status: status.as_u16(), endpoint: path.to_string() });
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> CollabResult<T> {
        debug!(path, "GET");
        let response = self.http.get(self.url(path)).bearer_auth(token).send().await?;
        Self::decode(response, path).await
    }

    async fn post<B: Serialize + ?Sized + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> CollabResult<T> {
        debug!(path, "POST");
        let response = self.http.post(self.url(path)).bearer_auth(token).json(body).send().await?;
        Self::decode(response, path).await
    }

    /// `/student_data/{id}` → `PlanID` de la primera fila.
    async fn resolve_plan_id(&self, identity: &IdentityContext) -> CollabResult<i64> {
        let rows: Vec<StudentDataRow> =
            self.get(&format!("/student_data/{}", identity.student_id), &identity.access_token).await?;
        rows.first()
            .and_then(|r| r.plan_id.as_i64())
            .ok_or_else(|| CollaboratorError::Invalid("Plan_ID not found in student data".to_string()))
    }
}

#[async_trait]
impl PlanSource for HttpGradingApi {
    async fn fetch_study_plan(&self, identity: &IdentityContext) -> CollabResult<Vec<StudyPlanRow>> {
        let plan_id = self.resolve_plan_id(identity).await?;
        let rows: Vec<StudyPlanRow> = self
            .post(&format!("/open_plan/{}", identity.student_id), &identity.access_token, &PlanIdRequest { plan_id })
            .await?;
        info!(student = %identity.student_id, plan_id, rows = rows.len(), "study plan fetched");
        Ok(rows)
    }

    async fn fetch_prerequisites(&self, identity: &IdentityContext) -> CollabResult<Vec<PrerequisiteRow>> {
        self.get(&format!("/pre_course/{}", identity.student_id), &identity.access_token).await
    }
}

#[async_trait]
impl SimulationSink for HttpGradingApi {
    async fn submit(&self, identity: &IdentityContext, request: &SubmissionRequest) -> CollabResult<Vec<StudyPlanRow>> {
        let value: Value = self
            .post("/open_plan/submit_drop_fail_course/", &identity.access_token, request)
            .await?;
        // la respuesta tiene que ser el plan completo como arreglo de filas
        if !value.is_array() {
            return Err(CollaboratorError::Invalid("unexpected response format from the server".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl OpenPlanSource for HttpGradingApi {
    async fn fetch_open_plan(&self, identity: &IdentityContext) -> CollabResult<(i64, Vec<OpenPlanRawRow>)> {
        let plan_id = self.resolve_plan_id(identity).await?;
        let rows: Vec<OpenPlanRawRow> =
            self.post("/open_plan", &identity.access_token, &PlanIdRequest { plan_id }).await?;
        Ok((plan_id, rows))
    }

    async fn set_course_open(
        &self,
        identity: &IdentityContext,
        change: &OpenPlanChangeRequest,
        open: bool,
    ) -> CollabResult<()> {
        let path = if open { "/added_course_open_plan" } else { "/removed_course_open_plan" };
        let _: Value = self.post(path, &identity.access_token, change).await?;
        info!(course = %change.code, semester = change.open_semester, open, "open plan updated");
        Ok(())
    }
}
