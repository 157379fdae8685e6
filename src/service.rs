//! Orquestación: une el store con los colaboradores remotos.
//!
//! El lock del store se toma sólo para leer/escribir estado; nunca se mantiene
//! durante un `.await` remoto.

use std::sync::Arc;

use chrono::Local;
use futures_util::future::try_join;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::algorithm::open_plan::{OpenPlanEntry, OpenPlanTable};
use crate::algorithm::simulation::{SemesterToggle, SubmissionPayload, ToggleOutcome};
use crate::api_json::{assemble_years, parse_prerequisites, OpenPlanChangeRequest, SubmissionRequest};
use crate::client::{OpenPlanSource, PlanSource, SimulationSink};
use crate::error::{EngineError, Result};
use crate::layout::colors::ColorScheme;
use crate::layout::view::GraphView;
use crate::models::{IdentityContext, InstanceId, MutationKind, Semester};
use crate::store::{CurriculumStore, LoadOutcome, LoadTicket, LoadedPlan};

#[derive(Clone)]
pub struct PlanService {
    store: Arc<Mutex<CurriculumStore>>,
    plans: Arc<dyn PlanSource>,
    sink: Arc<dyn SimulationSink>,
    open_plans: Arc<dyn OpenPlanSource>,
}

/// Resultado de enviar una simulación.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub outcome: LoadOutcome,
    pub payload: SubmissionPayload,
}

impl PlanService {
    pub fn new(
        store: CurriculumStore,
        plans: Arc<dyn PlanSource>,
        sink: Arc<dyn SimulationSink>,
        open_plans: Arc<dyn OpenPlanSource>,
    ) -> Self {
        PlanService { store: Arc::new(Mutex::new(store)), plans, sink, open_plans }
    }

    pub fn store(&self) -> Arc<Mutex<CurriculumStore>> {
        self.store.clone()
    }

    pub async fn start_session(&self, identity: IdentityContext) -> Result<LoadOutcome> {
        self.store.lock().await.init(identity);
        self.load().await
    }

    pub async fn end_session(&self) {
        self.store.lock().await.teardown();
    }

    /// Pide plan y prerequisitos en paralelo y los aplica si la carga sigue vigente.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let (ticket, identity) = {
            let mut store = self.store.lock().await;
            let ticket = store.begin_load()?;
            (ticket, store.identity()?.clone())
        };
        self.fetch_and_complete(ticket, identity).await
    }

    /// Vuelve a pedir el plan original; las marcas y el modo simulado se
    /// limpian sólo si la recarga se aplica.
    pub async fn reset(&self) -> Result<LoadOutcome> {
        let (ticket, identity) = {
            let mut store = self.store.lock().await;
            let ticket = store.begin_reset()?;
            (ticket, store.identity()?.clone())
        };
        self.fetch_and_complete(ticket, identity).await
    }

    async fn fetch_and_complete(&self, ticket: LoadTicket, identity: IdentityContext) -> Result<LoadOutcome> {
        let fetched = try_join(self.plans.fetch_study_plan(&identity), self.plans.fetch_prerequisites(&identity)).await;
        let result = fetched.map_err(EngineError::from).map(|(rows, prereq_rows)| {
            let (years, issues) = assemble_years(&rows);
            LoadedPlan { years, relations: parse_prerequisites(&prereq_rows), issues }
        });

        self.store.lock().await.complete_load(&ticket, result)
    }

    /// Envía las marcas pendientes y re-siembra el documento con la respuesta.
    /// Si el envío falla no cambia nada local.
    pub async fn simulate(&self) -> Result<SimulationReport> {
        let (payload, identity, ticket) = self.store.lock().await.prepare_submission()?;
        let request = SubmissionRequest::from(&payload);
        info!(student = %identity.student_id, courses = request.courses.len(), "submitting simulation");

        let rows = match self.sink.submit(&identity, &request).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "simulation submit failed");
                self.store.lock().await.abort_submission(&ticket);
                return Err(e.into());
            }
        };
        let (years, issues) = assemble_years(&rows);

        let outcome = self.store.lock().await.apply_simulation(&ticket, years, issues);
        Ok(SimulationReport { outcome, payload })
    }

    pub async fn click(&self, id: InstanceId) -> Result<Option<InstanceId>> {
        self.store.lock().await.click(id)
    }

    pub async fn clear_focus(&self) {
        self.store.lock().await.clear_focus();
    }

    pub async fn set_scheme(&self, scheme: ColorScheme) -> Result<()> {
        let mut store = self.store.lock().await;
        store.identity()?;
        store.set_scheme(scheme);
        Ok(())
    }

    pub async fn toggle_course(&self, id: &InstanceId, kind: MutationKind) -> Result<ToggleOutcome> {
        self.store.lock().await.toggle_course(id, kind)
    }

    pub async fn toggle_semester(&self, year_index: usize, semester_index: usize) -> Result<SemesterToggle> {
        self.store.lock().await.toggle_semester(year_index, semester_index)
    }

    pub async fn view(&self) -> Result<GraphView> {
        let store = self.store.lock().await;
        store.identity()?;
        Ok(store.view(Local::now().date_naive()))
    }

    pub async fn fetch_open_plan(&self) -> Result<OpenPlanTable> {
        let identity = self.store.lock().await.identity()?.clone();
        let (plan_id, rows) = self.open_plans.fetch_open_plan(&identity).await?;
        let entries: Vec<OpenPlanEntry> = rows.iter().map(OpenPlanEntry::from).collect();
        let table = OpenPlanTable::from_entries(plan_id, entries);

        let mut store = self.store.lock().await;
        if store.identity().map(|i| i.student_id != identity.student_id).unwrap_or(true) {
            warn!("discarding open plan for a closed session");
            return Err(EngineError::NoSession);
        }
        store.set_open_plan(table.clone());
        Ok(table)
    }

    /// Guarda → cambio optimista → llamada remota → rollback si falla.
    pub async fn toggle_open_plan(&self, code: &str, semester: Semester, checked: bool) -> Result<OpenPlanTable> {
        let (toggle, snapshot, identity) = {
            let mut store = self.store.lock().await;
            let identity = store.identity()?.clone();
            let table = store.open_plan_mut().ok_or_else(|| EngineError::UnknownCourse(code.to_string()))?;
            let toggle = table.propose_toggle(code, semester, checked)?;
            let snapshot = table.apply_optimistic(&toggle)?;
            (toggle, snapshot, identity)
        };

        let change = OpenPlanChangeRequest::from(&toggle);
        if let Err(e) = self.open_plans.set_course_open(&identity, &change, checked).await {
            warn!(course = %code, error = %e, "open plan update failed, rolling back");
            if let Some(table) = self.store.lock().await.open_plan_mut() {
                table.rollback(&snapshot);
            }
            return Err(e.into());
        }

        let store = self.store.lock().await;
        Ok(store.open_plan().cloned().unwrap_or_default())
    }
}
