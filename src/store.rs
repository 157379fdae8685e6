//! Dueño único del estado de una sesión: documento, prerequisitos, grafo
//! derivado, marcas de simulación, foco, esquema de color y paletas.
//!
//! Es síncrono: `PlanService` lo envuelve en un `Mutex` y nunca lo mantiene
//! bloqueado durante una llamada remota. Cada carga lleva un
//! `LoadTicket`: si llega una respuesta de una carga ya superada se descarta.

use std::collections::HashMap;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::algorithm::extract::{extract_graph, CurriculumGraph};
use crate::algorithm::open_plan::OpenPlanTable;
use crate::algorithm::simulation::{SemesterToggle, SimulationState, SubmissionPayload, ToggleOutcome};
use crate::api_json::DocumentIssue;
use crate::error::{EngineError, Result};
use crate::layout::colors::{current_academic_year, group_palette, semester_palette, ColorContext, ColorScheme};
use crate::layout::focus::FocusState;
use crate::layout::view::{build_view, GraphView};
use crate::layout::LayoutConfig;
use crate::models::{Color, CurriculumYear, IdentityContext, InstanceId, MutationKind, PrerequisiteRelation};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoadStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Identifica una carga (o envío) en curso. Un ticket de reset limpia la
/// simulación sólo si su carga se aplica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
    student_id: String,
    reset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadOutcome {
    Applied,
    /// La respuesta pertenecía a una carga ya superada y se ignoró.
    Stale,
}

/// Resultado de las dos consultas de carga, ya convertido.
#[derive(Debug, Clone, Default)]
pub struct LoadedPlan {
    pub years: Vec<CurriculumYear>,
    pub relations: Vec<PrerequisiteRelation>,
    pub issues: Vec<DocumentIssue>,
}

pub struct CurriculumStore {
    identity: Option<IdentityContext>,
    years: Vec<CurriculumYear>,
    relations: Vec<PrerequisiteRelation>,
    issues: Vec<DocumentIssue>,
    graph: CurriculumGraph,
    simulation: SimulationState,
    focus: FocusState,
    scheme: ColorScheme,
    layout: LayoutConfig,
    // paletas cacheadas: se regeneran sólo si cambia su clave
    palette: Vec<Color>,
    palette_years: Option<usize>,
    groups: HashMap<String, Color>,
    group_order: Vec<String>,
    rng: StdRng,
    seq: u64,
    // seq del envío de simulación pendiente; bloquea nuevas marcas
    submitting: Option<u64>,
    status: LoadStatus,
    open_plan: Option<OpenPlanTable>,
}

impl CurriculumStore {
    pub fn new(layout: LayoutConfig, color_seed: Option<u64>) -> Self {
        let rng = match color_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        CurriculumStore {
            identity: None,
            years: Vec::new(),
            relations: Vec::new(),
            issues: Vec::new(),
            graph: CurriculumGraph::empty(),
            simulation: SimulationState::new(),
            focus: FocusState::none(),
            scheme: ColorScheme::default(),
            layout,
            palette: Vec::new(),
            palette_years: None,
            groups: HashMap::new(),
            group_order: Vec::new(),
            rng,
            seq: 0,
            submitting: None,
            status: LoadStatus::Idle,
            open_plan: None,
        }
    }

    /// Abre una sesión. Descarta todo lo de la sesión anterior.
    pub fn init(&mut self, identity: IdentityContext) {
        self.teardown();
        info!(student = %identity.student_id, plan_id = identity.plan_id, "session started");
        self.identity = Some(identity);
    }

    /// Cierra la sesión; cualquier carga en curso queda obsoleta.
    pub fn teardown(&mut self) {
        self.seq += 1;
        self.identity = None;
        self.years.clear();
        self.relations.clear();
        self.issues.clear();
        self.graph = CurriculumGraph::empty();
        self.simulation = SimulationState::new();
        self.submitting = None;
        self.focus.clear();
        self.scheme = ColorScheme::default();
        self.status = LoadStatus::Idle;
        self.open_plan = None;
    }

    pub fn identity(&self) -> Result<&IdentityContext> {
        self.identity.as_ref().ok_or(EngineError::NoSession)
    }

    pub fn begin_load(&mut self) -> Result<LoadTicket> {
        self.start_load(false)
    }

    /// Como `begin_load`, pero al aplicarse limpia marcas, foco y modo simulado.
    /// Si la recarga falla la simulación queda intacta.
    pub fn begin_reset(&mut self) -> Result<LoadTicket> {
        self.start_load(true)
    }

    fn start_load(&mut self, reset: bool) -> Result<LoadTicket> {
        let student_id = self.identity()?.student_id.clone();
        self.seq += 1;
        self.status = LoadStatus::Loading;
        debug!(seq = self.seq, student = %student_id, reset, "load started");
        Ok(LoadTicket { seq: self.seq, student_id, reset })
    }

    /// Un ticket sigue vigente si no hubo otra carga ni cambio de sesión.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.seq == self.seq && self.identity.as_ref().is_some_and(|i| i.student_id == ticket.student_id)
    }

    pub fn complete_load(&mut self, ticket: &LoadTicket, result: Result<LoadedPlan>) -> Result<LoadOutcome> {
        if !self.is_current(ticket) {
            warn!(seq = ticket.seq, current = self.seq, "discarding stale load response");
            return Ok(LoadOutcome::Stale);
        }

        match result {
            Ok(plan) => {
                info!(
                    student = %ticket.student_id,
                    years = plan.years.len(),
                    relations = plan.relations.len(),
                    issues = plan.issues.len(),
                    "curriculum loaded"
                );
                if ticket.reset {
                    self.simulation.reset();
                    self.submitting = None;
                    self.focus.clear();
                }
                self.years = plan.years;
                self.relations = plan.relations;
                self.issues = plan.issues;
                self.status = LoadStatus::Ready;
                self.recompute();
                Ok(LoadOutcome::Applied)
            }
            Err(e) => {
                // se conserva el documento anterior
                warn!(error = %e, "curriculum load failed");
                self.status = LoadStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Regenera grafo, paletas y flags derivados a partir del documento.
    pub fn recompute(&mut self) {
        self.simulation.sync_dropped_flags(&mut self.years);

        if self.palette_years != Some(self.years.len()) {
            self.palette = semester_palette(self.years.len(), &mut self.rng);
            self.palette_years = Some(self.years.len());
        }

        let mut order: Vec<String> = Vec::new();
        for subject in self.years.iter().flat_map(|y| y.semesters.iter()).flat_map(|s| s.subjects.iter()) {
            if let Some(g) = &subject.group {
                if !order.contains(g) {
                    order.push(g.clone());
                }
            }
        }
        if order != self.group_order {
            self.groups = group_palette(order.iter().map(String::as_str), &mut self.rng);
            self.group_order = order;
        }

        self.graph = extract_graph(&self.years, &self.relations, &self.palette);
        self.focus.retain_in(&self.graph);
    }

    pub fn years(&self) -> &[CurriculumYear] {
        &self.years
    }

    pub fn relations(&self) -> &[PrerequisiteRelation] {
        &self.relations
    }

    pub fn graph(&self) -> &CurriculumGraph {
        &self.graph
    }

    pub fn simulation(&self) -> &SimulationState {
        &self.simulation
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn issues(&self) -> &[DocumentIssue] {
        &self.issues
    }

    pub fn focus(&self) -> &FocusState {
        &self.focus
    }

    pub fn scheme(&self) -> ColorScheme {
        self.scheme
    }

    pub fn click(&mut self, id: InstanceId) -> Result<Option<InstanceId>> {
        if !self.graph.contains(&id) {
            return Err(EngineError::UnknownInstance(id.to_string()));
        }
        self.focus.click(id);
        Ok(self.focus.focused().cloned())
    }

    pub fn clear_focus(&mut self) {
        self.focus.clear();
    }

    pub fn set_scheme(&mut self, scheme: ColorScheme) {
        self.scheme = scheme;
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.is_some()
    }

    fn ensure_not_submitting(&self) -> Result<()> {
        match self.submitting {
            Some(_) => Err(EngineError::SubmissionPending),
            None => Ok(()),
        }
    }

    pub fn toggle_course(&mut self, id: &InstanceId, kind: MutationKind) -> Result<ToggleOutcome> {
        self.ensure_not_submitting()?;
        let outcome = self.simulation.toggle_course(&self.graph, id, kind)?;
        self.simulation.sync_dropped_flags(&mut self.years);
        Ok(outcome)
    }

    pub fn toggle_semester(&mut self, year_index: usize, semester_index: usize) -> Result<SemesterToggle> {
        self.ensure_not_submitting()?;
        let outcome = self.simulation.toggle_semester(&self.years, year_index, semester_index)?;
        self.simulation.sync_dropped_flags(&mut self.years);
        Ok(outcome)
    }

    /// Arma el envío de la simulación. El ticket permite descartar la
    /// respuesta si mientras tanto hubo una recarga o cambio de sesión.
    /// Hasta `apply_simulation` o `abort_submission` no se aceptan marcas nuevas.
    pub fn prepare_submission(&mut self) -> Result<(SubmissionPayload, IdentityContext, LoadTicket)> {
        let identity = self.identity()?.clone();
        self.ensure_not_submitting()?;
        if self.simulation.is_empty() {
            return Err(EngineError::NothingToSimulate);
        }
        let payload = self.simulation.build_submission_payload(&self.graph, &identity);
        if !payload.desynced.is_empty() {
            warn!(count = payload.desynced.len(), "submitting mutations without matching course instance");
        }
        let ticket = LoadTicket { seq: self.seq, student_id: identity.student_id.clone(), reset: false };
        self.submitting = Some(ticket.seq);
        Ok((payload, identity, ticket))
    }

    /// Libera el bloqueo de marcas si el ticket es el del envío pendiente.
    pub fn abort_submission(&mut self, ticket: &LoadTicket) {
        if self.submitting == Some(ticket.seq) {
            self.submitting = None;
        }
    }

    /// Aplica el plan devuelto por la simulación y pasa a modo simulado.
    pub fn apply_simulation(&mut self, ticket: &LoadTicket, years: Vec<CurriculumYear>, issues: Vec<DocumentIssue>) -> LoadOutcome {
        if !self.is_current(ticket) {
            warn!("discarding stale simulation response");
            self.abort_submission(ticket);
            return LoadOutcome::Stale;
        }
        self.submitting = None;
        self.simulation.mark_committed();
        self.years = years;
        self.issues = issues;
        self.status = LoadStatus::Ready;
        self.recompute();
        info!(student = %ticket.student_id, years = self.years.len(), "simulation applied");
        LoadOutcome::Applied
    }

    pub fn open_plan(&self) -> Option<&OpenPlanTable> {
        self.open_plan.as_ref()
    }

    pub fn open_plan_mut(&mut self) -> Option<&mut OpenPlanTable> {
        self.open_plan.as_mut()
    }

    pub fn set_open_plan(&mut self, table: OpenPlanTable) {
        self.open_plan = Some(table);
    }

    pub fn color_context(&self, today: NaiveDate) -> ColorContext {
        ColorContext::new(self.scheme, self.groups.clone(), current_academic_year(today))
    }

    pub fn view(&self, today: NaiveDate) -> GraphView {
        let ctx = self.color_context(today);
        build_view(&self.years, &self.graph, &self.simulation, &self.focus, &ctx, &self.layout)
    }
}
