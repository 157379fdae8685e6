#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use eduplan::api_json::{OpenPlanChangeRequest, OpenPlanRawRow, PrerequisiteRow, StudyPlanRow, SubmissionRequest};
use eduplan::client::{OpenPlanSource, PlanSource, SimulationSink};
use eduplan::error::CollaboratorError;
use eduplan::layout::LayoutConfig;
use eduplan::models::{IdentityContext, InstanceId, Semester, YearLabel};
use eduplan::{CurriculumStore, PlanService};

pub struct Gate {
    pub student: String,
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Default)]
pub struct MockApi {
    pub plans: HashMap<String, Vec<StudyPlanRow>>,
    pub prereqs: Vec<PrerequisiteRow>,
    pub simulated: Vec<StudyPlanRow>,
    pub open_rows: Vec<OpenPlanRawRow>,
    pub fail_plan: AtomicBool,
    pub fail_submit: AtomicBool,
    pub fail_open: AtomicBool,
    pub submissions: Mutex<Vec<SubmissionRequest>>,
    pub open_calls: Mutex<Vec<(OpenPlanChangeRequest, bool)>>,
    pub gate: Option<Gate>,
    pub submit_gate: Option<Gate>,
}

pub fn remote_error(endpoint: &str) -> CollaboratorError {
    CollaboratorError::Status { status: 500, endpoint: endpoint.to_string() }
}

#[async_trait]
impl PlanSource for MockApi {
    async fn fetch_study_plan(&self, identity: &IdentityContext) -> Result<Vec<StudyPlanRow>, CollaboratorError> {
        if let Some(gate) = self.gate.as_ref().filter(|g| g.student == identity.student_id) {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_plan.load(Ordering::SeqCst) {
            return Err(remote_error("/open_plan"));
        }
        Ok(self.plans.get(&identity.student_id).cloned().unwrap_or_default())
    }

    async fn fetch_prerequisites(&self, _identity: &IdentityContext) -> Result<Vec<PrerequisiteRow>, CollaboratorError> {
        Ok(self.prereqs.clone())
    }
}

#[async_trait]
impl SimulationSink for MockApi {
    async fn submit(&self, _identity: &IdentityContext, request: &SubmissionRequest) -> Result<Vec<StudyPlanRow>, CollaboratorError> {
        if let Some(gate) = self.submit_gate.as_ref() {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(remote_error("/open_plan/submit_drop_fail_course/"));
        }
        self.submissions.lock().unwrap().push(request.clone());
        Ok(self.simulated.clone())
    }
}

#[async_trait]
impl OpenPlanSource for MockApi {
    async fn fetch_open_plan(&self, _identity: &IdentityContext) -> Result<(i64, Vec<OpenPlanRawRow>), CollaboratorError> {
        Ok((12, self.open_rows.clone()))
    }

    async fn set_course_open(
        &self,
        _identity: &IdentityContext,
        change: &OpenPlanChangeRequest,
        open: bool,
    ) -> Result<(), CollaboratorError> {
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(remote_error("/removed_course_open_plan"));
        }
        self.open_calls.lock().unwrap().push((change.clone(), open));
        Ok(())
    }
}

pub fn plan_rows() -> Vec<StudyPlanRow> {
    serde_json::from_value(json!([
        {"CID": "CS101", "CNAME": "Programming", "YEAR": 66, "SEM": 1, "GRADE": "A", "GNAME": "Core"},
        {"CID": "CS102", "CNAME": "Discrete", "YEAR": 66, "SEM": 1, "GRADE": "Undefined", "GNAME": "Core"},
        {"CID": "CS201", "CNAME": "Data Structures", "YEAR": 66, "SEM": 2, "GRADE": "Undefined", "GNAME": "Major"}
    ]))
    .unwrap()
}

pub fn simulated_rows() -> Vec<StudyPlanRow> {
    serde_json::from_value(json!([
        {"CID": "CS101", "CNAME": "Programming", "YEAR": 66, "SEM": 1, "GRADE": "A"},
        {"CID": "CS102", "CNAME": "Discrete", "YEAR": 66, "SEM": 1, "GRADE": "F"},
        {"CID": "CS102", "CNAME": "Discrete", "YEAR": 67, "SEM": 1, "GRADE": "Undefined"},
        {"CID": "CS201", "CNAME": "Data Structures", "YEAR": 67, "SEM": 2, "GRADE": "Undefined"}
    ]))
    .unwrap()
}

pub fn prereq_rows() -> Vec<PrerequisiteRow> {
    serde_json::from_value(json!([
        {"PrerequisiteCourse": {"ID": "CS101", "Name": "Programming"}, "CurrentCourse": {"ID": "CS201", "Name": "Data Structures"}},
        {"PrerequisiteCourse": {"ID": "CS102", "Name": "Discrete"}, "CurrentCourse": {"ID": "CS201", "Name": "Data Structures"}}
    ]))
    .unwrap()
}

pub fn open_rows() -> Vec<OpenPlanRawRow> {
    serde_json::from_value(json!([
        {"CID": "CS101", "CNAME": "Programming", "GID": 1, "GNAME": "Core", "ALLOWYEAR": 1, "OPENSEM": 1},
        {"CID": "CS101", "CNAME": "Programming", "GID": 1, "GNAME": "Core", "ALLOWYEAR": 1, "OPENSEM": 2},
        {"CID": "CS201", "CNAME": "Data Structures", "GID": 2, "GNAME": "Major", "ALLOWYEAR": 2, "OPENSEM": 2}
    ]))
    .unwrap()
}

pub fn mock() -> MockApi {
    let mut plans = HashMap::new();
    plans.insert("s1".to_string(), plan_rows());
    MockApi {
        plans,
        prereqs: prereq_rows(),
        simulated: simulated_rows(),
        open_rows: open_rows(),
        ..Default::default()
    }
}

pub fn identity(student: &str) -> IdentityContext {
    IdentityContext { student_id: student.to_string(), plan_id: 12, access_token: "tok".to_string() }
}

pub fn service(api: MockApi) -> (PlanService, Arc<MockApi>) {
    let api = Arc::new(api);
    let store = CurriculumStore::new(LayoutConfig::default(), Some(11));
    (PlanService::new(store, api.clone(), api.clone(), api.clone()), api)
}

pub fn id(code: &str, year: u16, sem: Semester) -> InstanceId {
    InstanceId::new(code, YearLabel::new(year), sem)
}
