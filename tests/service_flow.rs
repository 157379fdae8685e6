mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::sync::Notify;

use common::{id, identity, mock, service, simulated_rows, Gate};
use eduplan::layout::ColorScheme;
use eduplan::models::{MutationKind, Semester};
use eduplan::store::{LoadOutcome, LoadStatus};
use eduplan::EngineError;

#[tokio::test]
async fn test_load_builds_graph() {
    let (svc, _) = service(mock());
    assert_eq!(svc.start_session(identity("s1")).await.unwrap(), LoadOutcome::Applied);

    let view = svc.view().await.unwrap();
    assert_eq!(view.nodes.len(), 3);
    assert!(view.edges.is_empty());

    let store = svc.store();
    let store = store.lock().await;
    assert_eq!(store.graph().edges.len(), 2);
    assert_eq!(store.relations().len(), 2);
    assert_eq!(store.status(), &LoadStatus::Ready);
}

#[tokio::test]
async fn test_failed_load_keeps_previous_document() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();

    api.fail_plan.store(true, Ordering::SeqCst);
    let err = svc.load().await.unwrap_err();
    assert!(matches!(err, EngineError::Collaborator(_)));

    let view = svc.view().await.unwrap();
    assert_eq!(view.nodes.len(), 3);
    assert!(matches!(svc.store().lock().await.status(), LoadStatus::Failed(_)));
}

#[tokio::test]
async fn test_simulate_commits_and_blocks_edits() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();

    let discrete = id("CS102", 66, Semester::First);
    svc.toggle_course(&discrete, MutationKind::Failed).await.unwrap();
    let report = svc.simulate().await.unwrap();
    assert_eq!(report.outcome, LoadOutcome::Applied);

    let sent = api.submissions.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].student_id, "s1");
    assert_eq!(sent[0].plan_id, 12);
    assert_eq!(sent[0].courses[0].code, "CS102");
    assert_eq!(sent[0].courses[0].name, "Discrete");
    assert_eq!(sent[0].courses[0].kind, "Failed");

    let view = svc.view().await.unwrap();
    assert!(view.simulated);
    assert_eq!(view.nodes.len(), 4);
    assert!(view.nodes.iter().all(|n| !n.editable));
    assert!(view.semesters.iter().all(|s| s.drop_checkbox.is_none()));

    let retake = id("CS102", 67, Semester::First);
    let err = svc.toggle_course(&retake, MutationKind::Dropped).await.unwrap_err();
    assert!(matches!(err, EngineError::NotEditable(_)));
}

#[tokio::test]
async fn test_failed_submit_keeps_marks() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    svc.toggle_semester(0, 1).await.unwrap();

    api.fail_submit.store(true, Ordering::SeqCst);
    assert!(svc.simulate().await.is_err());

    let store = svc.store();
    let store = store.lock().await;
    assert_eq!(store.simulation().mutations().len(), 1);
    assert!(!store.simulation().is_committed());
    assert!(store.years()[0].semesters[1].dropped);
}

#[tokio::test]
async fn test_simulate_without_marks() {
    let (svc, _) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    assert!(matches!(svc.simulate().await, Err(EngineError::NothingToSimulate)));
}

#[tokio::test]
async fn test_reset_reloads_original_plan() {
    let (svc, _) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    svc.toggle_course(&id("CS201", 66, Semester::Second), MutationKind::Dropped).await.unwrap();
    svc.simulate().await.unwrap();

    assert_eq!(svc.reset().await.unwrap(), LoadOutcome::Applied);
    let view = svc.view().await.unwrap();
    assert!(!view.simulated);
    assert_eq!(view.nodes.len(), 3);
    assert!(view.nodes.iter().all(|n| n.mark.is_none()));
}

#[tokio::test]
async fn test_failed_reset_keeps_simulated_plan() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    svc.toggle_course(&id("CS102", 66, Semester::First), MutationKind::Failed).await.unwrap();
    svc.simulate().await.unwrap();

    api.fail_plan.store(true, Ordering::SeqCst);
    assert!(matches!(svc.reset().await, Err(EngineError::Collaborator(_))));

    let view = svc.view().await.unwrap();
    assert!(view.simulated);
    assert_eq!(view.nodes.len(), 4);
    assert!(view.nodes.iter().all(|n| !n.editable));

    let retake = id("CS102", 67, Semester::First);
    let err = svc.toggle_course(&retake, MutationKind::Failed).await.unwrap_err();
    assert!(matches!(err, EngineError::NotEditable(_)));

    api.fail_plan.store(false, Ordering::SeqCst);
    assert_eq!(svc.reset().await.unwrap(), LoadOutcome::Applied);
    assert!(!svc.view().await.unwrap().simulated);
}

#[tokio::test]
async fn test_marks_rejected_while_submit_pending() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut api = mock();
    api.submit_gate = Some(Gate { student: "s1".to_string(), entered: entered.clone(), release: release.clone() });
    let (svc, api) = service(api);
    svc.start_session(identity("s1")).await.unwrap();
    svc.toggle_course(&id("CS102", 66, Semester::First), MutationKind::Failed).await.unwrap();

    let pending = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.simulate().await })
    };
    entered.notified().await;

    let late = id("CS201", 66, Semester::Second);
    assert!(matches!(svc.toggle_course(&late, MutationKind::Dropped).await, Err(EngineError::SubmissionPending)));
    assert!(matches!(svc.toggle_semester(0, 1).await, Err(EngineError::SubmissionPending)));
    assert!(matches!(svc.simulate().await, Err(EngineError::SubmissionPending)));
    release.notify_one();

    let report = pending.await.unwrap().unwrap();
    assert_eq!(report.outcome, LoadOutcome::Applied);
    let sent = api.submissions.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].courses.len(), 1);

    let store = svc.store();
    let store = store.lock().await;
    assert!(store.simulation().is_committed());
    assert!(!store.is_submitting());
}

#[tokio::test]
async fn test_failed_submit_releases_marks() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    svc.toggle_course(&id("CS102", 66, Semester::First), MutationKind::Failed).await.unwrap();

    api.fail_submit.store(true, Ordering::SeqCst);
    assert!(svc.simulate().await.is_err());

    let late = id("CS201", 66, Semester::Second);
    assert!(svc.toggle_course(&late, MutationKind::Dropped).await.is_ok());
    assert_eq!(svc.store().lock().await.simulation().mutations().len(), 2);
}

#[tokio::test]
async fn test_scheme_requires_session() {
    let (svc, _) = service(mock());
    assert!(matches!(svc.set_scheme(ColorScheme::Time).await, Err(EngineError::NoSession)));

    svc.start_session(identity("s1")).await.unwrap();
    svc.set_scheme(ColorScheme::Group).await.unwrap();
    assert_eq!(svc.view().await.unwrap().scheme, ColorScheme::Group);
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    let entered = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let mut api = mock();
    api.plans.insert("s2".to_string(), simulated_rows());
    api.gate = Some(Gate { student: "s1".to_string(), entered: entered.clone(), release: release.clone() });
    let (svc, _) = service(api);

    let slow = {
        let svc = svc.clone();
        tokio::spawn(async move { svc.start_session(identity("s1")).await })
    };
    entered.notified().await;

    // otra identidad mientras la primera carga sigue pendiente
    svc.start_session(identity("s2")).await.unwrap();
    release.notify_one();

    assert_eq!(slow.await.unwrap().unwrap(), LoadOutcome::Stale);
    let store = svc.store();
    let store = store.lock().await;
    assert_eq!(store.identity().unwrap().student_id, "s2");
    assert_eq!(store.graph().nodes.len(), 4);
}

#[tokio::test]
async fn test_open_plan_rollback_on_failure() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    let table = svc.fetch_open_plan().await.unwrap();
    assert_eq!(table.rows.len(), 2);

    api.fail_open.store(true, Ordering::SeqCst);
    assert!(svc.toggle_open_plan("CS101", Semester::First, false).await.is_err());

    let store = svc.store();
    let store = store.lock().await;
    let row = store.open_plan().unwrap().row("CS101").unwrap();
    assert!(row.sem1 && row.sem2);
}

#[tokio::test]
async fn test_open_plan_guard_and_success() {
    let (svc, api) = service(mock());
    svc.start_session(identity("s1")).await.unwrap();
    svc.fetch_open_plan().await.unwrap();

    let err = svc.toggle_open_plan("CS201", Semester::Second, false).await.unwrap_err();
    match err {
        EngineError::Guard(g) => assert!(g.message.starts_with("A course must be open in at least one semester")),
        other => panic!("unexpected error: {other}"),
    }
    assert!(api.open_calls.lock().unwrap().is_empty());

    let table = svc.toggle_open_plan("CS201", Semester::First, true).await.unwrap();
    let row = table.row("CS201").unwrap();
    assert!(row.sem1 && row.sem2);

    let calls = api.open_calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].1);
    assert_eq!(calls[0].0.open_semester, 1);
    assert_eq!(calls[0].0.plan_id, 12);
}

#[tokio::test]
async fn test_no_session() {
    let (svc, _) = service(mock());
    assert!(matches!(svc.view().await, Err(EngineError::NoSession)));
    assert!(matches!(svc.load().await, Err(EngineError::NoSession)));
}
