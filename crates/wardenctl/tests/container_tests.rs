//! Container cleanup and the operator's chance to abort.

mod common;

use common::Harness;
use warden_common::WardenError;
use wardenctl::pipeline;
use wardenctl::plan;
use wardenctl::step::Step;

fn cleanup_then_marker() -> Vec<Step> {
    vec![plan::container_cleanup(), Step::command("Marker", "true")]
}

/// Without docker the step is skipped and nothing is asked.
#[test]
fn test_docker_absent_skips_cleanup() {
    let mut h = Harness::new();

    let summary = pipeline::run(&cleanup_then_marker(), &mut h.ctx()).unwrap();

    assert_eq!(summary.skipped, 1);
    assert!(h.operator.questions.is_empty());
    assert!(!h.runner.ran("docker"));
    assert_eq!(h.audit_text(), "");
}

/// Idle docker host: prune without asking.
#[test]
fn test_no_running_containers_prunes_directly() {
    let mut h = Harness::new();
    h.resolver.install("docker");
    h.runner.on("docker ps -q", 0, "");
    h.runner.on("docker system prune", 0, "Total reclaimed space: 1.2GB\n");

    pipeline::run(&cleanup_then_marker(), &mut h.ctx()).unwrap();

    assert!(h.operator.questions.is_empty());
    assert!(h.log().contains("    Total reclaimed space: 1.2GB"));
}

/// Running containers plus a yes ends the session before any pruning.
#[test]
fn test_operator_abort_stops_session() {
    let mut h = Harness::new();
    h.resolver.install("docker");
    h.runner.on("docker ps -q", 0, "3f2a9c1b\n8e7d6c5b\n");
    h.operator.confirmations.push_back(true);

    let result = pipeline::run(&cleanup_then_marker(), &mut h.ctx());

    match result {
        Err(e) => {
            assert!(e.is_abort());
            assert!(matches!(
                e,
                WardenError::Aborted { ref step } if step == "Clean up containers"
            ));
            assert_eq!(e.exit_code(), 1);
        }
        Ok(summary) => panic!("expected abort, got {:?}", summary),
    }
    assert!(!h.runner.ran("docker system prune"));
    assert!(!h.runner.ran("true"));
    assert!(h.log().contains("2 container(s) are running"));
}

/// Declining the abort goes on with the prune and the rest of the pipeline.
#[test]
fn test_declined_abort_continues() {
    let mut h = Harness::new();
    h.resolver.install("docker");
    h.runner.on("docker ps -q", 0, "3f2a9c1b\n");
    h.operator.confirmations.push_back(false);

    let summary = pipeline::run(&cleanup_then_marker(), &mut h.ctx()).unwrap();

    assert_eq!(summary.completed, 2);
    assert_eq!(h.operator.questions.len(), 1);
    assert!(h.runner.ran("docker system prune -f"));
    assert!(h.runner.ran("true"));
}
