//! Final report assembly and recommendations.

mod common;

use common::Harness;
use std::fs;
use warden_common::ui;
use wardenctl::plan;
use wardenctl::{pipeline, report};

/// The final report is both headers around the untouched sources.
#[test]
fn test_finalize_concatenates_log_and_audit() {
    let mut h = Harness::new();
    h.audit.section("Memory", "Mem: 16Gi\n").unwrap();
    ui::info(&h.transcript, "probing done");

    let log_before = fs::read(h.session.log_path()).unwrap();
    let audit_before = fs::read(h.session.audit_path()).unwrap();

    let path = report::finalize(&h.session).unwrap();

    assert_eq!(path, h.final_report());
    let mut expected = b"=== SESSION LOG ===\n".to_vec();
    expected.extend_from_slice(&log_before);
    expected.extend_from_slice(b"=== AUDIT REPORT ===\n");
    expected.extend_from_slice(&audit_before);
    assert_eq!(fs::read(&path).unwrap(), expected);

    assert_eq!(fs::read(h.session.log_path()).unwrap(), log_before);
    assert_eq!(fs::read(h.session.audit_path()).unwrap(), audit_before);
}

/// Finalizing twice never overwrites the first report.
#[test]
fn test_second_finalize_gets_new_file() {
    let h = Harness::new();

    let first = report::finalize(&h.session).unwrap();
    let first_content = fs::read(&first).unwrap();
    ui::warn(&h.transcript, "late line");
    let second = report::finalize(&h.session).unwrap();

    assert_ne!(first, second);
    assert!(second
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("2024-03-01_10-00-00.1.txt"));
    assert_eq!(fs::read(&first).unwrap(), first_content);
    assert!(fs::read_to_string(&second).unwrap().contains("late line"));
    assert_eq!(report::final_reports(&h.session), vec![first, second]);
}

/// The exit summary lists every final report of the session.
#[test]
fn test_summary_lists_numbered_reports() {
    let h = Harness::new();
    assert!(report::final_reports(&h.session).is_empty());

    let first = report::finalize(&h.session).unwrap();
    let second = report::finalize(&h.session).unwrap();
    report::print_summary(&h.session, &h.transcript);

    let log = h.log();
    assert!(log.contains(&format!("Full report: {}", first.display())));
    assert!(log.contains(&format!("Full report: {}", second.display())));
}

/// Recommendations count each distinct severity line and flag full disks.
#[test]
fn test_recommendations_section() {
    let mut h = Harness::new();
    ui::warn(&h.transcript, "mirror slow");
    ui::warn(&h.transcript, "mirror slow");
    ui::error(&h.transcript, "pacman failed");
    ui::warn(&h.transcript, "mirror slow");
    h.runner.on(
        "df -h",
        0,
        "Filesystem Type Size Used Avail Use% Mounted on\n\
         /dev/sda2 ext4 100G 91G 9G 91% /\n\
         tmpfs tmpfs 8G 0 8G 0% /tmp\n\
         /dev/sda1 vfat 511M 100M 411M 20% /boot\n",
    );

    pipeline::run(&[plan::recommendations()], &mut h.ctx()).unwrap();

    let audit = h.audit_text();
    assert!(audit.starts_with("\n=== Recommendations ===\n"));
    let warn_at = audit.find("3x  [WARNING] mirror slow").expect("warning counted");
    let error_at = audit.find("1x  [ERROR] pacman failed").expect("error counted");
    assert!(warn_at < error_at);
    assert_eq!(audit.matches("mirror slow").count(), 1);

    let root = audit.lines().find(|l| l.ends_with(" /  <-- HIGH"));
    assert!(root.is_some(), "root flagged:\n{}", audit);
    assert!(!audit.contains("tmpfs"));
    assert!(audit.lines().any(|l| l.ends_with("/boot")));
}

/// The full audit bundle writes the recommendations before assembling the
/// report, so the report carries them.
#[test]
fn test_audit_bundle_report_includes_recommendations() {
    let mut h = Harness::new();

    pipeline::run(&plan::audit_bundle(), &mut h.ctx()).unwrap();

    let full = fs::read_to_string(h.final_report()).unwrap();
    let audit_at = full.find("=== AUDIT REPORT ===").unwrap();
    assert!(full[audit_at..].contains("=== Recommendations ==="));
    assert!(full[..audit_at].contains("==> Assemble final report"));
}
