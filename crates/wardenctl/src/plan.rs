//! Pipelines per mode
//!
//! The unattended run and every interactive bundle are plain step lists built
//! from the maintenance catalog and the probe registry.

use crate::maintenance as m;
use crate::probes;
use crate::step::{Action, FailurePolicy, Step};
use warden_common::WardenConfig;

pub fn container_cleanup() -> Step {
    Step::new(
        "Clean up containers",
        FailurePolicy::WarnAndContinue,
        Action::ContainerCleanup,
    )
}

pub fn recommendations() -> Step {
    Step::new(
        "Generate recommendations",
        FailurePolicy::WarnAndContinue,
        Action::Recommendations,
    )
}

pub fn final_report() -> Step {
    Step::new(
        "Assemble final report",
        FailurePolicy::WarnAndContinue,
        Action::FinalReport,
    )
}

fn audit_tail() -> Vec<Step> {
    vec![
        Step::probes("Hardware inventory", probes::hardware()),
        Step::probes("Security posture", probes::security()),
        Step::probes("Extended audit", probes::extended()),
        recommendations(),
        final_report(),
    ]
}

/// Full unattended session, in execution order
pub fn unattended(config: &WardenConfig) -> Vec<Step> {
    let mut steps = Vec::new();
    steps.extend(m::install_prerequisites(config));
    steps.push(m::backup_step());
    steps.push(m::refresh_mirrors());
    steps.push(m::system_upgrade());
    steps.push(m::aur_upgrade(config));
    steps.extend(m::install_drivers(config));
    steps.push(m::power_management());
    steps.push(m::swap_compression());
    steps.extend(m::restart_services(config));
    steps.push(m::trim());
    steps.push(m::btrfs_balance());
    steps.push(m::btrfs_defragment());
    steps.push(m::refresh_keys());
    steps.push(m::clean_package_cache());
    steps.push(m::vacuum_journal());
    steps.push(m::reboot_reminder());
    steps.push(container_cleanup());
    steps.extend(audit_tail());
    steps
}

/// Packages, mirrors, keys
pub fn update_bundle(config: &WardenConfig) -> Vec<Step> {
    let mut steps = Vec::new();
    steps.extend(m::install_prerequisites(config));
    steps.push(m::backup_step());
    steps.push(m::refresh_mirrors());
    steps.push(m::system_upgrade());
    steps.push(m::aur_upgrade(config));
    steps.extend(m::install_drivers(config));
    steps.push(m::refresh_keys());
    steps.push(m::reboot_reminder());
    steps
}

pub fn cleanup_bundle() -> Vec<Step> {
    vec![
        m::clean_package_cache(),
        m::vacuum_journal(),
        m::trim(),
        m::btrfs_balance(),
        m::btrfs_defragment(),
        container_cleanup(),
    ]
}

pub fn security_bundle() -> Vec<Step> {
    vec![Step::probes("Basic security check", probes::basic_security())]
}

pub fn audit_bundle() -> Vec<Step> {
    audit_tail()
}
