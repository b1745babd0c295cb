//! Maintenance step catalog
//!
//! The mutating steps of a session and the few actions that are more than a
//! single command (config backup, reboot check). Package installation is the
//! only fatal kind of step.

use crate::context::RunContext;
use crate::pipeline::{StepFailure, StepOutcome, StepResult};
use crate::step::{Action, FailurePolicy, Step};
use std::fs;
use std::path::{Path, PathBuf};
use warden_common::{ui, Invocation, WardenConfig};

/// Single-quote a word for `sh`
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_.+@:/=".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', r"'\''"))
}

fn pacman_install(name: &str, packages: &[String]) -> Option<Step> {
    if packages.is_empty() {
        return None;
    }
    let packages: Vec<String> = packages.iter().map(|p| shell_quote(p)).collect();
    Some(
        Step::command(
            name,
            format!("pacman -S --needed --noconfirm {}", packages.join(" ")),
        )
        .fatal(),
    )
}

/// Packages the rest of the session relies on. Fatal.
pub fn install_prerequisites(config: &WardenConfig) -> Option<Step> {
    pacman_install("Install prerequisite packages", &config.prerequisites)
}

/// Firmware and driver packages. Fatal.
pub fn install_drivers(config: &WardenConfig) -> Option<Step> {
    pacman_install("Install driver and firmware packages", &config.driver_packages)
}

pub fn backup_step() -> Step {
    Step::new(
        "Back up configuration files",
        FailurePolicy::WarnAndContinue,
        Action::BackupConfigs,
    )
}

pub fn refresh_mirrors() -> Step {
    Step::command(
        "Refresh mirror list",
        "reflector --latest 20 --protocol https --sort rate --save /etc/pacman.d/mirrorlist",
    )
    .requires("reflector")
}

pub fn system_upgrade() -> Step {
    Step::command("Upgrade system packages", "pacman -Syu --noconfirm")
}

/// AUR helpers refuse to run as root; this one runs as the invoking user
pub fn aur_upgrade(config: &WardenConfig) -> Step {
    Step::command(
        "Upgrade AUR packages",
        format!("{} -Syu --noconfirm", shell_quote(&config.aur_helper)),
    )
    .requires(config.aur_helper.clone())
    .as_invoking_user()
}

pub fn power_management() -> Step {
    Step::command("Enable power management", "systemctl enable --now tlp.service")
        .requires("tlp")
}

/// zswap in front of zram compresses pages twice
pub fn swap_compression() -> Step {
    Step::command(
        "Fix swap compression",
        "zswap=/sys/module/zswap/parameters/enabled\n\
         if [ -w \"$zswap\" ]; then echo 0 > \"$zswap\"; fi\n\
         systemctl restart systemd-zram-setup@zram0.service",
    )
    .requires("zramctl")
}

pub fn restart_services(config: &WardenConfig) -> Vec<Step> {
    config
        .services
        .iter()
        .map(|unit| {
            Step::command(
                format!("Restart {}", unit),
                format!("systemctl restart {}", shell_quote(unit)),
            )
            .requires("systemctl")
        })
        .collect()
}

pub fn trim() -> Step {
    Step::command("Trim filesystems", "fstrim -av").requires("fstrim")
}

pub fn btrfs_balance() -> Step {
    Step::command(
        "Balance btrfs root",
        "btrfs balance start -dusage=50 -musage=50 /",
    )
    .on_btrfs_root()
}

pub fn btrfs_defragment() -> Step {
    Step::command("Defragment btrfs root", "btrfs filesystem defragment -r /").on_btrfs_root()
}

pub fn refresh_keys() -> Step {
    Step::command("Refresh package signing keys", "pacman-key --refresh-keys")
        .requires("pacman-key")
}

pub fn clean_package_cache() -> Step {
    Step::command("Clean package cache", "paccache -rk2").requires("paccache")
}

pub fn vacuum_journal() -> Step {
    Step::command("Vacuum journal", "journalctl --vacuum-time=2weeks").requires("journalctl")
}

pub fn reboot_reminder() -> Step {
    Step::new(
        "Check for pending reboot",
        FailurePolicy::WarnAndContinue,
        Action::RebootCheck,
    )
}

/// Target of a backed-up file: its absolute path re-rooted under `backup_dir`
pub fn backup_target(backup_dir: &Path, file: &Path) -> PathBuf {
    backup_dir.join(file.strip_prefix("/").unwrap_or(file))
}

/// Copy the configured files into the session backup directory.
///
/// Missing or unreadable files are warned about and skipped; only failing to
/// create the backup directory fails the step.
pub fn backup_configs(ctx: &mut RunContext<'_>) -> StepResult {
    let backup_dir = ctx.session.backup_dir();
    fs::create_dir_all(backup_dir).map_err(|e| {
        StepFailure::Failed(format!("cannot create {}: {}", backup_dir.display(), e))
    })?;

    let mut copied = 0;
    for file in &ctx.config.backup_files {
        if !file.is_file() {
            ui::info(
                ctx.transcript,
                format!("{} not present, not backed up", file.display()),
            );
            continue;
        }

        let target = backup_target(backup_dir, file);
        let result = match target.parent() {
            Some(parent) => fs::create_dir_all(parent).and_then(|_| fs::copy(file, &target)),
            None => fs::copy(file, &target),
        };
        match result {
            Ok(_) => copied += 1,
            Err(e) => ui::warn(
                ctx.transcript,
                format!("Could not back up {}: {}", file.display(), e),
            ),
        }
    }

    ui::info(
        ctx.transcript,
        format!("Backed up {} file(s) to {}", copied, backup_dir.display()),
    );
    Ok(StepOutcome::Completed)
}

/// The running kernel lost its modules: the package was upgraded underneath it
pub fn reboot_required(running_release: &str, modules_root: &Path) -> bool {
    !running_release.is_empty() && !modules_root.join(running_release).is_dir()
}

pub fn reboot_check(ctx: &mut RunContext<'_>) -> StepResult {
    let outcome = ctx.runner.capture(&Invocation::shell("uname -r"))?;
    if !outcome.success() {
        return Err(StepFailure::Failed(format!(
            "cannot read running kernel: {}",
            outcome.failure_reason()
        )));
    }

    let release = outcome.output.trim();
    if reboot_required(release, &ctx.config.modules_root) {
        ui::warn(
            ctx.transcript,
            format!(
                "Reboot recommended: running kernel {} is no longer installed",
                release
            ),
        );
    } else {
        ui::info(ctx.transcript, format!("Running kernel {} is current", release));
    }
    Ok(StepOutcome::Completed)
}

/// `/` is btrfs and the btrfs tool is available
pub fn root_is_btrfs(ctx: &RunContext<'_>) -> bool {
    if !ctx.resolver.is_installed("btrfs") {
        return false;
    }
    ctx.runner
        .capture(&Invocation::shell("findmnt -n -o FSTYPE /"))
        .map(|outcome| outcome.success() && outcome.output.trim() == "btrfs")
        .unwrap_or(false)
}
