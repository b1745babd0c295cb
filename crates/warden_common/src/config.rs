//! Configuration management for archwarden.
//!
//! Loads settings from `$ARCHWARDEN_CONFIG`, then /etc/archwarden/config.toml,
//! or uses defaults when neither exists.

use crate::error::{WardenError, WardenResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file path
pub const CONFIG_PATH: &str = "/etc/archwarden/config.toml";

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "ARCHWARDEN_CONFIG";

/// Maintenance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Directory holding logs, audit reports, final reports and backups
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Log/report files older than this many days are pruned at startup
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,

    /// Seconds between sudo grant refreshes
    #[serde(default = "default_keeper_interval")]
    pub keeper_interval_secs: u64,

    /// Filesystems at or above this usage are flagged in recommendations
    #[serde(default = "default_disk_alert")]
    pub disk_usage_alert_percent: u8,

    /// AUR helper run as the invoking user
    #[serde(default = "default_aur_helper")]
    pub aur_helper: String,

    /// Packages the probes and maintenance steps depend on
    #[serde(default = "default_prerequisites")]
    pub prerequisites: Vec<String>,

    /// Firmware and driver packages kept installed
    #[serde(default = "default_driver_packages")]
    pub driver_packages: Vec<String>,

    /// Units restarted after the upgrade
    #[serde(default = "default_services")]
    pub services: Vec<String>,

    /// Files copied into the session backup directory before mutating steps
    #[serde(default = "default_backup_files")]
    pub backup_files: Vec<PathBuf>,

    /// Where installed kernels keep their modules; the reboot check looks
    /// for the running release here
    #[serde(default = "default_modules_root")]
    pub modules_root: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/var/log/archwarden")
}

fn default_retention_days() -> u64 {
    30
}

fn default_keeper_interval() -> u64 {
    60
}

fn default_disk_alert() -> u8 {
    80
}

fn default_aur_helper() -> String {
    "yay".to_string()
}

fn default_prerequisites() -> Vec<String> {
    [
        "pacman-contrib",
        "reflector",
        "smartmontools",
        "lm_sensors",
        "pciutils",
        "usbutils",
        "lsof",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_driver_packages() -> Vec<String> {
    ["linux-firmware", "sof-firmware", "alsa-firmware"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_services() -> Vec<String> {
    ["systemd-timesyncd.service", "systemd-journald.service"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_backup_files() -> Vec<PathBuf> {
    [
        "/etc/pacman.conf",
        "/etc/pacman.d/mirrorlist",
        "/etc/fstab",
        "/etc/mkinitcpio.conf",
        "/etc/default/grub",
        "/etc/sudoers",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

fn default_modules_root() -> PathBuf {
    PathBuf::from("/usr/lib/modules")
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            retention_days: default_retention_days(),
            keeper_interval_secs: default_keeper_interval(),
            disk_usage_alert_percent: default_disk_alert(),
            aur_helper: default_aur_helper(),
            prerequisites: default_prerequisites(),
            driver_packages: default_driver_packages(),
            services: default_services(),
            backup_files: default_backup_files(),
            modules_root: default_modules_root(),
        }
    }
}

impl WardenConfig {
    /// Load config from the environment override or the system path.
    ///
    /// A missing file yields defaults. An unreadable or malformed file is an
    /// error so the caller can report it before falling back.
    pub fn load() -> WardenResult<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH));

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&path)
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> WardenResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| WardenError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
            .map_err(|e| WardenError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse config from TOML text
    pub fn from_toml(content: &str) -> WardenResult<Self> {
        toml::from_str(content).map_err(|e| WardenError::Config(e.to_string()))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.saturating_mul(24 * 60 * 60))
    }

    pub fn keeper_interval(&self) -> Duration {
        Duration::from_secs(self.keeper_interval_secs.max(1))
    }
}
