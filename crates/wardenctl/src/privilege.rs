//! Privilege guard
//!
//! Maintenance needs root. When started unprivileged we re-exec ourselves
//! through sudo with the same arguments; the elevated process becomes the
//! session and this one is replaced.

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use warden_common::{WardenError, WardenResult};

/// Environment variables carried across the sudo boundary
pub const PRESERVED_ENV: &[&str] = &["ARCHWARDEN_CONFIG", "ARCHWARDEN_LOG", "NO_COLOR"];

/// Check if we're running as root
pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Arguments handed to `sudo` to re-run `exe` with `args`
pub fn elevation_args(exe: &Path, args: &[OsString]) -> Vec<OsString> {
    let mut argv = vec![
        OsString::from(format!("--preserve-env={}", PRESERVED_ENV.join(","))),
        OsString::from("--"),
        exe.as_os_str().to_os_string(),
    ];
    argv.extend(args.iter().cloned());
    argv
}

/// Return when already root, otherwise replace this process with an elevated
/// copy of itself.
///
/// Only returns `Err`: if the exec itself fails (sudo missing, not
/// executable). A denied password ends the sudo process with its own nonzero
/// status, which becomes ours.
pub fn ensure_elevated() -> WardenResult<()> {
    if is_root() {
        return Ok(());
    }

    let exe = std::env::current_exe()
        .map_err(|e| WardenError::Elevation(format!("cannot locate own executable: {}", e)))?;
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    eprintln!("archwarden needs administrator rights; re-running through sudo");

    let err = Command::new("sudo").args(elevation_args(&exe, &args)).exec();
    Err(WardenError::Elevation(format!("failed to execute sudo: {}", err)))
}

/// The non-root user who invoked sudo, if any
pub fn invoking_user() -> Option<String> {
    std::env::var("SUDO_USER")
        .ok()
        .filter(|user| !user.is_empty() && user != "root")
}
