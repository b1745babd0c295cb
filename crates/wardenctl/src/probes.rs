//! Probe registry
//!
//! The static, ordered probe batteries. Audit report sections appear in
//! exactly this order.
//!
//! Fallback lines exist only where the command is a presence check that
//! exits nonzero when it finds nothing (grep, checkupdates, pacman -Q
//! filters). Everything else is recorded exactly as the tool printed it.

use crate::probe::ProbeDescriptor;

/// Hardware inventory
pub fn hardware() -> Vec<ProbeDescriptor> {
    vec![
        ProbeDescriptor::new(
            "system",
            "System information",
            "uname -a; echo; cat /etc/os-release; echo; uptime",
        ),
        ProbeDescriptor::new("cpu", "CPU", "lscpu").requires("lscpu"),
        ProbeDescriptor::new("memory", "Memory", "free -h"),
        ProbeDescriptor::new(
            "block_devices",
            "Block devices",
            "lsblk -o NAME,SIZE,TYPE,FSTYPE,MOUNTPOINTS",
        )
        .requires("lsblk"),
        ProbeDescriptor::new("pci", "PCI devices and drivers", "lspci -k").requires("lspci"),
        ProbeDescriptor::new("usb", "USB devices", "lsusb").requires("lsusb"),
        ProbeDescriptor::new(
            "smart",
            "Disk health (SMART)",
            "for disk in $(lsblk -dno NAME -e 7,11); do \
             echo \"--- /dev/$disk\"; smartctl -H \"/dev/$disk\"; done",
        )
        .requires("smartctl"),
        ProbeDescriptor::new("sensors", "Temperatures and fans", "sensors").requires("sensors"),
        ProbeDescriptor::new(
            "disk_usage",
            "Disk usage",
            "df -hT -x tmpfs -x devtmpfs -x squashfs -x overlay -x efivarfs",
        ),
        ProbeDescriptor::new("network", "Network interfaces", "ip -brief address").requires("ip"),
        ProbeDescriptor::new(
            "top_memory",
            "Top memory consumers",
            "ps aux --sort=-%mem | head -n 11",
        ),
    ]
}

/// Security posture
pub fn security() -> Vec<ProbeDescriptor> {
    vec![
        ProbeDescriptor::new("listening", "Listening sockets", "ss -tulpn").requires("ss"),
        ProbeDescriptor::new("firewall", "Firewall ruleset", "nft list ruleset").requires("nft"),
        ProbeDescriptor::new(
            "unit_health",
            "Systemd unit health",
            "systemctl --failed --no-pager",
        )
        .requires("systemctl"),
        ProbeDescriptor::new(
            "ssh_logins",
            "SSH password rejections (7 days)",
            "journalctl -q -u sshd --since '-7d' --no-pager | grep -i 'failed password'",
        )
        .requires("journalctl")
        .or_else("No rejected SSH passwords found"),
        ProbeDescriptor::new(
            "sudoers_nopasswd",
            "Passwordless sudo rules",
            "grep -rn NOPASSWD /etc/sudoers /etc/sudoers.d",
        )
        .or_else("No NOPASSWD rules found"),
        ProbeDescriptor::new(
            "suid",
            "SUID binaries",
            "find / -xdev -perm -4000 -type f 2>/dev/null | sort",
        ),
        ProbeDescriptor::new(
            "world_writable",
            "World-writable files in /etc",
            "find /etc -xdev -type f -perm -0002 2>/dev/null",
        ),
        ProbeDescriptor::new(
            "sysctl",
            "Kernel hardening parameters",
            "sysctl kernel.kptr_restrict kernel.dmesg_restrict kernel.yama.ptrace_scope \
             kernel.unprivileged_bpf_disabled net.ipv4.conf.all.rp_filter net.ipv4.tcp_syncookies",
        )
        .requires("sysctl"),
        ProbeDescriptor::new("selinux", "SELinux", "sestatus").requires("sestatus"),
        ProbeDescriptor::new("apparmor", "AppArmor", "aa-status").requires("aa-status"),
        ProbeDescriptor::new(
            "pam",
            "PAM password policy",
            "grep -E 'pam_pwquality|pam_faillock|pam_pwhistory' \
             /etc/pam.d/system-auth /etc/pam.d/passwd",
        )
        .or_else("No password quality or lockout modules configured"),
        ProbeDescriptor::new("auditd", "Audit daemon", "auditctl -s; auditctl -l")
            .requires("auditctl"),
        ProbeDescriptor::new(
            "logrotate",
            "Log rotation",
            "cat /etc/logrotate.conf; echo; ls /etc/logrotate.d",
        )
        .requires("logrotate"),
        ProbeDescriptor::new(
            "sshd_config",
            "SSH daemon settings",
            "grep -Ei '^[[:space:]]*(PermitRootLogin|PasswordAuthentication|\
             PubkeyAuthentication|Port|X11Forwarding)' /etc/ssh/sshd_config",
        )
        .or_else("No explicit sshd hardening directives found"),
        ProbeDescriptor::new(
            "rootkits",
            "Rootkit scan",
            "rkhunter --check --skip-keypress --report-warnings-only",
        )
        .requires("rkhunter"),
        ProbeDescriptor::new("pending_updates", "Pending updates", "checkupdates")
            .requires("checkupdates")
            .or_else("No pending updates"),
    ]
}

/// Extended audit: packages, boot, logs, scheduling, swap, containers
pub fn extended() -> Vec<ProbeDescriptor> {
    vec![
        ProbeDescriptor::new("orphans", "Orphaned packages", "pacman -Qtdq")
            .requires("pacman")
            .or_else("No orphaned packages found"),
        ProbeDescriptor::new("foreign", "Foreign (AUR) packages", "pacman -Qm")
            .requires("pacman")
            .or_else("No foreign packages installed"),
        ProbeDescriptor::new("boot_time", "Boot time", "systemd-analyze time")
            .requires("systemd-analyze"),
        ProbeDescriptor::new(
            "slow_units",
            "Slowest units at boot",
            "systemd-analyze blame | head -n 15",
        )
        .requires("systemd-analyze"),
        ProbeDescriptor::new(
            "journal_priority",
            "Journal priority err and above (current boot)",
            "journalctl -p err -b --no-pager | tail -n 50",
        )
        .requires("journalctl"),
        ProbeDescriptor::new(
            "kernel_log",
            "Kernel log (err/warn)",
            "dmesg --level=err,warn | tail -n 30",
        ),
        ProbeDescriptor::new(
            "timers",
            "Scheduled timers",
            "systemctl list-timers --all --no-pager",
        )
        .requires("systemctl"),
        ProbeDescriptor::new("swap", "Swap devices", "swapon --show"),
        ProbeDescriptor::new("zram", "Compressed swap (zram)", "zramctl").requires("zramctl"),
        ProbeDescriptor::new("power", "Power management", "tlp-stat -s").requires("tlp-stat"),
        ProbeDescriptor::new(
            "cron",
            "Cron jobs",
            "ls -la /etc/cron.d /etc/cron.daily /etc/cron.hourly 2>/dev/null; \
             crontab -l 2>/dev/null",
        ),
        ProbeDescriptor::new("containers", "Containers", "docker ps -a").when_present("docker"),
        ProbeDescriptor::new(
            "container_disk",
            "Container disk usage",
            "docker system df",
        )
        .when_present("docker"),
    ]
}

/// Probes behind the interactive "basic security" choice
pub const BASIC_SECURITY: &[&str] = &["listening", "firewall", "unit_health", "sysctl"];

/// Quick security check, a subset of [`security`] in the same order
pub fn basic_security() -> Vec<ProbeDescriptor> {
    security()
        .into_iter()
        .filter(|probe| BASIC_SECURITY.contains(&probe.name))
        .collect()
}

/// Every probe of the full audit, in report order
pub fn full_battery() -> Vec<ProbeDescriptor> {
    let mut all = hardware();
    all.extend(security());
    all.extend(extended());
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuChoice;
    use crate::pipeline::PipelineSummary;
    use crate::plan;
    use crate::probe::Requirement;
    use crate::recommendations::is_severity_line;
    use std::collections::HashSet;
    use warden_common::WardenConfig;

    #[test]
    fn test_names_are_unique() {
        let all = full_battery();
        let names: HashSet<_> = all.iter().map(|p| p.name).collect();
        assert_eq!(names.len(), all.len());
        assert!(all.len() >= 35);
    }

    #[test]
    fn test_basic_security_keeps_order() {
        let names: Vec<_> = basic_security().iter().map(|p| p.name).collect();
        assert_eq!(names, BASIC_SECURITY);
    }

    #[test]
    fn test_fallbacks_are_deliberate() {
        let with_fallback: Vec<_> = full_battery()
            .iter()
            .filter(|p| p.fallback.is_some())
            .map(|p| p.name)
            .collect();
        assert_eq!(
            with_fallback,
            vec![
                "ssh_logins",
                "sudoers_nopasswd",
                "pam",
                "sshd_config",
                "pending_updates",
                "orphans",
                "foreign"
            ]
        );
    }

    #[test]
    fn test_container_sections_are_optional() {
        for probe in full_battery().iter().filter(|p| p.command.starts_with("docker")) {
            assert_eq!(probe.requirement, Requirement::WhenPresent("docker"));
        }
    }

    #[test]
    fn test_status_text_stays_out_of_severity_digest() {
        // Status lines land in the session log, which the recommendations
        // step scans; only real trouble may match.
        let config = WardenConfig {
            services: vec!["sshd.service".into()],
            ..Default::default()
        };
        let mut lines: Vec<String> = full_battery()
            .iter()
            .flat_map(|p| [p.header.to_string(), format!("Probing: {}", p.header)])
            .collect();

        let bundles = [
            plan::unattended(&config),
            plan::update_bundle(&config),
            plan::cleanup_bundle(),
            plan::security_bundle(),
            plan::audit_bundle(),
        ];
        for step in bundles.iter().flatten() {
            lines.push(format!("==> {}", step.name));
            lines.push(format!("{} done", step.name));
            lines.push(format!("Skipped {}: tool not installed", step.name));
        }

        let summary = PipelineSummary {
            completed: 10,
            skipped: 13,
            warnings: 2,
        };
        lines.push(format!("Maintenance finished: {}", summary.tally()));
        for choice in MenuChoice::ALL {
            lines.push(format!("{}: {}", choice.label(), summary.tally()));
        }

        for line in &lines {
            assert!(!is_severity_line(line), "{}", line);
        }
    }
}
