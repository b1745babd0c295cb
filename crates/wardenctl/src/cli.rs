//! Command-line interface

use crate::app::Mode;
use clap::Parser;

/// Archwarden - Arch Linux maintenance and audit
#[derive(Parser, Debug)]
#[command(name = "wardenctl")]
#[command(about = "Archwarden - Arch Linux maintenance and audit", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Pick bundles from a menu instead of running the full pipeline
    #[arg(short, long)]
    pub interactive: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.interactive {
            Mode::Interactive
        } else {
            Mode::Unattended
        }
    }
}
