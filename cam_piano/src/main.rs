//! cam_piano — interactive entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use cam_piano::app::{run, InputMode};
use cam_piano::config::{AppConfig, CONFIG_FILE};
use cam_piano::logging::init_logging;
use cam_piano::player::list_output_ports;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cam_piano", version, about = "Play a virtual piano with your hands")]
struct Cli {
    /// Configuration file (created with --save-config)
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Play back a recorded JSON-lines landmark file
    #[arg(long, conflicts_with = "detector")]
    replay: Option<PathBuf>,

    /// Shell command of a hand detector printing JSON-lines frames
    #[arg(long)]
    detector: Option<String>,

    /// MIDI output port to use (substring match)
    #[arg(long)]
    midi_port: Option<String>,

    /// List MIDI output ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Write the effective configuration to --config and exit
    #[arg(long)]
    save_config: bool,

    /// Also write logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_dir.as_deref(), cli.verbose)?;

    if cli.list_ports {
        let ports = list_output_ports()?;
        if ports.is_empty() {
            println!("No MIDI output ports found.");
        }
        for (i, name) in ports.iter().enumerate() {
            println!("  {i}: {name}");
        }
        return Ok(());
    }

    let mut cfg = AppConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(port) = cli.midi_port {
        cfg.midi_port = Some(port);
    }

    if cli.save_config {
        cfg.save_to(&cli.config)?;
        info!("configuration written to {}", cli.config.display());
        return Ok(());
    }

    let mode = match (cli.replay, cli.detector) {
        (Some(path), _) => InputMode::Replay(path),
        (None, Some(cmd)) => InputMode::Detector(cmd),
        (None, None) => InputMode::Simulate,
    };

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Cam Piano — play with your hands               ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match &mode {
        InputMode::Simulate     => println!("  Mode: keyboard simulation (A-G left, H-; right, Z/M hands)"),
        InputMode::Replay(p)    => println!("  Mode: replay {}", p.display()),
        InputMode::Detector(c)  => println!("  Mode: detector `{c}`"),
    }
    println!("  Opening visualizer window…");
    println!();

    run(cfg, mode)
}
