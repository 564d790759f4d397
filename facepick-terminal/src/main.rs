//! Facepick terminal viewer.
//!
//! Opens an STL file (or a demo solid) in the terminal; click a face to
//! measure it. With `--pick N` it measures the face containing triangle `N`
//! and prints the result instead.
//!
//! Set `RUST_LOG` (or pass `-v`) to control log output. In the interactive
//! viewer logs only go to `--log-file`, since the screen is taken.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use facepick_core::{stl, MeasureConfig, MeasureSession, Mesh};
use facepick_terminal::{format_report, TerminalApp};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Pick flat faces of a triangle mesh and measure them.
#[derive(Parser)]
#[command(name = "facepick-terminal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// STL file to open (binary or ASCII); a demo solid is used when omitted
    file: Option<PathBuf>,

    /// Demo solid to show when no file is given
    #[arg(long, value_enum, default_value = "box")]
    demo: Demo,

    /// TOML file overriding measurement thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Measure the face containing this triangle index and exit
    #[arg(long)]
    pick: Option<usize>,

    /// Output format for --pick
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, ValueEnum)]
enum Demo {
    Cube,
    Box,
    Cylinder,
}

impl Demo {
    fn mesh(self) -> Mesh {
        match self {
            Demo::Cube => Mesh::cube(2.0),
            Demo::Box => Mesh::box_tessellated(4.0, 3.0, 2.0, 4),
            Demo::Cylinder => Mesh::cylinder(1.0, 2.0, 48),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

fn init_logging(cli: &Cli, interactive: bool) -> Result<()> {
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let writer = match &cli.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file: {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None if interactive => BoxMakeWriter::new(std::io::sink),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(cli.log_file.is_none() && !interactive)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli, cli.pick.is_none())?;

    let config = match &cli.config {
        Some(path) => MeasureConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => MeasureConfig::default(),
    };

    let mesh = match &cli.file {
        Some(path) => stl::load_stl(path)
            .with_context(|| format!("Failed to load STL file: {}", path.display()))?,
        None => cli.demo.mesh(),
    };
    if mesh.is_empty() {
        bail!("Mesh has no triangles");
    }

    let session = MeasureSession::with_mesh(config, mesh);

    if let Some(triangle) = cli.pick {
        let Some(result) = session.measure(triangle) else {
            bail!(
                "Triangle {} is out of range (mesh has {} triangles)",
                triangle,
                session.mesh().map_or(0, Mesh::len)
            );
        };
        match cli.format {
            OutputFormat::Text => {
                for line in format_report(&result) {
                    println!("{line}");
                }
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        }
        return Ok(());
    }

    let (width, height) = crossterm::terminal::size().context("Failed to query terminal size")?;
    let mut app = TerminalApp::new(session, width, height);
    app.run()?;

    Ok(())
}
