use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use alarm_vision_core::pipeline::infrastructure::pipeline_factory::build_orchestrator;
use alarm_vision_core::pipeline::infrastructure::request_dispatcher::serve;
use alarm_vision_core::pipeline::pipeline_orchestrator::PipelineOrchestrator;
use alarm_vision_core::shared::config::Config;
use alarm_vision_core::shared::constants::DEFAULT_CONFIG_PATH;
use alarm_vision_core::shared::image_result::ImageResult;

/// Object and face recognition for surveillance alarm frames.
#[derive(Parser)]
#[command(name = "alarm-vision")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Directory prefixed to every image path (overrides the config).
    #[arg(long, global = true)]
    mount_point: Option<String>,

    /// Indent JSON output.
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect objects in alarm frames and print the results.
    Objects {
        /// Alarm frame paths, in event order.
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Recognize faces in the output of `objects`.
    Faces {
        /// Object results file (stdin when omitted).
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Run object detection then face recognition.
    Run {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Answer newline-delimited JSON requests on stdin.
    Serve,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(mount_point) = &cli.mount_point {
        config.override_mount_point(mount_point);
    }
    let orchestrator = build_orchestrator(&config)?;

    match cli.command {
        Command::Objects { paths } => print_results(&orchestrator.detect_objects(&paths), cli.pretty),
        Command::Faces { input } => {
            let results = read_results(input)?;
            print_results(&orchestrator.detect_faces(&results), cli.pretty)
        }
        Command::Run { paths } => print_results(&orchestrator.run(&paths), cli.pretty),
        Command::Serve => run_server(&orchestrator),
    }
}

fn read_results(input: Option<PathBuf>) -> Result<Vec<ImageResult>, Box<dyn std::error::Error>> {
    let raw = match input {
        Some(path) => fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?,
        None => {
            let mut raw = String::new();
            io::stdin().read_to_string(&mut raw)?;
            raw
        }
    };
    Ok(serde_json::from_str(&raw)?)
}

fn print_results<T: Serialize>(results: &T, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let json = if pretty {
        serde_json::to_string_pretty(results)?
    } else {
        serde_json::to_string(results)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn run_server(orchestrator: &PipelineOrchestrator) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("serving requests on stdin");
    serve(orchestrator, io::stdin().lock(), io::stdout())?;
    Ok(())
}
