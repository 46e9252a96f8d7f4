//! material-studio - material slot studio for split glTF assets
//!
//! Loads a glTF/GLB asset whose multi-material objects were split into one
//! mesh node per material slot, maps every node back to its logical object
//! and slot, and binds PBR material definitions from an editable catalog.
//! Editing happens through a small command console.

mod app;
mod assets;
mod materials;
mod render;
mod scene;
mod session;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "material-studio", version, about)]
struct Args {
    /// Studio configuration document
    #[arg(long, default_value = "studio.json")]
    config: PathBuf,

    /// Model to load instead of the configured one
    #[arg(long)]
    model: Option<PathBuf>,

    /// Console command to run after boot (repeatable)
    #[arg(long = "exec", value_name = "COMMAND")]
    exec: Vec<String>,

    /// Exit after boot and --exec commands instead of reading stdin
    #[arg(long)]
    no_console: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    log::info!("material-studio {}", env!("CARGO_PKG_VERSION"));

    let mut app = match app::App::boot(&args.config, args.model) {
        Ok(app) => app,
        Err(err) => {
            log::error!("{}", err);
            return ExitCode::FAILURE;
        }
    };

    for command in &args.exec {
        if !app.execute_line(command) {
            return ExitCode::SUCCESS;
        }
    }
    if !args.no_console {
        app.run_console();
    }

    log::info!("Goodbye");
    ExitCode::SUCCESS
}
