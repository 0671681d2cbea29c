// SPDX-License-Identifier: MIT OR Apache-2.0
//! Room Designer - headless session runner
//!
//! Replays a scripted editing session (add, move, duplicate, texture,
//! undo, redo, save) against an in-memory scene and prints the resulting room.
//!
//! ```text
//! room_designer [--config <settings.ron>] <script.ron>
//! ```

use room_designer_app::{run_script, DesignSession, DesignerConfig, MemoryScene, Script};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

struct Args {
    config: Option<PathBuf>,
    script: PathBuf,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let mut config = None;
        let mut script = None;
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().ok_or("--config needs a file")?;
                    config = Some(PathBuf::from(path));
                }
                _ if script.is_none() => script = Some(PathBuf::from(&arg)),
                _ => return Err(format!("Unexpected argument: {arg}")),
            }
        }
        let script = script.ok_or("Missing script file")?;
        Ok(Self { config, script })
    }
}

fn main() {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\nusage: room_designer [--config <settings.ron>] <script.ron>");
            std::process::exit(2);
        }
    };

    let (config, config_error) = match DesignerConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (DesignerConfig::default(), Some(e)),
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Room Designer v{}", env!("CARGO_PKG_VERSION"));
    if let Some(e) = config_error {
        tracing::warn!("Using default settings: {e}");
    }

    if let Err(e) = run(&args, &config) {
        tracing::error!("Session failed: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args, config: &DesignerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let script = Script::load(&args.script)?;
    let mut session = DesignSession::new(MemoryScene::new(config.default_room), config)?;
    let report = run_script(&mut session, &script)?;
    tracing::info!(
        steps = report.steps,
        ignored = report.ignored,
        "Script {} replayed",
        args.script.display()
    );

    let room = session.capture()?;
    println!("{}", room.to_json_pretty()?);
    session.shutdown();
    Ok(())
}
