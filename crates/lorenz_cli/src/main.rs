//! Headless driver: integrate the batch, run every frame, export the scene.
//!
//! Usage: `lorenz [CONFIG_JSON] [--out PATH]`. Logging follows `RUST_LOG` (default `info`).

mod exporter;

use anyhow::{bail, Context, Result};
use exporter::SceneExporter;
use lorenz_core::render::run_animation;
use lorenz_core::{SimulationConfig, SimulationSession};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    out: Option<PathBuf>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" | "-o" => {
                let value = args.next().context("--out needs a path")?;
                parsed.out = Some(PathBuf::from(value));
            }
            flag if flag.starts_with('-') => bail!("unknown flag {flag}"),
            path => {
                if parsed.config.is_some() {
                    bail!("only one config file may be given");
                }
                parsed.config = Some(PathBuf::from(path));
            }
        }
    }
    Ok(parsed)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    let out = args
        .out
        .unwrap_or_else(|| config.export.path.with_extension("json"));

    let session = SimulationSession::build(config).context("building simulation session")?;
    let mut exporter = SceneExporter::new(&out);
    let summary = run_animation(&session, &mut exporter).context("running animation")?;
    info!(
        frames = summary.frames_drawn,
        cycles = summary.completed_cycles,
        out = %out.display(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let result = parse_args(std::env::args().skip(1)).and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_config_and_output() {
        let parsed = parse_args(args(&["run.json", "--out", "scene.json"])).expect("valid args");
        assert_eq!(parsed.config, Some(PathBuf::from("run.json")));
        assert_eq!(parsed.out, Some(PathBuf::from("scene.json")));
        assert_eq!(parse_args(Vec::new()).expect("no args"), Args::default());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(parse_args(args(&["--out"])).is_err());
        assert!(parse_args(args(&["--fast"])).is_err());
        assert!(parse_args(args(&["a.json", "b.json"])).is_err());
    }

    #[test]
    fn run_reports_missing_config_with_context() {
        let err = run(Args {
            config: Some(PathBuf::from("/nonexistent/lorenz.json")),
            out: None,
        })
        .expect_err("missing config");
        let chain = format!("{err:#}");
        assert!(chain.contains("loading /nonexistent/lorenz.json"), "{chain}");
        assert!(chain.contains("setup failed"), "{chain}");
    }

    #[test]
    fn run_exports_small_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config_path = dir.path().join("run.json");
        std::fs::write(
            &config_path,
            r#"{
                "trajectory_count": 2,
                "sample_count": 40,
                "time_span": {"start": 0.0, "end": 0.4},
                "total_frames": 8
            }"#,
        )
        .expect("config written");
        let out = dir.path().join("scene.json");

        run(Args {
            config: Some(config_path),
            out: Some(out.clone()),
        })
        .expect("run succeeds");
        assert!(out.exists());
    }
}
