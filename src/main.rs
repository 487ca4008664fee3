//! loglens entrypoint: score one event count matrix and write the result.
//!
//! Usage: `loglens <count_matrix.csv> <scored_output.csv>`. Configuration is
//! read from `LOGLENS_CONFIG_PATH` (default `config.json`); defaults apply
//! when the file is absent. Exits non-zero on any pipeline error.

use loglens::{
    anomalies::SubspaceDetector, config::PipelineConfig, logging::StructuredLogger, matrix_io,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

fn run(input: &PathBuf, output: &PathBuf, config: &PipelineConfig) -> Result<(), loglens::Error> {
    let matrix = matrix_io::read_count_matrix(input)?;
    info!(
        input = %input.display(),
        windows = matrix.n_windows(),
        templates = matrix.n_templates(),
        "read event count matrix"
    );

    let detector = SubspaceDetector::new(config.detector.clone())?;
    let scored = detector.score(matrix)?;
    info!(
        components = scored.components,
        threshold = scored.threshold,
        anomalies = scored.n_anomalies(),
        "subspace anomaly detection complete"
    );

    matrix_io::write_scored_matrix(output, &scored)?;
    Ok(())
}

fn main() -> ExitCode {
    let config_path = std::env::var("LOGLENS_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let config = match PipelineConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    StructuredLogger::init(config.log.json, &config.log.level);

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: loglens <count_matrix.csv> <scored_output.csv>");
        return ExitCode::FAILURE;
    }
    let input = PathBuf::from(&args[1]);
    let output = PathBuf::from(&args[2]);

    match run(&input, &output, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}
