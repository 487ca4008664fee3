//! loglens — Windowed log anomaly scoring pipeline.
//!
//! Turns a stream of already-parsed log records (timestamp + event template)
//! into per-window anomaly scores, with no labeled data.
//!
//! Modular structure:
//! - [`features`] — Time windowing and event-count matrix construction
//! - [`anomalies`] — PCA subspace anomaly scoring (TF-IDF, SVD, chi-squared threshold)
//! - [`matrix_io`] — Delimited read/write of count and scored matrices
//! - [`logging`] — Structured JSON logging

pub mod anomalies;
pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod matrix_io;

pub use anomalies::{ScoredMatrix, SubspaceDetector};
pub use config::{DetectorConfig, PipelineConfig, WindowConfig};
pub use error::Error;
pub use features::{EventCountMatrix, LogRecord, TimeWindow, Windower};
pub use logging::StructuredLogger;
