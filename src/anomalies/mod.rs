//! Statistical anomaly detection over the event count matrix.

mod linalg;
mod pca;

pub use pca::{ScoredMatrix, SubspaceDetector};
