//! Event count matrix: windows × templates, dense, zero-filled.

use super::TimeWindow;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};

/// Dense occurrence counts per (window, template).
///
/// Rows are strictly ascending by window key; columns are the sorted union of
/// every template observed across all windows, so the layout is deterministic
/// and the downstream numeric stages are reproducible.
#[derive(Debug, Clone)]
pub struct EventCountMatrix {
    window_keys: Vec<DateTime<Utc>>,
    templates: Vec<String>,
    counts: Array2<u64>,
}

impl EventCountMatrix {
    /// Tally every (window, template) occurrence and materialize the dense
    /// table. A record with an empty template is a validation error.
    pub fn from_windows(windows: &[TimeWindow]) -> Result<Self> {
        let mut templates: BTreeSet<&str> = BTreeSet::new();
        for window in windows {
            for record in &window.records {
                if record.event_template.is_empty() {
                    return Err(Error::MissingField("EventTemplate"));
                }
                templates.insert(record.event_template.as_str());
            }
        }
        let templates: Vec<String> = templates.into_iter().map(String::from).collect();
        let column: BTreeMap<&str, usize> = templates
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut counts = Array2::<u64>::zeros((windows.len(), templates.len()));
        let mut window_keys = Vec::with_capacity(windows.len());
        for (row, window) in windows.iter().enumerate() {
            window_keys.push(window.key);
            for record in &window.records {
                counts[[row, column[record.event_template.as_str()]]] += 1;
            }
        }

        let matrix = Self {
            window_keys,
            templates,
            counts,
        };
        matrix.check_invariants()?;
        tracing::debug!(
            windows = matrix.n_windows(),
            templates = matrix.n_templates(),
            "built event count matrix"
        );
        Ok(matrix)
    }

    /// Assemble from parts already in matrix form (e.g. read from a file).
    pub fn from_parts(
        window_keys: Vec<DateTime<Utc>>,
        templates: Vec<String>,
        counts: Array2<u64>,
    ) -> Result<Self> {
        if counts.dim() != (window_keys.len(), templates.len()) {
            return Err(Error::Parse(format!(
                "count matrix shape {:?} does not match {} windows x {} templates",
                counts.dim(),
                window_keys.len(),
                templates.len()
            )));
        }
        let matrix = Self {
            window_keys,
            templates,
            counts,
        };
        matrix.check_invariants()?;
        Ok(matrix)
    }

    fn check_invariants(&self) -> Result<()> {
        for pair in self.window_keys.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::Parse(format!(
                    "window keys are not strictly ascending around {}",
                    pair[1]
                )));
            }
        }
        Ok(())
    }

    pub fn n_windows(&self) -> usize {
        self.window_keys.len()
    }

    pub fn n_templates(&self) -> usize {
        self.templates.len()
    }

    pub fn window_keys(&self) -> &[DateTime<Utc>] {
        &self.window_keys
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn counts(&self) -> &Array2<u64> {
        &self.counts
    }

    /// Counts as f64, the form the numeric stages consume.
    pub fn to_f64(&self) -> Array2<f64> {
        self.counts.mapv(|c| c as f64)
    }
}
