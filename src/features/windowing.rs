//! Fixed time windowing: records → floor-aligned buckets, ascending by key.

use super::{LogRecord, TimeWindow};
use crate::error::{Error, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub struct Windower {
    window_size: Duration,
}

impl Windower {
    pub fn new(window_size: Duration) -> Result<Self> {
        if window_size <= Duration::zero() {
            return Err(Error::Config(format!(
                "window size must be positive, got {window_size}"
            )));
        }
        Ok(Self { window_size })
    }

    pub fn window_size(&self) -> Duration {
        self.window_size
    }

    /// Floor-align a timestamp to the start of its window.
    pub fn window_key(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let size_ms = self.window_size.num_milliseconds();
        let floored = ts.timestamp_millis().div_euclid(size_ms) * size_ms;
        // Flooring can only move the timestamp towards the epoch, so the
        // result is always representable.
        Utc.timestamp_millis_opt(floored)
            .single()
            .expect("floored timestamp in range")
    }

    /// Group records into fixed windows keyed by floor-aligned timestamp.
    ///
    /// Records must already be sorted ascending by timestamp; equal timestamps
    /// keep their input order, and duplicates are retained so counting reflects
    /// true frequency. Empty input yields an empty window set.
    pub fn fixed_time_window(&self, records: Vec<LogRecord>) -> Result<Vec<TimeWindow>> {
        for (index, pair) in records.windows(2).enumerate() {
            if pair[1].ts < pair[0].ts {
                return Err(Error::UnsortedRecords { index: index + 1 });
            }
        }

        let mut windows: Vec<TimeWindow> = Vec::new();
        for record in records {
            let key = self.window_key(record.ts);
            match windows.last_mut() {
                Some(last) if last.key == key => last.records.push(record),
                _ => windows.push(TimeWindow {
                    key,
                    records: vec![record],
                }),
            }
        }

        tracing::debug!(
            windows = windows.len(),
            window_size = %self.window_size,
            "grouped records into fixed time windows"
        );
        Ok(windows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(secs: i64, template: &str) -> LogRecord {
        LogRecord::new(Utc.timestamp_opt(secs, 0).unwrap(), template)
    }

    #[test]
    fn floor_alignment_and_ascending_keys() {
        let w = Windower::new(Duration::minutes(5)).unwrap();
        let records = vec![
            record(0, "a"),
            record(299, "b"),
            record(300, "c"),
            record(900, "d"),
        ];
        let windows = w.fixed_time_window(records).unwrap();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].key.timestamp(), 0);
        assert_eq!(windows[0].records.len(), 2);
        assert_eq!(windows[1].key.timestamp(), 300);
        assert_eq!(windows[2].key.timestamp(), 900);
    }

    #[test]
    fn duplicates_are_retained() {
        let w = Windower::new(Duration::seconds(60)).unwrap();
        let records = vec![record(10, "a"), record(10, "a"), record(10, "a")];
        let windows = w.fixed_time_window(records).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].records.len(), 3);
    }

    #[test]
    fn empty_input_yields_no_windows() {
        let w = Windower::new(Duration::minutes(1)).unwrap();
        assert!(w.fixed_time_window(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn unsorted_input_is_rejected() {
        let w = Windower::new(Duration::minutes(1)).unwrap();
        let records = vec![record(100, "a"), record(50, "b")];
        match w.fixed_time_window(records) {
            Err(Error::UnsortedRecords { index }) => assert_eq!(index, 1),
            other => panic!("expected UnsortedRecords, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_window_size_is_rejected() {
        assert!(Windower::new(Duration::zero()).is_err());
        assert!(Windower::new(Duration::seconds(-5)).is_err());
    }

    #[test]
    fn pre_epoch_timestamps_floor_downward() {
        let w = Windower::new(Duration::minutes(1)).unwrap();
        assert_eq!(
            w.window_key(Utc.timestamp_opt(-30, 0).unwrap()).timestamp(),
            -60
        );
    }
}
