use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

/// Minimum spacing between two progress callbacks of one transfer.
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

pub const PROGRESS_MESSAGE: &str = "Downloading...";

/// Payload handed to progress callbacks (and on to whatever front end
/// renders them).
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressEvent {
    pub stage: String,
    /// In `[0, 100 * progress_weight]`.
    pub progress: f64,
    pub message: String,
    pub current_file: String,
    pub speed: String,
    pub downloaded: u64,
    pub total: Option<u64>,
}

/// Invoked inline on the transfer's task: a slow callback slows the
/// download down.
pub type ProgressCallback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Human readable transfer rate: `B/s` below 1 KiB, then `KB/s`, then `MB/s`.
pub fn format_speed(bytes_per_sec: f64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = 1024.0 * 1024.0;

    if bytes_per_sec < KIB {
        format!("{:.0} B/s", bytes_per_sec)
    } else if bytes_per_sec < MIB {
        format!("{:.1} KB/s", bytes_per_sec / KIB)
    } else {
        format!("{:.1} MB/s", bytes_per_sec / MIB)
    }
}

/// Per-attempt throttle that turns byte counts into [`ProgressEvent`]s.
pub(crate) struct ProgressTracker<'a> {
    callback: Option<&'a ProgressCallback>,
    stage: &'a str,
    weight: f64,
    file_name: String,
    total: Option<u64>,
    last_emit: Instant,
    last_bytes: u64,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn new(
        callback: Option<&'a ProgressCallback>,
        stage: &'a str,
        weight: f64,
        file_name: String,
        total: Option<u64>,
        start_bytes: u64,
        now: Instant,
    ) -> Self {
        Self {
            callback,
            stage,
            weight,
            file_name,
            total,
            last_emit: now,
            last_bytes: start_bytes,
        }
    }

    /// Emit if a callback is registered and the interval has elapsed.
    pub(crate) fn record(&mut self, downloaded: u64, now: Instant) {
        if self.callback.is_none() {
            return;
        }
        if now.saturating_duration_since(self.last_emit) < PROGRESS_INTERVAL {
            return;
        }
        self.emit(downloaded, now);
    }

    /// Final report at end of stream, skipped when nothing moved since the
    /// last one.
    pub(crate) fn finish(&mut self, downloaded: u64, now: Instant) {
        if self.callback.is_none() || downloaded == self.last_bytes {
            return;
        }
        self.emit(downloaded, now);
    }

    fn emit(&mut self, downloaded: u64, now: Instant) {
        let Some(callback) = self.callback else {
            return;
        };

        let elapsed = now.saturating_duration_since(self.last_emit).as_secs_f64();
        let delta = downloaded.saturating_sub(self.last_bytes) as f64;
        let speed = if elapsed > 0.0 { delta / elapsed } else { 0.0 };

        let progress = match self.total {
            Some(total) if total > 0 => downloaded as f64 / total as f64 * 100.0 * self.weight,
            _ => 0.0,
        };

        callback(&ProgressEvent {
            stage: self.stage.to_string(),
            progress,
            message: PROGRESS_MESSAGE.to_string(),
            current_file: self.file_name.clone(),
            speed: format_speed(speed),
            downloaded,
            total: self.total,
        });

        self.last_emit = now;
        self.last_bytes = downloaded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collecting() -> (ProgressCallback, Arc<Mutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let callback: ProgressCallback = Arc::new(move |event: &ProgressEvent| {
            sink.lock().unwrap().push(event.clone());
        });
        (callback, events)
    }

    #[test]
    fn speed_units() {
        assert_eq!(format_speed(500.0), "500 B/s");
        assert_eq!(format_speed(2048.0), "2.0 KB/s");
        assert_eq!(format_speed(5.0 * 1024.0 * 1024.0), "5.0 MB/s");
        assert_eq!(format_speed(0.0), "0 B/s");
        assert_eq!(format_speed(1023.0), "1023 B/s");
    }

    #[test]
    fn emits_at_most_once_per_interval() {
        let (callback, events) = collecting();
        let start = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(&callback), "download", 1.0, "game.zip".into(), Some(1000), 0, start);

        tracker.record(100, start + Duration::from_millis(10));
        tracker.record(200, start + Duration::from_millis(99));
        assert!(events.lock().unwrap().is_empty());

        tracker.record(300, start + Duration::from_millis(100));
        tracker.record(400, start + Duration::from_millis(150));
        tracker.record(500, start + Duration::from_millis(200));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].downloaded, 300);
        assert_eq!(events[0].speed, "2.9 KB/s");
        assert_eq!(events[1].downloaded, 500);
        assert_eq!(events[1].speed, "2.0 KB/s");
    }

    #[test]
    fn percentage_is_scaled_by_weight() {
        let (callback, events) = collecting();
        let start = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(&callback), "jre", 0.25, "jre.zip".into(), Some(200), 0, start);

        tracker.record(100, start + Duration::from_secs(1));

        let events = events.lock().unwrap();
        assert_eq!(events[0].stage, "jre");
        assert_eq!(events[0].current_file, "jre.zip");
        assert_eq!(events[0].message, PROGRESS_MESSAGE);
        assert!((events[0].progress - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn finish_reports_the_tail_once() {
        let (callback, events) = collecting();
        let start = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(&callback), "download", 1.0, "a".into(), Some(10), 0, start);

        tracker.finish(10, start + Duration::from_millis(5));
        tracker.finish(10, start + Duration::from_millis(6));

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].downloaded, 10);
        assert!((events[0].progress - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_total_reports_zero_percent() {
        let (callback, events) = collecting();
        let start = Instant::now();
        let mut tracker =
            ProgressTracker::new(Some(&callback), "download", 1.0, "a".into(), None, 0, start);

        tracker.record(64, start + Duration::from_secs(1));

        let events = events.lock().unwrap();
        assert_eq!(events[0].progress, 0.0);
        assert_eq!(events[0].total, None);
    }
}
