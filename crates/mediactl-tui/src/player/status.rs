use mediactl_proto::protocol::{PlaybackState, TimelineReport};

/// What the player is doing, as far as the runtime knows. Owned by the
/// player manager; everyone else reads snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatus {
    pub title: String,
    pub file: String,
    /// Rating key of the loaded item.
    pub key: String,
    pub state: PlaybackState,
    pub time_pos: f64,
    pub duration: f64,
    /// Never report progress for this item (trailers, extras).
    pub no_report: bool,
    /// Video rendered into the terminal instead of a window.
    pub compact: bool,
}

impl PlayerStatus {
    pub fn is_active(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.time_pos / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// The progress report for this status, unless reporting is suppressed
    /// or nothing identifiable is loaded.
    pub fn timeline(&self) -> Option<TimelineReport> {
        if self.no_report || self.key.is_empty() {
            return None;
        }
        Some(TimelineReport {
            rating_key: self.key.clone(),
            state: self.state,
            time_ms: secs_to_ms(self.time_pos),
            duration_ms: secs_to_ms(self.duration),
        })
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_inactive() {
        let status = PlayerStatus::default();
        assert!(!status.is_active());
        assert!(status.timeline().is_none());
    }

    #[test]
    fn paused_counts_as_active() {
        let status = PlayerStatus {
            state: PlaybackState::Paused,
            ..Default::default()
        };
        assert!(status.is_active());
        assert!(status.is_paused());
    }

    #[test]
    fn timeline_converts_to_millis() {
        let status = PlayerStatus {
            key: "100".into(),
            state: PlaybackState::Playing,
            time_pos: 90.0,
            duration: 1800.25,
            ..Default::default()
        };
        let report = status.timeline().unwrap();
        assert_eq!(report.time_ms, 90_000);
        assert_eq!(report.duration_ms, 1_800_250);
    }

    #[test]
    fn no_report_suppresses_timeline() {
        let status = PlayerStatus {
            key: "100".into(),
            no_report: true,
            state: PlaybackState::Playing,
            ..Default::default()
        };
        assert!(status.timeline().is_none());
    }
}
