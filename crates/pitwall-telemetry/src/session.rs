//! Session identity, boundary detection and session metadata.
//!
//! A session restart, replay rewind or reconnect shows up as a new unique id, a
//! new session number, or session time jumping backwards. Every stateful
//! estimator owns a [`SessionBoundary`] and clears its per-car state when
//! [`SessionBoundary::observe`] reports a [`BoundaryReset`].

use serde::{Deserialize, Serialize};

use crate::{TelemetryError, TelemetryResult};

const METRES_PER_KM: f64 = 1000.0;
const METRES_PER_MILE: f64 = 1609.344;

/// The identity fields of one frame. Absent fields are not compared.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub unique_id: Option<i32>,
    pub session_num: Option<i32>,
    pub session_time: Option<f64>,
}

impl SessionIdentity {
    pub fn new(unique_id: i32, session_time: f64) -> Self {
        Self {
            unique_id: Some(unique_id),
            session_num: None,
            session_time: Some(session_time),
        }
    }

    pub fn from_session_num(session_num: i32) -> Self {
        Self {
            session_num: Some(session_num),
            ..Self::default()
        }
    }

    pub fn from_time(session_time: f64) -> Self {
        Self {
            session_time: Some(session_time),
            ..Self::default()
        }
    }
}

/// How a change away from unique id 0 is treated.
///
/// The sim reports 0 before a session is fully loaded, so some consumers only
/// reset when the previous id was a real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroIdPolicy {
    #[default]
    ResetOnAnyChange,
    IgnoreChangeFromZero,
}

/// Why a boundary fired.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryReset {
    IdChanged { from: i32, to: i32 },
    SessionNumChanged { from: i32, to: i32 },
    TimeRegressed { from: f64, to: f64 },
}

impl std::fmt::Display for BoundaryReset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryReset::IdChanged { from, to } => {
                write!(f, "session id changed from {from} to {to}")
            }
            BoundaryReset::SessionNumChanged { from, to } => {
                write!(f, "session number changed from {from} to {to}")
            }
            BoundaryReset::TimeRegressed { from, to } => {
                write!(f, "session time regressed from {from:.3}s to {to:.3}s")
            }
        }
    }
}

/// Tracks the last observed session identity.
#[derive(Debug, Clone, Default)]
pub struct SessionBoundary {
    policy: ZeroIdPolicy,
    last: Option<SessionIdentity>,
}

impl SessionBoundary {
    pub fn new(policy: ZeroIdPolicy) -> Self {
        Self { policy, last: None }
    }

    /// Compare `identity` with the last observation and remember it.
    ///
    /// The first observation never resets. Fields missing on either side are
    /// skipped, and a field missing from `identity` keeps its previous value.
    /// A non-finite session time counts as missing.
    pub fn observe(&mut self, mut identity: SessionIdentity) -> Option<BoundaryReset> {
        identity.session_time = identity.session_time.filter(|t| t.is_finite());
        let Some(previous) = self.last else {
            self.last = Some(identity);
            return None;
        };

        let reset = self.compare(&previous, &identity);
        self.last = Some(match reset {
            Some(_) => identity,
            None => SessionIdentity {
                unique_id: identity.unique_id.or(previous.unique_id),
                session_num: identity.session_num.or(previous.session_num),
                session_time: identity.session_time.or(previous.session_time),
            },
        });
        reset
    }

    fn compare(&self, previous: &SessionIdentity, current: &SessionIdentity) -> Option<BoundaryReset> {
        if let (Some(from), Some(to)) = (previous.unique_id, current.unique_id) {
            let counts = match self.policy {
                ZeroIdPolicy::ResetOnAnyChange => true,
                ZeroIdPolicy::IgnoreChangeFromZero => from != 0,
            };
            if counts && from != to {
                return Some(BoundaryReset::IdChanged { from, to });
            }
        }
        if let (Some(from), Some(to)) = (previous.session_num, current.session_num)
            && from != to
        {
            return Some(BoundaryReset::SessionNumChanged { from, to });
        }
        if let (Some(from), Some(to)) = (previous.session_time, current.session_time)
            && to < from
        {
            return Some(BoundaryReset::TimeRegressed { from, to });
        }
        None
    }

    pub fn last(&self) -> Option<&SessionIdentity> {
        self.last.as_ref()
    }

    /// Forget the last observation; the next `observe` is a first observation.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Session metadata pushed by the session bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub track_id: Option<String>,
    /// Track length as the sim reports it, e.g. `"5.12 km"`.
    pub track_length: Option<String>,
    pub session_unique_id: Option<i32>,
    /// Class estimated lap time per car slot, in seconds.
    #[serde(default)]
    pub class_est_lap_times: Vec<f64>,
}

impl SessionInfo {
    pub fn for_track(track_id: impl Into<String>, track_length: impl Into<String>) -> Self {
        Self {
            track_id: Some(track_id.into()),
            track_length: Some(track_length.into()),
            ..Self::default()
        }
    }

    /// Track length in metres, or `None` when the sim did not report one.
    pub fn track_length_m(&self) -> Option<TelemetryResult<f64>> {
        self.track_length.as_deref().map(parse_track_length)
    }

    pub fn class_est_lap_time(&self, car: usize) -> Option<f64> {
        self.class_est_lap_times.get(car).copied()
    }
}

/// Parse a track length such as `"5.12 km"`, `"3.2 mi"`, `"800 m"` or `"800"` into metres.
pub fn parse_track_length(raw: &str) -> TelemetryResult<f64> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(split);

    let value: f64 = number
        .trim()
        .parse()
        .map_err(|source| TelemetryError::InvalidTrackLength {
            raw: raw.to_string(),
            source,
        })?;
    if !value.is_finite() || value < 0.0 {
        return Err(TelemetryError::TrackLengthOutOfRange {
            raw: raw.to_string(),
        });
    }

    let unit = unit.trim().to_ascii_lowercase();
    let scale = match unit.as_str() {
        "km" => METRES_PER_KM,
        "mi" | "miles" => METRES_PER_MILE,
        "" | "m" => 1.0,
        _ => {
            return Err(TelemetryError::UnknownTrackLengthUnit {
                raw: raw.to_string(),
                unit,
            });
        }
    };
    Ok(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_first_observation_never_resets() {
        let mut boundary = SessionBoundary::default();
        assert!(boundary.observe(SessionIdentity::new(42, 900.0)).is_none());
        assert!(boundary.observe(SessionIdentity::new(42, 901.0)).is_none());
    }

    #[test]
    fn test_id_change_resets() {
        let mut boundary = SessionBoundary::default();
        boundary.observe(SessionIdentity::new(1, 10.0));

        assert_eq!(
            boundary.observe(SessionIdentity::new(2, 11.0)),
            Some(BoundaryReset::IdChanged { from: 1, to: 2 })
        );
    }

    #[test]
    fn test_zero_id_policy() {
        let mut strict = SessionBoundary::new(ZeroIdPolicy::ResetOnAnyChange);
        strict.observe(SessionIdentity::new(0, 1.0));
        assert!(strict.observe(SessionIdentity::new(5, 2.0)).is_some());

        let mut lenient = SessionBoundary::new(ZeroIdPolicy::IgnoreChangeFromZero);
        lenient.observe(SessionIdentity::new(0, 1.0));
        assert!(lenient.observe(SessionIdentity::new(5, 2.0)).is_none());
        assert!(lenient.observe(SessionIdentity::new(6, 3.0)).is_some());
    }

    #[test]
    fn test_time_regression_resets() {
        let mut boundary = SessionBoundary::default();
        boundary.observe(SessionIdentity::from_time(120.0));

        assert!(boundary.observe(SessionIdentity::from_time(120.0)).is_none());
        assert!(matches!(
            boundary.observe(SessionIdentity::from_time(30.0)),
            Some(BoundaryReset::TimeRegressed { .. })
        ));
        // The regressed time is the new reference.
        assert!(boundary.observe(SessionIdentity::from_time(31.0)).is_none());
    }

    #[test]
    fn test_non_finite_time_is_ignored() {
        let mut boundary = SessionBoundary::default();
        boundary.observe(SessionIdentity::new(1, 100.0));

        assert!(boundary.observe(SessionIdentity::new(1, f64::NAN)).is_none());
        assert!(boundary.observe(SessionIdentity::new(1, f64::INFINITY)).is_none());
        assert_eq!(boundary.last().and_then(|last| last.session_time), Some(100.0));
        assert!(matches!(
            boundary.observe(SessionIdentity::new(1, 50.0)),
            Some(BoundaryReset::TimeRegressed { .. })
        ));
    }

    #[test]
    fn test_missing_fields_keep_previous() {
        let mut boundary = SessionBoundary::default();
        boundary.observe(SessionIdentity::from_session_num(2));
        assert!(boundary.observe(SessionIdentity::from_time(5.0)).is_none());

        assert_eq!(
            boundary.observe(SessionIdentity::from_session_num(3)),
            Some(BoundaryReset::SessionNumChanged { from: 2, to: 3 })
        );
    }

    #[test]
    fn test_reset_forgets_last() {
        let mut boundary = SessionBoundary::default();
        boundary.observe(SessionIdentity::new(1, 100.0));
        boundary.reset();

        assert!(boundary.last().is_none());
        assert!(boundary.observe(SessionIdentity::new(2, 0.0)).is_none());
    }

    #[test]
    fn test_parse_track_length() -> TestResult {
        assert!((parse_track_length("5.12 km")? - 5120.0).abs() < 1e-9);
        assert!((parse_track_length("3.2 mi")? - 5149.9008).abs() < 1e-6);
        assert!((parse_track_length("800 m")? - 800.0).abs() < 1e-9);
        assert!((parse_track_length(" 4000 ")? - 4000.0).abs() < 1e-9);
        assert!((parse_track_length("6.0KM")? - 6000.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_parse_track_length_rejects_garbage() {
        assert!(matches!(
            parse_track_length(""),
            Err(TelemetryError::InvalidTrackLength { .. })
        ));
        assert!(matches!(
            parse_track_length("km"),
            Err(TelemetryError::InvalidTrackLength { .. })
        ));
        assert!(matches!(
            parse_track_length("5 furlongs"),
            Err(TelemetryError::UnknownTrackLengthUnit { .. })
        ));
        assert!(matches!(
            parse_track_length("-3 km"),
            Err(TelemetryError::TrackLengthOutOfRange { .. })
        ));
        assert!(parse_track_length("NaN").is_err());
    }

    #[test]
    fn test_session_info_decodes_camel_case() -> TestResult {
        let info: SessionInfo = serde_json::from_str(
            r#"{"trackId":"spa","trackLength":"7.00 km","sessionUniqueId":9,"classEstLapTimes":[137.5]}"#,
        )?;

        assert_eq!(info.track_id.as_deref(), Some("spa"));
        assert_eq!(info.class_est_lap_time(0), Some(137.5));
        assert_eq!(info.class_est_lap_time(1), None);
        let length = info.track_length_m().ok_or("no length")??;
        assert!((length - 7000.0).abs() < 1e-9);
        Ok(())
    }
}
