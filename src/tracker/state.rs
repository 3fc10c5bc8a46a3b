use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::{LookAngles, PassWindow};

const HORIZON_DEG: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackPhase {
    NoTarget,
    /// LOS: the selected satellite is below the horizon.
    OutOfRange,
    /// AOS: the selected satellite is at or above the horizon.
    InRange,
}

impl TrackPhase {
    pub fn from_elevation(elevation_deg: f64) -> Self {
        if elevation_deg >= HORIZON_DEG {
            TrackPhase::InRange
        } else {
            TrackPhase::OutOfRange
        }
    }
}

/// What the operator wants the rotor to do each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// `p`: report where the rotor is.
    Position,
    /// `P`: follow the selected satellite.
    Track,
    /// `Q`: park both axes and exit.
    Park,
    /// `q`: exit immediately.
    Quit,
}

impl Directive {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "p" => Some(Directive::Position),
            "P" => Some(Directive::Track),
            "Q" => Some(Directive::Park),
            "q" => Some(Directive::Quit),
            _ => None,
        }
    }
}

/// A tracked satellite as sampled at the start of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Candidate {
    pub name: String,
    pub look: Option<LookAngles>,
    pub range_rate_km_s: Option<f64>,
    pub error: Option<String>,
}

impl Candidate {
    pub fn elevation_deg(&self) -> Option<f64> {
        self.look.map(|l| l.elevation_deg)
    }
}

/// First candidate strictly above the horizon, in registration order.
pub fn select_target(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .find(|c| c.elevation_deg().is_some_and(|el| el > HORIZON_DEG))
}

/// Cross-cycle tracking state. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrackState {
    pub selected: Option<String>,
    /// Whether this cycle's selection step found a satellite above the
    /// horizon; `selected` is kept for display either way.
    pub selection_made: bool,
    pub phase: TrackPhase,
    pub pointing: Option<LookAngles>,
    pub range_rate_km_s: Option<f64>,
    pub nominal_frequency_hz: Option<u64>,
    /// Last doppler-corrected frequency the tuner acknowledged.
    pub frequency_hz: Option<u64>,
    pub pass: Option<PassWindow>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for TrackState {
    fn default() -> Self {
        Self {
            selected: None,
            selection_made: false,
            phase: TrackPhase::NoTarget,
            pointing: None,
            range_rate_km_s: None,
            nominal_frequency_hz: None,
            frequency_hz: None,
            pass: None,
            updated_at: None,
        }
    }
}

impl TrackState {
    /// Recomputes the phase from one elevation sample. Returns the new phase
    /// when it differs from the previous one.
    pub fn update_phase(&mut self, elevation_deg: f64) -> Option<TrackPhase> {
        let next = TrackPhase::from_elevation(elevation_deg);
        let changed = next != self.phase;
        self.phase = next;
        changed.then_some(next)
    }

    /// Drops everything tied to the current target.
    pub fn clear_target(&mut self) {
        *self = TrackState {
            updated_at: self.updated_at,
            ..TrackState::default()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, elevation_deg: Option<f64>) -> Candidate {
        Candidate {
            name: name.to_string(),
            look: elevation_deg.map(|el| LookAngles {
                azimuth_deg: 180.0,
                elevation_deg: el,
            }),
            range_rate_km_s: Some(0.0),
            error: None,
        }
    }

    #[test]
    fn phase_follows_latest_sample_only() {
        let mut state = TrackState::default();
        let phases: Vec<TrackPhase> = [-5.0, -0.0001, 0.0, 3.0, -1.0]
            .into_iter()
            .map(|el| {
                state.update_phase(el);
                state.phase
            })
            .collect();

        assert_eq!(
            phases,
            vec![
                TrackPhase::OutOfRange,
                TrackPhase::OutOfRange,
                TrackPhase::InRange,
                TrackPhase::InRange,
                TrackPhase::OutOfRange,
            ]
        );
    }

    #[test]
    fn transitions_are_reported_once() {
        let mut state = TrackState::default();
        assert_eq!(state.update_phase(-1.0), Some(TrackPhase::OutOfRange));
        assert_eq!(state.update_phase(-2.0), None);
        assert_eq!(state.update_phase(0.0), Some(TrackPhase::InRange));
        assert_eq!(state.update_phase(10.0), None);
    }

    #[test]
    fn first_candidate_above_horizon_wins() {
        let candidates = vec![
            candidate("A", Some(-2.0)),
            candidate("B", Some(5.0)),
            candidate("C", Some(10.0)),
        ];
        assert_eq!(select_target(&candidates).unwrap().name, "B");
    }

    #[test]
    fn selection_needs_strictly_positive_elevation() {
        let candidates = vec![candidate("A", Some(0.0)), candidate("B", None)];
        assert!(select_target(&candidates).is_none());
    }

    #[test]
    fn directive_keys_are_case_sensitive() {
        assert_eq!(Directive::from_key("p"), Some(Directive::Position));
        assert_eq!(Directive::from_key(" P "), Some(Directive::Track));
        assert_eq!(Directive::from_key("Q"), Some(Directive::Park));
        assert_eq!(Directive::from_key("q"), Some(Directive::Quit));
        assert_eq!(Directive::from_key("x"), None);
        assert_eq!(Directive::from_key(""), None);
    }

    #[test]
    fn clear_target_resets_to_no_target() {
        let mut state = TrackState {
            selected: Some("A".into()),
            selection_made: true,
            phase: TrackPhase::InRange,
            frequency_hz: Some(1),
            ..TrackState::default()
        };
        state.clear_target();
        assert_eq!(state.phase, TrackPhase::NoTarget);
        assert!(state.selected.is_none());
        assert!(state.frequency_hz.is_none());
    }
}
