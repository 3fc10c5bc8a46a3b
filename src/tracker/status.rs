use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::SatelliteSummary;
use crate::tracker::state::{Candidate, Directive, TrackState};

/// Raw replies from the last `p` directive.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RotorReadout {
    pub azimuth: Option<String>,
    pub elevation: Option<String>,
    pub frequency_hz: Option<u64>,
}

/// Snapshot of the controller, republished after every cycle.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackerStatus {
    pub station: String,
    pub directive: Directive,
    pub state: TrackState,
    pub candidates: Vec<Candidate>,
    pub readout: Option<RotorReadout>,
    pub satellites: Vec<SatelliteSummary>,
}

impl TrackerStatus {
    pub fn new(station: impl Into<String>, directive: Directive) -> Self {
        Self {
            station: station.into(),
            directive,
            state: TrackState::default(),
            candidates: Vec::new(),
            readout: None,
            satellites: Vec::new(),
        }
    }
}

/// Read side of the controller status, shared with the web API.
#[derive(Clone)]
pub struct StatusHandle {
    shared: Arc<StdMutex<TrackerStatus>>,
}

impl StatusHandle {
    pub fn new(initial: TrackerStatus) -> Self {
        Self {
            shared: Arc::new(StdMutex::new(initial)),
        }
    }

    pub fn snapshot(&self) -> TrackerStatus {
        self.lock().clone()
    }

    pub(crate) fn publish(&self, status: TrackerStatus) {
        *self.lock() = status;
    }

    fn lock(&self) -> MutexGuard<'_, TrackerStatus> {
        // A panicked writer leaves a complete snapshot behind.
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
