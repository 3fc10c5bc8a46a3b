use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::catalog::defaults::{canonical_name, default_frequency_hz};
use crate::catalog::{SatelliteCatalog, SatelliteMetadata};
use crate::predict::{download_tles, GroundStation, LookAngles, OrbitalPredictor, PredictError};
use crate::radio::RadioClient;
use crate::rotator::{ActuatorClient, ACK_OK};
use crate::tracker::doppler::doppler_corrected_hz;
use crate::tracker::operator::OperatorConsole;
use crate::tracker::report::render_status;
use crate::tracker::state::{select_target, Candidate, Directive, TrackPhase, TrackState};
use crate::tracker::status::{RotorReadout, StatusHandle, TrackerStatus};
use crate::tracker::TrackerError;

const CHOICE_PROMPT: &str =
    "S: switch satellite, R: remove satellite, C: change rotor command, Enter: continue > ";
const DIRECTIVE_PROMPT: &str = "p: get position, P: track, Q: park and quit, q: quit > ";
const SATELLITE_PROMPT: &str = "Which satellite would you like to track? ";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParkPosition {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl Default for ParkPosition {
    fn default() -> Self {
        Self {
            azimuth_deg: 130.0,
            elevation_deg: 90.0,
        }
    }
}

/// Periodic reload of orbital elements while tracking.
#[derive(Debug, Clone)]
pub struct ElementsRefresh {
    /// Feed to download into `file` first; `None` only re-reads the file.
    pub url: Option<String>,
    pub file: PathBuf,
    pub interval: Duration,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct TrackingSettings {
    pub cycle_delay: Duration,
    pub prompt_timeout: Duration,
    pub park: ParkPosition,
    pub refresh: Option<ElementsRefresh>,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            cycle_delay: Duration::from_millis(500),
            prompt_timeout: Duration::from_secs(10),
            park: ParkPosition::default(),
            refresh: None,
        }
    }
}

/// The two rotctld connections of a split az/el rotor.
pub struct RotorPair {
    pub azimuth: ActuatorClient,
    pub elevation: ActuatorClient,
}

/// Why the control loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Quit,
    Parked,
}

#[derive(Debug, Clone, Copy)]
struct TargetSample {
    look: LookAngles,
    range_rate_km_s: f64,
}

/// Owns every piece of mutable tracking state and drives the cycle:
/// sample, select, evaluate AOS/LOS, correct doppler, command hardware.
pub struct TrackingController<P: OrbitalPredictor> {
    station: GroundStation,
    catalog: SatelliteCatalog,
    predictor: P,
    rotor: RotorPair,
    radio: RadioClient,
    console: OperatorConsole,
    settings: TrackingSettings,
    frequencies: HashMap<String, u64>,
    state: TrackState,
    directive: Directive,
    candidates: Vec<Candidate>,
    readout: Option<RotorReadout>,
    pass_target: Option<String>,
    status: StatusHandle,
    last_refresh: Instant,
}

impl<P: OrbitalPredictor> TrackingController<P> {
    pub fn new(
        station: GroundStation,
        catalog: SatelliteCatalog,
        predictor: P,
        rotor: RotorPair,
        radio: RadioClient,
        console: OperatorConsole,
        settings: TrackingSettings,
    ) -> Self {
        let status = StatusHandle::new(TrackerStatus::new(station.name.clone(), Directive::Track));
        Self {
            station,
            catalog,
            predictor,
            rotor,
            radio,
            console,
            settings,
            frequencies: HashMap::new(),
            state: TrackState::default(),
            directive: Directive::Track,
            candidates: Vec::new(),
            readout: None,
            pass_target: None,
            status,
            last_refresh: Instant::now(),
        }
    }

    pub fn status_handle(&self) -> StatusHandle {
        self.status.clone()
    }

    pub fn set_directive(&mut self, directive: Directive) {
        self.directive = directive;
    }

    pub fn catalog(&self) -> &SatelliteCatalog {
        &self.catalog
    }

    /// Starts tracking `identifier` and makes it the current target.
    ///
    /// The nominal frequency is `frequency_hz`, else the built-in default;
    /// with neither the satellite is tracked without tuning until one is
    /// assigned.
    pub fn add_satellite(
        &mut self,
        identifier: &str,
        metadata: Option<SatelliteMetadata>,
        frequency_hz: Option<u64>,
    ) -> Result<String, TrackerError> {
        let name = canonical_name(identifier);
        if self.catalog.contains(&name) {
            println!("{} already in list.", name);
        }
        if !self.catalog.add(&name, metadata) {
            return Err(TrackerError::UnknownSatellite(name));
        }

        if let Some(hz) = frequency_hz.or_else(|| default_frequency_hz(&name)) {
            self.assign_frequency(&name, hz);
        }
        self.retarget(&name);
        self.publish();
        Ok(name)
    }

    pub fn remove_satellite(&mut self, identifier: &str) -> bool {
        let name = canonical_name(identifier);
        if !self.catalog.remove(&name) {
            return false;
        }
        if !self.catalog.contains(&name) && self.state.selected.as_deref() == Some(name.as_str()) {
            self.state.clear_target();
            self.pass_target = None;
        }
        self.publish();
        true
    }

    /// Records the nominal frequency for `name`. The first assignment
    /// sticks; the effective value is returned.
    pub fn assign_frequency(&mut self, name: &str, hz: u64) -> u64 {
        let assigned = *self.frequencies.entry(name.to_string()).or_insert(hz);
        if assigned != hz {
            log::info!("{} keeps its frequency of {} Hz", name, assigned);
        }
        assigned
    }

    /// One tracking cycle at `now`. Failures of individual steps are
    /// logged and never abort the cycle.
    pub async fn cycle(&mut self, now: DateTime<Utc>) {
        self.candidates = self.sample_candidates(now);
        self.readout = None;

        match select_target(&self.candidates).map(|c| c.name.clone()) {
            Some(name) => {
                if self.state.selected.as_deref() != Some(name.as_str()) {
                    log::info!("Switching to {}", name);
                }
                self.retarget(&name);
                self.state.selection_made = true;
            }
            None => self.state.selection_made = false,
        }

        let sample = match self.state.selected.clone() {
            Some(target) => self.evaluate_target(&target, now),
            None => {
                self.state.phase = TrackPhase::NoTarget;
                None
            }
        };

        self.command_rotor(sample.map(|s| s.look)).await;
        if let Some(sample) = sample {
            self.tune(sample.range_rate_km_s).await;
        }

        self.state.updated_at = Some(now);
        self.publish();
    }

    /// Bounded operator prompts between cycles. Returns `Some` when the
    /// operator asked to stop.
    pub async fn operator_window(&mut self) -> Option<Shutdown> {
        let timeout = Some(self.settings.prompt_timeout);
        let Some(choice) = self.console.prompt(CHOICE_PROMPT, timeout).await else {
            println!("No changes made.");
            return None;
        };

        match choice.as_str() {
            "" => None,
            "S" | "s" => {
                self.prompt_satellite(timeout).await;
                None
            }
            "R" | "r" => {
                let name = self.console.prompt("Satellite to remove: ", timeout).await?;
                if !self.remove_satellite(&name) {
                    println!("{} is not tracked.", name);
                }
                None
            }
            "C" | "c" => match self.prompt_directive(timeout).await {
                Some(directive) => self.apply_directive(directive).await,
                None => {
                    println!("No changes made.");
                    None
                }
            },
            other => {
                println!("Unknown command {:?}. No changes made.", other);
                None
            }
        }
    }

    /// Blocking first selection before the loop starts.
    pub async fn choose_initial_satellite(&mut self) -> Result<String, TrackerError> {
        self.prompt_satellite(None)
            .await
            .ok_or(TrackerError::InputClosed)
    }

    /// Blocking choice of the directive the loop starts with.
    pub async fn choose_initial_directive(&mut self) -> Result<Directive, TrackerError> {
        let directive = self
            .prompt_directive(None)
            .await
            .ok_or(TrackerError::InputClosed)?;
        self.directive = directive;
        Ok(directive)
    }

    /// Asks for a satellite until one resolves; a new satellite without a
    /// default frequency is then asked for one.
    pub async fn prompt_satellite(&mut self, timeout: Option<Duration>) -> Option<String> {
        loop {
            let identifier = self.console.prompt(SATELLITE_PROMPT, timeout).await?;
            if identifier.is_empty() {
                println!("Please enter a valid satellite.");
                continue;
            }
            match self.add_satellite(&identifier, None, None) {
                Ok(name) => {
                    if !self.frequencies.contains_key(&name) {
                        self.prompt_frequency(&name, timeout).await;
                    }
                    return Some(name);
                }
                Err(e) => println!("{}. Please enter a valid satellite.", e),
            }
        }
    }

    async fn prompt_frequency(&mut self, name: &str, timeout: Option<Duration>) {
        let text = format!("Center frequency for {} (Hz): ", name);
        loop {
            let Some(line) = self.console.prompt(&text, timeout).await else {
                log::warn!("No frequency for {}; the radio will not be tuned", name);
                return;
            };
            match line.parse::<f64>() {
                Ok(hz) if hz.is_finite() && hz > 0.0 => {
                    self.assign_frequency(name, hz.round() as u64);
                    self.publish();
                    return;
                }
                _ => println!("Please enter the frequency in Hz."),
            }
        }
    }

    async fn prompt_directive(&mut self, timeout: Option<Duration>) -> Option<Directive> {
        loop {
            let key = self.console.prompt(DIRECTIVE_PROMPT, timeout).await?;
            match Directive::from_key(&key) {
                Some(directive) => return Some(directive),
                None => println!("Please enter p, P, Q or q."),
            }
        }
    }

    async fn apply_directive(&mut self, directive: Directive) -> Option<Shutdown> {
        match directive {
            Directive::Quit => Some(Shutdown::Quit),
            Directive::Park => {
                if let Err(e) = self.park().await {
                    log::error!("Rotor may not be parked: {}", e);
                }
                Some(Shutdown::Parked)
            }
            other => {
                log::info!("Rotor directive: {}", other);
                self.directive = other;
                self.publish();
                None
            }
        }
    }

    /// Sends both axes to the park position. Both axes are tried even when
    /// the first one fails.
    pub async fn park(&mut self) -> Result<(), TrackerError> {
        let park = self.settings.park;
        let mut first_error = None;
        for client in [&mut self.rotor.azimuth, &mut self.rotor.elevation] {
            if let Err(e) = client.park(park.azimuth_deg, park.elevation_deg).await {
                log::warn!("Failed to park {} axis: {}", client.axis(), e);
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => {
                println!(
                    "Rotor parked at AZ {:.0} EL {:.0}.",
                    park.azimuth_deg, park.elevation_deg
                );
                Ok(())
            }
        }
    }

    /// Runs cycles until the operator quits or parks.
    pub async fn run(&mut self) -> Shutdown {
        loop {
            if matches!(self.directive, Directive::Park | Directive::Quit) {
                if let Some(shutdown) = self.apply_directive(self.directive).await {
                    return shutdown;
                }
            }

            self.refresh_elements_if_due().await;

            let now = Utc::now();
            self.cycle(now).await;
            print!("{}", render_status(&self.current_status(), now));

            if let Some(shutdown) = self.operator_window().await {
                return shutdown;
            }
            tokio::time::sleep(self.settings.cycle_delay).await;
        }
    }

    fn sample_candidates(&self, now: DateTime<Utc>) -> Vec<Candidate> {
        let mut seen = HashSet::new();
        self.catalog
            .list()
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .map(|name| self.sample(name, now))
            .collect()
    }

    fn sample(&self, name: String, now: DateTime<Utc>) -> Candidate {
        let result = self
            .catalog
            .get(&name)
            .ok_or_else(|| PredictError::UnknownSatellite(name.clone()))
            .and_then(|record| {
                let look = self.predictor.position(&self.station, record, now)?;
                let range_rate = self.predictor.velocity(&self.station, record, now)?;
                Ok((look, range_rate))
            });

        match result {
            Ok((look, range_rate)) => Candidate {
                name,
                look: Some(look),
                range_rate_km_s: Some(range_rate),
                error: None,
            },
            Err(e) => {
                log::warn!("Skipping {} this cycle: {}", name, e);
                Candidate {
                    name,
                    look: None,
                    range_rate_km_s: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn retarget(&mut self, name: &str) {
        if self.state.selected.as_deref() != Some(name) {
            self.state.clear_target();
            self.state.selected = Some(name.to_string());
            self.pass_target = None;
        }
    }

    fn evaluate_target(&mut self, target: &str, now: DateTime<Utc>) -> Option<TargetSample> {
        let sample = self
            .candidates
            .iter()
            .find(|c| c.name == target)
            .and_then(|c| {
                Some(TargetSample {
                    look: c.look?,
                    range_rate_km_s: c.range_rate_km_s?,
                })
            });
        let Some(sample) = sample else {
            log::warn!("No position for {} this cycle", target);
            return None;
        };

        match self.state.update_phase(sample.look.elevation_deg) {
            Some(TrackPhase::InRange) => log::info!("{} AOS. Tracking commencing.", target),
            Some(TrackPhase::OutOfRange) => {
                log::info!("{} currently below horizon. Awaiting AOS.", target)
            }
            _ => {}
        }
        self.state.pointing = Some(sample.look);
        self.state.range_rate_km_s = Some(sample.range_rate_km_s);
        self.state.nominal_frequency_hz = self.frequencies.get(target).copied();
        self.update_pass(target, now);
        Some(sample)
    }

    fn update_pass(&mut self, target: &str, now: DateTime<Utc>) {
        let current = self.pass_target.as_deref() == Some(target)
            && self.state.pass.as_ref().is_some_and(|p| p.set_time >= now);
        if current {
            return;
        }

        self.pass_target = Some(target.to_string());
        let Some(record) = self.catalog.get(target) else {
            return;
        };
        self.state.pass = match self.predictor.next_pass(&self.station, record, now) {
            Ok(pass) => Some(pass),
            Err(e) => {
                log::warn!("No pass window for {}: {}", target, e);
                None
            }
        };
    }

    /// Azimuth first, then elevation. A failing axis does not stop the other.
    async fn command_rotor(&mut self, look: Option<LookAngles>) {
        match self.directive {
            Directive::Track => {
                let Some(look) = look else { return };
                if self.state.phase != TrackPhase::InRange {
                    log::debug!("Holding rotor until AOS");
                    return;
                }
                for client in [&mut self.rotor.azimuth, &mut self.rotor.elevation] {
                    if let Err(e) = client.set_position(look.azimuth_deg, look.elevation_deg).await {
                        log::warn!("{} axis did not take the new position: {}", client.axis(), e);
                    }
                }
            }
            Directive::Position => {
                let azimuth = query_position(&mut self.rotor.azimuth).await;
                let elevation = query_position(&mut self.rotor.elevation).await;
                let frequency_hz = match self.radio.get_frequency().await {
                    Ok(hz) => Some(hz),
                    Err(e) => {
                        log::warn!("Radio at {} did not report its frequency: {}", self.radio.endpoint(), e);
                        None
                    }
                };
                self.readout = Some(RotorReadout {
                    azimuth,
                    elevation,
                    frequency_hz,
                });
            }
            Directive::Park | Directive::Quit => {}
        }
    }

    async fn tune(&mut self, range_rate_km_s: f64) {
        let target = self.state.selected.clone().unwrap_or_default();
        let Some(nominal) = self.state.nominal_frequency_hz else {
            log::debug!("No frequency assigned to {}; radio left alone", target);
            return;
        };

        let hz = doppler_corrected_hz(nominal, range_rate_km_s);
        match self.radio.set_frequency(hz).await {
            Ok(reply) if reply == ACK_OK => self.state.frequency_hz = Some(hz),
            Ok(reply) => log::warn!("Radio answered {:?} when tuning {} to {} Hz", reply, target, hz),
            Err(e) => log::warn!("Failed to tune radio for {}: {}", target, e),
        }
    }

    async fn refresh_elements_if_due(&mut self) {
        let Some(refresh) = &self.settings.refresh else {
            return;
        };
        if self.last_refresh.elapsed() < refresh.interval {
            return;
        }
        self.last_refresh = Instant::now();

        if let Some(url) = &refresh.url {
            if let Err(e) = download_tles(url, &refresh.file, refresh.timeout).await {
                log::warn!("Element refresh from {} failed: {}", url, e);
            }
        }
        match self.catalog.refresh_elements() {
            Ok(0) => log::info!("Orbital elements refreshed"),
            Ok(missing) => log::warn!("{} tracked satellites have no elements after refresh", missing),
            Err(e) => log::warn!("Failed to reload orbital elements: {}", e),
        }
        self.pass_target = None;
    }

    fn current_status(&self) -> TrackerStatus {
        TrackerStatus {
            station: self.station.name.clone(),
            directive: self.directive,
            state: self.state.clone(),
            candidates: self.candidates.clone(),
            readout: self.readout.clone(),
            satellites: self.catalog.summaries(),
        }
    }

    fn publish(&self) {
        self.status.publish(self.current_status());
    }
}

async fn query_position(client: &mut ActuatorClient) -> Option<String> {
    match client.get_position().await {
        Ok(reply) => Some(reply),
        Err(e) => {
            log::warn!("{} axis did not report its position: {}", client.axis(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use chrono::{Duration as ChronoDuration, TimeZone};
    use tokio::sync::mpsc;

    use crate::catalog::SatelliteRecord;
    use crate::predict::tle_loader::tests::FIREBIRD_TLE;
    use crate::predict::{PassWindow, TleLoader};
    use crate::radio::fake::fake_rigctld;
    use crate::rotator::fake::{client, fake_rotctld};
    use crate::rotator::Axis;

    const TRACK_AZIMUTH: f64 = 200.0;

    /// Elevation and range-rate per satellite, one entry per second from
    /// `epoch`; the last entry repeats.
    struct ScriptedPredictor {
        epoch: DateTime<Utc>,
        tracks: HashMap<String, Vec<(f64, f64)>>,
    }

    impl ScriptedPredictor {
        fn sample(&self, name: &str, at: DateTime<Utc>) -> Result<(f64, f64), PredictError> {
            let index = (at - self.epoch).num_seconds().max(0) as usize;
            self.tracks
                .get(name)
                .and_then(|track| track.get(index).or(track.last()))
                .copied()
                .ok_or_else(|| PredictError::Propagation(format!("no script for {}", name)))
        }
    }

    impl OrbitalPredictor for ScriptedPredictor {
        fn position(
            &self,
            _station: &GroundStation,
            satellite: &SatelliteRecord,
            at: DateTime<Utc>,
        ) -> Result<LookAngles, PredictError> {
            let (elevation_deg, _) = self.sample(&satellite.name, at)?;
            Ok(LookAngles {
                azimuth_deg: TRACK_AZIMUTH,
                elevation_deg,
            })
        }

        fn velocity(
            &self,
            _station: &GroundStation,
            satellite: &SatelliteRecord,
            at: DateTime<Utc>,
        ) -> Result<f64, PredictError> {
            Ok(self.sample(&satellite.name, at)?.1)
        }

        fn next_pass(
            &self,
            _station: &GroundStation,
            _satellite: &SatelliteRecord,
            at: DateTime<Utc>,
        ) -> Result<PassWindow, PredictError> {
            Ok(PassWindow {
                rise_time: at + ChronoDuration::minutes(5),
                rise_azimuth_deg: 10.0,
                peak_time: at + ChronoDuration::minutes(10),
                peak_elevation_deg: 45.0,
                set_time: at + ChronoDuration::minutes(15),
                set_azimuth_deg: 190.0,
            })
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 7, 17, 18, 30, 0).unwrap()
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        epoch() + ChronoDuration::seconds(seconds)
    }

    /// Every name shares FIREBIRD 4's elements; only the script matters.
    fn feed() -> String {
        let lines: Vec<&str> = FIREBIRD_TLE.lines().collect();
        ["A", "B", "C", "FIREBIRD 4", "MYSAT"]
            .iter()
            .map(|name| format!("{}\n{}\n{}\n", name, lines[1], lines[2]))
            .collect()
    }

    struct Harness {
        controller: TrackingController<ScriptedPredictor>,
        az: mpsc::UnboundedReceiver<String>,
        el: mpsc::UnboundedReceiver<String>,
        radio: Arc<Mutex<Vec<String>>>,
        input: mpsc::UnboundedSender<String>,
    }

    impl Harness {
        fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(line) = rx.try_recv() {
                lines.push(line);
            }
            lines
        }

        fn az_lines(&mut self) -> Vec<String> {
            Self::drain(&mut self.az)
        }

        fn el_lines(&mut self) -> Vec<String> {
            Self::drain(&mut self.el)
        }

        fn radio_saw(&self, line: &str) -> bool {
            self.radio.lock().unwrap().iter().any(|l| l == line)
        }

        fn type_lines(&self, lines: &[&str]) {
            for line in lines {
                self.input.send(line.to_string()).unwrap();
            }
        }
    }

    async fn harness(
        tracked: &[&str],
        script: Vec<(&str, Vec<(f64, f64)>)>,
        az_reply: &'static str,
    ) -> Harness {
        let (az_port, az) = fake_rotctld(az_reply).await;
        let (el_port, el) = fake_rotctld("RPRT 0\n").await;
        let (radio_port, radio) = fake_rigctld().await;

        let rotor = RotorPair {
            azimuth: client(Axis::Azimuth, az_port).await,
            elevation: client(Axis::Elevation, el_port).await,
        };
        let (input, lines) = mpsc::unbounded_channel();
        let predictor = ScriptedPredictor {
            epoch: epoch(),
            tracks: script
                .into_iter()
                .map(|(name, track)| (name.to_string(), track))
                .collect(),
        };
        let settings = TrackingSettings {
            prompt_timeout: Duration::from_millis(200),
            ..TrackingSettings::default()
        };

        let mut controller = TrackingController::new(
            GroundStation::knudsen(),
            SatelliteCatalog::new(Box::new(TleLoader::from_str(&feed()))),
            predictor,
            rotor,
            RadioClient::new("127.0.0.1", radio_port, Duration::from_secs(2)),
            OperatorConsole::from_channel(lines),
            settings,
        );
        for name in tracked {
            controller.add_satellite(name, None, None).unwrap();
        }

        Harness {
            controller,
            az,
            el,
            radio,
            input,
        }
    }

    #[tokio::test]
    async fn phase_is_recomputed_every_cycle() {
        let track = vec![(-5.0, 7.0), (-0.0001, 7.0), (0.0, 7.0), (3.0, 7.0), (-1.0, 7.0)];
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", track)], "RPRT 0\n").await;

        let mut phases = Vec::new();
        for second in 0..5 {
            h.controller.cycle(at(second)).await;
            phases.push(h.controller.state.phase);
        }

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
        // Only the two in-range cycles moved the rotor.
        assert_eq!(h.az_lines(), vec!["P 200.00 0", "P 200.00 0"]);
        assert_eq!(h.el_lines(), vec!["P 0.00 0", "P 3.00 0"]);
    }

    #[tokio::test]
    async fn first_registered_satellite_above_horizon_is_selected() {
        let mut h = harness(
            &["A", "B", "C"],
            vec![
                ("A", vec![(-2.0, 0.0), (-1.0, 0.0)]),
                ("B", vec![(5.0, 0.0), (-1.0, 0.0)]),
                ("C", vec![(10.0, 0.0), (-1.0, 0.0)]),
            ],
            "RPRT 0\n",
        )
        .await;

        h.controller.cycle(at(0)).await;
        assert_eq!(h.controller.state.selected.as_deref(), Some("B"));
        assert!(h.controller.state.selection_made);

        // Nothing up: the previous target is kept for display.
        h.controller.cycle(at(1)).await;
        assert_eq!(h.controller.state.selected.as_deref(), Some("B"));
        assert!(!h.controller.state.selection_made);
        assert_eq!(h.controller.state.phase, TrackPhase::OutOfRange);
    }

    #[tokio::test]
    async fn in_range_cycle_commands_azimuth_elevation_then_radio() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(30.0, 7.0)])], "RPRT 0\n").await;

        h.controller.cycle(at(0)).await;

        assert_eq!(h.az_lines(), vec!["P 200.00 0"]);
        assert_eq!(h.el_lines(), vec!["P 30.00 0"]);
        assert!(h.radio_saw("F 437208791"));
        let state = h.controller.state;
        assert_eq!(state.nominal_frequency_hz, Some(437_219_000));
        assert_eq!(state.frequency_hz, Some(437_208_791));
        assert_eq!(state.range_rate_km_s, Some(7.0));
        assert!(state.pass.is_some());
    }

    #[tokio::test]
    async fn rejected_azimuth_does_not_stop_elevation_or_radio() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(30.0, 0.0)])], "RPRT -1\n").await;

        h.controller.cycle(at(0)).await;

        assert_eq!(h.az_lines(), vec!["P 200.00 0"]);
        assert_eq!(h.el_lines(), vec!["P 30.00 0"]);
        assert!(h.radio_saw("F 437219000"));
        assert_eq!(h.controller.state.frequency_hz, Some(437_219_000));
    }

    #[tokio::test]
    async fn unreachable_radio_leaves_tuned_frequency_unset() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(30.0, 7.0)])], "RPRT 0\n").await;
        let closed_port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        h.controller.radio = RadioClient::new("127.0.0.1", closed_port, Duration::from_secs(1));

        h.controller.cycle(at(0)).await;

        assert_eq!(h.el_lines(), vec!["P 30.00 0"]);
        assert_eq!(h.controller.state.frequency_hz, None);
        assert_eq!(h.controller.state.phase, TrackPhase::InRange);
    }

    #[tokio::test]
    async fn out_of_range_holds_rotor_but_still_tunes() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(-20.0, -3.0)])], "RPRT 0\n").await;

        h.controller.cycle(at(0)).await;

        assert!(h.az_lines().is_empty());
        assert!(h.el_lines().is_empty());
        assert!(h.radio_saw(&format!("F {}", doppler_corrected_hz(437_219_000, -3.0))));
    }

    #[tokio::test]
    async fn position_directive_queries_both_axes() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(30.0, 0.0)])], "RPRT 0\n").await;
        h.controller.set_directive(Directive::Position);

        h.controller.cycle(at(0)).await;

        assert_eq!(h.az_lines(), vec!["p 0 0"]);
        assert_eq!(h.el_lines(), vec!["p 0 0"]);
        let readout = h.controller.status_handle().snapshot().readout.unwrap();
        assert_eq!(readout.azimuth.as_deref(), Some("123.40"));
        assert_eq!(readout.elevation.as_deref(), Some("123.40"));
        assert!(readout.frequency_hz.is_some());
    }

    #[tokio::test]
    async fn unpredictable_satellite_is_skipped() {
        let mut h = harness(
            &["A", "FIREBIRD 4"],
            vec![("FIREBIRD 4", vec![(10.0, 0.0)])],
            "RPRT 0\n",
        )
        .await;

        h.controller.cycle(at(0)).await;

        let status = h.controller.status_handle().snapshot();
        assert_eq!(status.candidates.len(), 2);
        assert!(status.candidates[0].error.is_some());
        assert_eq!(status.state.selected.as_deref(), Some("FIREBIRD 4"));
    }

    #[tokio::test]
    async fn duplicate_add_is_sampled_once() {
        let mut h = harness(
            &["FIREBIRD 4", "FIREBIRD 4"],
            vec![("FIREBIRD 4", vec![(10.0, 0.0)])],
            "RPRT 0\n",
        )
        .await;
        assert_eq!(h.controller.catalog().list().len(), 2);

        h.controller.cycle(at(0)).await;
        assert_eq!(h.controller.status_handle().snapshot().candidates.len(), 1);
    }

    #[tokio::test]
    async fn removing_the_target_clears_it() {
        let mut h = harness(&["FIREBIRD 4"], vec![("FIREBIRD 4", vec![(10.0, 0.0)])], "RPRT 0\n").await;
        h.controller.cycle(at(0)).await;

        assert!(h.controller.remove_satellite("firebird"));
        assert!(h.controller.state.selected.is_none());

        h.controller.cycle(at(1)).await;
        assert_eq!(h.controller.state.phase, TrackPhase::NoTarget);
        assert!(!h.controller.remove_satellite("FIREBIRD 4"));
    }

    #[tokio::test]
    async fn first_frequency_assignment_sticks() {
        let mut h = harness(&[], vec![], "RPRT 0\n").await;
        assert_eq!(h.controller.assign_frequency("MYSAT", 435_000_000), 435_000_000);
        assert_eq!(h.controller.assign_frequency("MYSAT", 145_800_000), 435_000_000);
        assert_eq!(h.controller.frequencies.get("MYSAT").copied(), Some(435_000_000));
    }

    #[tokio::test]
    async fn unknown_satellite_is_rejected_without_state_change() {
        let mut h = harness(&[], vec![], "RPRT 0\n").await;
        assert!(matches!(
            h.controller.add_satellite("NOPE", None, None),
            Err(TrackerError::UnknownSatellite(_))
        ));
        assert!(h.controller.catalog().is_empty());
        assert!(h.controller.state.selected.is_none());
    }

    #[tokio::test]
    async fn park_directive_parks_both_axes_and_stops() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.type_lines(&["C", "Q"]);

        assert_eq!(h.controller.operator_window().await, Some(Shutdown::Parked));
        assert_eq!(h.az_lines(), vec!["P 130.00 0"]);
        assert_eq!(h.el_lines(), vec!["P 90.00 0"]);
    }

    #[tokio::test]
    async fn failed_azimuth_park_still_parks_elevation() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT -1\n").await;

        assert!(matches!(h.controller.park().await, Err(TrackerError::Rotator(_))));
        assert_eq!(h.az_lines(), vec!["P 130.00 0"]);
        assert_eq!(h.el_lines(), vec!["P 90.00 0"]);
    }

    #[tokio::test]
    async fn quit_directive_stops_without_moving() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.type_lines(&["c", "q"]);

        assert_eq!(h.controller.operator_window().await, Some(Shutdown::Quit));
        assert!(h.az_lines().is_empty());
    }

    #[tokio::test]
    async fn invalid_directive_is_reprompted() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.type_lines(&["C", "x", "p"]);

        assert_eq!(h.controller.operator_window().await, None);
        assert_eq!(h.controller.directive, Directive::Position);
    }

    #[tokio::test]
    async fn silent_operator_changes_nothing() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;

        assert_eq!(h.controller.operator_window().await, None);
        assert_eq!(h.controller.directive, Directive::Track);
        assert_eq!(h.controller.state.selected.as_deref(), Some("FIREBIRD 4"));
    }

    #[tokio::test]
    async fn unknown_command_changes_nothing() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.type_lines(&["X"]);

        assert_eq!(h.controller.operator_window().await, None);
        assert_eq!(h.controller.directive, Directive::Track);
    }

    #[tokio::test]
    async fn switching_to_new_satellite_asks_for_frequency() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.type_lines(&["S", "NOPE", "MYSAT", "abc", "435000000"]);

        assert_eq!(h.controller.operator_window().await, None);
        assert_eq!(h.controller.state.selected.as_deref(), Some("MYSAT"));
        assert_eq!(h.controller.frequencies.get("MYSAT").copied(), Some(435_000_000));
        assert_eq!(h.controller.catalog().list(), vec!["FIREBIRD 4", "MYSAT"]);
    }

    #[tokio::test]
    async fn known_satellite_uses_default_frequency() {
        let mut h = harness(&[], vec![], "RPRT 0\n").await;
        h.type_lines(&["firebird"]);

        let name = h.controller.choose_initial_satellite().await.unwrap();
        assert_eq!(name, "FIREBIRD 4");
        assert_eq!(h.controller.frequencies.get("FIREBIRD 4").copied(), Some(437_219_000));
    }

    #[tokio::test]
    async fn closed_input_aborts_initial_selection() {
        let mut h = harness(&[], vec![], "RPRT 0\n").await;
        let (_, closed) = mpsc::unbounded_channel();
        h.controller.console = OperatorConsole::from_channel(closed);

        assert!(matches!(
            h.controller.choose_initial_satellite().await,
            Err(TrackerError::InputClosed)
        ));
    }

    #[tokio::test]
    async fn quit_requested_up_front_ends_run() {
        let mut h = harness(&["FIREBIRD 4"], vec![], "RPRT 0\n").await;
        h.controller.set_directive(Directive::Quit);

        assert_eq!(h.controller.run().await, Shutdown::Quit);
        assert!(h.az_lines().is_empty());
    }
}
