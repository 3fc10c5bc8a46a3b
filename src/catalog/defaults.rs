use crate::catalog::types::SatelliteMetadata;

struct KnownSatellite {
    name: &'static str,
    aliases: &'static [&'static str],
    owner: Option<&'static str>,
    uplink: Option<&'static str>,
    downlink: Option<&'static str>,
    mode: Option<&'static str>,
    callsign: Option<&'static str>,
    downlink_hz: Option<u64>,
}

impl KnownSatellite {
    fn has_metadata(&self) -> bool {
        self.owner.is_some() || self.downlink.is_some() || self.callsign.is_some()
    }

    fn metadata(&self) -> SatelliteMetadata {
        let owned = |v: Option<&str>| v.map(String::from);
        SatelliteMetadata {
            owner: owned(self.owner),
            uplink: owned(self.uplink),
            downlink: owned(self.downlink),
            mode: owned(self.mode),
            callsign: owned(self.callsign),
        }
    }
}

const KNOWN_SATELLITES: &[KnownSatellite] = &[
    KnownSatellite {
        name: "FIREBIRD 4",
        aliases: &["FIREBIRD"],
        owner: Some("Montana State University"),
        uplink: None,
        downlink: Some("437.219 MHz"),
        mode: Some("19200bps FSK"),
        callsign: Some("K7MSU"),
        downlink_hz: Some(437_219_000),
    },
    KnownSatellite {
        name: "ELFIN",
        aliases: &["UCLA"],
        owner: Some("University of California, Los Angeles"),
        uplink: Some("144.4 MHz"),
        downlink: Some("437.45 MHz"),
        mode: Some("9k6 uplink, 19k2 downlink"),
        callsign: Some("W6YRA"),
        downlink_hz: Some(437_450_000),
    },
    KnownSatellite {
        name: "CSUNSAT 1",
        aliases: &[],
        owner: None,
        uplink: None,
        downlink: None,
        mode: None,
        callsign: None,
        downlink_hz: Some(437_400_000),
    },
    KnownSatellite {
        name: "TIGRISAT",
        aliases: &[],
        owner: None,
        uplink: None,
        downlink: None,
        mode: None,
        callsign: None,
        downlink_hz: Some(435_000_000),
    },
];

fn lookup(name: &str) -> Option<&'static KnownSatellite> {
    KNOWN_SATELLITES.iter().find(|k| k.name == name)
}

/// Maps short forms onto the registered name; anything unrecognised is
/// returned trimmed but otherwise untouched.
pub fn canonical_name(identifier: &str) -> String {
    let trimmed = identifier.trim();
    KNOWN_SATELLITES
        .iter()
        .find(|k| {
            k.name.eq_ignore_ascii_case(trimmed)
                || k.aliases.iter().any(|a| a.eq_ignore_ascii_case(trimmed))
        })
        .map(|k| k.name.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

pub fn default_metadata(canonical: &str) -> Option<SatelliteMetadata> {
    lookup(canonical)
        .filter(|k| k.has_metadata())
        .map(KnownSatellite::metadata)
}

/// Nominal (un-shifted) downlink for satellites the station works regularly.
pub fn default_frequency_hz(canonical: &str) -> Option<u64> {
    lookup(canonical).and_then(|k| k.downlink_hz)
}
