//! Parameter Registry
//!
//! Static table mapping a parameter id to its physical-unit decoding
//! formula and publishable name. Formulas follow the standard OBD-II
//! byte-to-unit conversions; decoders guard their input length and
//! return `None` for short or empty octet sequences, which callers
//! treat as a failed sample.

/// One pollable vehicle parameter
pub struct Parameter {
    /// Single-byte parameter id within the current-data service
    pub pid: u8,
    /// Name used in the published channel key
    pub name: &'static str,
    /// Pure conversion from response octets to a physical value
    pub decode: fn(&[u8]) -> Option<f64>,
}

/// Every parameter the collector polls, ascending by id.
pub fn registry() -> &'static [Parameter] {
    &REGISTRY
}

static REGISTRY: [Parameter; 8] = [
    Parameter {
        pid: 0x04,
        name: "engineLoad",
        decode: percent, // %
    },
    Parameter {
        pid: 0x05,
        name: "engineCoolantTemperature",
        decode: temperature, // °C
    },
    Parameter {
        pid: 0x0C,
        name: "engineRpm",
        decode: engine_rpm, // rpm
    },
    Parameter {
        pid: 0x0D,
        name: "vehicleSpeed",
        decode: single_byte, // km/h
    },
    Parameter {
        pid: 0x11,
        name: "throttlePosition",
        decode: percent, // %
    },
    Parameter {
        pid: 0x1F,
        name: "runtimeSinceEngineStart",
        decode: double_byte, // s
    },
    Parameter {
        pid: 0x21,
        name: "distanceWithMalfunction",
        decode: double_byte, // km
    },
    Parameter {
        pid: 0x46,
        name: "ambientAirTemperature",
        decode: temperature, // °C
    },
];

/// 100 * A / 255
fn percent(octets: &[u8]) -> Option<f64> {
    octets.first().map(|&a| 100.0 * f64::from(a) / 255.0)
}

/// A - 40
fn temperature(octets: &[u8]) -> Option<f64> {
    octets.first().map(|&a| f64::from(a) - 40.0)
}

/// (256 * A + B) / 4
fn engine_rpm(octets: &[u8]) -> Option<f64> {
    match octets {
        [a, b, ..] => Some((256.0 * f64::from(*a) + f64::from(*b)) / 4.0),
        _ => None,
    }
}

/// A
fn single_byte(octets: &[u8]) -> Option<f64> {
    octets.first().map(|&a| f64::from(a))
}

/// 256 * A + B
fn double_byte(octets: &[u8]) -> Option<f64> {
    match octets {
        [a, b, ..] => Some(256.0 * f64::from(*a) + f64::from(*b)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(pid: u8, octets: &[u8]) -> Option<f64> {
        let parameter = registry().iter().find(|p| p.pid == pid).unwrap();
        (parameter.decode)(octets)
    }

    #[test]
    fn rpm_formula() {
        // 1A 2B => (0x1A * 256 + 0x2B) / 4 = 6699 / 4
        let value = decode(0x0C, &[0x1A, 0x2B]).unwrap();
        assert!((value - 1674.75).abs() < 0.01);
    }

    #[test]
    fn coolant_formula() {
        // 0x73 = 115 => 75 °C
        let value = decode(0x05, &[0x73]).unwrap();
        assert!((value - 75.0).abs() < 0.01);
    }

    #[test]
    fn speed_formula() {
        let value = decode(0x0D, &[0x55]).unwrap();
        assert!((value - 85.0).abs() < 0.01);
    }

    #[test]
    fn throttle_formula_saturates_at_hundred() {
        let value = decode(0x11, &[0xFF]).unwrap();
        assert!((value - 100.0).abs() < 0.01);
    }

    #[test]
    fn malfunction_distance_formula() {
        let value = decode(0x21, &[0x01, 0x90]).unwrap();
        assert!((value - 400.0).abs() < 0.01);
    }

    #[test]
    fn short_octets_are_a_failed_sample() {
        assert_eq!(decode(0x0C, &[0x1A]), None);
        assert_eq!(decode(0x0D, &[]), None);
        assert_eq!(decode(0x1F, &[0x05]), None);
    }

    #[test]
    fn registry_is_ascending_and_duplicate_free() {
        let pids: Vec<u8> = registry().iter().map(|p| p.pid).collect();
        let mut sorted = pids.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(pids, sorted);
    }
}
