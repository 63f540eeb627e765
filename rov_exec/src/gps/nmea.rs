//! NMEA sentence decoding

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::gps::GpsFix;
use nmea0183::{ParseResult, Parser};

use super::GpsParseError;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Sentences which carry a position and time.
pub const SENTENCE_PREFIXES: [&str; 2] = ["$GPGGA", "$GPRMC"];

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// True if the line starts with one of the recognised sentence prefixes.
pub fn is_position_sentence(line: &str) -> bool {
    SENTENCE_PREFIXES.iter().any(|p| line.starts_with(p))
}

/// Decode a single GGA or RMC sentence into a fix.
///
/// The checksum must be present and correct. Sentences reporting no fix are rejected.
pub fn parse_sentence(line: &str) -> Result<GpsFix, GpsParseError> {
    let line = line.trim();

    if !is_position_sentence(line) {
        return Err(GpsParseError::Unsupported);
    }

    // A fresh parser per line so a broken sentence can't leak into the next one
    let mut parser = Parser::new();
    let mut result = None;
    for byte in line.bytes().chain(b"\r\n".iter().copied()) {
        if let Some(r) = parser.parse_from_byte(byte) {
            result = Some(r);
        }
    }

    let (lat, lon) = match result {
        Some(Ok(ParseResult::GGA(Some(gga)))) => (gga.latitude.as_f64(), gga.longitude.as_f64()),
        Some(Ok(ParseResult::RMC(Some(rmc)))) => (rmc.latitude.as_f64(), rmc.longitude.as_f64()),
        Some(Ok(ParseResult::GGA(None))) | Some(Ok(ParseResult::RMC(None))) => {
            return Err(GpsParseError::NoFix)
        }
        Some(Ok(_)) => return Err(GpsParseError::Unsupported),
        Some(Err(e)) => return Err(GpsParseError::Malformed(e.to_string())),
        None => return Err(GpsParseError::Incomplete),
    };

    // Both sentence types carry the UTC time as the first field
    let time_field = line.split(',').nth(1).unwrap_or("");

    Ok(GpsFix {
        latitude: Some(format_coord(lat, 'N', 'S')),
        longitude: Some(format_coord(lon, 'E', 'W')),
        timestamp: Some(format_time(time_field)?),
    })
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed decimal degrees to `"<abs degrees> <hemisphere>"`.
fn format_coord(deg: f64, pos: char, neg: char) -> String {
    let hemisphere = if deg < 0.0 { neg } else { pos };
    format!("{:.6} {}", deg.abs(), hemisphere)
}

/// `hhmmss[.sss]` to `HH:MM:SS[.ffffff]`.
fn format_time(field: &str) -> Result<String, GpsParseError> {
    let invalid = || GpsParseError::InvalidTime(field.to_string());

    if field.len() < 6 || !field.is_char_boundary(6) {
        return Err(invalid());
    }

    let hours: u8 = field[0..2].parse().map_err(|_| invalid())?;
    let minutes: u8 = field[2..4].parse().map_err(|_| invalid())?;
    let seconds: f64 = field[4..].parse().map_err(|_| invalid())?;

    if hours > 23 || minutes > 59 || !(0.0..61.0).contains(&seconds) {
        return Err(invalid());
    }

    let whole = seconds.trunc();
    let micros = ((seconds - whole) * 1e6).round() as u32;

    if micros == 0 {
        Ok(format!("{:02}:{:02}:{:02}", hours, minutes, whole as u8))
    } else {
        Ok(format!(
            "{:02}:{:02}:{:02}.{:06}",
            hours, minutes, whole as u8, micros
        ))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const GGA: &str =
        "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str =
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
    const GGA_SW: &str =
        "$GPGGA,092750.500,5321.6802,S,00630.3372,W,1,8,1.03,61.7,M,55.2,M,,*6E";

    /// Split `"<deg> <hemisphere>"` back into parts
    fn coord(s: &Option<String>) -> (f64, String) {
        let s = s.as_ref().expect("no coordinate");
        let mut parts = s.split(' ');
        let deg = parts.next().unwrap().parse().unwrap();
        (deg, parts.next().unwrap().to_string())
    }

    #[test]
    fn test_parse_gga() {
        let fix = parse_sentence(GGA).unwrap();

        let (lat, ns) = coord(&fix.latitude);
        assert!((lat - 48.1173).abs() < 1e-4);
        assert_eq!(ns, "N");

        let (lon, ew) = coord(&fix.longitude);
        assert!((lon - 11.516_667).abs() < 1e-4);
        assert_eq!(ew, "E");

        assert_eq!(fix.timestamp.as_deref(), Some("12:35:19"));
    }

    #[test]
    fn test_parse_rmc() {
        let fix = parse_sentence(RMC).unwrap();
        assert_eq!(fix, parse_sentence(GGA).unwrap());
    }

    #[test]
    fn test_parse_southern_western() {
        let fix = parse_sentence(GGA_SW).unwrap();

        let (lat, ns) = coord(&fix.latitude);
        assert!((lat - 53.361_337).abs() < 1e-4);
        assert_eq!(ns, "S");

        let (lon, ew) = coord(&fix.longitude);
        assert!((lon - 6.505_62).abs() < 1e-4);
        assert_eq!(ew, "W");

        assert_eq!(fix.timestamp.as_deref(), Some("09:27:50.500000"));
    }

    #[test]
    fn test_parse_rejects() {
        // Bad checksum
        assert!(parse_sentence(&GGA.replace("*47", "*00")).is_err());
        // Truncated
        assert!(parse_sentence("$GPGGA,123519,4807.0").is_err());
        assert!(parse_sentence("$GPGGA,garbage,,,*12").is_err());
        // Other sentences are not position sentences
        assert_eq!(
            parse_sentence("$GPGSV,3,1,11,03,03,111,00,04,15,270,00,06,01,010,00,13,06,292,00*74"),
            Err(GpsParseError::Unsupported)
        );
        assert_eq!(parse_sentence(""), Err(GpsParseError::Unsupported));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time("000000").unwrap(), "00:00:00");
        assert_eq!(format_time("235959.25").unwrap(), "23:59:59.250000");
        assert!(format_time("2359").is_err());
        assert!(format_time("ab3519").is_err());
        assert!(format_time("256000").is_err());
    }

    #[test]
    fn test_is_position_sentence() {
        assert!(is_position_sentence(GGA));
        assert!(is_position_sentence(RMC));
        assert!(!is_position_sentence("$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48"));
    }
}
