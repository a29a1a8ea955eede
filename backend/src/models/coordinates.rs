//! Celestial coordinate types and sexagesimal angle parsing.
//!
//! Angles arrive from clients and catalogs as base-60 strings
//! (`"HH:MM:SS.sss"` for right ascension, `"±DD:MM:SS.sss"` for declination)
//! or as decimal degrees. Everything the converters produce is expressed in
//! [`qtty::Degrees`].

use std::fmt;
use std::str::FromStr;

use qtty::Degrees;
use serde::{Deserialize, Serialize};

use crate::error::{ErrorContext, PhtError, PhtResult};

/// Unit of the leading sexagesimal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleUnit {
    /// Hours of right ascension; one hour is 15 degrees.
    HourAngle,
    /// Degrees of arc.
    Degree,
}

impl AngleUnit {
    /// Degrees per leading unit.
    pub fn degrees_per_unit(self) -> f64 {
        match self {
            AngleUnit::HourAngle => 15.0,
            AngleUnit::Degree => 1.0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AngleUnit::HourAngle => "right ascension",
            AngleUnit::Degree => "declination",
        }
    }
}

/// A parsed base-60 angle: sign, leading unit, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SexagesimalAngle {
    pub negative: bool,
    pub whole: u32,
    pub minutes: u32,
    pub seconds: f64,
}

impl SexagesimalAngle {
    /// Parse `"[±]W:MM:SS.sss"` (colon or whitespace separated).
    ///
    /// Minutes must be an integer in `[0, 60)` and seconds a number in
    /// `[0, 60]` (60 is what a rounded `59.9996` prints as).
    pub fn parse(text: &str, unit: AngleUnit) -> PhtResult<Self> {
        let angle = Self::parse_fields(text, unit)?;
        angle.check_range(text, unit)?;
        Ok(angle)
    }

    fn parse_fields(text: &str, unit: AngleUnit) -> PhtResult<Self> {
        let trimmed = text.trim();
        let (negative, body) = split_sign(trimmed);
        let fields: Vec<&str> = body
            .split(|c: char| c == ':' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();

        if fields.len() != 3 {
            return Err(malformed(text, unit, "expected three sexagesimal fields"));
        }

        let whole: u32 = fields[0]
            .parse()
            .map_err(|_| malformed(text, unit, "leading field is not an integer"))?;
        let minutes: u32 = fields[1]
            .parse()
            .map_err(|_| malformed(text, unit, "minutes are not an integer"))?;
        let seconds: f64 = fields[2]
            .parse()
            .map_err(|_| malformed(text, unit, "seconds are not a number"))?;

        if minutes >= 60 {
            return Err(malformed(text, unit, "minutes out of range"));
        }
        if !seconds.is_finite() || !(0.0..=60.0).contains(&seconds) {
            return Err(malformed(text, unit, "seconds out of range"));
        }

        Ok(Self {
            negative,
            whole,
            minutes,
            seconds,
        })
    }

    /// Value in the leading unit (hours or degrees), signed.
    pub fn value(&self) -> f64 {
        let magnitude =
            self.whole as f64 + self.minutes as f64 / 60.0 + self.seconds / 3600.0;
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Value converted to degrees of arc.
    pub fn to_degrees(&self, unit: AngleUnit) -> Degrees {
        Degrees::new(self.value() * unit.degrees_per_unit())
    }

    fn check_range(&self, text: &str, unit: AngleUnit) -> PhtResult<()> {
        let value = self.value();
        match unit {
            AngleUnit::HourAngle if self.negative || value > 24.0 => {
                Err(malformed(text, unit, "hours must lie in [0, 24]"))
            }
            AngleUnit::Degree if value.abs() > 90.0 => {
                Err(malformed(text, unit, "degrees must lie in [-90, 90]"))
            }
            _ => Ok(()),
        }
    }
}

/// Parse either a sexagesimal string or a plain decimal number in `unit`.
pub fn parse_angle(text: &str, unit: AngleUnit) -> PhtResult<Degrees> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return check_coordinate_range(value * unit.degrees_per_unit(), unit, text);
    }
    SexagesimalAngle::parse(trimmed, unit).map(|a| a.to_degrees(unit))
}

/// Parse `text` written in degrees of arc (sexagesimal or decimal) as the
/// coordinate that `field` natively measures.
///
/// A right ascension tagged `deg` is read as `"DDD:MM:SS"` and may exceed 90.
pub fn parse_degrees(text: &str, field: AngleUnit) -> PhtResult<Degrees> {
    let trimmed = text.trim();
    let degrees = match trimmed.parse::<f64>() {
        Ok(value) => value,
        Err(_) => SexagesimalAngle::parse_fields(trimmed, field)?.value(),
    };
    check_coordinate_range(degrees, field, text)
}

/// Accept `degrees` only inside the valid range of its coordinate:
/// right ascension in `[0, 360]`, declination in `[-90, 90]`.
pub fn check_coordinate_range(degrees: f64, field: AngleUnit, text: &str) -> PhtResult<Degrees> {
    let (valid, reason) = match field {
        AngleUnit::HourAngle => (
            (0.0..=360.0).contains(&degrees),
            "right ascension must lie in [0, 360] degrees",
        ),
        AngleUnit::Degree => (
            (-90.0..=90.0).contains(&degrees),
            "declination must lie in [-90, 90] degrees",
        ),
    };
    if valid {
        Ok(Degrees::new(degrees))
    } else {
        Err(malformed(text, field, reason))
    }
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

pub(crate) fn malformed(text: &str, unit: AngleUnit, reason: &str) -> PhtError {
    PhtError::validation_with_context(
        format!("Malformed {} '{}': {}", unit.label(), text, reason),
        ErrorContext::new("parse_sexagesimal")
            .with_entity("coordinate")
            .with_details(reason),
    )
}

/// Reference frames the service can answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceFrame {
    Equatorial,
    Galactic,
    Horizontal,
}

impl FromStr for ReferenceFrame {
    type Err = PhtError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equatorial" | "icrs" => Ok(Self::Equatorial),
            "galactic" => Ok(Self::Galactic),
            "horizontal" | "altaz" => Ok(Self::Horizontal),
            _ => Err(PhtError::validation(format!(
                "Unknown reference frame: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equatorial => "equatorial",
            Self::Galactic => "galactic",
            Self::Horizontal => "horizontal",
        };
        f.write_str(name)
    }
}

/// Equatorial position as sexagesimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SexagesimalPosition {
    pub ra: String,
    pub dec: String,
}

impl SexagesimalPosition {
    pub fn new(ra: impl Into<String>, dec: impl Into<String>) -> Self {
        Self {
            ra: ra.into(),
            dec: dec.into(),
        }
    }
}

/// Equatorial (ICRS) position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquatorialCoordinates {
    pub ra: Degrees,
    pub dec: Degrees,
}

/// Galactic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GalacticCoordinates {
    pub longitude: Degrees,
    pub latitude: Degrees,
}

/// Horizontal (alt-az) position in decimal degrees. Azimuth is measured from
/// north through east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizontalCoordinates {
    pub azimuth: Degrees,
    pub elevation: Degrees,
}

/// A position on the sky in exactly one reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reference_frame", rename_all = "lowercase")]
pub enum CelestialCoordinate {
    Equatorial(EquatorialCoordinates),
    Galactic(GalacticCoordinates),
    Horizontal(HorizontalCoordinates),
}

impl CelestialCoordinate {
    pub fn frame(&self) -> ReferenceFrame {
        match self {
            Self::Equatorial(_) => ReferenceFrame::Equatorial,
            Self::Galactic(_) => ReferenceFrame::Galactic,
            Self::Horizontal(_) => ReferenceFrame::Horizontal,
        }
    }
}

/// Geodetic location of an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverSite {
    pub name: String,
    /// Geodetic latitude, north positive
    pub latitude: Degrees,
    /// Longitude, east positive
    pub longitude: Degrees,
    pub elevation_m: f64,
}

impl ObserverSite {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, elevation_m: f64) -> Self {
        Self {
            name: name.into(),
            latitude: Degrees::new(latitude),
            longitude: Degrees::new(longitude),
            elevation_m,
        }
    }

    /// SKA-Mid array reference position (Karoo, South Africa).
    pub fn ska_mid() -> Self {
        Self::new("SKA-Mid", -30.7131, 21.4430, 1053.0)
    }

    /// SKA-Low array reference position (Inyarrimanha Ilgari Bundara, Australia).
    pub fn ska_low() -> Self {
        Self::new("SKA-Low", -26.8247, 116.7644, 377.8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_right_ascension() {
        let ra = SexagesimalAngle::parse("12:30:00", AngleUnit::HourAngle).unwrap();
        assert_eq!(ra.whole, 12);
        assert_eq!(ra.minutes, 30);
        assert_eq!(ra.to_degrees(AngleUnit::HourAngle).value(), 187.5);
    }

    #[test]
    fn test_parse_negative_zero_declination() {
        let dec = SexagesimalAngle::parse("-00:30:00", AngleUnit::Degree).unwrap();
        assert!(dec.negative);
        assert_eq!(dec.to_degrees(AngleUnit::Degree).value(), -0.5);
    }

    #[test]
    fn test_parse_space_separated() {
        let dec = SexagesimalAngle::parse("+22 00 53", AngleUnit::Degree).unwrap();
        assert!((dec.value() - 22.014722).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(SexagesimalAngle::parse("12:30", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("ab:30:00", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("12:75:00", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("12:00:61", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("25:00:00", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("-01:00:00", AngleUnit::HourAngle).is_err());
        assert!(SexagesimalAngle::parse("+91:00:00", AngleUnit::Degree).is_err());
    }

    #[test]
    fn test_parse_angle_accepts_decimal() {
        assert_eq!(parse_angle("10.5", AngleUnit::HourAngle).unwrap().value(), 157.5);
        assert_eq!(parse_angle("-12.25", AngleUnit::Degree).unwrap().value(), -12.25);
    }

    #[test]
    fn test_parse_angle_range_checks_decimal() {
        assert!(parse_angle("123.0", AngleUnit::Degree).is_err());
        assert!(parse_angle("-90.5", AngleUnit::Degree).is_err());
        assert!(parse_angle("24.5", AngleUnit::HourAngle).is_err());
        assert!(parse_angle("-1", AngleUnit::HourAngle).is_err());
        assert!(parse_angle("NaN", AngleUnit::Degree).is_err());
        assert!(parse_angle("inf", AngleUnit::HourAngle).is_err());
        assert_eq!(parse_angle("24", AngleUnit::HourAngle).unwrap().value(), 360.0);
        assert_eq!(parse_angle("-90", AngleUnit::Degree).unwrap().value(), -90.0);
    }

    #[test]
    fn test_parse_degrees_uses_field_range() {
        let ra = parse_degrees("180:30:00", AngleUnit::HourAngle).unwrap();
        assert_eq!(ra.value(), 180.5);
        assert_eq!(parse_degrees("200.25", AngleUnit::HourAngle).unwrap().value(), 200.25);
        assert!(parse_degrees("361", AngleUnit::HourAngle).is_err());
        assert!(parse_degrees("-10:00:00", AngleUnit::HourAngle).is_err());
        assert!(parse_degrees("+91:00:00", AngleUnit::Degree).is_err());
        assert!(parse_degrees("123.0", AngleUnit::Degree).is_err());
        assert_eq!(parse_degrees("-45:30:00", AngleUnit::Degree).unwrap().value(), -45.5);
    }

    #[test]
    fn test_malformed_is_validation_error() {
        let err = parse_angle("not-an-angle", AngleUnit::Degree).unwrap_err();
        assert!(matches!(err, PhtError::ValidationError { .. }));
        assert!(err.message().contains("declination"));
    }

    #[test]
    fn test_reference_frame_from_str() {
        assert_eq!("Galactic".parse::<ReferenceFrame>().unwrap(), ReferenceFrame::Galactic);
        assert_eq!("icrs".parse::<ReferenceFrame>().unwrap(), ReferenceFrame::Equatorial);
        assert!("ecliptic".parse::<ReferenceFrame>().is_err());
    }

    #[test]
    fn test_celestial_coordinate_is_tagged() {
        let coord = CelestialCoordinate::Galactic(GalacticCoordinates {
            longitude: Degrees::new(121.17),
            latitude: Degrees::new(-21.57),
        });
        let json = serde_json::to_value(coord).unwrap();
        assert_eq!(json["reference_frame"], "galactic");
        assert_eq!(json["longitude"], 121.17);
        assert_eq!(coord.frame(), ReferenceFrame::Galactic);
    }
}
