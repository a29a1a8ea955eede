//! Coordinate conversion and sexagesimal formatting.
//!
//! All functions here are pure: the output depends only on the arguments.
//! Right ascension strings are hour-angle sexagesimal (15° per hour),
//! declination strings are degree sexagesimal.

use chrono::{DateTime, Utc};
use qtty::Degrees;

use crate::error::PhtResult;
use crate::models::coordinates::{
    malformed, parse_angle, AngleUnit, EquatorialCoordinates, GalacticCoordinates,
    HorizontalCoordinates, ObserverSite, SexagesimalPosition,
};

/// Rotation from ICRS to the IAU Galactic frame (Hipparcos definition,
/// ESA 1997 vol. 1 §1.5.3). Rows are the galactic x, y, z axes in ICRS.
const ICRS_TO_GALACTIC: [[f64; 3]; 3] = [
    [-0.054_875_560_416_215_4, -0.873_437_090_234_885_0, -0.483_835_015_548_713_2],
    [0.494_109_427_875_583_7, -0.444_829_629_960_011_2, 0.746_982_244_497_218_9],
    [-0.867_666_149_019_004_7, -0.198_076_373_431_201_5, 0.455_983_776_175_066_9],
];

const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Round the seconds field of an RA/Dec pair to three decimal places.
///
/// Only the seconds component changes; the leading field and the minutes are
/// copied verbatim and the seconds are written as `%06.3f`. Applying the
/// function to its own output returns the same strings.
pub fn round_to_milliarcsecond_precision(ra: &str, dec: &str) -> PhtResult<SexagesimalPosition> {
    Ok(SexagesimalPosition {
        ra: round_seconds_field(ra, AngleUnit::HourAngle)?,
        dec: round_seconds_field(dec, AngleUnit::Degree)?,
    })
}

fn round_seconds_field(text: &str, unit: AngleUnit) -> PhtResult<String> {
    let fields: Vec<&str> = text.trim().split(':').collect();
    let [whole, minutes, seconds] = fields.as_slice() else {
        return Err(malformed(text, unit, "expected HH:MM:SS.sss"));
    };

    let unsigned = whole.trim_start_matches(['+', '-']);
    if unsigned.is_empty() || unsigned.parse::<u32>().is_err() {
        return Err(malformed(text, unit, "leading field is not an integer"));
    }
    if minutes.parse::<u32>().map_or(true, |m| m >= 60) {
        return Err(malformed(text, unit, "minutes out of range"));
    }
    let seconds: f64 = seconds
        .parse()
        .map_err(|_| malformed(text, unit, "seconds are not a number"))?;
    if !seconds.is_finite() || !(0.0..=60.0).contains(&seconds) {
        return Err(malformed(text, unit, "seconds out of range"));
    }

    Ok(format!("{}:{}:{:06.3}", whole, minutes, round_to(seconds, 3)))
}

/// Convert sexagesimal RA (hours) and Dec (degrees) to decimal degrees,
/// both rounded to three decimal places.
pub fn convert_sexagesimal_to_decimal_degrees(
    ra: &str,
    dec: &str,
) -> PhtResult<EquatorialCoordinates> {
    let position = parse_equatorial(ra, dec)?;
    Ok(EquatorialCoordinates {
        ra: Degrees::new(round_to(position.ra.value(), 3)),
        dec: Degrees::new(round_to(position.dec.value(), 3)),
    })
}

/// Parse an RA/Dec pair without rounding.
pub fn parse_equatorial(ra: &str, dec: &str) -> PhtResult<EquatorialCoordinates> {
    Ok(EquatorialCoordinates {
        ra: parse_angle(ra, AngleUnit::HourAngle)?,
        dec: parse_angle(dec, AngleUnit::Degree)?,
    })
}

/// Convert an ICRS RA/Dec pair given as strings to Galactic coordinates.
pub fn convert_equatorial_to_galactic(ra: &str, dec: &str) -> PhtResult<GalacticCoordinates> {
    Ok(equatorial_to_galactic(parse_equatorial(ra, dec)?))
}

/// Rotate an ICRS position into the Galactic frame.
///
/// Longitude is returned in `[0, 360)`, latitude in `[-90, 90]`.
pub fn equatorial_to_galactic(eq: EquatorialCoordinates) -> GalacticCoordinates {
    let v = unit_vector(eq.ra.value(), eq.dec.value());
    let g = rotate(&ICRS_TO_GALACTIC, v);
    let (longitude, latitude) = spherical(g);
    GalacticCoordinates {
        longitude: Degrees::new(longitude),
        latitude: Degrees::new(latitude),
    }
}

/// Inverse of [`equatorial_to_galactic`].
pub fn convert_galactic_to_equatorial(gal: GalacticCoordinates) -> EquatorialCoordinates {
    let v = unit_vector(gal.longitude.value(), gal.latitude.value());
    let e = rotate(&transpose(&ICRS_TO_GALACTIC), v);
    let (ra, dec) = spherical(e);
    EquatorialCoordinates {
        ra: Degrees::new(ra),
        dec: Degrees::new(dec),
    }
}

/// Greenwich mean sidereal time in degrees (IAU 1982 expression).
pub fn greenwich_mean_sidereal_time(instant: DateTime<Utc>) -> Degrees {
    let unix = instant.timestamp() as f64 + instant.timestamp_subsec_nanos() as f64 * 1e-9;
    let jd = unix / SECONDS_PER_DAY + JD_UNIX_EPOCH;
    let d = jd - JD_J2000;
    let t = d / 36_525.0;
    let gmst = 280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    Degrees::new(gmst.rem_euclid(360.0))
}

/// Local mean sidereal time at `site`, in degrees.
pub fn local_sidereal_time(site: &ObserverSite, instant: DateTime<Utc>) -> Degrees {
    let lst = greenwich_mean_sidereal_time(instant).value() + site.longitude.value();
    Degrees::new(lst.rem_euclid(360.0))
}

/// Geometric azimuth/elevation of an equatorial position seen from `site`.
///
/// Precession, nutation and refraction are not applied.
pub fn convert_equatorial_to_horizontal(
    eq: EquatorialCoordinates,
    site: &ObserverSite,
    instant: DateTime<Utc>,
) -> HorizontalCoordinates {
    let hour_angle = (local_sidereal_time(site, instant).value() - eq.ra.value()).to_radians();
    let dec = eq.dec.value().to_radians();
    let lat = site.latitude.value().to_radians();

    let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
    let elevation = sin_alt.clamp(-1.0, 1.0).asin();

    let y = -dec.cos() * hour_angle.sin();
    let x = dec.sin() * lat.cos() - dec.cos() * lat.sin() * hour_angle.cos();
    let azimuth = y.atan2(x).to_degrees().rem_euclid(360.0);

    HorizontalCoordinates {
        azimuth: Degrees::new(azimuth),
        elevation: Degrees::new(elevation.to_degrees()),
    }
}

/// Format an angle in degrees as canonical sexagesimal text.
///
/// Hour angles become `HH:MM:SS.sss` wrapped into `[0h, 24h)`; degrees become
/// `±DD:MM:SS.sss`. Rounding happens on the total milliseconds so the seconds
/// field never prints as `60.000`.
pub fn format_sexagesimal(degrees: f64, unit: AngleUnit) -> String {
    match unit {
        AngleUnit::HourAngle => {
            let hours = degrees.rem_euclid(360.0) / 15.0;
            let total_ms = (hours * 3_600_000.0).round() as i64 % (24 * 3_600_000);
            let (whole, minutes, seconds) = split_milliseconds(total_ms);
            format!("{:02}:{:02}:{:06.3}", whole, minutes, seconds)
        }
        AngleUnit::Degree => {
            let sign = if degrees < 0.0 { '-' } else { '+' };
            let total_ms = (degrees.abs() * 3_600_000.0).round() as i64;
            let (whole, minutes, seconds) = split_milliseconds(total_ms);
            format!("{}{:02}:{:02}:{:06.3}", sign, whole, minutes, seconds)
        }
    }
}

/// Format an equatorial position as canonical sexagesimal strings.
pub fn format_equatorial(eq: EquatorialCoordinates) -> SexagesimalPosition {
    SexagesimalPosition {
        ra: format_sexagesimal(eq.ra.value(), AngleUnit::HourAngle),
        dec: format_sexagesimal(eq.dec.value(), AngleUnit::Degree),
    }
}

fn split_milliseconds(total_ms: i64) -> (i64, i64, f64) {
    let whole = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) as f64 / 1000.0;
    (whole, minutes, seconds)
}

fn unit_vector(lon_deg: f64, lat_deg: f64) -> [f64; 3] {
    let (lon, lat) = (lon_deg.to_radians(), lat_deg.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn rotate(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (row, o) in m.iter().zip(out.iter_mut()) {
        *o = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

fn transpose(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut t = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            t[j][i] = *value;
        }
    }
    t
}

fn spherical(v: [f64; 3]) -> (f64, f64) {
    let mut lon = v[1].atan2(v[0]).to_degrees().rem_euclid(360.0);
    if lon >= 360.0 {
        lon = 0.0;
    }
    let lat = v[2].clamp(-1.0, 1.0).asin().to_degrees();
    (lon, lat)
}

#[cfg(test)]
#[path = "coordinates_tests.rs"]
mod coordinates_tests;
