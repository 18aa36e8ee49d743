//! Fixed-point conversions from raw [`Fix`](crate::fix::Fix) fields to the
//! values the display shows. Integer math throughout.

/// Wall-clock time split out of the hhmmss field.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Hms {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
}

pub fn split_time(time: u32) -> Hms {
    Hms {
        hours: (time / 10_000) as u8,
        minutes: (time / 100 % 100) as u8,
        seconds: (time % 100) as u8,
    }
}

/// An angle split into degrees, minutes and whole seconds of arc.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Angle {
    pub degrees: u16,
    pub minutes: u8,
    pub seconds: u8,
}

/// `raw` is whole minutes of arc times 10^4, as the angular accumulator
/// leaves it: dividing by 60 separates degrees from minutes, the fractional
/// part scales to seconds (0.6142' -> 36").
pub fn split_angle(raw: u32) -> Angle {
    let total_minutes = raw / 10_000;
    let fraction = raw % 10_000;
    Angle {
        degrees: (total_minutes / 60) as u16,
        minutes: (total_minutes % 60) as u8,
        seconds: (fraction * 6 / 1_000) as u8,
    }
}

/// Knots*100 to whole km/h (1 knot = 1.852 km/h, approximated as 37/20).
pub fn knots_to_kmh(knots100: u16) -> u16 {
    (37 * knots100 as u32 / 2_000) as u16
}

/// Course in degrees, or `None` when the reading is not worth showing:
/// above 360 degrees it is noise, and below 3 km/h the course wanders
/// randomly around the fix jitter.
pub fn heading(course100: u16, kmh: u16) -> Option<u16> {
    let degrees = course100 / 100;
    if degrees > 360 || kmh < 3 {
        None
    } else {
        Some(degrees)
    }
}
