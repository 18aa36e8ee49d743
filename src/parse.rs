//! Table-driven RMC sentence interpreter.
//!
//! The sentence layout is described by a compact format string, compiled once
//! into typed tokens at build time. Each incoming character either matches a
//! literal, feeds an accumulator, or finalizes a field of the [`Fix`] under
//! construction. Any mismatch silently resets the cursor and the parser waits
//! for the next `$`.

use crate::fix::Fix;

/// One position of the format template.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Token {
    /// Must match the input character exactly, else resync.
    Lit(u8),
    /// Matches and discards anything (checksum and unused fields).
    Any,
    /// Decimal digit into the short accumulator.
    ShortDigit,
    /// Decimal digit into the long accumulator.
    LongDigit,
    /// Mixed-radix step: the tens-of-minutes digit of an angle scales the
    /// long accumulator by six, so the result divides by 60 into degrees.
    AngularDigit,
    /// Final digit of hhmmss time.
    TimeEnd,
    /// Final digit of the fractional seconds.
    MillisEnd,
    /// Hemisphere character closing the latitude field.
    LatEnd,
    /// Hemisphere character closing the longitude field.
    LonEnd,
    /// Integer part of the speed: variable length, ends at the decimal point.
    SpeedInt,
    /// Final digit of speed in knots.
    SpeedEnd,
    /// Final digit of the course.
    CourseEnd,
    /// Final digit of the date; the record is complete.
    DateEnd,
}

// $GPRMC,194509.000,A,4042.6142,N,07400.4168,W,2.03,221.11,160412,,,A*77
const RMC_FORMAT: &[u8; 70] =
    b"$GPRMC,dddddt.ddm,A,eeae.eeee,l,eeeae.eeee,o,djdk,ddd.dc,dddddy,,,A*??";

static TEMPLATE: [Token; RMC_FORMAT.len()] = compile(RMC_FORMAT);

const fn compile<const N: usize>(format: &[u8; N]) -> [Token; N] {
    let mut out = [Token::Any; N];
    let mut i = 0;
    while i < N {
        out[i] = match format[i] {
            b'?' => Token::Any,
            b'd' => Token::ShortDigit,
            b'e' => Token::LongDigit,
            b'a' => Token::AngularDigit,
            b't' => Token::TimeEnd,
            b'm' => Token::MillisEnd,
            b'l' => Token::LatEnd,
            b'o' => Token::LonEnd,
            b'j' => Token::SpeedInt,
            b'k' => Token::SpeedEnd,
            b'c' => Token::CourseEnd,
            b'y' => Token::DateEnd,
            other => Token::Lit(other),
        };
        i += 1;
    }
    out
}

/// Incremental GPRMC decoder.
///
/// Fed one character at a time from the serial receiver; returns the decoded
/// record when a full sentence has been consumed.
pub struct RmcParser {
    cursor: usize,
    short: u16,
    long: u32,
    fix: Fix,
}

impl Default for RmcParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RmcParser {
    pub const fn new() -> Self {
        Self {
            cursor: 0,
            short: 0,
            long: 0,
            fix: Fix::new(),
        }
    }

    /// Consume one character. Arithmetic wraps rather than checks: a corrupt
    /// sentence may decode to nonsense values, but the parser itself never
    /// fails, it just waits for the next `$`.
    pub fn feed(&mut self, c: u8) -> Option<Fix> {
        if c == b'$' {
            self.cursor = 0;
            self.short = 0;
            self.long = 0;
        }
        let Some(&token) = TEMPLATE.get(self.cursor) else {
            // Ran off the end of the template (trailing CR/LF); resync.
            self.cursor = 0;
            return None;
        };
        self.cursor += 1;
        if token == Token::Lit(c) || token == Token::Any {
            return None;
        }
        let d = c.wrapping_sub(b'0');
        match token {
            Token::ShortDigit => {
                self.short = self.short.wrapping_mul(10).wrapping_add(d as u16);
            }
            Token::LongDigit => {
                self.long = self.long.wrapping_mul(10).wrapping_add(d as u32);
            }
            Token::AngularDigit => {
                self.long = self.long.wrapping_mul(6).wrapping_add(d as u32);
            }
            Token::TimeEnd => {
                self.fix.time = (self.short as u32).wrapping_mul(10).wrapping_add(d as u32);
                self.short = 0;
            }
            Token::MillisEnd => {
                self.fix.millis = self.short.wrapping_mul(10).wrapping_add(d as u16);
                self.short = 0;
            }
            Token::LatEnd => {
                self.fix.ns = if c == b'N' { b'N' } else { b'S' };
                self.fix.latitude = self.long;
                self.long = 0;
            }
            Token::LonEnd => {
                self.fix.ew = if c == b'E' { b'E' } else { b'W' };
                self.fix.longitude = self.long;
                self.long = 0;
            }
            Token::SpeedInt => {
                if c != b'.' {
                    self.short = self.short.wrapping_mul(10).wrapping_add(d as u16);
                    // Keep this token current so the integer part may be any
                    // number of digits; the decimal point moves us along.
                    self.cursor -= 1;
                }
            }
            Token::SpeedEnd => {
                self.fix.knots = self.short.wrapping_mul(10).wrapping_add(d as u16);
                self.short = 0;
            }
            Token::CourseEnd => {
                self.fix.course = self.short.wrapping_mul(10).wrapping_add(d as u16);
                self.short = 0;
            }
            Token::DateEnd => {
                self.fix.date = (self.short as u32).wrapping_mul(10).wrapping_add(d as u32);
                self.fix.acquired = true;
                self.short = 0;
                return Some(self.fix);
            }
            // A literal that didn't match: drop the sentence, wait for `$`.
            Token::Lit(_) | Token::Any => self.cursor = 0,
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &[u8] =
        b"$GPRMC,194509.000,A,4042.6142,N,07400.4168,W,2.03,221.11,160412,,,A*77\r\n";

    fn feed_all(parser: &mut RmcParser, input: &[u8]) -> Option<Fix> {
        let mut last = None;
        for &c in input {
            if let Some(fix) = parser.feed(c) {
                last = Some(fix);
            }
        }
        last
    }

    #[test]
    fn decodes_reference_sentence() {
        let mut parser = RmcParser::new();
        let fix = feed_all(&mut parser, SENTENCE).expect("sentence should complete");
        assert_eq!(fix.time, 194509);
        assert_eq!(fix.millis, 0);
        assert_eq!(fix.latitude, 24426142); // 40*60+42 = 2442 minutes, *10^4
        assert_eq!(fix.ns, b'N');
        assert_eq!(fix.longitude, 44404168); // 74*60+0 = 4440 minutes, *10^4
        assert_eq!(fix.ew, b'W');
        assert_eq!(fix.knots, 203);
        assert_eq!(fix.course, 22111);
        assert_eq!(fix.date, 160412);
        assert!(fix.acquired);
    }

    #[test]
    fn resyncs_after_malformed_prefix() {
        let mut parser = RmcParser::new();
        let mut input = b"GARBAGE$GPRMC,12,$GPXTE,abc,".to_vec();
        input.extend_from_slice(SENTENCE);
        let fix = feed_all(&mut parser, &input).expect("trailing sentence should decode");
        assert_eq!(fix.time, 194509);
        assert_eq!(fix.date, 160412);
    }

    #[test]
    fn repeated_sentence_is_idempotent() {
        let mut parser = RmcParser::new();
        let first = feed_all(&mut parser, SENTENCE).unwrap();
        let second = feed_all(&mut parser, SENTENCE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn speed_integer_part_is_variable_length() {
        for (speed, expect) in [("2.03", 203u16), ("12.34", 1234), ("123.45", 12345)] {
            let mut parser = RmcParser::new();
            let mut input = b"$GPRMC,194509.000,A,4042.6142,N,07400.4168,W,".to_vec();
            input.extend_from_slice(speed.as_bytes());
            input.extend_from_slice(b",221.11,160412,,,A*77\r\n");
            let fix = feed_all(&mut parser, &input).expect("sentence should complete");
            assert_eq!(fix.knots, expect, "speed {speed}");
            // The decimal point must not corrupt the fields after it.
            assert_eq!(fix.course, 22111);
            assert_eq!(fix.date, 160412);
        }
    }

    #[test]
    fn mixed_radix_angle_round_trips() {
        let mut parser = RmcParser::new();
        let fix = feed_all(&mut parser, SENTENCE).unwrap();
        // "4042.6142" is 40 degrees 42.6142 minutes.
        let total_minutes = fix.latitude / 10_000;
        assert_eq!(total_minutes / 60, 40);
        assert_eq!(total_minutes % 60, 42);
        assert_eq!(fix.latitude % 10_000, 6142);
    }

    #[test]
    fn southern_western_hemispheres() {
        let mut parser = RmcParser::new();
        let fix = feed_all(
            &mut parser,
            b"$GPRMC,220209.000,A,5928.1590,S,01805.3657,E,0.37,339.13,300615,,,A*6B\r\n",
        )
        .unwrap();
        assert_eq!(fix.ns, b'S');
        assert_eq!(fix.ew, b'E');
        assert_eq!(fix.time, 220209);
        assert_eq!(fix.knots, 37);
        assert_eq!(fix.course, 33913);
        assert_eq!(fix.date, 300615);
    }

    #[test]
    fn void_status_drops_sentence() {
        // Status 'V' fails the 'A' literal; nothing may complete.
        let mut parser = RmcParser::new();
        let input = b"$GPRMC,194509.000,V,4042.6142,N,07400.4168,W,2.03,221.11,160412,,,A*77\r\n";
        assert_eq!(feed_all(&mut parser, input), None);
        // The next valid sentence still decodes.
        let fix = feed_all(&mut parser, SENTENCE).unwrap();
        assert_eq!(fix.time, 194509);
    }

    #[test]
    fn acquired_only_after_date_terminal() {
        let mut parser = RmcParser::new();
        // Stop just before the date field's last digit.
        let partial = &SENTENCE[..SENTENCE.len() - 12];
        assert_eq!(feed_all(&mut parser, partial), None);
    }
}
