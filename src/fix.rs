//! The decoded GPS record and the discipline for sharing it between the
//! sampling interrupts and the display code.

use core::cell::Cell;
use critical_section::Mutex;

/// One decoded RMC sentence.
///
/// Raw field encodings are kept as the parser produced them; [`crate::units`]
/// turns them into something printable.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct Fix {
    /// UTC time as hhmmss.
    pub time: u32,
    /// Fractional seconds of the timestamp.
    pub millis: u16,
    /// Whole minutes of arc times 10^4 (mixed-radix: divide by 60 for
    /// degrees, the remainder is minutes, the 10^4 fraction is sub-minute).
    pub latitude: u32,
    /// Same encoding as `latitude`.
    pub longitude: u32,
    /// Hemisphere marker, `b'N'` or `b'S'`.
    pub ns: u8,
    /// Hemisphere marker, `b'E'` or `b'W'`.
    pub ew: u8,
    /// Speed over ground in knots times 100.
    pub knots: u16,
    /// Course over ground in degrees times 100.
    pub course: u16,
    /// Date as ddmmyy.
    pub date: u32,
    /// True once at least one full sentence has decoded.
    pub acquired: bool,
}

impl Fix {
    pub const fn new() -> Self {
        Self {
            time: 0,
            millis: 0,
            latitude: 0,
            longitude: 0,
            ns: 0,
            ew: 0,
            knots: 0,
            course: 0,
            date: 0,
            acquired: false,
        }
    }
}

impl Default for Fix {
    fn default() -> Self {
        Self::new()
    }
}

/// The record shared between the interrupt context and the consumer.
///
/// The interrupt side only ever publishes whole records, and the consumer
/// only ever copies whole records out under a critical section, so a reader
/// can never observe fields from two different sentences mixed together.
pub struct SharedFix(Mutex<Cell<Fix>>);

impl SharedFix {
    pub const fn new() -> Self {
        Self(Mutex::new(Cell::new(Fix::new())))
    }

    /// Publish a completed record. Interrupt context.
    pub fn publish(&self, fix: Fix) {
        critical_section::with(|cs| self.0.borrow(cs).set(fix));
    }

    /// Copy the latest record out under a critical section. The returned
    /// value is internally consistent; this is the only read path.
    pub fn snapshot(&self) -> Fix {
        critical_section::with(|cs| self.0.borrow(cs).get())
    }
}

impl Default for SharedFix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::RmcParser;

    const FIRST: &[u8] =
        b"$GPRMC,194509.000,A,4042.6142,N,07400.4168,W,2.03,221.11,160412,,,A*77\r\n";
    const SECOND: &[u8] =
        b"$GPRMC,220209.000,A,5928.1590,N,01805.3657,E,0.37,339.13,300615,,,A*6B\r\n";

    fn pump(parser: &mut RmcParser, shared: &SharedFix, input: &[u8]) {
        for &c in input {
            if let Some(fix) = parser.feed(c) {
                shared.publish(fix);
            }
        }
    }

    #[test]
    fn snapshot_starts_unacquired() {
        let shared = SharedFix::new();
        assert!(!shared.snapshot().acquired);
    }

    #[test]
    fn snapshot_never_mixes_sentences() {
        let shared = SharedFix::new();
        let mut parser = RmcParser::new();
        pump(&mut parser, &shared, FIRST);
        let complete = shared.snapshot();
        assert_eq!(complete.time, 194509);

        // Interleave: a second sentence is in flight but not finished. Every
        // snapshot taken meanwhile must still be the first record, intact.
        for (i, &c) in SECOND[..SECOND.len() - 10].iter().enumerate() {
            if let Some(fix) = parser.feed(c) {
                shared.publish(fix);
            }
            assert_eq!(shared.snapshot(), complete, "tearing after {i} chars");
        }

        // Finishing the sentence swaps the whole record at once.
        pump(&mut parser, &shared, &SECOND[SECOND.len() - 10..]);
        let next = shared.snapshot();
        assert_eq!(next.time, 220209);
        assert_eq!(next.date, 300615);
        assert_eq!(next.ew, b'E');
    }
}
