//! End-to-end: raw line-level events through bit recovery, byte assembly and
//! sentence parsing, down to a consistent published record.

use gps_lcd::fix::SharedFix;
use gps_lcd::parse::RmcParser;
use gps_lcd::uart::{BitSampler, SampleClock};

/// Stand-in for the timer/EXTI hardware; the pipeline under test only needs
/// the calls to exist.
#[derive(Default)]
struct FakeClock;

impl SampleClock for FakeClock {
    fn arm_half_bit(&mut self) {}
    fn arm_full_bit(&mut self) {}
    fn disarm(&mut self) {}
    fn watch_edges(&mut self) {}
    fn ignore_edges(&mut self) {}
}

/// Serialize one byte the way the GPS module puts it on the wire: a low
/// start bit, then eight data bits least significant first.
fn transmit(sampler: &mut BitSampler, clock: &mut FakeClock, byte: u8) -> Option<u8> {
    sampler.on_edge(false, clock);
    sampler.on_tick(false, clock); // mid start bit
    let mut out = None;
    for i in 0..8 {
        let level = byte & (1 << i) != 0;
        if let Some(b) = sampler.on_tick(level, clock) {
            out = Some(b);
        }
    }
    out
}

const SENTENCE: &[u8] =
    b"$GPRMC,194509.000,A,4042.6142,N,07400.4168,W,2.03,221.11,160412,,,A*77\r\n";

#[test]
fn wire_to_snapshot() {
    let shared = SharedFix::new();
    let mut sampler = BitSampler::new();
    let mut clock = FakeClock;
    let mut parser = RmcParser::new();

    for &c in SENTENCE {
        let byte = transmit(&mut sampler, &mut clock, c).expect("every frame yields a byte");
        assert_eq!(byte, c, "byte reconstructed from line timing");
        if let Some(fix) = parser.feed(byte) {
            shared.publish(fix);
        }
    }

    let fix = shared.snapshot();
    assert!(fix.acquired);
    assert_eq!(fix.time, 194509);
    assert_eq!(fix.millis, 0);
    assert_eq!(fix.latitude, 24426142);
    assert_eq!(fix.ns, b'N');
    assert_eq!(fix.longitude, 44404168);
    assert_eq!(fix.ew, b'W');
    assert_eq!(fix.knots, 203);
    assert_eq!(fix.course, 22111);
    assert_eq!(fix.date, 160412);
}

#[test]
fn line_noise_before_sentence_is_survived() {
    let shared = SharedFix::new();
    let mut sampler = BitSampler::new();
    let mut clock = FakeClock;
    let mut parser = RmcParser::new();

    // A burst of junk bytes, then a clean sentence.
    for &c in b"\xff\x00GARBAGE,123$GPR" {
        if let Some(byte) = transmit(&mut sampler, &mut clock, c) {
            if let Some(fix) = parser.feed(byte) {
                shared.publish(fix);
            }
        }
    }
    assert!(!shared.snapshot().acquired);

    for &c in SENTENCE {
        if let Some(byte) = transmit(&mut sampler, &mut clock, c) {
            if let Some(fix) = parser.feed(byte) {
                shared.publish(fix);
            }
        }
    }
    let fix = shared.snapshot();
    assert!(fix.acquired);
    assert_eq!(fix.date, 160412);
}
