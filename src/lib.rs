#![cfg_attr(not(test), no_std)]

use core::fmt::{self, Write};
use tinyvec::ArrayVec;

pub mod fix;
pub mod parse;
pub mod uart;
pub mod units;

#[cfg(target_os = "none")]
pub mod display;

#[cfg(target_os = "none")]
mod probe {
    use core::sync::atomic::{AtomicUsize, Ordering};
    use defmt_brtt as _; // global logger

    use panic_probe as _;

    // same panicking *behavior* as `panic-probe` but doesn't print a panic message
    // this prevents the panic message being printed *twice* when `defmt::panic` is invoked
    #[defmt::panic_handler]
    fn panic() -> ! {
        cortex_m::asm::udf()
    }

    static COUNT: AtomicUsize = AtomicUsize::new(0);
    defmt::timestamp!("{=usize}", {
        // NOTE(no-CAS) `timestamps` runs with interrupts disabled
        let n = COUNT.load(Ordering::Relaxed);
        COUNT.store(n + 1, Ordering::Relaxed);
        n
    });

    /// Terminates the application and makes `probe-rs` exit with exit-code = 0
    pub fn exit() -> ! {
        loop {
            cortex_m::asm::bkpt();
        }
    }
}

#[cfg(target_os = "none")]
pub use probe::exit;

pub struct FmtBuf<const N: usize = 256>(pub ArrayVec<[u8; N]>);

impl<const N: usize> Write for FmtBuf<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for b in s.bytes() {
            self.0.try_push(b);
        }
        Ok(())
    }
}

impl<const N: usize> Default for FmtBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FmtBuf<N> {
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.0.as_slice()).ok()
    }

    pub fn new() -> Self {
        Self(Default::default())
    }
}
