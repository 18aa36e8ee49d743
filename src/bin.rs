#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", feature(type_alias_impl_trait))]

// The firmware only makes sense on the target; host builds (tests) get a stub.
#[cfg(not(target_os = "none"))]
fn main() {}

#[cfg(target_os = "none")]
mod fw {
    use core::fmt::Write as _;

    use defmt::{info, trace};
    use gps_lcd::{
        display::TextPanel,
        fix::SharedFix,
        parse::RmcParser,
        uart::{BitSampler, SampleClock},
        units, FmtBuf,
    };
    use core::convert::Infallible;
    use rtic_monotonics::{create_systick_token, systick::Systick};
    use rtic_sync::{
        channel::{Receiver, Sender},
        make_channel,
    };
    use stm32l4xx_hal::{
        gpio::{Alternate, Edge, ExtiPin, Floating, Input, Output, PushPull, PA0, PA4, PA5, PA6, PA7},
        hal::digital::v2::InputPin,
        hal::spi::{Mode, Phase, Polarity},
        pac,
        pac::SPI1,
        prelude::*,
        rcc::{ClockSecuritySystem, CrystalBypass},
        spi::Spi,
    };

    type Panel = TextPanel<
        Spi<
            SPI1,
            (
                PA5<Alternate<PushPull, 5>>,
                PA6<Alternate<PushPull, 5>>,
                PA7<Alternate<PushPull, 5>>,
            ),
        >,
        PA4<Output<PushPull>>,
    >;

    const BAUD: u32 = 9600;
    const BIT_PERIOD_US: u32 = 1_000_000 / BAUD;
    const HALF_BIT_US: u32 = BIT_PERIOD_US / 2;

    const REDRAW_QUEUE: usize = 4;

    /// Decoded records cross from the sampling interrupt to the display task
    /// through here.
    static FIX: SharedFix = SharedFix::new();

    /// The GPS serial line: the rx pin with its EXTI edge detection, plus the
    /// timer pacing the bit samples. TIM2 is prescaled to 1 MHz so periods
    /// are plain microseconds.
    pub struct RxLine<P> {
        pub pin: P,
        pub tim: pac::TIM2,
        pub exti: pac::EXTI,
    }

    impl<P: InputPin<Error = Infallible> + ExtiPin> RxLine<P> {
        fn level(&self) -> bool {
            self.pin.is_high().unwrap()
        }

        fn clear_edge(&mut self) {
            self.pin.clear_interrupt_pending_bit();
        }

        fn clear_tick(&mut self) {
            self.tim.sr.modify(|_, w| w.uif().clear_bit());
        }

        fn restart(&mut self, period_us: u32) {
            self.tim.cr1.modify(|_, w| w.cen().clear_bit());
            self.tim.arr.write(|w| unsafe { w.bits(period_us - 1) });
            self.tim.cnt.write(|w| unsafe { w.bits(0) });
            self.tim.sr.modify(|_, w| w.uif().clear_bit());
            self.tim.dier.modify(|_, w| w.uie().set_bit());
            self.tim.cr1.modify(|_, w| w.cen().set_bit());
        }
    }

    impl<P: InputPin<Error = Infallible> + ExtiPin> SampleClock for RxLine<P> {
        fn arm_half_bit(&mut self) {
            self.restart(HALF_BIT_US);
        }

        fn arm_full_bit(&mut self) {
            self.restart(BIT_PERIOD_US);
        }

        fn disarm(&mut self) {
            self.tim.cr1.modify(|_, w| w.cen().clear_bit());
            self.tim.dier.modify(|_, w| w.uie().clear_bit());
        }

        fn watch_edges(&mut self) {
            self.pin.clear_interrupt_pending_bit();
            self.pin.enable_interrupt(&mut self.exti);
        }

        fn ignore_edges(&mut self) {
            self.pin.disable_interrupt(&mut self.exti);
        }
    }

    pub struct RxUart<P> {
        pub sampler: BitSampler,
        pub line: RxLine<P>,
    }

    type GpsRx = RxUart<PA0<Input<Floating>>>;

    // Row layout, as on the original 20x4 panel: labels left, values at col 9.
    const LABELS: [&str; 4] = ["GMT", "Lat", "Long", "Heading"];
    const VALUE_COL: u8 = 9;

    fn render(panel: &mut Panel) {
        let fix = FIX.snapshot();
        let time = units::split_time(fix.time);
        let lat = units::split_angle(fix.latitude);
        let lon = units::split_angle(fix.longitude);
        let kmh = units::knots_to_kmh(fix.knots);

        let mut buf = FmtBuf::<16>::new();
        let _ = write!(buf, " {:02}:{:02}", time.hours, time.minutes);
        panel.set_cursor(0, VALUE_COL);
        panel.print(buf.as_str().unwrap_or(""));

        let mut buf = FmtBuf::<16>::new();
        let _ = write!(
            buf,
            " {:2}.{:02}.{:02} {}",
            lat.degrees,
            lat.minutes,
            lat.seconds,
            fix.ns as char
        );
        panel.set_cursor(1, VALUE_COL);
        panel.print(buf.as_str().unwrap_or(""));

        let mut buf = FmtBuf::<16>::new();
        let _ = write!(
            buf,
            "{:3}.{:02}.{:02} {}",
            lon.degrees,
            lon.minutes,
            lon.seconds,
            fix.ew as char
        );
        panel.set_cursor(2, VALUE_COL);
        panel.print(buf.as_str().unwrap_or(""));

        let mut buf = FmtBuf::<16>::new();
        match units::heading(fix.course, kmh) {
            Some(degrees) => {
                let _ = write!(buf, " {:3} deg ", degrees);
            }
            None => {
                let _ = write!(buf, " --- deg ");
            }
        }
        panel.set_cursor(3, VALUE_COL);
        panel.print(buf.as_str().unwrap_or(""));
    }

    #[rtic::app(
        device = stm32l4xx_hal::pac,
        dispatchers = [EXTI2, EXTI3],
    )]
    mod app {
        use super::*;

        #[shared]
        struct Shared {
            rx: GpsRx,
        }

        #[local]
        struct Local {
            parser: RmcParser,
            redraw: Sender<'static, (), REDRAW_QUEUE>,
        }

        #[init]
        fn init(mut cx: init::Context) -> (Shared, Local) {
            trace!("init enter");

            let mut flash = cx.device.FLASH.constrain();
            let mut rcc = cx.device.RCC.constrain();
            let mut pwr = cx.device.PWR.constrain(&mut rcc.apb1r1);
            let clocks = rcc
                .cfgr
                .lse(CrystalBypass::Disable, ClockSecuritySystem::Disable)
                .freeze(&mut flash.acr, &mut pwr);

            let mut gpioa = cx.device.GPIOA.split(&mut rcc.ahb2);

            // Create SysTick monotonic for task scheduling
            Systick::start(cx.core.SYST, clocks.sysclk().raw(), create_systick_token!());

            // Initialize SPI and the display
            let mut cs = gpioa
                .pa4
                .into_push_pull_output(&mut gpioa.moder, &mut gpioa.otyper);
            cs.set_low();
            let sck = gpioa
                .pa5
                .into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
            let miso = gpioa
                .pa6
                .into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
            let mosi = gpioa
                .pa7
                .into_alternate(&mut gpioa.moder, &mut gpioa.otyper, &mut gpioa.afrl);
            let spi1 = Spi::spi1(
                cx.device.SPI1,
                (sck, miso, mosi),
                Mode {
                    phase: Phase::CaptureOnFirstTransition,
                    polarity: Polarity::IdleLow,
                },
                2.MHz(),
                clocks,
                &mut rcc.apb2,
            );

            // The GPS serial line: falling edges on PA0 mark start bits
            let mut rx_pin = gpioa
                .pa0
                .into_floating_input(&mut gpioa.moder, &mut gpioa.pupdr);
            rx_pin.make_interrupt_source(&mut cx.device.SYSCFG, &mut rcc.apb2);
            rx_pin.trigger_on_edge(&mut cx.device.EXTI, Edge::Falling);
            rx_pin.enable_interrupt(&mut cx.device.EXTI);

            // TIM2 paces the bit sampling; prescale it down to 1 MHz
            unsafe {
                let dp = pac::Peripherals::steal();
                dp.RCC.apb1enr1.modify(|_, w| w.tim2en().set_bit());
                dp.RCC.apb1rstr1.modify(|_, w| w.tim2rst().set_bit());
                dp.RCC.apb1rstr1.modify(|_, w| w.tim2rst().clear_bit());
            }
            let tim = cx.device.TIM2;
            let psc = clocks.pclk1().raw() / 1_000_000 - 1;
            tim.psc.write(|w| unsafe { w.bits(psc) });

            let (redraw_tx, redraw_rx) = make_channel!((), REDRAW_QUEUE);

            display_task::spawn(Panel::new(spi1, cs), redraw_rx)
                .map_err(|_| ())
                .unwrap();

            info!("done initializing!");
            (
                Shared {
                    rx: RxUart {
                        sampler: BitSampler::new(),
                        line: RxLine {
                            pin: rx_pin,
                            tim,
                            exti: cx.device.EXTI,
                        },
                    },
                },
                Local {
                    parser: RmcParser::new(),
                    redraw: redraw_tx,
                },
            )
        }

        #[idle]
        fn idle(_: idle::Context) -> ! {
            trace!("idle enter");

            loop {
                // Only sleep in release mode, since the debugger doesn't interact with sleep very nicely
                #[cfg(debug_assertions)]
                cortex_m::asm::nop();
                #[cfg(not(debug_assertions))]
                cortex_m::asm::wfi();
            }
        }

        ////////////////////////////////////////////////////////////////////
        // Hardware interrupt handlers /////////////////////////////////////
        ////////////////////////////////////////////////////////////////////

        // Start-bit edge on the GPS line
        #[task(binds = EXTI0, priority = 10, shared = [rx])]
        fn on_start_edge(mut cx: on_start_edge::Context) {
            cx.shared.rx.lock(|rx| {
                let RxUart { sampler, line } = rx;
                line.clear_edge();
                let level = line.level();
                sampler.on_edge(level, line);
            });
        }

        // Mid-bit sample tick; runs the whole decode pipeline to completion
        #[task(binds = TIM2, priority = 10, shared = [rx], local = [parser, redraw])]
        fn on_sample_tick(mut cx: on_sample_tick::Context) {
            let byte = cx.shared.rx.lock(|rx| {
                let RxUart { sampler, line } = rx;
                line.clear_tick();
                let level = line.level();
                sampler.on_tick(level, line)
            });
            if let Some(b) = byte {
                trace!("rx byte {:x}", b);
                if let Some(fix) = cx.local.parser.feed(b) {
                    info!("decoded fix: {}", fix);
                    FIX.publish(fix);
                    let _ = cx.local.redraw.try_send(());
                }
            }
        }

        ////////////////////////////////////////////////////////////////////
        // Display /////////////////////////////////////////////////////////
        ////////////////////////////////////////////////////////////////////

        #[task(priority = 1)]
        async fn display_task(
            _cx: display_task::Context,
            mut panel: Panel,
            mut redraw: Receiver<'static, (), REDRAW_QUEUE>,
        ) {
            panel.clear();
            panel.set_cursor(0, 0);
            panel.print("No fix");
            panel.flush();

            // Nothing worth showing until the first complete sentence lands.
            while !FIX.snapshot().acquired {
                Systick::delay(250.millis()).await;
            }

            panel.clear();
            for (row, label) in LABELS.iter().enumerate() {
                panel.set_cursor(row as u8, 0);
                panel.print(label);
            }
            render(&mut panel);
            panel.flush();

            while redraw.recv().await.is_ok() {
                render(&mut panel);
                panel.flush();
            }
        }
    }
}
