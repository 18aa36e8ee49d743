//! Sharp memory display glued into a fixed-grid text panel.
//!
//! The GPS readout is four rows of labelled text, so on top of the raw
//! line-addressed driver sits [`TextPanel`]: a `(row, column)` cursor plus
//! ASCII output, which is all the decoder's consumer ever needs.

use core::convert::Infallible;
use core::fmt;

use embedded_graphics::mono_font::ascii::FONT_10X20;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics::text::{Baseline, Text};
use stm32l4xx_hal::hal::{blocking::spi::Write as SpiWrite, digital::v2::OutputPin};
use stm32l4xx_hal::spi;

const WIDTH: usize = 400;
const HEIGHT: usize = 240;
const WIDTH_BYTES: usize = WIDTH.div_ceil(8);
const HEIGHT_BYTES: usize = HEIGHT.div_ceil(8);

const UPDATE_BIT: u8 = 0b0000_0001;
const VCOM_BIT: u8 = 0b0000_0010;
const CLEAR_BIT: u8 = 0b0000_0100;

pub struct SharpMemDisplay<SPI, CS> {
    spi: SPI,
    cs: CS,
    vcom: bool,
    buf: [[u8; WIDTH_BYTES]; HEIGHT],
    dirty: [u8; HEIGHT_BYTES],
    dirty_any: bool,
}

impl<SPI, CS> SharpMemDisplay<SPI, CS>
where
    SPI: SpiWrite<u8, Error = spi::Error>,
    CS: OutputPin<Error = Infallible>,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            spi,
            cs,
            vcom: false,
            buf: [[0xFF; WIDTH_BYTES]; HEIGHT],
            dirty: [0; HEIGHT_BYTES],
            dirty_any: false,
        }
    }

    fn command(&mut self, command: u8) -> u8 {
        // VCOM must alternate with every transaction to keep the panel happy.
        self.vcom = !self.vcom;
        command | if self.vcom { VCOM_BIT } else { 0 }
    }

    pub fn draw_pixel(&mut self, x: usize, y: usize, state: bool) {
        if x >= WIDTH || y >= HEIGHT {
            return;
        }
        if state {
            self.buf[y][x / 8] |= 1u8 << (x % 8);
        } else {
            self.buf[y][x / 8] &= !(1u8 << (x % 8));
        }
        self.dirty[y / 8] |= 1u8 << (y % 8);
        self.dirty_any = true;
    }

    /// Send every dirty row to the panel.
    pub fn flush(&mut self) {
        if !self.dirty_any {
            return;
        }
        let cmd = self.command(UPDATE_BIT);
        self.cs.set_high().unwrap();
        self.spi.write(&[cmd]).unwrap();
        for y in 0..HEIGHT {
            if self.dirty[y / 8] & (1u8 << (y % 8)) == 0 {
                continue;
            }
            self.spi.write(&[y as u8]).unwrap(); // address byte
            self.spi.write(&self.buf[y]).unwrap(); // row data
            self.spi.write(&[0x00]).unwrap(); // spacing byte
        }
        self.spi.write(&[0x00]).unwrap(); // termination byte
        self.cs.set_low().unwrap();

        self.dirty = [0; HEIGHT_BYTES];
        self.dirty_any = false;
    }

    /// Blank the panel and the framebuffer.
    pub fn clear(&mut self) {
        let cmd = self.command(CLEAR_BIT);
        self.cs.set_high().unwrap();
        self.spi.write(&[cmd, 0x00]).unwrap();
        self.cs.set_low().unwrap();

        self.buf = [[0xFF; WIDTH_BYTES]; HEIGHT];
        self.dirty = [0; HEIGHT_BYTES];
        self.dirty_any = false;
    }
}

impl<SPI, CS> DrawTarget for SharpMemDisplay<SPI, CS>
where
    SPI: SpiWrite<u8, Error = spi::Error>,
    CS: OutputPin<Error = Infallible>,
{
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(pos, color) in pixels {
            // The panel is white-on-power-up: an "on" pixel clears the bit.
            self.draw_pixel(
                pos.x as usize,
                pos.y as usize,
                match color {
                    BinaryColor::Off => true,
                    BinaryColor::On => false,
                },
            );
        }
        Ok(())
    }
}

impl<SPI, CS> Dimensions for SharpMemDisplay<SPI, CS> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size {
                width: WIDTH as u32,
                height: HEIGHT as u32,
            },
        }
    }
}

pub const ROWS: u8 = 4;
pub const COLS: u8 = 20;

const ORIGIN_X: i32 = 8;
const ORIGIN_Y: i32 = 12;
const CELL_W: i32 = 10; // FONT_10X20 advance
const ROW_PITCH: i32 = 28;

/// Character-cell view of the display: place the cursor, print ASCII.
pub struct TextPanel<SPI, CS> {
    display: SharpMemDisplay<SPI, CS>,
    row: u8,
    col: u8,
}

impl<SPI, CS> TextPanel<SPI, CS>
where
    SPI: SpiWrite<u8, Error = spi::Error>,
    CS: OutputPin<Error = Infallible>,
{
    pub fn new(spi: SPI, cs: CS) -> Self {
        Self {
            display: SharpMemDisplay::new(spi, cs),
            row: 0,
            col: 0,
        }
    }

    fn style() -> MonoTextStyle<'static, BinaryColor> {
        // Opaque background so reprinting a row overwrites the old text.
        MonoTextStyleBuilder::new()
            .font(&FONT_10X20)
            .text_color(BinaryColor::On)
            .background_color(BinaryColor::Off)
            .build()
    }

    pub fn set_cursor(&mut self, row: u8, col: u8) {
        self.row = row.min(ROWS - 1);
        self.col = col.min(COLS - 1);
    }

    /// Print ASCII text at the cursor and advance it. Text past the last
    /// column is dropped.
    pub fn print(&mut self, text: &str) {
        let room = (COLS - self.col) as usize;
        let text = &text[..text.len().min(room)];
        if text.is_empty() {
            return;
        }
        let origin = Point {
            x: ORIGIN_X + self.col as i32 * CELL_W,
            y: ORIGIN_Y + self.row as i32 * ROW_PITCH,
        };
        Text::with_baseline(text, origin, Self::style(), Baseline::Top)
            .draw(&mut self.display)
            .unwrap();
        self.col += text.len() as u8;
    }

    pub fn clear(&mut self) {
        self.display.clear();
        self.row = 0;
        self.col = 0;
    }

    pub fn flush(&mut self) {
        self.display.flush();
    }
}

impl<SPI, CS> fmt::Write for TextPanel<SPI, CS>
where
    SPI: SpiWrite<u8, Error = spi::Error>,
    CS: OutputPin<Error = Infallible>,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.print(s);
        Ok(())
    }
}
