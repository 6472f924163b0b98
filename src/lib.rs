//! This Rust `embedded-hal`-based library drives [HD44780](https://en.wikipedia.org/wiki/Hitachi_HD44780_LCD_controller)
//! compatible character displays in an embedded, `no_std` environment. The display controller is driven in 4-bit
//! mode through one of two bus adapters:
//!
//! - **PCF8574-based I2C adapter** - The ubiquitous "I2C backpack" found on eBay and AliExpress. The 4-bit data pins
//!   of the display are connected to P4-P7 of the PCF8574 and RS, RW, E and the backlight switch to P0-P3.
//! - **Direct GPIO wiring** - RS, RW, E and D4-D7 connected to microcontroller output pins, with an optional
//!   backlight pin.
//!
//! Key features include:
//! - The full HD44780 power-on initialization sequence for 4-bit operation
//! - Line oriented text output that always overwrites a whole row
//! - Marquee and scroll-off animations
//! - Backlight control
//! - `core::fmt::Write` implementation for easy use with the `write!` macro
//! - Compatible with the `embedded-hal` traits v1.0 and later
//! - Optional support for the `defmt` and `ufmt` logging frameworks
//!
//! The driver is write-only. The busy flag is never read; every command waits for the controller's worst case
//! execution time instead.
//!
//! ## Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! hd44780-character-lcd = { version = "0.1", features = ["defmt"] }
//! ```
//! The `features = ["defmt"]` line is optional and enables the `defmt` feature, which adds `defmt` logging and
//! allows the library's errors to be used with the `defmt` logging framework. Another optional feature is
//! `features = ["ufmt"]`, which enables the `uwriteln!` and `uwrite!` macros.
//!
//! Then create the display for your adapter:
//! ```rust
//! use hd44780_character_lcd::{CharacterDisplayPCF8574T, LcdDisplayType};
//!
//! // board setup
//! let i2c = ...; // I2C peripheral
//! let delay = ...; // DelayNs implementation
//!
//! // It is recommended that the `i2c` object be wrapped in an `embedded_hal_bus::i2c::CriticalSectionDevice` so that it can be shared between
//! // multiple peripherals.
//! let mut lcd = CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, delay);
//! ```
//! Initialize the display:
//! ```rust
//! if let Err(e) = lcd.init() {
//!    panic!("Error initializing LCD: {}", e);
//! }
//! ```
//! Use the display:
//! ```rust
//! lcd.backlight_on()?.write_lines("Hello, world!\nSecond line")?;
//! lcd.marquee_text("Scrolling by...", 1, 200)?;
//! // can also use the `core::fmt::write!` macro
//! use core::fmt::Write;
//!
//! write!(lcd, "Hello, world!")?;
//! ```
//! Any error leaves the display in an unknown state. Call `init()` again before further use.
//!
#![no_std]
#![allow(dead_code, non_camel_case_types, non_upper_case_globals)]
use core::fmt::Display;

use embedded_hal::{delay::DelayNs, i2c};

mod driver;

pub use driver::{
    hd44780::{
        adapter::{generic_pcf8574t::GenericPCF8574TAdapter, parallel::ParallelAdapter},
        cursor_address, ControllerState, HD44780,
    },
    BacklightControl, BusAdapter, NibbleTransfer,
};

/// HD44780 based character display using a generic PCF8574T I2C adapter.
pub type CharacterDisplayPCF8574T<I2C, DELAY> =
    CharacterDisplay<GenericPCF8574TAdapter<I2C>, DELAY>;

/// HD44780 based character display wired directly to GPIO pins.
pub type CharacterDisplayParallel<PIN, DELAY> =
    CharacterDisplay<ParallelAdapter<PIN, DELAY>, DELAY>;

#[derive(Debug, PartialEq, Copy, Clone)]
/// Errors that can occur when using the display. `E` is the error type of the bus adapter.
pub enum CharacterDisplayError<E> {
    /// Error returned from the underlying bus: I2C NAK, timeout or a failed pin write
    BusError(E),
    /// Row is out of range for the configured display
    RowOutOfRange,
    /// Formatting error
    FormattingError(core::fmt::Error),
}

impl<E> From<core::fmt::Error> for CharacterDisplayError<E> {
    fn from(err: core::fmt::Error) -> Self {
        CharacterDisplayError::FormattingError(err)
    }
}

impl<E> From<&CharacterDisplayError<E>> for &'static str {
    fn from(err: &CharacterDisplayError<E>) -> Self {
        match err {
            CharacterDisplayError::BusError(_) => "Bus error",
            CharacterDisplayError::RowOutOfRange => "Row out of range",
            CharacterDisplayError::FormattingError(_) => "Formatting error",
        }
    }
}

#[cfg(feature = "defmt")]
impl<E> defmt::Format for CharacterDisplayError<E> {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl<E> ufmt::uDisplay for CharacterDisplayError<E> {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl<E> Display for CharacterDisplayError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg: &'static str = From::from(self);
        write!(f, "{}", msg)
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
/// The type of LCD display. This is used to determine the number of rows and columns.
pub enum LcdDisplayType {
    /// 20x4 display
    Lcd20x4,
    /// 20x2 display
    Lcd20x2,
    /// 16x2 display
    Lcd16x2,
    /// 16x4 display
    Lcd16x4,
    /// 8x2 display
    Lcd8x2,
    /// 40x2 display
    Lcd40x2,
    /// Any other single controller geometry. Rows are clamped to 1..=4 and columns to 1..=40.
    Custom { rows: u8, columns: u8 },
}

impl From<&LcdDisplayType> for &'static str {
    fn from(display_type: &LcdDisplayType) -> Self {
        match display_type {
            LcdDisplayType::Lcd20x4 => "20x4",
            LcdDisplayType::Lcd20x2 => "20x2",
            LcdDisplayType::Lcd16x2 => "16x2",
            LcdDisplayType::Lcd16x4 => "16x4",
            LcdDisplayType::Lcd8x2 => "8x2",
            LcdDisplayType::Lcd40x2 => "40x2",
            LcdDisplayType::Custom { .. } => "custom",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for LcdDisplayType {
    fn format(&self, fmt: defmt::Formatter) {
        let msg: &'static str = From::from(self);
        defmt::write!(fmt, "{}", msg);
    }
}

#[cfg(feature = "ufmt")]
impl ufmt::uDisplay for LcdDisplayType {
    fn fmt<W>(&self, w: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        let msg: &'static str = From::from(self);
        ufmt::uwrite!(w, "{}", msg)
    }
}

impl Display for LcdDisplayType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LcdDisplayType::Custom { rows, columns } => write!(f, "{}x{}", columns, rows),
            _ => {
                let msg: &'static str = From::from(self);
                write!(f, "{}", msg)
            }
        }
    }
}

impl LcdDisplayType {
    /// Get the number of rows for the display type
    const fn rows(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd20x4 => 4,
            LcdDisplayType::Lcd20x2 => 2,
            LcdDisplayType::Lcd16x2 => 2,
            LcdDisplayType::Lcd16x4 => 4,
            LcdDisplayType::Lcd8x2 => 2,
            LcdDisplayType::Lcd40x2 => 2,
            LcdDisplayType::Custom { rows, .. } => *rows,
        }
    }

    /// Get the number of columns for the display type
    const fn cols(&self) -> u8 {
        match self {
            LcdDisplayType::Lcd20x4 => 20,
            LcdDisplayType::Lcd20x2 => 20,
            LcdDisplayType::Lcd16x2 => 16,
            LcdDisplayType::Lcd16x4 => 16,
            LcdDisplayType::Lcd8x2 => 8,
            LcdDisplayType::Lcd40x2 => 40,
            LcdDisplayType::Custom { columns, .. } => *columns,
        }
    }
}

/// Direction for [`CharacterDisplay::scroll_content_off_screen`]
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ScrollDirection {
    Left,
    Right,
}

/// High level text display built on an [`HD44780`] controller driver.
pub struct CharacterDisplay<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    controller: HD44780<BUS, DELAY>,
    lcd_type: LcdDisplayType,
}

impl<BUS, DELAY> CharacterDisplay<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    /// Create a new character display object on the given bus adapter.
    pub fn new(bus: BUS, lcd_type: LcdDisplayType, delay: DELAY) -> Self {
        Self {
            controller: HD44780::new(bus, lcd_type, delay),
            lcd_type,
        }
    }

    /// Initialize the display. This must be called before using the display, and again after any error.
    pub fn init(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.initialize()?;
        Ok(self)
    }

    /// returns the `LcdDisplayType` used to create the display
    pub fn display_type(&self) -> LcdDisplayType {
        self.lcd_type
    }

    /// The underlying controller driver, for direct access to the HD44780 command set.
    pub fn controller(&self) -> &HD44780<BUS, DELAY> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut HD44780<BUS, DELAY> {
        &mut self.controller
    }

    //--------------------------------------------------------------------------------------------------
    // high level commands, for the user!
    //--------------------------------------------------------------------------------------------------

    /// Clear the display and return the cursor home.
    pub fn clear(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.clear()?;
        Ok(self)
    }

    /// Move the cursor to the start of `line`.
    pub fn reset_cursor(
        &mut self,
        line: u8,
    ) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.set_cursor(line, 0)?;
        Ok(self)
    }

    /// Write `text` to `line`, clipped or padded with spaces to the display width.
    pub fn write_line(
        &mut self,
        text: &str,
        line: u8,
    ) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.reset_cursor(line)?;
        self.controller.write_string(text)?;
        Ok(self)
    }

    /// Write text split on `'\n'`, one segment per row. Rows without a segment are blanked and
    /// segments beyond the last row are dropped.
    pub fn write_lines(
        &mut self,
        text: &str,
    ) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        let mut lines = text.split('\n');
        for row in 0..self.controller.num_rows() {
            self.write_line(lines.next().unwrap_or(""), row)?;
        }
        Ok(self)
    }

    /// Scroll `text` across `line` from the right edge until it has left on the left edge,
    /// waiting `step_ms` milliseconds between frames.
    pub fn marquee_text(
        &mut self,
        text: &str,
        line: u8,
        step_ms: u32,
    ) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        let columns = self.controller.num_columns() as usize;
        let frames = text.chars().count() + columns + 1;
        for offset in 0..frames {
            self.reset_cursor(line)?;
            let frame = core::iter::repeat(' ')
                .take(columns)
                .chain(text.chars())
                .chain(core::iter::repeat(' ').take(columns))
                .skip(offset);
            self.controller.write_chars(frame)?;
            self.controller.delay().delay_ms(step_ms);
        }
        Ok(self)
    }

    /// Shift the whole display one column at a time until the content has left the screen.
    pub fn scroll_content_off_screen(
        &mut self,
        direction: ScrollDirection,
        step_ms: u32,
    ) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        for _ in 0..self.controller.num_columns() {
            match direction {
                ScrollDirection::Left => self.controller.move_left()?,
                ScrollDirection::Right => self.controller.move_right()?,
            }
            self.controller.delay().delay_ms(step_ms);
        }
        Ok(self)
    }

    /// Turn on (unblank) the display.
    pub fn display_on(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.display_on()?;
        Ok(self)
    }

    /// Turn off (blank) the display.
    pub fn display_off(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.display_off()?;
        Ok(self)
    }

    /// Make the cursor visible.
    pub fn cursor_on(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.cursor_on()?;
        Ok(self)
    }

    pub fn cursor_off(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.cursor_off()?;
        Ok(self)
    }

    pub fn blink_on(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.blink_on()?;
        Ok(self)
    }

    pub fn blink_off(&mut self) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.blink_off()?;
        Ok(self)
    }

    /// Prints a string to the LCD at the current cursor position, without padding.
    pub fn print(&mut self, text: &str) -> Result<&mut Self, CharacterDisplayError<BUS::Error>> {
        self.controller.print(text)?;
        Ok(self)
    }
}

impl<BUS, DELAY> CharacterDisplay<BUS, DELAY>
where
    BUS: BusAdapter + BacklightControl<Error = <BUS as BusAdapter>::Error>,
    DELAY: DelayNs,
{
    /// Turn on the LCD backlight.
    pub fn backlight_on(
        &mut self,
    ) -> Result<&mut Self, CharacterDisplayError<<BUS as BusAdapter>::Error>> {
        self.controller.backlight_on()?;
        Ok(self)
    }

    /// Turn off the LCD backlight.
    pub fn backlight_off(
        &mut self,
    ) -> Result<&mut Self, CharacterDisplayError<<BUS as BusAdapter>::Error>> {
        self.controller.backlight_off()?;
        Ok(self)
    }
}

impl<I2C, DELAY> CharacterDisplay<GenericPCF8574TAdapter<I2C>, DELAY>
where
    I2C: i2c::I2c,
    DELAY: DelayNs,
{
    /// Create a new character display object with the default I2C address for the PCF8574T adapter.
    pub fn new_pcf8574t(i2c: I2C, lcd_type: LcdDisplayType, delay: DELAY) -> Self {
        Self::new(GenericPCF8574TAdapter::new(i2c), lcd_type, delay)
    }

    /// Create a new character display object with a specific I2C address for the PCF8574T adapter.
    pub fn new_pcf8574t_with_address(
        i2c: I2C,
        address: u8,
        lcd_type: LcdDisplayType,
        delay: DELAY,
    ) -> Self {
        Self::new(
            GenericPCF8574TAdapter::new_with_address(i2c, address),
            lcd_type,
            delay,
        )
    }

    /// returns a reference to the I2C peripheral. mostly needed for testing
    pub fn i2c(&mut self) -> &mut I2C {
        self.controller.bus().i2c()
    }
}

/// Implement the `core::fmt::Write` trait for the display, allowing it to be used with the `write!` macro.
/// Text is printed at the cursor without padding.
impl<BUS, DELAY> core::fmt::Write for CharacterDisplay<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    fn write_str(&mut self, s: &str) -> Result<(), core::fmt::Error> {
        if let Err(_e) = self.print(s) {
            return Err(core::fmt::Error);
        }
        Ok(())
    }
}

#[cfg(feature = "ufmt")]
/// Implement the `ufmt::uWrite` trait for the display, allowing it to be used with the `uwriteln!` and `uwrite!` macros.
impl<BUS, DELAY> ufmt::uWrite for CharacterDisplay<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    type Error = CharacterDisplayError<BUS::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.print(s)?;
        Ok(())
    }
}

#[cfg(test)]
mod lib_tests {
    extern crate std;
    use super::*;
    use embedded_hal_mock::eh1::{
        delay::NoopDelay,
        digital::{Mock as PinMock, State as PinLevel, Transaction as PinTransaction},
        i2c::{Mock as I2cMock, Transaction as I2cTransaction},
        MockError,
    };
    use std::vec::Vec;

    const I2C_ADDRESS: u8 = 0x27;

    /// Expander writes for one byte: high nibble then low nibble, each pulsed on Enable
    fn byte_transactions(rs: bool, backlight: bool, value: u8) -> Vec<I2cTransaction> {
        let mut transactions = Vec::new();
        for nibble in [value >> 4, value & 0x0F] {
            let bits = (nibble << 4) | ((backlight as u8) << 3) | rs as u8;
            transactions.push(I2cTransaction::write(I2C_ADDRESS, std::vec![bits | 0b0100]));
            transactions.push(I2cTransaction::write(I2C_ADDRESS, std::vec![bits]));
        }
        transactions
    }

    fn text_transactions(backlight: bool, text: &str) -> Vec<I2cTransaction> {
        text.bytes()
            .flat_map(|b| byte_transactions(true, backlight, b))
            .collect()
    }

    #[test]
    fn test_character_display_pcf8574t_init() {
        let expected_i2c_transactions = std::vec![
            // write nibble 0x3 three times
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0100]), // nibble 0x3, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0000]), // nibble 0x3, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0100]), // nibble 0x3, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0000]), // nibble 0x3, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0100]), // nibble 0x3, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0000]), // nibble 0x3, rw=0, enable=0
            // write nibble 0x2 one time
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0100]), // nibble 0x2, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0000]), // nibble 0x2, rw=0, enable=0
            // LCD_CMD_FUNCTIONSET | LCD_FLAG_2LINE
            // = 0x20 | 0x08 = 0x28
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0100]), // high nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0000]), // high nibble, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b1000_0100]), // low nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b1000_0000]), // low nibble, rw=0, enable=0
            // LCD_CMD_DISPLAYCONTROL | LCD_FLAG_DISPLAYON
            // = 0x08 | 0x04 = 0x0C
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0100]), // high nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0000]), // high nibble, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b1100_0100]), // low nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b1100_0000]), // low nibble, rw=0, enable=0
            // LCD_CMD_CLEARDISPLAY
            // = 0x01
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0100]), // high nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0000]), // high nibble, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0001_0100]), // low nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0001_0000]), // low nibble, rw=0, enable=0
            // LCD_CMD_RETURNHOME
            // = 0x02
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0100]), // high nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0000]), // high nibble, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0100]), // low nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0010_0000]), // low nibble, rw=0, enable=0
            // LCD_CMD_ENTRYMODESET | LCD_FLAG_ENTRYINCREMENT
            // = 0x04 | 0x02 = 0x06
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0100]), // high nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_0000]), // high nibble, rw=0, enable=0
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0110_0100]), // low nibble, rw=0, enable=1
            I2cTransaction::write(I2C_ADDRESS, std::vec![0b0110_0000]), // low nibble, rw=0, enable=0
        ];

        let i2c = I2cMock::new(&expected_i2c_transactions);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());
        let result = lcd.init();
        assert!(result.is_ok());
        assert!(lcd.display_type() == LcdDisplayType::Lcd16x2);

        // finish the i2c mock
        lcd.i2c().done();
    }

    #[test]
    fn test_init_failure_is_reported() {
        let expected_i2c_transactions =
            [I2cTransaction::write(I2C_ADDRESS, std::vec![0b0011_0100])
                .with_error(embedded_hal::i2c::ErrorKind::Other)];
        let i2c = I2cMock::new(&expected_i2c_transactions);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());

        assert!(matches!(
            lcd.init(),
            Err(CharacterDisplayError::BusError(embedded_hal::i2c::ErrorKind::Other))
        ));
        lcd.i2c().done();
    }

    #[test]
    fn test_write_line_with_backlight() {
        let mut expected =
            std::vec![I2cTransaction::write(I2C_ADDRESS, std::vec![0b0000_1000])];
        // row 1 of a 16x2: LCD_CMD_SETDDRAMADDR | 0x40
        expected.extend(byte_transactions(false, true, 0xC0));
        expected.extend(text_transactions(true, "hello           "));

        let i2c = I2cMock::new(&expected);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());
        assert!(lcd.backlight_on().is_ok());
        assert!(lcd.write_line("hello", 1).is_ok());
        assert!(lcd.controller().state().is_backlight_on());
        lcd.i2c().done();
    }

    #[test]
    fn test_write_lines_blanks_missing_rows() {
        let mut expected = Vec::new();
        expected.extend(byte_transactions(false, false, 0x80));
        expected.extend(text_transactions(false, "one "));
        expected.extend(byte_transactions(false, false, 0xC0));
        expected.extend(text_transactions(false, "    "));
        expected.extend(byte_transactions(false, false, 0x80));
        expected.extend(text_transactions(false, "a   "));
        expected.extend(byte_transactions(false, false, 0xC0));
        expected.extend(text_transactions(false, "b   "));

        let i2c = I2cMock::new(&expected);
        let mut lcd = CharacterDisplayPCF8574T::new_pcf8574t(
            i2c,
            LcdDisplayType::Custom { rows: 2, columns: 4 },
            NoopDelay::new(),
        );
        assert!(lcd.write_lines("one").is_ok());
        assert!(lcd.write_lines("a\nb\nc").is_ok());
        lcd.i2c().done();
    }

    #[test]
    fn test_marquee_text() {
        let mut expected = Vec::new();
        for frame in ["  ", " H", "Hi", "i ", "  "] {
            expected.extend(byte_transactions(false, false, 0x80));
            expected.extend(text_transactions(false, frame));
        }

        let i2c = I2cMock::new(&expected);
        let mut lcd = CharacterDisplayPCF8574T::new_pcf8574t(
            i2c,
            LcdDisplayType::Custom { rows: 1, columns: 2 },
            NoopDelay::new(),
        );
        assert!(lcd.marquee_text("Hi", 0, 0).is_ok());
        lcd.i2c().done();
    }

    #[test]
    fn test_scroll_content_off_screen() {
        let mut expected = Vec::new();
        for _ in 0..8 {
            // LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE
            expected.extend(byte_transactions(false, false, 0x18));
        }
        for _ in 0..8 {
            // LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVERIGHT
            expected.extend(byte_transactions(false, false, 0x1C));
        }

        let i2c = I2cMock::new(&expected);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd8x2, NoopDelay::new());
        assert!(lcd.scroll_content_off_screen(ScrollDirection::Left, 0).is_ok());
        assert!(lcd.scroll_content_off_screen(ScrollDirection::Right, 0).is_ok());
        lcd.i2c().done();
    }

    #[test]
    fn test_write_macro() {
        use core::fmt::Write;

        let expected = text_transactions(false, "t=42");
        let i2c = I2cMock::new(&expected);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());
        assert!(write!(lcd, "t={}", 42).is_ok());
        lcd.i2c().done();
    }

    #[cfg(feature = "ufmt")]
    #[test]
    fn test_uwrite_macro() {
        let expected = text_transactions(false, "t=42");
        let i2c = I2cMock::new(&expected);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());
        assert!(ufmt::uwrite!(lcd, "t={}", 42u8).is_ok());
        lcd.i2c().done();
    }

    fn pin_levels(levels: &[PinLevel]) -> PinMock {
        let transactions: Vec<PinTransaction> =
            levels.iter().cloned().map(PinTransaction::set).collect();
        PinMock::new(&transactions)
    }

    #[test]
    fn test_character_display_parallel_write_line() {
        use PinLevel::{High, Low};
        // LCD_CMD_SETDDRAMADDR (nibbles 0x8, 0x0, RS=0) then 'A' = 0x41 (nibbles 0x4, 0x1, RS=1)
        let pins = [
            pin_levels(&[Low, Low, Low, Low, High, High, High, High]), // rs
            pin_levels(&[Low, Low, Low, Low, Low, Low, Low, Low]),     // rw
            pin_levels(&[High, Low, High, Low, High, Low, High, Low]), // enable
            pin_levels(&[Low, Low, Low, Low, Low, Low, High, High]),   // d4
            pin_levels(&[Low, Low, Low, Low, Low, Low, Low, Low]),     // d5
            pin_levels(&[Low, Low, Low, Low, High, High, Low, Low]),   // d6
            pin_levels(&[High, High, Low, Low, Low, Low, Low, Low]),   // d7
            pin_levels(&[High]),                                       // backlight
        ];
        let [rs, rw, en, d4, d5, d6, d7, bl] = pins.clone();
        let adapter = ParallelAdapter::new(rs, rw, en, d4, d5, d6, d7, NoopDelay::new())
            .with_backlight(bl);
        let mut lcd: CharacterDisplayParallel<PinMock, NoopDelay> = CharacterDisplay::new(
            adapter,
            LcdDisplayType::Custom { rows: 1, columns: 1 },
            NoopDelay::new(),
        );

        assert!(lcd.backlight_on().is_ok());
        assert!(lcd.write_line("A", 0).is_ok());
        assert!(lcd.controller().state().is_backlight_on());
        for mut pin in pins {
            pin.done();
        }
    }

    #[test]
    fn test_character_display_parallel_init_failure() {
        // the first pin write of the first forced 8-bit nibble fails
        let mut rs = PinMock::new(&[PinTransaction::set(PinLevel::Low)
            .with_error(MockError::Io(std::io::ErrorKind::NotConnected))]);
        let mut others = [
            pin_levels(&[]),
            pin_levels(&[]),
            pin_levels(&[]),
            pin_levels(&[]),
            pin_levels(&[]),
            pin_levels(&[]),
        ];
        let [rw, en, d4, d5, d6, d7] = others.clone();
        let adapter = ParallelAdapter::new(rs.clone(), rw, en, d4, d5, d6, d7, NoopDelay::new());
        let mut lcd = CharacterDisplay::new(adapter, LcdDisplayType::Lcd16x2, NoopDelay::new());

        assert!(matches!(lcd.init(), Err(CharacterDisplayError::BusError(_))));
        rs.done();
        for pin in others.iter_mut() {
            pin.done();
        }
    }

    #[test]
    fn test_row_out_of_range_sends_nothing() {
        let i2c = I2cMock::new(&[]);
        let mut lcd =
            CharacterDisplayPCF8574T::new_pcf8574t(i2c, LcdDisplayType::Lcd16x2, NoopDelay::new());
        assert!(matches!(
            lcd.write_line("x", 2),
            Err(CharacterDisplayError::RowOutOfRange)
        ));
        lcd.i2c().done();
    }

    #[test]
    fn test_error_and_display_type_messages() {
        use std::string::ToString;

        let err: CharacterDisplayError<()> = CharacterDisplayError::RowOutOfRange;
        assert_eq!(err.to_string(), "Row out of range");
        assert_eq!(CharacterDisplayError::BusError(()).to_string(), "Bus error");
        assert_eq!(LcdDisplayType::Lcd20x4.to_string(), "20x4");
        assert_eq!(
            LcdDisplayType::Custom { rows: 1, columns: 24 }.to_string(),
            "24x1"
        );
    }
}
