// HD44780 Support
// The HD44780 struct implements the controller protocol: the 4-bit initialization sequence,
// command and data byte framing, the display control and entry mode flag bookkeeping, and the
// DDRAM address arithmetic. It owns an object implementing `BusAdapter`, which is where the
// physical connection is implemented. Two adapters are provided:
//      * GenericPCF8574TAdapter - PCF8574 I2C GPIO expander
//      * ParallelAdapter - direct wiring to GPIO pins
//

pub mod adapter;

use embedded_hal::delay::DelayNs;

use crate::{
    driver::{BacklightControl, BusAdapter},
    CharacterDisplayError, LcdDisplayType,
};

// commands
pub const LCD_CMD_CLEARDISPLAY: u8 = 0x01; //  Clear display, set cursor position to zero
pub const LCD_CMD_RETURNHOME: u8 = 0x02; //  Set cursor position to zero
pub const LCD_CMD_ENTRYMODESET: u8 = 0x04; //  Sets the entry mode
pub const LCD_CMD_DISPLAYCONTROL: u8 = 0x08; //  Controls the display; does stuff like turning it off and on
pub const LCD_CMD_CURSORSHIFT: u8 = 0x10; //  Lets you move the cursor or shift the display
pub const LCD_CMD_FUNCTIONSET: u8 = 0x20; //  Used to send the function to set to the display
pub const LCD_CMD_SETCGRAMADDR: u8 = 0x40; //  Used to set the CGRAM (character generator RAM) address
pub const LCD_CMD_SETDDRAMADDR: u8 = 0x80; //  Used to set the DDRAM (Display Data RAM) address

// flags for display entry mode
pub const LCD_FLAG_ENTRYINCREMENT: u8 = 0x02; //  Cursor moves right after each write (left to right text)
pub const LCD_FLAG_ENTRYSHIFT: u8 = 0x01; //  Display shifts on each write (auto scroll)

// flags for display on/off control
pub const LCD_FLAG_DISPLAYON: u8 = 0x04; //  Turns the display on
pub const LCD_FLAG_CURSORON: u8 = 0x02; //  Turns the cursor on
pub const LCD_FLAG_BLINKON: u8 = 0x01; //  Turns on the blinking cursor

// flags for display/cursor shift
pub const LCD_FLAG_DISPLAYMOVE: u8 = 0x08; //  Flag for moving the display
pub const LCD_FLAG_MOVERIGHT: u8 = 0x04; //  Flag for moving right

// flags for function set
pub const LCD_FLAG_8BITMODE: u8 = 0x10; //  LCD 8 bit mode
pub const LCD_FLAG_2LINE: u8 = 0x08; //  LCD 2 line mode

// high nibbles of the function set commands, sent while the interface width is still unknown
const INIT_NIBBLE_8BIT: u8 = (LCD_CMD_FUNCTIONSET | LCD_FLAG_8BITMODE) >> 4;
const INIT_NIBBLE_4BIT: u8 = LCD_CMD_FUNCTIONSET >> 4;

// timing lower bounds from the datasheet worst case execution times
const POWER_ON_DELAY_MS: u32 = 50; // > 40 ms after Vcc rises to 2.7V
const FORCE_8BIT_FIRST_DELAY_US: u32 = 5_000; // > 4.1 ms
const FORCE_8BIT_SECOND_DELAY_US: u32 = 150; // > 100 us
const INIT_STEP_DELAY_US: u32 = 1_000;
const DATA_SETTLE_US: u32 = 50; // > 37 us
const CLEAR_HOME_DELAY_US: u32 = 2_000; // > 1.52 ms

const MAX_ROWS: u8 = 4;
const MAX_COLUMNS: u8 = 40;

/// Computes the DDRAM address of (`row`, `column`) on a display with `num_columns` columns.
///
/// Rows 1 and 3 start at `0x40`. Rows 2 and 3 continue rows 0 and 1 after `num_columns`
/// characters, which matches the two-segment addressing of 2 and 4 line modules. The column
/// is only masked to 6 bits, so out of range columns wrap.
pub const fn cursor_address(row: u8, column: u8, num_columns: u8) -> u8 {
    let mut address = column & 0x3F;
    if row & 0x01 != 0 {
        address += 0x40;
    }
    if row & 0x02 != 0 {
        address = address.wrapping_add(num_columns);
    }
    address
}

/// Display geometry and the flag registers last sent to the controller.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ControllerState {
    num_rows: u8,
    num_columns: u8,
    display_control: u8,
    entry_mode: u8,
    backlight_on: bool,
}

impl ControllerState {
    fn new(rows: u8, columns: u8) -> Self {
        Self {
            num_rows: rows.clamp(1, MAX_ROWS),
            num_columns: columns.clamp(1, MAX_COLUMNS),
            display_control: LCD_FLAG_DISPLAYON,
            entry_mode: LCD_FLAG_ENTRYINCREMENT,
            backlight_on: false,
        }
    }

    pub fn num_rows(&self) -> u8 {
        self.num_rows
    }

    pub fn num_columns(&self) -> u8 {
        self.num_columns
    }

    pub fn is_display_on(&self) -> bool {
        self.display_control & LCD_FLAG_DISPLAYON != 0
    }

    pub fn is_cursor_on(&self) -> bool {
        self.display_control & LCD_FLAG_CURSORON != 0
    }

    pub fn is_blink_on(&self) -> bool {
        self.display_control & LCD_FLAG_BLINKON != 0
    }

    /// `true` when the cursor advances left to right after each write.
    pub fn is_increment(&self) -> bool {
        self.entry_mode & LCD_FLAG_ENTRYINCREMENT != 0
    }

    pub fn is_auto_scroll_on(&self) -> bool {
        self.entry_mode & LCD_FLAG_ENTRYSHIFT != 0
    }

    pub fn is_backlight_on(&self) -> bool {
        self.backlight_on
    }

    /// The complete display on/off control command for the current flags
    pub fn display_control_command(&self) -> u8 {
        LCD_CMD_DISPLAYCONTROL | self.display_control
    }

    /// The complete entry mode command for the current flags
    pub fn entry_mode_command(&self) -> u8 {
        LCD_CMD_ENTRYMODESET | self.entry_mode
    }

    fn function_set_command(&self) -> u8 {
        if self.num_rows > 1 {
            LCD_CMD_FUNCTIONSET | LCD_FLAG_2LINE
        } else {
            LCD_CMD_FUNCTIONSET
        }
    }
}

fn set_flag(register: &mut u8, flag: u8, on: bool) {
    if on {
        *register |= flag;
    } else {
        *register &= !flag;
    }
}

/// Protocol driver for one HD44780 controller connected through a 4-bit `BusAdapter`.
///
/// The driver owns the bus adapter and the delay, so each method runs as a critical section
/// with respect to the bus. Any error leaves the display in an unknown state and
/// [`HD44780::initialize`] must be run again before further use.
pub struct HD44780<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    bus: BUS,
    delay: DELAY,
    state: ControllerState,
}

impl<BUS, DELAY> HD44780<BUS, DELAY>
where
    BUS: BusAdapter,
    DELAY: DelayNs,
{
    /// Create a controller driver for a display of the given type. Nothing is sent to the device
    /// until [`HD44780::initialize`] is called.
    pub fn new(bus: BUS, lcd_type: LcdDisplayType, delay: DELAY) -> Self {
        Self {
            bus,
            delay,
            state: ControllerState::new(lcd_type.rows(), lcd_type.cols()),
        }
    }

    /// Give back the bus adapter and the delay. The display keeps its last commanded state.
    pub fn release(self) -> (BUS, DELAY) {
        (self.bus, self.delay)
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn num_rows(&self) -> u8 {
        self.state.num_rows
    }

    pub fn num_columns(&self) -> u8 {
        self.state.num_columns
    }

    /// Backlight writes must go through [`HD44780::set_backlight`] so the state stays in sync.
    pub(crate) fn bus(&mut self) -> &mut BUS {
        &mut self.bus
    }

    pub fn delay(&mut self) -> &mut DELAY {
        &mut self.delay
    }

    /// Runs the power-on initialization sequence for 4-bit operation. The busy flag cannot be read
    /// while the interface width is unknown, so every step waits for the worst case execution time.
    /// Must complete before any other operation is issued. On error the controller state is undefined
    /// and the whole sequence has to be repeated.
    pub fn initialize(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Initializing HD44780 {}x{}",
            self.state.num_columns,
            self.state.num_rows
        );
        self.state = ControllerState::new(self.state.num_rows, self.state.num_columns);

        self.delay.delay_ms(POWER_ON_DELAY_MS);

        // force 8-bit mode three times, whatever mode the controller is in
        self.write_init_nibble(INIT_NIBBLE_8BIT, FORCE_8BIT_FIRST_DELAY_US)?;
        self.write_init_nibble(INIT_NIBBLE_8BIT, FORCE_8BIT_SECOND_DELAY_US)?;
        self.write_init_nibble(INIT_NIBBLE_8BIT, INIT_STEP_DELAY_US)?;
        // switch to 4-bit mode
        self.write_init_nibble(INIT_NIBBLE_4BIT, INIT_STEP_DELAY_US)?;

        self.send_command(
            self.state.function_set_command(),
            INIT_STEP_DELAY_US.max(BUS::COMMAND_SETTLE_US),
        )?;
        self.write_command(self.state.display_control_command())?;
        self.clear()?;
        self.write_command(self.state.entry_mode_command())?;

        #[cfg(feature = "defmt")]
        defmt::debug!("HD44780 ready");
        Ok(())
    }

    fn write_init_nibble(
        &mut self,
        nibble: u8,
        delay_us: u32,
    ) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.bus
            .write_nibble(false, nibble)
            .map_err(CharacterDisplayError::BusError)?;
        self.delay.delay_us(delay_us);
        Ok(())
    }

    fn send_command(
        &mut self,
        command: u8,
        settle_us: u32,
    ) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.bus
            .write_byte(false, command)
            .map_err(CharacterDisplayError::BusError)?;
        self.delay.delay_us(settle_us);
        Ok(())
    }

    /// Sends a command byte to the instruction register (RS=0).
    pub fn write_command(&mut self, command: u8) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.send_command(command, BUS::COMMAND_SETTLE_US)
    }

    /// Sends a data byte to the data register (RS=1), DDRAM or CGRAM depending on the last address set.
    pub fn write_data(&mut self, data: u8) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.bus
            .write_byte(true, data)
            .map_err(CharacterDisplayError::BusError)?;
        self.delay.delay_us(DATA_SETTLE_US);
        Ok(())
    }

    /// Clears the display and returns the cursor to the top left. Clear Display alone does not
    /// reset the cursor on every controller revision, so Return Home always follows it.
    pub fn clear(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.send_command(LCD_CMD_CLEARDISPLAY, self.clear_home_settle_us())?;
        self.home()
    }

    /// Returns the cursor to the top left and undoes any display shift.
    pub fn home(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.send_command(LCD_CMD_RETURNHOME, self.clear_home_settle_us())
    }

    fn clear_home_settle_us(&self) -> u32 {
        CLEAR_HOME_DELAY_US.max(BUS::COMMAND_SETTLE_US)
    }

    /// Set the cursor position. Rows and columns are zero-indexed. The column is masked to the
    /// 6-bit DDRAM column range, so columns past the visible width address off-screen memory.
    pub fn set_cursor(
        &mut self,
        row: u8,
        column: u8,
    ) -> Result<(), CharacterDisplayError<BUS::Error>> {
        if row >= self.state.num_rows {
            #[cfg(feature = "defmt")]
            defmt::warn!("Row {} is out of range", row);
            return Err(CharacterDisplayError::RowOutOfRange);
        }
        let address = cursor_address(row, column, self.state.num_columns);
        self.write_command(LCD_CMD_SETDDRAMADDR | address)
    }

    /// Writes one character at the cursor. Characters outside U+0000..=U+00FF are written as `?`.
    pub fn write_char(&mut self, c: char) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.write_data(u8::try_from(c).unwrap_or(b'?'))
    }

    /// Writes exactly `num_columns` characters from the cursor: longer text is truncated and shorter
    /// text is padded with spaces, so a line write always overwrites the whole row.
    pub fn write_string(&mut self, text: &str) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.write_chars(text.chars())
    }

    /// Same as [`HD44780::write_string`] for any source of characters.
    pub fn write_chars<I>(&mut self, chars: I) -> Result<(), CharacterDisplayError<BUS::Error>>
    where
        I: IntoIterator<Item = char>,
    {
        let mut chars = chars.into_iter();
        for _ in 0..self.state.num_columns {
            self.write_char(chars.next().unwrap_or(' '))?;
        }
        Ok(())
    }

    /// Prints text at the cursor without padding or truncation.
    pub fn print(&mut self, text: &str) -> Result<(), CharacterDisplayError<BUS::Error>> {
        #[cfg(feature = "defmt")]
        defmt::debug!("Printing: {}", text);
        for c in text.chars() {
            self.write_char(c)?;
        }
        Ok(())
    }

    fn update_display_control(
        &mut self,
        flag: u8,
        on: bool,
    ) -> Result<(), CharacterDisplayError<BUS::Error>> {
        set_flag(&mut self.state.display_control, flag, on);
        self.write_command(self.state.display_control_command())
    }

    fn update_entry_mode(
        &mut self,
        flag: u8,
        on: bool,
    ) -> Result<(), CharacterDisplayError<BUS::Error>> {
        set_flag(&mut self.state.entry_mode, flag, on);
        self.write_command(self.state.entry_mode_command())
    }

    /// Turn on (unblank) the display.
    pub fn display_on(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_DISPLAYON, true)
    }

    /// Turn off (blank) the display. DDRAM contents are kept.
    pub fn display_off(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_DISPLAYON, false)
    }

    pub fn cursor_on(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_CURSORON, true)
    }

    pub fn cursor_off(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_CURSORON, false)
    }

    pub fn blink_on(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_BLINKON, true)
    }

    pub fn blink_off(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_display_control(LCD_FLAG_BLINKON, false)
    }

    /// Shift the display on every character written.
    pub fn auto_scroll_on(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_entry_mode(LCD_FLAG_ENTRYSHIFT, true)
    }

    pub fn auto_scroll_off(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_entry_mode(LCD_FLAG_ENTRYSHIFT, false)
    }

    /// Set the text flow direction to left to right.
    pub fn left_to_right(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_entry_mode(LCD_FLAG_ENTRYINCREMENT, true)
    }

    /// Set the text flow direction to right to left.
    pub fn right_to_left(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.update_entry_mode(LCD_FLAG_ENTRYINCREMENT, false)
    }

    /// Shift the display contents one position left without changing DDRAM.
    pub fn move_left(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.write_command(LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE)
    }

    /// Shift the display contents one position right without changing DDRAM.
    pub fn move_right(&mut self) -> Result<(), CharacterDisplayError<BUS::Error>> {
        self.write_command(LCD_CMD_CURSORSHIFT | LCD_FLAG_DISPLAYMOVE | LCD_FLAG_MOVERIGHT)
    }
}

impl<BUS, DELAY> HD44780<BUS, DELAY>
where
    BUS: BusAdapter + BacklightControl<Error = <BUS as BusAdapter>::Error>,
    DELAY: DelayNs,
{
    /// Turn the backlight on or off. The controller is not pulsed, so display state is untouched.
    pub fn set_backlight(
        &mut self,
        on: bool,
    ) -> Result<(), CharacterDisplayError<<BUS as BusAdapter>::Error>> {
        self.state.backlight_on = on;
        self.bus
            .set_backlight(on)
            .map_err(CharacterDisplayError::BusError)
    }

    pub fn backlight_on(
        &mut self,
    ) -> Result<(), CharacterDisplayError<<BUS as BusAdapter>::Error>> {
        self.set_backlight(true)
    }

    pub fn backlight_off(
        &mut self,
    ) -> Result<(), CharacterDisplayError<<BUS as BusAdapter>::Error>> {
        self.set_backlight(false)
    }
}
