pub mod hd44780;

/// The state of every control and data line for one physical write to the HD44780 4-bit bus.
/// A `NibbleTransfer` is built per write and consumed by the adapter; it is never stored.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct NibbleTransfer {
    /// Enable (E) line. The controller latches the other lines on its falling edge.
    pub enable: bool,
    /// Register select (RS). `false` selects the instruction register, `true` the data register.
    pub register_select: bool,
    /// Read/write (R/W). Always `false`, this driver never reads from the controller.
    pub read_write: bool,
    /// The 4 data bits presented on D4-D7.
    pub data: u8,
}

impl NibbleTransfer {
    /// Build a write transfer with Enable deasserted. Only the low 4 bits of `nibble` are used.
    pub const fn new(register_select: bool, nibble: u8) -> Self {
        Self {
            enable: false,
            register_select,
            read_write: false,
            data: nibble & 0x0F,
        }
    }

    /// Same line state with the Enable line set to `enable`.
    pub const fn with_enable(self, enable: bool) -> Self {
        Self { enable, ..self }
    }
}

/// Trait for the physical side of the HD44780 4-bit interface. An adapter turns a logical
/// `NibbleTransfer` into pin levels, either directly on GPIO pins or multiplexed onto an
/// I2C GPIO expander.
pub trait BusAdapter {
    /// Error reported by the underlying transport
    type Error: core::fmt::Debug;

    /// Microseconds to wait after a command byte before the next transfer.
    const COMMAND_SETTLE_US: u32;

    /// Perform a single physical write of the line state. No retry is attempted on failure.
    fn transfer(&mut self, transfer: NibbleTransfer) -> Result<(), Self::Error>;

    /// Writes the low nibble of `nibble` to the controller. The line state is sent twice, first with
    /// Enable asserted and then with Enable deasserted, so the controller latches the nibble on the
    /// falling edge. RS, R/W and the data lines are identical in both writes.
    fn write_nibble(&mut self, register_select: bool, nibble: u8) -> Result<(), Self::Error> {
        let transfer = NibbleTransfer::new(register_select, nibble);
        self.transfer(transfer.with_enable(true))?;
        self.transfer(transfer.with_enable(false))
    }

    /// Writes a full byte, high nibble first. If `register_select` is `true` the byte goes to the data
    /// register (DDRAM or CGRAM depending on the last address command), otherwise to the instruction register.
    fn write_byte(&mut self, register_select: bool, value: u8) -> Result<(), Self::Error> {
        self.write_nibble(register_select, value >> 4)?;
        self.write_nibble(register_select, value & 0x0F)
    }
}

/// Backlight control, independent of the controller's display state.
pub trait BacklightControl {
    type Error: core::fmt::Debug;

    /// Sets the backlight on or off without pulsing the controller's Enable line.
    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error>;

    fn backlight_on(&mut self) -> Result<(), Self::Error> {
        self.set_backlight(true)
    }

    fn backlight_off(&mut self) -> Result<(), Self::Error> {
        self.set_backlight(false)
    }
}
