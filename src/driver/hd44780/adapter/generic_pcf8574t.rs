use bitfield::bitfield;
use embedded_hal::i2c;

use crate::driver::{BacklightControl, BusAdapter, NibbleTransfer};

// Pinout of the common PCF8574T backpack: control lines on P0-P3, display D4-D7 on P4-P7
bitfield! {
    #[derive(Clone, Copy, PartialEq)]
    pub struct GenericPCF8574TBitField(u8);
    impl Debug;
    pub rs, set_rs: 0, 0;
    pub rw, set_rw: 1, 1;
    pub enable, set_enable: 2, 2;
    pub backlight, set_backlight: 3, 3;
    pub data, set_data: 7, 4;
}

/// Adapter based on the PCF8574T I2C GPIO expander interfacing with the HD44780 LCD controller
/// via a 4-bit interface. The last register value written is cached so that controller writes
/// and backlight writes never disturb each other's bits.
pub struct GenericPCF8574TAdapter<I2C>
where
    I2C: i2c::I2c,
{
    i2c: I2C,
    address: u8,
    bits: GenericPCF8574TBitField,
}

impl<I2C> GenericPCF8574TAdapter<I2C>
where
    I2C: i2c::I2c,
{
    /// Create an adapter on the default I2C address.
    pub fn new(i2c: I2C) -> Self {
        Self::new_with_address(i2c, Self::default_i2c_address())
    }

    pub fn new_with_address(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            bits: GenericPCF8574TBitField(0),
        }
    }

    /// returns the default I2C address for the adapter
    pub const fn default_i2c_address() -> u8 {
        0x27
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Returns the cached expander register value
    pub fn bits(&self) -> u8 {
        self.bits.0
    }

    /// returns the i2c object. mostly used for testing
    pub fn i2c(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_bits_to_gpio(&mut self) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[self.bits.0])
    }
}

impl<I2C> BusAdapter for GenericPCF8574TAdapter<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    // every expander write is a full I2C transaction, commands get a generous settle time
    const COMMAND_SETTLE_US: u32 = 2_000;

    fn transfer(&mut self, transfer: NibbleTransfer) -> Result<(), Self::Error> {
        self.bits.set_rs(transfer.register_select as u8);
        self.bits.set_rw(transfer.read_write as u8);
        self.bits.set_enable(transfer.enable as u8);
        self.bits.set_data(transfer.data);
        self.write_bits_to_gpio()
    }
}

impl<I2C> BacklightControl for GenericPCF8574TAdapter<I2C>
where
    I2C: i2c::I2c,
{
    type Error = I2C::Error;

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        self.bits.set_backlight(on as u8);
        self.bits.set_enable(0);
        self.write_bits_to_gpio()
    }
}
