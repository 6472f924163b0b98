use embedded_hal::{
    delay::DelayNs,
    digital::{OutputPin, PinState},
};

use crate::driver::{BacklightControl, BusAdapter, NibbleTransfer};

// E must stay high for at least 450 ns, with 10 ns data hold after the falling edge
const ENABLE_PULSE_US: u32 = 1;

/// Adapter for an HD44780 wired directly to GPIO pins in 4-bit mode: RS, RW, E and D4-D7.
///
/// All pins share one type, which is what HALs provide through their type-erased pins. A
/// backlight pin is optional; without one the backlight commands do nothing.
pub struct ParallelAdapter<PIN, DELAY>
where
    PIN: OutputPin,
    DELAY: DelayNs,
{
    rs: PIN,
    rw: PIN,
    enable: PIN,
    data: [PIN; 4],
    backlight: Option<PIN>,
    delay: DELAY,
}

impl<PIN, DELAY> ParallelAdapter<PIN, DELAY>
where
    PIN: OutputPin,
    DELAY: DelayNs,
{
    /// The delay times the Enable pulse. It can be a clone of the delay given to the display.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rs: PIN,
        rw: PIN,
        enable: PIN,
        d4: PIN,
        d5: PIN,
        d6: PIN,
        d7: PIN,
        delay: DELAY,
    ) -> Self {
        Self {
            rs,
            rw,
            enable,
            data: [d4, d5, d6, d7],
            backlight: None,
            delay,
        }
    }

    /// Use `backlight` as the backlight switch. The pin is driven high to turn the backlight on.
    pub fn with_backlight(mut self, backlight: PIN) -> Self {
        self.backlight = Some(backlight);
        self
    }
}

impl<PIN, DELAY> BusAdapter for ParallelAdapter<PIN, DELAY>
where
    PIN: OutputPin,
    DELAY: DelayNs,
{
    type Error = PIN::Error;

    const COMMAND_SETTLE_US: u32 = 50;

    fn transfer(&mut self, transfer: NibbleTransfer) -> Result<(), Self::Error> {
        // set up RS, RW and data before E moves
        self.rs.set_state(PinState::from(transfer.register_select))?;
        self.rw.set_state(PinState::from(transfer.read_write))?;
        for (bit, pin) in self.data.iter_mut().enumerate() {
            pin.set_state(PinState::from(transfer.data & (1 << bit) != 0))?;
        }
        self.enable.set_state(PinState::from(transfer.enable))?;
        self.delay.delay_us(ENABLE_PULSE_US);
        Ok(())
    }
}

impl<PIN, DELAY> BacklightControl for ParallelAdapter<PIN, DELAY>
where
    PIN: OutputPin,
    DELAY: DelayNs,
{
    type Error = PIN::Error;

    fn set_backlight(&mut self, on: bool) -> Result<(), Self::Error> {
        match self.backlight.as_mut() {
            Some(pin) => pin.set_state(PinState::from(on)),
            None => {
                #[cfg(feature = "defmt")]
                defmt::warn!("No backlight pin configured");
                Ok(())
            }
        }
    }
}
