//! Bus adapters connecting the HD44780 4-bit interface to the host. Each adapter implements
//! [`BusAdapter`](crate::driver::BusAdapter) and, where the hardware can switch it,
//! [`BacklightControl`](crate::driver::BacklightControl).
pub mod generic_pcf8574t;
pub mod parallel;
