use crate::time::Instant;

/// Driver settings the host controls through the PIB. The MAC doesn't interpret them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct DriverOptions {
    /// vsCRCOverride
    pub crc_override: u16,
    /// vsDeviceType
    pub device_type: u8,
}

/// The transceiver the MAC drives.
///
/// All calls are made from the MAC's main context. Received frames do not go
/// through this trait: the driver pushes them into the
/// [`RxQueue`](crate::rx_queue::RxQueue) from its receive-complete interrupt.
pub trait Radio {
    #[cfg(not(feature = "defmt-03"))]
    type Error: core::error::Error;
    #[cfg(feature = "defmt-03")]
    type Error: core::error::Error + defmt::Format;

    /// Reset the transceiver to its power-on state with the receiver off.
    fn reset(&mut self) -> Result<(), Self::Error>;

    /// The current value of the symbol clock.
    fn now(&self) -> Instant;

    /// Send a frame right away, without any carrier sensing.
    ///
    /// The `data` is a MAC frame without FCS; the radio appends it.
    /// The receiver state from before the transmission is restored afterwards.
    ///
    /// Returns the time at which the frame went out.
    fn transmit(&mut self, data: &[u8]) -> Result<Instant, Self::Error>;

    /// Perform a clear channel assessment. Returns true when the channel is idle.
    fn clear_channel(&mut self) -> Result<bool, Self::Error>;

    /// Sample the energy on the current channel, scaled to 0..=255.
    fn energy_detect(&mut self) -> Result<u8, Self::Error>;

    /// Turn the receiver on or off. Calling this with the current state is a no-op.
    fn set_receiver(&mut self, enabled: bool) -> Result<(), Self::Error>;

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error>;

    /// Set the transmit power in dBm.
    fn set_tx_power(&mut self, dbm: i8) -> Result<(), Self::Error>;

    fn set_driver_options(&mut self, options: DriverOptions) -> Result<(), Self::Error>;
}
