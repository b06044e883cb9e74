use crate::{
    pib::PhyPib,
    radio::{DriverOptions, Radio},
    time::Instant,
};

/// The radio together with the PHY attributes the MAC keeps for it.
///
/// Attribute changes are pushed to the radio lazily: only what differs from
/// the last applied state is written.
pub struct Phy<R: Radio> {
    radio: R,
    pib: PhyPib,
    applied_channel: Option<u8>,
    applied_tx_power: Option<i8>,
    applied_driver_options: Option<DriverOptions>,
    receiver_on: bool,
}

impl<R: Radio> Phy<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            pib: PhyPib::default(),
            applied_channel: None,
            applied_tx_power: None,
            applied_driver_options: None,
            receiver_on: false,
        }
    }

    pub fn into_radio(self) -> R {
        self.radio
    }

    pub fn now(&self) -> Instant {
        self.radio.now()
    }

    pub fn pib(&self) -> &PhyPib {
        &self.pib
    }

    /// Changes made through this reference reach the radio on the next [`Self::sync`].
    pub fn pib_mut(&mut self) -> &mut PhyPib {
        &mut self.pib
    }

    /// Change the PHY attributes and apply them to the radio right away.
    pub fn update_phy_pib<T>(&mut self, f: impl FnOnce(&mut PhyPib) -> T) -> Result<T, R::Error> {
        let value = f(&mut self.pib);
        self.apply_pib()?;
        Ok(value)
    }

    fn apply_pib(&mut self) -> Result<(), R::Error> {
        if self.applied_channel != Some(self.pib.current_channel) {
            trace!("Switching to channel {}", self.pib.current_channel);
            self.radio.set_channel(self.pib.current_channel)?;
            self.applied_channel = Some(self.pib.current_channel);
        }

        if self.applied_tx_power != Some(self.pib.tx_power) {
            self.radio.set_tx_power(self.pib.tx_power)?;
            self.applied_tx_power = Some(self.pib.tx_power);
        }

        Ok(())
    }

    /// Bring the radio in line with the PIB and the wanted receiver state.
    pub fn sync(&mut self, receiver_wanted: bool) -> Result<(), R::Error> {
        self.apply_pib()?;

        if self.receiver_on != receiver_wanted {
            trace!("Receiver {}", if receiver_wanted { "on" } else { "off" });
            self.radio.set_receiver(receiver_wanted)?;
            self.receiver_on = receiver_wanted;
        }

        Ok(())
    }

    /// Hand the driver options to the radio if they changed.
    pub fn set_driver_options(&mut self, options: DriverOptions) -> Result<(), R::Error> {
        if self.applied_driver_options != Some(options) {
            debug!("Driver options: {:?}", options);
            self.radio.set_driver_options(options)?;
            self.applied_driver_options = Some(options);
        }

        Ok(())
    }

    pub fn receiver_on(&self) -> bool {
        self.receiver_on
    }

    /// Reset the radio and put the PHY attributes back to their defaults.
    pub fn reset(&mut self) -> Result<(), R::Error> {
        self.pib = PhyPib::default();
        self.applied_channel = None;
        self.applied_tx_power = None;
        self.applied_driver_options = None;
        self.receiver_on = false;

        self.radio.reset()?;
        self.apply_pib()
    }

    /// Send a frame without carrier sensing.
    pub fn transmit(&mut self, data: &[u8]) -> Result<Instant, R::Error> {
        self.apply_pib()?;
        self.radio.transmit(data)
    }

    pub fn clear_channel(&mut self) -> Result<bool, R::Error> {
        self.apply_pib()?;
        self.radio.clear_channel()
    }

    pub fn energy_detect(&mut self) -> Result<u8, R::Error> {
        self.apply_pib()?;
        self.radio.energy_detect()
    }
}
