use arrayvec::ArrayVec;
use byte::{BytesExt, LE};
use rand_core::RngCore;

use crate::{
    consts::{
        self, MAX_BEACON_PAYLOAD_LENGTH, MAX_FRAME_DURATION, MAX_TX_POWER, MIN_TX_POWER,
        SHR_DURATION, SYMBOLS_PER_OCTET, TURNAROUND_TIME, UNIT_BACKOFF_PERIOD,
    },
    sap::Status,
    time::Duration,
    wire::{Address, ExtendedAddress, PanId, ShortAddress},
};

/// Largest encoded attribute value: the beacon payload.
pub const MAX_PIB_VALUE_LEN: usize = MAX_BEACON_PAYLOAD_LENGTH;

/// The encoded bytes of a single attribute value.
pub type PibBytes = ArrayVec<u8, MAX_PIB_VALUE_LEN>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct PhyPib {
    /// The RF channel to use for all following transmissions and receptions.
    #[doc(alias = "phyCurrentChannel")]
    pub current_channel: u8,
    /// The transmit power of the device in dBm.
    #[doc(alias = "phyTransmitPower")]
    pub tx_power: i8,
}

impl Default for PhyPib {
    fn default() -> Self {
        Self {
            current_channel: consts::MIN_CHANNEL,
            tx_power: 0,
        }
    }
}

impl PhyPib {
    pub fn get(&self, attribute: PibAttribute) -> Option<PibValue> {
        match attribute {
            PibAttribute::PhyCurrentChannel => Some(PibValue::PhyCurrentChannel(self.current_channel)),
            PibAttribute::PhyTransmitPower => Some(PibValue::PhyTransmitPower(self.tx_power)),
            _ => None,
        }
    }

    /// Returns `None` if the attribute isn't a PHY attribute.
    pub fn try_set(&mut self, attribute: PibAttribute, value: &PibValue) -> Option<Status> {
        let result = match (attribute, value) {
            (PibAttribute::PhyCurrentChannel, PibValue::PhyCurrentChannel(channel))
                if consts::channel_supported(*channel) =>
            {
                self.current_channel = *channel;
                Status::Success
            }
            (PibAttribute::PhyTransmitPower, PibValue::PhyTransmitPower(power))
                if (MIN_TX_POWER..=MAX_TX_POWER).contains(power) =>
            {
                self.tx_power = *power;
                Status::Success
            }
            (PibAttribute::PhyCurrentChannel | PibAttribute::PhyTransmitPower, _) => {
                Status::InvalidParameter
            }
            _ => return None,
        };

        Some(result)
    }
}

#[derive(Debug, Clone)]
pub struct MacPib {
    pub pib_write: MacPibWrite,

    /// The extended address assigned to the device.
    ///
    /// Only changed through [`Mac154::set_ext_addr`](crate::mac::Mac154::set_ext_addr).
    #[doc(alias = "macExtendedAddress")]
    pub extended_address: ExtendedAddress,
    /// The sequence number added to the transmitted beacon frame.
    #[doc(alias = "macBSN")]
    pub bsn: SequenceNumber,
    /// The sequence number added to the transmitted data or MAC command frame.
    #[doc(alias = "macDSN")]
    pub dsn: SequenceNumber,
}

impl MacPib {
    pub fn new(extended_address: ExtendedAddress, rng: &mut impl RngCore) -> Self {
        Self {
            pib_write: MacPibWrite::default(),
            extended_address,
            bsn: SequenceNumber::new(rng.next_u32() as u8),
            dsn: SequenceNumber::new(rng.next_u32() as u8),
        }
    }

    /// Put every attribute back to its default, except the extended address.
    pub fn reset(&mut self, rng: &mut impl RngCore) {
        *self = Self::new(self.extended_address, rng);
    }

    pub fn get(&self, attribute: PibAttribute) -> Option<PibValue> {
        let value = match attribute {
            PibAttribute::MacBsn => PibValue::MacBsn(self.bsn.value()),
            PibAttribute::MacDsn => PibValue::MacDsn(self.dsn.value()),
            PibAttribute::VsExtendedAddress => PibValue::VsExtendedAddress(self.extended_address),
            attribute => return self.pib_write.get(attribute),
        };

        Some(value)
    }

    /// The maximum number of symbols to wait for an acknowledgment frame to arrive following a transmitted data frame.
    #[doc(alias = "macAckWaitDuration")]
    pub fn ack_wait_duration(&self) -> Duration {
        Duration::from_symbols(self.ack_wait_duration as u64)
    }

    /// The maximum time to wait for a frame intended as a response to a data request frame.
    #[doc(alias = "macMaxFrameTotalWaitTime")]
    pub fn max_frame_total_wait_time(&self) -> Duration {
        Duration::from_symbols(self.max_frame_total_wait_time as u64)
    }

    /// The maximum time to wait for a response command frame after a request command.
    #[doc(alias = "macResponseWaitTime")]
    pub fn response_wait_time(&self) -> Duration {
        Duration::from_base_superframes(self.response_wait_time as u64)
    }

    /// The maximum time a transaction is stored by a coordinator.
    #[doc(alias = "macTransactionPersistenceTime")]
    pub fn transaction_persistence_time(&self) -> Duration {
        Duration::from_base_superframes(self.transaction_persistence_time as u64)
    }

    /// Forget everything that ties this device to its coordinator.
    pub fn clear_association(&mut self) {
        self.pan_id = PanId::broadcast();
        self.short_address = ShortAddress::BROADCAST;
        self.coord_short_address = ShortAddress::BROADCAST;
        self.coord_extended_address = ExtendedAddress(0);
        self.associated_pan_coord = false;
    }

    /// Is this the address of the coordinator we're associated with?
    pub fn is_coordinator_address(&self, address: Address) -> bool {
        match address {
            Address::Short(pan_id, short_address) => {
                pan_id == self.pan_id
                    && short_address == self.coord_short_address
                    && short_address.0 < 0xFFFE
            }
            Address::Extended(pan_id, extended_address) => {
                pan_id == self.pan_id
                    && extended_address == self.coord_extended_address
                    && extended_address.0 != 0
            }
        }
    }

    /// Has a coordinator handed this device a short address it can use as source?
    pub fn has_usable_short_address(&self) -> bool {
        self.short_address.0 < 0xFFFE
    }
}

impl core::ops::DerefMut for MacPib {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.pib_write
    }
}

impl core::ops::Deref for MacPib {
    type Target = MacPibWrite;

    fn deref(&self) -> &Self::Target {
        &self.pib_write
    }
}

#[derive(Debug, Clone)]
pub struct MacPibWrite {
    /// The maximum number of symbols to wait for an acknowledgment.
    ///
    /// ## Range
    /// 1-255
    #[doc(alias = "macAckWaitDuration")]
    pub ack_wait_duration: u8,
    /// Indication of whether the device is associated to the PAN through the PAN coordinator.
    #[doc(alias = "macAssociatedPANCoord")]
    pub associated_pan_coord: bool,
    /// Indication of whether a coordinator is currently allowing association.
    #[doc(alias = "macAssociationPermit")]
    pub association_permit: bool,
    /// Indication of whether a device automatically sends a data request command if its address is listed in
    /// the beacon frame. Also decides whether beacons found by a scan are collected in the confirm
    /// (TRUE) or reported one by one with beacon notify indications (FALSE).
    #[doc(alias = "macAutoRequest")]
    pub auto_request: bool,
    /// The contents of the beacon payload.
    #[doc(alias = "macBeaconPayload")]
    pub beacon_payload: [u8; MAX_BEACON_PAYLOAD_LENGTH],
    /// The length, in octets, of the beacon payload.
    ///
    /// ## Range
    /// 0 – aMaxBeaconPayloadLength
    #[doc(alias = "macBeaconPayloadLength")]
    pub beacon_payload_length: u8,
    /// The address of the coordinator through which the device is associated.
    #[doc(alias = "macCoordExtendedAddress")]
    pub coord_extended_address: ExtendedAddress,
    /// The short address assigned to the coordinator through which the device is associated.
    /// A value of 0xfffe indicates that the coordinator is only using its extended address.
    /// A value of 0xffff indicates that this value is unknown.
    #[doc(alias = "macCoordShortAddress")]
    pub coord_short_address: ShortAddress,
    /// The maximum number of backoffs the CSMA-CA algorithm will attempt before declaring a channel access failure.
    ///
    /// ## Range
    /// 0-5
    #[doc(alias = "macMaxCSMABackoffs")]
    pub max_csma_backoffs: u8,
    /// The minimum value of the backoff exponent (BE) in the CSMA-CA algorithm.
    ///
    /// ## Range
    /// 0 – macMaxBE
    #[doc(alias = "macMinBE")]
    pub min_be: u8,
    /// The identifier of the PAN on which the device is operating. If this value is 0xffff, the device is not
    /// associated.
    #[doc(alias = "macPANId")]
    pub pan_id: PanId,
    /// Indication of whether the MAC sublayer is in a promiscuous (receive all) mode.
    #[doc(alias = "macPromiscuousMode")]
    pub promiscuous_mode: bool,
    /// Indication of whether the MAC sublayer is to enable its receiver during idle periods.
    #[doc(alias = "macRxOnWhenIdle")]
    pub rx_on_when_idle: bool,
    /// The address that the device uses to communicate in the PAN. 0xfffe means only the extended
    /// address is used, 0xffff means the device has no short address.
    #[doc(alias = "macShortAddress")]
    pub short_address: ShortAddress,
    /// The maximum time (in unit periods) that a transaction is stored by a coordinator and indicated in its
    /// beacon. The unit period is aBaseSuperframeDuration.
    #[doc(alias = "macTransactionPersistenceTime")]
    pub transaction_persistence_time: u16,
    /// The maximum value of the backoff exponent, BE, in the CSMA-CA algorithm.
    ///
    /// ## Range
    /// macMinBE - 8
    #[doc(alias = "macMaxBE")]
    pub max_be: u8,
    /// The maximum time in symbols to wait for a frame following a data request or a frame pending
    /// acknowledgment. Also bounds the total time a single direct transmission may take.
    ///
    /// The bound is checked between attempts. The default covers one worst case CSMA-CA attempt,
    /// so on a busy channel a retried transmission usually ends with `TRANSACTION_EXPIRED` after
    /// its first attempt instead of `CHANNEL_ACCESS_FAILURE` after the last.
    #[doc(alias = "macMaxFrameTotalWaitTime")]
    pub max_frame_total_wait_time: u16,
    /// The maximum number of retries allowed after a transmission failure.
    ///
    /// ## Range
    /// 0-7
    #[doc(alias = "macMaxFrameRetries")]
    pub max_frame_retries: u8,
    /// The maximum time, in multiples of aBaseSuperframeDuration, a device shall wait for a response
    /// command frame to be available following a request command frame.
    ///
    /// ## Range
    /// 2-64
    #[doc(alias = "macResponseWaitTime")]
    pub response_wait_time: u32,
    /// Stored for the host. Frames are always sent unsecured.
    #[doc(alias = "macSecurityEnabled")]
    pub security_enabled: bool,

    /// Replaces the frame control field of outgoing data frames when nonzero.
    #[doc(alias = "vsFctlOverride")]
    pub fctl_override: u16,
    /// Handed to the radio driver as is, see [`DriverOptions`](crate::radio::DriverOptions).
    #[doc(alias = "vsCRCOverride")]
    pub crc_override: u16,
    /// Received frames only go to the raw frame handler.
    #[doc(alias = "vsRawRx")]
    pub raw_rx: bool,
    /// Handed to the radio driver as is.
    #[doc(alias = "deviceType")]
    pub device_type: u8,
    /// Transmit without clear channel assessment.
    #[doc(alias = "disableCCA")]
    pub disable_cca: bool,
}

impl Default for MacPibWrite {
    fn default() -> Self {
        let min_be = 3;
        let max_be = 5;
        let max_csma_backoffs = 4;

        Self {
            ack_wait_duration: default_ack_wait_duration(),
            associated_pan_coord: false,
            association_permit: false,
            auto_request: true,
            beacon_payload: [0; MAX_BEACON_PAYLOAD_LENGTH],
            beacon_payload_length: 0,
            coord_extended_address: ExtendedAddress(0),
            coord_short_address: ShortAddress::BROADCAST,
            max_csma_backoffs,
            min_be,
            pan_id: PanId::broadcast(),
            promiscuous_mode: false,
            rx_on_when_idle: false,
            short_address: ShortAddress::BROADCAST,
            transaction_persistence_time: 0x01F4,
            max_be,
            max_frame_total_wait_time: default_max_frame_total_wait_time(
                min_be,
                max_be,
                max_csma_backoffs,
            ),
            max_frame_retries: 3,
            response_wait_time: 32,
            security_enabled: false,
            fctl_override: 0,
            crc_override: 0,
            raw_rx: false,
            device_type: 0,
            disable_cca: false,
        }
    }
}

impl MacPibWrite {
    pub fn beacon_payload(&self) -> &[u8] {
        &self.beacon_payload[..self.beacon_payload_length as usize]
    }

    #[rustfmt::skip]
    fn get(&self, attribute: PibAttribute) -> Option<PibValue> {
        let value = match attribute {
            PibAttribute::MacAckWaitDuration => PibValue::MacAckWaitDuration(self.ack_wait_duration),
            PibAttribute::MacAssociatedPanCoord => PibValue::MacAssociatedPanCoord(self.associated_pan_coord),
            PibAttribute::MacAssociationPermit => PibValue::MacAssociationPermit(self.association_permit),
            PibAttribute::MacAutoRequest => PibValue::MacAutoRequest(self.auto_request),
            PibAttribute::MacBeaconPayload => PibValue::MacBeaconPayload(self.beacon_payload().iter().copied().collect()),
            PibAttribute::MacBeaconPayloadLength => PibValue::MacBeaconPayloadLength(self.beacon_payload_length),
            PibAttribute::MacCoordExtendedAddress => PibValue::MacCoordExtendedAddress(self.coord_extended_address),
            PibAttribute::MacCoordShortAddress => PibValue::MacCoordShortAddress(self.coord_short_address),
            PibAttribute::MacMaxCsmaBackoffs => PibValue::MacMaxCsmaBackoffs(self.max_csma_backoffs),
            PibAttribute::MacMinBe => PibValue::MacMinBe(self.min_be),
            PibAttribute::MacPanId => PibValue::MacPanId(self.pan_id),
            PibAttribute::MacPromiscuousMode => PibValue::MacPromiscuousMode(self.promiscuous_mode),
            PibAttribute::MacRxOnWhenIdle => PibValue::MacRxOnWhenIdle(self.rx_on_when_idle),
            PibAttribute::MacShortAddress => PibValue::MacShortAddress(self.short_address),
            PibAttribute::MacTransactionPersistenceTime => PibValue::MacTransactionPersistenceTime(self.transaction_persistence_time),
            PibAttribute::MacMaxBe => PibValue::MacMaxBe(self.max_be),
            PibAttribute::MacMaxFrameTotalWaitTime => PibValue::MacMaxFrameTotalWaitTime(self.max_frame_total_wait_time),
            PibAttribute::MacMaxFrameRetries => PibValue::MacMaxFrameRetries(self.max_frame_retries),
            PibAttribute::MacResponseWaitTime => PibValue::MacResponseWaitTime(self.response_wait_time),
            PibAttribute::MacSecurityEnabled => PibValue::MacSecurityEnabled(self.security_enabled),
            PibAttribute::VsCrcOverride => PibValue::VsCrcOverride(self.crc_override),
            PibAttribute::VsFctlOverride => PibValue::VsFctlOverride(self.fctl_override),
            PibAttribute::VsRawRx => PibValue::VsRawRx(self.raw_rx),
            PibAttribute::VsDeviceType => PibValue::VsDeviceType(self.device_type),
            PibAttribute::VsDisableCca => PibValue::VsDisableCca(self.disable_cca),
            _ => return None,
        };

        Some(value)
    }

    /// Returns `None` if the attribute isn't a MAC attribute.
    #[rustfmt::skip]
    pub fn try_set(&mut self, attribute: PibAttribute, value: &PibValue) -> Option<Status> {
        if attribute.is_phy() {
            return None;
        }

        let result = match (attribute, value) {
            (PibAttribute::MacBsn, _) => Status::ReadOnly,
            (PibAttribute::MacDsn, _) => Status::ReadOnly,
            (PibAttribute::VsExtendedAddress, _) => Status::ReadOnly,

            (attribute, value) if value.attribute() == attribute => self.set(value),

            _ => Status::InvalidParameter,
        };

        Some(result)
    }

    #[rustfmt::skip]
    fn set(&mut self, value: &PibValue) -> Status {
        let Self {
            ack_wait_duration,
            associated_pan_coord,
            association_permit,
            auto_request,
            beacon_payload,
            beacon_payload_length,
            coord_extended_address,
            coord_short_address,
            max_csma_backoffs,
            min_be,
            pan_id,
            promiscuous_mode,
            rx_on_when_idle,
            short_address,
            transaction_persistence_time,
            max_be,
            max_frame_total_wait_time,
            max_frame_retries,
            response_wait_time,
            security_enabled,
            fctl_override,
            crc_override,
            raw_rx,
            device_type,
            disable_cca,
        } = self;

        match value {
            PibValue::MacAckWaitDuration(value) if *value > 0 => *ack_wait_duration = *value,
            PibValue::MacAckWaitDuration(_) => return Status::InvalidParameter,
            PibValue::MacAssociatedPanCoord(value) => *associated_pan_coord = *value,
            PibValue::MacAssociationPermit(value) => *association_permit = *value,
            PibValue::MacAutoRequest(value) => *auto_request = *value,
            PibValue::MacBeaconPayload(value) => {
                beacon_payload[..value.len()].copy_from_slice(value);
                *beacon_payload_length = value.len() as u8;
            }
            PibValue::MacBeaconPayloadLength(value) if *value as usize <= MAX_BEACON_PAYLOAD_LENGTH => {
                *beacon_payload_length = *value
            }
            PibValue::MacBeaconPayloadLength(_) => return Status::InvalidParameter,
            PibValue::MacCoordExtendedAddress(value) => *coord_extended_address = *value,
            PibValue::MacCoordShortAddress(value) => *coord_short_address = *value,
            PibValue::MacMaxCsmaBackoffs(value) if (0..=5).contains(value) => *max_csma_backoffs = *value,
            PibValue::MacMaxCsmaBackoffs(_) => return Status::InvalidParameter,
            PibValue::MacMinBe(value) if (0..=*max_be).contains(value) => *min_be = *value,
            PibValue::MacMinBe(_) => return Status::InvalidParameter,
            PibValue::MacPanId(value) => *pan_id = *value,
            PibValue::MacPromiscuousMode(value) => *promiscuous_mode = *value,
            PibValue::MacRxOnWhenIdle(value) => *rx_on_when_idle = *value,
            PibValue::MacShortAddress(value) => *short_address = *value,
            PibValue::MacTransactionPersistenceTime(value) => *transaction_persistence_time = *value,
            PibValue::MacMaxBe(value) if (*min_be..=8).contains(value) => *max_be = *value,
            PibValue::MacMaxBe(_) => return Status::InvalidParameter,
            PibValue::MacMaxFrameTotalWaitTime(value) if *value > 0 => *max_frame_total_wait_time = *value,
            PibValue::MacMaxFrameTotalWaitTime(_) => return Status::InvalidParameter,
            PibValue::MacMaxFrameRetries(value) if (0..=7).contains(value) => *max_frame_retries = *value,
            PibValue::MacMaxFrameRetries(_) => return Status::InvalidParameter,
            PibValue::MacResponseWaitTime(value) if (2..=64).contains(value) => *response_wait_time = *value,
            PibValue::MacResponseWaitTime(_) => return Status::InvalidParameter,
            PibValue::MacSecurityEnabled(value) => *security_enabled = *value,
            PibValue::VsCrcOverride(value) => *crc_override = *value,
            PibValue::VsFctlOverride(value) => *fctl_override = *value,
            PibValue::VsRawRx(value) => *raw_rx = *value,
            PibValue::VsDeviceType(value) => *device_type = *value,
            PibValue::VsDisableCca(value) => *disable_cca = *value,
            PibValue::PhyCurrentChannel(_)
            | PibValue::PhyTransmitPower(_)
            | PibValue::MacBsn(_)
            | PibValue::MacDsn(_)
            | PibValue::VsExtendedAddress(_) => return Status::InvalidParameter,
        }

        Status::Success
    }
}

/// The time to commence transmitting the ACK plus the length of the ACK frame.
pub const fn default_ack_wait_duration() -> u8 {
    (UNIT_BACKOFF_PERIOD + TURNAROUND_TIME + SHR_DURATION + 6 * SYMBOLS_PER_OCTET) as u8
}

/// The worst case time the CSMA-CA algorithm can spend on a single attempt, plus the longest frame.
pub fn default_max_frame_total_wait_time(min_be: u8, max_be: u8, max_csma_backoffs: u8) -> u16 {
    let m = max_be.saturating_sub(min_be).min(max_csma_backoffs);

    let mut max_frame_total_wait_time =
        (max_csma_backoffs - m) as u32 * ((1 << max_be as u32) - 1);

    for k in 0..m {
        max_frame_total_wait_time += 1 << (min_be + k);
    }

    max_frame_total_wait_time *= UNIT_BACKOFF_PERIOD;
    max_frame_total_wait_time += MAX_FRAME_DURATION;
    max_frame_total_wait_time.min(u16::MAX as u32) as u16
}

/// The identifiers used for PIB attributes in GET and SET requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[repr(u8)]
pub enum PibAttribute {
    PhyCurrentChannel = 0x00,
    PhyTransmitPower = 0x02,
    MacAckWaitDuration = 0x40,
    MacAssociationPermit = 0x41,
    MacAutoRequest = 0x42,
    MacBeaconPayload = 0x45,
    MacBeaconPayloadLength = 0x46,
    MacBsn = 0x49,
    MacCoordExtendedAddress = 0x4A,
    MacCoordShortAddress = 0x4B,
    MacDsn = 0x4C,
    MacMaxCsmaBackoffs = 0x4E,
    MacMinBe = 0x4F,
    MacPanId = 0x50,
    MacPromiscuousMode = 0x51,
    MacRxOnWhenIdle = 0x52,
    MacShortAddress = 0x53,
    MacTransactionPersistenceTime = 0x55,
    MacAssociatedPanCoord = 0x56,
    MacMaxBe = 0x57,
    MacMaxFrameTotalWaitTime = 0x58,
    MacMaxFrameRetries = 0x59,
    MacResponseWaitTime = 0x5A,
    MacSecurityEnabled = 0x5D,
    VsExtendedAddress = 0x80,
    VsCrcOverride = 0x81,
    VsFctlOverride = 0x82,
    VsRawRx = 0x83,
    VsDeviceType = 0x84,
    VsDisableCca = 0x85,
}

impl PibAttribute {
    pub const fn is_phy(&self) -> bool {
        matches!(self, Self::PhyCurrentChannel | Self::PhyTransmitPower)
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::PhyCurrentChannel => "phyCurrentChannel",
            Self::PhyTransmitPower => "phyTransmitPower",
            Self::MacAckWaitDuration => "macAckWaitDuration",
            Self::MacAssociationPermit => "macAssociationPermit",
            Self::MacAutoRequest => "macAutoRequest",
            Self::MacBeaconPayload => "macBeaconPayload",
            Self::MacBeaconPayloadLength => "macBeaconPayloadLength",
            Self::MacBsn => "macBSN",
            Self::MacCoordExtendedAddress => "macCoordExtendedAddress",
            Self::MacCoordShortAddress => "macCoordShortAddress",
            Self::MacDsn => "macDSN",
            Self::MacMaxCsmaBackoffs => "macMaxCSMABackoffs",
            Self::MacMinBe => "macMinBE",
            Self::MacPanId => "macPANId",
            Self::MacPromiscuousMode => "macPromiscuousMode",
            Self::MacRxOnWhenIdle => "macRxOnWhenIdle",
            Self::MacShortAddress => "macShortAddress",
            Self::MacTransactionPersistenceTime => "macTransactionPersistenceTime",
            Self::MacAssociatedPanCoord => "macAssociatedPANCoord",
            Self::MacMaxBe => "macMaxBE",
            Self::MacMaxFrameTotalWaitTime => "macMaxFrameTotalWaitTime",
            Self::MacMaxFrameRetries => "macMaxFrameRetries",
            Self::MacResponseWaitTime => "macResponseWaitTime",
            Self::MacSecurityEnabled => "macSecurityEnabled",
            Self::VsExtendedAddress => "vsExtendedAddress",
            Self::VsCrcOverride => "vsCRCOverride",
            Self::VsFctlOverride => "vsFctlOverride",
            Self::VsRawRx => "vsRawRx",
            Self::VsDeviceType => "deviceType",
            Self::VsDisableCca => "disableCCA",
        }
    }
}

impl From<PibAttribute> for u8 {
    fn from(value: PibAttribute) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for PibAttribute {
    type Error = Status;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::PhyCurrentChannel,
            0x02 => Self::PhyTransmitPower,
            0x40 => Self::MacAckWaitDuration,
            0x41 => Self::MacAssociationPermit,
            0x42 => Self::MacAutoRequest,
            0x45 => Self::MacBeaconPayload,
            0x46 => Self::MacBeaconPayloadLength,
            0x49 => Self::MacBsn,
            0x4A => Self::MacCoordExtendedAddress,
            0x4B => Self::MacCoordShortAddress,
            0x4C => Self::MacDsn,
            0x4E => Self::MacMaxCsmaBackoffs,
            0x4F => Self::MacMinBe,
            0x50 => Self::MacPanId,
            0x51 => Self::MacPromiscuousMode,
            0x52 => Self::MacRxOnWhenIdle,
            0x53 => Self::MacShortAddress,
            0x55 => Self::MacTransactionPersistenceTime,
            0x56 => Self::MacAssociatedPanCoord,
            0x57 => Self::MacMaxBe,
            0x58 => Self::MacMaxFrameTotalWaitTime,
            0x59 => Self::MacMaxFrameRetries,
            0x5A => Self::MacResponseWaitTime,
            0x5D => Self::MacSecurityEnabled,
            0x80 => Self::VsExtendedAddress,
            0x81 => Self::VsCrcOverride,
            0x82 => Self::VsFctlOverride,
            0x83 => Self::VsRawRx,
            0x84 => Self::VsDeviceType,
            0x85 => Self::VsDisableCca,
            _ => return Err(Status::UnsupportedAttribute),
        })
    }
}

/// A typed PIB attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PibValue {
    PhyCurrentChannel(u8),
    PhyTransmitPower(i8),
    MacAckWaitDuration(u8),
    MacAssociationPermit(bool),
    MacAutoRequest(bool),
    MacBeaconPayload(ArrayVec<u8, MAX_BEACON_PAYLOAD_LENGTH>),
    MacBeaconPayloadLength(u8),
    MacBsn(u8),
    MacCoordExtendedAddress(ExtendedAddress),
    MacCoordShortAddress(ShortAddress),
    MacDsn(u8),
    MacMaxCsmaBackoffs(u8),
    MacMinBe(u8),
    MacPanId(PanId),
    MacPromiscuousMode(bool),
    MacRxOnWhenIdle(bool),
    MacShortAddress(ShortAddress),
    MacTransactionPersistenceTime(u16),
    MacAssociatedPanCoord(bool),
    MacMaxBe(u8),
    MacMaxFrameTotalWaitTime(u16),
    MacMaxFrameRetries(u8),
    MacResponseWaitTime(u32),
    MacSecurityEnabled(bool),
    VsExtendedAddress(ExtendedAddress),
    VsCrcOverride(u16),
    VsFctlOverride(u16),
    VsRawRx(bool),
    VsDeviceType(u8),
    VsDisableCca(bool),
}

impl PibValue {
    pub const fn attribute(&self) -> PibAttribute {
        match self {
            PibValue::PhyCurrentChannel(_) => PibAttribute::PhyCurrentChannel,
            PibValue::PhyTransmitPower(_) => PibAttribute::PhyTransmitPower,
            PibValue::MacAckWaitDuration(_) => PibAttribute::MacAckWaitDuration,
            PibValue::MacAssociationPermit(_) => PibAttribute::MacAssociationPermit,
            PibValue::MacAutoRequest(_) => PibAttribute::MacAutoRequest,
            PibValue::MacBeaconPayload(_) => PibAttribute::MacBeaconPayload,
            PibValue::MacBeaconPayloadLength(_) => PibAttribute::MacBeaconPayloadLength,
            PibValue::MacBsn(_) => PibAttribute::MacBsn,
            PibValue::MacCoordExtendedAddress(_) => PibAttribute::MacCoordExtendedAddress,
            PibValue::MacCoordShortAddress(_) => PibAttribute::MacCoordShortAddress,
            PibValue::MacDsn(_) => PibAttribute::MacDsn,
            PibValue::MacMaxCsmaBackoffs(_) => PibAttribute::MacMaxCsmaBackoffs,
            PibValue::MacMinBe(_) => PibAttribute::MacMinBe,
            PibValue::MacPanId(_) => PibAttribute::MacPanId,
            PibValue::MacPromiscuousMode(_) => PibAttribute::MacPromiscuousMode,
            PibValue::MacRxOnWhenIdle(_) => PibAttribute::MacRxOnWhenIdle,
            PibValue::MacShortAddress(_) => PibAttribute::MacShortAddress,
            PibValue::MacTransactionPersistenceTime(_) => PibAttribute::MacTransactionPersistenceTime,
            PibValue::MacAssociatedPanCoord(_) => PibAttribute::MacAssociatedPanCoord,
            PibValue::MacMaxBe(_) => PibAttribute::MacMaxBe,
            PibValue::MacMaxFrameTotalWaitTime(_) => PibAttribute::MacMaxFrameTotalWaitTime,
            PibValue::MacMaxFrameRetries(_) => PibAttribute::MacMaxFrameRetries,
            PibValue::MacResponseWaitTime(_) => PibAttribute::MacResponseWaitTime,
            PibValue::MacSecurityEnabled(_) => PibAttribute::MacSecurityEnabled,
            PibValue::VsExtendedAddress(_) => PibAttribute::VsExtendedAddress,
            PibValue::VsCrcOverride(_) => PibAttribute::VsCrcOverride,
            PibValue::VsFctlOverride(_) => PibAttribute::VsFctlOverride,
            PibValue::VsRawRx(_) => PibAttribute::VsRawRx,
            PibValue::VsDeviceType(_) => PibAttribute::VsDeviceType,
            PibValue::VsDisableCca(_) => PibAttribute::VsDisableCca,
        }
    }

    /// Parse the value bytes of a SET request.
    ///
    /// A value of the wrong size for the attribute is an invalid parameter.
    pub fn decode(attribute: PibAttribute, bytes: &[u8]) -> Result<Self, Status> {
        fn exact<const N: usize>(bytes: &[u8]) -> Result<[u8; N], Status> {
            bytes.try_into().map_err(|_| Status::InvalidParameter)
        }
        fn flag(bytes: &[u8]) -> Result<bool, Status> {
            match exact::<1>(bytes)? {
                [0] => Ok(false),
                [1] => Ok(true),
                _ => Err(Status::InvalidParameter),
            }
        }
        fn byte(bytes: &[u8]) -> Result<u8, Status> {
            Ok(exact::<1>(bytes)?[0])
        }
        fn half(bytes: &[u8]) -> Result<u16, Status> {
            Ok(u16::from_le_bytes(exact(bytes)?))
        }
        fn word(bytes: &[u8]) -> Result<u32, Status> {
            Ok(u32::from_le_bytes(exact(bytes)?))
        }
        fn long(bytes: &[u8]) -> Result<u64, Status> {
            Ok(u64::from_le_bytes(exact(bytes)?))
        }

        let value = match attribute {
            PibAttribute::PhyCurrentChannel => Self::PhyCurrentChannel(byte(bytes)?),
            PibAttribute::PhyTransmitPower => Self::PhyTransmitPower(byte(bytes)? as i8),
            PibAttribute::MacAckWaitDuration => Self::MacAckWaitDuration(byte(bytes)?),
            PibAttribute::MacAssociationPermit => Self::MacAssociationPermit(flag(bytes)?),
            PibAttribute::MacAutoRequest => Self::MacAutoRequest(flag(bytes)?),
            PibAttribute::MacBeaconPayload => Self::MacBeaconPayload(
                ArrayVec::try_from(bytes).map_err(|_| Status::InvalidParameter)?,
            ),
            PibAttribute::MacBeaconPayloadLength => Self::MacBeaconPayloadLength(byte(bytes)?),
            PibAttribute::MacBsn => Self::MacBsn(byte(bytes)?),
            PibAttribute::MacCoordExtendedAddress => {
                Self::MacCoordExtendedAddress(ExtendedAddress(long(bytes)?))
            }
            PibAttribute::MacCoordShortAddress => Self::MacCoordShortAddress(ShortAddress(half(bytes)?)),
            PibAttribute::MacDsn => Self::MacDsn(byte(bytes)?),
            PibAttribute::MacMaxCsmaBackoffs => Self::MacMaxCsmaBackoffs(byte(bytes)?),
            PibAttribute::MacMinBe => Self::MacMinBe(byte(bytes)?),
            PibAttribute::MacPanId => Self::MacPanId(PanId(half(bytes)?)),
            PibAttribute::MacPromiscuousMode => Self::MacPromiscuousMode(flag(bytes)?),
            PibAttribute::MacRxOnWhenIdle => Self::MacRxOnWhenIdle(flag(bytes)?),
            PibAttribute::MacShortAddress => Self::MacShortAddress(ShortAddress(half(bytes)?)),
            PibAttribute::MacTransactionPersistenceTime => {
                Self::MacTransactionPersistenceTime(half(bytes)?)
            }
            PibAttribute::MacAssociatedPanCoord => Self::MacAssociatedPanCoord(flag(bytes)?),
            PibAttribute::MacMaxBe => Self::MacMaxBe(byte(bytes)?),
            PibAttribute::MacMaxFrameTotalWaitTime => Self::MacMaxFrameTotalWaitTime(half(bytes)?),
            PibAttribute::MacMaxFrameRetries => Self::MacMaxFrameRetries(byte(bytes)?),
            PibAttribute::MacResponseWaitTime => Self::MacResponseWaitTime(word(bytes)?),
            PibAttribute::MacSecurityEnabled => Self::MacSecurityEnabled(flag(bytes)?),
            PibAttribute::VsExtendedAddress => Self::VsExtendedAddress(ExtendedAddress(long(bytes)?)),
            PibAttribute::VsCrcOverride => Self::VsCrcOverride(half(bytes)?),
            PibAttribute::VsFctlOverride => Self::VsFctlOverride(half(bytes)?),
            PibAttribute::VsRawRx => Self::VsRawRx(flag(bytes)?),
            PibAttribute::VsDeviceType => Self::VsDeviceType(byte(bytes)?),
            PibAttribute::VsDisableCca => Self::VsDisableCca(flag(bytes)?),
        };

        Ok(value)
    }

    /// The value bytes as they appear in GET confirms and SET requests.
    pub fn encode(&self) -> PibBytes {
        let mut buffer = [0u8; MAX_PIB_VALUE_LEN];
        let offset = &mut 0;

        // Every value fits in the buffer, so writes can't fail
        let _ = match self {
            PibValue::MacBeaconPayload(payload) => buffer.write(offset, payload.as_slice()),
            PibValue::PhyTransmitPower(value) => buffer.write(offset, *value as u8),
            PibValue::PhyCurrentChannel(value)
            | PibValue::MacAckWaitDuration(value)
            | PibValue::MacBeaconPayloadLength(value)
            | PibValue::MacBsn(value)
            | PibValue::MacDsn(value)
            | PibValue::MacMaxCsmaBackoffs(value)
            | PibValue::MacMinBe(value)
            | PibValue::MacMaxBe(value)
            | PibValue::MacMaxFrameRetries(value)
            | PibValue::VsDeviceType(value) => buffer.write(offset, *value),
            PibValue::MacAssociationPermit(value)
            | PibValue::MacAutoRequest(value)
            | PibValue::MacPromiscuousMode(value)
            | PibValue::MacRxOnWhenIdle(value)
            | PibValue::MacAssociatedPanCoord(value)
            | PibValue::MacSecurityEnabled(value)
            | PibValue::VsRawRx(value)
            | PibValue::VsDisableCca(value) => buffer.write(offset, *value as u8),
            PibValue::MacTransactionPersistenceTime(value)
            | PibValue::MacMaxFrameTotalWaitTime(value)
            | PibValue::VsCrcOverride(value)
            | PibValue::VsFctlOverride(value) => buffer.write_with(offset, *value, LE),
            PibValue::MacCoordShortAddress(value) | PibValue::MacShortAddress(value) => {
                buffer.write_with(offset, value.0, LE)
            }
            PibValue::MacPanId(value) => buffer.write_with(offset, value.0, LE),
            PibValue::MacResponseWaitTime(value) => buffer.write_with(offset, *value, LE),
            PibValue::MacCoordExtendedAddress(value) | PibValue::VsExtendedAddress(value) => {
                buffer.write_with(offset, value.0, LE)
            }
        };

        buffer[..*offset].iter().copied().collect()
    }
}

/// A wrapping sequence number. The current value goes out with the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct SequenceNumber {
    value: u8,
}

impl SequenceNumber {
    pub fn new(initial_value: u8) -> Self {
        Self {
            value: initial_value,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Hand out the current value and move on to the next one.
    pub fn take(&mut self) -> u8 {
        let value = self.value;
        self.value = self.value.wrapping_add(1);
        value
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn pib() -> MacPib {
        MacPib::new(ExtendedAddress(0x0102030405060708), &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn defaults() {
        let pib = pib();

        assert_eq!(pib.ack_wait_duration, 54);
        assert_eq!(pib.max_frame_total_wait_time, 1986);
        assert_eq!(pib.transaction_persistence_time, 0x01F4);
        assert_eq!(pib.response_wait_time(), Duration::from_symbols(32 * 960));
        assert!(pib.auto_request);
        assert_eq!(pib.short_address, ShortAddress::BROADCAST);
    }

    #[test]
    fn set_then_get() {
        let mut pib = pib();

        let value = PibValue::MacMaxFrameRetries(7);
        assert_eq!(pib.try_set(PibAttribute::MacMaxFrameRetries, &value), Some(Status::Success));
        assert_eq!(pib.get(PibAttribute::MacMaxFrameRetries), Some(value));
    }

    #[test]
    fn backoff_exponent_ordering() {
        let mut pib = pib();

        assert_eq!(pib.try_set(PibAttribute::MacMaxBe, &PibValue::MacMaxBe(2)), Some(Status::InvalidParameter));
        assert_eq!(pib.try_set(PibAttribute::MacMinBe, &PibValue::MacMinBe(6)), Some(Status::InvalidParameter));
        assert_eq!(pib.try_set(PibAttribute::MacMaxBe, &PibValue::MacMaxBe(9)), Some(Status::InvalidParameter));
        assert_eq!(pib.try_set(PibAttribute::MacMinBe, &PibValue::MacMinBe(0)), Some(Status::Success));
        assert_eq!(pib.try_set(PibAttribute::MacMaxBe, &PibValue::MacMaxBe(8)), Some(Status::Success));
        assert_eq!((pib.min_be, pib.max_be), (0, 8));
    }

    #[test]
    fn rejected_value_leaves_pib_untouched() {
        let mut pib = pib();

        assert_eq!(
            pib.try_set(PibAttribute::MacResponseWaitTime, &PibValue::MacResponseWaitTime(65)),
            Some(Status::InvalidParameter)
        );
        assert_eq!(pib.response_wait_time, 32);
    }

    #[test]
    fn read_only_attributes() {
        let mut pib = pib();
        let dsn = pib.dsn;

        assert_eq!(pib.try_set(PibAttribute::MacDsn, &PibValue::MacDsn(3)), Some(Status::ReadOnly));
        assert_eq!(pib.try_set(PibAttribute::MacBsn, &PibValue::MacBsn(3)), Some(Status::ReadOnly));
        assert_eq!(
            pib.try_set(PibAttribute::VsExtendedAddress, &PibValue::VsExtendedAddress(ExtendedAddress(1))),
            Some(Status::ReadOnly)
        );
        assert_eq!(pib.dsn, dsn);
    }

    #[test]
    fn mismatched_value() {
        let mut pib = pib();

        assert_eq!(
            pib.try_set(PibAttribute::MacPanId, &PibValue::MacShortAddress(ShortAddress(1))),
            Some(Status::InvalidParameter)
        );
        assert_eq!(pib.try_set(PibAttribute::PhyCurrentChannel, &PibValue::PhyCurrentChannel(12)), None);
    }

    #[test]
    fn beacon_payload_sets_length() {
        let mut pib = pib();

        let payload = PibValue::decode(PibAttribute::MacBeaconPayload, &[1, 2, 3]).unwrap();
        assert_eq!(pib.try_set(PibAttribute::MacBeaconPayload, &payload), Some(Status::Success));
        assert_eq!(pib.beacon_payload_length, 3);
        assert_eq!(pib.beacon_payload(), &[1, 2, 3]);
        assert_eq!(pib.get(PibAttribute::MacBeaconPayload).unwrap().encode().as_slice(), &[1, 2, 3]);

        assert_eq!(
            PibValue::decode(PibAttribute::MacBeaconPayload, &[0; MAX_BEACON_PAYLOAD_LENGTH + 1]),
            Err(Status::InvalidParameter)
        );
        assert_eq!(
            pib.try_set(PibAttribute::MacBeaconPayloadLength, &PibValue::MacBeaconPayloadLength(53)),
            Some(Status::InvalidParameter)
        );
    }

    #[test]
    fn value_encoding() {
        assert_eq!(PibValue::MacPanId(PanId(0x1234)).encode().as_slice(), &[0x34, 0x12]);
        assert_eq!(PibValue::MacResponseWaitTime(32).encode().as_slice(), &[32, 0, 0, 0]);
        assert_eq!(PibValue::PhyTransmitPower(-3).encode().as_slice(), &[0xFD]);
        assert_eq!(
            PibValue::decode(PibAttribute::MacPanId, &[0x34, 0x12]),
            Ok(PibValue::MacPanId(PanId(0x1234)))
        );
        assert_eq!(PibValue::decode(PibAttribute::MacPanId, &[0x34]), Err(Status::InvalidParameter));
        assert_eq!(PibValue::decode(PibAttribute::MacAutoRequest, &[2]), Err(Status::InvalidParameter));
    }

    #[test]
    fn attribute_ids() {
        assert_eq!(PibAttribute::try_from(0x53), Ok(PibAttribute::MacShortAddress));
        assert_eq!(PibAttribute::try_from(0x44), Err(Status::UnsupportedAttribute));
        assert_eq!(u8::from(PibAttribute::VsDisableCca), 0x85);
    }

    #[test]
    fn phy_ranges() {
        let mut phy = PhyPib::default();

        assert_eq!(phy.try_set(PibAttribute::PhyCurrentChannel, &PibValue::PhyCurrentChannel(27)), Some(Status::InvalidParameter));
        assert_eq!(phy.try_set(PibAttribute::PhyCurrentChannel, &PibValue::PhyCurrentChannel(26)), Some(Status::Success));
        assert_eq!(phy.try_set(PibAttribute::PhyTransmitPower, &PibValue::PhyTransmitPower(11)), Some(Status::InvalidParameter));
        assert_eq!(phy.current_channel, 26);
        assert_eq!(phy.try_set(PibAttribute::MacPanId, &PibValue::MacPanId(PanId(1))), None);
    }

    #[test]
    fn sequence_number_wraps() {
        let mut dsn = SequenceNumber::new(255);
        assert_eq!(dsn.take(), 255);
        assert_eq!(dsn.take(), 0);
        assert_eq!(dsn.value(), 1);
    }

    #[test]
    fn reset_keeps_extended_address() {
        let mut pib = pib();
        pib.pan_id = PanId(0x22);
        pib.reset(&mut StdRng::seed_from_u64(2));
        assert_eq!(pib.pan_id, PanId::broadcast());
        assert_eq!(pib.extended_address, ExtendedAddress(0x0102030405060708));
    }
}
