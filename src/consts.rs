//! MAC and PHY constants for the 2.4 GHz O-QPSK PHY.
//!
//! All durations are in symbol periods.

/// The number of symbols forming a superframe slot when the superframe order is equal to zero, as described in 5.1.1.1.
#[doc(alias = "aBaseSlotDuration")]
pub const BASE_SLOT_DURATION: u32 = 60;
/// The number of slots contained in any superframe.
#[doc(alias = "aNumSuperframeSlots")]
pub const NUM_SUPERFRAME_SLOTS: u32 = 16;
/// The number of symbols forming a superframe when the superframe order is equal to zero.
#[doc(alias = "aBaseSuperframeDuration")]
pub const BASE_SUPERFRAME_DURATION: u32 = BASE_SLOT_DURATION * NUM_SUPERFRAME_SLOTS;
/// The number of symbols forming the basic time period used by the CSMA-CA algorithm.
#[doc(alias = "aUnitBackoffPeriod")]
pub const UNIT_BACKOFF_PERIOD: u32 = 20;
/// The maximum PSDU size (in octets) the PHY shall be able to receive.
#[doc(alias = "aMaxPhyPacketSize")]
pub const MAX_PHY_PACKET_SIZE: usize = 127;
/// The maximum number of octets added by the MAC sublayer to the MAC payload of a beacon frame.
#[doc(alias = "aMaxBeaconOverhead")]
pub const MAX_BEACON_OVERHEAD: usize = 75;
/// The maximum size, in octets, of a beacon payload.
#[doc(alias = "aMaxBeaconPayloadLength")]
pub const MAX_BEACON_PAYLOAD_LENGTH: usize = MAX_PHY_PACKET_SIZE - MAX_BEACON_OVERHEAD;
/// The minimum number of octets added by the MAC sublayer to the PSDU.
#[doc(alias = "aMinMPDUOverhead")]
pub const MIN_MPDU_OVERHEAD: usize = 9;
/// The maximum number of octets that can be transmitted in the MAC Payload field.
#[doc(alias = "aMaxMACPayloadSize")]
pub const MAX_MAC_PAYLOAD_SIZE: usize = MAX_PHY_PACKET_SIZE - MIN_MPDU_OVERHEAD;
/// RX-to-TX or TX-to-RX turnaround time.
#[doc(alias = "aTurnaroundTime")]
pub const TURNAROUND_TIME: u32 = 12;
/// The length of the FCS the radio appends to every frame.
pub const FCS_LENGTH: usize = 2;

/// Duration of the synchronization header: preamble plus SFD.
#[doc(alias = "phySHRDuration")]
pub const SHR_DURATION: u32 = 10;
/// O-QPSK carries four bits per symbol.
#[doc(alias = "phySymbolsPerOctet")]
pub const SYMBOLS_PER_OCTET: u32 = 2;
/// The maximum number of symbols in a frame.
#[doc(alias = "phyMaxFrameDuration")]
pub const MAX_FRAME_DURATION: u32 =
    SHR_DURATION + (MAX_PHY_PACKET_SIZE as u32 + 1) * SYMBOLS_PER_OCTET;

/// Lowest channel of channel page 0 in the 2.4 GHz band.
pub const MIN_CHANNEL: u8 = 11;
/// Highest channel of channel page 0 in the 2.4 GHz band.
pub const MAX_CHANNEL: u8 = 26;
/// Bitmap of all channels the PHY can tune to.
pub const SUPPORTED_CHANNELS: u32 = 0x07FF_F800;

/// Transmit power limits of the PHY in dBm.
pub const MIN_TX_POWER: i8 = -40;
pub const MAX_TX_POWER: i8 = 10;

/// Largest scan duration exponent accepted by a scan request.
pub const MAX_SCAN_DURATION: u8 = 14;

/// Beacon and superframe order of a nonbeacon-enabled PAN.
pub const NON_BEACON_ORDER: u8 = 15;

/// Version number reported to the host.
#[doc(alias = "MAC_154_VER_NUM")]
pub const MAC_154_VERSION: u16 = 0x1302;

pub const fn channel_supported(channel: u8) -> bool {
    channel >= MIN_CHANNEL && channel <= MAX_CHANNEL
}
