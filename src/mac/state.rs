use byte::{TryRead, TryWrite};
use heapless::Vec;
use ieee802154::mac::{security::default::Unimplemented, FooterMode, FrameSerDesContext};

use super::{
    csma::Csma, indirect::IndirectQueue, pending::PendingTable, rx_enable::RxEnableScheduler,
};
use crate::{
    consts::MAX_PHY_PACKET_SIZE,
    sap::Status,
    wire::{Address, Frame, FrameType, FrameVersion, Header},
};

/// An encoded MAC frame, without FCS.
pub type FrameBuffer = Vec<u8, MAX_PHY_PACKET_SIZE>;

/// Index of the sequence number in an encoded frame.
pub const SEQUENCE_NUMBER_OFFSET: usize = 2;
/// The frame pending bit in the first byte of the frame control field.
pub const FRAME_PENDING_BIT: u8 = 0x10;

pub struct MacState {
    pub csma: Csma,
    pub indirect: IndirectQueue,
    pub pending: PendingTable,
    pub rx_enable: RxEnableScheduler,
    /// Set by a successful start request. A coordinator answers beacon requests,
    /// association requests and data requests.
    pub is_coordinator: bool,
    pub is_pan_coordinator: bool,
}

impl MacState {
    pub fn new() -> Self {
        Self {
            csma: Csma::new(),
            indirect: IndirectQueue::new(),
            pending: PendingTable::new(),
            rx_enable: RxEnableScheduler::new(),
            is_coordinator: false,
            is_pan_coordinator: false,
        }
    }

    /// Drop every queued frame and running procedure.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Build a header for an unsecured frame. The sequence number is filled in when the frame goes out.
pub fn frame_header(
    frame_type: FrameType,
    ack_request: bool,
    destination: Option<Address>,
    source: Option<Address>,
) -> Header {
    let pan_id_compress = match (destination, source) {
        (Some(destination), Some(source)) => destination.pan_id() == source.pan_id(),
        _ => false,
    };

    Header {
        ie_present: false,
        seq_no_suppress: false,
        frame_type,
        frame_pending: false,
        ack_request,
        pan_id_compress,
        version: FrameVersion::Ieee802154_2003,
        seq: 0,
        destination,
        source,
        auxiliary_security_header: None,
    }
}

/// Encode a frame. Fails with `InvalidParameter` when it does not fit in a PSDU.
pub fn serialize_frame(frame: Frame<'_>) -> Result<FrameBuffer, Status> {
    let mut buffer = [0u8; MAX_PHY_PACKET_SIZE];

    let length = frame
        .try_write(
            &mut buffer,
            &mut FrameSerDesContext::<Unimplemented, Unimplemented>::new(FooterMode::None, None),
        )
        .map_err(|_| {
            warn!("Frame does not fit in a PSDU");
            Status::InvalidParameter
        })?;

    Vec::from_slice(&buffer[..length]).map_err(|_| Status::InvalidParameter)
}

pub fn deserialize_frame(data: &[u8]) -> Option<Frame<'_>> {
    match Frame::try_read(data, FooterMode::None) {
        Ok((frame, _)) => Some(frame),
        Err(e) => {
            #[cfg(feature = "defmt-03")]
            warn!("Could not deserialize a frame: {}", defmt::Debug2Format(&e));
            #[cfg(not(feature = "defmt-03"))]
            warn!("Could not deserialize a frame: {:?}", e);

            None
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::wire::{FrameContent, PanId, ShortAddress};

    #[test]
    fn data_frame_layout() {
        let frame = Frame {
            header: frame_header(
                FrameType::Data,
                true,
                Some(Address::Short(PanId(0x1234), ShortAddress(0x0002))),
                Some(Address::Short(PanId(0x1234), ShortAddress(0x0001))),
            ),
            content: FrameContent::Data,
            payload: b"hi",
            footer: [0, 0],
        };

        let data = serialize_frame(frame).unwrap();

        // Data, ack request, PAN id compression, short addresses, 2003
        assert_eq!(&data[..2], &[0x61, 0x88]);
        assert_eq!(data.len(), 3 + 2 + 2 + 2 + 2);

        let frame = deserialize_frame(&data).unwrap();
        assert_eq!(
            frame.header.source,
            Some(Address::Short(PanId(0x1234), ShortAddress(0x0001)))
        );
        assert_eq!(frame.payload, b"hi");
    }

    #[test]
    fn oversized_frame() {
        let payload = [0u8; MAX_PHY_PACKET_SIZE];
        let frame = Frame {
            header: frame_header(FrameType::Data, false, None, None),
            content: FrameContent::Data,
            payload: &payload,
            footer: [0, 0],
        };

        assert_eq!(serialize_frame(frame), Err(Status::InvalidParameter));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(deserialize_frame(&[0xFF]).is_none());
    }
}
