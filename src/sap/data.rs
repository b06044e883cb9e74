use arrayvec::ArrayVec;
use byte::{ctx::Bytes, BytesExt, TryRead, TryWrite, LE};

use super::{
    check_exact_len, read_address, write_address, Status, ADDRESS_LEN, ADDRESS_MODE_EXTENDED,
    ADDRESS_MODE_NONE, ADDRESS_MODE_SHORT,
};
use crate::{consts::MAX_MAC_PAYLOAD_SIZE, time::Instant, wire::Address};

pub type Msdu = ArrayVec<u8, MAX_MAC_PAYLOAD_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AddressMode {
    None,
    Short,
    Extended,
}

impl TryFrom<u8> for AddressMode {
    type Error = Status;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            ADDRESS_MODE_NONE => Ok(Self::None),
            ADDRESS_MODE_SHORT => Ok(Self::Short),
            ADDRESS_MODE_EXTENDED => Ok(Self::Extended),
            _ => Err(Status::InvalidParameter),
        }
    }
}

impl From<AddressMode> for u8 {
    fn from(value: AddressMode) -> Self {
        match value {
            AddressMode::None => ADDRESS_MODE_NONE,
            AddressMode::Short => ADDRESS_MODE_SHORT,
            AddressMode::Extended => ADDRESS_MODE_EXTENDED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct TxOptions {
    /// Request an acknowledgment from the recipient.
    pub ack: bool,
    /// Hold the frame in the indirect queue until the recipient polls for it.
    pub indirect: bool,
}

const TX_OPTION_ACK: u8 = 0x01;
const TX_OPTION_INDIRECT: u8 = 0x04;

impl TryFrom<u8> for TxOptions {
    type Error = Status;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // GTS transmissions only exist in beacon-enabled PANs
        if value & !(TX_OPTION_ACK | TX_OPTION_INDIRECT) != 0 {
            return Err(Status::InvalidParameter);
        }

        Ok(Self {
            ack: value & TX_OPTION_ACK != 0,
            indirect: value & TX_OPTION_INDIRECT != 0,
        })
    }
}

impl From<TxOptions> for u8 {
    fn from(value: TxOptions) -> Self {
        (if value.ack { TX_OPTION_ACK } else { 0 })
            | (if value.indirect { TX_OPTION_INDIRECT } else { 0 })
    }
}

/// Where the handle sits in a data request payload, after the address mode and destination.
pub const MSDU_HANDLE_OFFSET: usize = 1 + super::ADDRESS_LEN;

/// The MCPS-DATA.request primitive requests the transfer of data to another device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub src_addr_mode: AddressMode,
    pub dst_address: Option<Address>,
    /// The handle associated with the MSDU to be transmitted by the MAC sublayer entity.
    pub msdu_handle: u8,
    pub tx_options: TxOptions,
    /// The set of octets forming the MSDU to be transmitted by the MAC sublayer entity.
    pub msdu: Msdu,
}

impl TryRead<'_> for DataRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let bad_input = |err| byte::Error::BadInput { err };

        let src_addr_mode = AddressMode::try_from(bytes.read::<u8>(offset)?)
            .map_err(|_| bad_input("Invalid source address mode"))?;
        let dst_address = read_address(bytes, offset)?;
        let msdu_handle = bytes.read(offset)?;
        let tx_options = TxOptions::try_from(bytes.read::<u8>(offset)?)
            .map_err(|_| bad_input("Invalid transmit options"))?;
        let msdu_length: u8 = bytes.read(offset)?;
        check_exact_len(&bytes[*offset..], msdu_length as usize)?;
        let msdu: &[u8] = bytes.read_with(offset, Bytes::Len(msdu_length as usize))?;

        let request = Self {
            src_addr_mode,
            dst_address,
            msdu_handle,
            tx_options,
            msdu: Msdu::try_from(msdu).map_err(|_| bad_input("MSDU too long"))?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for DataRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, u8::from(self.src_addr_mode))?;
        write_address(bytes, offset, self.dst_address)?;
        bytes.write(offset, self.msdu_handle)?;
        bytes.write(offset, u8::from(self.tx_options))?;
        bytes.write(offset, self.msdu.len() as u8)?;
        bytes.write(offset, self.msdu.as_slice())?;
        Ok(*offset)
    }
}

/// The MCPS-DATA.confirm primitive reports the results of a request to transfer data to another device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfirm {
    /// The handle associated with the MSDU being confirmed.
    pub msdu_handle: u8,
    pub status: Status,
    /// The time at which the data were transmitted.
    pub timestamp: Instant,
}

impl TryRead<'_> for DataConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 6)?;
        let offset = &mut 0;
        let confirm = Self {
            msdu_handle: bytes.read(offset)?,
            status: bytes.read(offset)?,
            timestamp: Instant::from_symbols(bytes.read_with::<u32>(offset, LE)? as u64),
        };
        Ok((confirm, *offset))
    }
}

impl TryWrite for DataConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.msdu_handle)?;
        bytes.write(offset, self.status)?;
        bytes.write_with(offset, self.timestamp.timestamp(), LE)?;
        Ok(*offset)
    }
}

/// The MCPS-DATA.indication primitive indicates the reception of data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataIndication {
    pub src_address: Option<Address>,
    pub dst_address: Option<Address>,
    /// LQI value measured during reception of the MPDU. Lower values represent lower LQI.
    pub mpdu_link_quality: u8,
    /// The DSN of the received data frame.
    pub dsn: u8,
    /// The time at which the data were received.
    pub timestamp: Instant,
    pub msdu: Msdu,
}

impl TryRead<'_> for DataIndication {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let src_address = read_address(bytes, offset)?;
        let dst_address = read_address(bytes, offset)?;
        let mpdu_link_quality = bytes.read(offset)?;
        let dsn = bytes.read(offset)?;
        let timestamp = Instant::from_symbols(bytes.read_with::<u32>(offset, LE)? as u64);
        let msdu_length: u8 = bytes.read(offset)?;
        check_exact_len(&bytes[*offset..], msdu_length as usize)?;
        let msdu: &[u8] = bytes.read_with(offset, Bytes::Len(msdu_length as usize))?;

        let indication = Self {
            src_address,
            dst_address,
            mpdu_link_quality,
            dsn,
            timestamp,
            msdu: Msdu::try_from(msdu).map_err(|_| byte::Error::BadInput {
                err: "MSDU too long",
            })?,
        };
        Ok((indication, *offset))
    }
}

impl TryWrite for DataIndication {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        write_address(bytes, offset, self.src_address)?;
        write_address(bytes, offset, self.dst_address)?;
        bytes.write(offset, self.mpdu_link_quality)?;
        bytes.write(offset, self.dsn)?;
        bytes.write_with(offset, self.timestamp.timestamp(), LE)?;
        bytes.write(offset, self.msdu.len() as u8)?;
        bytes.write(offset, self.msdu.as_slice())?;
        Ok(*offset)
    }
}

/// Fixed part of a data indication in front of the MSDU.
pub const DATA_INDICATION_HEADER_LEN: usize = 2 * ADDRESS_LEN + 7;
