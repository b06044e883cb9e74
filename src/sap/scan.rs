use arrayvec::ArrayVec;
use byte::{BytesExt, TryRead, TryWrite, LE};

use super::{check_exact_len, PanDescriptor, Status, PAN_DESCRIPTOR_LEN};

/// Maximum amount of PAN descriptors a single active or passive scan collects.
pub const MAX_PAN_DESCRIPTORS: usize = 8;
/// One energy reading per 2.4 GHz channel.
pub const MAX_ENERGY_READINGS: usize = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum ScanType {
    Ed = 0,
    Active = 1,
    Passive = 2,
    Orphan = 3,
}

impl TryFrom<u8> for ScanType {
    type Error = Status;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ScanType::Ed),
            1 => Ok(ScanType::Active),
            2 => Ok(ScanType::Passive),
            3 => Ok(ScanType::Orphan),
            _ => Err(Status::InvalidParameter),
        }
    }
}

/// The MLME-SCAN.request primitive is used to initiate a channel scan over a given list of channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub scan_type: ScanType,
    /// Bitmap of the channels to scan, bit `n` is channel `n`.
    pub scan_channels: u32,
    /// A value used to calculate the length of time to spend scanning each channel for ED, active, and
    /// passive scans. This parameter is ignored for orphan scans.
    ///
    /// The time spent scanning each channel is [aBaseSuperframeDuration × (2^n + 1)], where n is the value of
    /// the ScanDuration parameter.
    pub scan_duration: u8,
    pub channel_page: u8,
}

impl TryRead<'_> for ScanRequest {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        check_exact_len(bytes, 7)?;
        let offset = &mut 0;
        let scan_type = ScanType::try_from(bytes.read::<u8>(offset)?).map_err(|_| {
            byte::Error::BadInput {
                err: "Unknown scan type",
            }
        })?;
        let request = Self {
            scan_type,
            scan_channels: bytes.read_with(offset, LE)?,
            scan_duration: bytes.read(offset)?,
            channel_page: bytes.read(offset)?,
        };
        Ok((request, *offset))
    }
}

impl TryWrite for ScanRequest {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.scan_type as u8)?;
        bytes.write_with(offset, self.scan_channels, LE)?;
        bytes.write(offset, self.scan_duration)?;
        bytes.write(offset, self.channel_page)?;
        Ok(*offset)
    }
}

/// The MLME-SCAN.confirm primitive reports the result of the channel scan request.
///
/// Only the list matching the scan type is put on the wire. An orphan scan carries no results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfirm {
    pub status: Status,
    pub scan_type: ScanType,
    pub channel_page: u8,
    /// Bitmap of the requested channels that were not scanned.
    pub unscanned_channels: u32,
    /// The list of energy measurements, one for each channel searched during an ED scan.
    pub energy_detect_list: ArrayVec<u8, MAX_ENERGY_READINGS>,
    /// The list of PAN descriptors, one for each beacon found during an active or passive scan
    /// if macAutoRequest is set to TRUE.
    pub pan_descriptor_list: ArrayVec<PanDescriptor, MAX_PAN_DESCRIPTORS>,
}

impl ScanConfirm {
    pub fn new(status: Status, scan_type: ScanType, channel_page: u8) -> Self {
        Self {
            status,
            scan_type,
            channel_page,
            unscanned_channels: 0,
            energy_detect_list: ArrayVec::new(),
            pan_descriptor_list: ArrayVec::new(),
        }
    }

    pub fn result_list_size(&self) -> usize {
        match self.scan_type {
            ScanType::Ed => self.energy_detect_list.len(),
            ScanType::Active | ScanType::Passive => self.pan_descriptor_list.len(),
            ScanType::Orphan => 0,
        }
    }
}

const TOO_MANY_RESULTS: byte::Error = byte::Error::BadInput {
    err: "Result list too long",
};

impl TryRead<'_> for ScanConfirm {
    fn try_read(bytes: &[u8], _ctx: ()) -> byte::Result<(Self, usize)> {
        let offset = &mut 0;
        let status = bytes.read(offset)?;
        let scan_type = ScanType::try_from(bytes.read::<u8>(offset)?).map_err(|_| {
            byte::Error::BadInput {
                err: "Unknown scan type",
            }
        })?;
        let channel_page = bytes.read(offset)?;

        let mut confirm = Self::new(status, scan_type, channel_page);
        confirm.unscanned_channels = bytes.read_with(offset, LE)?;
        let result_list_size = bytes.read::<u8>(offset)? as usize;

        match scan_type {
            ScanType::Ed => {
                for _ in 0..result_list_size {
                    confirm
                        .energy_detect_list
                        .try_push(bytes.read(offset)?)
                        .map_err(|_| TOO_MANY_RESULTS)?;
                }
            }
            ScanType::Active | ScanType::Passive => {
                check_exact_len(&bytes[*offset..], result_list_size * PAN_DESCRIPTOR_LEN)?;
                for _ in 0..result_list_size {
                    confirm
                        .pan_descriptor_list
                        .try_push(bytes.read(offset)?)
                        .map_err(|_| TOO_MANY_RESULTS)?;
                }
            }
            ScanType::Orphan => {}
        }

        check_exact_len(bytes, *offset)?;
        Ok((confirm, *offset))
    }
}

impl TryWrite for ScanConfirm {
    fn try_write(self, bytes: &mut [u8], _ctx: ()) -> byte::Result<usize> {
        let offset = &mut 0;
        bytes.write(offset, self.status)?;
        bytes.write(offset, self.scan_type as u8)?;
        bytes.write(offset, self.channel_page)?;
        bytes.write_with(offset, self.unscanned_channels, LE)?;
        bytes.write(offset, self.result_list_size() as u8)?;

        match self.scan_type {
            ScanType::Ed => bytes.write(offset, self.energy_detect_list.as_slice())?,
            ScanType::Active | ScanType::Passive => {
                for descriptor in self.pan_descriptor_list {
                    bytes.write(offset, descriptor)?;
                }
            }
            ScanType::Orphan => {}
        }

        Ok(*offset)
    }
}
