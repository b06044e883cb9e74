use arrayvec::ArrayVec;

use super::{
    callback::SendCallback,
    csma::{SequenceNumbering, Transmission},
    host::HostLink,
    phy::Phy,
    state::{frame_header, serialize_frame, MacState},
};
use crate::{
    consts::{self, MAX_SCAN_DURATION, SUPPORTED_CHANNELS},
    pib::MacPib,
    radio::Radio,
    rx_queue::RawFrame,
    sap::{
        beacon_notify::BeaconNotifyIndication,
        scan::{ScanConfirm, ScanRequest, ScanType},
        PanDescriptor, Status,
    },
    time::{Duration, Instant},
    wire::{
        command::{Command, CoordinatorRealignmentData},
        Address, Frame, FrameContent, FrameType, PanId, ShortAddress,
    },
};

/// A running scan.
///
/// Channels are scanned from low to high. Every channel gets its own dwell
/// period, after which [advance_scan] moves on to the next one. Beacons and
/// realignments come in through the receive path while a channel dwells.
#[derive(Debug)]
pub struct ScanProcess {
    scan_type: ScanType,
    scan_duration: u8,
    /// Work in progress result that we'll send back to the host.
    /// Its unscanned channels are the requested ones that weren't (successfully) visited.
    results: ScanConfirm,
    /// Requested channels that haven't been visited yet.
    remaining: u32,
    /// The channel we're on and when we leave it.
    current: Option<(u8, Instant)>,
    /// Highest energy reading on the current channel.
    energy: u8,
    /// Cache of the pan id and channel we need to restore at the end.
    original_pan_id: PanId,
    original_channel: u8,
}

impl ScanProcess {
    pub fn scan_type(&self) -> ScanType {
        self.scan_type
    }

    /// The channel being scanned, if a dwell period is running.
    pub fn current_channel(&self) -> Option<u8> {
        self.current.map(|(channel, _)| channel)
    }

    /// Does this scan need the receiver?
    pub fn listens(&self) -> bool {
        self.scan_type != ScanType::Ed
    }

    /// End the scan at the next [advance_scan] with the given status.
    fn cut_short(&mut self, status: Status, now: Instant) {
        self.results.status = status;
        self.results.unscanned_channels |= self.remaining;
        self.remaining = 0;
        if let Some((channel, _)) = self.current {
            self.current = Some((channel, now));
        }
    }
}

pub fn process_scan_request<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    request: ScanRequest,
    now: Instant,
) {
    debug!("Scan request: {:?} over {:#x}", request.scan_type, request.scan_channels);

    // Only one scan can be in progress at a time
    if mac_state.pending.scan.is_busy() {
        host.event(ScanConfirm::new(
            Status::ScanInProgress,
            request.scan_type,
            request.channel_page,
        ));
        return;
    }

    let bad_duration =
        request.scan_type != ScanType::Orphan && request.scan_duration > MAX_SCAN_DURATION;
    if request.scan_channels & !SUPPORTED_CHANNELS != 0 || request.channel_page != 0 || bad_duration
    {
        host.event(ScanConfirm::new(
            Status::InvalidParameter,
            request.scan_type,
            request.channel_page,
        ));
        return;
    }

    let mut results = ScanConfirm::new(Status::Success, request.scan_type, request.channel_page);
    results.unscanned_channels = request.scan_channels;

    let process = ScanProcess {
        scan_type: request.scan_type,
        scan_duration: request.scan_duration,
        results,
        remaining: request.scan_channels,
        current: None,
        energy: 0,
        original_pan_id: mac_pib.pan_id,
        original_channel: phy.pib().current_channel,
    };

    if mac_state.pending.scan.arm(process).is_err() {
        return;
    }

    if let ScanType::Passive | ScanType::Active = request.scan_type {
        mac_pib.pan_id = PanId::broadcast();
    }

    // Starts the first channel right away
    advance_scan(phy, mac_pib, mac_state, host, now);
}

/// Sample energy, and move to the next channel when the dwell period is over.
pub fn advance_scan<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    now: Instant,
) {
    let Some(process) = mac_state.pending.scan.context_mut() else {
        return;
    };

    if let Some((_, end_time)) = process.current {
        if process.scan_type == ScanType::Ed {
            match phy.energy_detect() {
                Ok(energy) => process.energy = process.energy.max(energy),
                Err(e) => {
                    error!("Energy detection failed: {}", e);
                    process.cut_short(Status::PhyError, now);
                }
            }
        }

        if !end_time.has_passed(now) && process.results.status == Status::Success {
            return;
        }

        if process.scan_type == ScanType::Ed && process.results.status == Status::Success {
            // One reading per channel, can't overflow
            let _ = process.results.energy_detect_list.try_push(process.energy);
        }
        process.current = None;
    }

    loop {
        let Some(process) = mac_state.pending.scan.context_mut() else {
            return;
        };

        if process.remaining == 0 {
            finish_scan(phy, mac_pib, mac_state, host);
            return;
        }

        let channel = process.remaining.trailing_zeros() as u8;
        process.remaining &= !(1 << channel);

        if start_channel(phy, mac_pib, mac_state, channel, now) {
            return;
        }
    }
}

/// Tune to the channel and send what the scan type needs there.
///
/// Returns false when the channel was skipped.
fn start_channel<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    channel: u8,
    now: Instant,
) -> bool {
    let MacState { csma, pending, .. } = mac_state;
    let Some(process) = pending.scan.context_mut() else {
        return false;
    };

    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = channel) {
        error!("Could not switch to channel {}: {}", channel, e);
        return false;
    }

    trace!("Scanning channel {}", channel);

    let dwell = match process.scan_type {
        ScanType::Orphan => mac_pib.response_wait_time(),
        _ => Duration::from_base_superframes((1 << process.scan_duration as u64) + 1),
    };

    process.results.unscanned_channels &= !(1 << channel);
    process.current = Some((channel, now + dwell));
    process.energy = 0;

    let command = match process.scan_type {
        ScanType::Ed | ScanType::Passive => return true,
        ScanType::Active => Frame {
            header: frame_header(
                FrameType::MacCommand,
                false,
                Some(Address::Short(PanId::broadcast(), ShortAddress::BROADCAST)),
                None,
            ),
            content: FrameContent::Command(Command::BeaconRequest),
            payload: &[],
            footer: [0, 0],
        },
        ScanType::Orphan => Frame {
            header: frame_header(
                FrameType::MacCommand,
                false,
                Some(Address::Short(PanId::broadcast(), ShortAddress::BROADCAST)),
                Some(Address::Extended(PanId::broadcast(), mac_pib.extended_address)),
            ),
            content: FrameContent::Command(Command::OrphanNotification),
            payload: &[],
            footer: [0, 0],
        },
    };

    let queued = serialize_frame(command).ok().is_some_and(|frame| {
        csma.enqueue(Transmission {
            frame,
            ack_request: false,
            sequence: SequenceNumbering::Dsn,
            callback: SendCallback::ScanCommand { channel },
        })
        .is_ok()
    });

    if !queued {
        warn!("Could not queue the scan command for channel {}", channel);
        process.results.unscanned_channels |= 1 << channel;
    }

    true
}

/// The beacon request or orphan notification for a channel never made it out.
pub fn scan_command_failed(mac_state: &mut MacState, channel: u8, status: Status) {
    if let Some(process) = mac_state.pending.scan.context_mut() {
        debug!("Scan command on channel {} failed: {:?}", channel, status);
        process.results.unscanned_channels |= 1 << channel;
    }
}

/// Drop a running scan without a confirm, putting back the pan id and channel it borrowed.
pub fn abandon_scan<R: Radio>(phy: &mut Phy<R>, mac_pib: &mut MacPib, mac_state: &mut MacState) {
    let Some(process) = mac_state.pending.scan.complete() else {
        return;
    };

    debug!("Abandoning {:?} scan", process.scan_type);

    if let ScanType::Active | ScanType::Passive = process.scan_type {
        mac_pib.pan_id = process.original_pan_id;
    }

    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = process.original_channel)
    {
        error!("Could not restore the channel of the abandoned scan: {}", e);
    }
}

fn finish_scan<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
) {
    let Some(process) = mac_state.pending.scan.complete() else {
        return;
    };

    let mut results = process.results;

    match process.scan_type {
        ScanType::Active | ScanType::Passive => mac_pib.pan_id = process.original_pan_id,
        // We only get here without a realignment
        ScanType::Orphan if results.status == Status::Success => results.status = Status::NoBeacon,
        _ => {}
    }

    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = process.original_channel)
    {
        error!("Could not restore the channel after the scan: {}", e);
    }

    debug!(
        "Scan finished: {:?} with {} results",
        results.status,
        results.result_list_size()
    );

    host.event(results);
}

/// A beacon came in. Records it for a running active or passive scan, and tells the host when needed.
pub fn process_received_beacon(
    mac_pib: &MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    frame: &Frame<'_>,
    raw_frame: &RawFrame,
    channel: u8,
) {
    let FrameContent::Beacon(beacon) = &frame.content else {
        return;
    };

    let Some(coord_address) = frame.header.source else {
        trace!("Ignoring beacon without source address");
        return;
    };

    let pan_descriptor = PanDescriptor {
        coord_address,
        channel_number: channel,
        channel_page: 0,
        super_frame_spec: beacon.superframe_spec,
        gts_permit: beacon.guaranteed_time_slot_info.permit,
        link_quality: raw_frame.link_quality,
        timestamp: raw_frame.timestamp,
    };

    let scanning = mac_state
        .pending
        .scan
        .context_mut()
        .filter(|process| matches!(process.scan_type, ScanType::Active | ScanType::Passive));

    if let (true, Some(process)) = (mac_pib.auto_request, scanning) {
        // Ignore duplicates
        let duplicate = process
            .results
            .pan_descriptor_list
            .iter()
            .any(|descriptor| descriptor.coord_address == coord_address && descriptor.channel_number == channel);

        if !duplicate {
            if process.results.pan_descriptor_list.is_full() {
                process.cut_short(Status::LimitReached, raw_frame.timestamp);
            } else {
                trace!("Found a PAN on channel {}", channel);
                process.results.pan_descriptor_list.push(pan_descriptor.clone());
            }
        }
    }

    if !mac_pib.auto_request || !frame.payload.is_empty() {
        let mut sdu = ArrayVec::new();
        // A received beacon payload never exceeds the maximum
        let _ = sdu.try_extend_from_slice(&frame.payload[..frame.payload.len().min(consts::MAX_BEACON_PAYLOAD_LENGTH)]);

        host.event(BeaconNotifyIndication {
            bsn: frame.header.seq,
            pan_descriptor,
            sdu,
        });
    }
}

/// A coordinator realignment arrived. Ends a running orphan scan.
///
/// Returns false when no orphan scan was waiting for it.
pub fn process_realignment<R: Radio>(
    phy: &mut Phy<R>,
    mac_pib: &mut MacPib,
    mac_state: &mut MacState,
    host: &mut HostLink,
    realignment: &CoordinatorRealignmentData,
    source: Option<Address>,
) -> bool {
    let orphan_scan = mac_state
        .pending
        .scan
        .context()
        .is_some_and(|process| process.scan_type == ScanType::Orphan);

    if !orphan_scan {
        return false;
    }

    let Some(process) = mac_state.pending.scan.complete() else {
        return false;
    };

    info!("Realigned with our coordinator");

    mac_pib.pan_id = realignment.pan_id;
    mac_pib.coord_short_address = realignment.coordinator_address;
    mac_pib.short_address = realignment.device_address;
    if let Some(Address::Extended(_, coord_extended_address)) = source {
        mac_pib.coord_extended_address = coord_extended_address;
    }

    let mut results = process.results;
    results.unscanned_channels |= process.remaining;

    if let Err(e) = phy.update_phy_pib(|phy_pib| phy_pib.current_channel = realignment.channel) {
        error!("Could not switch to the realigned channel: {}", e);
        results.status = Status::PhyError;
    }

    host.event(results);
    true
}
