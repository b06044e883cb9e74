use core::fmt::{Debug, Display};

use rand_core::RngCore;

use crate::{
    chci::{ChciError, ChciHeader, Command, CommandCode, Data},
    consts,
    pib::{MacPib, PhyPib, PibBytes},
    radio::{DriverOptions, Radio},
    registry::{DataHandler, EventHandler, RawFrameHandler, Registration},
    rx_queue::RxQueue,
    sap::{
        associate::AssociateConfirm,
        comm_status::CommStatusIndication,
        data::{DataConfirm, MSDU_HANDLE_OFFSET},
        disassociate::DisassociateConfirm,
        get::GetConfirm,
        poll::PollConfirm,
        purge::PurgeConfirm,
        reset::ResetConfirm,
        rx_enable::RxEnableConfirm,
        scan::{ScanConfirm, ScanType},
        set::SetConfirm,
        start::StartConfirm,
        Status,
    },
    time::Instant,
    wire::{ExtendedAddress, ShortAddress},
};

mod callback;
mod csma;
mod host;
mod indirect;
mod mcps_data;
mod mlme_associate;
mod mlme_disassociate;
mod mlme_get;
mod mlme_orphan;
mod mlme_poll;
mod mlme_reset;
mod mlme_scan;
mod mlme_set;
mod mlme_start;
mod pending;
mod phy;
mod receive;
mod rx_enable;
mod state;

use callback::SendCallback;
use csma::TxOutcome;
pub use host::{HostMessage, HOST_OUTBOX_DEPTH};
use host::HostLink;
pub use indirect::INDIRECT_QUEUE_DEPTH;
use phy::Phy;
use state::MacState;

/// Configuration for the MAC layer
#[derive(Debug, Clone)]
pub struct MacConfig<Rng: RngCore> {
    /// The unique EUI-64 address used by the mac layer
    pub extended_address: ExtendedAddress,
    /// Seeds the sequence numbers and draws the CSMA backoffs.
    pub rng: Rng,
}

#[derive(Debug)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum MacError<PE> {
    PhyError(PE),
}

impl<PE: Debug> Display for MacError<PE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl<PE: Debug> core::error::Error for MacError<PE> {}

impl<PE> From<PE> for MacError<PE> {
    fn from(v: PE) -> Self {
        Self::PhyError(v)
    }
}

/// One IEEE 802.15.4 MAC instance.
///
/// Nothing in here blocks or sleeps. Host messages are handled the moment they
/// come in; everything that takes time (backoffs, ack waits, scans, response
/// timeouts) advances on [`Self::tick`], which should be called at least once
/// per unit backoff period (20 symbols) and whenever the radio pushed a frame
/// into the [`RxQueue`].
pub struct Mac154<'a, R: Radio, Rng: RngCore> {
    phy: Phy<R>,
    mac_pib: MacPib,
    mac_state: MacState,
    host: HostLink<'a>,
    rx_queue: &'a RxQueue,
    rng: Rng,
    /// Without it the CHCI entry points refuse every message.
    handler_installed: bool,
}

impl<'a, R: Radio, Rng: RngCore> Mac154<'a, R, Rng> {
    /// Bring up the radio and the MAC with default attributes.
    ///
    /// When `init_handler` is false the MAC runs without its CHCI dispatcher:
    /// [`Self::invoke_cmd_handler`] and [`Self::invoke_data_handler`] then
    /// return false for everything.
    pub fn init(
        radio: R,
        rx_queue: &'a RxQueue,
        mut config: MacConfig<Rng>,
        init_handler: bool,
    ) -> Result<Self, MacError<R::Error>> {
        let mut phy = Phy::new(radio);
        phy.reset()?;
        phy.sync(false)?;

        rx_queue.clear();

        let mac_pib = MacPib::new(config.extended_address, &mut config.rng);

        info!(
            "MAC initialized with extended address {:#x}",
            config.extended_address.0
        );

        Ok(Self {
            phy,
            mac_pib,
            mac_state: MacState::new(),
            host: HostLink::new(),
            rx_queue,
            rng: config.rng,
            handler_installed: init_handler,
        })
    }

    /// Turn the receiver off and release all state. Gives back the radio.
    pub fn deinit(mut self) -> R {
        if let Err(e) = self.phy.sync(false) {
            error!("Could not turn the receiver off: {}", e);
        }

        self.host.registry.clear();
        self.host.clear_outbox();
        self.rx_queue.clear();

        info!("MAC deinitialized");

        self.phy.into_radio()
    }

    pub const fn version() -> u16 {
        consts::MAC_154_VERSION
    }

    /// Handle a management command from the host.
    ///
    /// Returns false when the opcode is unknown or the header length doesn't
    /// match the payload. Every other failure is reported in the confirm.
    pub fn invoke_cmd_handler(&mut self, header: &ChciHeader, payload: &[u8]) -> bool {
        if !self.handler_installed {
            return false;
        }

        match Command::decode(header, payload) {
            Ok(command) => {
                trace!("Command {:?}", command.code());
                self.handle_command(command);
                true
            }
            Err(ChciError::Malformed(code)) => {
                warn!("Malformed payload for command {:#x}", code);
                self.reject_command(code, payload);
                true
            }
            Err(e) => {
                warn!("Rejected command: {}", e);
                false
            }
        }
    }

    /// Handle a data request from the host.
    pub fn invoke_data_handler(&mut self, header: &ChciHeader, payload: &[u8]) -> bool {
        if !self.handler_installed {
            return false;
        }

        match Data::decode(header, payload) {
            Ok(Data::Request(request)) => {
                let now = self.phy.now();
                mcps_data::process_data_request(
                    &mut self.mac_pib,
                    &mut self.mac_state,
                    &mut self.host,
                    request,
                    now,
                );
                true
            }
            Ok(Data::Indication(_)) => {
                warn!("The host sent a data indication");
                false
            }
            Err(ChciError::Malformed(_)) => {
                warn!("Malformed data request");
                let now = self.phy.now();
                self.host.event(DataConfirm {
                    msdu_handle: payload.get(MSDU_HANDLE_OFFSET).copied().unwrap_or(0),
                    status: Status::InvalidParameter,
                    timestamp: now,
                });
                true
            }
            Err(e) => {
                warn!("Rejected data message: {}", e);
                false
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        let now = self.phy.now();

        match command {
            Command::Associate(request) => mlme_associate::process_associate_request(
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                request,
            ),
            Command::AssociateResponse(response) => mlme_associate::process_associate_response(
                &self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                response,
                now,
            ),
            Command::Disassociate(request) => mlme_disassociate::process_disassociate_request(
                &self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                request,
                now,
            ),
            Command::Get(request) => {
                mlme_get::process_get_request(&self.phy, &self.mac_pib, &mut self.host, request)
            }
            Command::OrphanResponse(response) => {
                let channel = self.phy.pib().current_channel;
                mlme_orphan::process_orphan_response(
                    &self.mac_pib,
                    &mut self.mac_state,
                    &mut self.host,
                    response,
                    channel,
                )
            }
            Command::Reset(request) => {
                self.rx_queue.clear();
                mlme_reset::process_reset_request(
                    &mut self.phy,
                    &mut self.mac_pib,
                    &mut self.mac_state,
                    &mut self.host,
                    &mut self.rng,
                    request,
                )
            }
            Command::RxEnable(request) => {
                let status = self
                    .mac_state
                    .rx_enable
                    .request(request.flags, request.rx_on_duration, now);
                self.host.event(RxEnableConfirm { status });
            }
            Command::Scan(request) => mlme_scan::process_scan_request(
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                request,
                now,
            ),
            Command::Set(request) => mlme_set::process_set_request(
                &mut self.phy,
                &mut self.mac_pib.pib_write,
                &mut self.host,
                request,
            ),
            Command::Start(request) => mlme_start::process_start_request(
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                request,
            ),
            Command::Poll(request) => mlme_poll::process_poll_request(
                &self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                request,
            ),
            Command::Purge(request) => {
                mcps_data::process_purge_request(&mut self.mac_state, &mut self.host, request)
            }
        }

        self.apply_receiver(now);
    }

    /// Answer a command whose payload didn't parse.
    fn reject_command(&mut self, code: u8, payload: &[u8]) {
        let Ok(code) = CommandCode::try_from(code) else {
            return;
        };

        let status = Status::InvalidParameter;
        let first_byte = payload.first().copied().unwrap_or(0);
        let comm_status = CommStatusIndication {
            pan_id: self.mac_pib.pan_id,
            src_address: None,
            dst_address: None,
            status,
        };

        match code {
            CommandCode::AssociateRequest => self.host.event(AssociateConfirm {
                assoc_short_address: ShortAddress::BROADCAST,
                status,
            }),
            CommandCode::AssociateResponse | CommandCode::OrphanResponse => {
                self.host.event(comm_status)
            }
            CommandCode::DisassociateRequest => self.host.event(DisassociateConfirm {
                status,
                device_address: None,
            }),
            CommandCode::GetRequest => self.host.event(GetConfirm {
                status,
                pib_attribute: first_byte,
                value: PibBytes::new(),
            }),
            CommandCode::ResetRequest => self.host.event(ResetConfirm { status }),
            CommandCode::RxEnableRequest => self.host.event(RxEnableConfirm { status }),
            CommandCode::ScanRequest => {
                let scan_type = ScanType::try_from(first_byte).unwrap_or(ScanType::Ed);
                self.host.event(ScanConfirm::new(status, scan_type, 0))
            }
            CommandCode::SetRequest => self.host.event(SetConfirm {
                status,
                pib_attribute: first_byte,
            }),
            CommandCode::StartRequest => self.host.event(StartConfirm { status }),
            CommandCode::PollRequest => self.host.event(PollConfirm { status }),
            CommandCode::PurgeRequest => self.host.event(PurgeConfirm {
                msdu_handle: first_byte,
                status,
            }),
        }
    }

    /// Advance the MAC to the radio's current time.
    ///
    /// Processes the frames waiting in the RX queue, runs the channel access of
    /// queued frames and ends the procedures whose time is up.
    pub fn tick(&mut self) {
        let now = self.phy.now();

        while let Some(raw_frame) = self.rx_queue.pop() {
            receive::process_raw_frame(
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                &raw_frame,
                now,
            );
        }

        mlme_scan::advance_scan(
            &mut self.phy,
            &mut self.mac_pib,
            &mut self.mac_state,
            &mut self.host,
            now,
        );
        mlme_associate::advance_association(
            &mut self.mac_pib,
            &mut self.mac_state,
            &mut self.host,
            now,
        );
        mlme_poll::expire_poll(&mut self.mac_state, &mut self.host, now);
        self.expire_indirect(now);
        self.mac_state.rx_enable.expire(now);

        self.run_csma(now);
        self.apply_receiver(now);
    }

    fn run_csma(&mut self, now: Instant) {
        while let Some((callback, outcome)) =
            self.mac_state
                .csma
                .step(&mut self.phy, &mut self.mac_pib, &mut self.rng, now)
        {
            callback.run(
                outcome,
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                now,
            );
        }
    }

    fn expire_indirect(&mut self, now: Instant) {
        while let Some(transaction) = self.mac_state.indirect.take_expired(now) {
            debug!("Indirect transaction expired");

            SendCallback::from(transaction.kind).run(
                TxOutcome {
                    status: Status::TransactionExpired,
                    frame_pending: false,
                    timestamp: now,
                },
                &mut self.phy,
                &mut self.mac_pib,
                &mut self.mac_state,
                &mut self.host,
                now,
            );
        }
    }

    /// Should the receiver be on right now?
    ///
    /// On top of the host's wish, the MAC itself listens while it waits for an
    /// ack or a response, scans, or serves a PAN.
    fn receiver_wanted(&self, now: Instant) -> bool {
        self.rx_enabled_at(now)
            || self.mac_state.is_coordinator
            || self.mac_state.csma.awaiting_ack()
            || self.mac_state.pending.expects_frames()
            || self.mac_pib.promiscuous_mode
            || self.mac_pib.raw_rx
    }

    fn rx_enabled_at(&self, now: Instant) -> bool {
        self.mac_pib.rx_on_when_idle || self.mac_state.rx_enable.is_window_active(now)
    }

    fn apply_receiver(&mut self, now: Instant) {
        let wanted = self.receiver_wanted(now);

        if let Err(e) = self.phy.sync(wanted) {
            error!("Could not update the receiver: {}", e);
        }

        if let Err(e) = self.phy.set_driver_options(self.driver_options()) {
            error!("Could not update the driver options: {}", e);
        }
    }

    fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            crc_override: self.mac_pib.crc_override,
            device_type: self.mac_pib.device_type,
        }
    }

    /// Re-evaluate the receiver state and apply it to the radio.
    pub fn start_rx(&mut self) -> Result<(), MacError<R::Error>> {
        let now = self.phy.now();
        let wanted = self.receiver_wanted(now);
        self.phy.sync(wanted)?;
        self.phy.set_driver_options(self.driver_options())?;
        Ok(())
    }

    /// True when `rxOnWhenIdle` is set or an RX enable window is open.
    pub fn is_rx_enabled(&self) -> bool {
        self.rx_enabled_at(self.phy.now())
    }

    pub fn set_ext_addr(&mut self, extended_address: ExtendedAddress) {
        debug!("Extended address set to {:#x}", extended_address.0);
        self.mac_pib.extended_address = extended_address;
    }

    pub fn register_raw_frame_handler(&mut self, handler: impl RawFrameHandler + 'a) -> Registration {
        self.host.registry.register_raw_frame_handler(handler)
    }

    pub fn register_data_handler(&mut self, handler: impl DataHandler + 'a) -> Registration {
        self.host.registry.register_data_handler(handler)
    }

    pub fn register_event_handler(&mut self, handler: impl EventHandler + 'a) -> Registration {
        self.host.registry.register_event_handler(handler)
    }

    /// Remove a handler. Returns false when it was already replaced or revoked.
    pub fn revoke(&mut self, registration: Registration) -> bool {
        self.host.registry.revoke(registration)
    }

    /// The next message the handlers declined.
    pub fn take_host_message(&mut self) -> Option<HostMessage> {
        self.host.take_message()
    }

    pub fn pib(&self) -> &MacPib {
        &self.mac_pib
    }

    /// Direct access to the attributes. Nothing is validated; prefer SET.
    pub fn pib_mut(&mut self) -> &mut MacPib {
        &mut self.mac_pib
    }

    pub fn phy_pib(&self) -> &PhyPib {
        self.phy.pib()
    }

    /// Changes reach the radio on the next [`Self::tick`] or [`Self::start_rx`].
    pub fn phy_pib_mut(&mut self) -> &mut PhyPib {
        self.phy.pib_mut()
    }

    pub fn now(&self) -> Instant {
        self.phy.now()
    }
}
