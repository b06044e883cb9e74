//! Unslotted CSMA-CA with acknowledged, retried delivery.
//!
//! One frame is on the air at a time. The engine is stepped from
//! [`Mac154::tick`](super::Mac154::tick) and never waits itself: backoffs and
//! the acknowledgment window are deadlines on the symbol clock.

use arraydeque::ArrayDeque;
use rand_core::RngCore;

use super::{
    callback::SendCallback,
    phy::Phy,
    state::{FrameBuffer, SEQUENCE_NUMBER_OFFSET},
};
use crate::{
    consts::UNIT_BACKOFF_PERIOD,
    pib::MacPib,
    radio::Radio,
    sap::Status,
    time::{Duration, Instant},
};

/// Frames that can wait behind the one being sent.
pub const CSMA_QUEUE_DEPTH: usize = 8;

/// Where the sequence number of a frame comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceNumbering {
    /// Take the next macDSN when the frame goes out for the first time.
    Dsn,
    /// Already decided, e.g. a BSN.
    Preassigned(u8),
}

pub struct Transmission {
    pub frame: FrameBuffer,
    pub ack_request: bool,
    pub sequence: SequenceNumbering,
    pub callback: SendCallback,
}

/// The end result of a transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxOutcome {
    pub status: Status,
    /// The frame pending bit of the acknowledgment.
    pub frame_pending: bool,
    /// When the frame went out, or when it was given up on.
    pub timestamp: Instant,
}

enum Phase {
    Backoff { until: Instant },
    AwaitAck { deadline: Instant, seq: u8 },
}

struct Active {
    transmission: Transmission,
    phase: Phase,
    /// NB: number of busy channel assessments in this attempt.
    backoffs: u8,
    /// BE: the current backoff exponent.
    exponent: u8,
    retries: u8,
    started: Instant,
    seq: Option<u8>,
    sent_at: Instant,
}

pub struct Csma {
    queue: ArrayDeque<Transmission, CSMA_QUEUE_DEPTH>,
    active: Option<Active>,
}

impl Csma {
    pub fn new() -> Self {
        Self {
            queue: ArrayDeque::new(),
            active: None,
        }
    }

    /// Queue a frame. Gives it back when the queue is full.
    pub fn enqueue(&mut self, transmission: Transmission) -> Result<(), Transmission> {
        self.queue.push_back(transmission).map_err(|e| e.element)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.queue.is_empty()
    }

    /// Is an acknowledgment expected right now?
    pub fn awaiting_ack(&self) -> bool {
        matches!(
            self.active,
            Some(Active {
                phase: Phase::AwaitAck { .. },
                ..
            })
        )
    }

    /// Forget everything, without reporting.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.active = None;
    }

    /// An acknowledgment frame was received.
    pub fn ack_received(&mut self, seq: u8, frame_pending: bool) -> Option<(SendCallback, TxOutcome)> {
        let active = self.active.as_ref()?;

        match active.phase {
            Phase::AwaitAck { seq: expected, .. } if expected == seq => {}
            _ => {
                trace!("Ignoring unexpected ack {}", seq);
                return None;
            }
        }

        let sent_at = active.sent_at;
        self.finish(TxOutcome {
            status: Status::Success,
            frame_pending,
            timestamp: sent_at,
        })
    }

    /// Advance the active transmission, or start the next one.
    ///
    /// Returns the callback and outcome of a transmission that ended.
    pub fn step<R: Radio>(
        &mut self,
        phy: &mut Phy<R>,
        mac_pib: &mut MacPib,
        rng: &mut impl RngCore,
        now: Instant,
    ) -> Option<(SendCallback, TxOutcome)> {
        if self.active.is_none() {
            let transmission = self.queue.pop_front()?;
            let mut active = Active {
                transmission,
                phase: Phase::Backoff { until: now },
                backoffs: 0,
                exponent: mac_pib.min_be,
                retries: 0,
                started: now,
                seq: None,
                sent_at: now,
            };
            active.phase = Phase::Backoff {
                until: now + backoff_delay(&active, mac_pib, rng),
            };
            self.active = Some(active);
        }

        let active = self.active.as_mut()?;

        match active.phase {
            Phase::Backoff { until } if until.has_passed(now) => {
                if !mac_pib.disable_cca {
                    match phy.clear_channel() {
                        Ok(true) => {}
                        Ok(false) => {
                            active.backoffs += 1;
                            active.exponent = (active.exponent + 1).min(mac_pib.max_be);
                            trace!("Channel busy, backoff {}", active.backoffs);

                            if active.backoffs > mac_pib.max_csma_backoffs {
                                return self.attempt_failed(
                                    Status::ChannelAccessFailure,
                                    mac_pib,
                                    rng,
                                    now,
                                );
                            }

                            active.phase = Phase::Backoff {
                                until: now + backoff_delay(active, mac_pib, rng),
                            };
                            return None;
                        }
                        Err(e) => {
                            error!("Clear channel assessment failed: {}", e);
                            return self.finish(failure(Status::PhyError, now));
                        }
                    }
                }

                self.transmit(phy, mac_pib, now)
            }
            Phase::Backoff { .. } => None,
            Phase::AwaitAck { deadline, .. } if deadline.has_passed(now) => {
                trace!("No ack received");
                self.attempt_failed(Status::NoAck, mac_pib, rng, now)
            }
            Phase::AwaitAck { .. } => None,
        }
    }

    fn transmit<R: Radio>(
        &mut self,
        phy: &mut Phy<R>,
        mac_pib: &mut MacPib,
        now: Instant,
    ) -> Option<(SendCallback, TxOutcome)> {
        let active = self.active.as_mut()?;

        let seq = match active.seq {
            Some(seq) => seq,
            None => {
                let seq = match active.transmission.sequence {
                    SequenceNumbering::Dsn => mac_pib.dsn.take(),
                    SequenceNumbering::Preassigned(seq) => seq,
                };
                if let Some(byte) = active.transmission.frame.get_mut(SEQUENCE_NUMBER_OFFSET) {
                    *byte = seq;
                }
                active.seq = Some(seq);
                seq
            }
        };

        let sent_at = match phy.transmit(&active.transmission.frame) {
            Ok(sent_at) => sent_at,
            Err(e) => {
                error!("Transmission failed: {}", e);
                return self.finish(failure(Status::PhyError, now));
            }
        };

        trace!("Sent frame {} at {}", seq, sent_at);

        if active.transmission.ack_request {
            active.sent_at = sent_at;
            active.phase = Phase::AwaitAck {
                deadline: sent_at + mac_pib.ack_wait_duration(),
                seq,
            };
            None
        } else {
            self.finish(TxOutcome {
                status: Status::Success,
                frame_pending: false,
                timestamp: sent_at,
            })
        }
    }

    /// One attempt ran out of backoffs or acknowledgment time. Retry if allowed.
    fn attempt_failed(
        &mut self,
        status: Status,
        mac_pib: &MacPib,
        rng: &mut impl RngCore,
        now: Instant,
    ) -> Option<(SendCallback, TxOutcome)> {
        let active = self.active.as_mut()?;

        if active.retries >= mac_pib.max_frame_retries {
            return self.finish(failure(status, now));
        }

        if now.duration_since(active.started) > mac_pib.max_frame_total_wait_time() {
            debug!("Giving up after {}", now.duration_since(active.started));
            return self.finish(failure(Status::TransactionExpired, now));
        }

        active.retries += 1;
        active.backoffs = 0;
        active.exponent = mac_pib.min_be;
        active.phase = Phase::Backoff {
            until: now + backoff_delay(active, mac_pib, rng),
        };
        debug!("Retry {} after {:?}", active.retries, status);

        None
    }

    fn finish(&mut self, outcome: TxOutcome) -> Option<(SendCallback, TxOutcome)> {
        let active = self.active.take()?;
        Some((active.transmission.callback, outcome))
    }
}

fn failure(status: Status, now: Instant) -> TxOutcome {
    TxOutcome {
        status,
        frame_pending: false,
        timestamp: now,
    }
}

/// A random number of backoff periods in `0..2^BE`.
fn backoff_delay(active: &Active, mac_pib: &MacPib, rng: &mut impl RngCore) -> Duration {
    if mac_pib.disable_cca {
        return Duration::ZERO;
    }

    let periods = rng.next_u32() as u64 % (1u64 << active.exponent);
    Duration::from_symbols(periods * UNIT_BACKOFF_PERIOD as u64)
}
