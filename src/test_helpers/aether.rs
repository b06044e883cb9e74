//! Radio simulation infrastructure
//!
//! This module provides a simulated [Aether](https://en.wikipedia.org/wiki/Luminiferous_aether) to connect several radios.
//! All radios share one symbol clock that only moves when the test calls [`Aether::advance`].
//! A frame sent on a channel lands in the [`RxQueue`] of every other radio that listens on that channel.
//!
//! # Example
//! ```
//! use lr_wpan_mac154::radio::Radio;
//! use lr_wpan_mac154::test_helpers::aether::Aether;
//!
//! let mut aether = Aether::new();
//!
//! // Create two new radios connected to the aether
//! let mut alice = aether.radio();
//! let mut bob = aether.radio();
//!
//! bob.set_receiver(true).unwrap();
//!
//! alice.transmit(b"Hello, world!").unwrap();
//!
//! assert_eq!(bob.rx_queue().len(), 1);
//! assert!(alice.rx_queue().is_empty());
//! ```

use std::{
    borrow::Cow,
    collections::HashMap,
    fs::File,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use byte::TryRead;
use ieee802154::mac::Frame;
use pcap_file::{
    pcapng::{
        blocks::{
            enhanced_packet::EnhancedPacketBlock,
            interface_description::{InterfaceDescriptionBlock, InterfaceDescriptionOption},
        },
        Block, PcapNgReader, PcapNgWriter,
    },
    DataLink,
};

use crate::{
    consts::{MAX_PHY_PACKET_SIZE, MIN_CHANNEL},
    radio::DriverOptions,
    rx_queue::RxQueue,
    time::{Duration, Instant},
};

mod radio;

pub use radio::{AetherError, AetherRadio};

/// The link quality every received frame gets.
pub const LINK_QUALITY: u8 = 0xFF;

/// A medium to which radios are connected
///
/// This takes care of routing the frames to the right radios.
pub struct Aether {
    inner: Arc<Mutex<AetherInner>>,
}

impl Default for Aether {
    fn default() -> Self {
        Self::new()
    }
}

impl Aether {
    /// Create a new empty aether
    pub fn new() -> Self {
        let inner = AetherInner {
            nodes: Default::default(),
            now: Instant::default(),
            frames: Vec::new(),
            busy_channels: 0,
            energy: HashMap::new(),
            cca_count: 0,
            broken: false,
            pcap_dump: None,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Create a radio which lives in the Aether
    pub fn radio(&mut self) -> AetherRadio {
        let rx_queue = Arc::new(RxQueue::new());
        let node = Node {
            channel: MIN_CHANNEL,
            rx_enable: false,
            driver_options: DriverOptions::default(),
            rx_queue: Arc::clone(&rx_queue),
        };
        let inner = Arc::clone(&self.inner);
        let node_id = NodeId::new();

        let old = self.inner().nodes.insert(node_id.clone(), node);
        assert!(old.is_none(), "node_id must be unique");

        AetherRadio {
            inner,
            node_id,
            rx_queue,
        }
    }

    pub fn now(&self) -> Instant {
        self.inner().now
    }

    /// Let time pass.
    pub fn advance(&mut self, duration: Duration) {
        self.inner().now += duration;
    }

    /// Everything that was sent so far, oldest first.
    pub fn frames(&self) -> Vec<AirFrame> {
        self.inner().frames.clone()
    }

    pub fn frames_sent(&self) -> usize {
        self.inner().frames.len()
    }

    /// A busy channel fails every clear channel assessment.
    pub fn set_channel_busy(&mut self, channel: u8, busy: bool) {
        let mut inner = self.inner();
        if busy {
            inner.busy_channels |= 1 << channel;
        } else {
            inner.busy_channels &= !(1 << channel);
        }
    }

    /// The reading energy detection gives on the channel.
    pub fn set_channel_energy(&mut self, channel: u8, energy: u8) {
        self.inner().energy.insert(channel, energy);
    }

    /// The number of clear channel assessments made by all radios.
    pub fn cca_count(&self) -> usize {
        self.inner().cca_count
    }

    /// While broken, every radio operation fails.
    pub fn set_broken(&mut self, broken: bool) {
        self.inner().broken = broken;
    }

    /// Put a frame on the air that no radio of this aether sent.
    pub fn inject(&mut self, channel: u8, data: &[u8]) {
        self.inner().send(None, channel, data);
    }

    pub fn start_trace(&mut self, file: File) {
        self.inner().start_trace(file);
    }

    pub fn stop_trace(&mut self) {
        self.inner().stop_trace();
    }

    pub fn parse_trace(&mut self, file: File) -> impl Iterator<Item = Frame<'static>> {
        let mut reader = PcapNgReader::new(file).unwrap();
        let mut current_data_link = DataLink::IEEE802_15_4_NOFCS;

        std::iter::from_fn(move || {
            while let Some(b) = reader.next_block() {
                let block = b.unwrap();

                match block {
                    Block::InterfaceDescription(interface_description_block) => {
                        current_data_link = interface_description_block.linktype
                    }
                    Block::EnhancedPacket(enhanced_packet_block) => {
                        if current_data_link != DataLink::IEEE802_15_4_NOFCS {
                            continue;
                        }
                        return Some(
                            Frame::try_read(
                                enhanced_packet_block.data.to_vec().leak(),
                                ieee802154::mac::FooterMode::None,
                            )
                            .unwrap()
                            .0,
                        );
                    }
                    _ => continue,
                }
            }

            None
        })
    }

    fn inner(&self) -> MutexGuard<AetherInner> {
        self.inner.lock().unwrap()
    }
}

pub struct AetherInner {
    nodes: HashMap<NodeId, Node>,
    now: Instant,
    frames: Vec<AirFrame>,
    /// Bitmap of channels that fail CCA.
    busy_channels: u32,
    energy: HashMap<u8, u8>,
    cca_count: usize,
    broken: bool,
    pcap_dump: Option<(PcapNgWriter<File>, HashMap<Option<NodeId>, u32>)>,
}

impl AetherInner {
    pub fn start_trace(&mut self, file: File) {
        if self.pcap_dump.is_some() {
            panic!("Already capturing pcap");
        }
        self.pcap_dump = Some((PcapNgWriter::new(file).unwrap(), HashMap::new()));
    }

    pub fn stop_trace(&mut self) {
        self.pcap_dump = None;
    }

    fn trace(&mut self, node_id: &Option<NodeId>, frame: &AirFrame) {
        let Some((pcap, nodes)) = &mut self.pcap_dump else {
            return;
        };

        let len = nodes.len();
        let interface_id = *nodes.entry(node_id.clone()).or_insert_with(|| {
            pcap.write_pcapng_block(InterfaceDescriptionBlock {
                linktype: DataLink::IEEE802_15_4_NOFCS,
                snaplen: MAX_PHY_PACKET_SIZE as u32,
                options: vec![InterfaceDescriptionOption::IfName(
                    format!("{node_id:?}").into(),
                )],
            })
            .unwrap();

            len as u32
        });

        let block = EnhancedPacketBlock {
            interface_id,
            timestamp: frame.time.duration_since(Instant::default()).into_std(),
            original_len: frame.data.len() as u32,
            data: Cow::Borrowed(frame.data.as_ref()),
            options: vec![],
        };
        pcap.write_pcapng_block(block).unwrap();
    }

    fn send(&mut self, from: Option<NodeId>, channel: u8, data: &[u8]) -> Instant {
        let frame = AirFrame {
            time: self.now,
            channel,
            from: from.clone(),
            data: data.to_vec(),
        };
        self.trace(&from, &frame);

        for (to, node) in &self.nodes {
            if from.as_ref() == Some(to) || !node.rx_enable || node.channel != channel {
                continue;
            }

            node.rx_queue.push(data, LINK_QUALITY, self.now);
        }

        self.frames.push(frame);
        self.now
    }

    fn clear_channel(&mut self, channel: u8) -> bool {
        self.cca_count += 1;
        self.busy_channels & (1 << channel) == 0
    }
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Clone)]
pub struct NodeId(usize);

impl NodeId {
    fn new() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct Node {
    channel: u8,
    rx_enable: bool,
    driver_options: DriverOptions,
    rx_queue: Arc<RxQueue>,
}

/// A frame as it went over the air.
#[derive(Debug, Clone)]
pub struct AirFrame {
    pub time: Instant,
    pub channel: u8,
    /// `None` for injected frames.
    pub from: Option<NodeId>,
    pub data: Vec<u8>,
}
