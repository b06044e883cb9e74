use std::{cell::RefCell, rc::Rc, sync::Arc};

use rand::{rngs::StdRng, SeedableRng};

use super::aether::{Aether, AetherRadio};
use crate::{
    chci::{ChciHeader, Command, Data, Event},
    consts::UNIT_BACKOFF_PERIOD,
    mac::{Mac154, MacConfig},
    rx_queue::RxQueue,
    sap::data::{DataIndication, DataRequest},
    time::Duration,
    wire::ExtendedAddress,
};

pub type TestMac = Mac154<'static, AetherRadio, StdRng>;

/// A MAC on the aether, with everything it told its host.
pub struct Node {
    pub mac: TestMac,
    events: Rc<RefCell<Vec<Event>>>,
    data: Rc<RefCell<Vec<DataIndication>>>,
}

impl Node {
    pub fn extended_address(&self) -> ExtendedAddress {
        self.mac.pib().extended_address
    }

    /// Send a command through the CHCI path, like a host would.
    pub fn command(&mut self, command: impl Into<Command>) -> bool {
        let message = command.into().encode().unwrap();
        let (header, payload) = ChciHeader::split(&message).unwrap();
        self.mac.invoke_cmd_handler(&header, payload)
    }

    pub fn data_request(&mut self, request: DataRequest) -> bool {
        let message = Data::Request(request).encode().unwrap();
        let (header, payload) = ChciHeader::split(&message).unwrap();
        self.mac.invoke_data_handler(&header, payload)
    }

    /// All events received since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }

    /// All data indications received since the last call.
    pub fn take_data(&mut self) -> Vec<DataIndication> {
        self.data.take()
    }
}

/// Any number of MACs sharing one aether, ticked together.
pub struct Runner {
    pub aether: Aether,
    pub nodes: Vec<Node>,
}

/// Run a single mac engine
pub fn run_mac_engine_simple() -> Runner {
    run_mac_engine_multi(1)
}

/// Run multiple mac engines. Node `i` has extended address `i + 1`.
pub fn run_mac_engine_multi(count: usize) -> Runner {
    let mut aether = Aether::new();

    let nodes = (0..count)
        .map(|i| {
            let radio = aether.radio();
            let rx_queue: &'static Arc<RxQueue> = Box::leak(Box::new(radio.rx_queue()));

            let mut mac = Mac154::init(
                radio,
                rx_queue,
                MacConfig {
                    extended_address: ExtendedAddress(i as u64 + 1),
                    rng: StdRng::seed_from_u64(i as _),
                },
                true,
            )
            .unwrap();

            let events = Rc::new(RefCell::new(Vec::new()));
            let data = Rc::new(RefCell::new(Vec::new()));

            let sink = events.clone();
            mac.register_event_handler(move |message: &[u8]| {
                sink.borrow_mut().push(Event::from_message(message).unwrap());
                true
            });
            let sink = data.clone();
            mac.register_data_handler(move |message: &[u8]| {
                match Data::from_message(message).unwrap() {
                    Data::Indication(indication) => sink.borrow_mut().push(indication),
                    Data::Request(_) => panic!("the MAC sent a data request to its host"),
                }
                true
            });

            Node { mac, events, data }
        })
        .collect();

    Runner { aether, nodes }
}

impl Runner {
    pub fn tick(&mut self) {
        for node in self.nodes.iter_mut() {
            node.mac.tick();
        }
    }

    /// Let time pass in steps of one backoff period, ticking every MAC after each step.
    pub fn run_for(&mut self, duration: Duration) {
        let step = Duration::from_symbols(UNIT_BACKOFF_PERIOD as u64);
        let end = self.aether.now() + duration;

        self.tick();
        while !end.has_passed(self.aether.now()) {
            self.aether.advance(step);
            self.tick();
        }
    }

    /// Run until node `index` reports an event that matches, for at most `timeout`.
    ///
    /// Events before the match are dropped.
    pub fn wait_for_event(
        &mut self,
        index: usize,
        timeout: Duration,
        matches: impl Fn(&Event) -> bool,
    ) -> Option<Event> {
        let step = Duration::from_symbols(UNIT_BACKOFF_PERIOD as u64);
        let end = self.aether.now() + timeout;

        loop {
            self.tick();

            {
                let mut events = self.nodes[index].events.borrow_mut();
                if let Some(position) = events.iter().position(&matches) {
                    let found = events.remove(position);
                    events.drain(..position);
                    return Some(found);
                }
            }

            if end.has_passed(self.aether.now()) {
                return None;
            }
            self.aether.advance(step);
        }
    }
}
