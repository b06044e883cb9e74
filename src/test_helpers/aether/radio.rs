use core::fmt::Display;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    radio::{DriverOptions, Radio},
    rx_queue::RxQueue,
    test_helpers::aether::{AetherInner, Node, NodeId},
    time::Instant,
};

/// Single radio connected to an [`Aether`](super::Aether)
pub struct AetherRadio {
    pub(super) inner: Arc<Mutex<AetherInner>>,
    pub(super) node_id: NodeId,
    pub(super) rx_queue: Arc<RxQueue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum AetherError {
    /// The aether was told to fail everything.
    Broken,
}

impl Display for AetherError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AetherError::Broken => write!(f, "the aether is broken"),
        }
    }
}

impl core::error::Error for AetherError {}

impl AetherRadio {
    /// The queue this radio delivers its received frames into.
    pub fn rx_queue(&self) -> Arc<RxQueue> {
        Arc::clone(&self.rx_queue)
    }

    fn aether(&self) -> Result<MutexGuard<AetherInner>, AetherError> {
        let aether = self.inner.lock().unwrap();

        if aether.broken {
            return Err(AetherError::Broken);
        }

        Ok(aether)
    }

    fn with_node<R>(&mut self, f: impl FnOnce(&mut Node) -> R) -> Result<R, AetherError> {
        let mut aether = self.aether()?;
        let node = aether
            .nodes
            .get_mut(&self.node_id)
            .expect("we exist therefore there must be a node with out id");

        Ok(f(node))
    }

    /// What the MAC last handed to the driver.
    pub fn driver_options(&self) -> DriverOptions {
        let aether = self.inner.lock().unwrap();
        aether.nodes[&self.node_id].driver_options
    }

    fn channel(&mut self) -> Result<u8, AetherError> {
        self.with_node(|node| node.channel)
    }
}

impl Radio for AetherRadio {
    type Error = AetherError;

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.rx_queue.clear();
        self.with_node(|node| {
            node.rx_enable = false;
            node.channel = crate::consts::MIN_CHANNEL;
            node.driver_options = DriverOptions::default();
        })
    }

    fn now(&self) -> Instant {
        self.inner.lock().unwrap().now
    }

    fn transmit(&mut self, data: &[u8]) -> Result<Instant, Self::Error> {
        let channel = self.channel()?;
        let node_id = self.node_id.clone();
        Ok(self.aether()?.send(Some(node_id), channel, data))
    }

    fn clear_channel(&mut self) -> Result<bool, Self::Error> {
        let channel = self.channel()?;
        Ok(self.aether()?.clear_channel(channel))
    }

    fn energy_detect(&mut self) -> Result<u8, Self::Error> {
        let channel = self.channel()?;
        Ok(self.aether()?.energy.get(&channel).copied().unwrap_or(0))
    }

    fn set_receiver(&mut self, enabled: bool) -> Result<(), Self::Error> {
        self.with_node(|node| node.rx_enable = enabled)
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Self::Error> {
        self.with_node(|node| node.channel = channel)
    }

    fn set_tx_power(&mut self, _dbm: i8) -> Result<(), Self::Error> {
        self.aether().map(|_| ())
    }

    fn set_driver_options(&mut self, options: DriverOptions) -> Result<(), Self::Error> {
        self.with_node(|node| node.driver_options = options)
    }
}
