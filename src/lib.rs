//! Discover WiZ smart lights on the local network.
//!
//! Devices answer a JSON `registration` probe sent to UDP port [`DISCOVERY_PORT`], either through the
//! [`MULTICAST_V4_IP`] group or the [`BROADCAST_V4_IP`] address. Each acknowledgment becomes a
//! [`DeviceRecord`] holding the address and port the device replied from.
//!
//! ```no_run
//! let devices = wizscan::discover_by_room(3, wizscan::DEFAULT_WAIT)?;
//! for device in &devices {
//! 	println!("Found light at {device}");
//! }
//! # Ok::<(), wizscan::errors::DiscoveryError>(())
//! ```

use serde_json::Value;
use std::{net::Ipv4Addr, time::Duration};

#[macro_use]
extern crate thiserror;

mod collect;
mod group;
mod probe;
mod reply;
mod socket;

pub mod attributes;
pub mod discovery;
pub mod errors;

pub use attributes::{AttributeFilter, ConfigSource};
pub use discovery::{Discovery, DiscoveryBuilder, DiscoveryStrategy};
pub use group::DeviceCollection;
pub use probe::DiscoveryRequest;
pub use reply::{parse_reply, DeviceRecord, RawReply, Reply};

use errors::DiscoveryError;

pub const DISCOVERY_PORT: u16 = 38899;
pub const MULTICAST_V4_IP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 1);
pub const BROADCAST_V4_IP: Ipv4Addr = Ipv4Addr::BROADCAST;
pub const BIND_ADDR: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// How long discovery waits for replies unless told otherwise.
pub const DEFAULT_WAIT: Duration = Duration::from_secs(2);

/// Pause between the two broadcast probes.
pub const PROBE_INTERVAL: Duration = Duration::from_millis(500);

pub const RECV_BUFFER_SIZE: usize = 65536;

/// Every device that acknowledges a multicast probe within `wait`.
pub fn discover_multicast(wait: Duration) -> Result<DeviceCollection, DiscoveryError> {
	DiscoveryBuilder::multicast().wait(wait).build().run()
}

/// Every device that acknowledges a broadcast probe and whose reported configuration contains `filter`.
///
/// Collection ends once no reply has arrived for `wait`.
pub fn discover_broadcast(wait: Duration, filter: AttributeFilter) -> Result<DeviceCollection, DiscoveryError> {
	DiscoveryBuilder::new().wait(wait).filter(filter).build().run()
}

/// Broadcast discovery of the devices in home `id`.
pub fn discover_by_home(id: impl Into<Value>, wait: Duration) -> Result<DeviceCollection, DiscoveryError> {
	discover_broadcast(wait, AttributeFilter::home(id))
}

/// Broadcast discovery of the devices in room `id`.
pub fn discover_by_room(id: impl Into<Value>, wait: Duration) -> Result<DeviceCollection, DiscoveryError> {
	discover_broadcast(wait, AttributeFilter::room(id))
}
