use super::{Discovery, DiscoveryStrategy};
use crate::{
	attributes::{AttributeFilter, ConfigSource},
	DEFAULT_WAIT, DISCOVERY_PORT,
};
use std::{net::SocketAddr, time::Duration};

pub struct DiscoveryBuilder {
	strategy: DiscoveryStrategy,
	wait: Duration,
	config_source: ConfigSource,
	port: u16,
	destination: Option<SocketAddr>,
}
impl DiscoveryBuilder {
	/// Broadcast discovery without a filter.
	pub fn new() -> Self {
		Self::with_strategy(DiscoveryStrategy::broadcast())
	}

	pub fn multicast() -> Self {
		Self::with_strategy(DiscoveryStrategy::Multicast)
	}

	pub fn with_strategy(strategy: DiscoveryStrategy) -> Self {
		Self {
			strategy,
			wait: DEFAULT_WAIT,
			config_source: ConfigSource::default(),
			port: DISCOVERY_PORT,
			destination: None,
		}
	}

	/// For multicast, how long to listen after the probe. For broadcast, how long to wait for the next reply
	/// before giving up.
	pub fn wait(mut self, wait: Duration) -> Self {
		self.wait = wait;
		self
	}

	/// Only keep devices whose configuration contains every pair of `filter`.
	///
	/// Filtering is only available over broadcast, so this also selects the broadcast strategy.
	pub fn filter(mut self, filter: AttributeFilter) -> Self {
		self.strategy = DiscoveryStrategy::Broadcast { filter };
		self
	}

	/// Where device configuration is read from when filtering.
	pub fn config_source(mut self, config_source: ConfigSource) -> Self {
		self.config_source = config_source;
		self
	}

	#[cfg(test)]
	pub(crate) fn bind_port(mut self, port: u16) -> Self {
		self.port = port;
		self
	}

	#[cfg(test)]
	pub(crate) fn destination(mut self, destination: SocketAddr) -> Self {
		self.destination = Some(destination);
		self
	}

	pub fn build(self) -> Discovery {
		let DiscoveryBuilder {
			strategy,
			wait,
			config_source,
			port,
			destination,
		} = self;

		Discovery {
			destination: destination.unwrap_or_else(|| SocketAddr::new(strategy.destination_ip(), DISCOVERY_PORT)),
			strategy,
			wait,
			config_source,
			port,
		}
	}
}
impl Default for DiscoveryBuilder {
	fn default() -> Self {
		Self::new()
	}
}
