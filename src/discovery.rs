use crate::{
	attributes::{AttributeFilter, ConfigSource},
	collect::{collect_until_idle, spawn_listener},
	errors::DiscoveryError,
	group::{group, parse_all, DeviceCollection},
	probe::dispatch,
	socket::{DiscoverySocket, SocketMode},
	BIND_ADDR, BROADCAST_V4_IP, MULTICAST_V4_IP, PROBE_INTERVAL,
};
use std::{
	net::{IpAddr, SocketAddr},
	time::Duration,
};

mod builder;
pub use builder::DiscoveryBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
/// How the probe reaches devices and how their replies are collected.
pub enum DiscoveryStrategy {
	/// Join the multicast group, send one probe and listen in the background for exactly the wait duration.
	///
	/// Every acknowledging device is returned; there is no filtering.
	Multicast,

	/// Send the probe to the broadcast address twice, then receive until no reply arrives for the wait duration.
	///
	/// Only devices whose configuration contains every pair of `filter` are returned.
	Broadcast { filter: AttributeFilter },
}
impl DiscoveryStrategy {
	#[inline(always)]
	/// Broadcast discovery without any filter.
	pub fn broadcast() -> Self {
		Self::Broadcast {
			filter: AttributeFilter::new(),
		}
	}

	fn socket_mode(&self) -> SocketMode {
		match self {
			Self::Multicast => SocketMode::Multicast {
				group: MULTICAST_V4_IP,
				interface: BIND_ADDR,
			},
			Self::Broadcast { .. } => SocketMode::Broadcast,
		}
	}

	pub(crate) fn destination_ip(&self) -> IpAddr {
		match self {
			Self::Multicast => IpAddr::V4(MULTICAST_V4_IP),
			Self::Broadcast { .. } => IpAddr::V4(BROADCAST_V4_IP),
		}
	}

	fn probe_count(&self) -> usize {
		match self {
			Self::Multicast => 1,
			Self::Broadcast { .. } => 2,
		}
	}
}
impl Default for DiscoveryStrategy {
	fn default() -> Self {
		Self::broadcast()
	}
}

/// A configured discovery run, built with [`DiscoveryBuilder`].
#[derive(Debug, Clone)]
pub struct Discovery {
	strategy: DiscoveryStrategy,
	wait: Duration,
	config_source: ConfigSource,
	port: u16,
	destination: SocketAddr,
}
impl Discovery {
	/// Runs discovery to completion on a private single-threaded runtime.
	///
	/// Use [`run_async`](Self::run_async) from within an existing Tokio runtime.
	pub fn run(self) -> Result<DeviceCollection, DiscoveryError> {
		tokio::runtime::Builder::new_current_thread()
			.thread_name("wizscan discovery (Tokio)")
			.enable_all()
			.build()
			.map_err(DiscoveryError::Runtime)?
			.block_on(self.run_async())
	}

	/// Runs discovery to completion.
	///
	/// Only socket setup and probe dispatch can fail. Datagrams that are not registration acknowledgments are
	/// discarded, and a run that finds nothing returns an empty collection.
	pub async fn run_async(self) -> Result<DeviceCollection, DiscoveryError> {
		let Discovery {
			strategy,
			wait,
			config_source,
			port,
			destination,
		} = self;

		let socket = DiscoverySocket::acquire(strategy.socket_mode(), port)?;

		let devices = match &strategy {
			DiscoveryStrategy::Multicast => {
				let listener = spawn_listener(socket.shared());

				dispatch(socket.as_async(), destination, strategy.probe_count(), PROBE_INTERVAL)
					.await
					.map_err(DiscoveryError::Dispatch)?;

				tokio::time::sleep(wait).await;

				let replies = listener.stop().await?;
				group(replies, None, config_source).await
			}

			DiscoveryStrategy::Broadcast { filter } => {
				dispatch(socket.as_async(), destination, strategy.probe_count(), PROBE_INTERVAL)
					.await
					.map_err(DiscoveryError::Dispatch)?;

				let replies = collect_until_idle(socket.as_async(), wait).await;
				group(parse_all(replies), Some(filter), config_source).await
			}
		};

		log::debug!("{:?} discovery found {} device(s)", socket.mode(), devices.len());
		socket.release();

		Ok(devices)
	}

	#[inline(always)]
	pub fn strategy(&self) -> &DiscoveryStrategy {
		&self.strategy
	}

	#[inline(always)]
	pub fn wait(&self) -> Duration {
		self.wait
	}
}
