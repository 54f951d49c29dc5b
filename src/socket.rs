use crate::{errors::SocketSetupError, BIND_ADDR};
use socket2::{Domain, Protocol, Socket, Type};
use std::{
	net::{Ipv4Addr, SocketAddr},
	sync::Arc,
};
use tokio::net::UdpSocket as AsyncUdpSocket;

const MULTICAST_TTL: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SocketMode {
	/// Join `group` on `interface` and keep outbound multicast on the local link
	Multicast { group: Ipv4Addr, interface: Ipv4Addr },
	Broadcast,
}

/// The single UDP socket owned by one discovery run.
pub(crate) struct DiscoverySocket {
	socket: Arc<AsyncUdpSocket>,
	mode: SocketMode,
}
impl DiscoverySocket {
	/// Opens, configures and binds the socket to the wildcard address on `port`.
	///
	/// Must be called from within a Tokio runtime.
	pub fn acquire(mode: SocketMode, port: u16) -> Result<Self, SocketSetupError> {
		let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(SocketSetupError::Create)?;

		match mode {
			SocketMode::Multicast { group, interface } => {
				configure("IP_ADD_MEMBERSHIP", socket.join_multicast_v4(&group, &interface))?;
				configure("IP_MULTICAST_TTL", socket.set_multicast_ttl_v4(MULTICAST_TTL))?;
			}

			SocketMode::Broadcast => {
				configure("SO_BROADCAST", socket.set_broadcast(true))?;
			}
		}

		configure("SO_REUSEADDR", socket.set_reuse_address(true))?;

		#[cfg(unix)]
		{
			configure("SO_REUSEPORT", socket.set_reuse_port(true))?;
		}

		let addr = SocketAddr::from((BIND_ADDR, port));
		socket.bind(&addr.into()).map_err(|source| SocketSetupError::Bind { addr, source })?;

		configure("O_NONBLOCK", socket.set_nonblocking(true))?;

		let socket = AsyncUdpSocket::from_std(socket.into()).map_err(SocketSetupError::Register)?;

		log::debug!("Acquired {mode:?} discovery socket on {addr}");

		Ok(Self {
			socket: Arc::new(socket),
			mode,
		})
	}

	#[inline(always)]
	pub fn mode(&self) -> SocketMode {
		self.mode
	}

	#[inline(always)]
	/// A shared handle for the background listener. It must be dropped before [`release`](Self::release).
	pub fn shared(&self) -> Arc<AsyncUdpSocket> {
		self.socket.clone()
	}

	#[inline(always)]
	pub fn as_async(&self) -> &AsyncUdpSocket {
		&self.socket
	}

	#[cfg(test)]
	pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
		self.socket.local_addr()
	}

	/// Closes the socket.
	pub fn release(self) {
		let DiscoverySocket { socket, mode } = self;

		if Arc::strong_count(&socket) > 1 {
			log::warn!("Releasing {mode:?} discovery socket while another handle is still alive");
		}

		drop(socket);
		log::debug!("Released {mode:?} discovery socket");
	}
}

fn configure<T>(option: &'static str, res: Result<T, std::io::Error>) -> Result<T, SocketSetupError> {
	res.map_err(|source| SocketSetupError::Configure { option, source })
}
