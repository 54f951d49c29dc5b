use serde::Serialize;
use std::{net::SocketAddr, time::Duration};
use tokio::net::UdpSocket as AsyncUdpSocket;

/// The registration probe that solicits replies from every device listening on the discovery port.
///
/// The payload never changes between runs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DiscoveryRequest {
	method: &'static str,
	params: RegistrationParams,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationParams {
	phone_mac: &'static str,
	register: bool,
	phone_ip: &'static str,
	id: &'static str,
}

impl DiscoveryRequest {
	pub const REGISTRATION: DiscoveryRequest = DiscoveryRequest {
		method: "registration",
		params: RegistrationParams {
			phone_mac: "ABCDEFGHIJKL",
			register: false,
			phone_ip: "1.2.3.4",
			id: "1",
		},
	};

	/// Compact JSON wire form of the probe.
	pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(self)
	}
}

/// Sends the probe `count` times to `destination`, pausing `interval` between sends.
pub(crate) async fn dispatch(socket: &AsyncUdpSocket, destination: SocketAddr, count: usize, interval: Duration) -> Result<(), std::io::Error> {
	let probe = DiscoveryRequest::REGISTRATION.to_bytes()?;

	for n in 0..count {
		if n > 0 {
			tokio::time::sleep(interval).await;
		}

		socket.send_to(&probe, destination).await?;
		log::debug!("Sent discovery probe {}/{count} to {destination}", n + 1);
	}

	Ok(())
}
