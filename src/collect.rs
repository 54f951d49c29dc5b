use crate::{
	errors::DiscoveryError,
	reply::{parse_reply, RawReply, Reply},
	RECV_BUFFER_SIZE,
};
use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{net::UdpSocket as AsyncUdpSocket, sync::oneshot, task::JoinHandle};

struct ListenerHandleInner {
	task: JoinHandle<Vec<Reply>>,
	shutdown_tx: oneshot::Sender<()>,
}

/// A running background listener. Dropping it without calling [`stop`](Self::stop) aborts the listener.
pub(crate) struct ListenerHandle(Option<ListenerHandleInner>);
impl ListenerHandle {
	/// Signals the listener to stop and joins it, returning every acknowledgment it accepted in arrival order.
	///
	/// Stopping is abrupt: a datagram that has not been fully received when the signal lands is dropped.
	pub async fn stop(mut self) -> Result<Vec<Reply>, DiscoveryError> {
		let ListenerHandleInner { task, shutdown_tx } = match self.0.take() {
			Some(inner) => inner,
			None => return Ok(Vec::new()),
		};

		// The listener may already have ended on a receive error
		shutdown_tx.send(()).ok();

		task.await.map_err(|_| DiscoveryError::ListenerPanicked)
	}
}
impl Drop for ListenerHandle {
	fn drop(&mut self) {
		if let Some(ListenerHandleInner { task, shutdown_tx }) = self.0.take() {
			shutdown_tx.send(()).ok();
			task.abort();
		}
	}
}

/// Spawns a listener that parses every datagram on `socket` until stopped.
///
/// No deduplication happens here.
pub(crate) fn spawn_listener(socket: Arc<AsyncUdpSocket>) -> ListenerHandle {
	let (shutdown_tx, shutdown_rx) = oneshot::channel();
	let task = tokio::spawn(listen(socket, shutdown_rx));
	ListenerHandle(Some(ListenerHandleInner { task, shutdown_tx }))
}

async fn listen(socket: Arc<AsyncUdpSocket>, mut shutdown_rx: oneshot::Receiver<()>) -> Vec<Reply> {
	let mut buf = vec![0u8; RECV_BUFFER_SIZE];
	let mut replies = Vec::new();

	loop {
		tokio::select! {
			biased;
			_ = &mut shutdown_rx => break,

			recv = socket.recv_from(&mut buf) => match recv {
				Ok((count, sender)) => match parse_reply(&buf[..count], sender) {
					Ok(reply) => {
						log::trace!("Accepted reply from {sender}");
						replies.push(reply);
					}
					Err(err) => log::trace!("Discarded {count} bytes from {sender}: {err}"),
				},

				Err(err) => {
					log::warn!("Reply listener stopped early: {err}");
					break;
				}
			},
		}
	}

	replies
}

/// Receives datagrams until none arrives for `idle`.
///
/// The timeout restarts after every datagram, so a steady trickle of replies keeps collection going. Exact
/// duplicates (same bytes from the same sender) are kept once, at the position they were first seen.
pub(crate) async fn collect_until_idle(socket: &AsyncUdpSocket, idle: Duration) -> Vec<RawReply> {
	let mut buf = vec![0u8; RECV_BUFFER_SIZE];
	let mut seen = HashSet::new();
	let mut replies = Vec::new();

	loop {
		match tokio::time::timeout(idle, socket.recv_from(&mut buf)).await {
			Ok(Ok((count, sender))) => {
				let reply = RawReply::new(&buf[..count], sender);
				if seen.insert(reply.clone()) {
					log::trace!("Received {count} bytes from {sender}");
					replies.push(reply);
				}
			}

			Ok(Err(err)) => {
				log::warn!("Reply collection stopped early: {err}");
				break;
			}

			Err(_) => break,
		}
	}

	replies
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::{net::SocketAddr, time::Instant};

	const ACK: &[u8] = br#"{"result":{"success":true}}"#;

	async fn loopback() -> (Arc<AsyncUdpSocket>, SocketAddr) {
		let socket = AsyncUdpSocket::bind("127.0.0.1:0").await.unwrap();
		let addr = socket.local_addr().unwrap();
		(Arc::new(socket), addr)
	}

	#[tokio::test]
	async fn listener_keeps_acknowledgments_in_arrival_order() {
		let (socket, addr) = loopback().await;
		let listener = spawn_listener(socket.clone());

		let first = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
		let second = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
		first.send_to(ACK, addr).unwrap();
		second.send_to(b"garbage", addr).unwrap();
		second.send_to(br#"{"result":{"success":false}}"#, addr).unwrap();
		second.send_to(ACK, addr).unwrap();
		first.send_to(ACK, addr).unwrap();

		tokio::time::sleep(Duration::from_millis(200)).await;
		let replies = listener.stop().await.unwrap();

		let senders: Vec<SocketAddr> = replies.iter().map(|reply| reply.device().addr()).collect();
		let first = first.local_addr().unwrap();
		let second = second.local_addr().unwrap();
		assert_eq!(senders, vec![first, second, first]);
	}

	#[tokio::test]
	async fn listener_stops_without_traffic() {
		let (socket, _) = loopback().await;
		let listener = spawn_listener(socket.clone());

		let started = Instant::now();
		let replies = tokio::time::timeout(Duration::from_secs(5), listener.stop()).await.unwrap().unwrap();

		assert!(replies.is_empty());
		assert!(started.elapsed() < Duration::from_secs(1));
		assert_eq!(Arc::strong_count(&socket), 1);
	}

	#[tokio::test]
	async fn dropped_listener_releases_socket() {
		let (socket, _) = loopback().await;
		drop(spawn_listener(socket.clone()));

		tokio::time::sleep(Duration::from_millis(50)).await;
		assert_eq!(Arc::strong_count(&socket), 1);
	}

	#[tokio::test]
	async fn idle_collection_drops_exact_duplicates() {
		let (socket, addr) = loopback().await;

		let device = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
		device.send_to(ACK, addr).unwrap();
		device.send_to(ACK, addr).unwrap();
		device.send_to(br#"{"result":{"success":true},"ts":2}"#, addr).unwrap();

		let replies = collect_until_idle(&socket, Duration::from_millis(200)).await;

		assert_eq!(replies.len(), 2);
		assert_eq!(replies[0].payload, ACK);
		assert!(replies.iter().all(|reply| reply.sender == device.local_addr().unwrap()));
	}

	#[tokio::test]
	async fn idle_timeout_restarts_after_each_datagram() {
		let (socket, addr) = loopback().await;

		let trickle = std::thread::spawn(move || {
			let device = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
			for n in 0..6 {
				std::thread::sleep(Duration::from_millis(100));
				device.send_to(format!(r#"{{"result":{{"success":true}},"n":{n}}}"#).as_bytes(), addr).unwrap();
			}
		});

		let started = Instant::now();
		let replies = collect_until_idle(&socket, Duration::from_millis(300)).await;
		let elapsed = started.elapsed();
		trickle.join().unwrap();

		// Total time exceeds the idle timeout; collection ended only after the trickle went quiet
		assert_eq!(replies.len(), 6);
		assert!(elapsed >= Duration::from_millis(600 + 300));
	}

	#[tokio::test]
	async fn idle_collection_ends_when_nothing_arrives() {
		let (socket, _) = loopback().await;

		let started = Instant::now();
		let replies = collect_until_idle(&socket, Duration::from_millis(150)).await;

		assert!(replies.is_empty());
		assert!(started.elapsed() >= Duration::from_millis(150));
	}
}
