use crate::errors::ReplyError;
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
	fmt,
	net::{IpAddr, SocketAddr},
};

/// A datagram exactly as it came off the socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawReply {
	pub payload: Vec<u8>,
	pub sender: SocketAddr,
}
impl RawReply {
	#[inline(always)]
	pub fn new(payload: impl Into<Vec<u8>>, sender: SocketAddr) -> Self {
		Self {
			payload: payload.into(),
			sender,
		}
	}

	#[inline(always)]
	pub fn parse(&self) -> Result<Reply, ReplyError> {
		parse_reply(&self.payload, self.sender)
	}
}

/// A device that acknowledged the registration probe.
///
/// Only ever constructed from a validated reply, so the address is always specified and the port is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DeviceRecord {
	ip: IpAddr,
	port: u16,
}
impl DeviceRecord {
	#[inline(always)]
	/// The device's network address.
	pub fn ip(&self) -> IpAddr {
		self.ip
	}

	#[inline(always)]
	/// The UDP port the device replied from.
	pub fn port(&self) -> u16 {
		self.port
	}

	#[inline(always)]
	pub fn addr(&self) -> SocketAddr {
		SocketAddr::new(self.ip, self.port)
	}
}
impl fmt::Display for DeviceRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Display::fmt(&self.addr(), f)
	}
}

/// A validated registration acknowledgment.
#[derive(Debug, Clone)]
pub struct Reply {
	device: DeviceRecord,
	body: Value,
}
impl Reply {
	#[inline(always)]
	pub fn device(&self) -> DeviceRecord {
		self.device
	}

	#[inline(always)]
	/// The whole decoded reply.
	pub fn body(&self) -> &Value {
		&self.body
	}

	/// The `result` object of the reply, which is what the device reports about itself.
	pub fn reported_config(&self) -> Option<&Map<String, Value>> {
		self.body.get("result").and_then(Value::as_object)
	}
}

/// Validates a datagram as a registration acknowledgment from `sender`.
///
/// A reply is accepted only if it decodes as JSON, contains `"result": {"success": true}` and comes from a
/// specified address with a non-zero port. Anything else is noise on a shared network.
pub fn parse_reply(payload: &[u8], sender: SocketAddr) -> Result<Reply, ReplyError> {
	let body: Value = serde_json::from_slice(payload)?;

	if body.pointer("/result/success") != Some(&Value::Bool(true)) {
		return Err(ReplyError::NotAcknowledged);
	}

	if sender.ip().is_unspecified() || sender.port() == 0 {
		return Err(ReplyError::MissingSender);
	}

	Ok(Reply {
		device: DeviceRecord {
			ip: sender.ip(),
			port: sender.port(),
		},
		body,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sender() -> SocketAddr {
		"192.168.1.42:38899".parse().unwrap()
	}

	#[test]
	fn accepts_success_acknowledgment() {
		let reply = parse_reply(br#"{"method":"registration","env":"pro","result":{"mac":"a8bb50aabbcc","success":true}}"#, sender()).unwrap();

		assert_eq!(reply.device().addr(), sender());
		assert_eq!(reply.device().to_string(), "192.168.1.42:38899");
		assert_eq!(reply.reported_config().unwrap()["mac"], "a8bb50aabbcc");
		assert_eq!(reply.body()["env"], "pro");
	}

	#[test]
	fn rejects_non_json() {
		assert!(matches!(parse_reply(b"\x00\xffnot json", sender()), Err(ReplyError::Malformed(_))));
		assert!(matches!(parse_reply(b"", sender()), Err(ReplyError::Malformed(_))));
		assert!(matches!(parse_reply(br#"{"result":{"success":tr"#, sender()), Err(ReplyError::Malformed(_))));
	}

	#[test]
	fn rejects_replies_without_success() {
		for payload in [
			&br#"{"result":{"success":false}}"#[..],
			br#"{"result":{"success":"true"}}"#,
			br#"{"result":{}}"#,
			br#"{"result":true}"#,
			br#"{"success":true}"#,
			br#"{"error":{"code":-32601,"message":"Method not found"}}"#,
			br#"[1,2,3]"#,
			b"42",
		] {
			assert!(
				matches!(parse_reply(payload, sender()), Err(ReplyError::NotAcknowledged)),
				"accepted {}",
				String::from_utf8_lossy(payload)
			);
		}
	}

	#[test]
	fn rejects_unusable_sender() {
		let payload = br#"{"result":{"success":true}}"#;
		assert!(matches!(parse_reply(payload, "0.0.0.0:38899".parse().unwrap()), Err(ReplyError::MissingSender)));
		assert!(matches!(parse_reply(payload, "192.168.1.42:0".parse().unwrap()), Err(ReplyError::MissingSender)));
	}

	#[test]
	fn raw_reply_parses_with_its_sender() {
		let raw = RawReply::new(&br#"{"result":{"success":true}}"#[..], sender());
		assert_eq!(raw.parse().unwrap().device().addr(), sender());
	}
}
