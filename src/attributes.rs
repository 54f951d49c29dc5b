//! Filtering discovered devices by what they report about themselves

use crate::{
	errors::QueryError,
	reply::{DeviceRecord, Reply},
};
use serde_json::{Map, Value};
use std::{
	borrow::Cow,
	collections::BTreeMap,
	net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
	time::Duration,
};
use tokio::net::UdpSocket as AsyncUdpSocket;

/// The configuration key holding a device's home id.
pub const HOME_ID: &str = "homeId";

/// The configuration key holding a device's room id.
pub const ROOM_ID: &str = "roomId";

const SYSTEM_CONFIG_QUERY: &[u8] = br#"{"method":"getSystemConfig","params":{}}"#;

/// Key/value constraints a device's reported configuration must contain.
///
/// Matching is a strict subset test: every pair in the filter must be present, with an equal value, in the
/// device's configuration. An empty filter matches every device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter(BTreeMap<String, Value>);
impl AttributeFilter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Matches devices in the given home.
	pub fn home(id: impl Into<Value>) -> Self {
		Self::new().with(HOME_ID, id)
	}

	/// Matches devices in the given room.
	pub fn room(id: impl Into<Value>) -> Self {
		Self::new().with(ROOM_ID, id)
	}

	pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.insert(key, value);
		self
	}

	/// Adds a constraint, replacing any previous value for `key`.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
		self.0.insert(key.into(), value.into());
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[inline(always)]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value))
	}

	pub fn matches(&self, config: &Map<String, Value>) -> bool {
		self.0.iter().all(|(key, expected)| config.get(key) == Some(expected))
	}
}
impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttributeFilter {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(key, value)| (key.into(), value.into())).collect())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Where a device's configuration comes from when applying an [`AttributeFilter`].
pub enum ConfigSource {
	#[default]
	/// The `result` object of the device's registration reply.
	ReplyBody,

	/// Ask each device for its system configuration (`getSystemConfig`) and wait up to `timeout` for the answer.
	///
	/// Devices that do not answer in time have no configuration and fail any non-empty filter.
	SystemConfigQuery { timeout: Duration },
}
impl ConfigSource {
	/// Resolves the configuration of the device behind `reply`.
	pub(crate) async fn resolve<'a>(&self, reply: &'a Reply) -> Option<Cow<'a, Map<String, Value>>> {
		match *self {
			ConfigSource::ReplyBody => reply.reported_config().map(Cow::Borrowed),

			ConfigSource::SystemConfigQuery { timeout } => match query_system_config(reply.device(), timeout).await {
				Ok(config) => Some(Cow::Owned(config)),
				Err(err) => {
					log::debug!("No system configuration from {}: {err}", reply.device());
					None
				}
			},
		}
	}
}

/// Asks `device` for its system configuration over a fresh ephemeral socket.
pub async fn query_system_config(device: DeviceRecord, timeout: Duration) -> Result<Map<String, Value>, QueryError> {
	let local = match device.ip() {
		IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
		IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
	};

	let socket = AsyncUdpSocket::bind(local).await?;
	socket.send_to(SYSTEM_CONFIG_QUERY, device.addr()).await?;

	let deadline = tokio::time::Instant::now() + timeout;
	let mut buf = vec![0u8; crate::RECV_BUFFER_SIZE];
	loop {
		let (count, from) = match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
			Ok(recv) => recv?,
			Err(_) => return Err(QueryError::Timeout(timeout)),
		};

		if from != device.addr() {
			log::trace!("Ignoring {count} bytes from {from} while querying {device}");
			continue;
		}

		let mut body: Value = serde_json::from_slice(&buf[..count])?;
		return match body.get_mut("result").map(Value::take) {
			Some(Value::Object(config)) => Ok(config),
			_ => Err(QueryError::MissingResult),
		};
	}
}
