use crate::{
	attributes::{AttributeFilter, ConfigSource},
	reply::{DeviceRecord, RawReply, Reply},
};
use serde::Serialize;
use std::{
	collections::HashSet,
	net::{IpAddr, SocketAddr},
};

/// The devices found by one discovery run, in the order their first valid reply was accepted.
///
/// Each `(address, port)` appears at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceCollection(Vec<DeviceRecord>);
impl DeviceCollection {
	#[inline(always)]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	#[inline(always)]
	pub fn iter(&self) -> std::slice::Iter<'_, DeviceRecord> {
		self.0.iter()
	}

	#[inline(always)]
	pub fn get(&self, index: usize) -> Option<&DeviceRecord> {
		self.0.get(index)
	}

	/// The first device found at `ip`, whatever port it replied from.
	pub fn find(&self, ip: IpAddr) -> Option<&DeviceRecord> {
		self.0.iter().find(|device| device.ip() == ip)
	}

	pub fn contains(&self, addr: SocketAddr) -> bool {
		self.0.iter().any(|device| device.addr() == addr)
	}

	pub fn addresses(&self) -> impl Iterator<Item = SocketAddr> + '_ {
		self.0.iter().map(DeviceRecord::addr)
	}

	#[inline(always)]
	pub fn as_slice(&self) -> &[DeviceRecord] {
		&self.0
	}
}
impl IntoIterator for DeviceCollection {
	type Item = DeviceRecord;
	type IntoIter = std::vec::IntoIter<DeviceRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl<'a> IntoIterator for &'a DeviceCollection {
	type Item = &'a DeviceRecord;
	type IntoIter = std::slice::Iter<'a, DeviceRecord>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Parses raw datagrams, dropping every one that is not a registration acknowledgment.
pub(crate) fn parse_all(raw: Vec<RawReply>) -> Vec<Reply> {
	raw.into_iter()
		.filter_map(|raw| match raw.parse() {
			Ok(reply) => Some(reply),
			Err(err) => {
				log::trace!("Discarded {} bytes from {}: {err}", raw.payload.len(), raw.sender);
				None
			}
		})
		.collect()
}

/// Builds the final collection from accepted replies.
///
/// Repeated `(address, port)` pairs keep their first position. With a `filter`, only devices whose configuration
/// (resolved through `source`) contains every filter pair are kept; an empty filter never triggers a lookup.
pub(crate) async fn group(replies: Vec<Reply>, filter: Option<&AttributeFilter>, source: ConfigSource) -> DeviceCollection {
	let filter = filter.filter(|filter| !filter.is_empty());

	let mut seen = HashSet::new();
	let mut devices = Vec::with_capacity(replies.len());

	for reply in replies {
		let device = reply.device();
		if !seen.insert(device) {
			continue;
		}

		if let Some(filter) = filter {
			let matched = match source.resolve(&reply).await {
				Some(config) => filter.matches(&config),
				None => false,
			};

			if !matched {
				log::trace!("{device} does not match {filter:?}");
				continue;
			}
		}

		devices.push(device);
	}

	log::debug!("Grouped {} device(s)", devices.len());

	DeviceCollection(devices)
}
