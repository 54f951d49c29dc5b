use wizscan::{
	errors::{DiscoveryError, ReplyError, SocketSetupError},
	parse_reply, AttributeFilter, DiscoveryBuilder, DiscoveryRequest, DiscoveryStrategy, BIND_ADDR, DEFAULT_WAIT, DISCOVERY_PORT,
};
use std::{net::SocketAddr, time::Duration};

#[test]
fn builder_defaults_to_unfiltered_broadcast() {
	let discovery = DiscoveryBuilder::new().build();
	assert_eq!(discovery.strategy(), &DiscoveryStrategy::broadcast());
	assert_eq!(discovery.wait(), DEFAULT_WAIT);

	let discovery = DiscoveryBuilder::multicast().wait(Duration::from_secs(5)).build();
	assert_eq!(discovery.strategy(), &DiscoveryStrategy::Multicast);
	assert_eq!(discovery.wait(), Duration::from_secs(5));
}

#[test]
fn filtering_selects_broadcast() {
	let discovery = DiscoveryBuilder::multicast().filter(AttributeFilter::room("5")).build();

	assert_eq!(
		discovery.strategy(),
		&DiscoveryStrategy::Broadcast {
			filter: AttributeFilter::room("5")
		}
	);
}

#[test]
fn probe_is_compact_registration() {
	let probe = DiscoveryRequest::REGISTRATION.to_bytes().unwrap();
	let probe: serde_json::Value = serde_json::from_slice(&probe).unwrap();

	assert_eq!(probe["method"], "registration");
	assert_eq!(probe["params"]["register"], false);
	assert_eq!(probe["params"]["id"], "1");
}

#[test]
fn noise_never_becomes_a_device() {
	let sender: SocketAddr = "192.168.1.20:38899".parse().unwrap();

	assert!(matches!(parse_reply(b"M-SEARCH * HTTP/1.1\r\n", sender), Err(ReplyError::Malformed(_))));
	assert!(matches!(
		parse_reply(br#"{"method":"registration","result":{"success":false}}"#, sender),
		Err(ReplyError::NotAcknowledged)
	));
	assert_eq!(parse_reply(br#"{"result":{"success":true}}"#, sender).unwrap().device().addr(), sender);
}

#[test]
fn discovery_port_in_use_is_fatal() {
	let occupied = std::net::UdpSocket::bind((BIND_ADDR, DISCOVERY_PORT)).expect("discovery port is already taken on this machine");

	match wizscan::discover_by_home("abc", Duration::from_millis(100)) {
		Err(DiscoveryError::SocketSetup(SocketSetupError::Bind { addr, .. })) => assert_eq!(addr.port(), DISCOVERY_PORT),
		other => panic!("expected a bind failure, got {other:?}"),
	}

	drop(occupied);
}

#[test]
#[ignore = "requires WiZ lights on the local network"]
fn multicast_finds_lights() {
	let started = std::time::Instant::now();
	let devices = wizscan::discover_multicast(DEFAULT_WAIT).unwrap();

	assert!(started.elapsed() >= DEFAULT_WAIT);
	for device in &devices {
		println!("Found light at {device}");
	}
}
