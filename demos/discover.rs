use std::time::Duration;
use wizscan::{DiscoveryBuilder, DiscoveryStrategy};

fn main() {
	simple_logger::init_with_level(log::Level::Debug).unwrap();

	let strategy = match std::env::args().nth(1).as_deref() {
		Some("multicast") => DiscoveryStrategy::Multicast,
		_ => DiscoveryStrategy::broadcast(),
	};

	let devices = DiscoveryBuilder::with_strategy(strategy)
		.wait(Duration::from_secs(2))
		.build()
		.run()
		.unwrap();

	if devices.is_empty() {
		println!("No lights found");
	}

	for device in &devices {
		println!("Found light at {device}");
	}
}
