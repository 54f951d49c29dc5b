use std::time::Duration;
use wizscan::{AttributeFilter, ConfigSource, DiscoveryBuilder};

fn main() {
	simple_logger::init_with_level(log::Level::Info).unwrap();

	let room: i64 = std::env::args()
		.nth(1)
		.and_then(|room| room.parse().ok())
		.expect("usage: room <room id>");

	let devices = DiscoveryBuilder::new()
		.filter(AttributeFilter::room(room))
		.config_source(ConfigSource::SystemConfigQuery {
			timeout: Duration::from_secs(1),
		})
		.build()
		.run()
		.unwrap();

	println!("{}", serde_json::to_string_pretty(&devices).unwrap());
}
