//! Error types produced during discovery

use std::net::SocketAddr;

#[derive(Debug, Error)]
/// The discovery socket could not be set up.
///
/// This is always fatal to the discovery call that produced it.
pub enum SocketSetupError {
	#[error("Failed to create UDP socket: {0}")]
	/// The OS refused to create the socket
	Create(#[source] std::io::Error),

	#[error("Failed to set socket option {option}: {source}")]
	/// A socket option could not be applied
	Configure {
		/// The option being applied, e.g. `IP_ADD_MEMBERSHIP`
		option: &'static str,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to bind to {addr}: {source}")]
	/// The socket could not be bound, usually because the port is in use
	Bind {
		/// The address the socket tried to bind to
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to register socket with the runtime: {0}")]
	/// The socket could not be handed over to the async reactor
	Register(#[source] std::io::Error),
}

#[derive(Debug, Error)]
/// An error that aborted a discovery run.
///
/// Finding no devices is not an error; an empty [`DeviceCollection`](crate::DeviceCollection) is returned instead.
pub enum DiscoveryError {
	#[error("{0}")]
	/// The discovery socket could not be set up
	SocketSetup(#[from] SocketSetupError),

	#[error("Failed to send discovery probe: {0}")]
	/// The probe datagram could not be sent
	Dispatch(#[source] std::io::Error),

	#[error("Failed to start discovery runtime: {0}")]
	/// The private Tokio runtime could not be built
	Runtime(#[source] std::io::Error),

	#[error("The reply listener panicked")]
	/// The background reply listener panicked before it could be joined
	ListenerPanicked,
}

#[derive(Debug, Error)]
/// Why a datagram was not accepted as a registration acknowledgment.
pub enum ReplyError {
	#[error("Reply is not valid JSON: {0}")]
	/// The payload could not be decoded
	Malformed(#[from] serde_json::Error),

	#[error("Reply does not acknowledge the registration")]
	/// The payload decoded but `result.success` is not `true`
	NotAcknowledged,

	#[error("Reply has no usable sender address")]
	/// The sender address or port is missing
	MissingSender,
}

#[derive(Debug, Error)]
/// A device did not report its system configuration.
pub enum QueryError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Device did not answer within {0:?}")]
	Timeout(std::time::Duration),

	#[error("Configuration reply is not valid JSON: {0}")]
	Malformed(#[from] serde_json::Error),

	#[error("Configuration reply has no result object")]
	MissingResult,
}
