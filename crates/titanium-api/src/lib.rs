// titanium-api: async clients for the titanium portal API and the
// thermostat pub/sub bus

pub mod bus;
pub mod error;
pub mod models;
pub mod portal;
pub mod transport;

pub use bus::{Bus, BusClient, BusConfig};
pub use error::Error;
pub use models::{Session, Thermostat, UserSummary};
pub use portal::PortalClient;
pub use transport::TransportConfig;
