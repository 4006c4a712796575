pub mod channel;
pub mod config;
pub mod error;
pub mod gate;
pub mod inbox;
pub mod platform;
pub mod scheduler;
pub mod snapshot;

pub use channel::{Channel, Envelope, HostMessage};
pub use config::EngineConfig;
pub use error::FramewatchError;
pub use gate::ChangeGate;
pub use inbox::SnapshotInbox;
pub use platform::{Platform, Trigger};
pub use scheduler::{DiscoveryScheduler, DiscoveryState};
pub use snapshot::VideoSnapshot;
