pub mod device;
pub mod queue;
pub mod registry;
pub mod share;

pub use device::{LocalDevice, device_name, get_local_ip};
pub use queue::{NotificationQueue, SyncNotification, SyncStatus};
pub use registry::PeerRegistry;
pub use share::{NoteShareReport, ShareCoordinator, ShareOutcome};
