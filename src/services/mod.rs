pub mod bus;
pub mod callbacks;
pub mod inbound;
pub mod ingest;
pub mod registration;

pub use bus::{Delivery, EventBus};
pub use callbacks::{HostCallbacks, SyncingCallbacks, TokenSync, dispatch, run_callbacks};
pub use inbound::{InboundHandler, InboundOutcome, PushInterceptor, ReceiverInterceptor, RemoteMessage};
pub use ingest::{Admitted, Ingest, IngestStats, Ingestible, Ingested};
pub use registration::RegistrationService;
