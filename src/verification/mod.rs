//! Server-side verification: the endpoint client, the batching dispatcher and
//! progress reporting.

pub mod api;
pub mod dispatcher;
pub mod progress;

pub use api::{HttpVerifier, VerificationBackend};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use progress::{NoProgress, ProgressObserver};
