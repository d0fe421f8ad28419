//! Record storage: the in-process fallback store, its change listeners and
//! the typed adapter over a remote record store.

mod backend;
mod listeners;
mod local;
mod lock;
mod remote;

pub use backend::Backend;
pub use listeners::{ListenerRegistry, Subscription};
pub use local::{CollectionSet, LocalCollection, LocalStore};
pub use remote::RemoteStoreAdapter;

pub(crate) use local::{METRIC_LOCAL_MUTATIONS, METRIC_LOCAL_NOTIFICATIONS};
pub(crate) use remote::METRIC_REMOTE_FAILURES;
