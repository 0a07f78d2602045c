pub mod action_queue_repository;
pub mod connectivity;
pub mod local_store;
pub mod remote_service;
pub mod sync_observer;

pub use action_queue_repository::ActionQueueRepository;
pub use connectivity::ConnectivityWatcher;
pub use local_store::LocalStore;
pub use remote_service::{remote_key_of, RemoteDataService};
pub use sync_observer::SyncObserver;
