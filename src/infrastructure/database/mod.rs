pub mod connection_pool;
mod queries;
mod rows;
pub mod sqlite_action_queue;
pub mod sqlite_local_store;

pub use connection_pool::ConnectionPool;
pub use sqlite_action_queue::SqliteActionQueueRepository;
pub use sqlite_local_store::SqliteLocalStore;
