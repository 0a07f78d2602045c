pub mod rest_remote;

pub use rest_remote::RestRemoteService;
