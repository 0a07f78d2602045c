pub mod manual_watcher;
pub mod reachability_probe;

pub use manual_watcher::ManualConnectivityWatcher;
pub use reachability_probe::ReachabilityProbe;
