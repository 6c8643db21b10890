pub mod hourly_change_service;
pub mod merge_service;
pub mod progress;
pub mod refresh_service;
pub mod snapshot_store;
pub mod summary_service;
