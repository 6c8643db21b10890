pub mod event;
pub mod exchange;
pub mod hourly;
pub mod merged;
pub mod settings;
pub mod snapshot;
pub mod summary;
