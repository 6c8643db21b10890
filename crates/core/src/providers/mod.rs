pub mod http_client;
pub mod registry;
pub mod traits;
