pub mod credentials;
pub mod identity;
pub mod sdk_gateway;
pub mod session_cache;
pub mod status_store;
