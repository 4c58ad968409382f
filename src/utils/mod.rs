pub mod logger;
pub mod names;
pub mod proxy_manager;
pub mod retry;
pub mod wallet_manager;
