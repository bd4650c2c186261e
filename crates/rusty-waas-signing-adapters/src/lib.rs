pub mod config;
pub mod http_sdk;
pub mod in_memory;

pub use config::{AdapterMode, SdkAdapterConfig};
pub use http_sdk::HttpSdkAdapter;
pub use in_memory::InMemorySdkAdapter;
