pub mod http;

pub use http::client::HttpRemote;
pub use http::config::ClientConfig;
