pub mod domain;
pub mod frameworks;
pub mod interface_adapters;

pub use frameworks::config::http_port;
pub use frameworks::server::run;
