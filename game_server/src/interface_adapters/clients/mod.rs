// Outbound clients for collaborating services.

pub mod hub;
