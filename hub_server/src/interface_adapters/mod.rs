// Interface adapters: HTTP handlers, DTOs and the reachability poller.

pub mod handlers;
pub mod protocol;
pub mod reachability;
pub mod routes;
pub mod state;
