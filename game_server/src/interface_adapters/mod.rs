// Interface adapters: the wire protocol, the websocket layer, outbound
// clients and the bridge to the external agent controller.

pub mod agent_bridge;
pub mod clients;
pub mod net;
pub mod protocol;
pub mod state;
