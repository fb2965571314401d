// Directory of known game servers, keyed by port. The hub only ever talks
// to servers on its own host, so a port is enough identity.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Online,
    Offline,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerStatus::Online => "Online",
            ServerStatus::Offline => "Offline",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerDescriptor {
    pub name: String,
    pub port: u16,
    pub status: ServerStatus,
    pub player_count: u32,
    pub max_count: u32,
}

#[derive(Debug, Default)]
pub struct Registry {
    servers: Vec<ServerDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new record or refreshes the existing one for that port.
    /// Returns true when the server was seen for the first time.
    pub fn upsert(&mut self, descriptor: ServerDescriptor) -> bool {
        match self.servers.iter_mut().find(|s| s.port == descriptor.port) {
            Some(existing) => {
                *existing = descriptor;
                false
            }
            None => {
                self.servers.push(descriptor);
                true
            }
        }
    }

    /// Count-only update. Returns false for an unknown port.
    pub fn set_player_count(&mut self, port: u16, player_count: u32) -> bool {
        match self.servers.iter_mut().find(|s| s.port == port) {
            Some(server) => {
                server.player_count = player_count;
                true
            }
            None => false,
        }
    }

    /// Applies a reachability probe result. An unreachable server is shown
    /// offline with zero players rather than dropped, so clients can still
    /// see it exists. Returns true when the status flipped.
    pub fn mark_reachable(&mut self, port: u16, reachable: bool) -> bool {
        let Some(server) = self.servers.iter_mut().find(|s| s.port == port) else {
            return false;
        };
        let next = if reachable {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        };
        let changed = server.status != next;
        server.status = next;
        if !reachable {
            server.player_count = 0;
        }
        changed
    }

    pub fn list(&self) -> &[ServerDescriptor] {
        &self.servers
    }

    pub fn ports(&self) -> Vec<u16> {
        self.servers.iter().map(|s| s.port).collect()
    }
}
