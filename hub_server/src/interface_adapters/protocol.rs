use serde::{Deserialize, Serialize};

use crate::domain::{ServerDescriptor, ServerStatus};

// Directory record as game servers push it and clients read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDescriptorDto {
    pub name: String,
    pub port: u16,
    pub status: String,
    pub player_count: u32,
    pub max_count: u32,
}

impl From<&ServerDescriptor> for ServerDescriptorDto {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            name: server.name.clone(),
            port: server.port,
            status: server.status.as_str().to_string(),
            player_count: server.player_count,
            max_count: server.max_count,
        }
    }
}

impl From<ServerDescriptorDto> for ServerDescriptor {
    fn from(dto: ServerDescriptorDto) -> Self {
        // Anything other than a literal "Online" counts as offline.
        let status = if dto.status == ServerStatus::Online.as_str() {
            ServerStatus::Online
        } else {
            ServerStatus::Offline
        };
        Self {
            name: dto.name,
            port: dto.port,
            status,
            player_count: dto.player_count,
            max_count: dto.max_count,
        }
    }
}

// Count-only update sent on every connect and disconnect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCountPush {
    pub player_count: u32,
    pub port: u16,
}

// Simple error envelope for JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}
