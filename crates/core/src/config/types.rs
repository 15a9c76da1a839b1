use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::composer::ComposerConfig;
use crate::engine::EngineConfig;
use crate::inspection::InspectionConfig;
use crate::profile::EncodingProfile;
use crate::workspace::WorkspaceConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub composer: ComposerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default)]
    pub inspection: InspectionConfig,
    /// Encoding profiles served by the registry.
    #[serde(default)]
    pub profiles: Vec<EncodingProfile>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}
