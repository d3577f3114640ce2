use serde::{Deserialize, Serialize};

/// Host ports reserved for one member
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSet {
    pub firefly: u16,
    pub admin: u16,
    pub connector: u16,
    pub ui: u16,
    pub database: u16,
    pub dataexchange: u16,
    pub ipfs_api: u16,
    pub ipfs_gateway: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<u16>,
    /// One port per token provider, in provider order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<u16>,
}

impl PortSet {
    /// Every port in the set
    pub fn all(&self) -> Vec<u16> {
        let mut ports = vec![
            self.firefly,
            self.admin,
            self.connector,
            self.ui,
            self.database,
            self.dataexchange,
            self.ipfs_api,
            self.ipfs_gateway,
        ];
        ports.extend(self.metrics);
        ports.extend(self.tokens.iter().copied());
        ports
    }

    /// Ports that must be free on the host before the member starts.
    /// External members run their own core process, so its listeners are
    /// not reserved here.
    pub fn preflight(&self, external: bool) -> Vec<u16> {
        let mut ports = vec![
            self.dataexchange,
            self.connector,
            self.ipfs_api,
            self.ipfs_gateway,
            self.database,
            self.ui,
        ];
        ports.extend(self.tokens.iter().copied());
        if !external {
            ports.push(self.admin);
            ports.push(self.firefly);
            ports.extend(self.metrics);
        }
        ports
    }
}
