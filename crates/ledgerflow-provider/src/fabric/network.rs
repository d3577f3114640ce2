//! Single-org Fabric network: CA, orderer and peer
//!
//! Crypto material lives in the shared `firefly_fabric` volume, generated by
//! `cryptogen` from [`CryptoConfig`] before the first start.

use crate::error::Result;
use ledgerflow_container::{Service, ServiceDefinition};
use ledgerflow_core::{Stack, StackLayout};
use serde::Serialize;

pub const CA_IMAGE: &str = "hyperledger/fabric-ca:1.5";
pub const ORDERER_IMAGE: &str = "hyperledger/fabric-orderer:2.4";
pub const PEER_IMAGE: &str = "hyperledger/fabric-peer:2.4";
pub const TOOLS_IMAGE: &str = "hyperledger/fabric-tools:2.4";
/// Fabric 2.4 only publishes amd64 images
pub const PLATFORM: &str = "linux/amd64";

pub const SHARED_VOLUME: &str = "firefly_fabric";
pub const CHANNEL: &str = "firefly";
pub const CHAINCODE: &str = "firefly";

const CONFIGTX: &str = include_str!("templates/configtx.yaml");
const CCP: &str = include_str!("templates/ccp.yaml");

pub const ORGS: &str = "/etc/firefly/organizations";

fn orderer_tls(file: &str) -> String {
    format!("{ORGS}/ordererOrganizations/example.com/orderers/fabric_orderer.example.com/tls/{file}")
}

fn peer_dir(file: &str) -> String {
    format!("{ORGS}/peerOrganizations/org1.example.com/peers/fabric_peer.org1.example.com/{file}")
}

/// `cryptogen` input
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CryptoConfig {
    pub orderer_orgs: Vec<OrgSpec>,
    pub peer_orgs: Vec<OrgSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrgSpec {
    pub name: String,
    pub domain: String,
    #[serde(rename = "EnableNodeOUs")]
    pub enable_node_ous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca: Option<CaSpec>,
    pub specs: Vec<NodeSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<UsersSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaSpec {
    pub hostname: String,
    pub country: String,
    pub province: String,
    pub locality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeSpec {
    pub hostname: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UsersSpec {
    pub count: usize,
}

impl CryptoConfig {
    /// One user identity per member on top of the admin
    pub fn new(member_count: usize) -> Self {
        Self {
            orderer_orgs: vec![OrgSpec {
                name: "Orderer".to_string(),
                domain: "example.com".to_string(),
                enable_node_ous: true,
                ca: None,
                specs: vec![NodeSpec {
                    hostname: "fabric_orderer".to_string(),
                }],
                users: None,
            }],
            peer_orgs: vec![OrgSpec {
                name: "Org1".to_string(),
                domain: "org1.example.com".to_string(),
                enable_node_ous: true,
                ca: Some(CaSpec {
                    hostname: "fabric_ca".to_string(),
                    country: "US".to_string(),
                    province: "North Carolina".to_string(),
                    locality: "Raleigh".to_string(),
                }),
                specs: vec![NodeSpec {
                    hostname: "fabric_peer".to_string(),
                }],
                users: Some(UsersSpec {
                    count: member_count,
                }),
            }],
        }
    }
}

/// `cryptogen.yaml`, `configtx.yaml` and the connection profile under `init/blockchain`
pub fn write_config(stack: &Stack, layout: &StackLayout) -> Result<()> {
    let dir = layout.init_blockchain_dir();
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
        dir.join("cryptogen.yaml"),
        serde_yaml::to_string(&CryptoConfig::new(stack.members.len()))?,
    )?;
    std::fs::write(dir.join("configtx.yaml"), CONFIGTX)?;
    std::fs::write(dir.join("ccp.yaml"), CCP)?;
    Ok(())
}

pub fn service_definitions(stack: &Stack) -> Vec<ServiceDefinition> {
    let shared = format!("{SHARED_VOLUME}:/etc/firefly");
    let org1 = format!("{ORGS}/peerOrganizations/org1.example.com");

    let ca = Service::new(CA_IMAGE)
        .container_name(stack.container_name("fabric_ca"))
        .env("FABRIC_CA_HOME", "/etc/hyperledger/fabric-ca-server")
        .env("FABRIC_CA_SERVER_CA_NAME", "fabric_ca")
        .env("FABRIC_CA_SERVER_PORT", "7054")
        .env("FABRIC_CA_SERVER_OPERATIONS_LISTENADDRESS", "0.0.0.0:17054")
        .env(
            "FABRIC_CA_SERVER_CA_CERTFILE",
            format!("{org1}/ca/fabric_ca.org1.example.com-cert.pem"),
        )
        .env("FABRIC_CA_SERVER_CA_KEYFILE", format!("{org1}/ca/priv_sk"))
        .env("FABRIC_CA_SERVER_TLS_ENABLED", "true")
        .env(
            "FABRIC_CA_SERVER_TLS_CERTFILE",
            format!("{org1}/ca/fabric_ca.org1.example.com-cert.pem"),
        )
        .env("FABRIC_CA_SERVER_TLS_KEYFILE", format!("{org1}/ca/priv_sk"))
        .command("sh -c 'fabric-ca-server start -b admin:adminpw'")
        .volume(shared.clone());

    let orderer = Service::new(ORDERER_IMAGE)
        .container_name(stack.container_name("fabric_orderer"))
        .working_dir("/opt/gopath/src/github.com/hyperledger/fabric")
        .env("FABRIC_LOGGING_SPEC", "INFO")
        .env("ORDERER_GENERAL_LISTENADDRESS", "0.0.0.0")
        .env("ORDERER_GENERAL_LISTENPORT", "7050")
        .env("ORDERER_GENERAL_LOCALMSPID", "OrdererMSP")
        .env(
            "ORDERER_GENERAL_LOCALMSPDIR",
            format!("{ORGS}/ordererOrganizations/example.com/orderers/fabric_orderer.example.com/msp"),
        )
        .env("ORDERER_GENERAL_TLS_ENABLED", "true")
        .env("ORDERER_GENERAL_TLS_PRIVATEKEY", orderer_tls("server.key"))
        .env("ORDERER_GENERAL_TLS_CERTIFICATE", orderer_tls("server.crt"))
        .env("ORDERER_GENERAL_TLS_ROOTCAS", format!("[{}]", orderer_tls("ca.crt")))
        .env("ORDERER_GENERAL_CLUSTER_CLIENTCERTIFICATE", orderer_tls("server.crt"))
        .env("ORDERER_GENERAL_CLUSTER_CLIENTPRIVATEKEY", orderer_tls("server.key"))
        .env("ORDERER_GENERAL_CLUSTER_ROOTCAS", format!("[{}]", orderer_tls("ca.crt")))
        .env("ORDERER_GENERAL_BOOTSTRAPMETHOD", "none")
        .env("ORDERER_CHANNELPARTICIPATION_ENABLED", "true")
        .env("ORDERER_ADMIN_TLS_ENABLED", "true")
        .env("ORDERER_ADMIN_TLS_CERTIFICATE", orderer_tls("server.crt"))
        .env("ORDERER_ADMIN_TLS_PRIVATEKEY", orderer_tls("server.key"))
        .env("ORDERER_ADMIN_TLS_ROOTCAS", format!("[{}]", orderer_tls("ca.crt")))
        .env("ORDERER_ADMIN_TLS_CLIENTROOTCAS", format!("[{}]", orderer_tls("ca.crt")))
        .env("ORDERER_ADMIN_LISTENADDRESS", "0.0.0.0:7053")
        .env("ORDERER_OPERATIONS_LISTENADDRESS", "0.0.0.0:17050")
        .command("orderer")
        .volume(shared.clone())
        .volume("fabric_orderer:/var/hyperledger/production/orderer");

    let peer = Service::new(PEER_IMAGE)
        .container_name(stack.container_name("fabric_peer"))
        .env("CORE_VM_ENDPOINT", "unix:///host/var/run/docker.sock")
        .env(
            "CORE_VM_DOCKER_HOSTCONFIG_NETWORKMODE",
            format!("{}_default", stack.name),
        )
        .env("FABRIC_LOGGING_SPEC", "INFO")
        .env("CORE_PEER_TLS_ENABLED", "true")
        .env("CORE_PEER_PROFILE_ENABLED", "false")
        .env("CORE_PEER_MSPCONFIGPATH", peer_dir("msp"))
        .env("CORE_PEER_TLS_CERT_FILE", peer_dir("tls/server.crt"))
        .env("CORE_PEER_TLS_KEY_FILE", peer_dir("tls/server.key"))
        .env("CORE_PEER_TLS_ROOTCERT_FILE", peer_dir("tls/ca.crt"))
        .env("CORE_PEER_ID", "fabric_peer")
        .env("CORE_PEER_ADDRESS", "fabric_peer:7051")
        .env("CORE_PEER_LISTENADDRESS", "0.0.0.0:7051")
        .env("CORE_PEER_CHAINCODEADDRESS", "fabric_peer:7052")
        .env("CORE_PEER_CHAINCODELISTENADDRESS", "0.0.0.0:7052")
        .env("CORE_PEER_GOSSIP_BOOTSTRAP", "fabric_peer:7051")
        .env("CORE_PEER_GOSSIP_EXTERNALENDPOINT", "fabric_peer:7051")
        .env("CORE_PEER_LOCALMSPID", "Org1MSP")
        .env("CORE_OPERATIONS_LISTENADDRESS", "0.0.0.0:17051")
        .port(stack.exposed_blockchain_port, 7051)
        .volume(shared)
        .volume("fabric_peer:/var/hyperledger/production")
        .volume("/var/run/docker.sock:/host/var/run/docker.sock");

    [
        ("fabric_ca", ca, vec![SHARED_VOLUME]),
        ("fabric_orderer", orderer, vec![SHARED_VOLUME, "fabric_orderer"]),
        ("fabric_peer", peer, vec![SHARED_VOLUME, "fabric_peer"]),
    ]
    .into_iter()
    .map(|(name, mut service, volumes)| {
        service.platform = Some(PLATFORM.to_string());
        ServiceDefinition {
            service_name: name.to_string(),
            service,
            volume_names: volumes.into_iter().map(String::from).collect(),
        }
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_crypto_config_yaml() {
        let yaml = serde_yaml::to_string(&CryptoConfig::new(3)).unwrap();
        assert!(yaml.contains("OrdererOrgs:"));
        assert!(yaml.contains("PeerOrgs:"));
        assert!(yaml.contains("Domain: org1.example.com"));
        assert!(yaml.contains("EnableNodeOUs: true"));
        assert!(yaml.contains("Hostname: fabric_peer"));
        assert!(yaml.contains("Count: 3"));
    }

    #[test]
    fn test_network_services() {
        let stack = testing::stack("fabric", 1);
        let definitions = service_definitions(&stack);
        let names: Vec<_> = definitions.iter().map(|d| d.service_name.as_str()).collect();
        assert_eq!(names, vec!["fabric_ca", "fabric_orderer", "fabric_peer"]);

        for definition in &definitions {
            assert_eq!(definition.service.platform.as_deref(), Some(PLATFORM));
            assert!(definition.volume_names.contains(&SHARED_VOLUME.to_string()));
        }
        let peer = &definitions[2].service;
        assert_eq!(peer.ports, vec!["5100:7051"]);
        assert_eq!(peer.environment["CORE_VM_DOCKER_HOSTCONFIG_NETWORKMODE"], "demo_default");
    }

    #[test]
    fn test_write_config_files() {
        let (_dir, layout) = testing::layout();
        write_config(&testing::stack("fabric", 2), &layout).unwrap();

        let dir = layout.init_blockchain_dir();
        let configtx = std::fs::read_to_string(dir.join("configtx.yaml")).unwrap();
        assert!(configtx.contains("SingleOrgApplicationGenesis"));
        assert!(dir.join("ccp.yaml").is_file());
        assert!(dir.join("cryptogen.yaml").is_file());
    }
}
