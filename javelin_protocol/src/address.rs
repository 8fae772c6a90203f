use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use enum_primitive_derive::Primitive;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::{Error, ErrorKind, Result};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Primitive, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProtocol {
    Tcp = 0,
    Http = 1,
    Ws = 2,
    Grpc = 3,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString, Primitive, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCodec {
    Json = 0,
    MsgPack = 1,
    ProtoBuf = 2,
}

/// one reachable instance of a logical service. Built by configuration or
/// registry code; the dispatch core only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceAddress {
    #[serde(default)]
    pub ip: Option<IpAddr>,
    pub protocol: ServiceProtocol,
    #[serde(default)]
    pub host: String,
    pub port: u16,
    /// externally advertised address or DNS name; overrides `host` for
    /// client-facing identification when non-empty.
    #[serde(default)]
    pub service: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_gzip")]
    pub gzip: bool,
    #[serde(default = "default_codec")]
    pub codec: ServiceCodec,
}

fn default_weight() -> f64 {
    1.0
}

fn default_gzip() -> bool {
    true
}

fn default_codec() -> ServiceCodec {
    ServiceCodec::Json
}

impl Default for ServiceAddress {
    fn default() -> Self {
        ServiceAddress {
            ip: None,
            protocol: ServiceProtocol::Tcp,
            host: String::new(),
            port: 0,
            service: String::new(),
            weight: default_weight(),
            gzip: default_gzip(),
            codec: default_codec(),
        }
    }
}

/// where a connection should be pointed at, before any resolution happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Ip(SocketAddr),
    Dns(String, u16),
}

impl ServiceAddress {
    pub fn new(host: &str, port: u16) -> ServiceAddress {
        ServiceAddress {
            host: host.to_owned(),
            port,
            ..Default::default()
        }
    }

    /// the address a client should identify this instance by: `service`
    /// when set, then `host`, then the raw `ip`.
    pub fn effective_address(&self) -> String {
        if !self.service.is_empty() {
            return self.service.clone();
        }
        if !self.host.is_empty() {
            return self.host.clone();
        }
        match self.ip {
            Some(ip) => ip.to_string(),
            None => String::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(Error::new(
                ErrorKind::Other,
                format!("invalid port 0 for {}", self.effective_address()),
            ));
        }
        if self.weight < 0.0 || !self.weight.is_finite() {
            return Err(Error::new(
                ErrorKind::Other,
                format!("invalid weight {} for {}", self.weight, self.effective_address()),
            ));
        }
        Ok(())
    }

    /// produces the endpoint descriptor without resolving names.
    pub fn endpoint(&self) -> Endpoint {
        let target = self.effective_address();
        if target.is_empty() || target == "localhost" {
            return Endpoint::Ip(SocketAddr::new(
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                self.port,
            ));
        }
        match target.parse::<IpAddr>() {
            Ok(ip) => Endpoint::Ip(SocketAddr::new(ip, self.port)),
            Err(_) => Endpoint::Dns(target, self.port),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::from)
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}:{}",
            self.protocol.to_string().to_lowercase(),
            self.effective_address(),
            self.port
        )
    }
}
