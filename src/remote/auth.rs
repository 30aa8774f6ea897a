use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};

use base64::prelude::*;

use crate::remote::RemoteError;

/// Routing target used to discover the outbound interface address.
pub const DEFAULT_PROBE_TARGET: &str = "8.8.8.8:80";

/// Decoded `identity/secret` pair carried by the bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub identity: String,
    pub secret: String,
}

/// Base64-decode `token` and split it into exactly two `/`-separated parts.
pub fn decode(token: &str) -> Result<Credential, RemoteError> {
    let raw = BASE64_STANDARD
        .decode(token.trim())
        .map_err(|_| RemoteError::Unauthorized)?;
    let text = String::from_utf8(raw).map_err(|_| RemoteError::Unauthorized)?;
    let mut parts = text.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(identity), Some(secret), None) => Ok(Credential {
            identity: identity.to_owned(),
            secret: secret.to_owned(),
        }),
        _ => Err(RemoteError::Unauthorized),
    }
}

/// Accept `token` only if it names this host's address and carries `secret`.
pub fn validate(token: &str, secret: &str, local: IpAddr) -> Result<Credential, RemoteError> {
    let credential = decode(token)?;
    if credential.identity != local.to_string() || credential.secret != secret {
        return Err(RemoteError::Unauthorized);
    }
    Ok(credential)
}

/// Find the local address the OS would route `target` through.
///
/// Connecting a UDP socket only selects a route; no datagram is sent.
pub fn probe_local_addr(target: SocketAddr) -> Result<IpAddr, RemoteError> {
    let unspecified = if target.is_ipv4() {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V6(Ipv6Addr::UNSPECIFIED)
    };
    let bind = SocketAddr::new(unspecified, 0);
    let probe = |target: SocketAddr| -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind(bind)?;
        socket.connect(target)?;
        Ok(socket.local_addr()?.ip())
    };
    match probe(target) {
        Ok(ip) if !ip.is_unspecified() => Ok(ip),
        Ok(_) => Err(RemoteError::Configuration(format!(
            "no local address routes to {target}"
        ))),
        Err(e) => Err(RemoteError::Configuration(format!(
            "could not determine local address via {target}: {e}"
        ))),
    }
}

/// Where the gateway's own network identity comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    /// Re-probe the outbound interface on every check.
    Probe(SocketAddr),
    /// Pinned address from configuration.
    Fixed(IpAddr),
}

impl Identity {
    pub fn resolve(&self) -> Result<IpAddr, RemoteError> {
        match self {
            Identity::Probe(target) => probe_local_addr(*target),
            Identity::Fixed(ip) => Ok(*ip),
        }
    }
}
