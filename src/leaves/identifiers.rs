//! Identifier and network-address leaves: GUID, IP address,
//! IP endpoint, URI, and dotted-numeric version.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use serde_json::Value as Json;
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::impl_reflect_leaf;
use crate::leaves::get_ci;

impl_reflect_leaf!(Uuid, "Guid", Uuid::nil());
impl_reflect_leaf!(IpAddr, "IPAddress", IpAddr::from([0, 0, 0, 0]));
impl_reflect_leaf!(
    SocketAddr,
    "IPEndPoint",
    SocketAddr::from(([0, 0, 0, 0], 0))
);
impl_reflect_leaf!(Url, "Uri", Url::parse("about:blank").unwrap());

/// A dotted-numeric version of 2 to 4 components (`Major.Minor[.Build[.Revision]]`).
/// Deliberately not `semver::Version`: semantic versioning's mandatory
/// three-component form plus pre-release/build metadata doesn't match this
/// shape, which allows 2-component versions and has no pre-release concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DottedVersion {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl std::fmt::Display for DottedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{build}")?;
            if let Some(revision) = self.revision {
                write!(f, ".{revision}")?;
            }
        }
        Ok(())
    }
}

impl_reflect_leaf!(DottedVersion, "Version", DottedVersion::default());

pub fn guid_to_json(v: &Uuid) -> Json {
    Json::String(v.hyphenated().to_string())
}

pub fn guid_from_json(json: &Json, type_name: &str) -> Result<Uuid> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a GUID string"))?;
    Uuid::parse_str(s).map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn ip_address_to_json(v: &IpAddr) -> Json {
    Json::String(v.to_string())
}

pub fn ip_address_from_json(json: &Json, type_name: &str) -> Result<IpAddr> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected an IP address string"))?;
    IpAddr::from_str(s).map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

/// `{"address": "...", "port": N}`, not the `addr:port` textual form —
/// keeping the two components separate avoids ambiguity with IPv6's own
/// use of `:` inside the address.
pub fn ip_endpoint_to_json(v: &SocketAddr) -> Json {
    serde_json::json!({ "address": v.ip().to_string(), "port": v.port() })
}

pub fn ip_endpoint_from_json(json: &Json, type_name: &str) -> Result<SocketAddr> {
    let obj = json
        .as_object()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected an {address, port} object"))?;
    let address = get_ci(obj, "address")
        .and_then(Json::as_str)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `address`"))?;
    let port = get_ci(obj, "port")
        .and_then(Json::as_u64)
        .ok_or_else(|| Error::coercion_failed(type_name, "missing `port`"))?;
    let ip = IpAddr::from_str(address).map_err(|e| Error::coercion_failed(type_name, e.to_string()))?;
    let port = u16::try_from(port).map_err(|_| Error::coercion_failed(type_name, "port out of range"))?;
    Ok(SocketAddr::new(ip, port))
}

pub fn uri_to_json(v: &Url) -> Json {
    Json::String(v.to_string())
}

pub fn uri_from_json(json: &Json, type_name: &str) -> Result<Url> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a URI string"))?;
    Url::parse(s).map_err(|e| Error::coercion_failed(type_name, e.to_string()))
}

pub fn version_to_json(v: &DottedVersion) -> Json {
    Json::String(v.to_string())
}

pub fn version_from_json(json: &Json, type_name: &str) -> Result<DottedVersion> {
    let s = json
        .as_str()
        .ok_or_else(|| Error::coercion_failed(type_name, "expected a dotted version string"))?;
    let parts: Vec<&str> = s.split('.').collect();
    if !(2..=4).contains(&parts.len()) {
        return Err(Error::coercion_failed(
            type_name,
            format!("`{s}` must have 2 to 4 dotted components"),
        ));
    }
    let parse = |s: &str| s.parse::<u32>().map_err(|e| Error::coercion_failed(type_name, e.to_string()));
    Ok(DottedVersion {
        major: parse(parts[0])?,
        minor: parse(parts[1])?,
        build: parts.get(2).map(|s| parse(s)).transpose()?,
        revision: parts.get(3).map(|s| parse(s)).transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guid_round_trips_through_hyphenated_string() {
        let v = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let json = guid_to_json(&v);
        assert_eq!(guid_from_json(&json, "Guid").unwrap(), v);
    }

    #[test]
    fn ip_address_round_trips() {
        let v: IpAddr = "192.168.0.1".parse().unwrap();
        let json = ip_address_to_json(&v);
        assert_eq!(ip_address_from_json(&json, "IPAddress").unwrap(), v);
    }

    #[test]
    fn ip_endpoint_round_trips_as_address_port_object() {
        let v: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        let json = ip_endpoint_to_json(&v);
        assert_eq!(json, serde_json::json!({ "address": "127.0.0.1", "port": 8080 }));
        assert_eq!(ip_endpoint_from_json(&json, "IPEndPoint").unwrap(), v);
    }

    #[test]
    fn ip_endpoint_from_json_rejects_port_out_of_range() {
        let json = serde_json::json!({ "address": "127.0.0.1", "port": 70000 });
        assert!(ip_endpoint_from_json(&json, "IPEndPoint").is_err());
    }

    #[test]
    fn ip_endpoint_from_json_accepts_differently_cased_keys() {
        let json = serde_json::json!({ "Address": "127.0.0.1", "Port": 8080 });
        let v: SocketAddr = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(ip_endpoint_from_json(&json, "IPEndPoint").unwrap(), v);
    }

    #[test]
    fn uri_round_trips() {
        let v = Url::parse("https://example.com/path?q=1").unwrap();
        let json = uri_to_json(&v);
        assert_eq!(uri_from_json(&json, "Uri").unwrap(), v);
    }

    #[test]
    fn dotted_version_two_component_round_trips() {
        let v = DottedVersion { major: 1, minor: 2, build: None, revision: None };
        assert_eq!(v.to_string(), "1.2");
        assert_eq!(version_from_json(&version_to_json(&v), "Version").unwrap(), v);
    }

    #[test]
    fn dotted_version_four_component_round_trips() {
        let v = DottedVersion { major: 1, minor: 2, build: Some(3), revision: Some(4) };
        assert_eq!(v.to_string(), "1.2.3.4");
        assert_eq!(version_from_json(&version_to_json(&v), "Version").unwrap(), v);
    }

    #[test]
    fn dotted_version_rejects_single_component() {
        assert!(version_from_json(&Json::String("1".to_string()), "Version").is_err());
    }

    #[test]
    fn dotted_version_rejects_five_components() {
        assert!(version_from_json(&Json::String("1.2.3.4.5".to_string()), "Version").is_err());
    }
}
