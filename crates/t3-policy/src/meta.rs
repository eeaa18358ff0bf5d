//! Tolerant meta JSON parsing into a build tag.
//!
//! Meta is free-form UTF-8 JSON; only the fields the policy consumes are
//! extracted, unknown keys are ignored, and malformed JSON degrades to an
//! empty tag rather than an error. Route fields are accepted both flat
//! (`route_ttl`) and nested under a `route` object; the nested form wins.

use serde_json::Value;

/// FNV-1a 64-bit hash.
#[must_use]
pub fn fnv1a64(data: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in data {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

/// Golden-ratio mix constant for the default type hash.
const TYPE_HASH_MIX: u64 = 0x9E37_79B1_85EB_CA87;

/// Proximity class of a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum ProxClass {
    /// Same device or site.
    Local,
    /// Same neighbourhood.
    Near,
    /// Anywhere else.
    Far,
    /// Not stated.
    #[default]
    Unknown,
}

impl ProxClass {
    /// Parse the meta `class` field.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "local" => Self::Local,
            "near" => Self::Near,
            "far" => Self::Far,
            _ => Self::Unknown,
        }
    }
}

/// The identity and routing fields a policy decision consumes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildTag {
    /// Requester domain, `/`-separated.
    pub domain: String,
    /// Requester build hash, hex.
    pub build_hash: String,
    /// Requester version.
    pub version: u64,
    /// Type digest; derived from domain and version when absent.
    pub type_hash: u64,
    /// Proximity class.
    pub pclass: ProxClass,
    /// Stated radius in metres.
    pub radius_m: u32,
    /// Remaining route hops.
    pub route_ttl: u8,
    /// Hops already taken.
    pub route_hops: u8,
    /// Redirect phase: 0 = initial, 1 = prepared, 2 = accepted.
    pub route_phase: u8,
    /// Originating domain of the route.
    pub route_origin: String,
}

fn get_str<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key).and_then(Value::as_str)
}

fn get_uint(v: &Value, key: &str) -> Option<u64> {
    v.get(key).and_then(Value::as_u64)
}

fn parse_type_hash(s: &str) -> u64 {
    s.strip_prefix("fnv64:").map_or_else(
        || fnv1a64(s.as_bytes()),
        |hex| u64::from_str_radix(hex, 16).unwrap_or_else(|_| fnv1a64(s.as_bytes())),
    )
}

impl BuildTag {
    /// Extract a tag from a meta JSON blob.
    #[must_use]
    pub fn from_meta(meta: &str) -> Self {
        let root: Value = serde_json::from_str(meta).unwrap_or(Value::Null);
        let mut tag = Self {
            domain: get_str(&root, "domain").unwrap_or_default().to_string(),
            build_hash: get_str(&root, "build_hash").unwrap_or_default().to_string(),
            version: get_uint(&root, "version").unwrap_or(0),
            type_hash: get_str(&root, "type_hash").map(parse_type_hash).unwrap_or(0),
            pclass: get_str(&root, "class").map(ProxClass::parse).unwrap_or_default(),
            radius_m: get_uint(&root, "radius_m").unwrap_or(0).min(u64::from(u32::MAX)) as u32,
            route_ttl: get_uint(&root, "route_ttl").unwrap_or(0).min(255) as u8,
            route_hops: get_uint(&root, "route_hops").unwrap_or(0).min(255) as u8,
            route_phase: get_uint(&root, "route_phase").unwrap_or(0).min(2) as u8,
            route_origin: get_str(&root, "origin").unwrap_or_default().to_string(),
        };

        // Nested route group overrides the flat keys.
        if let Some(route) = root.get("route") {
            if let Some(v) = get_uint(route, "ttl") {
                tag.route_ttl = v.min(255) as u8;
            }
            if let Some(v) = get_uint(route, "hops") {
                tag.route_hops = v.min(255) as u8;
            }
            if let Some(v) = get_uint(route, "phase") {
                tag.route_phase = v.min(2) as u8;
            }
            if let Some(s) = get_str(route, "origin") {
                tag.route_origin = s.to_string();
            }
        }

        if tag.type_hash == 0 {
            tag.type_hash =
                fnv1a64(tag.domain.as_bytes()) ^ tag.version.wrapping_mul(TYPE_HASH_MIX);
        }
        tag
    }
}

/// Depth of a domain: number of `/`-separated levels.
#[must_use]
pub fn domain_depth(domain: &str) -> u8 {
    if domain.is_empty() {
        return 0;
    }
    (domain.bytes().filter(|&b| b == b'/').count() + 1).min(255) as u8
}

/// The root of a domain, including its trailing slash when one exists.
#[must_use]
pub fn domain_root(domain: &str) -> &str {
    domain.find('/').map_or(domain, |p| &domain[..=p])
}
