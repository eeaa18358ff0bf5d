//! Route overlay helpers.
//!
//! The policy never rewrites meta; these helpers let the *caller* advance a
//! route between rounds: decrement TTL, bump hops, stamp the via/next
//! domains and the phase, or mark terminal audit outcomes. Each function
//! returns a fresh meta string; inputs are never mutated. Malformed meta is
//! replaced by a fresh object carrying only the route keys.

use serde_json::{Map, Value};

use crate::error::PolicyError;
use crate::meta::BuildTag;

fn as_object(meta: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(meta) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn render(map: Map<String, Value>) -> String {
    Value::Object(map).to_string()
}

/// Apply a phased route overlay: set hops, TTL, via/next, and the phase.
///
/// Returns `None` when `ttl_after` is zero (no forward possible); the caller
/// keeps the original meta.
#[must_use]
pub fn with_route_overlay(
    meta: &str,
    via: Option<&str>,
    next: Option<&str>,
    ttl_after: u8,
    hops_inc: u8,
    phase: u8,
) -> Option<String> {
    if ttl_after == 0 {
        return None;
    }
    let tag = BuildTag::from_meta(meta);
    let mut map = as_object(meta);
    map.insert(
        "route_hops".to_string(),
        Value::from(u64::from(tag.route_hops) + u64::from(hops_inc)),
    );
    map.insert("route_ttl".to_string(), Value::from(ttl_after));
    if let Some(via) = via {
        if !via.is_empty() {
            map.insert("route_via".to_string(), Value::from(via));
        }
    }
    if let Some(next) = next {
        if !next.is_empty() {
            map.insert("route_next".to_string(), Value::from(next));
        }
    }
    map.insert("route_phase".to_string(), Value::from(phase.min(2)));
    Some(render(map))
}

/// Advance meta into round 2 of PREP/ACCEPT: phase 1, one hop taken, TTL
/// decremented.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidRoute`] when the TTL is already exhausted.
pub fn advance_to_prep(meta: &str, via: &str) -> Result<String, PolicyError> {
    let tag = BuildTag::from_meta(meta);
    if tag.route_ttl == 0 {
        return Err(PolicyError::InvalidRoute {
            reason: "ttl exhausted",
        });
    }
    Ok(
        with_route_overlay(meta, Some(via), None, tag.route_ttl - 1, 1, 1)
            .unwrap_or_else(|| meta.to_string()),
    )
}

/// Stamp an accepted redirect: phase 2, the target as `route_next`, TTL set
/// to the emitted `ttl_after`.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidRoute`] when `ttl_after` is zero.
pub fn stamp_accept(
    meta: &str,
    via: &str,
    next: &str,
    ttl_after: u8,
) -> Result<String, PolicyError> {
    with_route_overlay(meta, Some(via), Some(next), ttl_after, 1, 2).ok_or(
        PolicyError::InvalidRoute {
            reason: "ttl exhausted",
        },
    )
}

/// Mark a route as accepted for audit trails.
#[must_use]
pub fn mark_accepted(meta: &str) -> String {
    let mut map = as_object(meta);
    map.insert("route_accepted".to_string(), Value::from(true));
    render(map)
}

/// Mark a route as sandboxed, with a reason, for audit trails.
#[must_use]
pub fn mark_sandbox(meta: &str, reason: &str) -> String {
    let mut map = as_object(meta);
    map.insert("route_sandbox".to_string(), Value::from(true));
    map.insert("route_reason".to_string(), Value::from(reason));
    render(map)
}
