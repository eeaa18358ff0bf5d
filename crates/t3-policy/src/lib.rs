//! Meta-only access policy for T3 containers.
//!
//! A [`Policy`] decides read access from a container's meta JSON alone;
//! payload bytes are never touched before approval. Decisions are one of
//! `Internal`, `CoexistAccepted`, `UnknownSandbox`, or `Reject`; the first
//! two grant payload read.
//!
//! When overlap candidates share the requester's domain root, redirection is
//! explicit and two-phase: round 1 selects a neighbour through a
//! deterministic ternary rotor and asks it to *prepare* a target; round 2
//! may *accept* the prepared target and emit the redirect. The caller
//! advances the route phase, TTL, and hop count in meta between rounds via
//! the [`route`] helpers.

#![forbid(unsafe_code)]

mod error;
mod meta;
mod policy;
pub mod route;

pub use error::PolicyError;
pub use meta::{fnv1a64, BuildTag, ProxClass};
pub use policy::{
    AcceptFn, Coexist, Decision, DecisionEx, InternalAllow, Membership, NeighborFn, NextHop,
    Policy, PrepareFn, RedirectRule, SandboxHook,
};
