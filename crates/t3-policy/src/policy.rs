//! The decision engine.

use tracing::{debug, warn};

use crate::meta::{domain_depth, domain_root, fnv1a64, BuildTag, ProxClass};

/// Round-1 neighbour preparation callback: given the requester, the selected
/// neighbour, and the tag, return a prepared target domain (or `None`).
pub type PrepareFn = Box<dyn Fn(&str, &str, &BuildTag) -> Option<String>>;

/// Round-2 acceptance callback: given the requester, the prepared target,
/// and the tag, accept or refuse the redirect.
pub type AcceptFn = Box<dyn Fn(&str, &str, &BuildTag) -> bool>;

/// Meta-only neighbour approval query.
pub type NeighborFn = Box<dyn Fn(&BuildTag) -> bool>;

/// Audit hook invoked when a requester lands in the sandbox.
pub type SandboxHook = Box<dyn Fn(&BuildTag, &str)>;

/// Access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Requester belongs to a configured membership.
    Internal,
    /// External requester admitted by a coexistence rule or neighbour.
    CoexistAccepted,
    /// Unrecognized requester; quarantined, audit hook fired.
    #[default]
    UnknownSandbox,
    /// Guard failure (disallowed root or excessive depth).
    Reject,
}

impl Decision {
    /// Whether this decision grants payload read.
    #[must_use]
    pub const fn grants_read(self) -> bool {
        matches!(self, Self::Internal | Self::CoexistAccepted)
    }
}

/// A membership: requesters under this prefix with a matching hash are
/// internal.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    /// Domain prefix.
    pub domain_prefix: String,
    /// Required build hash prefix (hex); empty matches anything.
    pub hash_prefix_hex: String,
    /// Radius granted to this membership as an overlap candidate; 0 means
    /// unconstrained.
    pub local_radius_m: u32,
}

/// An explicit internal allowance outside the memberships.
#[derive(Debug, Clone, Default)]
pub struct InternalAllow {
    /// Domain prefix.
    pub domain_prefix: String,
    /// Required build hash prefix (hex); empty matches anything.
    pub hash_prefix_hex: String,
}

/// An admitted external coexistence rule.
#[derive(Debug, Clone)]
pub struct Coexist {
    /// Domain prefix.
    pub domain_prefix: String,
    /// Required build hash prefix (hex); empty matches anything.
    pub hash_prefix_hex: String,
    /// Maximum stated radius.
    pub radius_max_m: u32,
    /// Most distant admissible proximity class.
    pub max_class: ProxClass,
}

impl Default for Coexist {
    fn default() -> Self {
        Self {
            domain_prefix: String::new(),
            hash_prefix_hex: String::new(),
            radius_max_m: 0,
            max_class: ProxClass::Near,
        }
    }
}

/// A static redirect rule applied when no overlap candidates exist.
#[derive(Debug, Clone)]
pub struct RedirectRule {
    /// Requesters under this prefix are redirected.
    pub from_domain_prefix: String,
    /// Redirect target.
    pub to_domain_prefix: String,
    /// Inclusive TTL window in which the rule applies.
    pub ttl_min: u8,
    /// Upper end of the TTL window.
    pub ttl_max: u8,
}

/// An emitted next hop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextHop {
    /// Whether a redirect was emitted.
    pub should_redirect: bool,
    /// Redirect target domain.
    pub target_domain: String,
    /// TTL to present after the hop.
    pub ttl_after: u8,
}

/// A full decision: outcome, the parsed tag, and any next hop.
#[derive(Debug, Clone, Default)]
pub struct DecisionEx {
    /// The access outcome.
    pub decision: Decision,
    /// Tag parsed from meta.
    pub tag: BuildTag,
    /// Redirect output of the PREP/ACCEPT machinery.
    pub next: NextHop,
}

/// A cached round-1 preparation, keyed by requester domain.
#[derive(Debug, Clone)]
struct Prep {
    requester: String,
    target: String,
    window: u8,
}

/// An overlap candidate in the requester's root.
#[derive(Debug, Clone)]
struct Candidate {
    domain_prefix: String,
    is_member: bool,
    radius_max: u32,
    depth: u8,
}

/// Access policy instance.
///
/// The rotor tick and prep cache are the only mutable state; a decision
/// takes `&mut self` and callers needing concurrency wrap the instance in
/// their own lock for the duration of a decision.
#[derive(Default)]
pub struct Policy {
    /// Memberships, highest priority first.
    pub memberships: Vec<Membership>,
    /// Explicit internal allow-list.
    pub internal_allow: Vec<InternalAllow>,
    /// Admitted external coexistences.
    pub coexist_allow: Vec<Coexist>,
    /// Domain roots this policy accepts; empty disables the guard.
    pub allowed_roots: Vec<String>,
    /// Maximum domain depth; 0 disables the guard.
    pub max_depth: u8,
    /// Domains whose appearance is expected; empty disables the check.
    pub visual_whitelist_domains: Vec<String>,
    /// Static redirect rules.
    pub redirects: Vec<RedirectRule>,
    /// Global TTL ceiling for any redirect chain.
    pub ttl_global_max: u8,
    /// Global hop ceiling for any redirect chain.
    pub hops_global_max: u8,
    /// Whether bottom-tier overlap redirection runs at all.
    pub enable_overlap_redirect: bool,
    /// Round-1 preparation callback.
    pub overlap_prepare: Option<PrepareFn>,
    /// Round-2 acceptance callback.
    pub overlap_accept: Option<AcceptFn>,
    /// Neighbour approval query.
    pub query_neighbor: Option<NeighborFn>,
    /// Sandbox audit hook.
    pub on_unknown_sandbox: Option<SandboxHook>,

    rotor_tick: u64,
    prepared: Vec<Prep>,
}

fn match_hash_prefix(hash: &str, prefix: &str) -> bool {
    prefix.is_empty() || hash.starts_with(prefix)
}

/// Balanced ternary wave over the rotor tick.
const fn tri_wave(tick: u64) -> i8 {
    match tick % 3 {
        0 => -1,
        1 => 0,
        _ => 1,
    }
}

/// Balanced score of a proximity class.
const fn bal_from_prox(pc: ProxClass) -> i8 {
    match pc {
        ProxClass::Local => -1,
        ProxClass::Near | ProxClass::Unknown => 0,
        ProxClass::Far => 1,
    }
}

/// Clamp a balanced sum back into a trit and lift to unbalanced.
fn unb_from_bal_sum(a: i8, b: i8) -> u32 {
    ((a + b).clamp(-1, 1) + 1) as u32
}

/// Deterministic rotor seed from the tag.
fn seed_from(tag: &BuildTag) -> u32 {
    (fnv1a64(tag.domain.as_bytes())
        ^ tag.version.wrapping_mul(0x9E37_79B1_85EB_CA87)
        ^ u64::from(tag.radius_m)) as u32
}

impl Policy {
    /// A permissive default shell: everything unset, bounded TTL/hops,
    /// overlap redirection enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 3,
            ttl_global_max: 3,
            hops_global_max: 6,
            enable_overlap_redirect: true,
            ..Self::default()
        }
    }

    /// Current rotor tick (advances once per decision).
    #[must_use]
    pub const fn rotor_tick(&self) -> u64 {
        self.rotor_tick
    }

    /// Whether a round-1 preparation is cached for `requester`.
    #[must_use]
    pub fn has_prepared(&self, requester: &str) -> bool {
        self.prepared
            .iter()
            .any(|p| p.requester == requester && !p.target.is_empty())
    }

    /// Meta-only approve predicate for container readers.
    pub fn approve(&mut self, meta: &str) -> bool {
        self.decide(meta).grants_read()
    }

    /// Decide access, discarding the redirect detail.
    pub fn decide(&mut self, meta: &str) -> Decision {
        self.decide_ex(meta).decision
    }

    /// Decide access from meta alone.
    pub fn decide_ex(&mut self, meta: &str) -> DecisionEx {
        let tick = self.rotor_tick;
        self.rotor_tick = self.rotor_tick.wrapping_add(1);
        self.prune_prepared();

        let tag = BuildTag::from_meta(meta);
        let mut out = DecisionEx {
            decision: Decision::UnknownSandbox,
            tag,
            next: NextHop::default(),
        };
        let tag = &out.tag;

        // Root and depth guards reject outright.
        if !self.allowed_roots.is_empty()
            && !self.allowed_roots.iter().any(|r| tag.domain.starts_with(r.as_str()))
        {
            debug!(domain = %tag.domain, "rejected: outside allowed roots");
            out.decision = Decision::Reject;
            return out;
        }
        if self.max_depth > 0 && domain_depth(&tag.domain) > self.max_depth {
            debug!(domain = %tag.domain, "rejected: domain too deep");
            out.decision = Decision::Reject;
            return out;
        }

        // Memberships and the explicit allow-list are internal.
        if self
            .memberships
            .iter()
            .any(|m| tag.domain.starts_with(&m.domain_prefix) && match_hash_prefix(&tag.build_hash, &m.hash_prefix_hex))
        {
            out.decision = Decision::Internal;
            return out;
        }
        if self
            .internal_allow
            .iter()
            .any(|a| tag.domain.starts_with(&a.domain_prefix) && match_hash_prefix(&tag.build_hash, &a.hash_prefix_hex))
        {
            out.decision = Decision::Internal;
            return out;
        }

        // Coexistence rules, gated by the visual whitelist.
        for c in &self.coexist_allow {
            let matches = tag.domain.starts_with(&c.domain_prefix)
                && match_hash_prefix(&tag.build_hash, &c.hash_prefix_hex)
                && tag.radius_m <= c.radius_max_m
                && (tag.pclass == ProxClass::Unknown || tag.pclass <= c.max_class);
            if !matches {
                continue;
            }
            if !self.visual_whitelist_domains.is_empty()
                && !self
                    .visual_whitelist_domains
                    .iter()
                    .any(|v| tag.domain.starts_with(v.as_str()))
            {
                break;
            }
            out.decision = Decision::CoexistAccepted;
            return out;
        }

        // Meta-only neighbour approval.
        if let Some(q) = &self.query_neighbor {
            if q(tag) {
                out.decision = Decision::CoexistAccepted;
                return out;
            }
        }

        // Bounded redirect machinery.
        let ttl_cap = tag.route_ttl.min(self.ttl_global_max);
        if ttl_cap > 0 && tag.route_hops < self.hops_global_max {
            let candidates = if self.enable_overlap_redirect {
                self.overlap_bottom_candidates(tag)
            } else {
                Vec::new()
            };

            if !candidates.is_empty() {
                return self.overlap_rounds(out, &candidates, ttl_cap, tick, meta);
            }

            for rule in &self.redirects {
                if tag.domain.starts_with(&rule.from_domain_prefix)
                    && ttl_cap >= rule.ttl_min
                    && ttl_cap <= rule.ttl_max
                {
                    out.next = NextHop {
                        should_redirect: true,
                        target_domain: rule.to_domain_prefix.clone(),
                        ttl_after: ttl_cap - 1,
                    };
                    return out;
                }
            }
            if let Some(m) = self
                .memberships
                .iter()
                .find(|m| !m.domain_prefix.starts_with(tag.domain.as_str()))
            {
                out.next = NextHop {
                    should_redirect: true,
                    target_domain: m.domain_prefix.clone(),
                    ttl_after: ttl_cap - 1,
                };
                return out;
            }
            if let Some(c) = self.coexist_allow.first() {
                out.next = NextHop {
                    should_redirect: true,
                    target_domain: c.domain_prefix.clone(),
                    ttl_after: ttl_cap - 1,
                };
                return out;
            }
        }

        self.sandbox(&out.tag, meta);
        out
    }

    /// The two-round PREP/ACCEPT protocol over the bottom-tier candidates.
    fn overlap_rounds(
        &mut self,
        mut out: DecisionEx,
        candidates: &[Candidate],
        ttl_cap: u8,
        tick: u64,
        meta: &str,
    ) -> DecisionEx {
        let tag = out.tag.clone();
        if tag.route_phase < 1 {
            // Round 1: pick a neighbour by rotor, ask it to prepare a target.
            let wave = tri_wave(tick);
            let prox = bal_from_prox(tag.pclass);
            let idx = (seed_from(&tag) as usize + unb_from_bal_sum(wave, prox) as usize)
                % candidates.len();
            let neighbour = &candidates[idx];
            debug!(requester = %tag.domain, neighbour = %neighbour.domain_prefix, "overlap round 1");

            if let Some(prepare) = &self.overlap_prepare {
                if let Some(target) = prepare(&tag.domain, &neighbour.domain_prefix, &tag) {
                    if !target.is_empty() {
                        self.upsert_prepared(&tag.domain, target);
                    }
                }
            }
            // No redirect in round 1; the caller advances phase/TTL/hops.
            return out;
        }

        // Round 2: accept a cached preparation or sandbox.
        if let Some(pos) = self.prepared.iter().position(|p| p.requester == tag.domain) {
            let target = self.prepared[pos].target.clone();
            let accepted = self
                .overlap_accept
                .as_ref()
                .map_or(true, |accept| accept(&tag.domain, &target, &tag));
            self.prepared[pos].target.clear();
            self.prepared[pos].window = 0;

            if accepted && !target.is_empty() {
                debug!(requester = %tag.domain, %target, "overlap round 2 accepted");
                out.next = NextHop {
                    should_redirect: true,
                    target_domain: target,
                    ttl_after: ttl_cap - 1,
                };
                return out;
            }
        }
        self.sandbox(&tag, meta);
        out
    }

    /// Candidates sharing the requester's root at the deepest represented
    /// depth, admissible for the requester's radius.
    fn overlap_bottom_candidates(&self, tag: &BuildTag) -> Vec<Candidate> {
        let mut known: Vec<Candidate> = Vec::new();
        for m in &self.memberships {
            known.push(Candidate {
                domain_prefix: m.domain_prefix.clone(),
                is_member: true,
                radius_max: m.local_radius_m,
                depth: domain_depth(&m.domain_prefix),
            });
        }
        for c in &self.coexist_allow {
            known.push(Candidate {
                domain_prefix: c.domain_prefix.clone(),
                is_member: false,
                radius_max: c.radius_max_m,
                depth: domain_depth(&c.domain_prefix),
            });
        }
        known.retain(|c| domain_root(&c.domain_prefix) == domain_root(&tag.domain));
        let Some(max_depth) = known.iter().map(|c| c.depth).max() else {
            return Vec::new();
        };
        known.retain(|c| c.depth == max_depth && (c.is_member || tag.radius_m <= c.radius_max));
        known
    }

    fn upsert_prepared(&mut self, requester: &str, target: String) {
        if let Some(p) = self.prepared.iter_mut().find(|p| p.requester == requester) {
            p.target = target;
            p.window = 1;
        } else {
            self.prepared.push(Prep {
                requester: requester.to_string(),
                target,
                window: 1,
            });
        }
    }

    /// Decrement prep windows and drop consumed entries. A prepared target
    /// survives until round 2 consumes it.
    fn prune_prepared(&mut self) {
        for p in &mut self.prepared {
            p.window = p.window.saturating_sub(1);
        }
        self.prepared.retain(|p| !(p.window == 0 && p.target.is_empty()));
    }

    fn sandbox(&self, tag: &BuildTag, meta: &str) {
        warn!(domain = %tag.domain, "requester sandboxed");
        if let Some(hook) = &self.on_unknown_sandbox {
            hook(tag, meta);
        }
    }
}
