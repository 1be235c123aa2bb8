// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Export and transit policy derived from neighbor relationships.
//!
//! Routes learned from a customer are exported to every other neighbor.
//! Routes learned from a peer or a provider are exported to customers only,
//! so the router never provides free transit between two non-customers.
//! Traffic follows the same rule: data is forwarded when it either arrived
//! from a customer or is headed to one.

use crate::config::{NeighborConfig, Relation};
use std::net::Ipv4Addr;

/// Whether an advertisement learned over a `learned_from` relationship may
/// be exported to a neighbor with relationship `candidate`.
pub fn exports_to(learned_from: Relation, candidate: Relation) -> bool {
    learned_from == Relation::Customer || candidate == Relation::Customer
}

/// Whether traffic arriving from `ingress` may leave toward `egress`.
pub fn transits(ingress: Relation, egress: Relation) -> bool {
    ingress == Relation::Customer || egress == Relation::Customer
}

/// The neighbors an advertisement from `origin` is exported to, in the
/// order given. The origin itself is never a target.
pub fn export_targets<'a, I>(
    origin: Ipv4Addr,
    learned_from: Relation,
    neighbors: I,
) -> Vec<Ipv4Addr>
where
    I: IntoIterator<Item = &'a NeighborConfig>,
{
    neighbors
        .into_iter()
        .filter(|n| n.addr != origin)
        .filter(|n| exports_to(learned_from, n.relation))
        .map(|n| n.addr)
        .collect()
}
