// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::prefix::Prefix4;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;

/// Route origin, in decreasing order of preference.
#[derive(
    Debug, Copy, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Hash,
)]
pub enum Origin {
    #[default]
    #[serde(rename = "IGP")]
    Igp,
    #[serde(rename = "EGP")]
    Egp,
    #[serde(rename = "UNK", alias = "UNKNOWN")]
    Unknown,
}

impl Origin {
    /// Higher is better.
    pub fn rank(&self) -> u8 {
        match self {
            Origin::Igp => 2,
            Origin::Egp => 1,
            Origin::Unknown => 0,
        }
    }
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Igp => write!(f, "IGP"),
            Origin::Egp => write!(f, "EGP"),
            Origin::Unknown => write!(f, "UNK"),
        }
    }
}

/// A single entry of the routing table.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub struct Route {
    pub prefix: Prefix4,

    /// The neighbor this route was learned from. Also the next hop for
    /// traffic matching the prefix.
    pub peer: Ipv4Addr,

    pub local_pref: u32,

    /// Autonomous systems traversed, most recently added first.
    pub as_path: Vec<u32>,

    pub origin: Origin,

    /// Set when the route was injected by the originating AS itself.
    pub self_origin: bool,
}

impl Route {
    /// True if every attribute other than the prefix matches.
    pub fn same_attributes(&self, other: &Route) -> bool {
        self.peer == other.peer
            && self.local_pref == other.local_pref
            && self.as_path == other.as_path
            && self.origin == other.origin
            && self.self_origin == other.self_origin
    }

    /// Two routes can be merged into their parent prefix when they carry the
    /// same attributes and cover the two halves of that parent.
    pub fn is_sibling_of(&self, other: &Route) -> bool {
        self.same_attributes(other) && self.prefix.is_sibling(&other.prefix)
    }

    /// A copy of this route re-homed onto `prefix`.
    pub fn with_prefix(&self, prefix: Prefix4) -> Route {
        Route {
            prefix,
            ..self.clone()
        }
    }
}

impl Display for Route {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[prefix={}, peer={}, local_pref={}, as_path={:?}, origin={}, \
             self_origin={}]",
            self.prefix,
            self.peer,
            self.local_pref,
            self.as_path,
            self.origin,
            self.self_origin,
        )
    }
}
