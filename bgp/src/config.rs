// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// The business relationship this router has with a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// The neighbor pays us for transit.
    #[serde(rename = "cust")]
    Customer,
    /// Settlement free peering.
    #[serde(rename = "peer")]
    Peer,
    /// We pay the neighbor for transit.
    #[serde(rename = "prov")]
    Provider,
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cust" => Ok(Relation::Customer),
            "peer" => Ok(Relation::Peer),
            "prov" => Ok(Relation::Provider),
            other => Err(Error::InvalidRelation(other.to_string())),
        }
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Relation::Customer => write!(f, "cust"),
            Relation::Peer => write!(f, "peer"),
            Relation::Provider => write!(f, "prov"),
        }
    }
}

/// A neighbor link, written on the command line as
/// `<port>-<neighbor address>-<relation>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborConfig {
    /// Local UDP port the neighbor listens on.
    pub port: u16,
    pub addr: Ipv4Addr,
    pub relation: Relation,
}

impl NeighborConfig {
    /// This router's own address on the link to the neighbor: the `.1` host
    /// of the neighbor's /24.
    pub fn local_addr(&self) -> Ipv4Addr {
        let [a, b, c, _] = self.addr.octets();
        Ipv4Addr::new(a, b, c, 1)
    }
}

impl FromStr for NeighborConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidNeighbor(s.to_string());

        let mut parts = s.splitn(3, '-');
        let (Some(port), Some(addr), Some(relation)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            port: port.parse().map_err(|_| invalid())?,
            addr: addr.parse().map_err(|_| invalid())?,
            relation: relation.parse()?,
        })
    }
}

impl Display for NeighborConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.port, self.addr, self.relation)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    pub asn: u32,
}
