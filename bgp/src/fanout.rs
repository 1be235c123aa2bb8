// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::{NeighborConfig, Relation};
use crate::connection::Connection;
use crate::error::Error;
use crate::messages::{Message, MessageBody};
use crate::policy::export_targets;
use slog::{error, Logger};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;

pub struct Fanout<Cnx: Connection> {
    /// Indexed neighbor address
    egress: BTreeMap<Ipv4Addr, Egress<Cnx>>,
}

//NOTE necessary as #derive is broken for generic types
impl<Cnx: Connection> Default for Fanout<Cnx> {
    fn default() -> Self {
        Self {
            egress: BTreeMap::new(),
        }
    }
}

pub struct Egress<Cnx: Connection> {
    pub config: NeighborConfig,
    pub conn: Cnx,
    pub log: Logger,
}

impl<Cnx: Connection> Egress<Cnx> {
    /// Send `body` over this link, addressed from our side of the link to
    /// the neighbor. Failures are logged and otherwise ignored.
    pub fn send(&self, body: MessageBody) {
        let msg =
            Message::new(self.config.local_addr(), self.config.addr, body);
        self.send_message(&msg);
    }

    /// Send `body` from our side of the link to `dst`, which may be a host
    /// beyond the neighbor.
    pub fn reply(&self, dst: Ipv4Addr, body: MessageBody) {
        let msg = Message::new(self.config.local_addr(), dst, body);
        self.send_message(&msg);
    }

    /// Send a message as is, without readdressing it.
    pub fn send_message(&self, msg: &Message) {
        if let Err(e) = self.conn.send(msg) {
            error!(self.log, "{} send failed: {e}", msg.title();
                "peer" => self.config.addr.to_string()
            );
        }
    }
}

impl<Cnx: Connection> Fanout<Cnx> {
    pub fn add_egress(
        &mut self,
        peer: Ipv4Addr,
        egress: Egress<Cnx>,
    ) -> Result<(), Error> {
        if self.egress.contains_key(&peer) {
            return Err(Error::NeighborExists(peer));
        }
        self.egress.insert(peer, egress);
        Ok(())
    }

    pub fn get(&self, peer: Ipv4Addr) -> Option<&Egress<Cnx>> {
        self.egress.get(&peer)
    }

    pub fn neighbors(&self) -> impl Iterator<Item = &NeighborConfig> {
        self.egress.values().map(|e| &e.config)
    }

    /// Send `body` to every neighbor the export policy allows for an
    /// advertisement learned from `origin` over a `learned_from`
    /// relationship. Returns the neighbors sent to.
    pub fn announce(
        &self,
        origin: Ipv4Addr,
        learned_from: Relation,
        body: &MessageBody,
    ) -> Vec<Ipv4Addr> {
        let targets = export_targets(origin, learned_from, self.neighbors());
        for peer in &targets {
            if let Some(e) = self.egress.get(peer) {
                e.send(body.clone());
            }
        }
        targets
    }

    /// Send `body` to every neighbor.
    pub fn send_all(&self, body: &MessageBody) {
        for e in self.egress.values() {
            e.send(body.clone());
        }
    }
}
