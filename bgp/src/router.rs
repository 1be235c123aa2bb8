// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::{NeighborConfig, RouterConfig};
use crate::connection::Connection;
use crate::error::Error;
use crate::fanout::{Egress, Fanout};
use crate::log::router_log;
use crate::messages::{
    Message, MessageBody, TableMessage, UpdateMessage, WithdrawMessage,
    WithdrawnPrefix,
};
use crate::policy::transits;
use rdb::{Db, Prefix4};
use slog::Logger;
use std::net::Ipv4Addr;

const UNIT_ROUTER: &str = "router";

pub struct Router<Cnx: Connection> {
    /// The routing database this router updates in response to update and
    /// withdraw messages from its neighbors.
    pub db: Db,

    /// The static configuration associated with this router.
    pub config: RouterConfig,

    /// Outbound links to every neighbor, indexed by neighbor address.
    fanout: Fanout<Cnx>,

    /// The logger used by this router.
    log: Logger,
}

impl<Cnx: Connection> Router<Cnx> {
    pub fn new(config: RouterConfig, db: Db, log: Logger) -> Router<Cnx> {
        Self {
            db,
            config,
            fanout: Fanout::default(),
            log,
        }
    }

    pub fn add_neighbor(
        &mut self,
        config: NeighborConfig,
        conn: Cnx,
    ) -> Result<(), Error> {
        router_log!(self, info, "adding neighbor {}", config;
            "relation" => config.relation.to_string()
        );
        let peer = config.addr;
        self.fanout.add_egress(
            peer,
            Egress {
                config,
                conn,
                log: self.log.clone(),
            },
        )
    }

    pub fn neighbor(&self, addr: Ipv4Addr) -> Option<&NeighborConfig> {
        self.fanout.get(addr).map(|e| &e.config)
    }

    fn require_neighbor(
        &self,
        addr: Ipv4Addr,
    ) -> Result<&Egress<Cnx>, Error> {
        self.fanout.get(addr).ok_or(Error::UnknownNeighbor(addr))
    }

    /// Announce ourselves to every neighbor.
    pub fn handshake(&self) {
        router_log!(self, info, "sending handshake to all neighbors");
        self.fanout.send_all(&MessageBody::Handshake);
    }

    /// Handle an update that arrived on the link to `link`. The route is
    /// installed with `link` as its peer and, unless it was already known,
    /// re-advertised under the export policy. Returns the neighbors the
    /// update was re-advertised to.
    pub fn on_update(
        &mut self,
        link: Ipv4Addr,
        update: UpdateMessage,
    ) -> Result<Vec<Ipv4Addr>, Error> {
        let relation = self.require_neighbor(link)?.config.relation;
        let route = update.to_route(link)?;
        let export = MessageBody::Update(update.export(self.config.asn)?);

        if !self.db.update(route) {
            return Ok(Vec::new());
        }

        let targets = self.fanout.announce(link, relation, &export);
        router_log!(self, debug, "re-advertised update";
            "peer" => link.to_string(),
            "network" => update.network.to_string(),
            "targets" => format!("{targets:?}")
        );
        Ok(targets)
    }

    /// Handle a withdraw that arrived on the link to `link`. Every prefix is
    /// validated before anything is removed. Only the prefixes that removed
    /// a route are passed on, under the same export policy as updates.
    pub fn on_withdraw(
        &mut self,
        link: Ipv4Addr,
        withdraw: WithdrawMessage,
    ) -> Result<Vec<Ipv4Addr>, Error> {
        let relation = self.require_neighbor(link)?.config.relation;
        let prefixes = withdraw
            .prefixes
            .iter()
            .map(WithdrawnPrefix::prefix)
            .collect::<Result<Vec<Prefix4>, _>>()?;

        let mut withdrawn = Vec::new();
        for prefix in prefixes {
            if !self.db.withdraw(prefix, link).is_empty() {
                withdrawn.push(WithdrawnPrefix::from(prefix));
            }
        }

        if withdrawn.is_empty() {
            router_log!(self, debug, "withdraw changed nothing";
                "peer" => link.to_string()
            );
            return Ok(Vec::new());
        }

        let export = MessageBody::Withdraw(WithdrawMessage {
            prefixes: withdrawn,
        });
        Ok(self.fanout.announce(link, relation, &export))
    }

    /// Forward a data message toward its destination. When there is no
    /// route, or the transit policy forbids the chosen next hop, a no route
    /// message is sent back to the source instead. Returns the next hop the
    /// message was forwarded to, if any.
    pub fn on_data(
        &self,
        link: Ipv4Addr,
        msg: &Message,
    ) -> Result<Option<Ipv4Addr>, Error> {
        let ingress = self.require_neighbor(link)?;

        let next_hop = match self.db.lookup(msg.dst) {
            Some(route) => self.fanout.get(route.peer).filter(|egress| {
                transits(ingress.config.relation, egress.config.relation)
            }),
            None => None,
        };

        match next_hop {
            Some(egress) => {
                egress.send_message(msg);
                Ok(Some(egress.config.addr))
            }
            None => {
                router_log!(self, info, "no route to {}", msg.dst;
                    "peer" => link.to_string(),
                    "src" => msg.src.to_string()
                );
                ingress.reply(msg.src, MessageBody::NoRoute);
                Ok(None)
            }
        }
    }

    /// Reply to a dump request with the full table.
    pub fn on_dump(&self, link: Ipv4Addr, msg: &Message) -> Result<(), Error> {
        let ingress = self.require_neighbor(link)?;
        let table = TableMessage::from(self.db.table().routes());
        router_log!(self, debug, "dumping table";
            "peer" => link.to_string(),
            "routes" => table.routes.len()
        );
        ingress.reply(msg.src, MessageBody::Table(table));
        Ok(())
    }
}
