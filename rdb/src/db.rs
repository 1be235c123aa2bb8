// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The routing database (rdb).
//!
//! The database owns every live route, the advertisements they came from and
//! the log of aggregation merges that produced some of them. It is driven by
//! a single event loop, so nothing in here is shared or locked.
use crate::aggregate::{
    aggregate, disaggregate, AggregationLog, AggregationRecord,
};
use crate::bestpath::bestpath;
use crate::log::{aggregate_log, rdb_log};
use crate::prefix::Prefix4;
use crate::types::Route;
use itertools::Itertools;
use slog::Logger;
use std::net::Ipv4Addr;

/// The set of live routes, kept in insertion order so that scans over the
/// table are reproducible.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    routes: Vec<Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `route` to the table. Returns false, leaving the table untouched,
    /// if an identical route is already present.
    pub fn insert(&mut self, route: Route) -> bool {
        if self.contains(&route) {
            return false;
        }
        self.routes.push(route);
        true
    }

    pub fn contains(&self, route: &Route) -> bool {
        self.routes.contains(route)
    }

    /// Remove every route matching `predicate`, returning the removed routes
    /// in table order.
    pub fn remove<F>(&mut self, mut predicate: F) -> Vec<Route>
    where
        F: FnMut(&Route) -> bool,
    {
        let (removed, kept): (Vec<Route>, Vec<Route>) =
            std::mem::take(&mut self.routes)
                .into_iter()
                .partition(|route| predicate(route));
        self.routes = kept;
        removed
    }

    pub fn all_routes_for(&self, prefix: Prefix4) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|route| route.prefix == prefix)
            .collect()
    }

    /// All routes covering `address` with the longest matching prefix
    /// length.
    pub fn longest_matches(&self, address: Ipv4Addr) -> Vec<&Route> {
        self.routes
            .iter()
            .filter_map(|route| {
                route.prefix.match_length(address).map(|len| (len, route))
            })
            .max_set_by_key(|(len, _)| *len)
            .into_iter()
            .map(|(_, route)| route)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Route> {
        self.routes.clone()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Remove the routes at indices `i` and `j`, returning them in that
    /// order.
    pub(crate) fn take_pair(&mut self, i: usize, j: usize) -> (Route, Route) {
        if i > j {
            let a = self.routes.remove(i);
            let b = self.routes.remove(j);
            (a, b)
        } else {
            let b = self.routes.remove(j);
            let a = self.routes.remove(i);
            (a, b)
        }
    }
}

/// The central routing information base.
///
/// Advertisements are kept apart from the table they produce. The table
/// holds aggregates that no neighbor advertised, and an advertisement may
/// coincide with an aggregate, so withdrawals are matched against the
/// advertisements and the table is repaired from them afterwards.
pub struct Db {
    table: RoutingTable,
    aggregates: AggregationLog,
    advertised: Vec<Route>,
    log: Logger,
}

impl Db {
    pub fn new(log: Logger) -> Self {
        Self {
            table: RoutingTable::new(),
            aggregates: AggregationLog::new(),
            advertised: Vec::new(),
            log,
        }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn aggregations(&self) -> &[AggregationRecord] {
        self.aggregates.records()
    }

    /// Routes currently advertised by neighbors, in arrival order.
    pub fn advertised(&self) -> &[Route] {
        &self.advertised
    }

    /// True if `route` is covered by the table, either as a live entry or
    /// absorbed into an aggregate.
    pub fn knows(&self, route: &Route) -> bool {
        self.table.contains(route) || self.aggregates.absorbs(route)
    }

    /// Install a route learned from an update and aggregate the table.
    /// Returns false if the same route is already advertised, in which case
    /// nothing changes.
    pub fn update(&mut self, route: Route) -> bool {
        if self.advertised.contains(&route) {
            rdb_log!(self, debug, "ignoring duplicate route {route}";
                "prefix" => route.prefix.to_string(),
                "peer" => route.peer.to_string()
            );
            return false;
        }

        rdb_log!(self, info, "adding route {route}";
            "prefix" => route.prefix.to_string(),
            "peer" => route.peer.to_string()
        );
        self.advertised.push(route.clone());

        // An advertisement matching an aggregate is already represented.
        if !self.knows(&route) {
            self.table.insert(route);
            self.merge_siblings();
        }
        true
    }

    /// Withdraw every route for `prefix` advertised by `peer`, undoing any
    /// aggregation the route took part in. Returns the withdrawn
    /// advertisements, which is empty if nothing matched.
    pub fn withdraw(
        &mut self,
        prefix: Prefix4,
        peer: Ipv4Addr,
    ) -> Vec<Route> {
        let (withdrawn, kept): (Vec<Route>, Vec<Route>) =
            std::mem::take(&mut self.advertised)
                .into_iter()
                .partition(|r| r.prefix == prefix && r.peer == peer);
        self.advertised = kept;

        if withdrawn.is_empty() {
            rdb_log!(self, debug, "withdraw of unknown route {prefix}";
                "peer" => peer.to_string()
            );
            return withdrawn;
        }
        rdb_log!(self, info, "withdrew route {prefix}";
            "peer" => peer.to_string(),
            "count" => withdrawn.len()
        );

        let before = self.aggregates.len();
        disaggregate(&mut self.table, &mut self.aggregates, prefix, peer);
        let unwound = before - self.aggregates.len();
        if unwound > 0 {
            aggregate_log!(self, debug,
                "unwound {} aggregates withdrawing {}", unwound, prefix;
                "peer" => peer.to_string()
            );
        }

        // Unwinding can take out advertisements that coincided with an
        // aggregate, and can free pairs whose merge was absorbed by the
        // withdrawn route.
        let missing: Vec<Route> = self
            .advertised
            .iter()
            .filter(|r| !self.knows(r))
            .cloned()
            .collect();
        for route in missing {
            aggregate_log!(self, debug, "restoring advertised route {route}";
                "peer" => route.peer.to_string()
            );
            self.table.insert(route);
        }
        self.merge_siblings();

        withdrawn
    }

    fn merge_siblings(&mut self) {
        for record in aggregate(&mut self.table, &mut self.aggregates) {
            aggregate_log!(self, debug,
                "merged {} and {} into {}",
                record.low.prefix, record.high.prefix, record.merged.prefix;
                "peer" => record.merged.peer.to_string()
            );
        }
    }

    /// Longest prefix match for `address`, with ties broken by the bestpath
    /// algorithm.
    pub fn lookup(&self, address: Ipv4Addr) -> Option<&Route> {
        bestpath(self.table.longest_matches(address))
    }

    pub fn snapshot(&self) -> Vec<Route> {
        self.table.snapshot()
    }
}
