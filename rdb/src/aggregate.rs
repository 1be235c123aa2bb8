// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prefix aggregation and its inverse.
//!
//! Whenever two routes with identical attributes cover the two halves of a
//! parent prefix, they are replaced in the table by a single route for the
//! parent. Every merge is remembered in an [`AggregationLog`] so that a later
//! withdrawal of one half can restore the other half exactly. Merges cascade,
//! so the log can hold chains of records where the merged route of one
//! record is a constituent of the next.

use crate::bestpath::bestpath;
use crate::db::RoutingTable;
use crate::prefix::Prefix4;
use crate::types::Route;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Two routes that were merged and the route they were merged into. The
/// routes are snapshots taken at merge time.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AggregationRecord {
    pub low: Route,
    pub high: Route,
    pub merged: Route,
}

impl AggregationRecord {
    pub fn has_constituent(&self, route: &Route) -> bool {
        self.low == *route || self.high == *route
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregationLog {
    records: Vec<AggregationRecord>,
}

impl AggregationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AggregationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if `route` was absorbed into an aggregate.
    pub fn absorbs(&self, route: &Route) -> bool {
        self.records.iter().any(|r| r.has_constituent(route))
    }

    /// The first absorbed route for `prefix` learned from `peer`.
    fn find_constituent(
        &self,
        prefix: Prefix4,
        peer: Ipv4Addr,
    ) -> Option<&Route> {
        self.records
            .iter()
            .flat_map(|r| [&r.low, &r.high])
            .find(|route| route.prefix == prefix && route.peer == peer)
    }

    /// Drop the record that produced `merged`, along with every record
    /// beneath it. Used when an aggregate leaves the table as a whole.
    fn forget(&mut self, merged: &Route) {
        let Some(idx) = self.records.iter().position(|r| r.merged == *merged)
        else {
            return;
        };
        let record = self.records.remove(idx);
        self.forget(&record.low);
        self.forget(&record.high);
    }

    /// Remove and return the record that absorbed `route`.
    fn take_absorbing(&mut self, route: &Route) -> Option<AggregationRecord> {
        let idx = self.records.iter().position(|r| r.has_constituent(route))?;
        Some(self.records.remove(idx))
    }
}

/// Merge sibling routes in `table` until no mergeable pair remains,
/// recording each merge in `aggregates`. Returns the records created by this
/// call, in merge order.
///
/// Pairs are searched in table order. When a route has more than one
/// mergeable counterpart, the best of them according to the bestpath
/// algorithm is chosen. Each merge only ever combines a route with its one
/// sibling, so the final table depends on which routes were inserted and
/// not on the order they arrived in.
pub fn aggregate(
    table: &mut RoutingTable,
    aggregates: &mut AggregationLog,
) -> Vec<AggregationRecord> {
    let mut created = Vec::new();

    while let Some((i, j)) = next_mergeable_pair(table) {
        let (first, second) = table.take_pair(i, j);
        let (low, high) = if first.prefix.is_low_half() {
            (first, second)
        } else {
            (second, first)
        };

        // Guaranteed by next_mergeable_pair: siblings are never /0.
        let Some(parent) = low.prefix.widen() else {
            break;
        };
        // The parent may already be live, in which case the two halves
        // collapse into that entry.
        let merged = low.with_prefix(parent);
        table.insert(merged.clone());

        let record = AggregationRecord { low, high, merged };
        aggregates.records.push(record.clone());
        created.push(record);
    }

    created
}

fn next_mergeable_pair(table: &RoutingTable) -> Option<(usize, usize)> {
    let routes = table.routes();
    for (i, route) in routes.iter().enumerate() {
        let candidates: Vec<(usize, &Route)> = routes
            .iter()
            .enumerate()
            .filter(|(j, other)| *j != i && route.is_sibling_of(other))
            .collect();

        let Some(best) = bestpath(candidates.iter().map(|(_, r)| *r)) else {
            continue;
        };

        let j = candidates
            .iter()
            .find(|(_, r)| std::ptr::eq(*r, best))
            .map(|(j, _)| *j)?;
        return Some((i, j));
    }
    None
}

/// Withdraw every route for `prefix` learned from `peer`, whether it is
/// present in the table directly or has been absorbed into an aggregate.
/// Aggregates covering an absorbed route are unwound level by level, outermost
/// first, until the route itself is back in the table, at which point it is
/// removed. Returns the withdrawn routes.
pub fn disaggregate(
    table: &mut RoutingTable,
    aggregates: &mut AggregationLog,
    prefix: Prefix4,
    peer: Ipv4Addr,
) -> Vec<Route> {
    let mut withdrawn = Vec::new();

    loop {
        let removed =
            table.remove(|route| route.prefix == prefix && route.peer == peer);
        for route in &removed {
            aggregates.forget(route);
        }
        withdrawn.extend(removed);

        // Each pass consumes at least one record, so this terminates.
        match aggregates.find_constituent(prefix, peer).cloned() {
            Some(absorbed) => expose(table, aggregates, &absorbed),
            None => break,
        }
    }

    withdrawn
}

/// Make `route` a live table entry again by splitting the aggregate that
/// absorbed it, after first recursively splitting any aggregate that in turn
/// absorbed that one.
fn expose(
    table: &mut RoutingTable,
    aggregates: &mut AggregationLog,
    route: &Route,
) {
    if table.contains(route) {
        return;
    }
    let Some(record) = aggregates.take_absorbing(route) else {
        return;
    };

    expose(table, aggregates, &record.merged);

    let merged = record.merged;
    table.remove(|r| *r == merged);
    table.insert(record.low);
    table.insert(record.high);
}
