// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod aggregate;
pub mod bestpath;
pub mod db;
pub mod error;
pub mod log;
pub mod prefix;
pub mod types;

pub use aggregate::{AggregationLog, AggregationRecord};
pub use db::{Db, RoutingTable};
pub use prefix::Prefix4;
pub use types::*;

#[cfg(test)]
mod proptest;

/// Local preference assumed when an advertisement does not carry one.
pub const DEFAULT_LOCAL_PREF: u32 = 100;

pub const COMPONENT_RDB: &str = "rdb";
pub const MOD_DB: &str = "database";
pub const MOD_AGGREGATE: &str = "aggregate";
