// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for export policy and the message codec using
//! proptest.

use crate::config::{NeighborConfig, Relation};
use crate::messages::{Message, UpdateMessage};
use crate::policy::{export_targets, transits};
use proptest::prelude::*;
use rdb::Prefix4;
use std::net::Ipv4Addr;

fn relation_strategy() -> impl Strategy<Value = Relation> {
    prop_oneof![
        Just(Relation::Customer),
        Just(Relation::Peer),
        Just(Relation::Provider),
    ]
}

/// Strategy for a set of neighbors with distinct addresses.
fn neighbors_strategy() -> impl Strategy<Value = Vec<NeighborConfig>> {
    prop::collection::vec(relation_strategy(), 1..8).prop_map(|relations| {
        relations
            .into_iter()
            .enumerate()
            .map(|(i, relation)| NeighborConfig {
                port: 7000 + i as u16,
                addr: Ipv4Addr::new(10, 0, i as u8, 2),
                relation,
            })
            .collect()
    })
}

fn update_strategy() -> impl Strategy<Value = UpdateMessage> {
    (
        any::<u32>(),
        0u8..=32u8,
        prop::collection::vec(1u32..65535, 0..6),
    )
        .prop_map(|(bits, length, as_path)| {
            let prefix = Prefix4::new(Ipv4Addr::from(bits), length);
            UpdateMessage {
                network: prefix.value,
                netmask: prefix.netmask(),
                as_path,
                local_pref: Some(150),
                origin: None,
                self_origin: Some(true),
            }
        })
}

proptest! {
    /// Property: routes learned from a peer or provider are only ever
    /// exported to customers, and never back to where they came from.
    #[test]
    fn prop_no_leak(
        neighbors in neighbors_strategy(),
        origin in any::<prop::sample::Index>(),
    ) {
        let origin = &neighbors[origin.index(neighbors.len())];
        let targets =
            export_targets(origin.addr, origin.relation, &neighbors);

        prop_assert!(!targets.contains(&origin.addr));
        for n in &neighbors {
            let targeted = targets.contains(&n.addr);
            if n.addr == origin.addr {
                continue;
            }
            if origin.relation == Relation::Customer {
                prop_assert!(targeted, "customer route withheld from {n}");
            } else {
                prop_assert_eq!(targeted, n.relation == Relation::Customer);
            }
        }
    }

    /// Property: transit is symmetric in its two ends.
    #[test]
    fn prop_transit_symmetric(
        a in relation_strategy(),
        b in relation_strategy(),
    ) {
        prop_assert_eq!(transits(a, b), transits(b, a));
    }

    /// Property: exporting an update prepends this router's AS, keeps the
    /// prefix, and leaves no local attributes behind.
    #[test]
    fn prop_export_prepends_asn(
        update in update_strategy(),
        asn in 1u32..65535,
    ) {
        let exported = update.export(asn).expect("export");
        prop_assert_eq!(exported.as_path[0], asn);
        prop_assert_eq!(&exported.as_path[1..], &update.as_path[..]);
        prop_assert_eq!(exported.prefix().ok(), update.prefix().ok());
        prop_assert_eq!(exported.local_pref, None);
        prop_assert_eq!(exported.self_origin, None);
    }

    /// Property: decoding arbitrary bytes returns an error or a message,
    /// never a panic
    #[test]
    fn prop_decode_arbitrary_bytes(
        buf in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let _ = Message::from_wire(&buf);
    }
}
