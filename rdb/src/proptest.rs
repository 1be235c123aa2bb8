// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-based tests for prefix arithmetic, bestpath selection and
//! aggregation using proptest.

#[cfg(test)]
mod proptest {
    use crate::aggregate::{aggregate, disaggregate, AggregationLog};
    use crate::bestpath::bestpath;
    use crate::db::{Db, RoutingTable};
    use crate::prefix::{contains, mask_bits, narrow, widen, Prefix4};
    use crate::types::{Origin, Route};
    use proptest::prelude::*;
    use std::net::Ipv4Addr;

    // Strategy for generating valid IPv4 prefixes
    fn ipv4_prefix_strategy() -> impl Strategy<Value = Prefix4> {
        (any::<u32>(), 0u8..=32u8).prop_map(|(addr_bits, length)| {
            Prefix4::new(Ipv4Addr::from(addr_bits), length)
        })
    }

    fn origin_strategy() -> impl Strategy<Value = Origin> {
        prop_oneof![
            Just(Origin::Igp),
            Just(Origin::Egp),
            Just(Origin::Unknown)
        ]
    }

    fn route_strategy() -> impl Strategy<Value = Route> {
        (
            ipv4_prefix_strategy(),
            any::<u32>(),
            prop::sample::select(vec![100u32, 150, 200]),
            prop::collection::vec(1u32..10, 0..4),
            origin_strategy(),
            any::<bool>(),
        )
            .prop_map(
                |(prefix, peer, local_pref, as_path, origin, self_origin)| {
                    Route {
                        prefix,
                        peer: Ipv4Addr::from(peer),
                        local_pref,
                        as_path,
                        origin,
                        self_origin,
                    }
                },
            )
    }

    fn eighths() -> Vec<u32> {
        (0u32..8).collect()
    }

    /// The `i`th prefix in a breadth first walk of the /24 to /27 subnets
    /// of 10.0.0.0/24, so 0 is the /24, 1 and 2 its halves, and so on.
    fn nested_prefix(i: usize) -> Prefix4 {
        let level = (i + 1).ilog2();
        let offset = (i + 1 - (1 << level)) as u32;
        let length = 24 + level as u8;
        let base = u32::from(Ipv4Addr::new(10, 0, 0, 0));
        Prefix4::new(Ipv4Addr::from(base + (offset << (32 - length))), length)
    }

    fn nested_route(i: usize, peer: u8, local_pref: u32) -> Route {
        Route {
            prefix: nested_prefix(i),
            peer: Ipv4Addr::new(10, 0, peer, 2),
            local_pref,
            as_path: vec![2],
            origin: Origin::Igp,
            self_origin: false,
        }
    }

    fn sorted(mut routes: Vec<Route>) -> Vec<Route> {
        routes.sort_by_key(|r| (r.prefix, r.peer, r.local_pref));
        routes
    }

    proptest! {
        /// Property: host bits are always unset after construction
        #[test]
        fn prop_host_bits_always_unset(prefix in ipv4_prefix_strategy()) {
            prop_assert!(
                prefix.host_bits_are_unset(),
                "prefix {prefix} should have host bits unset"
            );
        }

        /// Property: a prefix always contains its own base address
        #[test]
        fn prop_contains_own_network(prefix in ipv4_prefix_strategy()) {
            let network = prefix.value;
            prop_assert!(contains(network, prefix.netmask(), network));
            prop_assert_eq!(prefix.match_length(network), Some(prefix.length));
        }

        /// Property: containment agrees with a bit by bit comparison
        #[test]
        fn prop_contains_matches_bitwise(
            prefix in ipv4_prefix_strategy(),
            address in any::<u32>(),
        ) {
            let address = Ipv4Addr::from(address);
            let network = prefix.value.to_bits();
            let expected = (0..prefix.length).all(|i| {
                let bit = 1u32 << (31 - i);
                network & bit == address.to_bits() & bit
            });
            prop_assert_eq!(prefix.contains(address), expected);
        }

        /// Property: widen and narrow are inverse on the netmask
        #[test]
        fn prop_widen_narrow_inverse(length in 1u8..=32u8) {
            let mask = Ipv4Addr::from_bits(mask_bits(length));
            prop_assert_eq!(narrow(widen(mask)), mask);
            prop_assert_eq!(
                widen(mask).to_bits().leading_ones() as u8,
                length - 1
            );
        }

        /// Property: a prefix's sibling is a sibling of the prefix, and both
        /// widen to the same parent which contains them.
        #[test]
        fn prop_sibling_symmetry(prefix in ipv4_prefix_strategy()) {
            if let Some(sibling) = prefix.sibling() {
                prop_assert!(sibling.is_sibling(&prefix));
                prop_assert_ne!(sibling.is_low_half(), prefix.is_low_half());
                prop_assert_eq!(sibling.widen(), prefix.widen());
                let parent = prefix.widen().expect("parent");
                prop_assert!(prefix.within(&parent));
                prop_assert!(sibling.within(&parent));
            } else {
                prop_assert_eq!(prefix.length, 0);
            }
        }

        /// Property: bestpath does not depend on candidate order when the
        /// candidates have distinct peers
        #[test]
        fn prop_bestpath_order_independent(
            routes in prop::collection::vec(route_strategy(), 1..6),
        ) {
            let mut seen = std::collections::HashSet::new();
            let routes: Vec<Route> = routes
                .into_iter()
                .filter(|r| seen.insert(r.peer))
                .collect();
            let forward = bestpath(routes.iter()).cloned();
            let backward = bestpath(routes.iter().rev()).cloned();
            prop_assert_eq!(forward, backward);
        }

        /// Property: aggregating two siblings and withdrawing one leaves
        /// exactly the other behind
        #[test]
        fn prop_aggregate_round_trip(
            route in route_strategy(),
            withdraw_low in any::<bool>(),
        ) {
            prop_assume!(route.prefix.length > 0);
            let sibling = route.with_prefix(
                route.prefix.sibling().expect("sibling"),
            );

            let mut table = RoutingTable::new();
            let mut aggregates = AggregationLog::new();
            table.insert(route.clone());
            aggregate(&mut table, &mut aggregates);
            table.insert(sibling.clone());
            aggregate(&mut table, &mut aggregates);

            let parent = route.prefix.widen().expect("parent");
            let merged = route.with_prefix(parent);
            prop_assert_eq!(table.snapshot(), vec![merged]);

            let (gone, kept) = if withdraw_low == route.prefix.is_low_half() {
                (route, sibling)
            } else {
                (sibling, route)
            };
            disaggregate(&mut table, &mut aggregates, gone.prefix, gone.peer);
            prop_assert_eq!(table.snapshot(), vec![kept]);
            prop_assert!(aggregates.is_empty());
        }
    
        /// Property: advertising any set of equal length subnets in any
        /// order and then withdrawing them all in any order leaves nothing
        /// behind
        #[test]
        fn prop_withdraw_all_empties_table(
            subnets in prop::sample::subsequence(eighths(), 0..=8)
                .prop_shuffle(),
            withdraw_order in Just(eighths()).prop_shuffle(),
        ) {
            let base = u32::from(Ipv4Addr::new(10, 0, 0, 0));
            let route = |i: u32| Route {
                prefix: Prefix4::new(Ipv4Addr::from(base + (i << 5)), 27),
                peer: Ipv4Addr::new(10, 0, 0, 2),
                local_pref: 100,
                as_path: vec![2],
                origin: Origin::Igp,
                self_origin: false,
            };

            let mut table = RoutingTable::new();
            let mut aggregates = AggregationLog::new();
            for i in &subnets {
                table.insert(route(*i));
                aggregate(&mut table, &mut aggregates);
            }

            let covered: u32 = table
                .routes()
                .iter()
                .map(|r| 1u32 << (32 - r.prefix.length))
                .sum();
            prop_assert_eq!(covered, subnets.len() as u32 * 32);

            for i in withdraw_order {
                let r = route(i);
                let gone =
                    disaggregate(&mut table, &mut aggregates, r.prefix, r.peer);
                let advertised = subnets.contains(&i);
                prop_assert_eq!(gone.len(), usize::from(advertised));
            }
            prop_assert!(table.is_empty());
            prop_assert!(aggregates.is_empty());
        }
    
        /// Property: after any mix of overlapping advertisements and
        /// withdrawals, the table is the one built from scratch out of the
        /// advertisements that remain
        #[test]
        fn prop_withdraw_matches_replay(
            adverts in prop::collection::vec(
                (0usize..15, 0u8..2, prop::sample::select(vec![100u32, 200])),
                1..12,
            ),
            withdrawals in prop::collection::vec((0usize..15, 0u8..2), 0..8),
        ) {
            let log = mg_common::log::discard_logger();
            let mut db = Db::new(log.clone());
            for (i, peer, local_pref) in &adverts {
                db.update(nested_route(*i, *peer, *local_pref));
            }

            let mut gone = Vec::new();
            for (i, peer) in withdrawals {
                let victim = nested_route(i, peer, 100);
                db.withdraw(victim.prefix, victim.peer);
                gone.push((victim.prefix, victim.peer));

                let mut replay = Db::new(log.clone());
                for (i, peer, local_pref) in &adverts {
                    let r = nested_route(*i, *peer, *local_pref);
                    if !gone.contains(&(r.prefix, r.peer)) {
                        replay.update(r);
                    }
                }
                prop_assert_eq!(db.advertised(), replay.advertised());
                prop_assert_eq!(
                    sorted(db.snapshot()),
                    sorted(replay.snapshot())
                );
            }
        }
    }
}
