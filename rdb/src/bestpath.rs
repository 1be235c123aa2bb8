// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::types::Route;
use itertools::Itertools;

/// The bestpath algorithm chooses the single best route out of a set of
/// candidates that all match a destination equally well. The candidates are
/// filtered in the following ordered sequence of operations, stopping as
/// soon as one candidate remains.
///
/// - filter to the routes with the largest local preference
/// - filter to self originated routes, if there are any
/// - filter to the routes with the smallest AS path length
/// - filter to the routes with the best origin (IGP, then EGP, then unknown)
/// - pick the route whose peer is numerically lowest
///
/// If routes are still indistinguishable after all of that, the first one
/// in iteration order is returned.
pub fn bestpath<'a, I>(candidates: I) -> Option<&'a Route>
where
    I: IntoIterator<Item = &'a Route>,
{
    let candidates: Vec<&Route> = candidates.into_iter().collect();

    // Short-circuit: if there's only 1 candidate, then it is the best
    if candidates.len() <= 1 {
        return candidates.first().copied();
    }

    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.local_pref);

    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.self_origin);

    let candidates = candidates
        .into_iter()
        .min_set_by_key(|route| route.as_path.len());

    let candidates = candidates
        .into_iter()
        .max_set_by_key(|route| route.origin.rank());

    candidates
        .into_iter()
        .min_by_key(|route| route.peer.to_bits())
}
