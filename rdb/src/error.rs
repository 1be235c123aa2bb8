// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::Ipv4Addr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("netmask {0} is not a contiguous run of leading ones")]
    InvalidNetmask(Ipv4Addr),

    #[error("invalid prefix length {0}, max is 32")]
    InvalidPrefixLength(u8),

    #[error("malformed prefix: {0}")]
    MalformedPrefix(String),
}
