// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::net::Ipv4Addr;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("message too large: {0} bytes")]
    TooLarge(usize),

    #[error("invalid prefix: {0}")]
    Prefix(#[from] rdb::error::Error),

    #[error("invalid neighbor: {0}")]
    InvalidNeighbor(String),

    #[error("invalid relation {0}, expected one of cust, peer, prov")]
    InvalidRelation(String),

    #[error("message from unknown neighbor: {0}")]
    UnknownNeighbor(Ipv4Addr),

    #[error("neighbor already exists: {0}")]
    NeighborExists(Ipv4Addr),

    #[error("ingress already started for {0}")]
    IngressStarted(Ipv4Addr),

    #[error("channel send: {0}")]
    ChannelSend(String),

    #[error("timeout")]
    Timeout,

    #[error("disconnected")]
    Disconnected,
}
