// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Messages exchanged with neighbors.
//!
//! On the wire every message is a single JSON object per datagram with the
//! fields `type`, `src`, `dst` and `msg`. The shape of `msg` depends on
//! `type`. Decoding happens once, at the boundary, into a [`Message`] whose
//! [`MessageBody`] carries a typed payload.

use crate::error::Error;
use rdb::{Origin, Prefix4, Route, DEFAULT_LOCAL_PREF};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Largest datagram this router will send or accept.
pub const MAX_MESSAGE_SIZE: usize = 65507;

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum MessageType {
    /// Sent once to each neighbor when the router starts.
    Handshake,

    /// A route advertisement.
    Update,

    /// Retraction of one or more previously advertised routes.
    Withdraw,

    /// Traffic to be forwarded toward its destination.
    Data,

    /// Reply to a data message that could not be forwarded.
    NoRoute,

    /// Request for the current routing table.
    Dump,

    /// Reply to a dump request.
    Table,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Handshake => "handshake",
            Self::Update => "update",
            Self::Withdraw => "withdraw",
            Self::Data => "data",
            Self::NoRoute => "no route",
            Self::Dump => "dump",
            Self::Table => "table",
        }
    }
}

impl Display for MessageType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "handshake" => Ok(Self::Handshake),
            "update" => Ok(Self::Update),
            "withdraw" => Ok(Self::Withdraw),
            "data" => Ok(Self::Data),
            "no route" => Ok(Self::NoRoute),
            "dump" => Ok(Self::Dump),
            "table" => Ok(Self::Table),
            other => Err(Error::UnknownMessageType(other.to_string())),
        }
    }
}

impl From<&MessageBody> for MessageType {
    fn from(b: &MessageBody) -> Self {
        match b {
            MessageBody::Handshake => Self::Handshake,
            MessageBody::Update(_) => Self::Update,
            MessageBody::Withdraw(_) => Self::Withdraw,
            MessageBody::Data(_) => Self::Data,
            MessageBody::NoRoute => Self::NoRoute,
            MessageBody::Dump => Self::Dump,
            MessageBody::Table(_) => Self::Table,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Message {
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub body: MessageBody,
}

#[derive(Debug, PartialEq, Clone)]
pub enum MessageBody {
    Handshake,
    Update(UpdateMessage),
    Withdraw(WithdrawMessage),
    /// Opaque payload, forwarded untouched.
    Data(serde_json::Value),
    NoRoute,
    Dump,
    Table(TableMessage),
}

/// The undecoded form of a message as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    typ: String,
    src: Ipv4Addr,
    dst: Ipv4Addr,
    #[serde(default)]
    msg: serde_json::Value,
}

fn empty() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Message {
    pub fn new(src: Ipv4Addr, dst: Ipv4Addr, body: MessageBody) -> Self {
        Self { src, dst, body }
    }

    pub fn typ(&self) -> MessageType {
        MessageType::from(&self.body)
    }

    pub fn title(&self) -> &'static str {
        self.typ().as_str()
    }

    pub fn to_wire(&self) -> Result<Vec<u8>, Error> {
        let msg = match &self.body {
            MessageBody::Handshake
            | MessageBody::NoRoute
            | MessageBody::Dump => empty(),
            MessageBody::Update(m) => serde_json::to_value(m)?,
            MessageBody::Withdraw(m) => serde_json::to_value(m)?,
            MessageBody::Data(v) => v.clone(),
            MessageBody::Table(m) => serde_json::to_value(m)?,
        };
        let envelope = Envelope {
            typ: self.title().to_string(),
            src: self.src,
            dst: self.dst,
            msg,
        };
        let buf = serde_json::to_vec(&envelope)?;
        if buf.len() > MAX_MESSAGE_SIZE {
            return Err(Error::TooLarge(buf.len()));
        }
        Ok(buf)
    }

    pub fn from_wire(input: &[u8]) -> Result<Message, Error> {
        let envelope: Envelope = serde_json::from_slice(input)?;
        let body = match envelope.typ.parse::<MessageType>()? {
            MessageType::Handshake => MessageBody::Handshake,
            MessageType::Update => {
                MessageBody::Update(serde_json::from_value(envelope.msg)?)
            }
            MessageType::Withdraw => {
                MessageBody::Withdraw(serde_json::from_value(envelope.msg)?)
            }
            MessageType::Data => MessageBody::Data(envelope.msg),
            MessageType::NoRoute => MessageBody::NoRoute,
            MessageType::Dump => MessageBody::Dump,
            MessageType::Table => {
                MessageBody::Table(serde_json::from_value(envelope.msg)?)
            }
        };
        Ok(Message {
            src: envelope.src,
            dst: envelope.dst,
            body,
        })
    }
}

impl From<UpdateMessage> for MessageBody {
    fn from(m: UpdateMessage) -> MessageBody {
        MessageBody::Update(m)
    }
}

impl From<WithdrawMessage> for MessageBody {
    fn from(m: WithdrawMessage) -> MessageBody {
        MessageBody::Withdraw(m)
    }
}

impl From<TableMessage> for MessageBody {
    fn from(m: TableMessage) -> MessageBody {
        MessageBody::Table(m)
    }
}

/// A route advertisement. The local attributes (`localpref`, `origin`,
/// `selfOrigin`) are optional on the wire and are never sent onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,

    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,

    #[serde(
        rename = "localpref",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub local_pref: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Origin>,

    #[serde(
        rename = "selfOrigin",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub self_origin: Option<bool>,
}

impl UpdateMessage {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Ok(Prefix4::from_netmask(self.network, self.netmask)?)
    }

    /// The route this advertisement describes when learned from `peer`, with
    /// defaults applied to absent attributes.
    pub fn to_route(&self, peer: Ipv4Addr) -> Result<Route, Error> {
        Ok(Route {
            prefix: self.prefix()?,
            peer,
            local_pref: self.local_pref.unwrap_or(DEFAULT_LOCAL_PREF),
            as_path: self.as_path.clone(),
            origin: self.origin.unwrap_or_default(),
            self_origin: self.self_origin.unwrap_or(false),
        })
    }

    /// The advertisement to send onward from the router in `asn`: the
    /// router's AS is prepended to the path, local attributes are stripped
    /// and the network has its host bits cleared.
    pub fn export(&self, asn: u32) -> Result<UpdateMessage, Error> {
        let prefix = self.prefix()?;
        let mut as_path = Vec::with_capacity(self.as_path.len() + 1);
        as_path.push(asn);
        as_path.extend_from_slice(&self.as_path);
        Ok(UpdateMessage {
            network: prefix.value,
            netmask: prefix.netmask(),
            as_path,
            local_pref: None,
            origin: None,
            self_origin: None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawnPrefix {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl WithdrawnPrefix {
    pub fn prefix(&self) -> Result<Prefix4, Error> {
        Ok(Prefix4::from_netmask(self.network, self.netmask)?)
    }
}

impl From<Prefix4> for WithdrawnPrefix {
    fn from(p: Prefix4) -> Self {
        Self {
            network: p.value,
            netmask: p.netmask(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WithdrawMessage {
    pub prefixes: Vec<WithdrawnPrefix>,
}

/// One row of a table dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub peer: Ipv4Addr,
    #[serde(rename = "localpref")]
    pub local_pref: u32,
    #[serde(rename = "ASPath")]
    pub as_path: Vec<u32>,
    pub origin: Origin,
    #[serde(rename = "selfOrigin")]
    pub self_origin: bool,
}

impl From<&Route> for TableEntry {
    fn from(r: &Route) -> Self {
        Self {
            network: r.prefix.value,
            netmask: r.prefix.netmask(),
            peer: r.peer,
            local_pref: r.local_pref,
            as_path: r.as_path.clone(),
            origin: r.origin,
            self_origin: r.self_origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableMessage {
    pub routes: Vec<TableEntry>,
}

impl From<&[Route]> for TableMessage {
    fn from(routes: &[Route]) -> Self {
        Self {
            routes: routes.iter().map(TableEntry::from).collect(),
        }
    }
}
