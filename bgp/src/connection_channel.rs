// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// This file contains code for testing purposes only. Note that it's only
/// included in `lib.rs` with a `#[cfg(test)]` guard. It implements
/// `Connection` over in-memory channels so the router and dispatcher may be
/// tested rapidly without sockets. Every message still passes through the
/// wire encoding in both directions.
use crate::{
    connection::{Connection, Ingress},
    error::Error,
    log::connection_log_lite,
    messages::Message,
};
use mg_common::lock;
use slog::Logger;
use std::{
    net::Ipv4Addr,
    sync::{
        mpsc::{channel as mpsc_channel, Receiver, RecvTimeoutError, Sender},
        Mutex,
    },
    thread::spawn,
    time::Duration,
};

const UNIT_CONNECTION: &str = "connection_channel";

/// The router side of a simulated link.
pub struct BgpConnectionChannel {
    peer: Ipv4Addr,
    egress: Sender<Vec<u8>>,
    ingress: Mutex<Option<Receiver<Vec<u8>>>>,
}

/// The neighbor side of a simulated link, held by the test.
pub struct ChannelPeer {
    pub addr: Ipv4Addr,
    rx: Receiver<Vec<u8>>,
    tx: Sender<Vec<u8>>,
}

/// Create a simulated link to the neighbor at `peer`.
pub fn channel(peer: Ipv4Addr) -> (BgpConnectionChannel, ChannelPeer) {
    let (to_peer, from_router) = mpsc_channel();
    let (to_router, from_peer) = mpsc_channel();
    (
        BgpConnectionChannel {
            peer,
            egress: to_peer,
            ingress: Mutex::new(Some(from_peer)),
        },
        ChannelPeer {
            addr: peer,
            rx: from_router,
            tx: to_router,
        },
    )
}

impl Connection for BgpConnectionChannel {
    fn peer(&self) -> Ipv4Addr {
        self.peer
    }

    fn send(&self, msg: &Message) -> Result<(), Error> {
        self.egress
            .send(msg.to_wire()?)
            .map_err(|e| Error::ChannelSend(e.to_string()))
    }

    fn start_ingress(
        &self,
        tx: Sender<Ingress>,
        log: Logger,
    ) -> Result<(), Error> {
        let rx = lock!(self.ingress)
            .take()
            .ok_or(Error::IngressStarted(self.peer))?;
        let peer = self.peer;
        spawn(move || {
            while let Ok(buf) = rx.recv() {
                if let Err(e) = tx.send((peer, buf)) {
                    connection_log_lite!(log, warn,
                        "channel ingress closed: {e}";
                        "peer" => peer.to_string()
                    );
                    break;
                }
            }
        });
        Ok(())
    }
}

impl ChannelPeer {
    /// Send a message to the router as if it came from this neighbor.
    pub fn send(&self, msg: &Message) -> Result<(), Error> {
        self.send_raw(msg.to_wire()?)
    }

    pub fn send_raw(&self, buf: Vec<u8>) -> Result<(), Error> {
        self.tx
            .send(buf)
            .map_err(|e| Error::ChannelSend(e.to_string()))
    }

    /// Wait for the next message the router sent to this neighbor.
    pub fn recv(&self, timeout: Duration) -> Result<Message, Error> {
        let buf = self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => Error::Timeout,
            RecvTimeoutError::Disconnected => Error::Disconnected,
        })?;
        Message::from_wire(&buf)
    }

    /// Every message the router has sent so far, without waiting.
    pub fn drain(&self) -> Result<Vec<Message>, Error> {
        self.rx
            .try_iter()
            .map(|buf| Message::from_wire(&buf))
            .collect()
    }
}
