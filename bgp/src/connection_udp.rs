// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::config::NeighborConfig;
use crate::connection::{Connection, Ingress};
use crate::error::Error;
use crate::log::connection_log_lite;
use crate::messages::Message;
use slog::Logger;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::spawn;

const UNIT_CONNECTION: &str = "connection_udp";

/// Receive buffer size for a single datagram.
const RECV_BUFSIZE: usize = 1 << 16;

/// A neighbor link over a loopback UDP socket. The socket is bound to an
/// ephemeral local port and connected to the port the neighbor listens on,
/// so only datagrams from that neighbor are received.
pub struct UdpConnection {
    peer: Ipv4Addr,
    sock: UdpSocket,
    started: AtomicBool,
    log: Logger,
}

impl UdpConnection {
    pub fn new(config: &NeighborConfig, log: Logger) -> Result<Self, Error> {
        let sk = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        let local = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
        sk.bind(&local.into())?;
        let remote = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
        sk.connect(&remote.into())?;

        let sock: UdpSocket = sk.into();
        connection_log_lite!(log, debug, "udp link ready";
            "peer" => config.addr.to_string(),
            "local" => format!("{:?}", sock.local_addr().ok()),
            "remote" => remote.to_string()
        );

        Ok(Self {
            peer: config.addr,
            sock,
            started: AtomicBool::new(false),
            log,
        })
    }
}

impl Connection for UdpConnection {
    fn peer(&self) -> Ipv4Addr {
        self.peer
    }

    fn send(&self, msg: &Message) -> Result<(), Error> {
        let buf = msg.to_wire()?;
        self.sock.send(&buf)?;
        Ok(())
    }

    fn start_ingress(
        &self,
        tx: Sender<Ingress>,
        log: Logger,
    ) -> Result<(), Error> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::IngressStarted(self.peer));
        }
        let sock = self.sock.try_clone()?;
        let peer = self.peer;
        connection_log_lite!(self.log, debug, "starting udp ingress";
            "peer" => peer.to_string()
        );
        spawn(move || ingress(peer, sock, tx, log));
        Ok(())
    }
}

fn ingress(
    peer: Ipv4Addr,
    sock: UdpSocket,
    tx: Sender<Ingress>,
    log: Logger,
) {
    let mut buf = vec![0u8; RECV_BUFSIZE];
    loop {
        let n = match sock.recv(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            // Nothing listening on the neighbor port yet.
            Err(e) if e.kind() == ErrorKind::ConnectionRefused => continue,
            Err(e) => {
                connection_log_lite!(log, error, "udp recv: {e}";
                    "peer" => peer.to_string()
                );
                break;
            }
        };

        if let Err(e) = tx.send((peer, buf[..n].to_vec())) {
            connection_log_lite!(log, warn, "udp ingress channel closed: {e}";
                "peer" => peer.to_string()
            );
            break;
        }
    }
}
