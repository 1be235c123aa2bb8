// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::connection::{Connection, Ingress};
use crate::error::Error;
use crate::log::dispatcher_log;
use crate::messages::{Message, MessageBody};
use crate::router::Router;
use crate::IO_TIMEOUT;
use slog::Logger;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;

const UNIT_DISPATCHER: &str = "dispatcher";

/// The event loop. Datagrams from every neighbor arrive on one channel and
/// are handled one at a time to completion, so the router needs no locking.
pub struct Dispatcher<Cnx: Connection> {
    router: Router<Cnx>,
    ingress: Receiver<Ingress>,
    shutdown: Arc<AtomicBool>,
    log: Logger,
}

impl<Cnx: Connection> Dispatcher<Cnx> {
    pub fn new(
        router: Router<Cnx>,
        ingress: Receiver<Ingress>,
        log: Logger,
    ) -> Self {
        Self {
            router,
            ingress,
            shutdown: Arc::new(AtomicBool::new(false)),
            log,
        }
    }

    pub fn router(&self) -> &Router<Cnx> {
        &self.router
    }

    /// A flag that stops `run` within one `IO_TIMEOUT` once set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Handle inbound messages until shut down or until every ingress
    /// reader has gone away.
    pub fn run(&mut self) {
        dispatcher_log!(self, info, "dispatcher running");
        loop {
            if self.shutdown.load(Ordering::Acquire) {
                dispatcher_log!(self, info, "dispatcher shutting down");
                break;
            }
            match self.ingress.recv_timeout(IO_TIMEOUT) {
                Ok((link, buf)) => self.receive(link, &buf),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    dispatcher_log!(self, info, "ingress closed, exiting");
                    break;
                }
            }
        }
    }

    /// Decode and handle one datagram from the link to `link`. Nothing that
    /// arrives here can stop the loop: bad input is logged and dropped.
    pub fn receive(&mut self, link: Ipv4Addr, buf: &[u8]) {
        let msg = match Message::from_wire(buf) {
            Ok(msg) => msg,
            Err(Error::UnknownMessageType(t)) => {
                dispatcher_log!(self, debug, "ignoring message type {t}";
                    "peer" => link.to_string()
                );
                return;
            }
            Err(e) => {
                dispatcher_log!(self, warn, "dropping malformed message: {e}";
                    "peer" => link.to_string(),
                    "len" => buf.len()
                );
                return;
            }
        };

        dispatcher_log!(self, debug, "received {}", msg.title();
            "peer" => link.to_string(),
            "src" => msg.src.to_string(),
            "dst" => msg.dst.to_string()
        );

        if let Err(e) = self.dispatch(link, msg) {
            dispatcher_log!(self, warn, "message handling failed: {e}";
                "peer" => link.to_string()
            );
        }
    }

    fn dispatch(&mut self, link: Ipv4Addr, msg: Message) -> Result<(), Error> {
        match msg.body {
            MessageBody::Update(update) => {
                self.router.on_update(link, update)?;
            }
            MessageBody::Withdraw(withdraw) => {
                self.router.on_withdraw(link, withdraw)?;
            }
            MessageBody::Data(_) => {
                self.router.on_data(link, &msg)?;
            }
            MessageBody::Dump => self.router.on_dump(link, &msg)?,
            MessageBody::Handshake
            | MessageBody::NoRoute
            | MessageBody::Table(_) => {
                dispatcher_log!(self, debug,
                    "nothing to do for {}", msg.title();
                    "peer" => link.to_string()
                );
            }
        }
        Ok(())
    }
}
