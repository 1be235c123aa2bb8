// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Error;
use crate::messages::Message;
use slog::Logger;
use std::net::Ipv4Addr;
use std::sync::mpsc::Sender;

/// A raw datagram tagged with the neighbor link it arrived on.
pub type Ingress = (Ipv4Addr, Vec<u8>);

/// Implementors of this trait carry messages between this router and one
/// neighbor.
pub trait Connection: Send {
    /// The neighbor address at the far end of this connection.
    fn peer(&self) -> Ipv4Addr;

    /// Send a message to the neighbor. Delivery is best effort.
    fn send(&self, msg: &Message) -> Result<(), Error>;

    /// Start reading from the neighbor. Every datagram received is sent on
    /// `tx` tagged with `self.peer()`. May only be called once.
    fn start_ingress(
        &self,
        tx: Sender<Ingress>,
        log: Logger,
    ) -> Result<(), Error>;
}
