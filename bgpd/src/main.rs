// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::{Context, Result};
use bgp::config::{NeighborConfig, RouterConfig};
use bgp::connection::Connection;
use bgp::connection_udp::UdpConnection;
use bgp::dispatcher::Dispatcher;
use bgp::router::Router;
use clap::Parser;
use mg_common::cli::get_styles;
use mg_common::log::{init_file_logger, init_logger};
use rdb::Db;
use slog::{info, Logger};
use std::sync::mpsc::channel;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, styles = get_styles())]
struct Cli {
    /// Autonomous system number for this router.
    asn: u32,

    /// Neighbor links as <port>-<neighbor address>-<relation>, where
    /// relation is one of cust, peer or prov.
    #[arg(required = true)]
    connections: Vec<NeighborConfig>,

    /// Write logs to this file instead of stdout.
    #[arg(long)]
    log_file: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log = match &cli.log_file {
        Some(path) => init_file_logger(path)
            .with_context(|| format!("open log file {path}"))?,
        None => init_logger(),
    };
    run(cli, log)
}

fn run(cli: Cli, log: Logger) -> Result<()> {
    let config = RouterConfig { asn: cli.asn };
    info!(log, "starting router"; "asn" => config.asn);

    let (tx, rx) = channel();
    let mut router = Router::new(config, Db::new(log.clone()), log.clone());
    for neighbor in cli.connections {
        let conn = UdpConnection::new(&neighbor, log.clone())
            .with_context(|| format!("connect to neighbor {neighbor}"))?;
        conn.start_ingress(tx.clone(), log.clone())?;
        router.add_neighbor(neighbor, conn)?;
    }
    // Only the ingress readers hold senders from here on.
    drop(tx);

    router.handshake();

    let mut dispatcher = Dispatcher::new(router, rx, log.clone());
    dispatcher.run();

    info!(log, "router exiting"; "asn" => config.asn);
    Ok(())
}
