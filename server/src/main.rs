// ./server --listen 0.0.0.0:3478 --listen [::]:3478 --software "stun reflector"

use log::{debug, error, info};
use std::net::SocketAddr;

use clap::{Arg, ArgAction, Command};
use tokio::sync::watch;

use server::server::Server;
use server::signal::wait_shutdown;
use stun_binding::reflector::{Responder, ResponderConfig};

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a small stun binding reflector")
        .arg(
            Arg::new("listen")
                .long("listen")
                .takes_value(true)
                .action(ArgAction::Append)
                .default_value("0.0.0.0:3478")
                .help("listen address, repeatable")
                .value_parser(clap::value_parser!(SocketAddr)),
        )
        .arg(
            Arg::new("software")
                .long("software")
                .takes_value(true)
                .help("SOFTWARE attribute sent with responses")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("fingerprint")
                .long("fingerprint")
                .action(ArgAction::SetTrue)
                .help("append FINGERPRINT to responses"),
        )
        .arg(
            Arg::new("no_mapped_address")
                .long("no_mapped_address")
                .action(ArgAction::SetTrue)
                .help("omit the legacy MAPPED-ADDRESS attribute"),
        )
        .get_matches();

    let listen: Vec<SocketAddr> = app
        .get_many::<SocketAddr>("listen")
        .expect("wrong listen address")
        .copied()
        .collect();
    let software: Option<String> = app.get_one::<String>("software").cloned();
    let fingerprint: bool = *app.get_one("fingerprint").unwrap_or(&false);
    let no_mapped_address: bool = *app.get_one("no_mapped_address").unwrap_or(&false);

    debug!("listen: {:?}", listen);

    let responder = Responder::new(ResponderConfig {
        software: Some(software.unwrap_or_else(|| format!("{} {}", APP_NAME, APP_VERSION))),
        fingerprint,
        include_mapped_address: !no_mapped_address,
    });

    let (signal_tx, signal_rx) = watch::channel(0_u8);

    let _signal_handle = tokio::spawn(async move {
        let name = wait_shutdown().await;
        debug!("recv {} signal, shutdown", name);
        match signal_tx.send(1) {
            Ok(_) => {}
            Err(e) => {
                error!("error, {:?}", e);
            }
        };
    });

    let server = match Server::new(&listen, responder, signal_rx).await {
        Ok(v) => v,
        Err(e) => {
            error!("error, bind, {:?}", e);
            return;
        }
    };

    info!("start server on {:?} ...", server.local_addrs());

    let server_handle = tokio::spawn(async move {
        server.run().await;
    });

    let _ = server_handle.await;

    info!("end.");
}
