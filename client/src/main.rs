// ./client --server stun.example.org:3478 --timeout_ms 500 --retries 3

use std::net::IpAddr;
use std::time::Duration;

use clap::builder::ValueParser;
use clap::{Arg, ArgAction, Command};
use client::client::{probe_nat, resolve_server, ProbeConfig};
use log::{debug, error};
use stun_binding::SessionConfig;
use tokio::net::UdpSocket;

const APP_NAME: &str = env!("CARGO_PKG_NAME");
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

fn parse_ip(s: &str) -> Result<IpAddr, String> {
    s.parse::<IpAddr>().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let app = Command::new(APP_NAME)
        .version(APP_VERSION)
        .about("a stun client for discovering the mapped address")
        .arg(
            Arg::new("server")
                .long("server")
                .takes_value(true)
                .required(true)
                .help("server host:port")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("local_ip")
                .long("local_ip")
                .takes_value(true)
                .default_value("0.0.0.0")
                .help("local ip")
                .value_parser(ValueParser::new(parse_ip)),
        )
        .arg(
            Arg::new("timeout_ms")
                .long("timeout_ms")
                .takes_value(true)
                .default_value("500")
                .help("initial retransmission timeout")
                .value_parser(clap::value_parser!(u64).range(1..60000)),
        )
        .arg(
            Arg::new("retries")
                .long("retries")
                .takes_value(true)
                .default_value("3")
                .help("max request transmissions")
                .value_parser(clap::value_parser!(u32).range(1..10)),
        )
        .arg(
            Arg::new("software")
                .long("software")
                .takes_value(true)
                .help("SOFTWARE attribute sent with the request")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            Arg::new("fingerprint")
                .long("fingerprint")
                .action(ArgAction::SetTrue)
                .help("append FINGERPRINT to the request"),
        )
        .get_matches();

    let server: &String = app.get_one("server").expect("wrong server");
    let local_ip: IpAddr = *app.get_one("local_ip").expect("wrong local ip");
    let timeout_ms: u64 = *app.get_one("timeout_ms").expect("wrong timeout");
    let retries: u32 = *app.get_one("retries").expect("wrong retries");
    let software: Option<String> = app.get_one::<String>("software").cloned();
    let fingerprint: bool = *app.get_one("fingerprint").unwrap_or(&false);

    let server = match resolve_server(server, local_ip.is_ipv4()).await {
        Ok(v) => v,
        Err(e) => {
            error!("error, {}", e);
            return;
        }
    };

    let sock = match UdpSocket::bind((local_ip, 0)).await {
        Ok(v) => v,
        Err(e) => {
            error!("error, bind {}, {}", local_ip, e);
            return;
        }
    };
    debug!("local addr: {:?}, server: {}", sock.local_addr(), server);

    let config = ProbeConfig {
        timeout: Duration::from_millis(timeout_ms),
        retries,
        session: SessionConfig {
            software: Some(software.unwrap_or_else(|| format!("{} {}", APP_NAME, APP_VERSION))),
            fingerprint,
            ..Default::default()
        },
    };

    probe_nat(&sock, server, config).await;
}
