use log::{debug, error, info};
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use stun_binding::util::print_bytes;
use stun_binding::{BindingResult, BindingSession, SessionConfig, TransId, TransactionState};
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{timeout_at, Instant};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("io, {0}")]
    Io(#[from] io::Error),

    #[error("stun, {0}")]
    Stun(#[from] stun_binding::Error),

    #[error("can't resolve server: {0}")]
    Resolve(String),

    #[error("no response from {server} after {attempts} attempts")]
    Timeout { server: SocketAddr, attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    // 第一次等待的时间, 之后每次翻倍
    pub timeout: Duration,
    pub retries: u32,
    pub session: SessionConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(500),
            retries: 3,
            session: SessionConfig::default(),
        }
    }
}

pub async fn resolve_server(server: &str, ipv4_only: bool) -> Result<SocketAddr, ProbeError> {
    let mut addrs = lookup_host(server).await?;
    addrs
        .find(|x| !ipv4_only || x.is_ipv4())
        .ok_or_else(|| ProbeError::Resolve(server.to_string()))
}

pub async fn probe_nat(sock: &UdpSocket, server: SocketAddr, config: ProbeConfig) {
    match probe_binding(sock, server, config).await {
        Ok(v) => {
            info!("mapped address: {}", v);
            println!("{}", v);
        }
        Err(e) => {
            error!("error, probe_binding, {}", e);
        }
    }
}

fn is_matched(session: &BindingSession, trans_id: &TransId) -> bool {
    session.tracker().state(trans_id) == Some(TransactionState::Matched)
}

pub async fn probe_binding(
    sock: &UdpSocket,
    server: SocketAddr,
    config: ProbeConfig,
) -> Result<SocketAddr, ProbeError> {
    let session = BindingSession::new(config.session);
    let request = session.start_binding_request_to(server)?;
    let mut recv_buf = vec![0u8; 32 * 1024];
    let mut wait = config.timeout;

    for attempt in 1..=config.retries.max(1) {
        let sent = sock.send_to(&request.data, server).await?;
        debug!(
            "{:?} --> {}, attempt {}, sent: {}\n{}",
            sock.local_addr(),
            server,
            attempt,
            sent,
            print_bytes(&request.data, " ", 8)
        );

        let deadline = Instant::now() + wait;
        loop {
            let (len, remote_addr) = match timeout_at(deadline, sock.recv_from(&mut recv_buf)).await
            {
                Ok(v) => v?,
                Err(_) => break,
            };

            debug!("{:?} <-- {}, recv len: {}", sock.local_addr(), remote_addr, len);
            match session.handle_received_from(&recv_buf[..len], remote_addr) {
                Ok(BindingResult::Address { ip, port, .. }) => {
                    return Ok(SocketAddr::new(ip, port));
                }
                Ok(BindingResult::Failed { code, reason }) => {
                    return Err(stun_binding::Error::BindingFailed { code, reason }.into());
                }
                Ok(BindingResult::Unmatched) => {
                    debug!("discard packet from {}", remote_addr);
                }
                // 已经匹配上的响应出错, 不会再有别的响应
                Err(e) if is_matched(&session, &request.trans_id) => {
                    return Err(e.into());
                }
                // 坏包不影响这次请求, 继续等
                Err(e) => {
                    debug!("drop packet from {}, {}", remote_addr, e);
                }
            }
        }

        wait *= 2;
    }

    session.expire(&request.trans_id);
    Err(ProbeError::Timeout {
        server,
        attempts: config.retries.max(1),
    })
}
