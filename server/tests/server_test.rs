use std::net::SocketAddr;
use std::time::Duration;

use server::server::Server;
use stun_binding::reflector::{Responder, ResponderConfig};
use stun_binding::{BindingResult, BindingSession, SessionConfig};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::timeout;

#[tokio::test]
async fn test_reflect_binding_request() {
    let listen: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let responder = Responder::new(ResponderConfig {
        software: Some("server test".to_string()),
        fingerprint: true,
        include_mapped_address: true,
    });

    let (signal_tx, signal_rx) = watch::channel(0_u8);
    let server = Server::new(&[listen], responder, signal_rx).await.unwrap();
    let server_addr = server.local_addrs()[0];
    let server_handle = tokio::spawn(async move {
        server.run().await;
    });

    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let local_addr = sock.local_addr().unwrap();

    let session = BindingSession::new(SessionConfig::default());
    let request = session.start_binding_request_to(server_addr).unwrap();
    sock.send_to(&request.data, server_addr).await.unwrap();

    let mut buf = vec![0u8; 2048];
    let (len, remote_addr) = timeout(Duration::from_secs(5), sock.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(remote_addr, server_addr);

    let result = session
        .handle_received_from(&buf[..len], remote_addr)
        .unwrap();
    assert_eq!(result.socket_addr(), Some(local_addr));
    assert!(matches!(result, BindingResult::Address { .. }));

    signal_tx.send(1).unwrap();
    timeout(Duration::from_secs(5), server_handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_garbage_gets_no_answer() {
    let listen: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let (_signal_tx, signal_rx) = watch::channel(0_u8);
    let server = Server::new(&[listen], Responder::new(ResponderConfig::default()), signal_rx)
        .await
        .unwrap();
    let server_addr = server.local_addrs()[0];
    tokio::spawn(async move {
        server.run().await;
    });

    let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sock.send_to(b"not a stun message", server_addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; 2048];
    let r = timeout(Duration::from_millis(300), sock.recv_from(&mut buf)).await;
    assert!(r.is_err());
}
