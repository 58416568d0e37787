/*
每个监听地址绑定一个 socket
一个mpsc 收集数据, 记录从哪个socket收到，源地址多少，数据buf=32k
处理完成后，从收到请求的 socket 发回去
一个退出watch
*/

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch::Receiver as WatchReceiver;

use bytes::Bytes;
use log::{debug, error};
use stun_binding::reflector::Responder;
use stun_binding::util::print_bytes;

// local addr, remote addr, recv data
type SocketInput = (SocketAddr, SocketAddr, Bytes);

pub struct Server {
    signal_rx: WatchReceiver<u8>,
    queue_tx: Arc<Sender<SocketInput>>,
    queue_rx: Receiver<SocketInput>,
    sockets: HashMap<SocketAddr, Arc<UdpSocket>>,
    responder: Responder,
}

impl Server {
    pub async fn new(
        listen: &[SocketAddr],
        responder: Responder,
        signal_rx: WatchReceiver<u8>,
    ) -> io::Result<Self> {
        let (queue_tx, queue_rx) = mpsc::channel::<SocketInput>(100);
        let sockets = init_socket(listen).await?;

        let server = Self {
            signal_rx,
            queue_tx: Arc::new(queue_tx),
            queue_rx,
            sockets,
            responder,
        };
        Ok(server)
    }

    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.sockets.keys().copied().collect()
    }

    pub async fn run(self) {
        let mut handles = vec![];

        for (addr, udp) in self.sockets.iter() {
            let socket = udp.clone();
            let local_addr = *addr;
            let sender = self.queue_tx.clone();
            let signal_rx = self.signal_rx.clone();

            let h = tokio::spawn(async move {
                recv_udp(socket, local_addr, sender, signal_rx).await;
            });
            handles.push(h);
        }

        let h = tokio::spawn(async move {
            process_udp(self.queue_rx, self.signal_rx, self.responder, self.sockets).await;
        });
        handles.push(h);

        for v in handles {
            let _ = v.await;
        }
    }
}

//--------------------------------------------------

async fn init_socket(listen: &[SocketAddr]) -> io::Result<HashMap<SocketAddr, Arc<UdpSocket>>> {
    let mut sockets = HashMap::with_capacity(listen.len());

    for addr in listen {
        let socket = UdpSocket::bind(addr).await?;
        // port 0 时用真实绑定的地址
        let local_addr = socket.local_addr()?;
        debug!("listening: {}", local_addr);
        sockets.insert(local_addr, Arc::new(socket));
    }

    Ok(sockets)
}

async fn recv_udp(
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    sender: Arc<Sender<SocketInput>>,
    mut signal_rx: WatchReceiver<u8>,
) {
    let mut buf = vec![0u8; 32 * 1024];

    loop {
        tokio::select! {
            Ok((len,remote_addr)) = socket.recv_from(&mut buf) => {
                let data = Bytes::copy_from_slice(&buf[..len]);

                debug!("recv len: {}", data.len());
                debug!("{} <--- {}\n{}",local_addr,remote_addr,print_bytes(&data," ",8));

                match sender.send((local_addr,remote_addr,data)).await {
                    Ok(_) => {}
                    Err(e) => {
                        error!("error, recv_udp, {}, {:?}",local_addr,e);
                    }
                };
            },
             _ = signal_rx.changed() => {
                debug!("recv signal, recv_udp, {} will exit.", local_addr);
                break;
            }
        }
    }
}

async fn process_udp(
    mut receiver: Receiver<SocketInput>,
    mut signal_rx: WatchReceiver<u8>,
    responder: Responder,
    sockets: HashMap<SocketAddr, Arc<UdpSocket>>,
) {
    loop {
        tokio::select! {
            Some(input) = receiver.recv() => {
               process_one(input, &responder, &sockets).await;
            },
             _ = signal_rx.changed() => {
                debug!("recv signal, process_input, will exit.");
                break;
            }
        }
    }
}

async fn process_one(
    input: SocketInput,
    responder: &Responder,
    sockets: &HashMap<SocketAddr, Arc<UdpSocket>>,
) {
    // 解析请求数据包
    // 组装响应包
    // 从收到请求的 socket 发回去

    let (local_addr, remote_addr, buf) = input;
    let response = match responder.handle(&buf, remote_addr) {
        Ok(Some(v)) => v,
        Ok(None) => {
            debug!("no response, from remote:{}, local:{}", remote_addr, local_addr);
            return;
        }
        Err(e) => {
            // 解析不了的包直接丢弃, 不回错误响应
            error!(
                "parse error, from remote:{}, local:{}, {}",
                remote_addr, local_addr, e
            );
            return;
        }
    };

    send_response(&response, local_addr, remote_addr, sockets).await;
}

async fn send_response(
    data: &Bytes,
    src_addr: SocketAddr,
    dst_addr: SocketAddr,
    sockets: &HashMap<SocketAddr, Arc<UdpSocket>>,
) {
    let socket = match sockets.get(&src_addr) {
        None => {
            error!("can't find UdpSocket: {}", src_addr);
            return;
        }
        Some(v) => v.clone(),
    };

    match socket.send_to(data, dst_addr).await {
        Ok(v) => {
            debug!(
                "{} ---> {}\n{}",
                src_addr,
                dst_addr,
                print_bytes(data, " ", 8)
            );
            debug!("sent: {}", v);
        }
        Err(e) => {
            error!("error, {} ---> {}, {:?}", src_addr, dst_addr, e);
        }
    };
}
