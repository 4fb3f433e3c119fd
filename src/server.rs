use crate::config::Config;
use crate::constants::{FTP_PAYLOAD_SIZE, FTP_QUEUE_DEPTH};
use crate::core_filesystem::local::LocalFilesystem;
use crate::core_ftpcommand::worker::FtpWorker;
use crate::core_protocol::FtpMessage;
use crate::core_transport::pump::{BannerFn, ReplyPump};
use crate::core_transport::udp::{UdpTransport, DATAGRAM_HEADER_SIZE, DATAGRAM_SIZE};
use crate::core_transport::MavlinkTransport;
use anyhow::{Context, Result};
use log::{debug, info};
use std::sync::Arc;
use std::thread;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Runs the FTP service: binds the transport, spawns the worker thread and
/// decodes inbound frames into the request queue until shutdown.
///
/// # Arguments
///
/// * `config` - The server configuration.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Config) -> Result<()> {
    let std_socket = std::net::UdpSocket::bind(&config.server.listen_addr)
        .with_context(|| format!("Failed to bind {}", config.server.listen_addr))?;
    info!("Listening on {}", config.server.listen_addr);

    // one socket, two views: a std clone for the worker's synchronous sends,
    // a tokio wrapper for the receive loop
    let send_socket = std_socket
        .try_clone()
        .context("Failed to clone the listen socket")?;
    std_socket
        .set_nonblocking(true)
        .context("Failed to make the listen socket non-blocking")?;
    let recv_socket = UdpSocket::from_std(std_socket)?;

    let transport = Arc::new(UdpTransport::new(
        send_socket,
        config.server.system_id,
        config.server.component_id,
    ));
    let fs = Arc::new(LocalFilesystem::new(config.server.root_dir.clone()));

    let banner_text = config
        .server
        .banner
        .clone()
        .unwrap_or_else(|| format!("mavftpd {}", env!("CARGO_PKG_VERSION")));
    let banner: BannerFn = Box::new(move |chan| info!("[chan {}] {}", chan, banner_text));

    let pump = ReplyPump::new(Arc::clone(&transport) as Arc<dyn MavlinkTransport>, banner);
    let (tx, rx) = mpsc::channel(FTP_QUEUE_DEPTH);
    let worker = FtpWorker::new(rx, fs, pump);
    thread::Builder::new()
        .name("ftp".to_string())
        .spawn(move || worker.run())
        .context("Failed to spawn the FTP worker thread")?;

    decode_loop(recv_socket, transport, tx, config.server.system_id).await
}

/// Receives datagrams, decodes them into requests and enqueues them for the
/// worker. This side never touches session state; a full queue simply drops
/// the request and lets the client retransmit.
async fn decode_loop(
    socket: UdpSocket,
    transport: Arc<UdpTransport>,
    tx: mpsc::Sender<FtpMessage>,
    system_id: u8,
) -> Result<()> {
    let mut buf = [0u8; DATAGRAM_SIZE];
    loop {
        let (len, addr) = socket.recv_from(&mut buf).await?;
        if len != DATAGRAM_SIZE {
            debug!("ignoring runt datagram of {} bytes from {}", len, addr);
            continue;
        }

        let sysid = buf[0];
        let compid = buf[1];
        let target_sys = buf[2];
        if target_sys != system_id && target_sys != 0 {
            debug!("ignoring frame addressed to system {}", target_sys);
            continue;
        }

        transport.note_peer(addr);

        let mut payload = [0u8; FTP_PAYLOAD_SIZE];
        payload.copy_from_slice(&buf[DATAGRAM_HEADER_SIZE..]);
        let request = FtpMessage::decode(0, sysid, compid, &payload);

        if tx.try_send(request).is_err() {
            // no buffer space to queue it in; we could NACK it, but that can
            // lead to GCS confusion, so we're treating it like lost data
            debug!("request queue full, dropping frame from {}:{}", sysid, compid);
        }
    }
}
