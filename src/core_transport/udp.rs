use crate::constants::FTP_PAYLOAD_SIZE;
use crate::core_transport::MavlinkTransport;
use log::warn;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Mutex;

/// Bytes of addressing prepended to every datagram:
/// `[sysid, compid, target_sys, target_comp]`.
pub const DATAGRAM_HEADER_SIZE: usize = 4;

/// Total size of one FILE_TRANSFER_PROTOCOL datagram on the wire.
pub const DATAGRAM_SIZE: usize = DATAGRAM_HEADER_SIZE + FTP_PAYLOAD_SIZE;

/// Minimal UDP carrier standing in for the full MAVLink framing layer: one
/// datagram per message, single channel. The GCS address is learned from the
/// most recent inbound datagram, so replies always go to whoever spoke last.
pub struct UdpTransport {
    socket: UdpSocket,
    system_id: u8,
    component_id: u8,
    peer: Mutex<Option<SocketAddr>>,
    // serialises writers sharing the channel
    tx_lock: Mutex<()>,
}

impl UdpTransport {
    pub fn new(socket: UdpSocket, system_id: u8, component_id: u8) -> Self {
        UdpTransport {
            socket,
            system_id,
            component_id,
            peer: Mutex::new(None),
            tx_lock: Mutex::new(()),
        }
    }

    /// Remembers where the most recent request came from.
    pub fn note_peer(&self, addr: SocketAddr) {
        *self.peer.lock().unwrap() = Some(addr);
    }
}

impl MavlinkTransport for UdpTransport {
    fn txbuf_headroom(&self, _chan: u8) -> usize {
        // datagram sockets have no outbound buffer accounting; report plenty
        usize::MAX
    }

    fn have_payload_space(&self, _chan: u8) -> bool {
        true
    }

    fn bandwidth_bps(&self, _chan: u8) -> Option<u32> {
        None
    }

    fn flow_control_enabled(&self, _chan: u8) -> bool {
        // UDP links are assumed lossless enough not to need burst pacing
        true
    }

    fn send(&self, _chan: u8, target_sys: u8, target_comp: u8, payload: &[u8; FTP_PAYLOAD_SIZE]) {
        let peer = *self.peer.lock().unwrap();
        let Some(peer) = peer else {
            warn!("dropping reply: no GCS has contacted us yet");
            return;
        };

        let mut datagram = [0u8; DATAGRAM_SIZE];
        datagram[0] = self.system_id;
        datagram[1] = self.component_id;
        datagram[2] = target_sys;
        datagram[3] = target_comp;
        datagram[DATAGRAM_HEADER_SIZE..].copy_from_slice(payload);

        let _guard = self.tx_lock.lock().unwrap();
        loop {
            match self.socket.send_to(&datagram, peer) {
                Ok(_) => break,
                // the receive side shares the descriptor and runs it
                // non-blocking; wait out a momentarily full send buffer
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Err(e) => {
                    warn!("failed to send reply to {}: {}", peer, e);
                    break;
                }
            }
        }
    }
}
