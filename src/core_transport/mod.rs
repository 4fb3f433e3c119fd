// Transport adapter between the FTP worker and the messaging layer. The
// worker only talks to the `MavlinkTransport` trait; the UDP carrier is one
// implementation, the test double another.
pub mod pump;
pub mod udp;

use crate::constants::FTP_PAYLOAD_SIZE;

pub trait MavlinkTransport: Send + Sync {
    /// Free bytes in the channel's outbound buffer.
    fn txbuf_headroom(&self, chan: u8) -> usize;

    /// Whether one more FILE_TRANSFER_PROTOCOL message fits right now.
    fn have_payload_space(&self, chan: u8) -> bool;

    /// Link bandwidth estimate in bytes per second, when the channel has one.
    fn bandwidth_bps(&self, chan: u8) -> Option<u32>;

    fn flow_control_enabled(&self, chan: u8) -> bool;

    /// On-wire size of one FILE_TRANSFER_PROTOCOL message on this channel.
    fn payload_size(&self, chan: u8) -> usize {
        FTP_PAYLOAD_SIZE
    }

    /// Transmits one payload to the addressed peer. Implementations hold
    /// their per-channel lock across the write so concurrent producers on the
    /// same channel cannot interleave.
    fn send(&self, chan: u8, target_sys: u8, target_comp: u8, payload: &[u8; FTP_PAYLOAD_SIZE]);
}
