use crate::constants::{
    FTP_DATA_SIZE, FTP_POLL_INTERVAL_MS, FTP_TXBUF_MIN_FREE,
};
use crate::core_protocol::{FtpMessage, FtpOpcode};
use crate::core_transport::MavlinkTransport;
use crate::session::FtpSession;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Called once per channel that is owed a banner after a parameter-pack open.
pub type BannerFn = Box<dyn Fn(u8) + Send>;

/// Backpressure-aware reply sender owned by the worker thread. Also the
/// worker's clock: session idle timestamps are milliseconds from the pump's
/// epoch.
pub struct ReplyPump {
    transport: Arc<dyn MavlinkTransport>,
    banner: BannerFn,
    epoch: Instant,
}

impl ReplyPump {
    pub fn new(transport: Arc<dyn MavlinkTransport>, banner: BannerFn) -> Self {
        ReplyPump {
            transport,
            banner,
            epoch: Instant::now(),
        }
    }

    /// Milliseconds since the pump was created. Never returns zero, which is
    /// reserved to mean "no transfer in progress".
    pub fn now_ms(&self) -> u32 {
        (self.epoch.elapsed().as_millis() as u32).max(1)
    }

    /// Attempts one transmit. Refuses when the channel is low on outbound
    /// headroom or cannot fit another message, leaving the retry to the
    /// caller.
    fn send_reply(&self, reply: &FtpMessage) -> bool {
        if self.transport.txbuf_headroom(reply.chan) <= FTP_TXBUF_MIN_FREE {
            return false;
        }
        if !self.transport.have_payload_space(reply.chan) {
            return false;
        }
        self.transport
            .send(reply.chan, reply.sysid, reply.compid, &reply.encode());
        true
    }

    /// Sends a reply, spinning with short sleeps until the channel accepts
    /// it, then settles the per-send bookkeeping: the activity timestamp, the
    /// terminate reset, and any banner owed on the channel.
    pub fn push_replies(&self, session: &mut FtpSession, reply: &FtpMessage) {
        session.last_send_ms = self.now_ms();

        while !self.send_reply(reply) {
            thread::sleep(Duration::from_millis(FTP_POLL_INTERVAL_MS));
        }

        if reply.req_opcode == FtpOpcode::TerminateSession {
            session.last_send_ms = 0;
        }

        // the banner goes out after the reply so the GCS sees the open
        // response promptly on slow links
        if (reply.chan as u32) < 32 && session.need_banner_send_mask & (1 << reply.chan) != 0 {
            session.need_banner_send_mask &= !(1 << reply.chan);
            (self.banner)(reply.chan);
        }
    }

    /// Inter-packet delay for a burst so the transfer uses at most a third of
    /// the link on channels without hardware flow control.
    pub fn burst_delay_ms(&self, chan: u8, max_read: usize) -> u64 {
        if self.transport.flow_control_enabled(chan) {
            return 0;
        }
        let Some(bw) = self.transport.bandwidth_bps(chan) else {
            return 0;
        };
        if bw == 0 {
            return 0;
        }
        let pkt_size = self
            .transport
            .payload_size(chan)
            .saturating_sub(FTP_DATA_SIZE - max_read);
        3000 * pkt_size as u64 / bw as u64
    }
}
