// src/constants.rs

/// Full FILE_TRANSFER_PROTOCOL payload: a 12-byte header followed by the data bytes.
pub const FTP_PAYLOAD_SIZE: usize = 251;

/// Length of the fixed header at the front of every payload.
pub const FTP_HEADER_SIZE: usize = 12;

/// Data bytes available in a single message for paths and file contents.
pub const FTP_DATA_SIZE: usize = FTP_PAYLOAD_SIZE - FTP_HEADER_SIZE;

/// Inactivity threshold after which an open file may be reclaimed by another session.
pub const FTP_SESSION_TIMEOUT_MS: u32 = 3000;

/// Depth of the decoder-to-worker request queue. Requests beyond this are dropped.
pub const FTP_QUEUE_DEPTH: usize = 5;

/// Maximum packets sent for a single BurstReadFile request. Enough for a full
/// parameter file with max parameters.
pub const FTP_BURST_TRANSFER_SIZE: u32 = 500;

/// Minimum outbound buffer headroom before a reply is sent. Kept below the
/// threshold where normal stream rates get throttled (49) so FTP is prioritised
/// without starving telemetry.
pub const FTP_TXBUF_MIN_FREE: usize = 33;

/// Worker poll / send-retry interval.
pub const FTP_POLL_INTERVAL_MS: u64 = 2;

/// Session id carried by a reply that has never been sent; no request can match it.
pub const FTP_INVALID_SESSION: u8 = 255;

/// Opening this path for reading triggers the parameter banner, for compatibility
/// with the old parameter download protocol.
pub const FTP_PARAM_PACK_PATH: &[u8; 16] = b"@PARAM/param.pck";
