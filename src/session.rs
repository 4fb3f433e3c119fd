use crate::constants::FTP_SESSION_TIMEOUT_MS;
use crate::core_filesystem::FileHandle;
use crate::core_protocol::FtpOpcode;
use log::info;

/// Access mode selected when the file was opened. Immutable until close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
}

/// The single file a client may hold open, together with the session id that
/// owns it. Holding the handle inside the option ties "a file is open" and
/// "a session owns it" into one state.
pub struct OpenFile {
    pub handle: Box<dyn FileHandle>,
    pub mode: FileMode,
    pub session: u8,
}

/// Worker-owned transfer state. Only the FTP worker thread ever touches this,
/// so no locking is involved; the decoder side never sees it.
pub struct FtpSession {
    pub open_file: Option<OpenFile>,
    /// Millisecond timestamp of the last successful reply send. Zero means no
    /// transfer is in progress and disables the idle comparisons.
    pub last_send_ms: u32,
    /// Channels owed a banner line after a parameter-pack open.
    pub need_banner_send_mask: u32,
}

/// What the pre-dispatch session check decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateAction {
    /// Terminating a session that is not ours: acknowledge without touching state.
    AckOnly,
    /// A different session owns the open file and is still active.
    RejectInvalidSession,
    /// Safe to run the opcode.
    Dispatch,
}

impl FtpSession {
    pub fn new() -> Self {
        FtpSession {
            open_file: None,
            last_send_ms: 0,
            need_banner_send_mask: 0,
        }
    }

    pub fn owns(&self, session: u8) -> bool {
        self.open_file.as_ref().map_or(false, |f| f.session == session)
    }

    /// Closes the open file (if any) and releases the owning session.
    pub fn close(&mut self) {
        self.open_file = None;
    }

    pub fn idle_ms(&self, now: u32) -> u32 {
        now.wrapping_sub(self.last_send_ms)
    }

    /// Applies the session-ownership rules ahead of dispatch, reclaiming a
    /// stale foreign session as a side effect.
    pub fn gate(&mut self, request_session: u8, opcode: FtpOpcode, now: u32) -> GateAction {
        if !self.owns(request_session)
            && matches!(
                opcode,
                FtpOpcode::TerminateSession | FtpOpcode::ResetSessions
            )
        {
            return GateAction::AckOnly;
        }

        if self.open_file.is_some() && !self.owns(request_session) {
            if self.idle_ms(now) < FTP_SESSION_TIMEOUT_MS {
                // an open file belongs to someone else; reject to prevent IO
                // on the wrong file
                return GateAction::RejectInvalidSession;
            }
            // the old session went quiet past the timeout; force-close it so
            // the new session can proceed
            info!("reclaiming idle FTP session for client {}", request_session);
            self.close();
        }

        GateAction::Dispatch
    }
}
