use crate::constants::{
    FTP_DATA_SIZE, FTP_INVALID_SESSION, FTP_POLL_INTERVAL_MS,
};
use crate::core_filesystem::Filesystem;
use crate::core_ftpcommand::{burst, crc, list, mkd, open, read, remove, rename, terminate, write};
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::core_transport::pump::ReplyPump;
use crate::session::{FtpSession, GateAction};
use log::debug;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::Receiver;

/// The single thread that owns all transfer state. It drains the request
/// queue, applies the retransmit and session rules, dispatches opcodes and
/// pushes replies; nothing else may touch the open file or the reply cache.
pub struct FtpWorker {
    requests: Receiver<FtpMessage>,
    fs: Arc<dyn Filesystem>,
    pump: ReplyPump,
    session: FtpSession,
}

impl FtpWorker {
    pub fn new(requests: Receiver<FtpMessage>, fs: Arc<dyn Filesystem>, pump: ReplyPump) -> Self {
        FtpWorker {
            requests,
            fs,
            pump,
            session: FtpSession::new(),
        }
    }

    /// Runs until the request queue's sender side goes away.
    pub fn run(mut self) {
        // the reply doubles as the retransmit cache; flag it invalid so no
        // request can match it before the first dispatch
        let mut reply = FtpMessage::default();
        reply.session = FTP_INVALID_SESSION;

        loop {
            let mut request = loop {
                match self.requests.try_recv() {
                    Ok(request) => break request,
                    Err(TryRecvError::Empty) => {
                        thread::sleep(Duration::from_millis(FTP_POLL_INTERVAL_MS))
                    }
                    Err(TryRecvError::Disconnected) => return,
                }
            };

            // if it's a rerequest and we still have the last response, send
            // it again instead of re-running the operation
            if request.sysid == reply.sysid
                && request.compid == reply.compid
                && request.session == reply.session
                && request.seq_number.wrapping_add(1) == reply.seq_number
            {
                self.pump.push_replies(&mut self.session, &reply);
                continue;
            }

            // set up the response
            reply = FtpMessage::default();
            reply.req_opcode = request.opcode;
            reply.session = request.session;
            reply.seq_number = request.seq_number.wrapping_add(1);
            reply.chan = request.chan;
            reply.sysid = request.sysid;
            reply.compid = request.compid;

            // sanity check the request size
            if request.size as usize > FTP_DATA_SIZE {
                reply.set_error(FtpError::InvalidDataSize);
                self.pump.push_replies(&mut self.session, &reply);
                continue;
            }

            let now = self.pump.now_ms();
            let mut skip_push_reply = false;

            match self.session.gate(request.session, request.opcode, now) {
                GateAction::AckOnly => reply.opcode = FtpOpcode::Ack,
                GateAction::RejectInvalidSession => reply.set_error(FtpError::InvalidSession),
                GateAction::Dispatch => match request.opcode {
                    FtpOpcode::None => reply.opcode = FtpOpcode::Ack,
                    FtpOpcode::TerminateSession | FtpOpcode::ResetSessions => {
                        terminate::handle_terminate_command(&mut self.session, &mut reply)
                    }
                    FtpOpcode::ListDirectory => {
                        list::handle_list_command(self.fs.as_ref(), &mut request, &mut reply)
                    }
                    FtpOpcode::OpenFileRO => open::handle_open_ro_command(
                        self.fs.as_ref(),
                        &mut self.session,
                        now,
                        &mut request,
                        &mut reply,
                    ),
                    FtpOpcode::ReadFile => {
                        read::handle_read_command(&mut self.session, &request, &mut reply)
                    }
                    FtpOpcode::Ack | FtpOpcode::Nack => {
                        // eat these, we just didn't expect them
                        continue;
                    }
                    FtpOpcode::OpenFileWO | FtpOpcode::CreateFile => {
                        let create = request.opcode == FtpOpcode::CreateFile;
                        open::handle_open_wo_command(
                            self.fs.as_ref(),
                            &mut self.session,
                            &mut request,
                            &mut reply,
                            create,
                        )
                    }
                    FtpOpcode::WriteFile => {
                        write::handle_write_command(&mut self.session, &request, &mut reply)
                    }
                    FtpOpcode::CreateDirectory => {
                        mkd::handle_mkdir_command(self.fs.as_ref(), &mut request, &mut reply)
                    }
                    FtpOpcode::RemoveFile | FtpOpcode::RemoveDirectory => {
                        remove::handle_remove_command(self.fs.as_ref(), &mut request, &mut reply)
                    }
                    FtpOpcode::CalcFileCRC32 => {
                        crc::handle_crc_command(self.fs.as_ref(), &mut request, &mut reply)
                    }
                    FtpOpcode::BurstReadFile => {
                        skip_push_reply = burst::handle_burst_command(
                            &self.pump,
                            &mut self.session,
                            &request,
                            &mut reply,
                        )
                    }
                    FtpOpcode::Rename => {
                        rename::handle_rename_command(self.fs.as_ref(), &mut request, &mut reply)
                    }
                    FtpOpcode::TruncateFile | FtpOpcode::Unknown(_) => {
                        // this was bad data, just nack it
                        debug!("unsupported FTP opcode: {}", request.opcode.to_byte());
                        reply.set_error(FtpError::Fail);
                    }
                },
            }

            if !skip_push_reply {
                self.pump.push_replies(&mut self.session, &reply);
            }
        }
    }
}
