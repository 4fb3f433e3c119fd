use crate::core_protocol::{FtpMessage, FtpOpcode};
use crate::session::FtpSession;

/// Handles TerminateSession and ResetSessions for the owning session: closes
/// the open file, releases the session and acks. Safe to repeat; terminating
/// an already-closed session just acks again.
pub fn handle_terminate_command(session: &mut FtpSession, reply: &mut FtpMessage) {
    session.close();
    reply.opcode = FtpOpcode::Ack;
}
