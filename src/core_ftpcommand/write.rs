use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::session::{FileMode, FtpSession};

/// Handles the WriteFile request: seeks to the requested offset and writes
/// the payload bytes through the open handle.
pub fn handle_write_command(
    session: &mut FtpSession,
    request: &FtpMessage,
    reply: &mut FtpMessage,
) {
    let Some(file) = session.open_file.as_mut() else {
        reply.set_error(FtpError::FileNotFound);
        return;
    };
    if file.mode != FileMode::Write {
        reply.set_error(FtpError::Fail);
        return;
    }

    if let Err(e) = file.handle.seek(request.offset as u64) {
        nack_fs_error(reply, &e);
        return;
    }

    match file.handle.write(&request.data[..request.size as usize]) {
        Err(e) => nack_fs_error(reply, &e),
        Ok(_) => {
            reply.opcode = FtpOpcode::Ack;
            reply.offset = request.offset;
        }
    }
}
