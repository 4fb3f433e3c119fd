use crate::constants::FTP_DATA_SIZE;
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::session::{FileMode, FtpSession};

/// Handles the ReadFile request: seeks to the requested offset and returns up
/// to one data buffer of file contents. A read past the end is `EndOfFile`,
/// not a failure.
pub fn handle_read_command(
    session: &mut FtpSession,
    request: &FtpMessage,
    reply: &mut FtpMessage,
) {
    let Some(file) = session.open_file.as_mut() else {
        reply.set_error(FtpError::FileNotFound);
        return;
    };
    if file.mode != FileMode::Read {
        reply.set_error(FtpError::Fail);
        return;
    }

    if let Err(e) = file.handle.seek(request.offset as u64) {
        nack_fs_error(reply, &e);
        return;
    }

    let want = (request.size as usize).min(FTP_DATA_SIZE);
    match file.handle.read(&mut reply.data[..want]) {
        Err(e) => nack_fs_error(reply, &e),
        Ok(0) => reply.set_error(FtpError::EndOfFile),
        Ok(n) => {
            reply.opcode = FtpOpcode::Ack;
            reply.offset = request.offset;
            reply.size = n as u8;
        }
    }
}
