use crate::core_filesystem::Filesystem;
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};

/// Handles the CreateDirectory request.
pub fn handle_mkdir_command(
    fs: &dyn Filesystem,
    request: &mut FtpMessage,
    reply: &mut FtpMessage,
) {
    if !request.check_name_len() {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }
    request.null_terminate_path();

    if let Err(e) = fs.mkdir(&request.path()) {
        nack_fs_error(reply, &e);
        return;
    }
    reply.opcode = FtpOpcode::Ack;
}
