use crate::core_filesystem::Filesystem;
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};

/// Handles the CalcFileCRC32 request: whole-file checksum computed by the
/// backend, returned as four little-endian bytes.
pub fn handle_crc_command(fs: &dyn Filesystem, request: &mut FtpMessage, reply: &mut FtpMessage) {
    if !request.check_name_len() {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }
    request.null_terminate_path();

    let checksum = match fs.crc32(&request.path()) {
        Ok(checksum) => checksum,
        Err(e) => {
            nack_fs_error(reply, &e);
            return;
        }
    };

    reply.opcode = FtpOpcode::Ack;
    reply.size = 4;
    reply.data[..4].copy_from_slice(&checksum.to_le_bytes());
}
