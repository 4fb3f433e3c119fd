use crate::constants::FTP_DATA_SIZE;
use crate::core_filesystem::Filesystem;
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::helpers::strnlen;

/// Handles the Rename request. The payload carries two NUL-separated paths;
/// `size` must cover both strings exactly, with or without the terminating
/// NUL of the second one.
pub fn handle_rename_command(
    fs: &dyn Filesystem,
    request: &mut FtpMessage,
    reply: &mut FtpMessage,
) {
    let len1 = strnlen(&request.data[..FTP_DATA_SIZE - 2]);
    let len2 = strnlen(&request.data[len1 + 1..]);
    let size = request.size as usize;

    let tail_nul_counted =
        size as isize - (len1 + len2) as isize == 2 && request.data[FTP_DATA_SIZE - 1] == 0;
    if request.data[len1] != 0
        || (len1 + len2 + 1 != size && !tail_nul_counted)
        || request.size == 0
    {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }

    // ensure the 2nd path is terminated
    request.null_terminate_path();
    let from = String::from_utf8_lossy(&request.data[..len1]).into_owned();
    let to = String::from_utf8_lossy(&request.data[len1 + 1..len1 + 1 + len2]).into_owned();

    if let Err(e) = fs.rename(&from, &to) {
        nack_fs_error(reply, &e);
        return;
    }
    reply.opcode = FtpOpcode::Ack;
}
