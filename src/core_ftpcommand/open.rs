use crate::constants::{FTP_PARAM_PACK_PATH, FTP_SESSION_TIMEOUT_MS};
use crate::core_filesystem::Filesystem;
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::session::{FileMode, FtpSession, OpenFile};
use log::info;

/// Handles the OpenFileRO request.
///
/// Stats the file first so the ack can report its size, then opens it for
/// reading and claims the session. A stale open file whose client went quiet
/// past the session timeout is closed first, covering a client that timed out
/// waiting for a previous open's ack.
///
/// # Arguments
///
/// * `fs` - The filesystem backend.
/// * `session` - The worker's transfer state.
/// * `now` - Current worker clock, milliseconds.
/// * `request` - The decoded request; the path buffer gets NUL-forced.
/// * `reply` - Prepared reply shell to fill in.
pub fn handle_open_ro_command(
    fs: &dyn Filesystem,
    session: &mut FtpSession,
    now: u32,
    request: &mut FtpMessage,
    reply: &mut FtpMessage,
) {
    // only one file may be open at a time
    if session.open_file.is_some() && session.idle_ms(now) > FTP_SESSION_TIMEOUT_MS {
        info!("closing stale open file before read-only open");
        session.close();
    }
    if session.open_file.is_some() {
        reply.set_error(FtpError::Fail);
        return;
    }

    if !request.check_name_len() {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }
    request.null_terminate_path();
    let path = request.path();

    let st = match fs.stat(&path) {
        Ok(st) => st,
        Err(e) => {
            nack_fs_error(reply, &e);
            return;
        }
    };

    let handle = match fs.open_read(&path) {
        Ok(handle) => handle,
        Err(e) => {
            nack_fs_error(reply, &e);
            return;
        }
    };

    session.open_file = Some(OpenFile {
        handle,
        mode: FileMode::Read,
        session: request.session,
    });

    reply.opcode = FtpOpcode::Ack;
    reply.size = 4;
    reply.data[..4].copy_from_slice(&(st.size as u32).to_le_bytes());

    // compatibility with the old protocol's banner-on-parameter-download
    if request.data[..FTP_PARAM_PACK_PATH.len()] == FTP_PARAM_PACK_PATH[..]
        && (reply.chan as u32) < 32
    {
        session.need_banner_send_mask |= 1 << reply.chan;
    }
}

/// Handles OpenFileWO and CreateFile: opens for writing (creating and
/// truncating for CreateFile) and claims the session.
pub fn handle_open_wo_command(
    fs: &dyn Filesystem,
    session: &mut FtpSession,
    request: &mut FtpMessage,
    reply: &mut FtpMessage,
    create: bool,
) {
    if session.open_file.is_some() {
        reply.set_error(FtpError::Fail);
        return;
    }

    if !request.check_name_len() {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }
    request.null_terminate_path();
    let path = request.path();

    let open_result = if create {
        fs.create(&path)
    } else {
        fs.open_write(&path)
    };
    let handle = match open_result {
        Ok(handle) => handle,
        Err(e) => {
            nack_fs_error(reply, &e);
            return;
        }
    };

    session.open_file = Some(OpenFile {
        handle,
        mode: FileMode::Write,
        session: request.session,
    });

    reply.opcode = FtpOpcode::Ack;
}
