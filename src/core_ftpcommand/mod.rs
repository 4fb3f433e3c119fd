// Here's the list of the FTP opcodes implemented
pub mod burst;
pub mod crc;
pub mod list;
pub mod mkd;
pub mod open;
pub mod read;
pub mod remove;
pub mod rename;
pub mod terminate;
pub mod write;

// The dispatch loop lives here
pub mod worker;

#[cfg(test)]
mod test_ftp;

use crate::core_filesystem::FsError;
use crate::core_protocol::{FtpError, FtpMessage};

/// Builds the Nack for a filesystem failure: exists and not-found get their
/// own codes, anything else is `FailErrno` with the raw errno appended for
/// diagnostics.
pub(crate) fn nack_fs_error(reply: &mut FtpMessage, err: &FsError) {
    match err {
        FsError::AlreadyExists => reply.set_error(FtpError::FileExists),
        FsError::NotFound => reply.set_error(FtpError::FileNotFound),
        FsError::Errno(_) => {
            reply.set_error(FtpError::FailErrno);
            reply.data[1] = err.errno_byte();
            reply.size = 2;
        }
    }
}
