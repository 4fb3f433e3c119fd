use crate::constants::FTP_DATA_SIZE;
use crate::core_filesystem::{DirEntry, EntryKind, Filesystem};
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};

/// Handles the ListDirectory request.
///
/// Listing is offset-paged: `request.offset` entries are skipped before
/// records are packed into the reply, and the client walks the directory by
/// reissuing the list with a growing offset. Skipped entries go through the
/// same record generation as packed ones so pagination stays stable across
/// resends; entries that could never be sent don't count against the skip.
pub fn handle_list_command(
    fs: &dyn Filesystem,
    request: &mut FtpMessage,
    reply: &mut FtpMessage,
) {
    // keep the request offset visible in any failure reply
    reply.offset = request.offset;

    if !request.check_name_len() {
        reply.set_error(FtpError::InvalidDataSize);
        return;
    }
    request.null_terminate_path();

    let mut path = request.path();
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let mut dir = match fs.opendir(&path) {
        Ok(dir) => dir,
        Err(e) => {
            nack_fs_error(reply, &e);
            return;
        }
    };

    // burn the entries the client has already seen
    let mut skip = request.offset;
    while skip > 0 {
        let Some(entry) = dir.next_entry() else {
            reply.set_error(FtpError::EndOfFile);
            return;
        };
        match gen_dir_entry(fs, &path, &entry) {
            Some(record) if record.len() <= FTP_DATA_SIZE => skip -= 1,
            _ => continue,
        }
    }

    // pack records while they fit; the remainder waits for the next list
    let mut index = 0;
    while let Some(entry) = dir.next_entry() {
        let Some(record) = gen_dir_entry(fs, &path, &entry) else {
            continue;
        };
        if index + record.len() > FTP_DATA_SIZE {
            break;
        }
        reply.data[index..index + record.len()].copy_from_slice(&record);
        index += record.len();
    }

    if index == 0 {
        reply.set_error(FtpError::EndOfFile);
        return;
    }

    reply.opcode = FtpOpcode::Ack;
    reply.size = index as u8;
}

/// Formats one NUL-terminated listing record: `F<name>\t<size>` for files,
/// `D<name>` for directories. Returns `None` for entries that must not be
/// sent (special files, or anything whose stat fails mid-listing).
fn gen_dir_entry(fs: &dyn Filesystem, dir_path: &str, entry: &DirEntry) -> Option<Vec<u8>> {
    let full_path = format!("{}/{}", dir_path, entry.name);

    let record = match entry.kind {
        Some(EntryKind::Other) => return None,
        Some(EntryKind::Directory) => format!("D{}\0", entry.name),
        Some(EntryKind::File) | Some(EntryKind::Symlink) => {
            let st = fs.stat(&full_path).ok()?;
            format!("F{}\t{}\0", entry.name, st.size)
        }
        // no type tag from the backend: stat decides
        None => {
            let st = fs.stat(&full_path).ok()?;
            if st.is_dir {
                format!("D{}\0", entry.name)
            } else {
                format!("F{}\t{}\0", entry.name, st.size)
            }
        }
    };

    Some(record.into_bytes())
}
