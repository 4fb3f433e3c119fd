use crate::constants::{FTP_BURST_TRANSFER_SIZE, FTP_DATA_SIZE};
use crate::core_ftpcommand::nack_fs_error;
use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
use crate::core_transport::pump::ReplyPump;
use crate::session::{FileMode, FtpSession};
use std::thread;
use std::time::Duration;

/// Handles the BurstReadFile request.
///
/// Streams up to 500 read replies directly through the pump, advancing the
/// file offset by one chunk per packet. The stream ends early at end of file
/// (a short read marks `burst_complete`, the following zero read nacks
/// `EndOfFile`), and pacing between packets keeps the burst to a third of the
/// link bandwidth on channels without hardware flow control.
///
/// Returns `true` when the stream already delivered its replies and the
/// dispatch loop must not send the trailing one.
///
/// # Arguments
///
/// * `pump` - The reply pump the stream transmits through.
/// * `session` - The worker's transfer state.
/// * `request` - The decoded request; `size` selects the chunk length, zero
///   meaning a full data buffer.
/// * `reply` - Reply shell reused for every packet of the stream.
pub fn handle_burst_command(
    pump: &ReplyPump,
    session: &mut FtpSession,
    request: &FtpMessage,
    reply: &mut FtpMessage,
) -> bool {
    let max_read = if request.size == 0 {
        FTP_DATA_SIZE
    } else {
        request.size as usize
    };

    // the file leaves the session for the duration of the stream; the pump
    // only touches timestamps and the banner mask
    let Some(mut file) = session.open_file.take() else {
        reply.set_error(FtpError::FileNotFound);
        return false;
    };
    if file.mode != FileMode::Read {
        session.open_file = Some(file);
        reply.set_error(FtpError::Fail);
        return false;
    }
    if let Err(e) = file.handle.seek(request.offset as u64) {
        session.open_file = Some(file);
        nack_fs_error(reply, &e);
        return false;
    }

    let burst_delay_ms = pump.burst_delay_ms(request.chan, max_read);

    for i in 0..FTP_BURST_TRANSFER_SIZE {
        let want = max_read.min(FTP_DATA_SIZE);
        let read_bytes = match file.handle.read(&mut reply.data[..want]) {
            Ok(n) => n,
            Err(e) => {
                nack_fs_error(reply, &e);
                break;
            }
        };

        if read_bytes != FTP_DATA_SIZE {
            // don't send any old data
            reply.data[read_bytes..].fill(0);
        }

        if read_bytes == 0 {
            reply.set_error(FtpError::EndOfFile);
            break;
        }

        reply.opcode = FtpOpcode::Ack;
        reply.offset = request.offset.wrapping_add(i.wrapping_mul(max_read as u32));
        reply.burst_complete = read_bytes < max_read || i == FTP_BURST_TRANSFER_SIZE - 1;
        reply.size = read_bytes as u8;

        pump.push_replies(session, reply);

        if read_bytes < max_read {
            // the EndOfFile nack that follows must carry the advanced offset
            reply.offset = reply.offset.wrapping_add(read_bytes as u32);
        }

        // prep the reply for the next packet of the stream
        reply.seq_number = reply.seq_number.wrapping_add(1);

        if burst_delay_ms > 0 {
            thread::sleep(Duration::from_millis(burst_delay_ms));
        }
    }

    session.open_file = Some(file);

    // a nack still needs the trailing send from the dispatch loop
    reply.opcode != FtpOpcode::Nack
}
