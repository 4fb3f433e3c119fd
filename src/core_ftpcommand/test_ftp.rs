// End-to-end tests for the FTP worker: requests go through the real queue,
// replies come back through a recording transport.

#[cfg(test)]
mod tests {
    use crate::constants::{FTP_QUEUE_DEPTH, FTP_SESSION_TIMEOUT_MS};
    use crate::core_filesystem::local::LocalFilesystem;
    use crate::core_ftpcommand::worker::FtpWorker;
    use crate::core_protocol::{FtpError, FtpMessage, FtpOpcode};
    use crate::core_transport::pump::{BannerFn, ReplyPump};
    use crate::core_transport::testing::MockTransport;
    use crate::core_transport::MavlinkTransport;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    struct Harness {
        tx: mpsc::Sender<FtpMessage>,
        transport: Arc<MockTransport>,
        banners: Arc<Mutex<Vec<u8>>>,
        _dir: TempDir,
    }

    impl Harness {
        fn start() -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::write(dir.path().join("data.bin"), b"ABCDEFGH").unwrap();
            let burst: Vec<u8> = (0..500u32).map(|i| i as u8).collect();
            std::fs::write(dir.path().join("burst.bin"), &burst).unwrap();
            std::fs::create_dir(dir.path().join("@PARAM")).unwrap();
            std::fs::write(dir.path().join("@PARAM/param.pck"), b"pck").unwrap();

            let fs = Arc::new(LocalFilesystem::new(dir.path()));
            let transport = Arc::new(MockTransport::new());
            let banners = Arc::new(Mutex::new(Vec::new()));
            let recorded = Arc::clone(&banners);
            let banner: BannerFn = Box::new(move |chan| recorded.lock().unwrap().push(chan));
            let pump = ReplyPump::new(
                Arc::clone(&transport) as Arc<dyn MavlinkTransport>,
                banner,
            );

            let (tx, rx) = mpsc::channel(FTP_QUEUE_DEPTH);
            let worker = FtpWorker::new(rx, fs, pump);
            thread::Builder::new()
                .name("ftp".to_string())
                .spawn(move || worker.run())
                .unwrap();

            Harness {
                tx,
                transport,
                banners,
                _dir: dir,
            }
        }

        fn send(&self, request: FtpMessage) {
            self.tx.try_send(request).unwrap();
        }

        /// Blocks until the transport has seen `count` replies, then decodes
        /// them all.
        fn wait_for(&self, count: usize) -> Vec<FtpMessage> {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.transport.sent_count() < count {
                assert!(
                    Instant::now() < deadline,
                    "timed out waiting for {} replies, got {}",
                    count,
                    self.transport.sent_count()
                );
                thread::sleep(Duration::from_millis(2));
            }
            let sent = self.transport.sent.lock().unwrap();
            sent.iter()
                .map(|(chan, sys, comp, payload)| FtpMessage::decode(*chan, *sys, *comp, payload))
                .collect()
        }
    }

    fn request(opcode: FtpOpcode, session: u8, seq: u16) -> FtpMessage {
        let mut request = FtpMessage::default();
        request.sysid = 255;
        request.compid = 190;
        request.opcode = opcode;
        request.session = session;
        request.seq_number = seq;
        request
    }

    fn path_request(opcode: FtpOpcode, session: u8, seq: u16, path: &str) -> FtpMessage {
        let mut request = request(opcode, session, seq);
        request.data[..path.len()].copy_from_slice(path.as_bytes());
        request.size = path.len() as u8;
        request
    }

    #[test]
    fn open_read_terminate_round_trip() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 10, "/data.bin"));
        let replies = h.wait_for(1);
        let open_ack = &replies[0];
        assert_eq!(open_ack.opcode, FtpOpcode::Ack);
        assert_eq!(open_ack.req_opcode, FtpOpcode::OpenFileRO);
        assert_eq!(open_ack.seq_number, 11);
        assert_eq!(open_ack.session, 1);
        assert_eq!(open_ack.size, 4);
        assert_eq!(
            u32::from_le_bytes(open_ack.data[..4].try_into().unwrap()),
            8
        );

        let mut read = request(FtpOpcode::ReadFile, 1, 11);
        read.offset = 0;
        read.size = 239;
        h.send(read);
        let replies = h.wait_for(2);
        let read_ack = &replies[1];
        assert_eq!(read_ack.opcode, FtpOpcode::Ack);
        assert_eq!(read_ack.req_opcode, FtpOpcode::ReadFile);
        assert_eq!(read_ack.seq_number, 12);
        assert_eq!(read_ack.size, 8);
        assert_eq!(&read_ack.data[..8], b"ABCDEFGH");

        h.send(request(FtpOpcode::TerminateSession, 1, 12));
        let replies = h.wait_for(3);
        assert_eq!(replies[2].opcode, FtpOpcode::Ack);
        assert_eq!(replies[2].req_opcode, FtpOpcode::TerminateSession);
        assert_eq!(replies[2].seq_number, 13);
    }

    #[test]
    fn retransmit_replays_identical_bytes() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 10, "/data.bin"));
        h.wait_for(1);
        // the client missed the ack and sends the same request again
        h.send(path_request(FtpOpcode::OpenFileRO, 1, 10, "/data.bin"));
        h.wait_for(2);

        let first = h.transport.sent_payload(0);
        let second = h.transport.sent_payload(1);
        assert_eq!(first[..], second[..]);

        // a re-dispatch would have nacked the second open; the cached ack
        // proves the operation ran once
        let replay = FtpMessage::decode(0, 0, 0, &second);
        assert_eq!(replay.opcode, FtpOpcode::Ack);
    }

    #[test]
    fn foreign_session_is_rejected_while_fresh() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 0, "/data.bin"));
        h.wait_for(1);

        let mut read = request(FtpOpcode::ReadFile, 2, 50);
        read.size = 8;
        h.send(read);
        let replies = h.wait_for(2);
        assert_eq!(replies[1].opcode, FtpOpcode::Nack);
        assert_eq!(replies[1].data[0], FtpError::InvalidSession.to_byte());

        // the original session still works
        let mut read = request(FtpOpcode::ReadFile, 1, 1);
        read.size = 8;
        h.send(read);
        let replies = h.wait_for(3);
        assert_eq!(replies[2].opcode, FtpOpcode::Ack);
    }

    #[test]
    fn idle_session_is_reclaimed_by_newcomer() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 0, "/data.bin"));
        h.wait_for(1);

        thread::sleep(Duration::from_millis(FTP_SESSION_TIMEOUT_MS as u64 + 100));

        h.send(path_request(FtpOpcode::OpenFileRO, 2, 0, "/burst.bin"));
        let replies = h.wait_for(2);
        assert_eq!(replies[1].opcode, FtpOpcode::Ack);
        assert_eq!(replies[1].session, 2);
    }

    #[test]
    fn burst_streams_file_then_read_past_end() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 0, "/burst.bin"));
        h.wait_for(1);

        h.send(request(FtpOpcode::BurstReadFile, 1, 1));
        // open ack + three burst acks + trailing EndOfFile nack
        let replies = h.wait_for(5);

        let total: usize = replies[1..4].iter().map(|r| r.size as usize).sum();
        assert_eq!(total, 500);
        assert!(replies[1..4].iter().all(|r| r.opcode == FtpOpcode::Ack));
        assert!(!replies[1].burst_complete);
        assert!(!replies[2].burst_complete);
        assert!(replies[3].burst_complete);

        let tail = &replies[4];
        assert_eq!(tail.opcode, FtpOpcode::Nack);
        assert_eq!(tail.data[0], FtpError::EndOfFile.to_byte());
        assert_eq!(tail.offset, 500);

        // the window is consumed; reading past the end still nacks cleanly
        let mut read = request(FtpOpcode::ReadFile, 1, 10);
        read.offset = 500;
        read.size = 239;
        h.send(read);
        let replies = h.wait_for(6);
        assert_eq!(replies[5].opcode, FtpOpcode::Nack);
        assert_eq!(replies[5].data[0], FtpError::EndOfFile.to_byte());
    }

    #[test]
    fn write_session_round_trips_data() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::CreateFile, 5, 0, "/new.bin"));
        h.wait_for(1);

        let mut write = request(FtpOpcode::WriteFile, 5, 1);
        write.offset = 0;
        write.data[..11].copy_from_slice(b"hello world");
        write.size = 11;
        h.send(write);
        let replies = h.wait_for(2);
        assert_eq!(replies[1].opcode, FtpOpcode::Ack);
        assert_eq!(replies[1].offset, 0);

        h.send(request(FtpOpcode::TerminateSession, 5, 2));
        h.wait_for(3);

        h.send(path_request(FtpOpcode::OpenFileRO, 6, 10, "/new.bin"));
        let replies = h.wait_for(4);
        assert_eq!(
            u32::from_le_bytes(replies[3].data[..4].try_into().unwrap()),
            11
        );

        let mut read = request(FtpOpcode::ReadFile, 6, 11);
        read.size = 239;
        h.send(read);
        let replies = h.wait_for(5);
        assert_eq!(&replies[4].data[..11], b"hello world");
    }

    #[test]
    fn truncate_is_nacked_with_fail() {
        let h = Harness::start();
        h.send(request(FtpOpcode::TruncateFile, 1, 0));
        let replies = h.wait_for(1);
        assert_eq!(replies[0].opcode, FtpOpcode::Nack);
        assert_eq!(replies[0].data[0], FtpError::Fail.to_byte());
    }

    #[test]
    fn unknown_opcode_is_nacked_with_fail() {
        let h = Harness::start();
        h.send(request(FtpOpcode::Unknown(42), 1, 0));
        let replies = h.wait_for(1);
        assert_eq!(replies[0].opcode, FtpOpcode::Nack);
        assert_eq!(replies[0].data[0], FtpError::Fail.to_byte());
        assert_eq!(replies[0].req_opcode, FtpOpcode::Unknown(42));
    }

    #[test]
    fn oversized_request_is_nacked() {
        let h = Harness::start();
        let mut bad = request(FtpOpcode::ListDirectory, 1, 0);
        bad.size = 255;
        h.send(bad);
        let replies = h.wait_for(1);
        assert_eq!(replies[0].opcode, FtpOpcode::Nack);
        assert_eq!(replies[0].data[0], FtpError::InvalidDataSize.to_byte());
    }

    #[test]
    fn stray_acks_and_nacks_are_eaten() {
        let h = Harness::start();
        h.send(request(FtpOpcode::Ack, 1, 0));
        h.send(request(FtpOpcode::Nack, 1, 1));
        h.send(request(FtpOpcode::None, 1, 2));
        let replies = h.wait_for(1);
        // only the None op got a reply
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].req_opcode, FtpOpcode::None);
        assert_eq!(replies[0].opcode, FtpOpcode::Ack);
    }

    #[test]
    fn terminating_someone_elses_session_just_acks() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 0, "/data.bin"));
        h.wait_for(1);

        h.send(request(FtpOpcode::TerminateSession, 9, 0));
        let replies = h.wait_for(2);
        assert_eq!(replies[1].opcode, FtpOpcode::Ack);

        // session 1 still owns its file
        let mut read = request(FtpOpcode::ReadFile, 1, 1);
        read.size = 4;
        h.send(read);
        let replies = h.wait_for(3);
        assert_eq!(replies[2].opcode, FtpOpcode::Ack);
    }

    #[test]
    fn banner_follows_param_pack_open() {
        let h = Harness::start();

        h.send(path_request(FtpOpcode::OpenFileRO, 1, 0, "@PARAM/param.pck"));
        let replies = h.wait_for(1);
        assert_eq!(replies[0].opcode, FtpOpcode::Ack);

        let deadline = Instant::now() + Duration::from_secs(1);
        while h.banners.lock().unwrap().is_empty() {
            assert!(Instant::now() < deadline, "banner never sent");
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(*h.banners.lock().unwrap(), vec![0]);
    }

    #[test]
    fn directory_listing_round_trip() {
        let h = Harness::start();

        let mut list = path_request(FtpOpcode::ListDirectory, 1, 0, "/");
        list.offset = 0;
        h.send(list);
        let replies = h.wait_for(1);
        assert_eq!(replies[0].opcode, FtpOpcode::Ack);
        let listing = String::from_utf8_lossy(&replies[0].data[..replies[0].size as usize])
            .into_owned();
        assert!(listing.contains("Fdata.bin\t8"));
        assert!(listing.contains("Fburst.bin\t500"));
        assert!(listing.contains("D@PARAM"));
    }
}
