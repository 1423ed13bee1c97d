use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_packet, PacketConfig, RawPacket};
use crate::error::{CodecError, Result};
use crate::family::Direction;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete length-prefixed packets from any `Read` stream.
///
/// Every packet read is tagged with the reader's direction. Handles partial
/// reads internally; callers always get complete packets.
pub struct PacketReader<T> {
    inner: T,
    direction: Direction,
    buf: BytesMut,
    config: PacketConfig,
    /// Set once iteration hit an error it cannot skip past.
    failed: bool,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T, direction: Direction) -> Self {
        Self::with_config(inner, direction, PacketConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, direction: Direction, config: PacketConfig) -> Self {
        Self {
            inner,
            direction,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            failed: false,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(CodecError::ConnectionClosed)` at EOF, whether or not a
    /// packet was in progress; use [`PacketReader::is_drained`] to tell a
    /// clean end apart from a truncated one.
    pub fn read_packet(&mut self) -> Result<RawPacket> {
        loop {
            if let Some(bytes) = decode_packet(&mut self.buf, self.config.max_packet_size)? {
                tracing::trace!(direction = %self.direction, len = bytes.len(), "packet read");
                return Ok(RawPacket::new(self.direction, bytes));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(CodecError::Io(err)),
            };

            if read == 0 {
                return Err(CodecError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// True when no partial packet is buffered.
    pub fn is_drained(&self) -> bool {
        self.buf.is_empty()
    }

    /// Direction assigned to packets from this reader.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current packet reader configuration.
    pub fn config(&self) -> &PacketConfig {
        &self.config
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<RawPacket>;

    /// Yields packets until a clean end of stream. After any error other
    /// than an empty frame the stream position is unknown, so the error is
    /// yielded once and iteration ends.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.read_packet() {
            Err(CodecError::ConnectionClosed) if self.is_drained() => None,
            Err(CodecError::EmptyPacket) => Some(Err(CodecError::EmptyPacket)),
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
            ok => Some(ok),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::encode_packet;

    fn wire(packets: &[&[u8]]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for packet in packets {
            encode_packet(packet, &mut buf).unwrap();
        }
        buf.to_vec()
    }

    #[test]
    fn read_single_packet() {
        let mut reader = PacketReader::new(Cursor::new(wire(&[&[8, 5, 2]])), Direction::Server);
        let packet = reader.read_packet().unwrap();

        assert_eq!(packet.direction, Direction::Server);
        assert_eq!(packet.bytes.as_ref(), &[8, 5, 2]);
    }

    #[test]
    fn iterate_until_clean_end() {
        let reader = PacketReader::new(
            Cursor::new(wire(&[&[1, 4], &[3, 4, 9], &[240, 255]])),
            Direction::Client,
        );
        let packets: Vec<RawPacket> = reader.map(|p| p.unwrap()).collect();

        assert_eq!(packets.len(), 3);
        assert_eq!(packets[1].bytes.as_ref(), &[3, 4, 9]);
        assert!(packets.iter().all(|p| p.direction == Direction::Client));
    }

    #[test]
    fn partial_read_handling() {
        let byte_reader = ByteByByteReader {
            bytes: wire(&[b"slow packet"]),
            pos: 0,
        };
        let mut reader = PacketReader::new(byte_reader, Direction::Server);

        let packet = reader.read_packet().unwrap();
        assert_eq!(packet.bytes.as_ref(), b"slow packet");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = PacketReader::new(Cursor::new(Vec::<u8>::new()), Direction::Server);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, CodecError::ConnectionClosed));
        assert!(reader.is_drained());
    }

    #[test]
    fn connection_closed_mid_packet_surfaces_in_iterator() {
        let mut partial = BytesMut::new();
        partial.put_slice(&[11, 254]);
        partial.put_slice(b"only");

        let mut reader = PacketReader::new(Cursor::new(partial.to_vec()), Direction::Server);
        let item = reader.next().unwrap();
        assert!(matches!(item, Err(CodecError::ConnectionClosed)));
        assert!(!reader.is_drained());
    }

    #[test]
    fn oversized_packet_in_stream() {
        let cfg = PacketConfig {
            max_packet_size: 4,
        };
        let mut reader =
            PacketReader::with_config(Cursor::new(wire(&[&[0u8; 8]])), Direction::Client, cfg);
        let err = reader.read_packet().unwrap_err();
        assert!(matches!(err, CodecError::PacketTooLarge { .. }));
    }

    #[test]
    fn iteration_ends_after_oversized_packet() {
        let cfg = PacketConfig {
            max_packet_size: 4,
        };
        let reader = PacketReader::with_config(
            Cursor::new(wire(&[&[1, 2, 3, 4, 5, 6, 7, 8, 9], &[8, 5]])),
            Direction::Server,
            cfg,
        );
        let items: Vec<Result<RawPacket>> = reader.take(5).collect();

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(CodecError::PacketTooLarge { size: 9, max: 4 })
        ));
    }

    #[test]
    fn iteration_continues_past_empty_frame() {
        let mut bytes = vec![1, 254];
        bytes.extend(wire(&[&[8, 5]]));
        let reader = PacketReader::new(Cursor::new(bytes), Direction::Server);
        let items: Vec<Result<RawPacket>> = reader.collect();

        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(CodecError::EmptyPacket)));
        assert_eq!(items[1].as_ref().unwrap().bytes.as_ref(), &[8, 5]);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire(&[&[8, 5]])),
        };
        let mut framed = PacketReader::new(reader, Direction::Server);
        let packet = framed.read_packet().unwrap();
        assert_eq!(packet.bytes.as_ref(), &[8, 5]);
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
