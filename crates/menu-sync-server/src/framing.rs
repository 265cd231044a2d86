use bytes::BytesMut;
use std::io;
use tokio::io::AsyncReadExt;

/// Reads one `[u32 len][code][payload]` frame, length prefix included in the result.
///
/// `Ok(None)` only for an EOF between frames; a connection closed mid-frame is an
/// `UnexpectedEof` error, and a zero or oversized length is `InvalidData`.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    r: &mut R,
    max_frame: usize,
    buf: &mut BytesMut,
) -> io::Result<Option<BytesMut>> {
    while buf.len() < 4 {
        if r.read_buf(buf).await? == 0 {
            return if buf.is_empty() {
                Ok(None)
            } else {
                Err(io::ErrorKind::UnexpectedEof.into())
            };
        }
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

    if len == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "empty frame"));
    }
    if len > max_frame {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds limit of {max_frame}"),
        ));
    }

    let total = 4 + len;
    buf.reserve(total.saturating_sub(buf.len()));
    while buf.len() < total {
        if r.read_buf(buf).await? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
    }
    Ok(Some(buf.split_to(total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use menu_proto::{encode_request, Opcode};

    #[tokio::test]
    async fn test_reads_back_to_back_frames() {
        let mut wire = encode_request(Opcode::Ping, &[]).to_vec();
        wire.extend_from_slice(&encode_request(Opcode::Get, b"\x01\x00k"));
        let mut reader = &wire[..];
        let mut buf = BytesMut::new();

        let first = read_frame(&mut reader, 1024, &mut buf).await.unwrap().unwrap();
        assert_eq!(first[4], Opcode::Ping as u8);
        let second = read_frame(&mut reader, 1024, &mut buf).await.unwrap().unwrap();
        assert_eq!(second[4], Opcode::Get as u8);
        assert!(read_frame(&mut reader, 1024, &mut buf).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_oversized_frame() {
        let wire = encode_request(Opcode::Set, &[0u8; 64]);
        let mut reader = &wire[..];
        let mut buf = BytesMut::new();
        let err = read_frame(&mut reader, 16, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_an_error() {
        let wire = encode_request(Opcode::Set, b"abcdef");
        let mut reader = &wire[..7];
        let mut buf = BytesMut::new();
        let err = read_frame(&mut reader, 1024, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
