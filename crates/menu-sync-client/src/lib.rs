//! Client for the menu record service, and the [`SocketChannel`] that plugs it into
//! a menu session.

mod channel;

pub use channel::SocketChannel;

use menu_proto::{
    decode_push_event_payload, decode_stats_v1, decode_value_payload, encode_key_only,
    encode_request, encode_set_payload,
    types::{Opcode, Status},
    ProtoError, PushEvent, RecordValue, StatsV1,
};
use std::io;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Responses larger than this are treated as a broken stream.
pub const MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

pub struct Client {
    stream: UnixStream,
}

impl Client {
    /// Connect to the server at the given socket path
    pub async fn connect<P: AsRef<Path>>(path: P) -> Result<Self, ProtoError> {
        let stream = UnixStream::connect(path).await?;
        Ok(Self { stream })
    }

    /// Overwrite a record
    pub async fn set(&mut self, key: &str, value: &[u8]) -> Result<(), ProtoError> {
        self.send_frame(Opcode::Set, &encode_set_payload(key, value))
            .await?;
        self.expect_ok().await
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<RecordValue>, ProtoError> {
        self.send_frame(Opcode::Get, &encode_key_only(key)).await?;

        let (status, body) = self.read_response().await?;
        match status {
            Status::Ok => Ok(Some(decode_value_payload(&body)?)),
            Status::NotFound => Ok(None),
            other => Err(status_error(other)),
        }
    }

    /// Returns false when the record did not exist.
    pub async fn del(&mut self, key: &str) -> Result<bool, ProtoError> {
        self.send_frame(Opcode::Del, &encode_key_only(key)).await?;

        let (status, _) = self.read_response().await?;
        match status {
            Status::Ok => Ok(true),
            Status::NotFound => Ok(false),
            other => Err(status_error(other)),
        }
    }

    pub async fn ping(&mut self) -> Result<(), ProtoError> {
        self.send_frame(Opcode::Ping, &[]).await?;
        self.expect_ok().await
    }

    /// Get server statistics
    pub async fn stats(&mut self) -> Result<StatsV1, ProtoError> {
        self.send_frame(Opcode::Stats, &[]).await?;

        let (status, body) = self.read_response().await?;
        if status != Status::Ok {
            return Err(status_error(status));
        }
        decode_stats_v1(&body)
    }

    /// Switches this connection to push mode. The first event is the record's
    /// current value.
    pub async fn subscribe(mut self, key: &str) -> Result<PushStream, ProtoError> {
        self.send_frame(Opcode::Subscribe, &encode_key_only(key))
            .await?;
        self.expect_ok().await?;
        Ok(PushStream {
            stream: self.stream,
        })
    }

    // --- Helpers ---

    async fn send_frame(&mut self, opcode: Opcode, payload: &[u8]) -> Result<(), ProtoError> {
        let frame = encode_request(opcode, payload);
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    async fn read_response(&mut self) -> Result<(Status, Vec<u8>), ProtoError> {
        match read_frame(&mut self.stream).await? {
            Some((code, payload)) => Ok((Status::from(code), payload)),
            None => Err(ProtoError::Io(io::ErrorKind::UnexpectedEof.into())),
        }
    }

    async fn expect_ok(&mut self) -> Result<(), ProtoError> {
        let (status, _) = self.read_response().await?;
        match status {
            Status::Ok => Ok(()),
            Status::NotFound => Err(ProtoError::NotFound),
            Status::ErrInvalidKeyFormat => Err(ProtoError::InvalidKeyFormat),
            other => Err(status_error(other)),
        }
    }
}

/// A connection in push mode.
pub struct PushStream {
    stream: UnixStream,
}

impl PushStream {
    /// Next pushed value. `Ok(None)` when the server closed the connection.
    pub async fn next_event(&mut self) -> Result<Option<PushEvent>, ProtoError> {
        loop {
            let Some((code, payload)) = read_frame(&mut self.stream).await? else {
                return Ok(None);
            };
            match Status::from(code) {
                Status::Push => return decode_push_event_payload(&payload).map(Some),
                // ack of a PING sent in push mode
                Status::Ok => continue,
                other => return Err(status_error(other)),
            }
        }
    }

    /// Asks the server to leave push mode, then drops the connection.
    pub async fn unsubscribe(mut self) -> Result<(), ProtoError> {
        let frame = encode_request(Opcode::Unsubscribe, &[]);
        self.stream.write_all(&frame).await?;
        // pushes already in flight may arrive before the ack
        while let Some((code, _)) = read_frame(&mut self.stream).await? {
            if Status::from(code) == Status::Ok {
                break;
            }
        }
        Ok(())
    }
}

fn status_error(status: Status) -> ProtoError {
    ProtoError::ServerError(format!("{:?}", status))
}

/// Reads one `[u32 len][code][payload]` frame. `None` on a clean EOF between frames.
async fn read_frame(stream: &mut UnixStream) -> Result<Option<(u8, Vec<u8>)>, ProtoError> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_buf) as usize;

    if len == 0 {
        return Err(ProtoError::InvalidFrame("Empty response".into()));
    }
    if len > MAX_RESPONSE_BYTES {
        return Err(ProtoError::InvalidFrame(format!("Response too large: {len} bytes")));
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body).await?;
    let payload = body.split_off(1);
    Ok(Some((body[0], payload)))
}
