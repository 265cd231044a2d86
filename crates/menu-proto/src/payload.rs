use crate::{Opcode, ProtoError, Status};
use bytes::{Buf, BufMut, Bytes, BytesMut};

#[derive(Debug)]
pub struct SetReq {
    pub key: String,
    pub value: Bytes,
}

/// Current value of a record, pushed to subscribers on subscribe and after every write.
/// `value == None` means the record was never written (or was deleted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub key: String,
    pub value: Option<Bytes>,
    pub ts_ms: u64,
}

/// Stored value as returned by GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordValue {
    pub value: Bytes,
    pub written_ms: u64,
}

pub fn encode_request(op: Opcode, payload: &[u8]) -> BytesMut {
    encode_frame(op as u8, payload)
}

pub fn encode_response(status: Status, payload: &[u8]) -> BytesMut {
    encode_frame(status as u8, payload)
}

fn encode_frame(code: u8, payload: &[u8]) -> BytesMut {
    // frame: [u32 len][u8 code][payload], len counts the code byte
    let len = 1 + payload.len();
    let mut out = BytesMut::with_capacity(4 + len);
    out.put_u32_le(len as u32);
    out.put_u8(code);
    out.extend_from_slice(payload);
    out
}

/// Splits a full frame (length prefix included) into its code byte and payload.
pub fn split_frame(frame: &[u8]) -> Result<(u8, &[u8]), ProtoError> {
    if frame.len() < 5 {
        return Err(ProtoError::InvalidFrame("frame shorter than header".into()));
    }
    Ok((frame[4], &frame[5..]))
}

fn get_string(p: &mut &[u8], len: usize) -> Result<String, ProtoError> {
    if p.remaining() < len {
        return Err(ProtoError::BadPayload);
    }
    let s = std::str::from_utf8(&p[..len])
        .map_err(|_| ProtoError::InvalidUtf8)?
        .to_string();
    p.advance(len);
    Ok(s)
}

pub fn decode_set_payload(mut p: &[u8]) -> Result<SetReq, ProtoError> {
    if p.remaining() < 2 {
        return Err(ProtoError::BadPayload);
    }
    let key_len = p.get_u16_le() as usize;
    let key = get_string(&mut p, key_len)?;

    if p.remaining() < 4 {
        return Err(ProtoError::BadPayload);
    }
    let val_len = p.get_u32_le() as usize;
    if val_len == 0 || p.remaining() < val_len {
        return Err(ProtoError::BadPayload);
    }
    let value = Bytes::copy_from_slice(&p[..val_len]);
    Ok(SetReq { key, value })
}

pub fn encode_set_payload(key: &str, value: &[u8]) -> BytesMut {
    let mut out = BytesMut::with_capacity(2 + key.len() + 4 + value.len());
    out.put_u16_le(key.len() as u16);
    out.extend_from_slice(key.as_bytes());
    out.put_u32_le(value.len() as u32);
    out.extend_from_slice(value);
    out
}

pub fn decode_key_only(mut p: &[u8]) -> Result<String, ProtoError> {
    if p.remaining() < 2 {
        return Err(ProtoError::BadPayload);
    }
    let klen = p.get_u16_le() as usize;
    get_string(&mut p, klen)
}

pub fn encode_key_only(key: &str) -> BytesMut {
    let mut out = BytesMut::with_capacity(2 + key.len());
    out.put_u16_le(key.len() as u16);
    out.extend_from_slice(key.as_bytes());
    out
}

pub fn encode_value_payload(v: &RecordValue) -> BytesMut {
    let mut out = BytesMut::with_capacity(4 + v.value.len() + 8);
    out.put_u32_le(v.value.len() as u32);
    out.extend_from_slice(&v.value);
    out.put_u64_le(v.written_ms);
    out
}

pub fn decode_value_payload(mut p: &[u8]) -> Result<RecordValue, ProtoError> {
    if p.remaining() < 4 {
        return Err(ProtoError::BadPayload);
    }
    let vlen = p.get_u32_le() as usize;
    if p.remaining() < vlen + 8 {
        return Err(ProtoError::BadPayload);
    }
    let value = Bytes::copy_from_slice(&p[..vlen]);
    p.advance(vlen);
    let written_ms = p.get_u64_le();
    Ok(RecordValue { value, written_ms })
}

pub fn encode_push_event_payload(ev: &PushEvent) -> BytesMut {
    let value: &[u8] = ev.value.as_deref().unwrap_or(&[]);
    let mut out = BytesMut::with_capacity(1 + 2 + ev.key.len() + 4 + value.len() + 8);
    out.put_u8(u8::from(ev.value.is_some()));
    out.put_u16_le(ev.key.len() as u16);
    out.extend_from_slice(ev.key.as_bytes());
    out.put_u32_le(value.len() as u32);
    out.extend_from_slice(value);
    out.put_u64_le(ev.ts_ms);
    out
}

pub fn decode_push_event_payload(mut p: &[u8]) -> Result<PushEvent, ProtoError> {
    if p.remaining() < 1 + 2 {
        return Err(ProtoError::BadPayload);
    }
    let present = match p.get_u8() {
        0 => false,
        1 => true,
        _ => return Err(ProtoError::BadPayload),
    };
    let klen = p.get_u16_le() as usize;
    let key = get_string(&mut p, klen)?;

    if p.remaining() < 4 {
        return Err(ProtoError::BadPayload);
    }
    let vlen = p.get_u32_le() as usize;
    if p.remaining() < vlen + 8 || (!present && vlen != 0) {
        return Err(ProtoError::BadPayload);
    }
    let value = present.then(|| Bytes::copy_from_slice(&p[..vlen]));
    p.advance(vlen);

    let ts_ms = p.get_u64_le();
    Ok(PushEvent { key, value, ts_ms })
}

pub fn encode_push_frame(ev: &PushEvent) -> BytesMut {
    encode_response(Status::Push, &encode_push_event_payload(ev))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_payload_rejects_empty_value() {
        let p = encode_set_payload("menu_v2", b"");
        assert!(matches!(decode_set_payload(&p), Err(ProtoError::BadPayload)));
    }

    #[test]
    fn test_set_payload_truncated() {
        let p = encode_set_payload("menu_v2", b"[1,2,3]");
        assert!(decode_set_payload(&p[..p.len() - 2]).is_err());
        let req = decode_set_payload(&p).unwrap();
        assert_eq!(req.key, "menu_v2");
        assert_eq!(&req.value[..], b"[1,2,3]");
    }

    #[test]
    fn test_push_event_absent_value() {
        let ev = PushEvent {
            key: "menu_v2".into(),
            value: None,
            ts_ms: 42,
        };
        let decoded = decode_push_event_payload(&encode_push_event_payload(&ev)).unwrap();
        assert_eq!(decoded, ev);
    }

    #[test]
    fn test_push_event_rejects_bad_presence_flag() {
        let ev = PushEvent {
            key: "k".into(),
            value: Some(Bytes::from_static(b"[]")),
            ts_ms: 1,
        };
        let mut p = encode_push_event_payload(&ev);
        p[0] = 7;
        assert!(decode_push_event_payload(&p).is_err());
    }

    #[test]
    fn test_push_frame_header() {
        let ev = PushEvent {
            key: "k".into(),
            value: Some(Bytes::from_static(b"[]")),
            ts_ms: 1,
        };
        let frame = encode_push_frame(&ev);
        let (code, payload) = split_frame(&frame).unwrap();
        assert_eq!(Status::from(code), Status::Push);
        assert_eq!(decode_push_event_payload(payload).unwrap(), ev);
        let len = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
    }
}
