use crate::ProtoError;
use bytes::{Buf, BufMut, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsV1 {
    pub uptime_ms: u64,
    pub records_count: u64,
    pub pubsub_topics: u64,
    pub writes_total: u64,
    pub events_published_total: u64,
    pub events_lagged_total: u64,
    pub invalid_key_total: u64,
}

const STATS_FIELDS: usize = 7;

pub fn encode_stats_v1(s: &StatsV1) -> BytesMut {
    let mut out = BytesMut::with_capacity(1 + STATS_FIELDS * 8);
    out.put_u8(1); // stats_version
    out.put_u64_le(s.uptime_ms);
    out.put_u64_le(s.records_count);
    out.put_u64_le(s.pubsub_topics);
    out.put_u64_le(s.writes_total);
    out.put_u64_le(s.events_published_total);
    out.put_u64_le(s.events_lagged_total);
    out.put_u64_le(s.invalid_key_total);
    out
}

pub fn decode_stats_v1(mut p: &[u8]) -> Result<StatsV1, ProtoError> {
    if p.remaining() < 1 {
        return Err(ProtoError::BadPayload);
    }
    if p.get_u8() != 1 {
        return Err(ProtoError::BadPayload);
    }
    if p.remaining() < STATS_FIELDS * 8 {
        return Err(ProtoError::BadPayload);
    }

    Ok(StatsV1 {
        uptime_ms: p.get_u64_le(),
        records_count: p.get_u64_le(),
        pubsub_topics: p.get_u64_le(),
        writes_total: p.get_u64_le(),
        events_published_total: p.get_u64_le(),
        events_lagged_total: p.get_u64_le(),
        invalid_key_total: p.get_u64_le(),
    })
}
