use bytes::Bytes;
use dashmap::DashMap;

#[derive(Clone, Debug)]
pub struct Record {
    pub value: Bytes,
    pub written_ms: u64,
}

/// One value per key. Writes replace the whole value; there is no merge.
#[derive(Default)]
pub struct RecordStore {
    map: DashMap<String, Record>,
}

impl RecordStore {
    pub fn set(&self, key: String, value: Bytes, now_ms: u64) {
        self.map.insert(
            key,
            Record {
                value,
                written_ms: now_ms,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<Record> {
        self.map.get(key).map(|r| r.value().clone())
    }

    pub fn del(&self, key: &str) -> bool {
        self.map.remove(key).is_some()
    }

    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
