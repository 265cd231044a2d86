use crate::ProtoError;
use std::fmt;

const VERSION_MARKER: &str = "_v";

/// Highest schema version a key may carry. Loading purges every older key, one by one.
pub const MAX_KEY_VERSION: u32 = 10_000;

/// Checks the record key charset: non-empty, `[A-Za-z0-9_.-]`, fits a u16 length prefix.
pub fn validate_key(key: &str) -> Result<&str, ProtoError> {
    if key.is_empty() || key.len() > u16::MAX as usize {
        return Err(ProtoError::InvalidKeyFormat);
    }
    let ok = key
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'-');
    if !ok {
        return Err(ProtoError::InvalidKeyFormat);
    }
    Ok(key)
}

/// A record key with its schema version embedded in the name.
///
/// `menu_v11` has base `menu` and version 11. A key without a `_v<N>` suffix is
/// version 1. Bumping the version orphans the data stored under older keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    full: String,
    base_len: usize,
    version: u32,
}

impl RecordKey {
    pub fn parse(key: &str) -> Result<Self, ProtoError> {
        validate_key(key)?;

        if let Some(pos) = key.rfind(VERSION_MARKER) {
            let digits = &key[pos + VERSION_MARKER.len()..];
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                let version: u32 = digits.parse().map_err(|_| ProtoError::InvalidKeyFormat)?;
                if pos == 0 || !(2..=MAX_KEY_VERSION).contains(&version) {
                    return Err(ProtoError::InvalidKeyFormat);
                }
                return Ok(Self {
                    full: key.to_string(),
                    base_len: pos,
                    version,
                });
            }
        }

        Ok(Self {
            full: key.to_string(),
            base_len: key.len(),
            version: 1,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    pub fn base(&self) -> &str {
        &self.full[..self.base_len]
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Every key an older schema version of this record could have used,
    /// oldest first: the bare base, then `_v2` up to the previous version.
    pub fn prior_keys(&self) -> impl Iterator<Item = String> + '_ {
        let base = self.base();
        let bare = (self.version >= 2).then(|| base.to_string());
        bare.into_iter()
            .chain((2..self.version).map(move |v| format!("{base}{VERSION_MARKER}{v}")))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_versioned_key() {
        let key = RecordKey::parse("atyab_menu_data_v11").unwrap();
        assert_eq!(key.base(), "atyab_menu_data");
        assert_eq!(key.version(), 11);
        assert_eq!(key.as_str(), "atyab_menu_data_v11");
    }

    #[test]
    fn test_prior_keys_cover_all_older_versions() {
        let key = RecordKey::parse("atyab_menu_data_v11").unwrap();
        let prior: Vec<String> = key.prior_keys().collect();
        assert_eq!(prior.len(), 10);
        assert_eq!(prior[0], "atyab_menu_data");
        assert_eq!(prior[1], "atyab_menu_data_v2");
        assert_eq!(prior[9], "atyab_menu_data_v10");
        assert!(!prior.contains(&"atyab_menu_data_v11".to_string()));
    }

    #[test]
    fn test_unversioned_key_is_v1() {
        let key = RecordKey::parse("menu").unwrap();
        assert_eq!(key.version(), 1);
        assert_eq!(key.prior_keys().count(), 0);
    }

    #[test]
    fn test_invalid_keys() {
        assert!(RecordKey::parse("").is_err());
        assert!(RecordKey::parse("_v3").is_err());
        assert!(RecordKey::parse("menu_v1").is_err());
        assert!(RecordKey::parse("menu data").is_err());
        assert!(RecordKey::parse("menu/v2").is_err());
    }

    #[test]
    fn test_version_is_capped() {
        let key = RecordKey::parse("menu_v10000").unwrap();
        assert_eq!(key.prior_keys().count(), 9_999);
        assert!(RecordKey::parse("menu_v10001").is_err());
        assert!(RecordKey::parse("menu_v4000000000").is_err());
        assert!(RecordKey::parse("menu_v99999999999").is_err());
    }

    #[test]
    fn test_non_numeric_suffix_is_part_of_base() {
        let key = RecordKey::parse("menu_vintage").unwrap();
        assert_eq!(key.version(), 1);
        assert_eq!(key.base(), "menu_vintage");
    }
}
