// ============================================================================
// Menu Core - Menu Document
// File: crates/menu-core/src/model.rs
// Description: Sections, items and the ordered menu tree
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

use crate::error::ValidationError;

/// One dish or drink. Prices are display strings, not numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[validate(length(min = 1, message = "Item name must not be empty"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Empty arrays are not stored by the remote, so a missing field reads as empty.
    #[serde(default)]
    pub prices: Vec<String>,

    /// Per-price captions, index-aligned with `prices`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_popular: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_spicy: Option<bool>,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, prices: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            prices: prices.iter().map(|p| p.to_string()).collect(),
            labels: None,
            is_popular: None,
            is_spicy: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = Some(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    pub fn popular(mut self) -> Self {
        self.is_popular = Some(true);
        self
    }

    pub fn spicy(mut self) -> Self {
        self.is_spicy = Some(true);
        self
    }

    pub fn is_popular(&self) -> bool {
        self.is_popular.unwrap_or(false)
    }

    pub fn is_spicy(&self) -> bool {
        self.is_spicy.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuSection {
    /// Anchor and lookup key. Never regenerated by edits.
    #[validate(length(min = 1, message = "Section id must not be empty"))]
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub emoji: String,

    #[serde(default)]
    pub image: String,

    #[serde(default)]
    pub items: Vec<MenuItem>,

    /// Section-wide fallback captions for prices.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitles: Option<Vec<String>>,
}

impl MenuSection {
    pub fn new(id: impl Into<String>, title: impl Into<String>, emoji: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            emoji: emoji.into(),
            image: String::new(),
            items: Vec::new(),
            subtitles: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    pub fn with_subtitles(mut self, subtitles: &[&str]) -> Self {
        self.subtitles = Some(subtitles.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_items(mut self, items: Vec<MenuItem>) -> Self {
        self.items = items;
        self
    }

    /// Caption shown next to `prices[price_index]` of an item: the item's own label,
    /// else the section subtitle at the same index.
    pub fn caption(&self, item_index: usize, price_index: usize) -> Option<&str> {
        let item = self.items.get(item_index)?;
        non_empty_at(&item.labels, price_index)
            .or_else(|| non_empty_at(&self.subtitles, price_index))
    }
}

fn non_empty_at(captions: &Option<Vec<String>>, index: usize) -> Option<&str> {
    captions
        .as_deref()
        .and_then(|c| c.get(index))
        .map(String::as_str)
        .filter(|c| !c.is_empty())
}

/// The whole menu: ordered sections sharing structure between versions.
///
/// Cloning a tree only bumps reference counts; an edit clones the one section it
/// touches and leaves every other section shared with the previous version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuTree {
    sections: Vec<Arc<MenuSection>>,
}

impl MenuTree {
    pub fn new(sections: Vec<MenuSection>) -> Self {
        Self {
            sections: sections.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn sections(&self) -> &[Arc<MenuSection>] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn position(&self, section_id: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.id == section_id)
    }

    pub fn section(&self, section_id: &str) -> Option<&MenuSection> {
        self.sections
            .iter()
            .find(|s| s.id == section_id)
            .map(|s| s.as_ref())
    }

    /// Copy-on-write access to one section.
    pub(crate) fn section_mut(&mut self, index: usize) -> &mut MenuSection {
        Arc::make_mut(&mut self.sections[index])
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(self.sections.len());
        for section in &self.sections {
            section.validate()?;
            if !seen.insert(section.id.as_str()) {
                return Err(ValidationError::DuplicateSectionId(section.id.clone()));
            }
            for (i, item) in section.items.iter().enumerate() {
                item.validate()?;
                if let Some(labels) = &item.labels {
                    if labels.len() != item.prices.len() {
                        return Err(ValidationError::LabelsMisaligned {
                            section: section.id.clone(),
                            item: i,
                            prices: item.prices.len(),
                            labels: labels.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Decodes and validates a JSON document. The same shape is used on the wire
    /// and in the local cache.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        let tree: MenuTree = serde_json::from_slice(bytes)?;
        tree.validate()?;
        Ok(tree)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MenuTree {
        MenuTree::new(vec![
            MenuSection::new("feteer", "فطير", "🥨")
                .with_subtitles(&["صغير", "كبير"])
                .with_items(vec![
                    MenuItem::new("فطير جبنة", &["40", "60"]),
                    MenuItem::new("فطير لحمة", &["70", "95"]).with_labels(&["وسط", "عائلي"]),
                ]),
            MenuSection::new("drinks", "مشروبات", "🥤")
                .with_items(vec![MenuItem::new("شاي", &["10"])]),
        ])
    }

    #[test]
    fn test_json_field_names() {
        let item = MenuItem::new("كفتة", &["90"]).popular();
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(json, r#"{"name":"كفتة","prices":["90"],"isPopular":true}"#);
    }

    #[test]
    fn test_missing_optional_fields_decode() {
        let json = r#"[{"id":"grills","title":"مشويات","emoji":"🔥","image":"","items":[{"name":"كفتة"}]}]"#;
        let tree = MenuTree::from_json_slice(json.as_bytes()).unwrap();
        let section = tree.section("grills").unwrap();
        assert!(section.items[0].prices.is_empty());
        assert!(!section.items[0].is_spicy());
        assert!(section.subtitles.is_none());
    }

    #[test]
    fn test_reencode_is_byte_identical() {
        let bytes = sample().to_json_vec().unwrap();
        let again = MenuTree::from_json_slice(&bytes).unwrap().to_json_vec().unwrap();
        assert_eq!(bytes, again);
    }

    #[test]
    fn test_caption_prefers_item_labels() {
        let tree = sample();
        let feteer = tree.section("feteer").unwrap();
        assert_eq!(feteer.caption(0, 1), Some("كبير"));
        assert_eq!(feteer.caption(1, 1), Some("عائلي"));
        assert_eq!(feteer.caption(0, 5), None);
        assert_eq!(tree.section("drinks").unwrap().caption(0, 0), None);

        // an empty label falls back to the section subtitle
        let section = MenuSection::new("feteer", "فطير", "🥨")
            .with_subtitles(&["صغير", ""])
            .with_items(vec![MenuItem::new("فطير عسل", &["50", "75"]).with_labels(&["", ""])]);
        assert_eq!(section.caption(0, 0), Some("صغير"));
        assert_eq!(section.caption(0, 1), None);
    }

    #[test]
    fn test_duplicate_section_id_rejected() {
        let tree = MenuTree::new(vec![
            MenuSection::new("drinks", "a", ""),
            MenuSection::new("drinks", "b", ""),
        ]);
        assert!(matches!(
            tree.validate(),
            Err(ValidationError::DuplicateSectionId(id)) if id == "drinks"
        ));
    }

    #[test]
    fn test_misaligned_labels_rejected() {
        let tree = MenuTree::new(vec![MenuSection::new("x", "x", "")
            .with_items(vec![MenuItem::new("a", &["1", "2"]).with_labels(&["only one"])])]);
        assert!(matches!(
            tree.validate(),
            Err(ValidationError::LabelsMisaligned { prices: 2, labels: 1, .. })
        ));
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert!(MenuTree::from_json_slice(br#"{"id":"x"}"#).is_err());
        assert!(MenuTree::from_json_slice(br#"[{"title":"no id"}]"#).is_err());
        assert!(MenuTree::from_json_slice(br#"[{"id":"","title":"t"}]"#).is_err());
    }
}
