//! # Sections
//!
//! A section is one configurable content block on the homepage. The builder
//! edits an ordered collection of them; `display_order` always mirrors the
//! position in that collection.

use crate::layout::{explicit_null, LayoutPatch, SectionLayout};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub type SectionId = String;

/// Homepage content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,

    /// Kind of block (e.g. `featured_labs`)
    pub section_key: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    pub display_order: u32,

    #[serde(default = "default_visible")]
    pub is_visible: bool,

    /// Editing-time guard only
    #[serde(default)]
    pub is_locked: bool,

    #[serde(default)]
    pub layout: SectionLayout,
}

fn default_visible() -> bool {
    true
}

impl Section {
    /// Create a visible, unlocked section with the default layout
    pub fn new(id: impl Into<SectionId>, section_key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            section_key: section_key.into(),
            title: title.into(),
            subtitle: None,
            display_order: 0,
            is_visible: true,
            is_locked: false,
            layout: SectionLayout::default(),
        }
    }
}

/// Partial update merged into a section by `Mutation::Update`.
///
/// `id` and `display_order` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// `Some(None)` (an explicit `null`) clears the subtitle
    #[serde(
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtitle: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_locked: Option<bool>,

    /// Merged field by field into the current layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutPatch>,
}

impl SectionPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Merge set fields into `section`
    pub fn merge_into(&self, section: &mut Section) {
        if let Some(key) = &self.section_key {
            section.section_key = key.clone();
        }
        if let Some(title) = &self.title {
            section.title = title.clone();
        }
        if let Some(subtitle) = &self.subtitle {
            section.subtitle = subtitle.clone();
        }
        if let Some(visible) = self.is_visible {
            section.is_visible = visible;
        }
        if let Some(locked) = self.is_locked {
            section.is_locked = locked;
        }
        if let Some(layout) = &self.layout {
            layout.apply_to(&mut section.layout);
        }
    }
}

/// Rewrite `display_order` so it matches each section's position
pub fn renumber(sections: &mut [Section]) {
    for (index, section) in sections.iter_mut().enumerate() {
        section.display_order = index as u32;
    }
}

/// Position of the section with `id`
pub fn position_of(sections: &[Section], id: &str) -> Option<usize> {
    sections.iter().position(|s| s.id == id)
}

/// First id that appears more than once
pub fn find_duplicate_id(sections: &[Section]) -> Option<&str> {
    let mut seen = HashSet::with_capacity(sections.len());
    sections
        .iter()
        .find(|s| !seen.insert(s.id.as_str()))
        .map(|s| s.id.as_str())
}

/// True when display orders are exactly `0..N-1` in collection order
pub fn is_contiguous(sections: &[Section]) -> bool {
    sections
        .iter()
        .enumerate()
        .all(|(index, s)| s.display_order as usize == index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_record_defaults() {
        let json = r#"{
            "id": "s-1",
            "section_key": "featured_labs",
            "title": "Featured Labs",
            "display_order": 3
        }"#;

        let section: Section = serde_json::from_str(json).unwrap();
        assert!(section.is_visible);
        assert!(!section.is_locked);
        assert_eq!(section.subtitle, None);
        assert_eq!(section.layout, SectionLayout::default());
    }

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut section = Section::new("s-1", "doctors", "Doctors");
        section.subtitle = Some("Near you".to_string());

        let patch = SectionPatch {
            title: Some("Top Doctors".to_string()),
            is_visible: Some(false),
            ..SectionPatch::default()
        };
        patch.merge_into(&mut section);

        assert_eq!(section.title, "Top Doctors");
        assert!(!section.is_visible);
        assert_eq!(section.subtitle.as_deref(), Some("Near you"));
        assert_eq!(section.section_key, "doctors");
    }

    #[test]
    fn test_patch_can_clear_subtitle() {
        let mut section = Section::new("s-1", "doctors", "Doctors");
        section.subtitle = Some("Near you".to_string());

        let untouched: SectionPatch = serde_json::from_str(r#"{"title": "Doctors"}"#).unwrap();
        assert_eq!(untouched.subtitle, None);

        let patch: SectionPatch = serde_json::from_str(r#"{"subtitle": null}"#).unwrap();
        assert_eq!(patch.subtitle, Some(None));

        patch.merge_into(&mut section);
        assert_eq!(section.subtitle, None);
    }

    #[test]
    fn test_renumber_and_contiguity() {
        let mut sections = vec![
            Section::new("a", "k", "A"),
            Section::new("b", "k", "B"),
            Section::new("c", "k", "C"),
        ];
        assert!(!is_contiguous(&sections));

        renumber(&mut sections);
        assert!(is_contiguous(&sections));
        assert_eq!(sections[2].display_order, 2);
    }

    #[test]
    fn test_find_duplicate_id() {
        let sections = vec![
            Section::new("a", "k", "A"),
            Section::new("b", "k", "B"),
            Section::new("a", "k", "A again"),
        ];
        assert_eq!(find_duplicate_id(&sections), Some("a"));
        assert_eq!(find_duplicate_id(&sections[..2]), None);
    }
}
