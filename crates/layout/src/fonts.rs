//! Font registry backing the default shaping engine.
//!
//! Fonts can always be registered from raw bytes; with the `system-fonts`
//! feature the library additionally discovers installed fonts through
//! fontdb. Registration hands out [`FontId`] handles; handing the engine an
//! id that was never issued here is a configuration error surfaced as
//! [`crate::LayoutError::UnknownFont`].

use crate::LayoutError;
#[cfg(feature = "system-fonts")]
use quire_style::{FontStyle, FontWeight};
use quire_types::FontId;
#[cfg(feature = "system-fonts")]
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A loaded font binary plus the face index within it.
pub struct FontInstance {
    pub data: Arc<Vec<u8>>,
    pub index: u32,
}

impl std::fmt::Debug for FontInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontInstance")
            .field("data_len", &self.data.len())
            .field("index", &self.index)
            .finish()
    }
}

impl FontInstance {
    /// Creates a lightweight shaping view over the font data. Cheap (header
    /// parse only), so faces are re-created per shaping call instead of
    /// being stored self-referentially.
    pub fn as_face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, self.index)
    }

    /// Metrics/coverage view over the same data.
    pub fn as_metrics_face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, self.index).ok()
    }
}

#[cfg(feature = "system-fonts")]
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct QueryKey {
    family: String,
    weight: u16,
    style: u8,
}

#[cfg(feature = "system-fonts")]
fn style_to_u8(s: FontStyle) -> u8 {
    match s {
        FontStyle::Normal => 0,
        FontStyle::Italic => 1,
        FontStyle::Oblique => 2,
    }
}

/// Thread-safe font registry.
#[derive(Default)]
pub struct FontLibrary {
    faces: RwLock<Vec<Arc<FontInstance>>>,
    #[cfg(feature = "system-fonts")]
    db: RwLock<fontdb::Database>,
    #[cfg(feature = "system-fonts")]
    query_cache: RwLock<HashMap<QueryKey, FontId>>,
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a font binary and returns its handle. The data must parse
    /// as a face; garbage bytes are rejected up front rather than failing
    /// deep inside shaping.
    pub fn register(&self, data: Vec<u8>, index: u32) -> Result<FontId, LayoutError> {
        let instance = FontInstance {
            data: Arc::new(data),
            index,
        };
        if instance.as_metrics_face().is_none() {
            return Err(LayoutError::Shaping(
                "font data did not parse as a face".into(),
            ));
        }
        let mut faces = self
            .faces
            .write()
            .map_err(|_| LayoutError::Shaping("font registry poisoned".into()))?;
        faces.push(Arc::new(instance));
        Ok(FontId(faces.len() as u32 - 1))
    }

    pub fn get(&self, id: FontId) -> Option<Arc<FontInstance>> {
        self.faces.read().ok()?.get(id.0 as usize).cloned()
    }

    /// Loads all system fonts into the discovery database.
    #[cfg(feature = "system-fonts")]
    pub fn load_system_fonts(&self) {
        if let Ok(mut db) = self.db.write() {
            db.load_system_fonts();
        }
    }

    /// Resolves a family/weight/style query against the discovery database,
    /// registering the matched face on first use.
    #[cfg(feature = "system-fonts")]
    pub fn query(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontId> {
        let key = QueryKey {
            family: family.to_lowercase(),
            weight: weight.numeric_value(),
            style: style_to_u8(style),
        };
        if let Ok(cache) = self.query_cache.read()
            && let Some(&id) = cache.get(&key)
        {
            return Some(id);
        }

        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight: fontdb::Weight(weight.numeric_value()),
            stretch: fontdb::Stretch::Normal,
            style: match style {
                FontStyle::Normal => fontdb::Style::Normal,
                FontStyle::Italic => fontdb::Style::Italic,
                FontStyle::Oblique => fontdb::Style::Oblique,
            },
        };
        let db = self.db.read().ok()?;
        let face_id = db.query(&query)?;
        let loaded = db.with_face_data(face_id, |data, index| (data.to_vec(), index))?;
        drop(db);

        let id = self.register(loaded.0, loaded.1).ok()?;
        if let Ok(mut cache) = self.query_cache.write() {
            cache.insert(key, id);
        }
        Some(id)
    }

    /// Drops all cached query results. Registered faces keep their ids.
    #[cfg(feature = "system-fonts")]
    pub fn clear_query_cache(&self) {
        if let Ok(mut cache) = self.query_cache.write() {
            cache.clear();
        }
    }
}
