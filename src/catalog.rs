//! Config-backed media catalog.
//!
//! Maps the client-facing media ids from `[[media]]` entries onto objects in
//! the backing store.

use std::collections::HashMap;

use async_trait::async_trait;
use mplay_common::paths::{file_name_of, guess_mime};
use mplay_common::{Error, MediaId, MediaReference, ObjectRef, Result, Variant};
use mplay_stream::MediaResolver;

use crate::config::{MediaEntry, ObjectEntry};

#[derive(Debug, Clone)]
struct CatalogItem {
    default: MediaReference,
    audio: Option<MediaReference>,
    video: Option<MediaReference>,
}

/// In-memory catalog resolving media ids and variants.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: HashMap<MediaId, CatalogItem>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from config entries. Later duplicates replace earlier ones.
    pub fn from_entries(entries: &[MediaEntry]) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    pub fn insert(&mut self, entry: &MediaEntry) {
        let item = CatalogItem {
            default: reference(&entry.object),
            audio: entry.audio.as_ref().map(reference),
            video: entry.video.as_ref().map(reference),
        };
        self.items.insert(MediaId::new(entry.id.clone()), item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn lookup(&self, id: &MediaId, variant: Variant) -> Result<MediaReference> {
        let item = self
            .items
            .get(id)
            .ok_or_else(|| Error::not_found("media", id))?;

        let reference = match variant {
            Variant::Default => Some(&item.default),
            Variant::Audio => item.audio.as_ref(),
            Variant::Video => item.video.as_ref(),
        };

        reference
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{variant} variant of media"), id))
    }
}

#[async_trait]
impl MediaResolver for Catalog {
    async fn resolve(&self, id: &MediaId, variant: Variant) -> Result<MediaReference> {
        self.lookup(id, variant)
    }
}

fn reference(entry: &ObjectEntry) -> MediaReference {
    let file_name = entry
        .file_name
        .clone()
        .unwrap_or_else(|| file_name_of(&entry.object).to_string());
    let mime = entry
        .mime
        .clone()
        .unwrap_or_else(|| guess_mime(&file_name).to_string());

    MediaReference {
        object: ObjectRef::new(&entry.object),
        size: entry.size,
        mime,
        file_name,
    }
}
