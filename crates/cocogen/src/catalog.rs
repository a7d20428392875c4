// SPDX-License-Identifier: Apache-2.0

//! Identifier-indexed catalogs built once from raw record sequences.
//!
//! A [`Catalog`] is a small insertion-ordered map: the example generator
//! iterates images in the order they appeared in the annotation file, while
//! joins need O(1) lookup by key. Duplicate keys follow an explicit
//! last-write-wins policy — the later record replaces the earlier one's
//! value but keeps its position in the iteration order.

use crate::models::{Category, CategoryId, Image, ImageId, License, LicenseId};
use crate::Error;
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Insertion-ordered identifier map.
#[derive(Debug, Clone)]
pub struct Catalog<K, V> {
    order: Vec<K>,
    records: HashMap<K, V>,
}

impl<K, V> Default for Catalog<K, V> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash, V> Catalog<K, V> {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            records: HashMap::new(),
        }
    }

    /// Insert a record, returning the previously stored value for the key
    /// if any. A replaced key keeps its original iteration position.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.records.insert(key, value);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in insertion order.
    pub fn ids(&self) -> &[K] {
        &self.order
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.order.iter().map(|key| (*key, &self.records[key]))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

/// A record type loadable into a [`Catalog`].
pub trait CatalogRecord: DeserializeOwned {
    type Id: Copy + Eq + Hash + Display;

    /// Section name in the annotation file, used in error reports.
    const SECTION: &'static str;

    fn id(&self) -> Self::Id;
}

impl CatalogRecord for Image {
    type Id = ImageId;
    const SECTION: &'static str = "images";

    fn id(&self) -> ImageId {
        self.image_id
    }
}

impl CatalogRecord for License {
    type Id = LicenseId;
    const SECTION: &'static str = "licenses";

    fn id(&self) -> LicenseId {
        self.license_id
    }
}

impl CatalogRecord for Category {
    type Id = CategoryId;
    const SECTION: &'static str = "categories";

    fn id(&self) -> CategoryId {
        self.category_id
    }
}

/// Image catalog keyed by `image_id`.
pub type ImageCatalog = Catalog<ImageId, Image>;
/// License catalog keyed by `license_id`.
pub type LicenseCatalog = Catalog<LicenseId, License>;
/// Category catalog keyed by `category_id`.
pub type CategoryCatalog = Catalog<CategoryId, Category>;

/// Build an identifier-indexed catalog from a raw record sequence.
///
/// Each record is validated and typed individually so that a malformed
/// record fails with its index in the input sequence. Duplicate keys are
/// not an error: the later record wins and a warning is logged.
pub fn load_catalog<R: CatalogRecord>(records: &[Value]) -> Result<Catalog<R::Id, R>, Error> {
    let mut catalog = Catalog::new();
    for (index, raw) in records.iter().enumerate() {
        let record: R = serde_json::from_value(raw.clone())
            .map_err(|e| Error::InvalidRecord(R::SECTION, index, e.to_string()))?;
        let id = record.id();
        if catalog.insert(id, record).is_some() {
            warn!(
                "duplicate id {} in {} at index {}, keeping the later record",
                id,
                R::SECTION,
                index
            );
        }
    }
    Ok(catalog)
}
