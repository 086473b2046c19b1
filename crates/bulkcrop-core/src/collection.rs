//! The ordered set of loaded images.
//!
//! Images keep their ingestion order; navigation and export both follow it.
//! An entity's crop descriptor and preview are only replaced together, by
//! [`ImageCollection::save_crop`].

use std::cell::OnceCell;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::descriptor::CropDescriptor;

/// MIME types the file picker offers. Not enforced.
pub const ACCEPTED_MIME_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

/// Opaque, stable identifier of an ingested image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImageId(u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

impl std::str::FromStr for ImageId {
    type Err = CollectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("img-")
            .and_then(|n| n.parse().ok())
            .map(ImageId)
            .ok_or_else(|| CollectionError::InvalidId(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectionError {
    #[error("No image with id {0}")]
    NotFound(ImageId),

    #[error("Malformed image id '{0}'")]
    InvalidId(String),
}

/// A file handed over by the ingestion boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// A crop saved from an editing session: the descriptor and its thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCrop {
    pub descriptor: CropDescriptor,
    pub preview: Option<DecodedImage>,
}

/// What the image grid should draw for an entity.
#[derive(Debug, Clone, Copy)]
pub enum Thumbnail<'a> {
    /// The preview of the saved crop.
    Preview(&'a DecodedImage),
    /// No crop saved yet; show the original.
    Original,
}

/// One loaded image.
#[derive(Debug)]
pub struct ImageEntity {
    id: ImageId,
    file_name: String,
    mime_type: String,
    source: Vec<u8>,
    display: OnceCell<DecodedImage>,
    crop: Option<CropDescriptor>,
    preview: Option<DecodedImage>,
}

impl ImageEntity {
    fn new(id: ImageId, file: SourceFile) -> Self {
        Self {
            id,
            file_name: file.name,
            mime_type: file.mime_type,
            source: file.bytes,
            display: OnceCell::new(),
            crop: None,
            preview: None,
        }
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The original file bytes, exactly as ingested.
    pub fn source_bytes(&self) -> &[u8] {
        &self.source
    }

    /// Saved crop, `None` if the image should be exported unmodified.
    pub fn crop(&self) -> Option<&CropDescriptor> {
        self.crop.as_ref()
    }

    pub fn preview(&self) -> Option<&DecodedImage> {
        self.preview.as_ref()
    }

    /// Whether the MIME type is one the picker advertises.
    pub fn has_accepted_type(&self) -> bool {
        ACCEPTED_MIME_TYPES.contains(&self.mime_type.as_str())
    }

    /// Decoded pixels for display in the editor, decoded on first use.
    pub fn display_image(&self) -> Result<&DecodedImage, DecodeError> {
        if let Some(image) = self.display.get() {
            return Ok(image);
        }
        let decoded = decode_image(&self.source)?;
        Ok(self.display.get_or_init(|| decoded))
    }

    pub fn is_display_loaded(&self) -> bool {
        self.display.get().is_some()
    }

    pub fn thumbnail(&self) -> Thumbnail<'_> {
        match &self.preview {
            Some(preview) => Thumbnail::Preview(preview),
            None => Thumbnail::Original,
        }
    }
}

/// Images in ingestion order, keyed by [`ImageId`].
#[derive(Debug, Default)]
pub struct ImageCollection {
    entries: Vec<ImageEntity>,
    next_id: u64,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one file and return its new id.
    pub fn add(&mut self, file: SourceFile) -> ImageId {
        let id = ImageId(self.next_id);
        self.next_id += 1;
        self.entries.push(ImageEntity::new(id, file));
        id
    }

    /// Remove an image, releasing its source and display data.
    pub fn remove(&mut self, id: ImageId) -> Result<ImageEntity, CollectionError> {
        let index = self.index_of(id).ok_or(CollectionError::NotFound(id))?;
        Ok(self.entries.remove(index))
    }

    /// Remove every image. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageEntity> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ImageId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// The image after `id` in ingestion order.
    pub fn next_after(&self, id: ImageId) -> Option<ImageId> {
        let index = self.index_of(id)?;
        self.entries.get(index + 1).map(|e| e.id)
    }

    /// The image before `id` in ingestion order.
    pub fn previous_before(&self, id: ImageId) -> Option<ImageId> {
        let index = self.index_of(id)?;
        index.checked_sub(1).map(|i| self.entries[i].id)
    }

    /// Replace an image's crop descriptor and preview together.
    pub fn save_crop(&mut self, id: ImageId, saved: SavedCrop) -> Result<(), CollectionError> {
        let entity = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(CollectionError::NotFound(id))?;
        entity.crop = Some(saved.descriptor);
        entity.preview = saved.preview;
        Ok(())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ImageEntity> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<ImageId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a ImageEntity;
    type IntoIter = std::slice::Iter<'a, ImageEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> SourceFile {
        SourceFile::new(name, "image/png", vec![1, 2, 3])
    }

    fn collection(names: &[&str]) -> (ImageCollection, Vec<ImageId>) {
        let mut images = ImageCollection::new();
        let ids = names.iter().map(|n| images.add(file(n))).collect();
        (images, ids)
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let (images, ids) = collection(&["a.png", "b.png", "c.png"]);
        assert_eq!(images.ids(), ids);
        assert_eq!(images.len(), 3);

        let names: Vec<_> = images.iter().map(|e| e.file_name()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let (mut images, ids) = collection(&["a.png"]);
        images.remove(ids[0]).unwrap();
        let new_id = images.add(file("b.png"));
        assert_ne!(new_id, ids[0]);
    }

    #[test]
    fn test_remove_unknown() {
        let (mut images, ids) = collection(&["a.png"]);
        images.remove(ids[0]).unwrap();
        assert_eq!(
            images.remove(ids[0]).unwrap_err(),
            CollectionError::NotFound(ids[0])
        );
    }

    #[test]
    fn test_navigation_order() {
        let (images, ids) = collection(&["a.png", "b.png", "c.png"]);

        assert_eq!(images.next_after(ids[0]), Some(ids[1]));
        assert_eq!(images.next_after(ids[2]), None);
        assert_eq!(images.previous_before(ids[2]), Some(ids[1]));
        assert_eq!(images.previous_before(ids[0]), None);
    }

    #[test]
    fn test_save_crop_replaces_descriptor_and_preview() {
        let (mut images, ids) = collection(&["a.png"]);
        let saved = SavedCrop {
            descriptor: CropDescriptor::new(1, 2, 3, 4),
            preview: Some(DecodedImage::blank(3, 4)),
        };
        images.save_crop(ids[0], saved).unwrap();

        let entity = images.get(ids[0]).unwrap();
        assert_eq!(entity.crop(), Some(&CropDescriptor::new(1, 2, 3, 4)));
        assert!(matches!(entity.thumbnail(), Thumbnail::Preview(_)));

        images
            .save_crop(
                ids[0],
                SavedCrop {
                    descriptor: CropDescriptor::new(0, 0, 1, 1),
                    preview: None,
                },
            )
            .unwrap();
        let entity = images.get(ids[0]).unwrap();
        assert!(entity.preview().is_none());
        assert!(matches!(entity.thumbnail(), Thumbnail::Original));
    }

    #[test]
    fn test_clear() {
        let (mut images, _) = collection(&["a.png", "b.png"]);
        assert_eq!(images.clear(), 2);
        assert!(images.is_empty());
    }

    #[test]
    fn test_display_image_decodes_lazily() {
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::RgbImage::new(4, 3)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();

        let mut images = ImageCollection::new();
        let id = images.add(SourceFile::new("x.png", "image/png", bytes.into_inner()));
        let entity = images.get(id).unwrap();

        assert!(!entity.is_display_loaded());
        assert_eq!(entity.display_image().unwrap().width, 4);
        assert!(entity.is_display_loaded());
    }

    #[test]
    fn test_display_image_decode_failure() {
        let (images, ids) = collection(&["broken.png"]);
        let entity = images.get(ids[0]).unwrap();
        assert!(entity.display_image().is_err());
        assert!(!entity.is_display_loaded());
    }

    #[test]
    fn test_accepted_type_is_advisory() {
        let mut images = ImageCollection::new();
        let id = images.add(SourceFile::new("notes.gif", "image/gif", vec![]));
        assert!(!images.get(id).unwrap().has_accepted_type());
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_image_id_roundtrip_text() {
        let (_, ids) = collection(&["a.png", "b.png"]);
        let text = ids[1].to_string();
        assert_eq!(text, "img-1");
        assert_eq!(text.parse::<ImageId>(), Ok(ids[1]));
        assert!("nope".parse::<ImageId>().is_err());
    }
}
