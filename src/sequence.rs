//! Image sequences: the ordered page lists the user builds before export
//!
//! A [`Workspace`] holds between one and [`MAX_SEQUENCES`] sequences. Each
//! sequence owns its images for the session; nothing here is persisted.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::format::{is_image_file, natural_cmp, sort_naturally};
use crate::imaging::{self, ProbedImage, Thumbnail};

/// Maximum number of sequences that can exist at the same time
pub const MAX_SEQUENCES: usize = 5;

/// Display names longer than this are shortened
const DISPLAY_NAME_MAX: usize = 15;

/// Identifier of a sequence, always within `1..=MAX_SEQUENCES`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(u8);

impl SequenceId {
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Session-unique identifier of an image entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One image in a sequence
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub id: ImageId,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub thumbnail: Option<Thumbnail>,
}

impl ImageEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name shortened to "first8...last4" when it is too long for a card
    pub fn display_name(&self) -> String {
        let name = self.file_name();
        let chars: Vec<char> = name.chars().collect();
        if chars.len() <= DISPLAY_NAME_MAX {
            return name;
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }

    /// More than twice as tall as wide (webtoon strip)
    pub fn is_long_strip(&self) -> bool {
        self.height > self.width.saturating_mul(2)
    }
}

/// Images rejected while adding a batch
#[derive(Debug, Default)]
pub struct AddReport {
    pub added: usize,
    pub rejected: Vec<(PathBuf, String)>,
}

/// An ordered list of images that becomes one PDF
#[derive(Debug, Clone)]
pub struct Sequence {
    id: SequenceId,
    name: String,
    images: Vec<ImageEntry>,
    trailer: Option<PathBuf>,
}

impl Sequence {
    fn new(id: SequenceId) -> Self {
        Self {
            id,
            name: default_name(id),
            images: Vec::new(),
            trailer: None,
        }
    }

    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn images(&self) -> &[ImageEntry] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Per-sequence trailer, overriding the global tail page
    pub fn trailer(&self) -> Option<&Path> {
        self.trailer.as_deref()
    }

    pub fn position(&self, image: ImageId) -> Option<usize> {
        self.images.iter().position(|entry| entry.id == image)
    }

    pub fn image_paths(&self) -> Vec<PathBuf> {
        self.images.iter().map(|entry| entry.path.clone()).collect()
    }

    /// The page list for export: images in order, then the trailer
    ///
    /// The sequence's own trailer wins over `default_trailer`. A trailer whose
    /// file no longer exists is left out.
    pub fn pages(&self, default_trailer: Option<&Path>) -> Vec<PathBuf> {
        let mut pages = self.image_paths();
        if let Some(trailer) = self.trailer.as_deref().or(default_trailer) {
            if trailer.exists() {
                pages.push(trailer.to_path_buf());
            } else {
                warn!("Trailer {} no longer exists, skipping", trailer.display());
            }
        }
        pages
    }

    /// Number of pages a PDF of this sequence would have, trailer included
    ///
    /// Counts the same pages as [`Sequence::pages`] without building the list.
    /// An empty sequence produces no PDF, so it counts as zero.
    pub fn page_count(&self, default_trailer: Option<&Path>) -> usize {
        if self.images.is_empty() {
            return 0;
        }
        let trailer = self
            .trailer
            .as_deref()
            .or(default_trailer)
            .filter(|path| path.exists());
        self.images.len() + usize::from(trailer.is_some())
    }
}

fn default_name(id: SequenceId) -> String {
    format!("Collection {}", id)
}

/// All sequences of the current session
#[derive(Debug, Clone)]
pub struct Workspace {
    sequences: Vec<Sequence>,
    current: SequenceId,
    next_image_id: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// A workspace with a single empty sequence
    pub fn new() -> Self {
        let first = SequenceId(1);
        Self {
            sequences: vec![Sequence::new(first)],
            current: first,
            next_image_id: 1,
        }
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn current_id(&self) -> SequenceId {
        self.current
    }

    pub fn current(&self) -> &Sequence {
        // `current` always names an existing sequence
        self.sequences
            .iter()
            .find(|s| s.id == self.current)
            .unwrap_or(&self.sequences[0])
    }

    pub fn get(&self, id: SequenceId) -> Result<&Sequence> {
        self.sequences
            .iter()
            .find(|s| s.id == id)
            .ok_or(Error::SequenceNotFound(id))
    }

    fn get_mut(&mut self, id: SequenceId) -> Result<&mut Sequence> {
        self.sequences
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(Error::SequenceNotFound(id))
    }

    pub fn can_add_sequence(&self) -> bool {
        self.sequences.len() < MAX_SEQUENCES
    }

    /// Create a new empty sequence and make it current
    pub fn add_sequence(&mut self) -> Result<SequenceId> {
        if !self.can_add_sequence() {
            return Err(Error::SequenceLimit(MAX_SEQUENCES));
        }
        let id = (1..=MAX_SEQUENCES as u8)
            .map(SequenceId)
            .find(|candidate| self.sequences.iter().all(|s| s.id != *candidate))
            .ok_or(Error::SequenceLimit(MAX_SEQUENCES))?;

        self.sequences.push(Sequence::new(id));
        self.current = id;
        debug!("Created sequence {}", id);
        Ok(id)
    }

    /// Delete a sequence; the last remaining one cannot be removed
    pub fn remove_sequence(&mut self, id: SequenceId) -> Result<()> {
        if self.sequences.len() <= 1 {
            return Err(Error::LastSequence);
        }
        let index = self
            .sequences
            .iter()
            .position(|s| s.id == id)
            .ok_or(Error::SequenceNotFound(id))?;

        self.sequences.remove(index);
        if self.current == id {
            self.current = self.sequences[0].id;
        }
        debug!("Removed sequence {}", id);
        Ok(())
    }

    pub fn select(&mut self, id: SequenceId) -> Result<()> {
        self.get(id)?;
        self.current = id;
        Ok(())
    }

    /// Rename a sequence; an empty name restores the default
    pub fn rename(&mut self, id: SequenceId, name: &str) -> Result<()> {
        let sequence = self.get_mut(id)?;
        sequence.name = if name.trim().is_empty() {
            default_name(id)
        } else {
            name.to_string()
        };
        Ok(())
    }

    /// Validate, probe and append a batch of files
    ///
    /// The batch is sorted by file name (numbers compared numerically) before
    /// it is appended. Files that are not supported images or cannot be
    /// decoded are collected in the report instead of failing the batch.
    pub fn add_images(
        &mut self,
        id: SequenceId,
        paths: &[PathBuf],
        thumbnail_width: Option<u32>,
    ) -> Result<AddReport> {
        self.get(id)?;

        let mut sorted = paths.to_vec();
        sort_naturally(&mut sorted);

        let mut report = AddReport::default();
        let mut probed = Vec::with_capacity(sorted.len());
        for path in sorted {
            match imaging::probe(&path, thumbnail_width) {
                Ok(image) => probed.push(image),
                Err(e) => {
                    warn!("Rejected {}: {}", path.display(), e);
                    report.rejected.push((path, e.to_string()));
                }
            }
        }

        report.added = self.insert_probed(id, probed)?;
        Ok(report)
    }

    /// Append images that were already probed (e.g. on a background task)
    pub fn insert_probed(&mut self, id: SequenceId, probed: Vec<ProbedImage>) -> Result<usize> {
        let mut next_id = self.next_image_id;
        let sequence = self.get_mut(id)?;
        let count = probed.len();

        for image in probed {
            sequence.images.push(ImageEntry {
                id: ImageId(next_id),
                path: image.path,
                width: image.width,
                height: image.height,
                thumbnail: image.thumbnail,
            });
            next_id += 1;
        }

        self.next_image_id = next_id;
        Ok(count)
    }

    pub fn remove_image(&mut self, id: SequenceId, image: ImageId) -> Result<ImageEntry> {
        let sequence = self.get_mut(id)?;
        let index = sequence.position(image).ok_or(Error::ImageNotFound(image))?;
        Ok(sequence.images.remove(index))
    }

    /// Move the image at `from` so that it ends up at index `to`
    pub fn move_image(&mut self, id: SequenceId, from: usize, to: usize) -> Result<()> {
        let sequence = self.get_mut(id)?;
        let len = sequence.images.len();
        for index in [from, to] {
            if index >= len {
                return Err(Error::IndexOutOfRange { index, len });
            }
        }
        let entry = sequence.images.remove(from);
        sequence.images.insert(to, entry);
        Ok(())
    }

    /// Shift an image left (negative) or right (positive), clamped to the ends
    pub fn move_image_by(&mut self, id: SequenceId, image: ImageId, delta: isize) -> Result<()> {
        let sequence = self.get(id)?;
        let from = sequence.position(image).ok_or(Error::ImageNotFound(image))?;
        let last = sequence.len().saturating_sub(1) as isize;
        let to = (from as isize + delta).clamp(0, last) as usize;
        self.move_image(id, from, to)
    }

    pub fn sort_by_name(&mut self, id: SequenceId) -> Result<()> {
        let sequence = self.get_mut(id)?;
        sequence.images.sort_by(|a, b| natural_cmp(&a.path, &b.path));
        Ok(())
    }

    pub fn clear(&mut self, id: SequenceId) -> Result<usize> {
        let sequence = self.get_mut(id)?;
        let removed = sequence.images.len();
        sequence.images.clear();
        Ok(removed)
    }

    /// Set or clear the per-sequence trailer image
    pub fn set_trailer(&mut self, id: SequenceId, trailer: Option<PathBuf>) -> Result<()> {
        if let Some(path) = &trailer {
            if !is_image_file(path) {
                return Err(Error::UnsupportedFormat(path.clone()));
            }
            if !path.exists() {
                return Err(Error::FileNotFound(path.clone()));
            }
        }
        self.get_mut(id)?.trailer = trailer;
        Ok(())
    }

    /// Sequences that have at least one image, in tab order
    pub fn non_empty(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter().filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_jpg(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(w, h, Rgb([50, 60, 70]))
            .save(&path)
            .expect("failed to write jpg");
        path
    }

    fn names(workspace: &Workspace) -> Vec<String> {
        workspace
            .current()
            .images()
            .iter()
            .map(|e| e.file_name())
            .collect()
    }

    #[test]
    fn test_new_workspace_has_one_sequence() {
        let workspace = Workspace::new();
        assert_eq!(workspace.len(), 1);
        assert_eq!(workspace.current_id().get(), 1);
        assert_eq!(workspace.current().name(), "Collection 1");
    }

    #[test]
    fn test_sequence_limit() {
        let mut workspace = Workspace::new();
        for _ in 1..MAX_SEQUENCES {
            workspace.add_sequence().unwrap();
        }
        assert_eq!(workspace.len(), MAX_SEQUENCES);
        assert!(!workspace.can_add_sequence());
        assert!(matches!(
            workspace.add_sequence(),
            Err(Error::SequenceLimit(MAX_SEQUENCES))
        ));
        assert_eq!(workspace.len(), MAX_SEQUENCES);
    }

    #[test]
    fn test_ids_are_reused_within_range() {
        let mut workspace = Workspace::new();
        let second = workspace.add_sequence().unwrap();
        let third = workspace.add_sequence().unwrap();
        workspace.remove_sequence(second).unwrap();

        let reused = workspace.add_sequence().unwrap();
        assert_eq!(reused, second);
        assert_eq!(third.get(), 3);
        assert!(workspace
            .sequences()
            .iter()
            .all(|s| (1..=MAX_SEQUENCES as u8).contains(&s.id().get())));
    }

    #[test]
    fn test_cannot_remove_last_sequence() {
        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        assert!(matches!(workspace.remove_sequence(id), Err(Error::LastSequence)));
    }

    #[test]
    fn test_removing_current_selects_first() {
        let mut workspace = Workspace::new();
        let second = workspace.add_sequence().unwrap();
        assert_eq!(workspace.current_id(), second);

        workspace.remove_sequence(second).unwrap();
        assert_eq!(workspace.current_id().get(), 1);
    }

    #[test]
    fn test_rename_empty_restores_default() {
        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        workspace.rename(id, "Chapter 12").unwrap();
        assert_eq!(workspace.current().name(), "Chapter 12");
        workspace.rename(id, "  ").unwrap();
        assert_eq!(workspace.current().name(), "Collection 1");
    }

    #[test]
    fn test_add_images_sorts_batch_and_rejects_unsupported() {
        let dir = TempDir::new().unwrap();
        let p10 = write_jpg(dir.path(), "p10.jpg", 4, 4);
        let p2 = write_jpg(dir.path(), "p2.jpg", 4, 4);
        let p1 = write_jpg(dir.path(), "p1.jpg", 4, 4);
        let text = dir.path().join("readme.txt");
        std::fs::write(&text, "x").unwrap();

        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        let report = workspace
            .add_images(id, &[p10, text.clone(), p2, p1], None)
            .unwrap();

        assert_eq!(report.added, 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, text);
        assert_eq!(names(&workspace), vec!["p1.jpg", "p2.jpg", "p10.jpg"]);
    }

    #[test]
    fn test_batches_append_in_insertion_order() {
        let dir = TempDir::new().unwrap();
        let b = write_jpg(dir.path(), "b.jpg", 4, 4);
        let a = write_jpg(dir.path(), "a.jpg", 4, 4);

        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        workspace.add_images(id, &[b], None).unwrap();
        workspace.add_images(id, &[a], None).unwrap();

        assert_eq!(names(&workspace), vec!["b.jpg", "a.jpg"]);
    }

    #[test]
    fn test_reorder_operations() {
        let dir = TempDir::new().unwrap();
        let paths: Vec<PathBuf> = (1..=4)
            .map(|i| write_jpg(dir.path(), &format!("{i}.jpg"), 4, 4))
            .collect();

        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        workspace.add_images(id, &paths, None).unwrap();

        workspace.move_image(id, 0, 3).unwrap();
        assert_eq!(names(&workspace), vec!["2.jpg", "3.jpg", "4.jpg", "1.jpg"]);

        let last = workspace.current().images()[3].id;
        workspace.move_image_by(id, last, -1).unwrap();
        assert_eq!(names(&workspace), vec!["2.jpg", "3.jpg", "1.jpg", "4.jpg"]);

        let first = workspace.current().images()[0].id;
        workspace.move_image_by(id, first, -5).unwrap();
        assert_eq!(names(&workspace), vec!["2.jpg", "3.jpg", "1.jpg", "4.jpg"]);

        workspace.remove_image(id, first).unwrap();
        assert_eq!(names(&workspace), vec!["3.jpg", "1.jpg", "4.jpg"]);

        workspace.sort_by_name(id).unwrap();
        assert_eq!(names(&workspace), vec!["1.jpg", "3.jpg", "4.jpg"]);

        assert!(matches!(
            workspace.move_image(id, 0, 7),
            Err(Error::IndexOutOfRange { index: 7, len: 3 })
        ));
        assert_eq!(workspace.clear(id).unwrap(), 3);
        assert!(workspace.current().is_empty());
    }

    #[test]
    fn test_pages_append_existing_trailer() {
        let dir = TempDir::new().unwrap();
        let page = write_jpg(dir.path(), "page.jpg", 4, 4);
        let tail = write_jpg(dir.path(), "tail.jpg", 4, 4);
        let own_tail = write_jpg(dir.path(), "own.jpg", 4, 4);

        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        workspace.add_images(id, &[page.clone()], None).unwrap();

        let sequence = workspace.get(id).unwrap();
        assert_eq!(sequence.pages(None), vec![page.clone()]);
        assert_eq!(sequence.pages(Some(tail.as_path())), vec![page.clone(), tail.clone()]);
        assert_eq!(
            sequence.pages(Some(Path::new("gone/tail.jpg"))),
            vec![page.clone()]
        );

        workspace.set_trailer(id, Some(own_tail.clone())).unwrap();
        let sequence = workspace.get(id).unwrap();
        assert_eq!(sequence.pages(Some(tail.as_path())), vec![page, own_tail]);
    }

    #[test]
    fn test_page_count_ignores_deleted_trailer() {
        let dir = TempDir::new().unwrap();
        let page = write_jpg(dir.path(), "page.jpg", 4, 4);
        let own_tail = write_jpg(dir.path(), "own.jpg", 4, 4);

        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        assert_eq!(workspace.get(id).unwrap().page_count(None), 0);

        workspace.add_images(id, &[page], None).unwrap();
        workspace.set_trailer(id, Some(own_tail.clone())).unwrap();
        assert_eq!(workspace.get(id).unwrap().page_count(None), 2);

        std::fs::remove_file(&own_tail).unwrap();
        let sequence = workspace.get(id).unwrap();
        assert_eq!(sequence.page_count(None), 1);
        assert_eq!(sequence.page_count(None), sequence.pages(None).len());
    }

    #[test]
    fn test_set_trailer_rejects_unsupported() {
        let mut workspace = Workspace::new();
        let id = workspace.current_id();
        let result = workspace.set_trailer(id, Some(PathBuf::from("tail.pdf")));
        assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_display_name_and_long_strip() {
        let entry = ImageEntry {
            id: ImageId(1),
            path: PathBuf::from("a_really_long_file_name_01.png"),
            width: 100,
            height: 201,
            thumbnail: None,
        };
        assert_eq!(entry.display_name(), "a_really....png");
        assert!(entry.is_long_strip());
    }

    #[test]
    fn test_non_empty_filters() {
        let dir = TempDir::new().unwrap();
        let page = write_jpg(dir.path(), "page.jpg", 4, 4);

        let mut workspace = Workspace::new();
        let second = workspace.add_sequence().unwrap();
        workspace.add_images(second, &[page], None).unwrap();

        let ids: Vec<SequenceId> = workspace.non_empty().map(|s| s.id()).collect();
        assert_eq!(ids, vec![second]);
    }
}
