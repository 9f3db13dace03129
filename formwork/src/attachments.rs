//! File attachment state for file fields.
//!
//! A file field shows two kinds of entries: files already persisted on the
//! server (addressed by path) and files picked locally but not uploaded yet.
//! Local files are previewed through temporary handles obtained from a
//! [`PreviewAllocator`]; the [`AttachmentManager`] owns those handles and
//! releases each exactly once.
//!
//! The removed-files list and the field value belong to the caller. The
//! manager only proposes new versions of them through [`ChangeEvent`]s.

use formwork_types::{
    ChangeEvent, FieldPath, FieldSchema, FieldValue, FileHandle, UrlResolver, file_extension,
};
use serde::Serialize;

use crate::validation::accepts;

/// Extensions previewed as images for server-side files.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "avif", "ico"];

/// Allocates and releases temporary preview handles for local files.
///
/// In a browser these are object URLs; a GUI backend may register the
/// bytes with its image cache instead.
pub trait PreviewAllocator {
    /// Allocate a handle and return the URL it can be displayed from.
    fn allocate(&mut self, file: &FileHandle) -> String;

    /// Release a handle previously returned by [`allocate`](Self::allocate).
    fn release(&mut self, url: &str);
}

/// Attachment settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentOptions {
    image_extensions: Vec<String>,
}

impl Default for AttachmentOptions {
    fn default() -> Self {
        Self {
            image_extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }
}

impl AttachmentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of extensions treated as images (without dots).
    pub fn with_image_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.image_extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Whether a server path looks like an image.
    pub fn is_image_path(&self, path: &str) -> bool {
        file_extension(path).is_some_and(|ext| self.image_extensions.contains(&ext))
    }
}

/// A file already stored on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ExistingFile {
    /// Server-relative path, also the key used in the removed-files list.
    pub path: String,

    /// Display name; defaults to the last path segment.
    pub name: Option<String>,
}

impl ExistingFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => self
                .path
                .rsplit('/')
                .find(|s| !s.is_empty())
                .unwrap_or(&self.path),
        }
    }
}

impl From<&str> for ExistingFile {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ExistingFile {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// One displayable attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEntry {
    pub url: String,
    pub display_name: String,
    pub is_image: bool,
    /// `true` for server files, `false` for local files holding a handle.
    pub is_existing: bool,
    /// Server path of an existing file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

/// The inputs a preview list was built from.
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    value: FieldValue,
    existing: Vec<ExistingFile>,
    removed: Vec<String>,
}

/// Owns the preview list and the temporary handles of one file field.
///
/// Dropping the manager releases every outstanding handle.
pub struct AttachmentManager<A: PreviewAllocator> {
    name: FieldPath,
    label: String,
    accept: Option<String>,
    multiple: bool,
    options: AttachmentOptions,
    allocator: A,
    previews: Vec<PreviewEntry>,
    /// Last removed-files snapshot supplied by the caller.
    removed: Vec<String>,
    /// Handles allocated and not yet released.
    live: Vec<String>,
    snapshot: Option<Snapshot>,
}

impl<A: PreviewAllocator> AttachmentManager<A> {
    pub fn new(schema: &FieldSchema, allocator: A) -> Self {
        Self {
            name: schema.name.clone(),
            label: schema.display_label().to_string(),
            accept: schema.accept.clone().filter(|a| !a.trim().is_empty()),
            multiple: schema.multiple,
            options: AttachmentOptions::default(),
            allocator,
            previews: Vec::new(),
            removed: Vec::new(),
            live: Vec::new(),
            snapshot: None,
        }
    }

    pub fn with_options(mut self, options: AttachmentOptions) -> Self {
        self.options = options;
        self
    }

    /// Current preview entries: existing files first, then local files.
    pub fn previews(&self) -> &[PreviewEntry] {
        &self.previews
    }

    /// The removed-files snapshot the previews were built from.
    pub fn removed_files(&self) -> &[String] {
        &self.removed
    }

    /// Number of handles currently held.
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Recompute previews only if the inputs changed since the last call.
    ///
    /// Returns whether a recompute happened. Backends that render every
    /// frame call this instead of [`recompute`](Self::recompute).
    pub fn sync(
        &mut self,
        value: &FieldValue,
        existing: &[ExistingFile],
        removed: &[String],
        resolver: Option<&dyn UrlResolver>,
    ) -> bool {
        let unchanged = self.snapshot.as_ref().is_some_and(|s| {
            &s.value == value && s.existing.as_slice() == existing && s.removed.as_slice() == removed
        });
        if unchanged {
            return false;
        }
        self.recompute(value, existing, removed, resolver);
        true
    }

    /// Rebuild the preview list.
    ///
    /// All previously allocated handles are released before new ones are
    /// allocated, so stale and fresh handles never coexist.
    pub fn recompute(
        &mut self,
        value: &FieldValue,
        existing: &[ExistingFile],
        removed: &[String],
        resolver: Option<&dyn UrlResolver>,
    ) {
        self.release_all();
        self.removed = removed.to_vec();
        self.snapshot = Some(Snapshot {
            value: value.clone(),
            existing: existing.to_vec(),
            removed: removed.to_vec(),
        });

        let mut previews = Vec::with_capacity(existing.len() + value.files().len());
        for file in existing {
            let path = file.path.trim();
            if path.is_empty() || removed.iter().any(|r| r == &file.path) {
                continue;
            }
            previews.push(PreviewEntry {
                url: resolver.map_or_else(|| path.to_string(), |r| r.resolve(path)),
                display_name: file.display_name().to_string(),
                is_image: self.options.is_image_path(path),
                is_existing: true,
                source_path: Some(file.path.clone()),
            });
        }
        for file in value.files() {
            let url = self.allocator.allocate(file);
            self.live.push(url.clone());
            previews.push(PreviewEntry {
                url,
                display_name: file.name.clone(),
                is_image: file.is_image() || self.options.is_image_path(&file.name),
                is_existing: false,
                source_path: None,
            });
        }
        self.previews = previews;

        tracing::debug!(
            field = %self.name,
            previews = self.previews.len(),
            handles = self.live.len(),
            "recomputed attachment previews"
        );
    }

    /// Turn a picker selection into a change event.
    ///
    /// Selection is all-or-nothing: if any file fails the accept filter the
    /// event carries [`FieldValue::InvalidFileType`] and the backend should
    /// reset the picker's displayed value. An accepted selection carries the
    /// caller's `removed` set forward unchanged.
    pub fn select(&self, files: Vec<FileHandle>, removed: &[String]) -> ChangeEvent {
        if let Some(accept) = &self.accept
            && let Some(rejected) = files.iter().find(|f| !accepts(accept, f))
        {
            tracing::warn!(
                field = %self.name,
                file = %rejected.name,
                accept = %accept,
                "rejected file selection"
            );
            return ChangeEvent::new(self.name.clone(), FieldValue::InvalidFileType);
        }

        let value = if self.multiple {
            FieldValue::Files(files)
        } else {
            files.into_iter().next().map_or(FieldValue::Empty, FieldValue::File)
        };
        ChangeEvent::new(self.name.clone(), value).with_removed_files(removed.to_vec())
    }

    /// Remove the preview at `index`.
    ///
    /// Existing files are added to a copy of the caller's `removed` set and
    /// the value is re-emitted unchanged. Local files have their handle
    /// released and are spliced out of the value. Returns `None` for an
    /// out-of-range index.
    pub fn remove(
        &mut self,
        index: usize,
        value: &FieldValue,
        removed: &[String],
    ) -> Option<ChangeEvent> {
        let entry = self.previews.get(index)?.clone();

        let event = if entry.is_existing {
            let mut removed = removed.to_vec();
            if let Some(path) = entry.source_path
                && !removed.contains(&path)
            {
                removed.push(path);
            }
            ChangeEvent::new(self.name.clone(), value.clone()).with_removed_files(removed)
        } else {
            self.release(&entry.url);
            let position = self.previews[..index]
                .iter()
                .filter(|e| !e.is_existing)
                .count();
            let value = match value {
                FieldValue::Files(files) => {
                    let mut files = files.clone();
                    if position < files.len() {
                        files.remove(position);
                    }
                    FieldValue::Files(files)
                }
                FieldValue::File(_) if position == 0 => FieldValue::Empty,
                other => other.clone(),
            };
            ChangeEvent::new(self.name.clone(), value).with_removed_files(removed.to_vec())
        };

        self.previews.remove(index);
        // The caller's next sync must rebuild from whatever it applied.
        self.snapshot = None;
        tracing::debug!(field = %self.name, index, "removed attachment preview");
        Some(event)
    }

    /// Release every outstanding handle. Safe to call more than once.
    pub fn teardown(&mut self) {
        self.release_all();
        self.previews.clear();
        self.snapshot = None;
    }

    /// Label used in messages about this field.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn release(&mut self, url: &str) {
        if let Some(pos) = self.live.iter().position(|u| u == url) {
            self.live.remove(pos);
            self.allocator.release(url);
        }
    }

    fn release_all(&mut self) {
        for url in self.live.drain(..) {
            self.allocator.release(&url);
        }
    }
}

impl<A: PreviewAllocator> Drop for AttachmentManager<A> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingAllocator;
    use formwork_types::{BaseUrlResolver, FieldKind};

    fn png(name: &str) -> FileHandle {
        FileHandle::new(name, "image/png")
    }

    fn manager(schema: FieldSchema) -> (AttachmentManager<CountingAllocator>, CountingAllocator) {
        let allocator = CountingAllocator::new();
        (AttachmentManager::new(&schema, allocator.clone()), allocator)
    }

    fn gallery() -> FieldSchema {
        FieldSchema::new("gallery", FieldKind::File)
            .with_accept("image/*")
            .multiple()
    }

    #[test]
    fn existing_entries_come_first() {
        let (mut m, _) = manager(gallery());
        let value = FieldValue::Files(vec![png("new.png")]);
        let existing = vec![ExistingFile::new("/u/old.jpg"), ExistingFile::new("/u/doc.pdf")];
        let resolver = BaseUrlResolver::new("https://cdn.test");

        m.recompute(&value, &existing, &[], Some(&resolver));

        let previews = m.previews();
        assert_eq!(previews.len(), 3);
        assert_eq!(previews[0].url, "https://cdn.test/u/old.jpg");
        assert_eq!(previews[0].display_name, "old.jpg");
        assert!(previews[0].is_image && previews[0].is_existing);
        assert!(!previews[1].is_image);
        assert!(!previews[2].is_existing);
        assert_eq!(previews[2].url, "blob:formwork/0");
    }

    #[test]
    fn removed_and_blank_paths_are_skipped() {
        let (mut m, _) = manager(gallery());
        let existing: Vec<ExistingFile> = vec!["/a.png".into(), "  ".into(), "/b.png".into()];
        m.recompute(&FieldValue::Empty, &existing, &["/a.png".to_string()], None);
        assert_eq!(m.previews().len(), 1);
        assert_eq!(m.previews()[0].source_path.as_deref(), Some("/b.png"));
    }

    #[test]
    fn recompute_releases_previous_handles_first() {
        let (mut m, allocator) = manager(gallery());
        let value = FieldValue::Files(vec![png("a.png"), png("b.png")]);
        m.recompute(&value, &[], &[], None);
        m.recompute(&value, &[], &[], None);

        assert_eq!(allocator.allocations(), 4);
        assert_eq!(allocator.releases(), 2);
        assert_eq!(allocator.outstanding(), 2);
        assert_eq!(m.live_handles(), 2);
    }

    #[test]
    fn sync_skips_unchanged_inputs() {
        let (mut m, allocator) = manager(gallery());
        let value = FieldValue::Files(vec![png("a.png")]);
        assert!(m.sync(&value, &[], &[], None));
        assert!(!m.sync(&value, &[], &[], None));
        assert_eq!(allocator.allocations(), 1);
    }

    #[test]
    fn rejected_selection_is_all_or_nothing() {
        let (m, _) = manager(
            FieldSchema::new("docs", FieldKind::File)
                .with_accept(".png,.jpg")
                .multiple(),
        );
        let event = m.select(vec![png("a.png"), FileHandle::new("b.txt", "text/plain")], &[]);
        assert_eq!(event, ChangeEvent::new("docs", FieldValue::InvalidFileType));
    }

    #[test]
    fn single_selection_keeps_first_file() {
        let (m, _) = manager(FieldSchema::new("logo", FieldKind::File).with_accept("image/*"));
        let removed = vec!["/old.png".to_string()];
        let event = m.select(vec![png("a.png"), png("b.png")], &removed);
        assert_eq!(event.value, FieldValue::File(png("a.png")));
        assert_eq!(event.removed_files, Some(removed));
    }

    #[test]
    fn removing_existing_file_is_idempotent() {
        let (mut m, _) = manager(gallery());
        let existing = vec![ExistingFile::new("/a.png")];
        m.recompute(&FieldValue::Empty, &existing, &[], None);

        let event = m.remove(0, &FieldValue::Empty, &[]).unwrap();
        assert_eq!(event.value, FieldValue::Empty);
        assert_eq!(event.removed_files, Some(vec!["/a.png".to_string()]));
        assert!(m.previews().is_empty());

        let removed = event.removed_files.unwrap();
        m.recompute(&FieldValue::Empty, &existing, &removed, None);
        assert!(m.remove(0, &FieldValue::Empty, &removed).is_none());
        assert_eq!(m.removed_files(), removed.as_slice());
    }

    #[test]
    fn duplicate_paths_are_recorded_once() {
        let (mut m, _) = manager(gallery());
        let existing = vec![ExistingFile::new("/a.png"), ExistingFile::new("/a.png")];
        m.recompute(&FieldValue::Empty, &existing, &["/a.png".to_string()], None);
        assert!(m.previews().is_empty());

        m.recompute(&FieldValue::Empty, &existing, &[], None);
        let first = m.remove(0, &FieldValue::Empty, &[]).unwrap().removed_files.unwrap();
        let second = m.remove(0, &FieldValue::Empty, &first).unwrap();
        assert_eq!(second.removed_files, Some(vec!["/a.png".to_string()]));
    }

    #[test]
    fn removal_extends_the_callers_set() {
        let (mut m, _) = manager(gallery());
        let existing = vec![ExistingFile::new("/a.png"), ExistingFile::new("/b.png")];
        m.recompute(&FieldValue::Empty, &existing, &[], None);

        let event = m
            .remove(1, &FieldValue::Empty, &["/x.png".to_string()])
            .unwrap();
        assert_eq!(
            event.removed_files,
            Some(vec!["/x.png".to_string(), "/b.png".to_string()])
        );
    }

    #[test]
    fn removing_local_file_splices_its_position() {
        let (mut m, allocator) = manager(gallery());
        let value = FieldValue::Files(vec![png("a.png"), png("b.png"), png("c.png")]);
        let existing = vec![ExistingFile::new("/old.png")];
        m.recompute(&value, &existing, &[], None);

        // Index 2 is the second local file ("b.png").
        let event = m.remove(2, &value, &[]).unwrap();
        assert_eq!(
            event.value,
            FieldValue::Files(vec![png("a.png"), png("c.png")])
        );
        assert_eq!(event.removed_files, Some(Vec::new()));
        assert_eq!(allocator.releases(), 1);

        m.recompute(&event.value, &existing, &[], None);
        assert_eq!(allocator.outstanding(), 2);
        assert_eq!(allocator.double_releases(), 0);
    }

    #[test]
    fn removing_single_local_file_clears_value() {
        let (mut m, _) = manager(FieldSchema::new("logo", FieldKind::File));
        let value = FieldValue::File(png("a.png"));
        m.recompute(&value, &[], &[], None);
        let event = m.remove(0, &value, &[]).unwrap();
        assert_eq!(event.value, FieldValue::Empty);
    }

    #[test]
    fn drop_releases_outstanding_handles_once() {
        let (mut m, allocator) = manager(gallery());
        let value = FieldValue::Files(vec![png("a.png"), png("b.png")]);
        m.recompute(&value, &[], &[], None);
        m.remove(0, &value, &[]);
        m.teardown();
        drop(m);

        assert_eq!(allocator.allocations(), 2);
        assert_eq!(allocator.releases(), 2);
        assert_eq!(allocator.double_releases(), 0);
    }

    #[test]
    fn custom_image_extensions() {
        let options = AttachmentOptions::new().with_image_extensions([".HEIC"]);
        assert!(options.is_image_path("/photos/x.heic"));
        assert!(!options.is_image_path("/photos/x.png"));
    }
}
