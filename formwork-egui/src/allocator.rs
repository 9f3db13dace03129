//! Preview handles backed by egui's image cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use eframe::egui;
use formwork::{FileHandle, PreviewAllocator};

/// Registers picked file bytes with the egui context under a `bytes://` URI.
///
/// Releasing a handle makes egui forget the image, so decoded textures do
/// not outlive the preview that showed them. Displaying the images needs
/// image loaders to be installed on the context by the host.
#[derive(Clone)]
pub struct EguiPreviewAllocator {
    ctx: egui::Context,
    next: Arc<AtomicU64>,
}

impl EguiPreviewAllocator {
    pub fn new(ctx: egui::Context) -> Self {
        Self {
            ctx,
            next: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl PreviewAllocator for EguiPreviewAllocator {
    fn allocate(&mut self, file: &FileHandle) -> String {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        let uri = format!("bytes://formwork/{id}/{}", file.name);
        if let Some(bytes) = &file.bytes {
            self.ctx
                .include_bytes(uri.clone(), egui::load::Bytes::Shared(Arc::clone(bytes)));
        }
        tracing::debug!(%uri, size = file.size, "allocated preview");
        uri
    }

    fn release(&mut self, url: &str) {
        self.ctx.forget_image(url);
        tracing::debug!(uri = %url, "released preview");
    }
}
