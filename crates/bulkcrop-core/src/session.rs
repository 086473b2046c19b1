//! Editing sessions and the workspace that owns them.
//!
//! A session binds one image to the crop widget. It starts `Uninitialized`
//! and becomes `Ready` when the widget signals readiness; any previously
//! saved crop is restored at that point. Every exit (close, next, previous)
//! first captures the widget's rectangle and a preview into the image, then
//! moves on.
//!
//! # Host protocol
//!
//! ```ignore
//! let id = workspace.add_files(files)[0];
//! workspace.open(id)?;
//! let mut widget = workspace.headless_widget()?; // or a real widget
//! workspace.ready(&mut widget)?;
//! if let Some(token) = workspace.edit_width(&mut widget, 400)? {
//!     workspace.acknowledge(token);
//! }
//! match workspace.next(&widget)? {
//!     Navigation::Moved(next) => { /* build a widget for `next`, call ready */ }
//!     Navigation::Closed | Navigation::Stayed => {}
//! }
//! ```

use thiserror::Error;
use tracing::{debug, warn};

use crate::aspect::{AspectRatio, AspectRatioSpec};
use crate::collection::{CollectionError, ImageCollection, ImageId, SavedCrop, SourceFile};
use crate::decode::{render_thumbnail, DecodeError, DecodedImage, PreviewOptions};
use crate::descriptor::{CropDescriptor, CropRect};
use crate::export::{self, ArchiveSink, CancelToken, ExportError, ExportOptions, ExportOutcome};
use crate::sync::{CropFieldSynchronizer, CropFields, PushToken};
use crate::transform::apply_crop;
use crate::widget::{capture_rect, CropWidget, HeadlessCropper};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("No image is being edited")]
    NoSession,

    #[error("Image {0} is already being edited")]
    AlreadyEditing(ImageId),

    #[error(transparent)]
    Collection(#[from] CollectionError),

    #[error("Cannot load image for editing: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the widget's ready signal.
    Uninitialized,
    /// The widget owns the live rectangle.
    Ready,
}

/// Where an exit action left the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// A new session was opened for this image.
    Moved(ImageId),
    /// The current session continues (previous on the first image).
    Stayed,
    /// No image is being edited any more.
    Closed,
}

/// One image bound to the crop widget.
#[derive(Debug, Clone)]
pub struct EditSession {
    image_id: ImageId,
    sync: CropFieldSynchronizer,
}

impl EditSession {
    pub fn new(image_id: ImageId, ratio: AspectRatio) -> Self {
        Self {
            image_id,
            sync: CropFieldSynchronizer::new(ratio),
        }
    }

    pub fn image_id(&self) -> ImageId {
        self.image_id
    }

    pub fn state(&self) -> SessionState {
        if self.sync.is_ready() {
            SessionState::Ready
        } else {
            SessionState::Uninitialized
        }
    }

    pub fn fields(&self) -> CropFields {
        self.sync.fields()
    }

    pub fn synchronizer(&self) -> &CropFieldSynchronizer {
        &self.sync
    }

    /// Capture the widget's current rectangle and preview.
    ///
    /// `None` before the widget is ready: there is no live rectangle yet.
    pub fn capture<W: CropWidget + ?Sized>(
        &self,
        widget: &W,
        preview: &PreviewOptions,
    ) -> Option<SavedCrop> {
        if !self.sync.is_ready() {
            return None;
        }
        let (width, height) = widget.image_size();
        let descriptor = capture_rect(widget.rectangle(), width, height)?;
        Some(SavedCrop {
            descriptor,
            preview: widget.render_preview(preview.max_edge),
        })
    }
}

/// All state of one cropping session: images, ratio selection and the editor.
#[derive(Debug, Default)]
pub struct Workspace {
    images: ImageCollection,
    aspect: AspectRatioSpec,
    session: Option<EditSession>,
    preview: PreviewOptions,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview_options(mut self, preview: PreviewOptions) -> Self {
        self.preview = preview;
        self
    }

    pub fn images(&self) -> &ImageCollection {
        &self.images
    }

    /// Add one file. Types outside [`crate::collection::ACCEPTED_MIME_TYPES`]
    /// are kept, with a warning.
    pub fn add_file(&mut self, file: SourceFile) -> ImageId {
        let id = self.images.add(file);
        if let Some(entity) = self.images.get(id).filter(|e| !e.has_accepted_type()) {
            warn!(
                file = entity.file_name(),
                mime = entity.mime_type(),
                "added a file the picker does not offer"
            );
        }
        id
    }

    pub fn add_files<I>(&mut self, files: I) -> Vec<ImageId>
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let ids: Vec<ImageId> = files.into_iter().map(|f| self.add_file(f)).collect();
        debug!(added = ids.len(), total = self.images.len(), "images added");
        ids
    }

    /// Remove an image. Removing the image under edit ends its session unsaved.
    pub fn remove(&mut self, id: ImageId) -> Result<(), SessionError> {
        self.images.remove(id)?;
        if self.editing() == Some(id) {
            debug!(%id, "removed image under edit");
            self.session = None;
        }
        Ok(())
    }

    /// Remove every image and end any session.
    pub fn clear(&mut self) -> usize {
        self.session = None;
        self.images.clear()
    }

    pub fn aspect_spec(&self) -> AspectRatioSpec {
        self.aspect
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect.resolve()
    }

    /// Change the ratio selection. Returns the resolved ratio, which the host
    /// must also pass to the live widget via [`CropWidget::set_aspect_ratio`].
    pub fn set_aspect_spec(&mut self, spec: AspectRatioSpec) -> AspectRatio {
        self.aspect = spec;
        let ratio = spec.resolve();
        if let Some(session) = &mut self.session {
            session.sync.set_ratio(ratio);
        }
        ratio
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    /// Id of the image under edit.
    pub fn editing(&self) -> Option<ImageId> {
        self.session.as_ref().map(EditSession::image_id)
    }

    /// Start editing `id`.
    pub fn open(&mut self, id: ImageId) -> Result<&EditSession, SessionError> {
        if let Some(current) = self.editing() {
            return Err(SessionError::AlreadyEditing(current));
        }
        if !self.images.contains(id) {
            return Err(CollectionError::NotFound(id).into());
        }
        debug!(%id, "session opened");
        Ok(self.session.insert(EditSession::new(id, self.aspect.resolve())))
    }

    /// A headless widget loaded with the image under edit and the current ratio.
    pub fn headless_widget(&self) -> Result<HeadlessCropper, SessionError> {
        let id = self.editing().ok_or(SessionError::NoSession)?;
        let entity = self.images.get(id).ok_or(CollectionError::NotFound(id))?;
        let image = entity.display_image()?.clone();
        Ok(HeadlessCropper::new(image, self.aspect.resolve()))
    }

    /// The widget signaled readiness: restore any saved crop, then pull.
    pub fn ready<W: CropWidget + ?Sized>(&mut self, widget: &mut W) -> Result<(), SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
        let entity = self
            .images
            .get(session.image_id)
            .ok_or(CollectionError::NotFound(session.image_id))?;

        if let Some(saved) = entity.crop() {
            widget.set_rectangle(CropRect::from(*saved));
        }
        session.sync.ready(widget);
        debug!(id = %session.image_id, restored = entity.crop().is_some(), "session ready");
        Ok(())
    }

    /// Forward a widget change notification. Returns whether the fields updated.
    pub fn widget_changed<W: CropWidget + ?Sized>(&mut self, widget: &W) -> bool {
        match &mut self.session {
            Some(session) => session.sync.widget_changed(widget),
            None => false,
        }
    }

    pub fn acknowledge(&mut self, token: PushToken) -> bool {
        match &mut self.session {
            Some(session) => session.sync.acknowledge(token),
            None => false,
        }
    }

    pub fn edit_width<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        width: i64,
    ) -> Result<Option<PushToken>, SessionError> {
        Ok(self.sync_mut()?.edit_width(widget, width))
    }

    pub fn edit_height<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        height: i64,
    ) -> Result<Option<PushToken>, SessionError> {
        Ok(self.sync_mut()?.edit_height(widget, height))
    }

    pub fn edit_x<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        x: i64,
    ) -> Result<Option<PushToken>, SessionError> {
        Ok(self.sync_mut()?.edit_x(widget, x))
    }

    pub fn edit_y<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        y: i64,
    ) -> Result<Option<PushToken>, SessionError> {
        Ok(self.sync_mut()?.edit_y(widget, y))
    }

    pub fn reset<W: CropWidget + ?Sized>(&mut self, widget: &mut W) -> Result<bool, SessionError> {
        Ok(self.sync_mut()?.reset(widget))
    }

    pub fn has_next(&self) -> bool {
        self.editing()
            .and_then(|id| self.images.next_after(id))
            .is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.editing()
            .and_then(|id| self.images.previous_before(id))
            .is_some()
    }

    /// Save and end the session.
    pub fn close<W: CropWidget + ?Sized>(
        &mut self,
        widget: &W,
    ) -> Result<Navigation, SessionError> {
        self.save_current(widget)?;
        self.session = None;
        Ok(Navigation::Closed)
    }

    /// Save, then edit the next image. Past the last image this closes.
    pub fn next<W: CropWidget + ?Sized>(&mut self, widget: &W) -> Result<Navigation, SessionError> {
        let id = self.save_current(widget)?;
        self.session = None;
        match self.images.next_after(id) {
            Some(next) => {
                self.open(next)?;
                Ok(Navigation::Moved(next))
            }
            None => Ok(Navigation::Closed),
        }
    }

    /// Save, then edit the previous image. On the first image the save still
    /// happens and the session stays open.
    pub fn previous<W: CropWidget + ?Sized>(
        &mut self,
        widget: &W,
    ) -> Result<Navigation, SessionError> {
        let id = self.save_current(widget)?;
        match self.images.previous_before(id) {
            Some(previous) => {
                self.session = None;
                self.open(previous)?;
                Ok(Navigation::Moved(previous))
            }
            None => Ok(Navigation::Stayed),
        }
    }

    /// Export all images through `sink`.
    pub fn export<S: ArchiveSink + ?Sized>(
        &self,
        options: &ExportOptions,
        cancel: Option<&CancelToken>,
        sink: &mut S,
    ) -> Result<ExportOutcome, ExportError> {
        export::export(&self.images, options, cancel, sink)
    }

    fn sync_mut(&mut self) -> Result<&mut CropFieldSynchronizer, SessionError> {
        self.session
            .as_mut()
            .map(|s| &mut s.sync)
            .ok_or(SessionError::NoSession)
    }

    /// Write the widget's rectangle and preview to the image under edit.
    fn save_current<W: CropWidget + ?Sized>(
        &mut self,
        widget: &W,
    ) -> Result<ImageId, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NoSession)?;
        let id = session.image_id;

        match session.capture(widget, &self.preview) {
            Some(mut saved) => {
                if saved.preview.is_none() {
                    saved.preview = self.render_preview(id, &saved.descriptor);
                }
                debug!(%id, descriptor = ?saved.descriptor, "crop saved");
                self.images.save_crop(id, saved)?;
            }
            None => debug!(%id, "session not ready, nothing to save"),
        }
        Ok(id)
    }

    /// Preview cut from the decoded image, for widgets that cannot render one.
    fn render_preview(&self, id: ImageId, descriptor: &CropDescriptor) -> Option<DecodedImage> {
        let image = self.images.get(id)?.display_image().ok()?;
        let cropped = apply_crop(image, descriptor)?;
        render_thumbnail(&cropped, self.preview.max_edge).ok()
    }
}
