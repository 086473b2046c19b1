//! The editor workspace exposed to JavaScript.
//!
//! `JsWorkspace` owns the ingested files, the ratio selection and the editing
//! session. The page keeps the cropperjs instance and forwards its events;
//! every call that touches the widget takes it as an argument, so field
//! synchronization, save-on-navigate and capture all run here.
//!
//! # Example
//!
//! ```typescript
//! const ws = new JsWorkspace();
//! const id = ws.add(file.name, file.type, new Uint8Array(await file.arrayBuffer()));
//! ws.open(id);
//! const cropper = new Cropper(img, {
//!     viewMode: 1,
//!     ready: () => ws.ready(cropper),
//!     crop: () => ws.crop_changed(cropper),
//! });
//! widthInput.oninput = (e) => {
//!     const token = ws.edit_width(cropper, e.target.value);
//!     if (token !== undefined) setTimeout(() => ws.acknowledge(token));
//! };
//! nextButton.onclick = () => { const next = ws.next(cropper); /* load next or close */ };
//!
//! const result = ws.export_archive();
//! if (result.status !== "empty") download(new Blob([result.archive()]), result.archive_name);
//! notify(result.summary);
//! ```

use bulkcrop_core::collection::{CollectionError, Thumbnail, ACCEPTED_MIME_TYPES};
use bulkcrop_core::decode::{render_thumbnail, PreviewOptions};
use bulkcrop_core::{
    build_archive, parse_field_input, CropWidget, ExportError, ExportOptions, ImageId,
    Navigation, PushToken, SessionError, SourceFile, Workspace,
};
use wasm_bindgen::prelude::*;

use crate::aspect::parse_selection;
use crate::cropper::Cropper;
use crate::export::JsExportResult;
use crate::types::{JsCropDescriptor, JsDecodedImage};

type FieldEdit =
    fn(&mut Workspace, &mut Cropper, i64) -> Result<Option<PushToken>, SessionError>;

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
#[derive(Debug, Default)]
pub struct JsWorkspace {
    workspace: Workspace,
    options: ExportOptions,
}

#[wasm_bindgen]
impl JsWorkspace {
    /// `preview_max_edge` sizes the grid previews saved on every exit.
    #[wasm_bindgen(constructor)]
    pub fn new(preview_max_edge: Option<u32>) -> JsWorkspace {
        let mut preview = PreviewOptions::default();
        if let Some(max_edge) = preview_max_edge {
            preview.max_edge = max_edge;
        }
        JsWorkspace {
            workspace: Workspace::new().with_preview_options(preview),
            options: ExportOptions::default(),
        }
    }

    /// Value for the file input's `accept` attribute.
    pub fn accepted_types() -> String {
        ACCEPTED_MIME_TYPES.join(",")
    }

    /// Add one file and return its id.
    pub fn add(&mut self, name: String, mime_type: String, bytes: Vec<u8>) -> String {
        self.workspace
            .add_file(SourceFile::new(name, mime_type, bytes))
            .to_string()
    }

    /// Remove an image. Removing the image under edit ends its session unsaved.
    pub fn remove(&mut self, id: &str) -> Result<(), JsValue> {
        let id = parse_id(id).map_err(to_js_error)?;
        self.workspace.remove(id).map_err(to_js_error)
    }

    /// Remove every image. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        self.workspace.clear()
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.workspace.images().len()
    }

    /// Image ids in ingestion order.
    pub fn ids(&self) -> js_sys::Array {
        self.id_strings().into_iter().map(JsValue::from).collect()
    }

    pub fn file_name(&self, id: &str) -> Option<String> {
        let id = parse_id(id).ok()?;
        self.workspace
            .images()
            .get(id)
            .map(|e| e.file_name().to_string())
    }

    /// The saved crop, or `undefined` if the image is exported unmodified.
    pub fn crop(&self, id: &str) -> Option<JsCropDescriptor> {
        let id = parse_id(id).ok()?;
        self.workspace.images().get(id)?.crop().copied().map(Into::into)
    }

    /// Grid thumbnail: the saved preview if any, otherwise the original
    /// scaled to `max_edge`.
    pub fn thumbnail(&self, id: &str, max_edge: u32) -> Result<JsDecodedImage, JsValue> {
        let id = parse_id(id).map_err(to_js_error)?;
        let entity = self
            .workspace
            .images()
            .get(id)
            .ok_or_else(|| to_js_error(CollectionError::NotFound(id)))?;

        let image = match entity.thumbnail() {
            Thumbnail::Preview(preview) => preview.clone(),
            Thumbnail::Original => {
                let original = entity.display_image().map_err(to_js_error)?;
                render_thumbnail(original, max_edge).map_err(to_js_error)?
            }
        };
        Ok(JsDecodedImage::from_decoded(image))
    }

    /// Change the ratio selection and apply it to `cropper` if one is open.
    ///
    /// Returns the resolved `width / height`, or `undefined` for freeform.
    pub fn set_aspect_ratio(
        &mut self,
        ratio: &str,
        orientation: &str,
        cropper: Option<Cropper>,
    ) -> Result<Option<f64>, JsValue> {
        let spec = parse_selection(ratio, orientation).map_err(to_js_error)?;
        let resolved = self.workspace.set_aspect_spec(spec);
        if let Some(mut cropper) = cropper {
            cropper.set_aspect_ratio(resolved);
        }
        Ok(resolved.value())
    }

    /// Id of the image under edit.
    #[wasm_bindgen(getter)]
    pub fn editing(&self) -> Option<String> {
        self.workspace.editing().map(|id| id.to_string())
    }

    /// Start editing `id`. Build the cropper for it next, then call `ready`.
    pub fn open(&mut self, id: &str) -> Result<(), JsValue> {
        let id = parse_id(id).map_err(to_js_error)?;
        self.workspace.open(id).map(drop).map_err(to_js_error)
    }

    /// The cropper's `ready` event: restores the saved crop, then syncs the fields.
    pub fn ready(&mut self, cropper: &Cropper) -> Result<(), JsValue> {
        let mut widget = cropper.clone();
        widget.set_aspect_ratio(self.workspace.aspect_ratio());
        self.workspace.ready(&mut widget).map_err(to_js_error)
    }

    /// The cropper's `crop` event. Returns whether the fields changed.
    pub fn crop_changed(&mut self, cropper: &Cropper) -> bool {
        self.workspace.widget_changed(cropper)
    }

    /// `{ width, height, x, y }` of the session, or `undefined` without one.
    pub fn fields(&self) -> Result<JsValue, JsValue> {
        match self.workspace.session() {
            Some(session) => serde_wasm_bindgen::to_value(&session.fields()).map_err(to_js_error),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Width typed into its field. Returns the push token to acknowledge
    /// once the cropper's own `crop` event has fired.
    pub fn edit_width(&mut self, cropper: &Cropper, text: &str) -> Result<Option<f64>, JsValue> {
        self.edit_field(cropper, text, Workspace::edit_width::<Cropper>)
    }

    pub fn edit_height(&mut self, cropper: &Cropper, text: &str) -> Result<Option<f64>, JsValue> {
        self.edit_field(cropper, text, Workspace::edit_height::<Cropper>)
    }

    pub fn edit_x(&mut self, cropper: &Cropper, text: &str) -> Result<Option<f64>, JsValue> {
        self.edit_field(cropper, text, Workspace::edit_x::<Cropper>)
    }

    pub fn edit_y(&mut self, cropper: &Cropper, text: &str) -> Result<Option<f64>, JsValue> {
        self.edit_field(cropper, text, Workspace::edit_y::<Cropper>)
    }

    /// Lift field suppression for `token`. Stale tokens are ignored.
    pub fn acknowledge(&mut self, token: f64) -> bool {
        self.workspace.acknowledge(PushToken::from_u64(token as u64))
    }

    pub fn reset(&mut self, cropper: &Cropper) -> Result<bool, JsValue> {
        let mut widget = cropper.clone();
        self.workspace.reset(&mut widget).map_err(to_js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn has_next(&self) -> bool {
        self.workspace.has_next()
    }

    #[wasm_bindgen(getter)]
    pub fn has_previous(&self) -> bool {
        self.workspace.has_previous()
    }

    /// Save the crop and end the session.
    pub fn close(&mut self, cropper: &Cropper) -> Result<(), JsValue> {
        self.workspace.close(cropper).map(drop).map_err(to_js_error)
    }

    /// Save, then move on. Returns the id now being edited, or `undefined`
    /// once past the last image.
    pub fn next(&mut self, cropper: &Cropper) -> Result<Option<String>, JsValue> {
        let navigation = self.workspace.next(cropper).map_err(to_js_error)?;
        Ok(self.target_of(navigation))
    }

    /// Save, then move back. On the first image the same id comes back.
    pub fn previous(&mut self, cropper: &Cropper) -> Result<Option<String>, JsValue> {
        let navigation = self.workspace.previous(cropper).map_err(to_js_error)?;
        Ok(self.target_of(navigation))
    }

    /// Replace the export options. Missing fields keep their defaults.
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        self.options = if options.is_undefined() || options.is_null() {
            ExportOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(to_js_error)?
        };
        Ok(())
    }

    pub fn archive_name(&self) -> String {
        self.options.archive_name.clone()
    }

    /// Build the zip archive from every image's original bytes.
    pub fn export_archive(&self) -> Result<JsExportResult, JsValue> {
        let result = self.build().map_err(to_js_error)?;
        for failure in result.failed_images() {
            web_sys::console::warn_1(&JsValue::from_str(&format!(
                "Skipped {}: {}",
                failure.file_name, failure.reason
            )));
        }
        web_sys::console::log_1(&JsValue::from_str(&result.summary()));
        Ok(result)
    }
}

impl JsWorkspace {
    pub(crate) fn id_strings(&self) -> Vec<String> {
        self.workspace
            .images()
            .ids()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub(crate) fn build(&self) -> Result<JsExportResult, ExportError> {
        let outcome = build_archive(self.workspace.images(), &self.options, None)?;
        Ok(JsExportResult::from_outcome(outcome, &self.options.archive_name))
    }

    fn edit_field(
        &mut self,
        cropper: &Cropper,
        text: &str,
        edit: FieldEdit,
    ) -> Result<Option<f64>, JsValue> {
        let mut widget = cropper.clone();
        let token = edit(&mut self.workspace, &mut widget, parse_field_input(text))
            .map_err(to_js_error)?;
        Ok(token.map(|t| t.as_u64() as f64))
    }

    fn target_of(&self, navigation: Navigation) -> Option<String> {
        match navigation {
            Navigation::Moved(id) => Some(id.to_string()),
            Navigation::Stayed => self.editing(),
            Navigation::Closed => None,
        }
    }
}

fn parse_id(id: &str) -> Result<ImageId, CollectionError> {
    id.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkcrop_core::decode::DecodedImage;
    use bulkcrop_core::{AspectRatio, CropDescriptor, HeadlessCropper};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// Save a crop through the session the way the page would, with a
    /// headless stand-in for the cropper.
    fn save_with_headless(ws: &mut JsWorkspace, id: &str, width: u32, height: u32) {
        ws.open(id).unwrap();
        let inner = &mut ws.workspace;
        let blank = DecodedImage::blank(width, height);
        let mut widget = HeadlessCropper::new(blank, AspectRatio::Freeform);
        inner.ready(&mut widget).unwrap();
        inner.close(&widget).unwrap();
    }

    #[test]
    fn test_add_assigns_ordered_ids() {
        let mut ws = JsWorkspace::new(None);
        let a = ws.add("a.png".into(), "image/png".into(), png(4, 4));
        let b = ws.add("b.png".into(), "image/png".into(), png(4, 4));

        assert_eq!(ws.length(), 2);
        assert_eq!(ws.id_strings(), vec![a, b.clone()]);
        assert_eq!(ws.file_name(&b).as_deref(), Some("b.png"));
    }

    #[test]
    fn test_unknown_id_lookups() {
        let ws = JsWorkspace::new(None);
        assert!(ws.crop("img-7").is_none());
        assert!(ws.file_name("garbage").is_none());
    }

    #[test]
    fn test_accepted_types() {
        assert_eq!(
            JsWorkspace::accepted_types(),
            "image/png,image/jpeg,image/webp"
        );
    }

    #[test]
    fn test_session_lifecycle_without_widget() {
        let mut ws = JsWorkspace::new(None);
        let a = ws.add("a.png".into(), "image/png".into(), png(10, 10));
        ws.add("b.png".into(), "image/png".into(), png(10, 10));

        ws.open(&a).unwrap();
        assert_eq!(ws.editing(), Some(a.clone()));
        assert!(ws.has_next());
        assert!(!ws.has_previous());
    }

    #[test]
    fn test_saved_crop_visible_through_bindings() {
        let mut ws = JsWorkspace::new(Some(8));
        let id = ws.add("a.png".into(), "image/png".into(), png(20, 10));
        save_with_headless(&mut ws, &id, 20, 10);

        let crop: CropDescriptor = ws.crop(&id).unwrap().into();
        assert!(crop.fits_within(20, 10));
        let thumb = ws.thumbnail(&id, 100).unwrap();
        assert_eq!(thumb.width().max(thumb.height()), 8);
    }

    #[test]
    fn test_build_empty_workspace() {
        let result = JsWorkspace::new(None).build().unwrap();
        assert_eq!(result.status(), "empty");
    }

    #[test]
    fn test_build_complete_archive() {
        let mut ws = JsWorkspace::new(None);
        let id = ws.add("a.png".into(), "image/png".into(), png(20, 20));
        ws.add("b.png".into(), "image/png".into(), png(8, 8));
        save_with_headless(&mut ws, &id, 20, 20);

        let result = ws.build().unwrap();
        assert_eq!(result.status(), "complete");
        assert_eq!(result.summary(), "Exported 2 images");
        assert_eq!(result.archive_name(), "cropped_images.zip");
        assert!(!result.archive().is_empty());
    }

    #[test]
    fn test_build_reports_all_failed() {
        let mut ws = JsWorkspace::new(None);
        let id = ws.add("bad.png".into(), "image/png".into(), vec![1, 2, 3]);
        save_with_headless(&mut ws, &id, 4, 4);

        let result = ws.build().unwrap();
        assert_eq!(result.status(), "all_failed");
        assert_eq!(result.failed_images().len(), 1);
        assert_eq!(result.failed_images()[0].id, id);
    }

    #[test]
    fn test_clear() {
        let mut ws = JsWorkspace::new(None);
        ws.add("a.png".into(), "image/png".into(), png(2, 2));
        assert_eq!(ws.clear(), 1);
        assert_eq!(ws.length(), 0);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use crate::cropper::wasm_tests::fake_cropper;
    use std::io::Cursor;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 120, 240]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[wasm_bindgen_test]
    fn test_square_crop_through_cropper() {
        let mut ws = JsWorkspace::new(None);
        let first = ws.add("a.png".into(), "image/png".into(), png(1000, 800));
        let second = ws.add("b.png".into(), "image/png".into(), png(50, 50));

        let cropper = fake_cropper(1000, 800);
        let ratio = ws.set_aspect_ratio("1/1", "portrait", None).unwrap();
        assert_eq!(ratio, Some(1.0));

        ws.open(&first).unwrap();
        ws.ready(&cropper).unwrap();

        let token = ws.edit_width(&cropper, "400px").unwrap().unwrap();
        // The cropper's own crop event is ignored until the token comes back.
        assert!(!ws.crop_changed(&cropper));
        assert!(ws.acknowledge(token));

        let fields: bulkcrop_core::CropFields =
            serde_wasm_bindgen::from_value(ws.fields().unwrap()).unwrap();
        assert_eq!((fields.width, fields.height), (400, 400));

        assert_eq!(ws.next(&cropper).unwrap(), Some(second));
        assert_eq!(ws.crop(&first), Some(JsCropDescriptor::new(0, 0, 400, 400)));

        let result = ws.export_archive().unwrap();
        assert_eq!(result.status(), "complete");
    }

    #[wasm_bindgen_test]
    fn test_export_reports_all_failed() {
        let mut ws = JsWorkspace::new(None);
        let id = ws.add("bad.png".into(), "image/png".into(), vec![1, 2, 3]);

        let cropper = fake_cropper(4, 4);
        ws.open(&id).unwrap();
        ws.ready(&cropper).unwrap();
        ws.close(&cropper).unwrap();

        let result = ws.export_archive().unwrap();
        assert_eq!(result.status(), "all_failed");
        assert_eq!(result.summary(), "All 1 images failed to export");
        let failures = js_sys::Array::from(&result.failures().unwrap());
        assert_eq!(failures.length(), 1);
    }

    #[wasm_bindgen_test]
    fn test_export_empty() {
        let result = JsWorkspace::new(None).export_archive().unwrap();
        assert_eq!(result.status(), "empty");
        assert!(result.archive().is_empty());
    }

    #[wasm_bindgen_test]
    fn test_previous_on_first_stays() {
        let mut ws = JsWorkspace::new(None);
        let id = ws.add("a.png".into(), "image/png".into(), png(10, 10));
        let cropper = fake_cropper(10, 10);

        ws.open(&id).unwrap();
        ws.ready(&cropper).unwrap();
        assert_eq!(ws.previous(&cropper).unwrap(), Some(id.clone()));
        assert!(ws.crop(&id).is_some());
        ws.close(&cropper).unwrap();
        assert!(ws.editing().is_none());
    }

    #[wasm_bindgen_test]
    fn test_set_options_partial() {
        let mut ws = JsWorkspace::new(None);
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"archive_name".into(), &"mine.zip".into()).unwrap();
        ws.set_options(options.into()).unwrap();
        assert_eq!(ws.archive_name(), "mine.zip");
    }

    #[wasm_bindgen_test]
    fn test_remove_unknown_id_fails() {
        let mut ws = JsWorkspace::new(None);
        assert!(ws.remove("img-3").is_err());
        assert!(ws.remove("not-an-id").is_err());
    }
}
