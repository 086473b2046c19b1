//! The interactive crop widget contract and a headless implementation.
//!
//! While an editing session is ready, the widget owns the live crop rectangle.
//! The core reads and writes that rectangle only through [`CropWidget`]. The
//! widget's two notifications ("ready" once, "changed" on every drag, resize or
//! programmatic update) are delivered by the host, which forwards them to
//! [`crate::session::Workspace::ready`] and
//! [`crate::session::Workspace::widget_changed`].

use crate::aspect::AspectRatio;
use crate::decode::{render_thumbnail, DecodedImage};
use crate::descriptor::{CropDescriptor, CropRect};
use crate::transform::crop_region;

/// Operations the core needs from an interactive crop widget.
pub trait CropWidget {
    /// Natural dimensions of the image loaded in the widget.
    fn image_size(&self) -> (u32, u32);

    /// Current crop rectangle in natural image pixels.
    fn rectangle(&self) -> CropRect;

    /// Replace the crop rectangle. The widget may constrain it further
    /// (bounds, aspect ratio, minimum size).
    fn set_rectangle(&mut self, rect: CropRect);

    /// Return to the widget's default rectangle.
    fn reset(&mut self);

    /// Change the enforced aspect ratio.
    fn set_aspect_ratio(&mut self, ratio: AspectRatio);

    /// Render the current crop as a thumbnail no larger than `max_edge`.
    fn render_preview(&self, max_edge: u32) -> Option<DecodedImage>;
}

/// Fraction of the image the default crop box covers.
const AUTO_CROP_AREA: f64 = 0.8;

/// Smallest crop box side, in natural pixels.
const MIN_SIDE: f64 = 1.0;

/// A crop widget with no UI.
///
/// Behaves like the browser widget in its restricted view mode: the crop box
/// never leaves the image, a fixed aspect ratio is enforced on every update,
/// and the default box is centered and covers 80% of the largest box the
/// ratio allows.
#[derive(Debug, Clone)]
pub struct HeadlessCropper {
    image: DecodedImage,
    ratio: AspectRatio,
    rect: CropRect,
}

impl HeadlessCropper {
    pub fn new(image: DecodedImage, ratio: AspectRatio) -> Self {
        let mut cropper = Self {
            image,
            ratio,
            rect: CropRect::default(),
        };
        cropper.rect = cropper.default_rect();
        cropper
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn image(&self) -> &DecodedImage {
        &self.image
    }

    /// Centered box covering `AUTO_CROP_AREA` of the largest box allowed by the ratio.
    fn default_rect(&self) -> CropRect {
        let (iw, ih) = (self.image.width as f64, self.image.height as f64);
        let (mut w, mut h) = (iw, ih);

        if let AspectRatio::Fixed(r) = self.ratio {
            if iw / ih > r {
                w = ih * r;
            } else {
                h = iw / r;
            }
        }

        let w = (w * AUTO_CROP_AREA).max(MIN_SIDE);
        let h = (h * AUTO_CROP_AREA).max(MIN_SIDE);
        CropRect::new((iw - w) / 2.0, (ih - h) / 2.0, w, h)
    }

    /// Apply ratio, size and position limits to a requested rectangle.
    fn constrain(&self, requested: CropRect) -> CropRect {
        let (iw, ih) = (self.image.width as f64, self.image.height as f64);
        let mut w = requested.width.max(MIN_SIDE);
        let mut h = requested.height.max(MIN_SIDE);

        if let AspectRatio::Fixed(r) = self.ratio {
            // Width wins unless only the height was changed.
            if requested.width != self.rect.width || requested.height == self.rect.height {
                h = w / r;
            } else {
                w = h * r;
            }

            if w > iw {
                w = iw;
                h = w / r;
            }
            if h > ih {
                h = ih;
                w = h * r;
            }
        } else {
            w = w.min(iw);
            h = h.min(ih);
        }

        let x = requested.x.clamp(0.0, (iw - w).max(0.0));
        let y = requested.y.clamp(0.0, (ih - h).max(0.0));
        CropRect::new(x, y, w, h)
    }
}

impl CropWidget for HeadlessCropper {
    fn image_size(&self) -> (u32, u32) {
        (self.image.width, self.image.height)
    }

    fn rectangle(&self) -> CropRect {
        self.rect
    }

    fn set_rectangle(&mut self, rect: CropRect) {
        self.rect = self.constrain(rect);
    }

    fn reset(&mut self) {
        self.rect = self.default_rect();
    }

    fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.ratio = ratio;
        self.rect = self.default_rect();
    }

    fn render_preview(&self, max_edge: u32) -> Option<DecodedImage> {
        let region = capture_rect(self.rect, self.image.width, self.image.height)?
            .clamp_to(self.image.width, self.image.height)?;
        render_thumbnail(&crop_region(&self.image, region), max_edge).ok()
    }
}

/// Round a live rectangle and clamp it into the image.
///
/// Rounding each component separately can push `x + width` one pixel past the
/// edge, so the rounded rectangle is clamped again.
pub fn capture_rect(rect: CropRect, image_width: u32, image_height: u32) -> Option<CropDescriptor> {
    rect.round()
        .clamp_to(image_width, image_height)
        .map(|region| region.to_descriptor())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
