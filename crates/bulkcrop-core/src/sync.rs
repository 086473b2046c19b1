//! Two-way synchronization between the numeric crop fields and the widget.
//!
//! The editor shows four integer fields (width, height, position X, position Y).
//! They must track the widget's live rectangle, and typing into them must move
//! the widget, without the two directions feeding back into each other.
//!
//! # Directions
//!
//! - **Pull** (widget to fields): on every widget change notification the
//!   rectangle is rounded and copied into the fields.
//! - **Push** (fields to widget): an edited field is written to the widget.
//!   With a fixed aspect ratio, editing one dimension recomputes the other.
//!
//! # Suppression
//!
//! A push makes the widget emit its own change notification. Pulling on that
//! notification would overwrite the field the user is typing in, so every push
//! moves the synchronizer into `Pushing(token)`. Change notifications are
//! ignored until the host acknowledges that token. An older token can never
//! lift the suppression of a newer push.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aspect::AspectRatio;
use crate::descriptor::CropRect;
use crate::widget::CropWidget;

/// Values of the four editable crop fields.
///
/// Signed: the fields hold whatever the user typed, including values the
/// widget would reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropFields {
    pub width: i64,
    pub height: i64,
    pub x: i64,
    pub y: i64,
}

/// Identifies one push to the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PushToken(u64);

impl PushToken {
    /// Numeric form, for hosts that carry the token outside Rust.
    pub fn as_u64(self) -> u64 {
        self.0
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }
}

/// Synchronizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// The widget has not signaled readiness; nothing is pulled or pushed.
    Uninitialized,
    /// Pulls are applied.
    Idle,
    /// A push is awaiting acknowledgement; pulls are suppressed.
    Pushing(PushToken),
}

/// Keeps [`CropFields`] and a [`CropWidget`] consistent.
#[derive(Debug, Clone)]
pub struct CropFieldSynchronizer {
    fields: CropFields,
    ratio: AspectRatio,
    state: SyncState,
    next_token: u64,
}

impl CropFieldSynchronizer {
    pub fn new(ratio: AspectRatio) -> Self {
        Self {
            fields: CropFields::default(),
            ratio,
            state: SyncState::Uninitialized,
            next_token: 0,
        }
    }

    pub fn fields(&self) -> CropFields {
        self.fields
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn ratio(&self) -> AspectRatio {
        self.ratio
    }

    pub fn set_ratio(&mut self, ratio: AspectRatio) {
        self.ratio = ratio;
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self.state, SyncState::Uninitialized)
    }

    /// Handle the widget's one-time ready signal and pull its rectangle.
    pub fn ready<W: CropWidget + ?Sized>(&mut self, widget: &W) {
        self.state = SyncState::Idle;
        self.pull(widget);
    }

    /// Handle a widget change notification.
    ///
    /// Returns `true` if the fields were updated.
    pub fn widget_changed<W: CropWidget + ?Sized>(&mut self, widget: &W) -> bool {
        if self.state != SyncState::Idle {
            trace!(state = ?self.state, "change notification suppressed");
            return false;
        }
        self.pull(widget);
        true
    }

    /// Lift suppression for `token` if it is the latest push.
    ///
    /// Returns `false` for stale or unknown tokens.
    pub fn acknowledge(&mut self, token: PushToken) -> bool {
        if self.state == SyncState::Pushing(token) {
            self.state = SyncState::Idle;
            true
        } else {
            false
        }
    }

    /// User typed a new width.
    ///
    /// With a fixed ratio the height field follows: `height = round(width / ratio)`.
    /// Non-positive widths are kept in the field but not pushed.
    pub fn edit_width<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        width: i64,
    ) -> Option<PushToken> {
        self.fields.width = width;
        if width <= 0 || !self.is_ready() {
            return None;
        }

        let mut rect = widget.rectangle();
        rect.width = width as f64;
        if let AspectRatio::Fixed(r) = self.ratio {
            let height = (width as f64 / r).round();
            self.fields.height = height as i64;
            rect.height = height;
        }
        Some(self.push(widget, rect))
    }

    /// User typed a new height.
    ///
    /// With a fixed ratio the width field follows: `width = round(height * ratio)`.
    pub fn edit_height<W: CropWidget + ?Sized>(
        &mut self,
        widget: &mut W,
        height: i64,
    ) -> Option<PushToken> {
        self.fields.height = height;
        if height <= 0 || !self.is_ready() {
            return None;
        }

        let mut rect = widget.rectangle();
        rect.height = height as f64;
        if let AspectRatio::Fixed(r) = self.ratio {
            let width = (height as f64 * r).round();
            self.fields.width = width as i64;
            rect.width = width;
        }
        Some(self.push(widget, rect))
    }

    pub fn edit_x<W: CropWidget + ?Sized>(&mut self, widget: &mut W, x: i64) -> Option<PushToken> {
        self.fields.x = x;
        if !self.is_ready() {
            return None;
        }
        let mut rect = widget.rectangle();
        rect.x = x as f64;
        Some(self.push(widget, rect))
    }

    pub fn edit_y<W: CropWidget + ?Sized>(&mut self, widget: &mut W, y: i64) -> Option<PushToken> {
        self.fields.y = y;
        if !self.is_ready() {
            return None;
        }
        let mut rect = widget.rectangle();
        rect.y = y as f64;
        Some(self.push(widget, rect))
    }

    /// Reset the widget to its default rectangle and resync the fields.
    pub fn reset<W: CropWidget + ?Sized>(&mut self, widget: &mut W) -> bool {
        if !self.is_ready() {
            return false;
        }
        widget.reset();
        self.state = SyncState::Idle;
        self.pull(widget);
        true
    }

    fn push<W: CropWidget + ?Sized>(&mut self, widget: &mut W, rect: CropRect) -> PushToken {
        let token = PushToken(self.next_token);
        self.next_token += 1;
        self.state = SyncState::Pushing(token);
        trace!(?token, ?rect, "pushing fields to widget");
        widget.set_rectangle(rect);
        token
    }

    fn pull<W: CropWidget + ?Sized>(&mut self, widget: &W) {
        let rounded = widget.rectangle().round();
        self.fields = CropFields {
            width: rounded.width,
            height: rounded.height,
            x: rounded.x,
            y: rounded.y,
        };
    }
}

/// Parse a field's text the way the editor's number inputs do.
///
/// Takes the leading integer (optional sign, then digits) and ignores the rest.
/// Anything without a leading integer is `0`.
pub fn parse_field_input(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value = digits[..end].parse::<i64>().unwrap_or(0);

    if negative {
        -value
    } else {
        value
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
