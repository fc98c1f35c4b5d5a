//! Reports a rendered element's on-screen frame back into caller-owned state.
//!
//! Measurements taken during a layout pass are only recorded; they are
//! written on the next tick. Writing mid-layout would invalidate the layout
//! that produced the measurement and loop forever.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::trace;

/// Axis-aligned rectangle in global coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Same rect with non-negative width and height.
    pub fn standardized(&self) -> Self {
        let (x, width) = if self.width < 0.0 {
            (self.x + self.width, -self.width)
        } else {
            (self.x, self.width)
        };
        let (y, height) = if self.height < 0.0 {
            (self.y + self.height, -self.height)
        } else {
            (self.y, self.height)
        };
        Self::new(x, y, width, height)
    }

    /// Smallest integer-aligned rect containing this one.
    pub fn integral(&self) -> Self {
        let rect = self.standardized();
        let min_x = rect.x.floor();
        let min_y = rect.y.floor();
        let max_x = (rect.x + rect.width).ceil();
        let max_y = (rect.y + rect.height).ceil();
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

/// Caller-supplied state the measured frame is written into.
pub type FrameBinding = watch::Sender<Rect>;

/// Publishes the measured frame of a view into a [`FrameBinding`].
pub struct FrameGetter {
    binding: FrameBinding,
    pending: Mutex<Option<Rect>>,
}

impl FrameGetter {
    pub fn new(binding: FrameBinding) -> Self {
        Self {
            binding,
            pending: Mutex::new(None),
        }
    }

    /// Records a measurement from the current layout pass.
    pub fn on_layout(&self, measured: Rect) {
        *self.pending.lock() = Some(measured);
    }

    /// Applies the latest recorded measurement.
    ///
    /// Returns `true` if the binding was updated. Measurements that round to
    /// the same integral rect as the current value are dropped so watchers
    /// are not woken for sub-pixel jitter.
    pub fn flush(&self) -> bool {
        let Some(rect) = self.pending.lock().take() else {
            return false;
        };

        let updated = self.binding.send_if_modified(|current| {
            if current.integral() == rect.integral() {
                return false;
            }
            *current = rect;
            true
        });
        trace!(?rect, updated, "Frame flushed");
        updated
    }

    /// Records a measurement and applies it on a later tick of the runtime.
    pub fn report(self: &Arc<Self>, measured: Rect) -> tokio::task::JoinHandle<bool> {
        self.on_layout(measured);
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            this.flush()
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Rect> {
        self.binding.subscribe()
    }
}
