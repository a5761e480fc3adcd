//! One-time decode and north-alignment of floor images.
//!
//! Each floor owns a [`PreparedImage`] gate. The first caller loads the asset,
//! decodes it and rotates it; everyone else waits on the same cell and gets
//! the same `Arc`. Failures are stored in the cell too, so a broken asset is
//! reported to every caller until [`PreparedImage::reset`] is called.

use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use crate::error::AssetError;

use super::source::ImageSource;

/// Result stored in a floor's preparation gate.
pub type PreparedResult = Result<Arc<RgbaImage>, AssetError>;

/// Memoizing gate holding a floor's prepared image (or its failure).
#[derive(Default)]
pub struct PreparedImage {
    cell: Mutex<Arc<OnceCell<PreparedResult>>>,
}

impl PreparedImage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the prepared image, computing it on first use.
    ///
    /// Concurrent callers block until the first computation finishes and
    /// then share its result.
    pub async fn get_or_prepare<S>(
        &self,
        source: &S,
        image_ref: &str,
        rotation: f64,
    ) -> PreparedResult
    where
        S: ImageSource + ?Sized,
    {
        let cell = self.cell.lock().await.clone();
        cell.get_or_init(|| prepare_image(source, image_ref, rotation))
            .await
            .clone()
    }

    /// Whether a result (success or failure) has been recorded.
    pub async fn is_ready(&self) -> bool {
        self.cell.lock().await.initialized()
    }

    /// Drop the recorded result so the next caller prepares the image again.
    pub async fn reset(&self) {
        *self.cell.lock().await = Arc::new(OnceCell::new());
    }
}

impl fmt::Debug for PreparedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.try_lock() {
            Ok(cell) => match cell.get() {
                Some(Ok(img)) => format!("ready({}x{})", img.width(), img.height()),
                Some(Err(_)) => "failed".to_string(),
                None => "pending".to_string(),
            },
            Err(_) => "locked".to_string(),
        };
        f.debug_struct("PreparedImage").field("state", &state).finish()
    }
}

/// Load, decode and rotate a floor image.
pub async fn prepare_image<S>(source: &S, image_ref: &str, rotation: f64) -> PreparedResult
where
    S: ImageSource + ?Sized,
{
    debug!(image = image_ref, rotation, "Preparing floor image");

    let data = source.load(image_ref).await.map_err(|e| {
        warn!(image = image_ref, error = %e, "Failed to load floor image");
        e
    })?;

    let path = image_ref.to_string();
    let decoded = tokio::task::spawn_blocking(move || {
        let img = image::load_from_memory(&data)
            .map_err(|e| e.to_string())?
            .to_rgba8();
        Ok::<_, String>(rotate_about_center(&img, rotation))
    })
    .await;

    match decoded {
        Ok(Ok(img)) => {
            debug!(
                image = image_ref,
                width = img.width(),
                height = img.height(),
                "Prepared floor image"
            );
            Ok(Arc::new(img))
        }
        Ok(Err(message)) => Err(AssetError::Decode { path, message }),
        Err(join_err) => Err(AssetError::Decode {
            path,
            message: join_err.to_string(),
        }),
    }
}

/// Size of the canvas needed to hold a `width` x `height` image rotated by
/// `degrees` without clipping.
///
/// The four corners of the source canvas are rotated and the axis-aligned
/// bounding box of the results (origin included) is measured.
pub fn rotated_dimensions(width: f64, height: f64, degrees: f64) -> (f64, f64) {
    let (sin, cos) = degrees.to_radians().sin_cos();

    let corners = [
        (0.0, 0.0),
        (cos * width, sin * width),
        (-sin * height, cos * height),
        (cos * width - sin * height, sin * width + cos * height),
    ];

    let (mut min_x, mut max_x, mut min_y, mut max_y) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for (x, y) in corners {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }

    ((max_x - min_x).abs(), (max_y - min_y).abs())
}

/// Rotate an image by `degrees` about its center onto a canvas large enough
/// to contain the whole result.
///
/// Positive angles turn the image clockwise on screen (y grows downward).
/// Uncovered canvas pixels are transparent.
pub fn rotate_about_center(src: &RgbaImage, degrees: f64) -> RgbaImage {
    if degrees % 360.0 == 0.0 {
        return src.clone();
    }

    let (w, h) = (f64::from(src.width()), f64::from(src.height()));
    let (new_w, new_h) = rotated_dimensions(w, h, degrees);
    let (dst_w, dst_h) = (new_w.round().max(1.0) as u32, new_h.round().max(1.0) as u32);

    let (sin, cos) = degrees.to_radians().sin_cos();
    let (src_cx, src_cy) = (w / 2.0, h / 2.0);
    let (dst_cx, dst_cy) = (f64::from(dst_w) / 2.0, f64::from(dst_h) / 2.0);

    RgbaImage::from_fn(dst_w, dst_h, |dx, dy| {
        let u = f64::from(dx) + 0.5 - dst_cx;
        let v = f64::from(dy) + 0.5 - dst_cy;

        // Inverse rotation back into source space
        let sx = cos * u + sin * v + src_cx;
        let sy = -sin * u + cos * v + src_cy;

        sample_bilinear(src, sx - 0.5, sy - 0.5)
    })
}

/// Bilinear sample with alpha weighting; samples outside the image count as
/// fully transparent.
///
/// Colour channels are averaged over the covering taps only, so a floor's
/// anti-aliased edge keeps its own colour instead of fading toward black.
fn sample_bilinear(src: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (ix, iy) = (x0 as i64, y0 as i64);

    let taps = [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ];

    let mut acc = [0.0f64; 4];
    for (ox, oy, weight) in taps {
        if weight <= 0.0 {
            continue;
        }
        let (px, py) = (ix + ox, iy + oy);
        if px < 0 || py < 0 || px >= i64::from(src.width()) || py >= i64::from(src.height()) {
            continue;
        }

        let p = src.get_pixel(px as u32, py as u32).0;
        let alpha = f64::from(p[3]) * weight;
        acc[0] += f64::from(p[0]) * alpha;
        acc[1] += f64::from(p[1]) * alpha;
        acc[2] += f64::from(p[2]) * alpha;
        acc[3] += alpha;
    }

    if acc[3] <= f64::EPSILON {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(acc[0] / acc[3]),
        channel(acc[1] / acc[3]),
        channel(acc[2] / acc[3]),
        channel(acc[3]),
    ])
}
