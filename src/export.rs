use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, bail};
use eframe::egui::{ColorImage, Rect, pos2};

/// Encode a screenshot region as PNG bytes.
pub fn encode_png(image: &ColorImage) -> Result<Vec<u8>> {
    let [w, h] = image.size;
    let rgba: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
    let buffer = image::RgbaImage::from_raw(w as u32, h as u32, rgba)
        .context("pixel buffer does not match image size")?;

    let mut bytes = Vec::new();
    buffer
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .context("encoding PNG")?;
    Ok(bytes)
}

/// Cut `rect` (in points) out of a screenshot.
///
/// The rect is clamped to the captured image in whole pixels, since
/// `ColorImage::region` does no bounds checking of its own.
pub fn crop(screenshot: &ColorImage, rect: Rect, pixels_per_point: f32) -> Result<ColorImage> {
    let [w, h] = screenshot.size;
    let to_px = |v: f32, limit: usize| ((v * pixels_per_point).round().max(0.0) as usize).min(limit);
    let (x0, x1) = (to_px(rect.min.x, w), to_px(rect.max.x, w));
    let (y0, y1) = (to_px(rect.min.y, h), to_px(rect.max.y, h));
    if x0 >= x1 || y0 >= y1 {
        bail!("chart area {rect:?} is outside the captured {w}x{h} image");
    }

    let pixels = Rect::from_min_max(pos2(x0 as f32, y0 as f32), pos2(x1 as f32, y1 as f32));
    Ok(screenshot.region(&pixels, None))
}

/// Crop a full-window screenshot to `rect` (in points) and write it as PNG.
pub fn save_region(
    screenshot: &ColorImage,
    rect: Rect,
    pixels_per_point: f32,
    path: &Path,
) -> Result<()> {
    let region = crop(screenshot, rect, pixels_per_point)?;
    let bytes = encode_png(&region)?;
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!(
        "Saved {}x{} chart to {}",
        region.size[0],
        region.size[1],
        path.display()
    );
    Ok(())
}
