//! Individual drawing steps. Each step checks its inputs before touching the
//! image, so a failed step leaves the image exactly as it found it.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use thiserror::Error;

#[allow(unused_imports)]
use log::{debug, warn};

use super::color::{Channels, ColorRole};
use super::font::LabelFont;
use super::geometry::PixelRect;
use super::style::ChannelOrder;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotateError {
    #[error("channel {index} has value {value}, expected a whole number in 0..=255")]
    InvalidChannel { index: usize, value: f64 },
    #[error("rectangle {0:?} has its second corner before its first")]
    InvertedRect(PixelRect),
}

/// Run a step with `color`; on failure retry once with the role's fallback,
/// and if that fails too, skip the step.
pub(crate) fn with_fallback<F>(step: &str, role: ColorRole, color: Channels, mut paint: F)
where
    F: FnMut(Channels) -> Result<(), AnnotateError>,
{
    let Err(e) = paint(color) else {
        return;
    };
    warn!("{} failed: {}, color={:?}; retrying with {:?}", step, e, color.0, role.fallback().0);
    if let Err(e) = paint(role.fallback()) {
        warn!("{} skipped: {}", step, e);
    }
}

/// Fill the inclusive span (x0, y0)..=(x1, y1), clipped to the image
fn fill_span(image: &mut RgbImage, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let cx0 = x0.max(0);
    let cy0 = y0.max(0);
    let cx1 = x1.min(w - 1);
    let cy1 = y1.min(h - 1);
    if cx0 > cx1 || cy0 > cy1 {
        return;
    }
    let rect = Rect::at(cx0 as i32, cy0 as i32).of_size((cx1 - cx0 + 1) as u32, (cy1 - cy0 + 1) as u32);
    draw_filled_rect_mut(image, rect, color);
}

fn check_upright(rect: PixelRect) -> Result<(), AnnotateError> {
    if rect.is_inverted() {
        return Err(AnnotateError::InvertedRect(rect));
    }
    Ok(())
}

/// Blend `color` over the whole rectangle with the given opacity
pub(crate) fn fill(
    image: &mut RgbImage,
    rect: PixelRect,
    color: Channels,
    alpha: f32,
    order: ChannelOrder,
) -> Result<(), AnnotateError> {
    let pixel = color.to_pixel(order)?;
    check_upright(rect)?;
    let a = (255.0 * alpha.min(1.0)).floor() as u32;
    let x0 = (rect.x1 as i64).max(0);
    let y0 = (rect.y1 as i64).max(0);
    let x1 = (rect.x2 as i64).min(image.width() as i64 - 1);
    let y1 = (rect.y2 as i64).min(image.height() as i64 - 1);
    if x0 > x1 || y0 > y1 {
        return Ok(());
    }
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dst = image.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let blended = (dst.0[c] as u32 * (255 - a) + pixel.0[c] as u32 * a + 127) / 255;
                dst.0[c] = blended as u8;
            }
        }
    }
    Ok(())
}

/// Concentric 1-pixel outlines, each inset one pixel from the previous
pub(crate) fn border(
    image: &mut RgbImage,
    rect: PixelRect,
    color: Channels,
    thickness: u32,
    order: ChannelOrder,
) -> Result<(), AnnotateError> {
    let pixel = color.to_pixel(order)?;
    check_upright(rect)?;
    for i in 0..thickness as i64 {
        let (x0, y0) = (rect.x1 as i64 + i, rect.y1 as i64 + i);
        let (x1, y1) = (rect.x2 as i64 - i, rect.y2 as i64 - i);
        if x0 > x1 || y0 > y1 {
            break;
        }
        fill_span(image, x0, y0, x1, y0, pixel);
        fill_span(image, x0, y1, x1, y1, pixel);
        fill_span(image, x0, y0, x0, y1, pixel);
        fill_span(image, x1, y0, x1, y1, pixel);
    }
    Ok(())
}

/// Two arms per corner, `arm` pixels long counting the corner pixel, thickness
/// growing toward the inside of the rectangle.
pub(crate) fn brackets(
    image: &mut RgbImage,
    rect: PixelRect,
    color: Channels,
    thickness: u32,
    order: ChannelOrder,
) -> Result<(), AnnotateError> {
    let pixel = color.to_pixel(order)?;
    check_upright(rect)?;
    let arm = rect.arm_length();
    let t = thickness as i64;
    if arm <= 0 || t == 0 {
        debug!("No corner arms to draw for {:?} (arm {}, thickness {})", rect, arm, t);
        return Ok(());
    }
    let (x1, y1, x2, y2) = (rect.x1 as i64, rect.y1 as i64, rect.x2 as i64, rect.y2 as i64);

    // top left
    fill_span(image, x1, y1, x1 + arm - 1, y1 + t - 1, pixel);
    fill_span(image, x1, y1, x1 + t - 1, y1 + arm - 1, pixel);
    // top right
    fill_span(image, x2 - arm + 1, y1, x2, y1 + t - 1, pixel);
    fill_span(image, x2 - t + 1, y1, x2, y1 + arm - 1, pixel);
    // bottom left
    fill_span(image, x1, y2 - t + 1, x1 + arm - 1, y2, pixel);
    fill_span(image, x1, y2 - arm + 1, x1 + t - 1, y2, pixel);
    // bottom right
    fill_span(image, x2 - arm + 1, y2 - t + 1, x2, y2, pixel);
    fill_span(image, x2 - t + 1, y2 - arm + 1, x2, y2, pixel);
    Ok(())
}

/// Where the label patch goes for a box whose top-left corner is (x1, y1)
pub(crate) fn label_patch(rect: PixelRect, font: &LabelFont, text: &str) -> PixelRect {
    let bounds = font.measure(text);
    let tx = (rect.x1 as i64).max(0);
    let ty = (rect.y1 as i64 - bounds.height as i64 - 2).max(0);
    let clamp = |v: i64| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
    PixelRect::new(
        clamp(tx),
        clamp(ty),
        clamp(tx + bounds.width as i64),
        clamp(ty + bounds.height as i64),
    )
}

pub(crate) fn label_background(
    image: &mut RgbImage,
    patch: PixelRect,
    color: Channels,
    order: ChannelOrder,
) -> Result<(), AnnotateError> {
    let pixel = color.to_pixel(order)?;
    fill_span(image, patch.x1 as i64, patch.y1 as i64, patch.x2 as i64, patch.y2 as i64, pixel);
    Ok(())
}

pub(crate) fn label_text(
    image: &mut RgbImage,
    font: &LabelFont,
    patch: PixelRect,
    text: &str,
    color: Channels,
    order: ChannelOrder,
) -> Result<(), AnnotateError> {
    let pixel = color.to_pixel(order)?;
    font.draw(image, patch.x1, patch.y1, text, pixel);
    Ok(())
}
