/// Label font: a scalable TrueType font found by file name, or the built-in
/// 8x8 bitmap font when that file is missing or unreadable.
///
/// The shared instance is loaded once per process and never changes afterwards.
use std::fs;
use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_text_mut;
use once_cell::sync::Lazy;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::config::CONFIG;

/// Pixel size of one bitmap font cell side before scaling
const BASIC_CELL: u32 = 8;
/// Scale applied to the bitmap font so labels stay readable
const BASIC_SCALE: u32 = 2;

static SHARED_FONT: Lazy<LabelFont> = Lazy::new(|| {
    LabelFont::load(&CONFIG.font_file, CONFIG.font_size, &CONFIG.font_dirs)
});

/// Measured extent of a rendered string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub width: u32,
    pub height: u32,
    /// Distance from the top of the text box to the baseline
    pub ascent: u32,
}

pub enum LabelFont {
    Scalable {
        font: FontVec,
        scale: PxScale,
        source: PathBuf,
    },
    Basic,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelFont::Scalable { scale, source, .. } => f
                .debug_struct("Scalable")
                .field("scale", &scale.y)
                .field("source", source)
                .finish(),
            LabelFont::Basic => f.write_str("Basic"),
        }
    }
}

impl LabelFont {
    /// The process-wide font used by the free annotation functions
    pub fn shared() -> &'static LabelFont {
        &SHARED_FONT
    }

    pub fn basic() -> Self {
        LabelFont::Basic
    }

    /// Look for `file_name` in each directory in order. Falls back to the
    /// bitmap font, never fails.
    pub fn load(file_name: &str, size: f32, dirs: &[PathBuf]) -> Self {
        for dir in dirs {
            let candidate = dir.join(file_name);
            if !candidate.is_file() {
                continue;
            }
            match Self::from_file(&candidate, size) {
                Some(font) => {
                    info!("Loaded label font from {:?}", candidate);
                    return font;
                }
                None => warn!("Could not parse font file {:?}, trying next location", candidate),
            }
        }
        info!("Font {} not found, using built-in bitmap font", file_name);
        LabelFont::Basic
    }

    pub fn from_file(path: &Path, size: f32) -> Option<Self> {
        let data = fs::read(path).ok()?;
        let font = FontVec::try_from_vec(data).ok()?;
        Some(LabelFont::Scalable {
            font,
            scale: PxScale::from(size),
            source: path.to_path_buf(),
        })
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, LabelFont::Scalable { .. })
    }

    /// Bounds of `text` using the font's vertical metrics, so the box covers
    /// ascenders and descenders even when the string has neither.
    pub fn measure(&self, text: &str) -> TextBounds {
        match self {
            LabelFont::Scalable { font, scale, .. } => {
                let scaled = font.as_scaled(*scale);
                let mut width = 0f32;
                let mut last = None;
                for c in text.chars() {
                    let id = scaled.glyph_id(c);
                    if let Some(prev) = last {
                        width += scaled.kern(prev, id);
                    }
                    width += scaled.h_advance(id);
                    last = Some(id);
                }
                let ascent = scaled.ascent().ceil().max(0.0);
                let height = (scaled.ascent() - scaled.descent()).ceil().max(0.0);
                TextBounds {
                    width: width.ceil().max(0.0) as u32,
                    height: height as u32,
                    ascent: ascent as u32,
                }
            }
            LabelFont::Basic => {
                let side = BASIC_CELL * BASIC_SCALE;
                TextBounds {
                    width: side.saturating_mul(text.chars().count() as u32),
                    height: side,
                    ascent: side,
                }
            }
        }
    }

    /// Render `text` with its top-left corner at (x, y). Pixels outside the
    /// image are dropped.
    pub fn draw(&self, image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        // glyph placement adds offsets to the origin in i32, so origins whose
        // text cannot reach the image are skipped before rendering
        let bounds = self.measure(text);
        let (x, y) = (x as i64, y as i64);
        if x >= image.width() as i64
            || y >= image.height() as i64
            || x + (bounds.width as i64) < 0
            || y + (bounds.height as i64) < 0
        {
            debug!("Label {:?} at ({}, {}) is outside the image, not drawn", text, x, y);
            return;
        }
        let (x, y) = (x as i32, y as i32);
        match self {
            LabelFont::Scalable { font, scale, .. } => {
                draw_text_mut(image, color, x, y, *scale, font, text);
            }
            LabelFont::Basic => draw_basic_text(image, x, y, text, color),
        }
    }
}

fn draw_basic_text(image: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
    let side = (BASIC_CELL * BASIC_SCALE) as i64;
    for (i, c) in text.chars().enumerate() {
        let origin_x = x as i64 + i as i64 * side;
        let rows = BASIC_FONTS.get(c).unwrap_or_else(missing_glyph);
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..BASIC_CELL as usize {
                if bits & (1 << col) == 0 {
                    continue;
                }
                // each font bit becomes a BASIC_SCALE x BASIC_SCALE block
                for dy in 0..BASIC_SCALE as i64 {
                    for dx in 0..BASIC_SCALE as i64 {
                        let px = origin_x + col as i64 * BASIC_SCALE as i64 + dx;
                        let py = y as i64 + row as i64 * BASIC_SCALE as i64 + dy;
                        put_clipped(image, px, py, color);
                    }
                }
            }
        }
    }
}

/// Hollow box drawn for characters the bitmap font does not cover
fn missing_glyph() -> [u8; 8] {
    [0x00, 0x7e, 0x42, 0x42, 0x42, 0x42, 0x7e, 0x00]
}

pub(crate) fn put_clipped(image: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    image.put_pixel(x as u32, y as u32, color);
}

/// Default places to look for the label font
pub fn default_font_dirs() -> Vec<PathBuf> {
    let mut search = vec![PathBuf::from("."), PathBuf::from("assets/fonts")];
    if let Some(user_fonts) = dirs::font_dir() {
        search.push(user_fonts);
    }
    for system in [
        "/usr/share/fonts/truetype/msttcorefonts",
        "/usr/share/fonts/TTF",
        "/Library/Fonts",
        "/System/Library/Fonts/Supplemental",
        "C:\\Windows\\Fonts",
    ] {
        search.push(PathBuf::from(system));
    }
    search
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dejavu() -> LabelFont {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/DejaVuSans.ttf");
        LabelFont::from_file(&path, 20.0).unwrap()
    }

    #[test]
    fn test_load_finds_bundled_font() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/fonts");
        let font = LabelFont::load("DejaVuSans.ttf", 20.0, &[PathBuf::from("/no/such/dir"), dir]);
        assert!(font.is_scalable());
    }

    #[test]
    fn test_scalable_measure_uses_font_metrics() {
        let font = dejavu();
        let LabelFont::Scalable { font: inner, scale, .. } = &font else {
            panic!("expected a scalable font");
        };
        let scaled = inner.as_scaled(*scale);

        let bounds = font.measure("Hj");
        assert_eq!(bounds.height, (scaled.ascent() - scaled.descent()).ceil() as u32);
        assert_eq!(bounds.ascent, scaled.ascent().ceil() as u32);
        assert!(bounds.height > 0);

        // width grows with the text and does not depend on ink
        let one = font.measure("H").width;
        assert!(one > 0);
        assert!(bounds.width > one);
        assert_eq!(font.measure("").width, 0);
        assert_eq!(font.measure(" ").height, bounds.height);
    }

    #[test]
    fn test_scalable_draw_stays_inside_measured_box() {
        let font = dejavu();
        let mut image = RgbImage::new(100, 60);
        let bounds = font.measure("Hj");
        font.draw(&mut image, 10, 5, "Hj", Rgb([255, 255, 255]));

        let mut inked = 0;
        for (x, y, p) in image.enumerate_pixels() {
            if *p == Rgb([0, 0, 0]) {
                continue;
            }
            inked += 1;
            assert!(
                (10..=10 + bounds.width).contains(&x) && (5..=5 + bounds.height).contains(&y),
                "text pixel ({}, {}) outside {:?}",
                x,
                y,
                bounds
            );
        }
        assert!(inked > 0);
    }

    #[test]
    fn test_draw_far_outside_image_is_skipped() {
        let font = dejavu();
        let mut image = RgbImage::new(20, 20);
        font.draw(&mut image, i32::MAX - 1, 5, "Wj", Rgb([255, 255, 255]));
        font.draw(&mut image, 5, i32::MAX, "Wj", Rgb([255, 255, 255]));
        font.draw(&mut image, i32::MIN, i32::MIN, "Wj", Rgb([255, 255, 255]));
        LabelFont::basic().draw(&mut image, i32::MAX, 0, "Wj", Rgb([255, 255, 255]));
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_missing_font_falls_back_to_basic() {
        let dir = tempfile::tempdir().unwrap();
        let font = LabelFont::load("no-such-font.ttf", 20.0, &[dir.path().to_path_buf()]);
        assert!(!font.is_scalable());
    }

    #[test]
    fn test_unparsable_font_falls_back_to_basic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("arial.ttf"), b"not a font").unwrap();
        let font = LabelFont::load("arial.ttf", 20.0, &[dir.path().to_path_buf()]);
        assert!(!font.is_scalable());
    }

    #[test]
    fn test_basic_measure() {
        let font = LabelFont::basic();
        let bounds = font.measure("AB");
        assert_eq!(bounds, TextBounds { width: 32, height: 16, ascent: 16 });
        assert_eq!(font.measure("").width, 0);
    }

    #[test]
    fn test_basic_draw_is_clipped() {
        let mut image = RgbImage::new(10, 10);
        let font = LabelFont::basic();
        font.draw(&mut image, -4, -4, "X", Rgb([255, 255, 255]));
        font.draw(&mut image, 8, 8, "X", Rgb([255, 255, 255]));
        assert!(image.pixels().any(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn test_missing_glyph_draws_box() {
        let mut image = RgbImage::new(16, 16);
        LabelFont::basic().draw(&mut image, 0, 0, "车", Rgb([9, 9, 9]));
        // top edge of the hollow box: row 1 scaled, columns 1..=6 scaled
        assert_eq!(*image.get_pixel(2, 2), Rgb([9, 9, 9]));
        assert_eq!(*image.get_pixel(0, 0), Rgb([0, 0, 0]));
    }
}
