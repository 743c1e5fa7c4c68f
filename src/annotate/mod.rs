//! Bounding box annotation for detection results
//!
//! Two styles are available: a filled box with a solid border, and corner
//! brackets. Both can carry a text label on a solid patch above the box.
//! Every entry point returns a new image; the input is never modified.
//!
//! Annotation never fails. Bad geometry returns the image untouched, colors
//! of the wrong shape are replaced by defaults, and a drawing step that
//! cannot paint its color is retried once with the default for that step.
pub mod color;
pub mod draw;
pub mod font;
pub mod geometry;
pub mod style;

use image::RgbImage;

#[allow(unused_imports)]
use log::{debug, warn};

pub use color::{normalize_color, Channels, ColorInput, ColorRole, Normalized};
pub use draw::AnnotateError;
pub use font::{LabelFont, TextBounds};
pub use geometry::{Coord, PixelRect};
pub use style::{AnnotateStyle, ChannelOrder};

/// Which marker to draw around a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerStyle {
    #[default]
    FilledBox,
    CornerBrackets,
}

/// Style with every color already shape-checked
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub color: Channels,
    pub alpha: f32,
    pub label: Option<String>,
    pub label_color: Channels,
    pub label_background: Channels,
    pub line_thickness: u32,
    pub channel_order: ChannelOrder,
}

impl ResolvedStyle {
    pub fn resolve(style: &AnnotateStyle) -> Self {
        let color = normalize_color(Some(&style.color), ColorRole::Border);
        if color.was_substituted() {
            debug!("Box color {:?} is not an RGB triple, using {:?}", style.color.0, color.value().0);
        }
        let label_color = normalize_color(Some(&style.label_color), ColorRole::Text);
        if label_color.was_substituted() {
            debug!("Label color {:?} is not an RGB triple, using {:?}", style.label_color.0, label_color.value().0);
        }
        let label_background = match &style.label_background {
            Some(input) => normalize_color(Some(input), ColorRole::LabelBackground).value(),
            None => color.value(),
        };
        Self {
            color: color.value(),
            alpha: style.alpha,
            label: style.label.clone(),
            label_color: label_color.value(),
            label_background,
            line_thickness: style.line_thickness,
            channel_order: style.channel_order,
        }
    }
}

/// Draws annotations using a particular label font
#[derive(Debug, Clone, Copy)]
pub struct Annotator<'a> {
    font: &'a LabelFont,
}

impl Default for Annotator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator<'static> {
    /// Annotator backed by the process-wide font
    pub fn new() -> Self {
        Self { font: LabelFont::shared() }
    }
}

impl<'a> Annotator<'a> {
    pub fn with_font(font: &'a LabelFont) -> Self {
        Self { font }
    }

    pub fn font(&self) -> &'a LabelFont {
        self.font
    }

    /// Validated filled box: identity for missing or non-integer input
    pub fn filled_box(
        &self,
        image: Option<&RgbImage>,
        rect: Option<&[Coord]>,
        style: &AnnotateStyle,
    ) -> Option<RgbImage> {
        self.validated(image, rect, style, MarkerStyle::FilledBox)
    }

    /// Validated corner brackets: identity for missing or non-integer input
    pub fn corner_brackets(
        &self,
        image: Option<&RgbImage>,
        rect: Option<&[Coord]>,
        style: &AnnotateStyle,
    ) -> Option<RgbImage> {
        self.validated(image, rect, style, MarkerStyle::CornerBrackets)
    }

    pub fn annotate(
        &self,
        image: Option<&RgbImage>,
        rect: Option<&[Coord]>,
        style: &AnnotateStyle,
        marker: MarkerStyle,
    ) -> Option<RgbImage> {
        self.validated(image, rect, style, marker)
    }

    fn validated(
        &self,
        image: Option<&RgbImage>,
        rect: Option<&[Coord]>,
        style: &AnnotateStyle,
        marker: MarkerStyle,
    ) -> Option<RgbImage> {
        let image = image?;
        let Some(coords) = rect else {
            debug!("No rectangle given, returning image unchanged");
            return Some(image.clone());
        };
        let Some(rect) = PixelRect::from_coords(coords) else {
            debug!("Rectangle {:?} is not four integers, returning image unchanged", coords);
            return Some(image.clone());
        };
        let resolved = ResolvedStyle::resolve(style);
        Some(match marker {
            MarkerStyle::FilledBox => self.rect_box(image, rect, &resolved),
            MarkerStyle::CornerBrackets => self.rect_edge(image, rect, &resolved),
        })
    }

    /// Raw filled box: translucent fill, concentric border, then the label
    pub fn rect_box(&self, image: &RgbImage, rect: PixelRect, style: &ResolvedStyle) -> RgbImage {
        let mut out = image.clone();
        let order = style.channel_order;

        if style.alpha > 0.0 {
            draw::with_fallback("fill", ColorRole::Fill, style.color, |c| {
                draw::fill(&mut out, rect, c, style.alpha, order)
            });
        }
        draw::with_fallback("border", ColorRole::Border, style.color, |c| {
            draw::border(&mut out, rect, c, style.line_thickness, order)
        });
        self.label(&mut out, rect, style);
        out
    }

    /// Raw corner brackets. `alpha` is not used: this style has no fill.
    pub fn rect_edge(&self, image: &RgbImage, rect: PixelRect, style: &ResolvedStyle) -> RgbImage {
        let mut out = image.clone();
        let order = style.channel_order;

        draw::with_fallback("corner brackets", ColorRole::Border, style.color, |c| {
            draw::brackets(&mut out, rect, c, style.line_thickness, order)
        });
        self.label(&mut out, rect, style);
        out
    }

    fn label(&self, image: &mut RgbImage, rect: PixelRect, style: &ResolvedStyle) {
        let Some(text) = style.label.as_deref().filter(|t| !t.is_empty()) else {
            return;
        };
        let order = style.channel_order;
        let patch = draw::label_patch(rect, self.font, text);

        draw::with_fallback("label background", ColorRole::LabelBackground, style.label_background, |c| {
            draw::label_background(image, patch, c, order)
        });
        draw::with_fallback("label text", ColorRole::Text, style.label_color, |c| {
            draw::label_text(image, self.font, patch, text, c, order)
        });
    }
}

/// Filled box with the shared font. See [`Annotator::filled_box`].
pub fn draw_filled_box(image: Option<&RgbImage>, rect: Option<&[Coord]>, style: &AnnotateStyle) -> Option<RgbImage> {
    Annotator::new().filled_box(image, rect, style)
}

/// Corner brackets with the shared font. See [`Annotator::corner_brackets`].
pub fn draw_corner_brackets(
    image: Option<&RgbImage>,
    rect: Option<&[Coord]>,
    style: &AnnotateStyle,
) -> Option<RgbImage> {
    Annotator::new().corner_brackets(image, rect, style)
}

pub fn rect_box(image: &RgbImage, rect: PixelRect, style: &ResolvedStyle) -> RgbImage {
    Annotator::new().rect_box(image, rect, style)
}

pub fn rect_edge(image: &RgbImage, rect: PixelRect, style: &ResolvedStyle) -> RgbImage {
    Annotator::new().rect_edge(image, rect, style)
}
