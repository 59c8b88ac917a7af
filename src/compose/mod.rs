//! Pin composition: base layer, text overlay and PNG export.
//!
//! A render is a pure function of (base image or placeholder, overlay,
//! resolution). Nothing is drawn incrementally; every input change re-runs
//! the whole pipeline.

mod paint;
mod text;

pub use paint::Color;

use crate::catalog::Resolution;
use crate::error::{PinProError, Result};
use image::imageops::FilterType;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Overlay text shown before the user edits it.
pub const DEFAULT_OVERLAY_TEXT: &str = "YOUR VIRAL HEADLINE";

/// Default overlay font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 36;

/// Accepted overlay font sizes.
pub const FONT_SIZE_RANGE: std::ops::RangeInclusive<u32> = 20..=100;

/// Extra gap between stacked overlay lines, in pixels.
pub const LINE_GAP: u32 = 10;

/// First overlay baseline, as a fraction of the surface height.
pub const OVERLAY_TOP_RATIO: f32 = 0.3;

/// Shadow drawn under the overlay.
const SHADOW_BLUR: f32 = 10.0;
const SHADOW_OPACITY: f32 = 0.5;

const PLACEHOLDER_BACKGROUND: Color = Color::rgb(0xff, 0xff, 0xff);
const PLACEHOLDER_GRID: Color = Color::rgb(0xf1, 0xf5, 0xf9);
const PLACEHOLDER_GRID_STEP: usize = 20;
const PLACEHOLDER_CAPTION: &str = "DESIGN CANVAS READY";
const PLACEHOLDER_CAPTION_COLOR: Color = Color::rgb(0xcb, 0xd5, 0xe1);
const PLACEHOLDER_CAPTION_SIZE: f32 = 10.0;

/// User-editable text layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub text: String,
    pub color: Color,
    pub font_size: u32,
}

impl Default for OverlaySpec {
    fn default() -> Self {
        Self {
            text: DEFAULT_OVERLAY_TEXT.to_string(),
            color: Color::WHITE,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl OverlaySpec {
    /// Clamps a requested font size into [`FONT_SIZE_RANGE`].
    pub fn clamp_font_size(size: u32) -> u32 {
        size.clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end())
    }
}

/// One stacked overlay word and where its baseline sits.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayLine {
    /// The word as drawn (upper-cased).
    pub text: String,
    /// Horizontal center in pixels.
    pub center_x: f32,
    /// Baseline in pixels from the top.
    pub baseline_y: f32,
}

/// Lays the overlay out: one upper-cased word per line, centered, the first
/// baseline at 30% of the height and each next one `font_size + 10` lower.
pub fn overlay_layout(text: &str, font_size: u32, width: u32, height: u32) -> Vec<OverlayLine> {
    let step = font_size.saturating_add(LINE_GAP) as f32;
    let top = height as f32 * OVERLAY_TOP_RATIO;
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| OverlayLine {
            text: word.to_uppercase(),
            center_x: width as f32 / 2.0,
            baseline_y: top + i as f32 * step,
        })
        .collect()
}

/// Renders a complete pin surface.
///
/// `base` is the decoded generated image at any size; it is stretched to the
/// resolution's dimensions. `None` draws the placeholder grid.
pub fn render_surface(
    base: Option<&RgbaImage>,
    overlay: &OverlaySpec,
    resolution: Resolution,
) -> RgbaImage {
    let spec = resolution.spec();
    let (width, height) = (spec.width, spec.height);

    let mut surface = match base {
        Some(image) => image::imageops::resize(image, width, height, FilterType::Triangle),
        None => placeholder(width, height),
    };

    draw_overlay(&mut surface, overlay);
    surface
}

fn placeholder(width: u32, height: u32) -> RgbaImage {
    let mut surface = RgbaImage::from_pixel(width, height, PLACEHOLDER_BACKGROUND.to_rgba(255));
    let grid = PLACEHOLDER_GRID.to_rgba(255);
    for x in (0..width).step_by(PLACEHOLDER_GRID_STEP) {
        for y in 0..height {
            surface.put_pixel(x, y, grid);
        }
    }
    for y in (0..height).step_by(PLACEHOLDER_GRID_STEP) {
        for x in 0..width {
            surface.put_pixel(x, y, grid);
        }
    }

    let mut mask = vec![0.0f32; (width * height) as usize];
    let caption = text::render_line(PLACEHOLDER_CAPTION, PLACEHOLDER_CAPTION_SIZE, true);
    stamp(
        &mut mask,
        width,
        height,
        &caption,
        width as f32 / 2.0,
        height as f32 / 2.0,
    );
    paint::fill_mask(&mut surface, &mask, PLACEHOLDER_CAPTION_COLOR, 1.0);
    surface
}

fn draw_overlay(surface: &mut RgbaImage, overlay: &OverlaySpec) {
    let (width, height) = surface.dimensions();
    let font_size = OverlaySpec::clamp_font_size(overlay.font_size);
    let lines = overlay_layout(&overlay.text, font_size, width, height);
    if lines.is_empty() {
        return;
    }

    let mut mask = vec![0.0f32; (width * height) as usize];
    for line in &lines {
        let visible = text::clip_centered(&line.text, font_size as f32, width);
        let glyphs = text::render_line(visible, font_size as f32, true);
        stamp(&mut mask, width, height, &glyphs, line.center_x, line.baseline_y);
    }

    let shadow = paint::blur_mask(&mask, width, height, SHADOW_BLUR);
    paint::fill_mask(surface, &shadow, Color::BLACK, SHADOW_OPACITY);
    paint::fill_mask(surface, &mask, overlay.color, 1.0);
}

/// Copies a text mask into a surface-sized mask, centered on `center_x`
/// with its baseline on `baseline_y`. Parts outside the surface are clipped.
fn stamp(
    mask: &mut [f32],
    width: u32,
    height: u32,
    glyphs: &text::TextMask,
    center_x: f32,
    baseline_y: f32,
) {
    let left = (center_x - glyphs.width as f32 / 2.0).round() as i64;
    let top = (baseline_y - glyphs.ascent as f32).round() as i64;
    for gy in 0..glyphs.height {
        let y = top + gy as i64;
        if y < 0 || y >= height as i64 {
            continue;
        }
        for gx in 0..glyphs.width {
            let x = left + gx as i64;
            if x < 0 || x >= width as i64 {
                continue;
            }
            let idx = (y * width as i64 + x) as usize;
            mask[idx] = mask[idx].max(glyphs.coverage(gx, gy));
        }
    }
}

/// Decodes provider image bytes into pixels.
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// Encodes a surface as PNG.
pub fn encode_png(surface: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    surface.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

/// File name used for an export taken at `unix_millis`.
pub fn export_file_name(unix_millis: u128) -> String {
    format!("pinpro-{unix_millis}.png")
}

/// Holds the current rendered surface.
#[derive(Debug, Clone)]
pub struct Compositor {
    surface: RgbaImage,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    /// Starts with an empty placeholder at the default resolution.
    pub fn new() -> Self {
        Self {
            surface: render_surface(None, &OverlaySpec::default(), Resolution::default()),
        }
    }

    /// Re-renders from scratch and keeps the result.
    pub fn render(
        &mut self,
        base: Option<&RgbaImage>,
        overlay: &OverlaySpec,
        resolution: Resolution,
    ) -> &RgbaImage {
        self.surface = render_surface(base, overlay, resolution);
        &self.surface
    }

    /// The last rendered surface.
    pub fn surface(&self) -> &RgbaImage {
        &self.surface
    }

    /// PNG bytes of the current surface.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.surface)
    }
}

/// Checks that decoded bytes are usable as a base layer.
pub(crate) fn require_dimensions(image: &RgbaImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PinProError::Decode("image has no pixels".into()));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Rgba;

    fn assert_close(actual: &Rgba<u8>, expected: [u8; 4]) {
        for (a, e) in actual.0.iter().zip(expected) {
            assert!(a.abs_diff(e) <= 1, "{actual:?} != {expected:?}");
        }
    }

    /// Encodes a solid-color test image.
    pub(crate) fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(width, height, Rgba(color))).unwrap()
    }

    #[test]
    fn test_layout_stacks_words() {
        let lines = overlay_layout("your  viral\theadline", 36, 450, 600);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "YOUR");
        assert_eq!(lines[2].text, "HEADLINE");
        assert!((lines[0].baseline_y - 180.0).abs() < 1e-3);
        for pair in lines.windows(2) {
            assert!((pair[1].baseline_y - pair[0].baseline_y - 46.0).abs() < 1e-3);
        }
        assert!(lines.iter().all(|l| l.center_x == 225.0));
    }

    #[test]
    fn test_layout_of_blank_text_is_empty() {
        assert!(overlay_layout("   ", 36, 400, 400).is_empty());
    }

    #[test]
    fn test_surface_matches_resolution() {
        for res in Resolution::ALL {
            let surface = render_surface(None, &OverlaySpec::default(), res);
            let spec = res.spec();
            assert_eq!(surface.dimensions(), (spec.width, spec.height));
        }
    }

    #[test]
    fn test_placeholder_grid_and_background() {
        let overlay = OverlaySpec {
            text: String::new(),
            ..OverlaySpec::default()
        };
        let surface = render_surface(None, &overlay, Resolution::Square1000x1000);
        assert_eq!(*surface.get_pixel(20, 7), Rgba([0xf1, 0xf5, 0xf9, 0xff]));
        assert_eq!(*surface.get_pixel(7, 40), Rgba([0xf1, 0xf5, 0xf9, 0xff]));
        assert_eq!(*surface.get_pixel(7, 7), Rgba([0xff, 0xff, 0xff, 0xff]));

        // caption ink sits on the middle band
        let band_has_caption = (0..400).any(|x| {
            (190..205).any(|y| {
                let px = surface.get_pixel(x, y);
                px[0] < 0xf1 && px[0] >= 0xcb
            })
        });
        assert!(band_has_caption);
    }

    #[test]
    fn test_base_image_is_stretched_to_fill() {
        let base = decode_image(&solid_png(64, 48, [200, 10, 10, 255])).unwrap();
        let overlay = OverlaySpec {
            text: String::new(),
            ..OverlaySpec::default()
        };
        let surface = render_surface(Some(&base), &overlay, Resolution::Pin1000x1500);
        assert_eq!(surface.dimensions(), (450, 600));
        assert_close(surface.get_pixel(0, 0), [200, 10, 10, 255]);
        assert_close(surface.get_pixel(449, 599), [200, 10, 10, 255]);
    }

    #[test]
    fn test_overlay_drawn_on_top_with_color_and_shadow() {
        let base = decode_image(&solid_png(10, 10, [0, 0, 255, 255])).unwrap();
        let overlay = OverlaySpec {
            text: "HI".into(),
            color: Color::rgb(255, 255, 0),
            font_size: 60,
        };
        let surface = render_surface(Some(&base), &overlay, Resolution::Square1000x1000);

        // 60px text around the baseline at y = 120
        let yellow = surface
            .pixels()
            .filter(|p| p[0] > 200 && p[1] > 200 && p[2] < 60)
            .count();
        assert!(yellow > 0);

        // shadow darkens the blue just outside the glyphs
        let darkened = surface.pixels().filter(|p| p[2] < 250 && p[0] < 20).count();
        assert!(darkened > 0);

        // far from the text, the base is untouched
        assert_close(surface.get_pixel(5, 395), [0, 0, 255, 255]);
    }

    #[test]
    fn test_render_is_idempotent() {
        let base = decode_image(&solid_png(32, 32, [12, 34, 56, 255])).unwrap();
        let overlay = OverlaySpec::default();
        let a = encode_png(&render_surface(Some(&base), &overlay, Resolution::Story1080x1920)).unwrap();
        let b = encode_png(&render_surface(Some(&base), &overlay, Resolution::Story1080x1920)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_compositor_keeps_last_render() {
        let mut compositor = Compositor::new();
        assert_eq!(compositor.surface().dimensions(), (450, 600));
        compositor.render(None, &OverlaySpec::default(), Resolution::Square1000x1000);
        assert_eq!(compositor.surface().dimensions(), (400, 400));
        assert!(compositor.surface().get_pixel_checked(400, 0).is_none());

        let png = compositor.encode_png().unwrap();
        let decoded = decode_image(&png).unwrap();
        assert_eq!(decoded.dimensions(), (400, 400));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(1_700_000_000_123), "pinpro-1700000000123.png");
    }

    #[test]
    fn test_font_size_clamp() {
        assert_eq!(OverlaySpec::clamp_font_size(5), 20);
        assert_eq!(OverlaySpec::clamp_font_size(36), 36);
        assert_eq!(OverlaySpec::clamp_font_size(400), 100);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(PinProError::Image(_))
        ));
    }

    #[test]
    fn test_huge_single_word_renders_clipped() {
        let overlay = OverlaySpec {
            text: "W".repeat(1_000_000),
            color: Color::WHITE,
            font_size: 100,
        };
        let base = decode_image(&solid_png(4, 4, [0, 0, 255, 255])).unwrap();
        let surface = render_surface(Some(&base), &overlay, Resolution::Square1000x1000);
        assert_eq!(surface.dimensions(), (400, 400));
        // the word runs off both edges, so both halves of the line carry ink
        let white = |xs: std::ops::Range<u32>| {
            xs.flat_map(|x| (60..130).map(move |y| (x, y)))
                .filter(|&(x, y)| *surface.get_pixel(x, y) == Rgba([0xff, 0xff, 0xff, 0xff]))
                .count()
        };
        assert!(white(0..200) > 0);
        assert!(white(200..400) > 0);
    }

    #[test]
    fn test_clipped_word_matches_unclipped_pixels() {
        // 22 glyphs of 36px fit on 400px, so 31 get clipped
        let short = OverlaySpec {
            text: "M".repeat(31),
            ..OverlaySpec::default()
        };
        let surface = render_surface(None, &short, Resolution::Square1000x1000);

        let mut manual = placeholder(400, 400);
        let lines = overlay_layout(&short.text, 36, 400, 400);
        let glyphs = text::render_line(&lines[0].text, 36.0, true);
        let mut mask = vec![0.0f32; 400 * 400];
        stamp(&mut mask, 400, 400, &glyphs, lines[0].center_x, lines[0].baseline_y);
        let shadow = paint::blur_mask(&mask, 400, 400, SHADOW_BLUR);
        paint::fill_mask(&mut manual, &shadow, Color::BLACK, SHADOW_OPACITY);
        paint::fill_mask(&mut manual, &mask, Color::WHITE, 1.0);

        assert_eq!(surface, manual);
    }

    #[test]
    fn test_out_of_range_font_size_is_clamped() {
        let lines = overlay_layout("A B", u32::MAX, 400, 400);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].baseline_y > lines[0].baseline_y);

        let huge = OverlaySpec {
            font_size: u32::MAX,
            ..OverlaySpec::default()
        };
        let capped = OverlaySpec {
            font_size: 100,
            ..OverlaySpec::default()
        };
        assert_eq!(
            render_surface(None, &huge, Resolution::Pin1000x1500),
            render_surface(None, &capped, Resolution::Pin1000x1500)
        );
    }
}
