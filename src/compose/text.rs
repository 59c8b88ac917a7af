//! Text rasterization for overlays and captions.
//!
//! Uses the embedded Spleen bitmap fonts, resampled to the requested pixel
//! size with 4×4 supersampling so scaled glyphs keep soft edges.

use spleen_font::{PSF2Font, FONT_12X24, FONT_6X12};

/// Fraction of the line height above the baseline.
pub const ASCENT_RATIO: f32 = 0.8;

/// Sizes below this use the 6×12 face, larger sizes the 12×24 face.
const SMALL_FACE_LIMIT: f32 = 18.0;

/// Samples per axis when resampling a glyph.
const SUPERSAMPLE: u32 = 4;

/// A rendered line of text as a coverage mask (0.0 transparent, 1.0 ink).
#[derive(Debug, Clone)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    /// Distance from the top of the mask to the baseline.
    pub ascent: u32,
    pub data: Vec<f32>,
}

impl TextMask {
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Source bitmap of one glyph.
struct Bitmap {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl Bitmap {
    fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width * height],
        }
    }

    fn empty_box(width: usize, height: usize) -> Self {
        let mut bits = vec![false; width * height];
        for x in 0..width {
            bits[x] = true;
            bits[(height - 1) * width + x] = true;
        }
        for y in 0..height {
            bits[y * width] = true;
            bits[y * width + width - 1] = true;
        }
        Self {
            width,
            height,
            bits,
        }
    }

    fn get(&self, x: usize, y: usize) -> bool {
        self.bits[y * self.width + x]
    }
}

/// Width in pixels of one glyph cell at `pixel_height`.
pub fn cell_width(pixel_height: f32) -> u32 {
    let pixel_height = pixel_height.max(1.0);
    let (src_w, src_h) = if pixel_height < SMALL_FACE_LIMIT {
        (6.0, 12.0)
    } else {
        (12.0, 24.0)
    };
    ((src_w * pixel_height / src_h).round() as u32).max(1)
}

/// The middle part of `text` that can be seen when the line is centred on a
/// surface `max_width` pixels wide.
///
/// Keeps the dropped character count even on both sides so the kept glyphs
/// land on the same pixels as in the full line.
pub fn clip_centered(text: &str, pixel_height: f32, max_width: u32) -> &str {
    let total = text.chars().count();
    let cell_w = cell_width(pixel_height) as usize;
    let mut keep = (max_width as usize / cell_w).saturating_add(2).min(total);
    if (total - keep) % 2 == 1 {
        keep += 1;
    }
    if keep >= total {
        return text;
    }
    let skip = (total - keep) / 2;
    let mut bounds = text.char_indices().map(|(i, _)| i).chain(Some(text.len()));
    let start = bounds.nth(skip).unwrap_or(text.len());
    let end = bounds.nth(keep - 1).unwrap_or(text.len());
    &text[start..end]
}

/// Renders `text` on a single line at `pixel_height`.
///
/// With `bold` set, strokes are thickened horizontally by roughly 1/24 of the
/// size (at least one pixel).
pub fn render_line(text: &str, pixel_height: f32, bold: bool) -> TextMask {
    let pixel_height = pixel_height.max(1.0);
    let (font_data, src_w, src_h): (&[u8], usize, usize) = if pixel_height < SMALL_FACE_LIMIT {
        (FONT_6X12, 6, 12)
    } else {
        (FONT_12X24, 12, 24)
    };
    let mut face = PSF2Font::new(font_data).ok();

    let cell_w = cell_width(pixel_height);
    let cell_h = pixel_height.round() as u32;
    let embolden = if bold {
        ((pixel_height / 24.0).round() as u32).max(1)
    } else {
        0
    };

    let glyph_count = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
    let width = cell_w
        .saturating_mul(glyph_count)
        .saturating_add(embolden)
        .max(1);
    let height = cell_h.max(1);
    let mut data = vec![0.0f32; width as usize * height as usize];

    for (index, ch) in text.chars().enumerate() {
        let bitmap = if ch.is_whitespace() {
            Bitmap::blank(src_w, src_h)
        } else {
            let utf8 = ch.to_string();
            match face
                .as_mut()
                .and_then(|font| font.glyph_for_utf8(utf8.as_bytes()))
            {
                Some(glyph) => {
                    let mut bitmap = Bitmap::blank(src_w, src_h);
                    for (row_y, row) in glyph.enumerate() {
                        for (col_x, on) in row.enumerate() {
                            if row_y < src_h && col_x < src_w {
                                bitmap.bits[row_y * src_w + col_x] = on;
                            }
                        }
                    }
                    bitmap
                }
                None => Bitmap::empty_box(src_w, src_h),
            }
        };
        let origin_x = (index as u32).saturating_mul(cell_w);
        for dy in 0..cell_h {
            for dx in 0..cell_w {
                let coverage = sample(&bitmap, dx, dy, cell_w, cell_h);
                if coverage <= 0.0 {
                    continue;
                }
                for spread in 0..=embolden {
                    let x = origin_x.saturating_add(dx + spread);
                    if x < width && dy < height {
                        let idx = dy as usize * width as usize + x as usize;
                        data[idx] = data[idx].max(coverage);
                    }
                }
            }
        }
    }

    TextMask {
        width,
        height,
        ascent: (height as f32 * ASCENT_RATIO).round() as u32,
        data,
    }
}

/// Area-samples one destination pixel of a glyph cell.
fn sample(bitmap: &Bitmap, dx: u32, dy: u32, cell_w: u32, cell_h: u32) -> f32 {
    let mut hits = 0u32;
    for sy in 0..SUPERSAMPLE {
        for sx in 0..SUPERSAMPLE {
            let fx = (dx as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32) / cell_w as f32;
            let fy = (dy as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32) / cell_h as f32;
            let bx = ((fx * bitmap.width as f32) as usize).min(bitmap.width - 1);
            let by = ((fy * bitmap.height as f32) as usize).min(bitmap.height - 1);
            if bitmap.get(bx, by) {
                hits += 1;
            }
        }
    }
    hits as f32 / (SUPERSAMPLE * SUPERSAMPLE) as f32
}
