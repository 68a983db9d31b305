// ============================================================================
// MASK PAINTER: freehand region selection rasterized into two layers
// ============================================================================
//
// The display layer is what the user sees over the photo (translucent white
// strokes on transparent). The mask layer is what the generator receives
// (solid white strokes on black). Both are written by `paint_segment`, so
// they never drift apart, and only `resize` changes their dimensions.

use image::{ColorType, GrayImage, Luma, Rgba, RgbaImage};

use crate::io::{DataUrl, ImageIoError, png_data_url};

pub const MIN_BRUSH_SIZE: f32 = 10.0;
pub const MAX_BRUSH_SIZE: f32 = 80.0;
pub const DEFAULT_BRUSH_SIZE: f32 = 40.0;

/// White at 70% opacity, snapped to the 8-bit value it ends up as.
const DISPLAY_ALPHA: f32 = 179.0 / 255.0;
const MASK_SELECTED: u8 = 255;
const MASK_EMPTY: u8 = 0;

/// Notification emitted to whoever owns the mask.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaskChange {
    /// A stroke ended; carries the whole mask layer as a PNG data-URL.
    Updated(DataUrl),
    /// The mask was wiped (explicit clear or a new source image).
    Cleared,
}

impl MaskChange {
    pub fn into_mask(self) -> Option<DataUrl> {
        match self {
            MaskChange::Updated(url) => Some(url),
            MaskChange::Cleared => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("could not load the image to mask: {0}")]
    Load(#[source] ImageIoError),
    #[error("could not export the mask: {0}")]
    Export(#[source] ImageIoError),
}

/// Size that fits an `image_w`×`image_h` picture inside a `box_w`×`box_h`
/// container without cropping, truncated to whole pixels.
pub fn fit_to_box(image_w: u32, image_h: u32, box_w: f32, box_h: f32) -> (u32, u32) {
    if image_w == 0 || image_h == 0 || box_w <= 0.0 || box_h <= 0.0 {
        return (1, 1);
    }
    let image_aspect = image_w as f32 / image_h as f32;
    let box_aspect = box_w / box_h;
    let (w, h) = if image_aspect > box_aspect {
        (box_w, box_w / image_aspect)
    } else {
        (box_h * image_aspect, box_h)
    };
    ((w as u32).max(1), (h as u32).max(1))
}

/// Pointer position relative to the canvas box. The pixel buffers are
/// created at the on-screen size, so no scaling is applied.
pub fn canvas_point(pointer: (f32, f32), canvas_origin: (f32, f32)) -> (f32, f32) {
    (pointer.0 - canvas_origin.0, pointer.1 - canvas_origin.1)
}

pub struct MaskPainter {
    display: RgbaImage,
    mask: GrayImage,
    brush_size: f32,
    drawing: bool,
    last_point: Option<(f32, f32)>,
    /// Bumped whenever pixels change so views know to re-upload textures.
    revision: u64,
}

impl Default for MaskPainter {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskPainter {
    pub fn new() -> Self {
        Self {
            display: RgbaImage::new(0, 0),
            mask: GrayImage::new(0, 0),
            brush_size: DEFAULT_BRUSH_SIZE,
            drawing: false,
            last_point: None,
            revision: 0,
        }
    }

    /// Decode `image_url`, size both layers to fit the container and reset
    /// the mask to "nothing selected".
    pub fn initialize(
        &mut self,
        image_url: &DataUrl,
        box_w: f32,
        box_h: f32,
    ) -> Result<MaskChange, MaskError> {
        let img = image_url.decode_image().map_err(MaskError::Load)?;
        Ok(self.initialize_for_size(img.width(), img.height(), box_w, box_h))
    }

    /// Same as [`initialize`](Self::initialize) when the source dimensions
    /// are already known.
    pub fn initialize_for_size(
        &mut self,
        image_w: u32,
        image_h: u32,
        box_w: f32,
        box_h: f32,
    ) -> MaskChange {
        let (w, h) = fit_to_box(image_w, image_h, box_w, box_h);
        self.resize(w, h);
        self.drawing = false;
        self.last_point = None;
        self.clear()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.display = RgbaImage::new(width, height);
        self.mask = GrayImage::from_pixel(width, height, Luma([MASK_EMPTY]));
        self.revision = self.revision.wrapping_add(1);
    }

    pub fn begin_stroke(&mut self, point: (f32, f32)) {
        self.drawing = true;
        self.last_point = Some(point);
        // Zero-length segment: a tap still leaves a dot.
        self.paint_segment(point, point);
    }

    pub fn extend_stroke(&mut self, point: (f32, f32)) {
        if !self.drawing {
            return;
        }
        if let Some(last) = self.last_point {
            self.paint_segment(last, point);
        }
        self.last_point = Some(point);
    }

    /// Finish the current stroke and emit the latest mask. Returns `None`
    /// when no stroke was in progress. There is no emptiness check: a
    /// finished stroke always reports the full current raster.
    pub fn end_stroke(&mut self) -> Result<Option<MaskChange>, MaskError> {
        if !self.drawing {
            return Ok(None);
        }
        self.drawing = false;
        self.last_point = None;
        self.export_mask().map(|url| Some(MaskChange::Updated(url)))
    }

    pub fn clear(&mut self) -> MaskChange {
        for px in self.display.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
        for px in self.mask.pixels_mut() {
            *px = Luma([MASK_EMPTY]);
        }
        self.revision = self.revision.wrapping_add(1);
        MaskChange::Cleared
    }

    /// Applies to strokes painted after this call only.
    pub fn set_brush_size(&mut self, px: f32) {
        self.brush_size = px.clamp(MIN_BRUSH_SIZE, MAX_BRUSH_SIZE);
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    pub fn display_layer(&self) -> &RgbaImage {
        &self.display
    }

    pub fn mask_layer(&self) -> &GrayImage {
        &self.mask
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn export_mask(&self) -> Result<DataUrl, MaskError> {
        let (w, h) = self.mask.dimensions();
        png_data_url(self.mask.as_raw(), w, h, ColorType::L8).map_err(MaskError::Export)
    }

    /// Rasterize one round-capped segment onto both layers.
    fn paint_segment(&mut self, start: (f32, f32), end: (f32, f32)) {
        debug_assert_eq!(self.display.dimensions(), self.mask.dimensions());
        let (width, height) = self.mask.dimensions();
        if width == 0 || height == 0 {
            return;
        }
        let radius = self.brush_size / 2.0;

        let min_x = (start.0.min(end.0) - radius).floor().max(0.0) as u32;
        let min_y = (start.1.min(end.1) - radius).floor().max(0.0) as u32;
        let max_x = (start.0.max(end.0) + radius).ceil();
        let max_y = (start.1.max(end.1) + radius).ceil();
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let max_x = (max_x as u32).min(width - 1);
        let max_y = (max_y as u32).min(height - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;
                if segment_distance(px, py, start, end) > radius {
                    continue;
                }
                self.mask.put_pixel(x, y, Luma([MASK_SELECTED]));
                let under = *self.display.get_pixel(x, y);
                self.display.put_pixel(x, y, composite_white(under));
            }
        }
        self.revision = self.revision.wrapping_add(1);
    }
}

/// Distance from a point to a segment; degenerates to point distance when
/// the segment has zero length.
#[inline]
fn segment_distance(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - a.0) * dx + (py - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = a.0 + t * dx;
    let cy = a.1 + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

/// Source-over of translucent white onto `under`.
#[inline]
fn composite_white(under: Rgba<u8>) -> Rgba<u8> {
    let dst_a = under.0[3] as f32 / 255.0;
    let out_a = DISPLAY_ALPHA + dst_a * (1.0 - DISPLAY_ALPHA);
    let blend = |c: u8| {
        let c = c as f32 / 255.0;
        let v = (DISPLAY_ALPHA + c * dst_a * (1.0 - DISPLAY_ALPHA)) / out_a;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        blend(under.0[0]),
        blend(under.0[1]),
        blend(under.0[2]),
        (out_a * 255.0).round() as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painter(w: u32, h: u32) -> MaskPainter {
        let mut p = MaskPainter::new();
        p.initialize_for_size(w, h, w as f32, h as f32);
        p
    }

    fn selected(p: &MaskPainter, x: u32, y: u32) -> bool {
        p.mask_layer().get_pixel(x, y).0[0] == MASK_SELECTED
    }

    fn selected_count(p: &MaskPainter) -> usize {
        p.mask_layer()
            .pixels()
            .filter(|px| px.0[0] == MASK_SELECTED)
            .count()
    }

    #[test]
    fn fit_to_box_preserves_aspect_without_cropping() {
        // Wide image in a square box: width fills.
        assert_eq!(fit_to_box(1600, 900, 400.0, 400.0), (400, 225));
        // Tall image in a square box: height fills.
        assert_eq!(fit_to_box(600, 1200, 400.0, 400.0), (200, 400));
        // Same aspect: fills exactly.
        assert_eq!(fit_to_box(800, 600, 400.0, 300.0), (400, 300));
        assert_eq!(fit_to_box(0, 10, 400.0, 300.0), (1, 1));
    }

    #[test]
    fn initialize_sizes_both_layers_and_starts_black() {
        let mut p = MaskPainter::new();
        let change = p.initialize_for_size(1000, 500, 300.0, 300.0);
        assert_eq!(change, MaskChange::Cleared);
        assert_eq!(p.dimensions(), (300, 150));
        assert_eq!(p.display_layer().dimensions(), (300, 150));
        assert_eq!(selected_count(&p), 0);
        assert!(p.display_layer().pixels().all(|px| px.0[3] == 0));
    }

    #[test]
    fn initialize_decodes_data_url() {
        let img = image::RgbaImage::from_pixel(40, 20, Rgba([1, 2, 3, 255]));
        let url = png_data_url(img.as_raw(), 40, 20, ColorType::Rgba8).unwrap();
        let mut p = MaskPainter::new();
        p.initialize(&url, 100.0, 100.0).unwrap();
        assert_eq!(p.dimensions(), (100, 50));
    }

    #[test]
    fn tap_paints_disc_of_brush_diameter() {
        let mut p = painter(200, 200);
        p.set_brush_size(40.0);
        p.begin_stroke((100.0, 100.0));
        let change = p.end_stroke().unwrap();
        assert!(matches!(change, Some(MaskChange::Updated(_))));

        let row: Vec<u32> = (0..200).filter(|&x| selected(&p, x, 100)).collect();
        assert_eq!(row.len(), 40);
        assert_eq!(row.first(), Some(&80));
        assert_eq!(row.last(), Some(&119));
        // Round, not square: the corner of the bounding box stays clear.
        assert!(!selected(&p, 82, 82));
        assert!(selected(&p, 100, 82));
    }

    #[test]
    fn stroke_covers_path_with_round_caps() {
        let mut p = painter(200, 100);
        p.set_brush_size(10.0);
        p.begin_stroke((20.0, 50.0));
        p.extend_stroke((180.0, 50.0));
        p.end_stroke().unwrap();

        for x in [20, 60, 100, 140, 179] {
            assert!(selected(&p, x, 50), "x={x}");
        }
        assert!(!selected(&p, 100, 60));
        // Cap extends half the brush past the end point.
        assert!(selected(&p, 183, 50));
        assert!(!selected(&p, 186, 50));
    }

    #[test]
    fn extend_without_begin_is_ignored() {
        let mut p = painter(50, 50);
        p.extend_stroke((25.0, 25.0));
        assert_eq!(selected_count(&p), 0);
        assert_eq!(p.end_stroke().unwrap(), None);
    }

    #[test]
    fn layers_stay_aligned() {
        let mut p = painter(120, 80);
        p.begin_stroke((10.0, 10.0));
        p.extend_stroke((90.0, 60.0));
        p.end_stroke().unwrap();
        for (x, y, m) in p.mask_layer().enumerate_pixels() {
            let shown = p.display_layer().get_pixel(x, y).0[3] > 0;
            assert_eq!(m.0[0] == MASK_SELECTED, shown, "({x},{y})");
        }
    }

    #[test]
    fn display_is_translucent_white() {
        let mut p = painter(50, 50);
        p.begin_stroke((25.0, 25.0));
        p.end_stroke().unwrap();
        assert_eq!(*p.display_layer().get_pixel(25, 25), Rgba([255, 255, 255, 179]));
    }

    #[test]
    fn clear_resets_mask_and_reports_absence() {
        let mut p = painter(100, 100);
        p.begin_stroke((30.0, 30.0));
        p.extend_stroke((70.0, 70.0));
        p.end_stroke().unwrap();
        p.begin_stroke((10.0, 90.0));
        p.end_stroke().unwrap();
        assert!(selected_count(&p) > 0);

        let change = p.clear();
        assert_eq!(change.clone().into_mask(), None);
        assert_eq!(change, MaskChange::Cleared);
        assert_eq!(selected_count(&p), 0);
        assert!(p.display_layer().pixels().all(|px| px.0[3] == 0));
    }

    #[test]
    fn brush_size_change_only_affects_later_strokes() {
        let mut p = painter(200, 100);
        p.set_brush_size(20.0);
        p.begin_stroke((50.0, 50.0));
        p.end_stroke().unwrap();
        let before = p.mask_layer().clone();

        p.set_brush_size(60.0);
        assert_eq!(p.mask_layer(), &before);

        p.begin_stroke((150.0, 50.0));
        p.end_stroke().unwrap();
        // First dot unchanged.
        for y in 0..100 {
            for x in 0..100 {
                assert_eq!(p.mask_layer().get_pixel(x, y), before.get_pixel(x, y));
            }
        }
        // Second dot uses the new diameter.
        let row = (100..200).filter(|&x| selected(&p, x, 50)).count();
        assert_eq!(row, 60);
    }

    #[test]
    fn brush_size_is_clamped() {
        let mut p = MaskPainter::new();
        p.set_brush_size(2.0);
        assert_eq!(p.brush_size(), MIN_BRUSH_SIZE);
        p.set_brush_size(500.0);
        assert_eq!(p.brush_size(), MAX_BRUSH_SIZE);
    }

    #[test]
    fn end_stroke_always_emits_current_raster() {
        let mut p = painter(60, 40);
        // Stroke entirely off-canvas still emits a (black) mask.
        p.begin_stroke((-200.0, -200.0));
        let Some(MaskChange::Updated(url)) = p.end_stroke().unwrap() else {
            panic!("expected a mask update");
        };
        let decoded = url.decode_image().unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (60, 40));
        assert!(decoded.pixels().all(|px| px.0[0] == 0));
    }

    #[test]
    fn exported_mask_is_binary_png() {
        let mut p = painter(64, 64);
        p.begin_stroke((32.0, 32.0));
        let url = p.end_stroke().unwrap().and_then(MaskChange::into_mask).unwrap();
        assert_eq!(url.mime_type(), "image/png");
        let decoded = url.decode_image().unwrap().to_luma8();
        assert!(decoded.pixels().all(|px| px.0[0] == 0 || px.0[0] == 255));
        assert_eq!(decoded.get_pixel(32, 32).0[0], 255);
    }

    #[test]
    fn canvas_point_is_offset_only() {
        assert_eq!(canvas_point((130.0, 95.5), (100.0, 80.0)), (30.0, 15.5));
    }
}
