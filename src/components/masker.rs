// ============================================================================
// MASK CANVAS: egui front end for `ops::mask::MaskPainter`
// ============================================================================

use eframe::egui;
use egui::{Color32, ColorImage, Pos2, Rect, Sense, Stroke, TextureHandle, TextureOptions, Vec2};
use uuid::Uuid;

use crate::io::UploadedImage;
use crate::ops::mask::{
    MAX_BRUSH_SIZE, MIN_BRUSH_SIZE, MaskChange, MaskPainter, canvas_point,
};

use super::PreviewCache;

/// Tallest the canvas may grow; width follows the side panel.
const CANVAS_MAX_HEIGHT: f32 = 420.0;

pub struct MaskCanvas {
    painter: MaskPainter,
    /// Upload the layers were sized for.
    source: Option<Uuid>,
    overlay: Option<TextureHandle>,
    overlay_revision: u64,
}

impl MaskCanvas {
    pub fn new(brush_size: f32) -> Self {
        let mut painter = MaskPainter::new();
        painter.set_brush_size(brush_size);
        Self {
            painter,
            source: None,
            overlay: None,
            overlay_revision: u64::MAX,
        }
    }

    pub fn brush_size(&self) -> f32 {
        self.painter.brush_size()
    }

    /// Draw controls + canvas for `image`. Returns a change for the owner to
    /// apply, plus an error line if exporting the mask failed.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        image: &UploadedImage,
        previews: &mut PreviewCache,
        enabled: bool,
    ) -> (Option<MaskChange>, Option<String>) {
        let mut change = None;
        let mut failure = None;

        let Some(photo) = previews.get(ui.ctx(), "eraser", &image.data_url) else {
            ui.colored_label(ui.visuals().error_fg_color, "This image could not be displayed.");
            return (None, None);
        };

        let box_size = Vec2::new(ui.available_width().max(1.0), CANVAS_MAX_HEIGHT);
        if self.source != Some(image.id) {
            let [w, h] = photo.size();
            change = Some(self.painter.initialize_for_size(w as u32, h as u32, box_size.x, box_size.y));
            self.source = Some(image.id);
        }

        // -- Controls ---------------------------------------------------------
        ui.add_enabled_ui(enabled, |ui| {
            ui.horizontal(|ui| {
                let mut size = self.painter.brush_size();
                ui.label("Brush Size");
                if ui
                    .add(egui::Slider::new(&mut size, MIN_BRUSH_SIZE..=MAX_BRUSH_SIZE).suffix(" px"))
                    .changed()
                {
                    self.painter.set_brush_size(size);
                }
                let (rect, _) = ui.allocate_exact_size(Vec2::splat(MAX_BRUSH_SIZE / 2.0), Sense::hover());
                ui.painter().circle_filled(
                    rect.center(),
                    self.painter.brush_size() / 4.0,
                    Color32::from_white_alpha(179),
                );
                if ui.button("Clear Mask").clicked() {
                    change = Some(self.painter.clear());
                }
            });
        });

        // -- Canvas -----------------------------------------------------------
        let (w, h) = self.painter.dimensions();
        let canvas_size = Vec2::new(w as f32, h as f32);
        let sense = if enabled { Sense::drag() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(canvas_size, sense);
        let full_uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        ui.painter().image(photo.id(), rect, full_uv, Color32::WHITE);
        if let Some(overlay) = self.overlay_texture(ui.ctx()) {
            ui.painter().image(overlay.id(), rect, full_uv, Color32::WHITE);
        }

        let to_canvas = |p: Pos2| canvas_point((p.x, p.y), (rect.min.x, rect.min.y));
        if response.drag_started()
            && let Some(pos) = response.interact_pointer_pos()
        {
            self.painter.begin_stroke(to_canvas(pos));
        } else if response.dragged()
            && let Some(pos) = response.interact_pointer_pos()
            && self.painter.is_drawing()
            && drag_left_canvas(&mut self.painter, rect, pos)
        {
            self.finish_stroke(&mut change, &mut failure);
        }
        if response.drag_released() {
            self.finish_stroke(&mut change, &mut failure);
        }

        if let Some(hover) = response.hover_pos() {
            ui.painter().circle_stroke(
                hover,
                self.painter.brush_size() / 2.0,
                Stroke::new(1.0, Color32::WHITE),
            );
        }
        if self.painter.is_drawing() {
            ui.ctx().request_repaint();
        }

        (change, failure)
    }

    fn finish_stroke(&mut self, change: &mut Option<MaskChange>, failure: &mut Option<String>) {
        match self.painter.end_stroke() {
            Ok(Some(c)) => *change = Some(c),
            Ok(None) => {}
            Err(e) => {
                log::error!("mask export failed: {}", e);
                *failure = Some(e.to_string());
            }
        }
    }

    /// Re-upload the display layer only when its pixels changed.
    fn overlay_texture(&mut self, ctx: &egui::Context) -> Option<&TextureHandle> {
        let (w, h) = self.painter.dimensions();
        if w == 0 || h == 0 {
            return None;
        }
        if self.overlay_revision != self.painter.revision() || self.overlay.is_none() {
            let layer = self.painter.display_layer();
            let image = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], layer.as_raw());
            match &mut self.overlay {
                Some(tex) => tex.set(image, TextureOptions::LINEAR),
                None => self.overlay = Some(ctx.load_texture("mask_overlay", image, TextureOptions::LINEAR)),
            }
            self.overlay_revision = self.painter.revision();
        }
        self.overlay.as_ref()
    }
}

/// Extend the stroke to `pos`, or report that the pointer left `rect`.
/// Leaving ends the stroke like a release; nothing is painted toward the
/// outside point.
fn drag_left_canvas(painter: &mut MaskPainter, rect: Rect, pos: Pos2) -> bool {
    if !rect.contains(pos) {
        return true;
    }
    painter.extend_stroke(canvas_point((pos.x, pos.y), (rect.min.x, rect.min.y)));
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn painter_on(rect: Rect) -> MaskPainter {
        let mut painter = MaskPainter::new();
        painter.set_brush_size(MIN_BRUSH_SIZE);
        painter.initialize_for_size(64, 64, rect.width(), rect.height());
        painter
    }

    #[test]
    fn leaving_the_canvas_paints_nothing_outside_the_last_point() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::splat(64.0));
        let mut painter = painter_on(rect);
        painter.begin_stroke((10.0, 32.0));

        assert!(!drag_left_canvas(&mut painter, rect, Pos2::new(130.0, 132.0)));
        assert!(drag_left_canvas(&mut painter, rect, Pos2::new(200.0, 132.0)));
        painter.end_stroke().unwrap();

        assert_eq!(painter.mask_layer().get_pixel(30, 32).0[0], 255);
        assert_eq!(painter.mask_layer().get_pixel(60, 32).0[0], 0);
    }
}
