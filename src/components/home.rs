use eframe::egui;
use egui::{RichText, Sense, Vec2};

use crate::mode::StudioMode;

const CARD_WIDTH: f32 = 280.0;
const CARD_HEIGHT: f32 = 110.0;
const CARD_SPACING: f32 = 16.0;

/// Template gallery. Returns the mode whose card was clicked this frame.
pub fn show(ui: &mut egui::Ui) -> Option<StudioMode> {
    let mut picked = None;

    ui.vertical_centered(|ui| {
        ui.add_space(24.0);
        ui.label(RichText::new("AI PhotoStudio").size(32.0).strong());
        ui.label("Pick a tool to get started.");
        ui.add_space(24.0);
    });

    let columns = ((ui.available_width() + CARD_SPACING) / (CARD_WIDTH + CARD_SPACING))
        .floor()
        .clamp(1.0, 3.0) as usize;

    egui::ScrollArea::vertical().show(ui, |ui| {
        egui::Grid::new("home_cards")
            .num_columns(columns)
            .spacing([CARD_SPACING, CARD_SPACING])
            .show(ui, |ui| {
                for (i, mode) in StudioMode::all().iter().enumerate() {
                    if card(ui, *mode).clicked() {
                        picked = Some(*mode);
                    }
                    if (i + 1) % columns == 0 {
                        ui.end_row();
                    }
                }
            });
    });

    picked
}

fn card(ui: &mut egui::Ui, mode: StudioMode) -> egui::Response {
    let inner = egui::Frame::group(ui.style())
        .rounding(8.0)
        .inner_margin(12.0)
        .show(ui, |ui| {
            ui.set_min_size(Vec2::new(CARD_WIDTH, CARD_HEIGHT));
            ui.set_max_width(CARD_WIDTH);
            ui.label(RichText::new(mode.title()).size(18.0).strong());
            ui.add_space(6.0);
            ui.label(mode.home_description());
        });
    let response = inner.response.interact(Sense::click());
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        ui.painter().rect_stroke(
            response.rect,
            8.0,
            egui::Stroke::new(1.5, ui.visuals().selection.bg_fill),
        );
    }
    response.on_hover_text(format!("Open {}", mode.title()))
}
