use eframe::egui;
use egui::{RichText, Sense, Vec2};

use crate::io::DataUrl;
use crate::session::StudioSession;

use super::{PreviewCache, placeholder, show_texture};

/// Something the result panel wants the page to do.
pub enum ResultAction {
    Download(DataUrl),
    RequestVariations,
}

pub fn show(
    ui: &mut egui::Ui,
    session: &StudioSession,
    previews: &mut PreviewCache,
) -> Option<ResultAction> {
    let mut action = None;
    let avail = ui.available_size();

    if session.is_loading() {
        busy(ui, avail, "Generating your image…");
        return None;
    }

    if let Some(error) = session.error() {
        egui::Frame::none()
            .fill(ui.visuals().error_fg_color.gamma_multiply(0.15))
            .rounding(6.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new("Something went wrong").strong());
                ui.label(error);
            });
        ui.add_space(12.0);
    }

    let variations = session.variation_images();
    if !variations.is_empty() {
        ui.label(RichText::new("Variations").strong().size(16.0));
        ui.add_space(6.0);
        let cell = Vec2::splat(((avail.x - 24.0) / 2.0).clamp(120.0, 360.0));
        egui::ScrollArea::vertical().show(ui, |ui| {
            egui::Grid::new("variations_grid")
                .num_columns(2)
                .spacing([12.0, 12.0])
                .show(ui, |ui| {
                    for (i, image) in variations.iter().enumerate() {
                        ui.vertical(|ui| {
                            let caption = if i == 0 { "Original".to_string() } else { format!("Variation {}", i) };
                            match previews.get(ui.ctx(), &format!("variation-{}", i), image) {
                                Some(tex) => {
                                    show_texture(ui, &tex, cell, Sense::hover());
                                }
                                None => {
                                    placeholder(ui, cell, "Preview unavailable");
                                }
                            }
                            ui.horizontal(|ui| {
                                ui.label(caption);
                                if ui.button("Download").clicked() {
                                    action = Some(ResultAction::Download(image.clone()));
                                }
                            });
                        });
                        if i % 2 == 1 {
                            ui.end_row();
                        }
                    }
                });
        });
        return action;
    }

    if session.is_generating_variations() {
        busy(ui, avail, "Generating variations…");
        return None;
    }

    match session.generated_image() {
        Some(image) => {
            let max = Vec2::new(avail.x, (avail.y - 48.0).max(120.0));
            match previews.get(ui.ctx(), "result", image) {
                Some(tex) => {
                    show_texture(ui, &tex, max, Sense::hover());
                }
                None => {
                    placeholder(ui, max, "Preview unavailable");
                }
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Download").clicked() {
                    action = Some(ResultAction::Download(image.clone()));
                }
                if session.mode().supports_variations() && ui.button("Generate Variations").clicked() {
                    action = Some(ResultAction::RequestVariations);
                }
            });
        }
        None if session.error().is_none() => {
            placeholder(ui, avail, "Your generated image will appear here.");
        }
        None => {}
    }
    action
}

fn busy(ui: &mut egui::Ui, avail: Vec2, caption: &str) {
    ui.allocate_ui(avail, |ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(avail.y * 0.35);
            ui.spinner();
            ui.label(caption);
        });
    });
}
