// ============================================================================
// STUDIO PAGE: inputs on the left, result on the right
// ============================================================================

use std::sync::Arc;
use std::time::SystemTime;

use eframe::egui;
use egui::RichText;

use crate::io::{self, DataUrl, FileHandler};
use crate::mode::StudioMode;
use crate::ops::generate::ImageGenerator;
use crate::ops::prompt::AspectRatio;
use crate::session::StudioSession;
use crate::settings::StudioSettings;

use super::masker::MaskCanvas;
use super::result::{self, ResultAction};
use super::{PreviewCache, uploader};

pub enum StudioAction {
    Back,
}

pub struct StudioView {
    pub session: StudioSession,
    masker: MaskCanvas,
    previews: PreviewCache,
    /// Local problems (file loads, saves) shown under the generate button.
    notice: Option<String>,
}

impl StudioView {
    pub fn new(
        mode: StudioMode,
        generator: Arc<dyn ImageGenerator>,
        settings: &StudioSettings,
    ) -> Self {
        let mut session = StudioSession::new(mode, generator);
        session.aspect_ratio = settings.default_aspect_ratio;
        log::info!("opened studio: {}", mode);
        Self {
            session,
            masker: MaskCanvas::new(settings.default_brush_size),
            previews: PreviewCache::default(),
            notice: None,
        }
    }

    pub fn brush_size(&self) -> f32 {
        self.masker.brush_size()
    }

    pub fn show(&mut self, ctx: &egui::Context, files: &mut FileHandler) -> Option<StudioAction> {
        // --- Poll background generation ---
        self.session.poll();
        if self.session.is_busy() {
            ctx.request_repaint();
        }

        self.handle_dropped_files(ctx);

        let mut action = None;
        let mode = self.session.mode();

        egui::TopBottomPanel::top("studio_header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui.button("← Back").clicked() {
                    action = Some(StudioAction::Back);
                }
                ui.separator();
                ui.label(RichText::new(mode.title()).size(20.0).strong());
            });
            ui.label(mode.studio_description());
            ui.add_space(6.0);
        });

        egui::SidePanel::left("studio_inputs")
            .resizable(true)
            .default_width(420.0)
            .min_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.inputs_ui(ui, files);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(result_action) = result::show(ui, &self.session, &mut self.previews) {
                match result_action {
                    ResultAction::Download(image) => self.download(&image, files),
                    ResultAction::RequestVariations => {
                        let _ = self.session.request_variations();
                    }
                }
            }
        });

        action
    }

    fn inputs_ui(&mut self, ui: &mut egui::Ui, files: &mut FileHandler) {
        let mode = self.session.mode();
        let enabled = !self.session.is_busy();

        ui.add_space(8.0);
        let failure = match mode {
            StudioMode::TextToImage => None,
            StudioMode::MagicEraser => uploader::show_eraser(
                ui,
                &mut self.session,
                files,
                &mut self.previews,
                &mut self.masker,
                enabled,
            ),
            _ => {
                let mut failure =
                    uploader::show_uploads(ui, &mut self.session, files, &mut self.previews, enabled);
                if mode == StudioMode::StyleTransfer {
                    ui.add_space(12.0);
                    failure = failure.or(uploader::show_style(
                        ui,
                        &mut self.session,
                        files,
                        &mut self.previews,
                        enabled,
                    ));
                }
                failure
            }
        };
        if failure.is_some() {
            self.notice = failure;
        }

        if mode != StudioMode::MagicEraser {
            ui.add_space(12.0);
            self.prompt_ui(ui, enabled);
        }

        ui.add_space(16.0);
        let caption = if self.session.is_loading() { "Generating…" } else { "Generate" };
        let button = egui::Button::new(RichText::new(caption).size(16.0).strong())
            .min_size(egui::vec2(ui.available_width(), 36.0));
        if ui.add_enabled(!self.session.is_generate_disabled(), button).clicked() {
            self.notice = None;
            let _ = self.session.generate();
        }

        if let Some(notice) = &self.notice {
            ui.add_space(6.0);
            ui.colored_label(ui.visuals().error_fg_color, notice.as_str());
        }
    }

    fn prompt_ui(&mut self, ui: &mut egui::Ui, enabled: bool) {
        let mode = self.session.mode();
        ui.add_enabled_ui(enabled, |ui| {
            if !mode.is_promptless() {
                ui.label(RichText::new(mode.prompt_hint()).strong());
                ui.add(
                    egui::TextEdit::multiline(&mut self.session.prompt)
                        .desired_rows(8)
                        .desired_width(f32::INFINITY),
                );
                ui.add_space(10.0);
            }

            ui.label(RichText::new("Aspect Ratio").strong());
            ui.horizontal(|ui| {
                for aspect in AspectRatio::all() {
                    if ui
                        .selectable_label(self.session.aspect_ratio == *aspect, aspect.label())
                        .clicked()
                    {
                        self.session.aspect_ratio = *aspect;
                    }
                }
            });
            ui.add_space(10.0);

            ui.label(RichText::new("Negative Prompt").strong());
            ui.add(
                egui::TextEdit::multiline(&mut self.session.negative_prompt)
                    .desired_rows(2)
                    .desired_width(f32::INFINITY)
                    .hint_text("Things to avoid in the image"),
            );
        });
    }

    /// Dropped files replace the uploads (or the photo to edit).
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped: Vec<egui::DroppedFile> = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() || self.session.is_busy() {
            return;
        }
        let mode = self.session.mode();
        if mode == StudioMode::TextToImage {
            return;
        }
        match uploader::load_dropped(&dropped) {
            Ok(mut images) if !images.is_empty() => {
                log::info!("{} file(s) dropped", images.len());
                self.notice = None;
                if mode == StudioMode::MagicEraser {
                    self.previews.forget("eraser");
                    self.session.set_eraser_image(Some(images.swap_remove(0)));
                } else {
                    self.session.set_uploads(images);
                    self.previews.retain_uploads(&self.session.uploaded_images);
                }
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("dropped files rejected: {}", e);
                self.notice = Some(e.to_string());
            }
        }
    }

    fn download(&mut self, image: &DataUrl, files: &mut FileHandler) {
        let name = io::download_file_name(SystemTime::now());
        let Some(path) = files.pick_save_path(&name) else {
            return;
        };
        match io::save_data_url_as_png(image, &path) {
            Ok(()) => log::info!("saved {}", path.display()),
            Err(e) => {
                log::error!("download failed: {}", e);
                self.notice = Some(e.to_string());
            }
        }
    }
}
