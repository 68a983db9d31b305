use std::sync::Arc;

use eframe::egui;
use egui::RichText;

use crate::components::home;
use crate::components::studio::{StudioAction, StudioView};
use crate::io::{DataUrl, FileHandler};
use crate::mode::Page;
use crate::ops::generate::{GeminiGenerator, GenerateError, ImageGenerator};
use crate::settings::StudioSettings;

/// Stands in when the HTTP client could not be built; every call reports why.
struct UnavailableGenerator(String);

impl ImageGenerator for UnavailableGenerator {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn generate(&self, _images: &[DataUrl], _prompt: &str) -> Result<DataUrl, GenerateError> {
        Err(GenerateError::Message(self.0.clone()))
    }
}

fn build_generator(settings: &StudioSettings) -> Arc<dyn ImageGenerator> {
    match GeminiGenerator::from_settings(settings) {
        Ok(generator) => {
            if settings.effective_api_key().is_none() {
                log::warn!("no API key configured; generation will fail until one is set");
            }
            Arc::new(generator)
        }
        Err(e) => {
            log::error!("image service client unavailable: {}", e);
            Arc::new(UnavailableGenerator(e.to_string()))
        }
    }
}

/// Editable copy of the settings shown in the settings window.
struct SettingsDraft {
    api_key: String,
    model: String,
    timeout_secs: String,
}

impl SettingsDraft {
    fn from_settings(settings: &StudioSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            timeout_secs: settings.request_timeout_secs.to_string(),
        }
    }
}

pub struct StudioApp {
    settings: StudioSettings,
    generator: Arc<dyn ImageGenerator>,
    page: Page,
    studio: Option<StudioView>,
    files: FileHandler,
    settings_draft: Option<SettingsDraft>,
    settings_error: Option<String>,
}

impl StudioApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = StudioSettings::load();
        let generator = build_generator(&settings);
        let mut files = FileHandler::new();
        files.last_directory = settings.last_directory.clone();
        Self {
            settings,
            generator,
            page: Page::Home,
            studio: None,
            files,
            settings_draft: None,
            settings_error: None,
        }
    }

    fn navigate(&mut self, page: Page) {
        self.studio = match page {
            Page::Home => None,
            Page::Studio(mode) => Some(StudioView::new(
                mode,
                Arc::clone(&self.generator),
                &self.settings,
            )),
        };
        self.page = page;
    }

    fn persist_settings(&mut self) {
        self.settings.last_directory = self.files.last_directory.clone();
        if let Some(studio) = &self.studio {
            self.settings.default_brush_size = studio.brush_size();
        }
        if let Err(e) = self.settings.save() {
            log::error!("{}", e);
        }
    }

    fn home_ui(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("home_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Settings").clicked() && self.settings_draft.is_none() {
                        self.settings_draft = Some(SettingsDraft::from_settings(&self.settings));
                        self.settings_error = None;
                    }
                    if self.settings.effective_api_key().is_none() {
                        ui.colored_label(
                            ui.visuals().warn_fg_color,
                            "No API key configured",
                        );
                    }
                });
            });
        });

        let mut picked = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            picked = home::show(ui);
        });
        if let Some(mode) = picked {
            self.navigate(Page::Studio(mode));
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        let Some(draft) = &mut self.settings_draft else {
            return;
        };
        let mut open = true;
        let mut save = false;
        let mut cancel = false;

        egui::Window::new("Settings")
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("API key");
                        ui.add(egui::TextEdit::singleline(&mut draft.api_key).password(true));
                        ui.end_row();
                        ui.label("Model");
                        ui.text_edit_singleline(&mut draft.model);
                        ui.end_row();
                        ui.label("Timeout (s)");
                        ui.text_edit_singleline(&mut draft.timeout_secs);
                        ui.end_row();
                    });
                ui.label(
                    RichText::new("GEMINI_API_KEY in the environment overrides the stored key.")
                        .weak(),
                );
                if let Some(path) = crate::logger::log_path() {
                    ui.label(RichText::new(format!("Session log: {}", path.display())).weak());
                }
                if let Some(err) = &self.settings_error {
                    ui.colored_label(ui.visuals().error_fg_color, err.as_str());
                }
                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if save {
            match draft.timeout_secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    self.settings.api_key = draft.api_key.trim().to_string();
                    self.settings.model = draft.model.trim().to_string();
                    self.settings.request_timeout_secs = secs;
                    self.generator = build_generator(&self.settings);
                    self.persist_settings();
                    self.settings_draft = None;
                    log::info!("settings updated");
                }
                _ => {
                    self.settings_error = Some("Timeout must be a whole number of seconds.".to_string());
                }
            }
        } else if cancel || !open {
            self.settings_draft = None;
        }
    }
}

impl eframe::App for StudioApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.persist_settings();
        }

        match self.page {
            Page::Home => {
                self.home_ui(ctx);
                self.settings_window(ctx);
            }
            Page::Studio(_) => {
                let action = match &mut self.studio {
                    Some(studio) => studio.show(ctx, &mut self.files),
                    None => Some(StudioAction::Back),
                };
                if let Some(StudioAction::Back) = action {
                    self.navigate(Page::Home);
                }
            }
        }
    }
}
