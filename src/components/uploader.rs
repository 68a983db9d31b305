use eframe::egui;
use egui::{RichText, Sense, Vec2};

use crate::io::{self, FileHandler, ImageIoError, UploadedImage};
use crate::session::StudioSession;

use super::masker::MaskCanvas;
use super::{PreviewCache, show_texture, upload_key};

const THUMBNAIL: Vec2 = Vec2::new(96.0, 96.0);

/// Turn files dropped on the window into uploads, in drop order.
pub fn load_dropped(files: &[egui::DroppedFile]) -> Result<Vec<UploadedImage>, ImageIoError> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        if let Some(path) = &file.path {
            out.push(io::load_uploaded_image(path)?);
        } else if let Some(bytes) = &file.bytes {
            out.push(io::uploaded_image_from_bytes(&file.name, bytes)?);
        }
    }
    Ok(out)
}

fn section_title(ui: &mut egui::Ui, text: &str) {
    ui.label(RichText::new(text).strong().size(15.0));
    ui.add_space(4.0);
}

/// Subject photos. Picking replaces the whole list. Returns an error line
/// when a file could not be loaded.
pub fn show_uploads(
    ui: &mut egui::Ui,
    session: &mut StudioSession,
    files: &mut FileHandler,
    previews: &mut PreviewCache,
    enabled: bool,
) -> Option<String> {
    let mode = session.mode();
    let mut failure = None;

    section_title(
        ui,
        if mode.first_image_only() { "Upload a Photo" } else { "Upload Photos" },
    );
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Choose Images…").clicked() {
                let paths = files.pick_images();
                if !paths.is_empty() {
                    match io::load_uploaded_images(&paths) {
                        Ok(images) => {
                            session.set_uploads(images);
                            previews.retain_uploads(&session.uploaded_images);
                        }
                        Err(e) => failure = Some(e.to_string()),
                    }
                }
            }
            ui.weak("or drop files onto the window");
        });
    });

    if mode.first_image_only() && session.uploaded_images.len() > 1 {
        ui.colored_label(
            ui.visuals().warn_fg_color,
            "Only the first image will be used in this mode.",
        );
    }

    let ctx = ui.ctx().clone();
    ui.horizontal_wrapped(|ui| {
        for upload in session.uploaded_images.iter_mut() {
            ui.vertical(|ui| {
                ui.set_width(THUMBNAIL.x);
                let key = upload_key(upload);
                match previews.get(&ctx, &key, &upload.data_url) {
                    Some(tex) => {
                        show_texture(ui, &tex, THUMBNAIL, Sense::hover()).on_hover_text(upload.name.as_str());
                    }
                    None => {
                        super::placeholder(ui, THUMBNAIL, "?");
                    }
                }
                if mode.shows_age_input() {
                    ui.add_enabled(
                        enabled,
                        egui::TextEdit::singleline(&mut upload.age)
                            .hint_text("Age")
                            .desired_width(THUMBNAIL.x),
                    );
                }
            });
        }
    });

    failure
}

/// Second image for style transfer.
pub fn show_style(
    ui: &mut egui::Ui,
    session: &mut StudioSession,
    files: &mut FileHandler,
    previews: &mut PreviewCache,
    enabled: bool,
) -> Option<String> {
    let mut failure = None;
    section_title(ui, "Upload Style Image");
    ui.add_enabled_ui(enabled, |ui| {
        ui.horizontal(|ui| {
            if ui.button("Choose Style…").clicked()
                && let Some(path) = files.pick_image()
            {
                match io::load_uploaded_image(&path) {
                    Ok(image) => session.set_style_image(Some(image)),
                    Err(e) => failure = Some(e.to_string()),
                }
            }
            if session.style_image.is_some() && ui.button("Remove").clicked() {
                session.set_style_image(None);
            }
        });
    });
    if let Some(style) = &session.style_image {
        match previews.get(ui.ctx(), "style", &style.data_url) {
            Some(tex) => {
                show_texture(ui, &tex, THUMBNAIL * 1.5, Sense::hover()).on_hover_text(style.name.as_str());
            }
            None => {
                super::placeholder(ui, THUMBNAIL * 1.5, "?");
            }
        }
    }
    failure
}

/// Photo to clean up plus the mask canvas over it.
pub fn show_eraser(
    ui: &mut egui::Ui,
    session: &mut StudioSession,
    files: &mut FileHandler,
    previews: &mut PreviewCache,
    masker: &mut MaskCanvas,
    enabled: bool,
) -> Option<String> {
    let mut failure = None;
    section_title(ui, "Upload an Image to Edit");
    ui.add_enabled_ui(enabled, |ui| {
        if ui.button("Choose Image…").clicked()
            && let Some(path) = files.pick_image()
        {
            match io::load_uploaded_image(&path) {
                Ok(image) => {
                    previews.forget("eraser");
                    session.set_eraser_image(Some(image));
                }
                Err(e) => failure = Some(e.to_string()),
            }
        }
    });

    let Some(image) = session.eraser_image().cloned() else {
        return failure;
    };
    ui.add_space(8.0);
    section_title(ui, "Brush Over the Object to Remove");
    let (change, mask_failure) = masker.show(ui, &image, previews, enabled);
    if let Some(change) = change {
        session.apply_mask_change(change);
    }
    failure.or(mask_failure)
}
