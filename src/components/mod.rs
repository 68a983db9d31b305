pub mod home;
pub mod masker;
pub mod result;
pub mod studio;
pub mod uploader;

use std::collections::HashMap;

use eframe::egui;
use egui::{Color32, ColorImage, Rect, Response, Sense, TextureHandle, TextureOptions, Vec2};

use crate::io::{DataUrl, UploadedImage};

const UPLOAD_PREFIX: &str = "upload-";

/// Cheap identity for a data-URL: length plus the payload tail.
/// Decoding is only repeated when this changes.
fn fingerprint(url: &DataUrl) -> (usize, String) {
    let s = url.as_str();
    let tail_start = s
        .char_indices()
        .rev()
        .nth(47)
        .map(|(i, _)| i)
        .unwrap_or(0);
    (s.len(), s[tail_start..].to_string())
}

struct CachedPreview {
    fingerprint: (usize, String),
    texture: Option<TextureHandle>,
}

/// Decoded textures for every image a studio page shows, keyed by slot
/// ("upload-<id>", "result", "variation-2", ...).
#[derive(Default)]
pub struct PreviewCache {
    entries: HashMap<String, CachedPreview>,
}

impl PreviewCache {
    /// `None` when the image could not be decoded.
    pub fn get(&mut self, ctx: &egui::Context, key: &str, url: &DataUrl) -> Option<TextureHandle> {
        let fp = fingerprint(url);
        if let Some(entry) = self.entries.get(key)
            && entry.fingerprint == fp
        {
            return entry.texture.clone();
        }

        let texture = match url.decode_image() {
            Ok(img) => {
                let rgba = img.to_rgba8();
                let size = [rgba.width() as usize, rgba.height() as usize];
                let color_image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
                Some(ctx.load_texture(key, color_image, TextureOptions::LINEAR))
            }
            Err(e) => {
                log::warn!("preview '{}' could not be decoded: {}", key, e);
                None
            }
        };
        self.entries.insert(
            key.to_string(),
            CachedPreview {
                fingerprint: fp,
                texture: texture.clone(),
            },
        );
        texture
    }

    pub fn forget(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop every entry whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.entries.retain(|key, _| keep(key));
    }

    /// Release thumbnails of uploads that are no longer in `live`.
    pub fn retain_uploads(&mut self, live: &[UploadedImage]) {
        let before = self.entries.len();
        self.retain(|key| match key.strip_prefix(UPLOAD_PREFIX) {
            Some(id) => live.iter().any(|u| u.id.to_string() == id),
            None => true,
        });
        let dropped = before - self.entries.len();
        if dropped > 0 {
            log::debug!("released {} stale upload preview(s)", dropped);
        }
    }
}

pub fn upload_key(upload: &UploadedImage) -> String {
    format!("{}{}", UPLOAD_PREFIX, upload.id)
}

/// Scale `size` down (never up) to fit inside `max`.
pub fn fit_size(size: Vec2, max: Vec2) -> Vec2 {
    if size.x <= 0.0 || size.y <= 0.0 {
        return Vec2::ZERO;
    }
    let scale = (max.x / size.x).min(max.y / size.y).min(1.0);
    size * scale
}

/// Paint a texture letterboxed into a `max`-sized slot.
pub fn show_texture(ui: &mut egui::Ui, texture: &TextureHandle, max: Vec2, sense: Sense) -> Response {
    let (rect, response) = ui.allocate_exact_size(max, sense);
    let drawn = fit_size(texture.size_vec2(), max);
    let image_rect = Rect::from_center_size(rect.center(), drawn);
    ui.painter().image(
        texture.id(),
        image_rect,
        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
        Color32::WHITE,
    );
    response
}

/// Empty slot with a centered caption, same footprint as `show_texture`.
pub fn placeholder(ui: &mut egui::Ui, max: Vec2, caption: &str) -> Response {
    let (rect, response) = ui.allocate_exact_size(max, Sense::hover());
    let visuals = ui.visuals();
    ui.painter()
        .rect_filled(rect, 6.0, visuals.extreme_bg_color);
    ui.painter().text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        caption,
        egui::FontId::proportional(14.0),
        visuals.weak_text_color(),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_size_only_shrinks() {
        assert_eq!(fit_size(Vec2::new(100.0, 50.0), Vec2::new(400.0, 400.0)), Vec2::new(100.0, 50.0));
        assert_eq!(fit_size(Vec2::new(800.0, 400.0), Vec2::new(400.0, 400.0)), Vec2::new(400.0, 200.0));
        assert_eq!(fit_size(Vec2::new(0.0, 10.0), Vec2::new(10.0, 10.0)), Vec2::ZERO);
    }

    fn stub(cache: &mut PreviewCache, key: &str) {
        cache.entries.insert(
            key.to_string(),
            CachedPreview {
                fingerprint: (0, String::new()),
                texture: None,
            },
        );
    }

    #[test]
    fn replaced_uploads_release_their_previews() {
        let old = UploadedImage::new("old.png", DataUrl::from_bytes("image/png", b"old"));
        let kept = UploadedImage::new("kept.png", DataUrl::from_bytes("image/png", b"kept"));
        let mut cache = PreviewCache::default();
        stub(&mut cache, &upload_key(&old));
        stub(&mut cache, &upload_key(&kept));
        stub(&mut cache, "result");
        stub(&mut cache, "eraser");

        cache.retain_uploads(std::slice::from_ref(&kept));

        assert!(!cache.entries.contains_key(&upload_key(&old)));
        assert!(cache.entries.contains_key(&upload_key(&kept)));
        assert!(cache.entries.contains_key("result"));
        assert!(cache.entries.contains_key("eraser"));

        cache.retain_uploads(&[]);
        assert_eq!(cache.entries.len(), 2);
    }

    #[test]
    fn retain_filters_by_key() {
        let mut cache = PreviewCache::default();
        for key in ["variation-0", "variation-1", "result"] {
            stub(&mut cache, key);
        }
        cache.retain(|key| !key.starts_with("variation-"));
        assert_eq!(cache.entries.len(), 1);
        assert!(cache.entries.contains_key("result"));
    }

    #[test]
    fn fingerprint_tracks_payload_changes() {
        let a = DataUrl::from_bytes("image/png", b"first image bytes");
        let b = DataUrl::from_bytes("image/png", b"other image bytes");
        assert_ne!(fingerprint(&a), fingerprint(&b));
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
    }
}
