// ============================================================================
// STUDIO SESSION: per-view inputs, outputs and background generation jobs
// ============================================================================
//
// Owned by the studio page and rebuilt whenever the user navigates to a mode.
// Generator calls run on the rayon pool (variations on their own
// `VARIATION_COUNT`-wide pool); finished jobs come back over an mpsc
// channel and are applied on the owning thread by `poll()` / `wait()`.

use std::sync::Arc;
use std::sync::mpsc;

use rayon::prelude::*;

use crate::io::{DataUrl, UploadedImage};
use crate::mode::StudioMode;
use crate::ops::generate::{GenerateError, ImageGenerator};
use crate::ops::mask::MaskChange;
use crate::ops::prompt::{self, AspectRatio, DEFAULT_NEGATIVE_PROMPT, PromptInputs};

/// Number of extra images produced by "Generate Variations".
pub const VARIATION_COUNT: usize = 4;

const GENERATE_FALLBACK: &str = "An unknown error occurred.";
const VARIATIONS_FALLBACK: &str = "Failed to generate variations.";

/// Local refusals. `Display` is the sentence shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A generation request is already in progress.")]
    Busy,
    #[error("Please upload an image to edit.")]
    MissingEraserImage,
    #[error("Please brush over an object to remove it.")]
    MissingMask,
    #[error("Please upload at least one image.")]
    MissingUploads,
    #[error("Please upload a style image.")]
    MissingStyleImage,
    #[error("Please enter a prompt.")]
    MissingPrompt,
    #[error("Variations are not available in this mode.")]
    VariationsUnsupported,
    #[error("Original settings are required to generate variations.")]
    MissingOriginal,
    #[error("A prompt is required to generate variations.")]
    MissingVariationPrompt,
    #[error("Original style image is required to generate variations.")]
    MissingVariationStyle,
}

enum JobOutcome {
    Generated(Result<DataUrl, GenerateError>),
    Variations {
        original: DataUrl,
        result: Result<Vec<DataUrl>, GenerateError>,
    },
}

fn user_message(err: &GenerateError, fallback: &str) -> String {
    let text = err.to_string();
    if text.trim().is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

pub struct StudioSession {
    mode: StudioMode,
    pub uploaded_images: Vec<UploadedImage>,
    pub style_image: Option<UploadedImage>,
    eraser_image: Option<UploadedImage>,
    mask: Option<DataUrl>,
    pub prompt: String,
    pub negative_prompt: String,
    pub aspect_ratio: AspectRatio,

    generated_image: Option<DataUrl>,
    variation_images: Vec<DataUrl>,
    is_loading: bool,
    is_generating_variations: bool,
    error: Option<String>,

    generator: Arc<dyn ImageGenerator>,
    sender: mpsc::Sender<JobOutcome>,
    receiver: mpsc::Receiver<JobOutcome>,
}

impl StudioSession {
    pub fn new(mode: StudioMode, generator: Arc<dyn ImageGenerator>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            mode,
            uploaded_images: Vec::new(),
            style_image: None,
            eraser_image: None,
            mask: None,
            prompt: mode.template().to_string(),
            negative_prompt: DEFAULT_NEGATIVE_PROMPT.to_string(),
            aspect_ratio: AspectRatio::default(),
            generated_image: None,
            variation_images: Vec::new(),
            is_loading: false,
            is_generating_variations: false,
            error: None,
            generator,
            sender,
            receiver,
        }
    }

    /// Back to the mode's defaults. Jobs still in flight are abandoned.
    pub fn reset(&mut self) {
        let generator = Arc::clone(&self.generator);
        let aspect = self.aspect_ratio;
        *self = Self::new(self.mode, generator);
        self.aspect_ratio = aspect;
    }

    // ---- accessors -------------------------------------------------------

    pub fn mode(&self) -> StudioMode {
        self.mode
    }

    pub fn eraser_image(&self) -> Option<&UploadedImage> {
        self.eraser_image.as_ref()
    }

    pub fn mask(&self) -> Option<&DataUrl> {
        self.mask.as_ref()
    }

    pub fn generated_image(&self) -> Option<&DataUrl> {
        self.generated_image.as_ref()
    }

    pub fn variation_images(&self) -> &[DataUrl] {
        &self.variation_images
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_generating_variations(&self) -> bool {
        self.is_generating_variations
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_generating_variations
    }

    // ---- setters ---------------------------------------------------------

    /// Replaces the whole list; uploads never append.
    pub fn set_uploads(&mut self, images: Vec<UploadedImage>) {
        self.uploaded_images = images;
    }

    pub fn set_age(&mut self, index: usize, age: impl Into<String>) {
        if let Some(image) = self.uploaded_images.get_mut(index) {
            image.age = age.into();
        }
    }

    pub fn set_style_image(&mut self, image: Option<UploadedImage>) {
        self.style_image = image;
    }

    /// A new photo invalidates the old mask and result.
    pub fn set_eraser_image(&mut self, image: Option<UploadedImage>) {
        self.eraser_image = image;
        self.mask = None;
        self.generated_image = None;
        self.error = None;
    }

    pub fn set_mask(&mut self, mask: Option<DataUrl>) {
        self.mask = mask;
    }

    pub fn apply_mask_change(&mut self, change: MaskChange) {
        self.mask = change.into_mask();
    }

    // ---- composition -----------------------------------------------------

    pub fn prompt_inputs(&self) -> PromptInputs<'_> {
        PromptInputs {
            prompt: &self.prompt,
            negative_prompt: &self.negative_prompt,
            aspect_ratio: self.aspect_ratio,
            subject_ages: self.uploaded_images.iter().map(|i| i.age.as_str()).collect(),
        }
    }

    pub fn compose_prompt(&self) -> String {
        prompt::compose(self.mode, &self.prompt_inputs())
    }

    /// Reference images in the order the generator receives them.
    pub fn images_for_api(&self) -> Vec<DataUrl> {
        let first = self.uploaded_images.first().map(|i| i.data_url.clone());
        match self.mode {
            StudioMode::MagicEraser => self
                .eraser_image
                .iter()
                .map(|i| i.data_url.clone())
                .chain(self.mask.clone())
                .collect(),
            StudioMode::TextToImage => Vec::new(),
            StudioMode::StyleTransfer => first
                .into_iter()
                .chain(self.style_image.as_ref().map(|s| s.data_url.clone()))
                .collect(),
            mode if mode.first_image_only() => first.into_iter().collect(),
            _ => self.uploaded_images.iter().map(|i| i.data_url.clone()).collect(),
        }
    }

    fn prompt_is_blank(&self) -> bool {
        self.prompt.trim().is_empty()
    }

    pub fn validate_generate(&self) -> Result<(), ValidationError> {
        if self.mode == StudioMode::MagicEraser {
            if self.eraser_image.is_none() {
                return Err(ValidationError::MissingEraserImage);
            }
            if self.mask.is_none() {
                return Err(ValidationError::MissingMask);
            }
        } else if self.mode.uses_uploads() && self.uploaded_images.is_empty() {
            return Err(ValidationError::MissingUploads);
        }
        if self.mode == StudioMode::StyleTransfer && self.style_image.is_none() {
            return Err(ValidationError::MissingStyleImage);
        }
        if !self.mode.is_promptless() && self.prompt_is_blank() {
            return Err(ValidationError::MissingPrompt);
        }
        Ok(())
    }

    pub fn validate_variations(&self) -> Result<(), ValidationError> {
        if !self.mode.supports_variations() {
            return Err(ValidationError::VariationsUnsupported);
        }
        if (self.mode.uses_uploads() && self.uploaded_images.is_empty())
            || self.generated_image.is_none()
        {
            return Err(ValidationError::MissingOriginal);
        }
        if !self.mode.is_promptless() && self.prompt_is_blank() {
            return Err(ValidationError::MissingVariationPrompt);
        }
        if self.mode == StudioMode::StyleTransfer && self.style_image.is_none() {
            return Err(ValidationError::MissingVariationStyle);
        }
        Ok(())
    }

    pub fn is_generate_disabled(&self) -> bool {
        self.is_busy()
            || (self.mode.uses_uploads() && self.uploaded_images.is_empty())
            || (self.mode == StudioMode::MagicEraser
                && (self.eraser_image.is_none() || self.mask.is_none()))
    }

    // ---- dispatch --------------------------------------------------------

    /// Start the initial generation. On a local refusal the message is also
    /// stored as the session error (except `Busy`).
    pub fn generate(&mut self) -> Result<(), ValidationError> {
        if self.is_busy() {
            return Err(ValidationError::Busy);
        }
        if let Err(refusal) = self.validate_generate() {
            log::info!("generate refused in {}: {}", self.mode, refusal);
            self.error = Some(refusal.to_string());
            return Err(refusal);
        }

        let images = self.images_for_api();
        let prompt = self.compose_prompt();
        log::info!(
            "generate: mode={} images={} prompt_chars={}",
            self.mode,
            images.len(),
            prompt.chars().count()
        );

        self.is_loading = true;
        self.error = None;
        self.generated_image = None;
        self.variation_images.clear();

        let generator = Arc::clone(&self.generator);
        let tx = self.sender.clone();
        rayon::spawn(move || {
            let result = generator.generate(&images, &prompt);
            let _ = tx.send(JobOutcome::Generated(result));
        });
        Ok(())
    }

    /// Fan out `VARIATION_COUNT` calls with the same inputs. The batch is
    /// accepted only if every call succeeds.
    pub fn request_variations(&mut self) -> Result<(), ValidationError> {
        if self.is_busy() {
            return Err(ValidationError::Busy);
        }
        if let Err(refusal) = self.validate_variations() {
            log::info!("variations refused in {}: {}", self.mode, refusal);
            if refusal != ValidationError::VariationsUnsupported {
                self.error = Some(refusal.to_string());
            }
            return Err(refusal);
        }
        let Some(original) = self.generated_image.clone() else {
            return Err(ValidationError::MissingOriginal);
        };

        let images = self.images_for_api();
        let prompt = self.compose_prompt();
        log::info!(
            "variations: mode={} calls={} images={}",
            self.mode,
            VARIATION_COUNT,
            images.len()
        );

        self.is_generating_variations = true;
        self.error = None;

        let generator = Arc::clone(&self.generator);
        let tx = self.sender.clone();
        rayon::spawn(move || {
            let result = variation_pool().and_then(|pool| {
                let settled: Vec<Result<DataUrl, GenerateError>> = pool.install(|| {
                    (0..VARIATION_COUNT)
                        .into_par_iter()
                        .map(|_| generator.generate(&images, &prompt))
                        .collect()
                });
                settled.into_iter().collect::<Result<Vec<_>, _>>()
            });
            let _ = tx.send(JobOutcome::Variations { original, result });
        });
        Ok(())
    }

    // ---- completion ------------------------------------------------------

    /// Apply finished jobs without blocking. Returns true if anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.receiver.try_recv() {
            self.apply(outcome);
            changed = true;
        }
        changed
    }

    /// Block until no job is outstanding.
    pub fn wait(&mut self) {
        while self.is_busy() {
            match self.receiver.recv() {
                Ok(outcome) => self.apply(outcome),
                Err(_) => break,
            }
        }
    }

    fn apply(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Generated(result) => {
                self.is_loading = false;
                match result {
                    Ok(image) => {
                        log::info!("generate finished ({})", image.mime_type());
                        self.generated_image = Some(image);
                    }
                    Err(e) => {
                        log::error!("generate failed: {}", e);
                        self.error = Some(user_message(&e, GENERATE_FALLBACK));
                    }
                }
            }
            JobOutcome::Variations { original, result } => {
                self.is_generating_variations = false;
                match result {
                    Ok(variations) => {
                        log::info!("variations finished ({} images)", variations.len());
                        self.variation_images = std::iter::once(original).chain(variations).collect();
                    }
                    Err(e) => {
                        log::error!("variations failed: {}", e);
                        self.error = Some(user_message(&e, VARIATIONS_FALLBACK));
                    }
                }
            }
        }
    }
}

/// One worker per variation call; the global pool is only as wide as the CPU count.
fn variation_pool() -> Result<rayon::ThreadPool, GenerateError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(VARIATION_COUNT)
        .thread_name(|i| format!("variation-{}", i))
        .build()
        .map_err(|e| GenerateError::Message(format!("could not start variation workers: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl ImageGenerator for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn generate(&self, _images: &[DataUrl], _prompt: &str) -> Result<DataUrl, GenerateError> {
            Ok(DataUrl::from_bytes("image/png", b"out"))
        }
    }

    fn upload(name: &str) -> UploadedImage {
        UploadedImage::new(name, DataUrl::from_bytes("image/png", name.as_bytes()))
    }

    fn session(mode: StudioMode) -> StudioSession {
        StudioSession::new(mode, Arc::new(Echo))
    }

    #[test]
    fn prompt_starts_as_mode_template() {
        let s = session(StudioMode::ProductStudio);
        assert_eq!(s.prompt, StudioMode::ProductStudio.template());
        assert_eq!(s.negative_prompt, DEFAULT_NEGATIVE_PROMPT);
    }

    #[test]
    fn images_for_api_per_mode() {
        let mut s = session(StudioMode::PhotoStudio);
        s.set_uploads(vec![upload("a"), upload("b")]);
        assert_eq!(s.images_for_api().len(), 2);

        let mut s = session(StudioMode::ProductStudio);
        s.set_uploads(vec![upload("a"), upload("b")]);
        assert_eq!(s.images_for_api(), vec![s.uploaded_images[0].data_url.clone()]);

        let mut s = session(StudioMode::StyleTransfer);
        s.set_uploads(vec![upload("content"), upload("ignored")]);
        s.set_style_image(Some(upload("style")));
        let sent = s.images_for_api();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], upload("style").data_url);

        let mut s = session(StudioMode::TextToImage);
        s.set_uploads(vec![upload("a")]);
        assert!(s.images_for_api().is_empty());
    }

    #[test]
    fn eraser_sends_image_then_mask() {
        let mut s = session(StudioMode::MagicEraser);
        s.set_eraser_image(Some(upload("photo")));
        let mask = DataUrl::from_bytes("image/png", b"mask");
        s.set_mask(Some(mask.clone()));
        assert_eq!(s.images_for_api(), vec![upload("photo").data_url, mask]);
    }

    #[test]
    fn new_eraser_image_clears_mask() {
        let mut s = session(StudioMode::MagicEraser);
        s.set_eraser_image(Some(upload("one")));
        s.apply_mask_change(MaskChange::Updated(DataUrl::from_bytes("image/png", b"m")));
        assert!(s.mask().is_some());
        s.set_eraser_image(Some(upload("two")));
        assert!(s.mask().is_none());
    }

    #[test]
    fn cleared_mask_removes_it() {
        let mut s = session(StudioMode::MagicEraser);
        s.set_mask(Some(DataUrl::from_bytes("image/png", b"m")));
        s.apply_mask_change(MaskChange::Cleared);
        assert!(s.mask().is_none());
    }

    #[test]
    fn validation_order() {
        let mut s = session(StudioMode::StyleTransfer);
        assert_eq!(s.validate_generate(), Err(ValidationError::MissingUploads));
        s.set_uploads(vec![upload("a")]);
        assert_eq!(s.validate_generate(), Err(ValidationError::MissingStyleImage));
        s.set_style_image(Some(upload("s")));
        s.prompt.clear();
        assert_eq!(s.validate_generate(), Ok(()));

        let mut s = session(StudioMode::TextToImage);
        s.prompt = "   ".into();
        assert_eq!(s.validate_generate(), Err(ValidationError::MissingPrompt));
    }

    #[test]
    fn generate_disabled_rules() {
        let mut s = session(StudioMode::PhotoStudio);
        assert!(s.is_generate_disabled());
        s.set_uploads(vec![upload("a")]);
        assert!(!s.is_generate_disabled());

        let s = session(StudioMode::TextToImage);
        assert!(!s.is_generate_disabled());

        let mut s = session(StudioMode::MagicEraser);
        s.set_eraser_image(Some(upload("a")));
        assert!(s.is_generate_disabled());
        s.set_mask(Some(DataUrl::from_bytes("image/png", b"m")));
        assert!(!s.is_generate_disabled());
    }

    #[test]
    fn age_updates_only_existing_entries() {
        let mut s = session(StudioMode::PhotoStudio);
        s.set_uploads(vec![upload("a")]);
        s.set_age(0, "12");
        s.set_age(5, "99");
        assert_eq!(s.uploaded_images[0].age, "12");
        assert!(s.compose_prompt().contains("who is 12 years old"));
    }

    #[test]
    fn empty_error_text_uses_fallback() {
        let err = GenerateError::Message(String::new());
        assert_eq!(user_message(&err, GENERATE_FALLBACK), "An unknown error occurred.");
        let err = GenerateError::Message("quota exceeded".into());
        assert_eq!(user_message(&err, VARIATIONS_FALLBACK), "quota exceeded");
    }
}
