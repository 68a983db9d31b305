// ============================================================================
// PhotoStudio CLI: headless generation via command-line arguments
// ============================================================================
//
// Usage examples:
//   PhotoStudio --mode textToImage --prompt "a lighthouse at dusk" -o out.png
//   PhotoStudio -m photoStudio -i mum.jpg dad.jpg --age 61 63 --prompt "garden party"
//   PhotoStudio -m styleTransfer -i photo.jpg --style monet.jpg --variations --output-dir out/
//   PhotoStudio -m magicEraser -i beach.jpg --mask beach-mask.png -o clean.png
//   PhotoStudio -m productStudio -i "shots/*.png" --dry-run
//
// No window is opened in CLI mode. Generation runs on the same session type
// the GUI uses, so validation and prompt composition are identical.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Instant, SystemTime};

use anyhow::{Context, bail};
use clap::Parser;

use crate::io::{self, DataUrl, UploadedImage};
use crate::mode::StudioMode;
use crate::ops::generate::{GeminiGenerator, ImageGenerator};
use crate::ops::prompt::AspectRatio;
use crate::session::StudioSession;
use crate::settings::StudioSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// PhotoStudio headless image generator.
#[derive(Parser, Debug)]
#[command(
    name = "PhotoStudio",
    version,
    about = "PhotoStudio headless image generator",
    long_about = "Run any studio mode from the command line without opening the GUI.\n\
                  Modes: photoStudio, textToImage, profilePicturePro, photoRestoration,\n\
                  productStudio, styleTransfer, vintageCamera, backgroundScene, magicEraser.\n\n\
                  Example:\n  \
                  PhotoStudio --mode textToImage --prompt \"a red fox\" --output fox.png\n  \
                  PhotoStudio -m photoRestoration -i old.jpg --variations --output-dir out/"
)]
pub struct CliArgs {
    /// Studio mode tag (case-insensitive).
    #[arg(short, long, value_name = "MODE")]
    pub mode: StudioMode,

    /// Input photo(s). Glob patterns accepted. Order is preserved.
    /// For magicEraser, the first input is the photo to edit.
    #[arg(short, long, num_args = 1.., value_name = "FILE")]
    pub input: Vec<String>,

    /// Style reference image (styleTransfer).
    #[arg(long, value_name = "FILE")]
    pub style: Option<PathBuf>,

    /// Black/white PNG mask marking the area to remove (magicEraser).
    #[arg(long, value_name = "PNG")]
    pub mask: Option<PathBuf>,

    /// Prompt text. Defaults to the mode's template when omitted.
    #[arg(short, long, conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Read the prompt from a file.
    #[arg(long, value_name = "FILE")]
    pub prompt_file: Option<PathBuf>,

    /// Things the image must not contain.
    #[arg(long, value_name = "TEXT")]
    pub negative: Option<String>,

    /// Output aspect ratio: 4:5, 1:1 or 16:9. Defaults to the saved setting.
    #[arg(short, long, value_name = "RATIO")]
    pub aspect: Option<AspectRatio>,

    /// Subject ages, one per input in the same order.
    #[arg(long, num_args = 1.., value_name = "AGE")]
    pub age: Vec<String>,

    /// Output file for the generated image.
    #[arg(short, long, value_name = "FILE", conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Output directory; files are named like the GUI's downloads.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Also generate four variations of the result.
    #[arg(long)]
    pub variations: bool,

    /// Print the composed prompt and the images that would be sent, then exit.
    #[arg(long)]
    pub dry_run: bool,

    /// Debug-level logging and per-step timing.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Returns `true` when `--mode` is present in the real process arguments.
    /// Used by `main()` to route before creating an eframe window.
    pub fn is_cli_mode() -> bool {
        std::env::args().skip(1).any(|a| {
            a == "--mode" || a == "-m" || a.starts_with("--mode=") || a.starts_with("-m=")
        })
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the CLI and return an OS exit code (`0` success, `1` any failure).
pub fn run(args: CliArgs) -> ExitCode {
    let settings = StudioSettings::load();
    let generator: Arc<dyn ImageGenerator> = match GeminiGenerator::from_settings(&settings) {
        Ok(g) => Arc::new(g),
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match execute(&args, &settings, generator) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("cli run failed: {:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

pub(crate) fn execute(
    args: &CliArgs,
    settings: &StudioSettings,
    generator: Arc<dyn ImageGenerator>,
) -> anyhow::Result<()> {
    let mut session = build_session(args, settings, generator)?;

    if args.dry_run {
        session.validate_generate()?;
        print_dry_run(&session);
        return Ok(());
    }

    let started = Instant::now();
    session.generate()?;
    session.wait();
    if let Some(msg) = session.error() {
        bail!("generation failed: {}", msg);
    }
    let Some(image) = session.generated_image().cloned() else {
        bail!("generation finished without an image");
    };
    if args.verbose {
        println!("generated in {:.1}s", started.elapsed().as_secs_f64());
    }

    let primary = primary_output_path(args, SystemTime::now());
    write_output(&image, &primary)?;
    println!("{}", primary.display());

    if args.variations {
        let started = Instant::now();
        session.request_variations()?;
        session.wait();
        if let Some(msg) = session.error() {
            bail!("variations failed: {}", msg);
        }
        // Index 0 is the original, already written above.
        for (n, variation) in session.variation_images().iter().enumerate().skip(1) {
            let path = variation_path(&primary, n);
            write_output(variation, &path)?;
            println!("{}", path.display());
        }
        if args.verbose {
            println!("variations in {:.1}s", started.elapsed().as_secs_f64());
        }
    }
    Ok(())
}

/// Populate a session from the arguments, loading every referenced file.
pub(crate) fn build_session(
    args: &CliArgs,
    settings: &StudioSettings,
    generator: Arc<dyn ImageGenerator>,
) -> anyhow::Result<StudioSession> {
    let mode = args.mode;
    let mut session = StudioSession::new(mode, generator);
    session.aspect_ratio = args.aspect.unwrap_or(settings.default_aspect_ratio);

    let inputs = resolve_inputs(&args.input)?;

    if mode == StudioMode::MagicEraser {
        if let Some(first) = inputs.first() {
            let photo = io::load_uploaded_image(first)
                .with_context(|| format!("loading photo to edit '{}'", first.display()))?;
            session.set_eraser_image(Some(photo));
        }
        if let Some(mask_path) = &args.mask {
            let mask = load_data_url(mask_path).context("loading mask")?;
            session.set_mask(Some(mask));
        }
    } else {
        let mut uploads: Vec<UploadedImage> =
            io::load_uploaded_images(&inputs).context("loading input images")?;
        for (upload, age) in uploads.iter_mut().zip(&args.age) {
            upload.age = age.clone();
        }
        session.set_uploads(uploads);
    }

    if let Some(style_path) = &args.style {
        let style = io::load_uploaded_image(style_path)
            .with_context(|| format!("loading style image '{}'", style_path.display()))?;
        session.set_style_image(Some(style));
    }

    if let Some(prompt) = &args.prompt {
        session.prompt = prompt.clone();
    } else if let Some(path) = &args.prompt_file {
        session.prompt = std::fs::read_to_string(path)
            .with_context(|| format!("reading prompt file '{}'", path.display()))?;
    }
    if let Some(negative) = &args.negative {
        session.negative_prompt = negative.clone();
    }
    Ok(session)
}

fn load_data_url(path: &Path) -> anyhow::Result<DataUrl> {
    Ok(io::load_uploaded_image(path)?.data_url)
}

fn print_dry_run(session: &StudioSession) {
    println!("mode:   {} ({})", session.mode(), session.mode().title());
    println!("aspect: {}", session.aspect_ratio);
    println!("images: {}", session.images_for_api().len());
    println!("--- prompt ---");
    println!("{}", session.compose_prompt());
}

fn write_output(image: &DataUrl, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory '{}'", parent.display()))?;
    }
    io::save_data_url_as_png(image, path)?;
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Each `--input` is an existing file or a glob. Glob hits are limited to
/// image extensions and sorted; the first occurrence of a path wins. A
/// pattern that yields nothing is an error.
fn resolve_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut inputs: Vec<PathBuf> = Vec::new();
    for pattern in patterns {
        let literal = PathBuf::from(pattern);
        let hits = if literal.is_file() {
            vec![literal]
        } else {
            let mut hits: Vec<PathBuf> = glob::glob(pattern)
                .with_context(|| format!("invalid input pattern '{}'", pattern))?
                .filter_map(Result::ok)
                .filter(|p| p.is_file() && has_image_extension(p))
                .collect();
            hits.sort();
            hits
        };
        if hits.is_empty() {
            bail!("input '{}' matched no image files", pattern);
        }
        log::debug!("input '{}' -> {} file(s)", pattern, hits.len());
        for hit in hits {
            if !inputs.contains(&hit) {
                inputs.push(hit);
            }
        }
    }
    Ok(inputs)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| io::IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// `--output` if given, else the download-style name inside `--output-dir`
/// (or the current directory).
fn primary_output_path(args: &CliArgs, now: SystemTime) -> PathBuf {
    if let Some(out) = &args.output {
        return out.clone();
    }
    let name = io::download_file_name(now);
    match &args.output_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// `out.png` -> `out-variation-2.png`
fn variation_path(primary: &Path, n: usize) -> PathBuf {
    let stem = primary
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ai-photostudio".to_string());
    primary.with_file_name(format!("{}-variation-{}.png", stem, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("PhotoStudio").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn mode_and_aspect_parse() {
        let args = parse(&["--mode", "StyleTransfer", "--aspect", "16:9"]);
        assert_eq!(args.mode, StudioMode::StyleTransfer);
        assert_eq!(args.aspect, Some(AspectRatio::Landscape));
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = CliArgs::try_parse_from(["PhotoStudio", "--mode", "sketch"]).unwrap_err();
        assert!(err.to_string().contains("unknown mode 'sketch'"));
    }

    #[test]
    fn prompt_and_prompt_file_conflict() {
        let res = CliArgs::try_parse_from([
            "PhotoStudio",
            "-m",
            "textToImage",
            "--prompt",
            "x",
            "--prompt-file",
            "p.txt",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn output_naming() {
        let now = UNIX_EPOCH + Duration::from_millis(1_700_000_000_123);
        let args = parse(&["-m", "textToImage", "--output-dir", "out"]);
        let primary = primary_output_path(&args, now);
        assert_eq!(primary, Path::new("out").join("ai-photostudio-1700000000123.png"));
        assert_eq!(
            variation_path(&primary, 3),
            Path::new("out").join("ai-photostudio-1700000000123-variation-3.png")
        );

        let args = parse(&["-m", "textToImage", "-o", "fox.png"]);
        assert_eq!(primary_output_path(&args, now), PathBuf::from("fox.png"));
    }

    #[test]
    fn literal_inputs_keep_order_and_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        std::fs::write(&a, b"x").unwrap();
        std::fs::write(&b, b"x").unwrap();
        let patterns = vec![
            b.display().to_string(),
            a.display().to_string(),
            b.display().to_string(),
        ];
        assert_eq!(resolve_inputs(&patterns).unwrap(), vec![b, a]);
    }

    struct Fixed;

    impl ImageGenerator for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(
            &self,
            _images: &[DataUrl],
            _prompt: &str,
        ) -> Result<DataUrl, crate::ops::generate::GenerateError> {
            Ok(DataUrl::from_bytes("image/png", b"png-bytes"))
        }
    }

    #[test]
    fn writes_result_and_variations() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("sub").join("fox.png");
        let out_arg = out.display().to_string();
        let args = parse(&["-m", "textToImage", "-p", "a fox", "-o", &out_arg, "--variations"]);
        execute(&args, &StudioSettings::default(), Arc::new(Fixed)).unwrap();
        assert_eq!(std::fs::read(&out).unwrap(), b"png-bytes");
        for n in 1..=4 {
            assert!(dir.path().join("sub").join(format!("fox-variation-{n}.png")).exists());
        }
        assert!(!dir.path().join("sub").join("fox-variation-5.png").exists());
    }

    #[test]
    fn refusal_surfaces_user_message() {
        let args = parse(&["-m", "magicEraser", "--dry-run"]);
        let err = execute(&args, &StudioSettings::default(), Arc::new(Fixed)).unwrap_err();
        assert_eq!(err.to_string(), "Please upload an image to edit.");
    }

    #[test]
    fn ages_attach_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        std::fs::write(&a, b"\x89PNG\r\n\x1a\n").unwrap();
        std::fs::write(&b, b"\x89PNG\r\n\x1a\n").unwrap();
        let (a, b) = (a.display().to_string(), b.display().to_string());
        let args = parse(&["-m", "photoStudio", "-i", &a, &b, "--age", "7", "40"]);
        let session = build_session(&args, &StudioSettings::default(), Arc::new(Fixed)).unwrap();
        assert_eq!(session.uploaded_images.len(), 2);
        assert_eq!(session.uploaded_images[1].age, "40");
        assert!(session.compose_prompt().contains("who is 7 years old"));
    }

    #[test]
    fn glob_inputs_expand() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one.jpg", "two.jpg", "skip.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let pattern = dir.path().join("*").display().to_string();
        let found = resolve_inputs(&[pattern]).unwrap();
        assert_eq!(found, vec![dir.path().join("one.jpg"), dir.path().join("two.jpg")]);
    }

    #[test]
    fn unmatched_pattern_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        let pattern = dir.path().join("*.png").display().to_string();
        let err = resolve_inputs(&[pattern.clone()]).unwrap_err();
        assert_eq!(err.to_string(), format!("input '{}' matched no image files", pattern));
    }
}
