// ============================================================================
// Studio modes: the closed set of creative tools and their fixed templates
// ============================================================================

use std::fmt;
use std::str::FromStr;

/// Navigation target for the top-level view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Studio(StudioMode),
}

/// One variant per creative tool. Adding a mode means every `match` below
/// must be extended before the crate builds again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StudioMode {
    PhotoStudio,
    TextToImage,
    ProfilePicturePro,
    PhotoRestoration,
    ProductStudio,
    StyleTransfer,
    VintageCamera,
    BackgroundScene,
    MagicEraser,
}

impl StudioMode {
    /// Home-screen order.
    pub fn all() -> &'static [StudioMode] {
        &[
            StudioMode::PhotoStudio,
            StudioMode::TextToImage,
            StudioMode::ProfilePicturePro,
            StudioMode::PhotoRestoration,
            StudioMode::ProductStudio,
            StudioMode::StyleTransfer,
            StudioMode::VintageCamera,
            StudioMode::BackgroundScene,
            StudioMode::MagicEraser,
        ]
    }

    /// Stable camelCase tag (CLI `--mode`, log lines).
    pub fn tag(&self) -> &'static str {
        match self {
            StudioMode::PhotoStudio => "photoStudio",
            StudioMode::TextToImage => "textToImage",
            StudioMode::ProfilePicturePro => "profilePicturePro",
            StudioMode::PhotoRestoration => "photoRestoration",
            StudioMode::ProductStudio => "productStudio",
            StudioMode::StyleTransfer => "styleTransfer",
            StudioMode::VintageCamera => "vintageCamera",
            StudioMode::BackgroundScene => "backgroundScene",
            StudioMode::MagicEraser => "magicEraser",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StudioMode::PhotoStudio => "Photo Studio",
            StudioMode::TextToImage => "Text-to-Image Studio",
            StudioMode::ProfilePicturePro => "Profile Picture Pro",
            StudioMode::PhotoRestoration => "AI Photo Restoration",
            StudioMode::ProductStudio => "AI Product Studio",
            StudioMode::StyleTransfer => "AI Style Transfer",
            StudioMode::VintageCamera => "Vintage Camera",
            StudioMode::BackgroundScene => "Background Scene",
            StudioMode::MagicEraser => "Magic Eraser",
        }
    }

    /// Short blurb shown on the home-screen card.
    pub fn home_description(&self) -> &'static str {
        match self {
            StudioMode::PhotoStudio => {
                "Combine multiple photos into a single, professional studio portrait."
            }
            StudioMode::TextToImage => {
                "Generate a new image from scratch using only a text description."
            }
            StudioMode::ProfilePicturePro => {
                "Generate professional, high-quality headshots for your profile."
            }
            StudioMode::PhotoRestoration => {
                "Repair old, scratched, or faded photos and bring them back to life."
            }
            StudioMode::ProductStudio => {
                "Create professional product photos with custom backgrounds."
            }
            StudioMode::StyleTransfer => "Apply the artistic style of one image to another photo.",
            StudioMode::VintageCamera => "Apply classic film effects and retro styles to your photos.",
            StudioMode::BackgroundScene => {
                "Place your subjects in entirely new and creative environments."
            }
            StudioMode::MagicEraser => "Brush over unwanted objects and remove them from a photo.",
        }
    }

    /// Longer instructions shown in the studio header.
    pub fn studio_description(&self) -> &'static str {
        match self {
            StudioMode::PhotoStudio => {
                "Combine multiple photos into a single, professional studio portrait."
            }
            StudioMode::TextToImage => {
                "Generate a new image from scratch based on your text description."
            }
            StudioMode::ProfilePicturePro => {
                "Generate a professional headshot. For best results, upload one clear photo of the subject."
            }
            StudioMode::PhotoRestoration => {
                "Repair old, damaged, or faded photos. Upload one photo to restore."
            }
            StudioMode::ProductStudio => {
                "Create a professional product shot. Upload a photo of your product and describe the background."
            }
            StudioMode::StyleTransfer => {
                "Transfer the style from one image to another. Upload a content image and a style image."
            }
            StudioMode::VintageCamera => "Apply classic film effects and retro styles to your photos.",
            StudioMode::BackgroundScene => {
                "Place your subjects in entirely new and creative environments."
            }
            StudioMode::MagicEraser => {
                "Upload an image, then brush over any unwanted objects to remove them."
            }
        }
    }

    /// Label above the free-text prompt box.
    pub fn prompt_hint(&self) -> &'static str {
        match self {
            StudioMode::ProductStudio => "Describe the background for your product.",
            StudioMode::TextToImage => "Describe the image you want to create.",
            _ => "Describe the background and style of your portrait.",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            StudioMode::PhotoStudio => PHOTO_STUDIO_TEMPLATE,
            StudioMode::TextToImage => TEXT_TO_IMAGE_TEMPLATE,
            StudioMode::ProfilePicturePro => PROFILE_PICTURE_PRO_TEMPLATE,
            StudioMode::PhotoRestoration => PHOTO_RESTORATION_TEMPLATE,
            StudioMode::ProductStudio => PRODUCT_STUDIO_TEMPLATE,
            StudioMode::StyleTransfer => STYLE_TRANSFER_TEMPLATE,
            StudioMode::VintageCamera => VINTAGE_CAMERA_TEMPLATE,
            StudioMode::BackgroundScene => BACKGROUND_SCENE_TEMPLATE,
            StudioMode::MagicEraser => MAGIC_ERASER_TEMPLATE,
        }
    }

    /// Whether the mode reads the multi-image uploads list.
    /// Magic Eraser has its own single eraser image instead.
    pub fn uses_uploads(&self) -> bool {
        !matches!(self, StudioMode::TextToImage | StudioMode::MagicEraser)
    }

    /// Modes that hide the free-text prompt and never require it.
    pub fn is_promptless(&self) -> bool {
        matches!(
            self,
            StudioMode::PhotoRestoration | StudioMode::StyleTransfer | StudioMode::MagicEraser
        )
    }

    /// Modes that only send the first uploaded image.
    pub fn first_image_only(&self) -> bool {
        matches!(
            self,
            StudioMode::ProfilePicturePro
                | StudioMode::PhotoRestoration
                | StudioMode::ProductStudio
                | StudioMode::StyleTransfer
        )
    }

    pub fn shows_age_input(&self) -> bool {
        matches!(self, StudioMode::PhotoStudio)
    }

    pub fn supports_variations(&self) -> bool {
        !matches!(self, StudioMode::MagicEraser)
    }
}

impl fmt::Display for StudioMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected one of: {list})", list = valid_tags())]
pub struct UnknownMode(pub String);

fn valid_tags() -> String {
    StudioMode::all()
        .iter()
        .map(|m| m.tag())
        .collect::<Vec<_>>()
        .join(", ")
}

impl FromStr for StudioMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        StudioMode::all()
            .iter()
            .copied()
            .find(|m| m.tag().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMode(wanted.to_string()))
    }
}

// ============================================================================
// Fixed templates
// ============================================================================

const PHOTO_STUDIO_TEMPLATE: &str = r#"**TASK**: Execute a flawless composite of multiple subjects from various source images into a single, cohesive, and hyper-realistic professional studio portrait.
**CONTEXT**: The final product is for a premium, high-end client, such as a corporate team or a family seeking a legacy portrait. The image must be technically perfect and emotionally resonant, appearing as if captured in one moment by a world-class photographer.
**LIGHTING**: Implement a sophisticated multi-point lighting setup. The key light should be a large octabox providing soft, diffused light, creating a gentle "loop" or "Rembrandt" pattern on the faces. A fill light, at a 3:1 or 4:1 ratio to the key, should be used to gently lift shadows without eliminating depth. A subtle hair light/rim light from above and behind should be applied to each subject to create separation from the background. Crucially, ensure consistent catchlights are present in every subject's eyes, indicating a single primary light source.
**BACKGROUND**: Generate a premium, textured studio backdrop. Options include a hand-painted canvas look (like Oliphant or Gravity backdrops) in a neutral dark grey or deep olive green, or a clean, modern architectural element that is completely out of focus. The background must have a subtle, pleasing gradient and texture, adding depth without distracting.
**SUBJECT ARRANGEMENT**: Arrange subjects in a classic, triangular, or "V" formation that promotes visual harmony and balance. Poses should be natural and interactive, with subtle physical contact or overlapping to suggest connection. Critically, use the provided age data to scale each individual realistically. Their eyelines should converge at a point slightly off-camera to create a unified, candid feel.
**CAMERA & LENS SIMULATION**: Emulate a medium format camera system (like a Hasselblad or Phase One) with a 110mm f/2 lens. This choice ensures exceptional detail, smooth tonal transitions, and a beautiful, gradual falloff from the plane of focus. The focus must be critically sharp on the subjects' eyes.
**POST-PROCESSING**: Apply advanced, non-destructive post-processing techniques. Perform meticulous color grading to unify skin tones across all subjects. Use frequency separation for subtle, natural skin retouching, preserving texture. Employ dodging and burning to enhance facial contours and add three-dimensionality. The final output must be absolutely seamless, with no discernible artifacts from the compositing process."#;

const PROFILE_PICTURE_PRO_TEMPLATE: &str = r#"**TASK**: Generate a photorealistic, high-end corporate or personal branding headshot of the subject from the provided photo.
**CONTEXT**: The image is for a C-suite executive, thought leader, or professional for use on LinkedIn, a company 'About Us' page, or a conference speaker bio. The desired impression is one of confidence, expertise, and approachability.
**COMPOSITION**: Frame the subject as a classic head-and-shoulders or bust-up portrait. There should be appropriate headroom and the subject should be slightly angled to the camera to create a more dynamic pose.
**LIGHTING**: Employ a sophisticated lighting setup. A large, diffused key light (e.g., a 5-foot octabox) should create soft, flattering light on the face. A reflector or a heavily diffused fill light should be used on the opposite side to gently soften shadows. A subtle "kicker" or rim light should be used to define the jawline and separate the subject from the background. Ensure a distinct, single catchlight is visible in each eye, making the subject appear engaged and vibrant.
**BACKGROUND**: The background must be professional and non-distracting. Generate a softly blurred, modern office interior with pleasing bokeh from background light sources. Alternatively, a clean, neutral-toned studio backdrop (light grey, charcoal) with a very subtle gradient is also acceptable. The background should complement, not compete with, the subject.
**SUBJECT'S EXPRESSION & ATTIRE**: Maintain the subject's core facial features, hairstyle, and clothing from the source image. The expression should be coached to a slight, genuine smile or a confident, neutral look. The goal is authenticity and professionalism.
**CAMERA & LENS SIMULATION**: Simulate a high-resolution full-frame mirrorless camera like a Sony A7R IV or Canon R5, paired with a premium 85mm f/1.4 or 105mm f/1.4 lens. The focus must be razor-sharp on the subject's eyes. Render realistic skin texture; avoid an overly airbrushed or plastic look. The final image should be delivered in an sRGB color space, ready for web use."#;

const VINTAGE_CAMERA_TEMPLATE: &str = r#"**TASK**: Meticulously transform the provided photograph into an authentic-looking vintage image, perfectly replicating the aesthetic of a 35mm film photograph from the mid-1970s.
**AESTHETIC**: The goal is a historically accurate recreation, not a modern digital filter. The final image should be indistinguishable from a genuine, well-preserved slide or print from the era.
**FILM STOCK SIMULATION**: Emulate the distinct characteristics of Kodachrome 64 slide film. This requires a specific color science: deeply saturated reds, rich but slightly cyan-shifted blues, and warm, golden-hued highlights. Greens should be slightly muted. The dynamic range should be limited, with deep but detailed shadows and highlights that roll off gently without harsh clipping.
**LENS & CAMERA ARTIFACTS**: Simulate a popular consumer-grade prime lens from the 1970s (e.g., a Pentax Takumar 50mm f/1.4). Introduce subtle optical imperfections characteristic of such lenses: a soft vignette, slight barrel distortion, and minor chromatic aberration (red/cyan fringing) on high-contrast edges. If a bright light source is present, render a period-accurate lens flare, often appearing as a series of hexagonal or pentagonal ghosts corresponding to the lens's aperture blades.
**TEXTURE & GRAIN**: The image must feature a fine, organic film grain structure. This is not digital noise. The grain should be most apparent in the mid-tones and should be non-uniform. Also, introduce subtle "halation," a soft red-orange glow around the edges of bright, overexposed highlights, which is a classic artifact of film.
**FOCUS & COMPOSITION**: The plane of focus should be relatively shallow, and the focus itself should be slightly softer than modern digital standards, especially towards the corners of the frame. The overall image should feel candid and unposed, reflecting the photographic style of the time."#;

const BACKGROUND_SCENE_TEMPLATE: &str = r#"**TASK**: Execute a flawless, photorealistic composite of the subjects from the source images into the new background scene described in the prompt.
**CORE OBJECTIVE**: The final image must achieve perfect realism, creating the illusion that the scene was captured in-camera in a single shot. The integration must be invisible to a discerning eye.
**LIGHTING INTEGRATION (CRITICAL)**:
1. **Analyze the Environment Map**: Accurately determine the properties of the light in the target scene: directionality (angle of the sun or key light), color temperature (warm sunset, cool overcast day), and quality (hard, specular light vs. soft, diffused light).
2. **Re-light the Subjects**: Apply this lighting model to the subjects. This includes recreating specular highlights, diffuse reflections, and accurate shadow casting.
3. **Shadows**: Shadows cast by the subjects must match the direction, hardness, and color of shadows in the scene. Pay attention to both cast shadows and contact shadows where the subjects touch surfaces.
**COLOR & ATMOSPHERIC HARMONIZATION**:
1. **Color Bleed**: The subjects must pick up ambient light and color from their new surroundings. A subject in a lush green forest should have subtle green hues reflected in their shadows and on their skin/clothing.
2. **Black/White Point Matching**: The darkest and brightest points on the subjects must be perfectly aligned with the dynamic range of the background scene to avoid a "cut-out" look.
3. **Atmospheric Perspective**: Apply effects like haze, fog, or dust realistically. If a subject is further in the distance, their contrast and saturation should be slightly reduced to match the atmospheric conditions.
**PHYSICAL INTEGRATION**: Ensure the scale, perspective, and focal length match between the subjects and the background. The edges of the subjects should be blended seamlessly, perhaps with a subtle light wrap from the background bleeding over their edges. The final image must be a physically and optically coherent scene."#;

const TEXT_TO_IMAGE_TEMPLATE: &str = r#"**TASK**: Function as a high-end generative engine for a senior concept artist or creative director. Create a photorealistic, cinematic, and emotionally resonant image based on the user's text prompt.
**QUALITY BENCHMARK**: The output must meet the standards of a flagship film production's keyframe art, a cover for a AAA video game, or a high-fashion editorial photograph. Strive for unparalleled realism, intricate detail, and a powerful, atmospheric mood.
**ARTISTIC DIRECTION**:
1.  **Conceptualization**: Before rendering, deeply interpret the prompt's intent. What is the story being told? What is the core emotion? Use this interpretation to guide all subsequent artistic choices.
2.  **Cinematic Composition**: Employ masterful compositional techniques. Use leading lines, the golden ratio, dynamic symmetry, and negative space to create a visually arresting image. Establish a clear foreground, midground, and background to create an immersive sense of depth and scale.
3.  **Advanced Lighting**: Do not settle for simple lighting. Implement complex, motivated lighting schemes that tell a story. Use techniques like volumetric lighting to show light rays, caustics for realistic water/glass reflections, and global illumination for bounce light that fills the scene with realistic color. Light should sculpt forms, reveal textures, and create mood.
4.  **Physical Materiality (PBR)**: Render all materials with physical accuracy. Metal should have realistic specular reflections and anisotropy. Skin should exhibit subsurface scattering, making it look soft and alive. Fabric should have believable weave and folds. Use high-resolution textures and displacement maps to create tactile surfaces.
5.  **Lens and Camera Simulation**: Simulate the use of a specific camera and lens to enhance the visual narrative. For example, use a wide-angle lens with slight distortion for an epic landscape, or a telephoto lens with heavy compression for an intimate portrait. Add subtle, realistic artifacts like film grain, chromatic aberration, or a gentle vignette to sell the photographic illusion.
**FINAL POLISH**: The final image must be a masterpiece of digital art, rich in detail, mood, and narrative power."#;

const PHOTO_RESTORATION_TEMPLATE: &str = r#"**TASK**: You are an expert archival photo restorationist using state-of-the-art AI tools. Your mission is to restore the provided damaged photograph to its original pristine condition while preserving its historical authenticity and character.
**GOAL**: The final output should look like a perfectly preserved print from the day it was developed. This is a meticulous restoration, not a modernization or colorization unless explicitly requested.
**RESTORATION PROTOCOL**:
1.  **Structural Damage Repair**: Identify and meticulously reconstruct areas with physical damage. Use advanced inpainting and texture synthesis to seamlessly repair scratches, tears, creases, folds, and water damage. The repairs must be invisible, perfectly matching the original image's texture, grain, and content.
2.  **Surface Blemish Removal**: Eliminate all surface-level imperfections. This includes dust specks, chemical stains, fingerprints, and mold spots.
3.  **De-Fading and Contrast Recovery**: Analyze the image histogram to correct for age-related fading. Restore the full, original tonal range. Blacks should be deep but not crushed, whites should be clean but not blown out, and mid-tones should be rich with detail.
4.  **Color Fidelity Correction (For Color Photos)**: Correct the color shifts and fading common in older color prints. Neutralize color casts, restore vibrancy, and ensure skin tones are natural and accurate to the period.
5.  **Clarity and Detail Enhancement**: Employ AI-powered deconvolution algorithms to correct for softness, minor motion blur, or missed focus from the original camera. Intelligently sharpen key details, especially in faces and textiles, without introducing digital artifacts or over-sharpening.
6.  **Noise and Grain Management**: Carefully reduce distracting noise or excessive grain while preserving the fine, desirable grain structure that gives the photo its character. The goal is to clean the image, not to make it look unnaturally sterile or "digital."
**ETHICAL CONSTRAINT**: You must not alter the fundamental content or subjects of the photograph. The restoration must be a faithful tribute to the original moment captured."#;

const PRODUCT_STUDIO_TEMPLATE: &str = r#"**TASK**: Create a flawless, high-end commercial product photograph suitable for a premium e-commerce website, print catalog, or digital advertising campaign.
**CONTEXT**: The final image must make the product look as appealing and high-quality as possible, driving consumer desire and trust. The aesthetic should be clean, modern, and professional.
**WORKFLOW**:
1.  **Perfect Product Isolation**: Using advanced masking, perform a perfect, clean-edged isolation of the product from its source image. Pay special attention to complex areas like fine details or transparent elements.
2.  **Background Integration**: Place the isolated product onto the new background specified in the user's SCENE DESCRIPTION. This could be a pure white infinity cove (cyclorama), a textured surface like marble or wood, or a lifestyle environment.
3.  **Advanced Studio Lighting**: Simulate a sophisticated, multi-light studio setup designed to flatter the product. Use large, soft light sources (strip boxes, octaboxes) to create broad, smooth gradients and highlights that define the product's form. Use smaller, harder lights or reflectors to add specular highlights ("pings") that accentuate texture and material quality.
4.  **Realistic Shadow and Reflection Casting**: Generate physically accurate shadows. This includes a soft, diffused contact shadow where the product meets the surface, grounding it in the scene. If the surface is reflective, generate a subtle, realistic reflection of the product.
5.  **Color Accuracy & Post-Processing**: Ensure the product's colors are accurate and vibrant. Perform minor cleanup to remove any dust or imperfections. Enhance local contrast to make details pop. The final image must be crisp, clear, and perfectly lit.
**OUTPUT REQUIREMENTS**: The product must be the clear hero of the shot. The lighting should be masterful, revealing form and texture. The overall impression must be one of luxury and high quality."#;

const STYLE_TRANSFER_TEMPLATE: &str = r#"**TASK**: Perform an advanced artistic style transfer, re-rendering a 'Content Image' in the comprehensive aesthetic of a 'Style Image'.
**INPUTS**: Image 1 is the 'Content Image' (defining subject and composition). Image 2 is the 'Style Image' (defining the complete artistic treatment).
**DEEP STYLE ANALYSIS**: This is not a simple filter or texture overlay. You must perform a deep, multi-layered analysis of the 'Style Image' to reverse-engineer its artistic essence. Deconstruct the following elements:
1.  **Macro-Composition & Color Theory**: Analyze the overall color palette, dominant color harmonies (e.g., complementary, analogous), and the global distribution of light and shadow (chiaroscuro, high-key, etc.).
2.  **Meso-Structure & Form**: Identify how the artist renders form. Do they use hard edges, soft gradients, expressive lines, or geometric shapes? Analyze the "brushwork": the texture, direction, and energy of the strokes.
3.  **Micro-Texture & Detail**: Extract the fine-grained texture of the medium itself. Is it the impasto of thick oil paint, the delicate grain of a watercolor paper, the clean lines of a vector illustration, or the halftone dots of a comic book?
**SYNTHESIS & RECONSTRUCTION**:
Use the extracted style parameters to completely reconstruct the 'Content Image'. Every pixel of the content should be re-imagined and re-rendered through the lens of the style. The original composition, subjects, and forms of the 'Content Image' must remain coherent and recognizable, but their execution must be entirely that of the 'Style Image' artist.
**FINAL GOAL**: The output should be a new, cohesive piece of art. It should appear as if the master artist of the 'Style Image' had created a new work depicting the subject of the 'Content Image'. The fusion should be seamless and artistically convincing."#;

const MAGIC_ERASER_TEMPLATE: &str = r#"**TASK**: You are an advanced, context-aware inpainting AI. Your function is to flawlessly remove a designated object from a photograph, leaving absolutely no trace of its existence or the editing process.
**INPUTS**: You will receive an original source image and a corresponding black-and-white mask image.
**DIRECTIVE**: The white area on the mask image represents the target for complete obliteration. The black area is to remain untouched and preserved with perfect fidelity.
**EXECUTION PROTOCOL**:
1.  **Boundary Analysis**: First, analyze the pixel information immediately surrounding the masked region. Identify patterns, textures, gradients, and structural lines (e.g., edges of walls, horizons).
2.  **Structure Propagation**: Intelligently extend the structural lines from the surrounding area into the void. The algorithm must understand perspective, ensuring that lines converge correctly and patterns scale appropriately with distance.
3.  **Texture Synthesis**: Generate new, plausible texture to fill the area, based on the analyzed surroundings. This texture must seamlessly match the original in terms of detail, noise/grain structure, and lighting.
4.  **Lighting & Shading Reconstruction**: This is critical. Analyze the light and shadow information across the entire image. The filled-in area must be shaded with a gradient that perfectly matches what would realistically be there. It must correctly receive light and cast subtle shadows as if it were part of the original scene.
5.  **Seamless Integration**: The final step is to blend the newly generated patch into the original image at a sub-pixel level, ensuring there are no discernible seams, color mismatches, or changes in luminance.
**FINAL OUTPUT**: Produce a single, photorealistic image where the masked object has vanished, and the reconstructed background is so perfect that it appears to have been part of the original, unedited photograph."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_from_str() {
        for mode in StudioMode::all() {
            assert_eq!(mode.tag().parse::<StudioMode>(), Ok(*mode));
        }
        assert_eq!("MAGICERASER".parse::<StudioMode>(), Ok(StudioMode::MagicEraser));
    }

    #[test]
    fn unknown_tag_lists_valid_choices() {
        let err = "oilPainting".parse::<StudioMode>().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("oilPainting"));
        assert!(msg.contains("styleTransfer"));
    }

    #[test]
    fn input_requirements_by_mode() {
        assert!(!StudioMode::TextToImage.uses_uploads());
        assert!(!StudioMode::MagicEraser.uses_uploads());
        assert!(StudioMode::BackgroundScene.uses_uploads());
        assert!(StudioMode::StyleTransfer.is_promptless());
        assert!(!StudioMode::ProductStudio.is_promptless());
        assert!(StudioMode::ProfilePicturePro.first_image_only());
        assert!(!StudioMode::VintageCamera.first_image_only());
        assert!(!StudioMode::MagicEraser.supports_variations());
    }

    #[test]
    fn every_template_opens_with_a_task_section() {
        for mode in StudioMode::all() {
            assert!(mode.template().starts_with("**TASK**"), "{mode}");
        }
    }
}
