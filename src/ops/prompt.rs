// ============================================================================
// PROMPT COMPOSER: mode template + user fields → one instruction string
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mode::StudioMode;

pub const DEFAULT_NEGATIVE_PROMPT: &str = "blurry, deformed, extra limbs, poorly drawn, text, watermark, ugly, disfigured, mutated, missing limbs";

const ARRANGEMENT_BLOCK: &str = "**ARRANGEMENT & SCALING INSTRUCTIONS**:
- Arrange all individuals in a natural, believable pose suitable for the scene.
- **CRITICAL**: If multiple people are present, use the provided ages to ensure realistic height and body proportions relative to one another. Younger individuals must be visibly shorter than adults.
- Ensure consistent lighting, shadows, and color grading across all subjects to make them look like they were photographed together in the same environment.";

const RETAIN_FEATURES: &str =
    "IMPORTANT: You must retain their original clothing, hairstyle, and distinct facial features from their photo.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub fn all() -> &'static [AspectRatio] {
        &[AspectRatio::Portrait, AspectRatio::Square, AspectRatio::Landscape]
    }

    pub fn ratio(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "4:5",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
        }
    }

    /// Toggle-button caption.
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "Portrait (4:5)",
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Landscape => "Landscape (16:9)",
        }
    }

    fn phrase(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "a 4:5 portrait aspect ratio",
            AspectRatio::Square => "a 1:1 square aspect ratio",
            AspectRatio::Landscape => "a 16:9 landscape aspect ratio",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ratio())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AspectRatio::all()
            .iter()
            .copied()
            .find(|a| a.ratio() == s.trim())
            .ok_or_else(|| format!("unsupported aspect ratio '{}' (use 4:5, 1:1 or 16:9)", s))
    }
}

/// Everything the composer reads besides the mode.
#[derive(Clone, Debug, Default)]
pub struct PromptInputs<'a> {
    /// Free-text scene description / guiding keywords / full prompt.
    pub prompt: &'a str,
    pub negative_prompt: &'a str,
    pub aspect_ratio: AspectRatio,
    /// One age hint per uploaded image, in upload order. Blank = unknown.
    pub subject_ages: Vec<&'a str>,
}

fn age_hint(age: &str) -> String {
    let age = age.trim();
    if age.is_empty() {
        "of unknown age".to_string()
    } else {
        format!("who is {} years old", age)
    }
}

fn aspect_line(aspect: AspectRatio) -> String {
    format!(
        "**ASPECT RATIO**: The final image must have {}.",
        aspect.phrase()
    )
}

fn negative_line(negative: &str) -> String {
    format!(
        "**NEGATIVE PROMPT**: Do not include any of the following: {}.",
        negative
    )
}

fn people_lines(ages: &[&str]) -> String {
    ages.iter()
        .enumerate()
        .map(|(i, age)| {
            format!(
                "- Person {n} (from image {n}): A person {}. {}",
                age_hint(age),
                RETAIN_FEATURES,
                n = i + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the final instruction for `mode`. Pure: same inputs, same string.
pub fn compose(mode: StudioMode, inputs: &PromptInputs<'_>) -> String {
    let aspect = aspect_line(inputs.aspect_ratio);
    let negative = negative_line(inputs.negative_prompt);
    let template = mode.template();

    let sections: Vec<String> = match mode {
        StudioMode::MagicEraser => vec![template.to_string()],
        StudioMode::TextToImage => vec![inputs.prompt.to_string(), aspect, negative],
        StudioMode::PhotoRestoration => vec![template.to_string(), aspect, negative],
        StudioMode::ProductStudio => vec![
            template.to_string(),
            format!("**SCENE DESCRIPTION**: {}", inputs.prompt),
            aspect,
            negative,
        ],
        StudioMode::StyleTransfer => vec![
            template.to_string(),
            format!("**GUIDING KEYWORDS**: {}", inputs.prompt),
            aspect,
            negative,
        ],
        StudioMode::ProfilePicturePro => {
            let age = inputs.subject_ages.first().copied().unwrap_or("");
            vec![
                template.to_string(),
                "**PERSON TO FEATURE**:".to_string(),
                format!(
                    "- A person {}. {} The final result must be a head-and-shoulders composition.",
                    age_hint(age),
                    RETAIN_FEATURES
                ),
                "**SCENE DESCRIPTION**:".to_string(),
                inputs.prompt.to_string(),
                aspect,
                negative,
            ]
        }
        StudioMode::PhotoStudio | StudioMode::VintageCamera | StudioMode::BackgroundScene => vec![
            template.to_string(),
            "**PEOPLE TO INCLUDE**:".to_string(),
            people_lines(&inputs.subject_ages),
            "**SCENE DESCRIPTION**:".to_string(),
            inputs.prompt.to_string(),
            ARRANGEMENT_BLOCK.to_string(),
            aspect,
            negative,
        ],
    };

    sections.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(prompt: &'a str, ages: Vec<&'a str>) -> PromptInputs<'a> {
        PromptInputs {
            prompt,
            negative_prompt: DEFAULT_NEGATIVE_PROMPT,
            aspect_ratio: AspectRatio::Portrait,
            subject_ages: ages,
        }
    }

    #[test]
    fn style_transfer_places_keywords_after_template() {
        let out = compose(StudioMode::StyleTransfer, &inputs("ukiyo-e, bold outlines", vec![""]));
        let template_at = out.find(StudioMode::StyleTransfer.template()).unwrap();
        let keywords_at = out.find("**GUIDING KEYWORDS**: ukiyo-e, bold outlines").unwrap();
        assert_eq!(template_at, 0);
        assert!(keywords_at > template_at);
    }

    #[test]
    fn profile_picture_mentions_age() {
        let out = compose(StudioMode::ProfilePicturePro, &inputs("office", vec!["34"]));
        let line = out
            .lines()
            .find(|l| l.starts_with("- A person"))
            .unwrap();
        assert!(line.contains("who is 34 years old"));
        assert!(line.ends_with("head-and-shoulders composition."));
    }

    #[test]
    fn profile_picture_without_upload_is_unknown_age() {
        let out = compose(StudioMode::ProfilePicturePro, &inputs("office", vec![]));
        assert!(out.contains("- A person of unknown age."));
    }

    #[test]
    fn group_modes_list_every_subject_in_order() {
        let out = compose(StudioMode::PhotoStudio, &inputs("beach", vec!["8", "", " 41 "]));
        let people: Vec<&str> = out.lines().filter(|l| l.starts_with("- Person")).collect();
        assert_eq!(people.len(), 3);
        assert!(people[0].starts_with("- Person 1 (from image 1): A person who is 8 years old."));
        assert!(people[1].starts_with("- Person 2 (from image 2): A person of unknown age."));
        assert!(people[2].contains("who is 41 years old"));
    }

    #[test]
    fn group_mode_section_order() {
        let out = compose(StudioMode::BackgroundScene, &inputs("a misty forest", vec!["30"]));
        let order = [
            StudioMode::BackgroundScene.template(),
            "**PEOPLE TO INCLUDE**:",
            "**SCENE DESCRIPTION**:\na misty forest",
            "**ARRANGEMENT & SCALING INSTRUCTIONS**:",
            "**ASPECT RATIO**: The final image must have a 4:5 portrait aspect ratio.",
            "**NEGATIVE PROMPT**: Do not include any of the following: blurry,",
        ];
        let positions: Vec<usize> = order.iter().map(|s| out.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn magic_eraser_is_template_only() {
        let out = compose(StudioMode::MagicEraser, &inputs("ignored", vec![]));
        assert_eq!(out, StudioMode::MagicEraser.template());
    }

    #[test]
    fn text_to_image_uses_prompt_as_body() {
        let mut i = inputs("  a lighthouse at dusk", vec![]);
        i.aspect_ratio = AspectRatio::Landscape;
        i.negative_prompt = "people";
        let out = compose(StudioMode::TextToImage, &i);
        assert_eq!(
            out,
            "a lighthouse at dusk\n\
             **ASPECT RATIO**: The final image must have a 16:9 landscape aspect ratio.\n\
             **NEGATIVE PROMPT**: Do not include any of the following: people."
        );
    }

    #[test]
    fn restoration_ignores_prompt() {
        let out = compose(StudioMode::PhotoRestoration, &inputs("make it pop", vec![]));
        assert!(!out.contains("make it pop"));
        assert!(out.ends_with("missing limbs."));
    }

    #[test]
    fn product_scene_is_inline() {
        let mut i = inputs("white marble", vec![]);
        i.aspect_ratio = AspectRatio::Square;
        let out = compose(StudioMode::ProductStudio, &i);
        assert!(out.contains("\n**SCENE DESCRIPTION**: white marble\n"));
        assert!(out.contains("a 1:1 square aspect ratio"));
    }

    #[test]
    fn composition_is_deterministic() {
        let i = inputs("studio", vec!["20", "22"]);
        assert_eq!(
            compose(StudioMode::VintageCamera, &i),
            compose(StudioMode::VintageCamera, &i)
        );
    }

    #[test]
    fn aspect_ratio_parses_ratio_strings() {
        assert_eq!("16:9".parse::<AspectRatio>(), Ok(AspectRatio::Landscape));
        assert_eq!(" 1:1".parse::<AspectRatio>(), Ok(AspectRatio::Square));
        assert!("3:2".parse::<AspectRatio>().is_err());
    }
}
