//! Prompt templates

/// Default prompt for the multi-run image breakdown
pub const VISUAL_BREAKDOWN_PROMPT: &str = "Analyze the image, focusing on specific objects, colors, textures, lighting, composition and any visible text. Describe people only by what is visible, such as clothing, pose and expression, and give a factual visual breakdown of the scene.";
