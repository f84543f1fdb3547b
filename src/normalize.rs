//! Canonical recipe normalization.
//!
//! Converts one raw upstream record into the canonical [`Recipe`]. Pure and
//! deterministic: no I/O, absence (`None`) is the only failure signal.

use crate::types::{RawCatalogRecord, Recipe, INGREDIENT_SLOTS};

/// Display default when the upstream record carries no cook time.
pub const DEFAULT_COOK_TIME: &str = "30 minutes";

/// Display default when the upstream record carries no serving count.
pub const DEFAULT_SERVINGS: &str = "4";

/// Convert one raw upstream record into a canonical [`Recipe`].
///
/// Returns `None` for records that normalize to zero ingredients AND zero
/// instruction steps; callers must drop these from aggregate results rather
/// than render a placeholder.
pub fn normalize(raw: &RawCatalogRecord) -> Option<Recipe> {
    let ingredients = collect_ingredients(raw);
    let instructions = split_instructions(raw.instructions.as_deref().unwrap_or(""));

    if ingredients.is_empty() && instructions.is_empty() {
        return None;
    }

    Some(Recipe {
        id: raw.id.clone().unwrap_or_default(),
        title: raw.name.clone().unwrap_or_default(),
        category: raw.category.clone().unwrap_or_default(),
        area: raw.area.clone().unwrap_or_default(),
        image: raw.thumbnail.clone().unwrap_or_default(),
        ingredients,
        instructions,
        cook_time: DEFAULT_COOK_TIME.to_string(),
        servings: DEFAULT_SERVINGS.to_string(),
        youtube_url: None,
    })
}

/// Normalize a detail-level record, carrying the video URL through.
pub fn normalize_detail(raw: &RawCatalogRecord) -> Option<Recipe> {
    let mut recipe = normalize(raw)?;
    recipe.youtube_url = raw
        .youtube
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string);
    Some(recipe)
}

/// Turn a YouTube watch URL into its embed form.
///
/// Returns `None` when the URL does not parse or has no `v=` parameter.
pub fn youtube_embed_url(watch_url: &str) -> Option<String> {
    let parsed = url::Url::parse(watch_url).ok()?;
    let video_id = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())?;
    Some(format!("https://www.youtube.com/embed/{}", video_id))
}

/// Scan all slot pairs 1..=20 and build `"<measure> <ingredient>"` entries.
///
/// A defensive full scan: populated slots are usually contiguous from the
/// front, but upstream does not guarantee it.
fn collect_ingredients(raw: &RawCatalogRecord) -> Vec<String> {
    (1..=INGREDIENT_SLOTS)
        .filter_map(|i| {
            let ingredient = raw.ingredient_slot(i)?;
            let ingredient = ingredient.trim().to_string();
            if ingredient.is_empty() {
                return None;
            }
            let measure = raw.measure_slot(i).unwrap_or_default();
            Some(format!("{} {}", measure.trim(), ingredient).trim().to_string())
        })
        .collect()
}

/// Split an instructions block into steps: one per line, trimmed, blanks dropped.
fn split_instructions(block: &str) -> Vec<String> {
    block
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
