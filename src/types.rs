use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Number of positional ingredient/measure slot pairs in an upstream record.
///
/// The upstream schema is fixed-arity: every record carries exactly this many
/// numbered slot pairs, populated from the front but with no contiguity
/// guarantee.
pub const INGREDIENT_SLOTS: usize = 20;

/// One raw record from the upstream catalog, as it arrives on the wire.
///
/// Identity fields are typed; the numbered `strIngredient1..20` /
/// `strMeasure1..20` slots land in the flattened remainder and are read
/// through the bounded positional accessors below. Any field may be null,
/// empty, or whitespace-only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatalogRecord {
    #[serde(rename = "idMeal", default, deserialize_with = "opt_coerce_string")]
    pub id: Option<String>,
    #[serde(rename = "strMeal", default, deserialize_with = "opt_coerce_string")]
    pub name: Option<String>,
    #[serde(rename = "strCategory", default, deserialize_with = "opt_coerce_string")]
    pub category: Option<String>,
    #[serde(rename = "strArea", default, deserialize_with = "opt_coerce_string")]
    pub area: Option<String>,
    #[serde(rename = "strMealThumb", default, deserialize_with = "opt_coerce_string")]
    pub thumbnail: Option<String>,
    #[serde(rename = "strInstructions", default, deserialize_with = "opt_coerce_string")]
    pub instructions: Option<String>,
    #[serde(rename = "strYoutube", default, deserialize_with = "opt_coerce_string")]
    pub youtube: Option<String>,
    #[serde(rename = "strSource", default, deserialize_with = "opt_coerce_string")]
    pub source: Option<String>,
    /// Numbered slots and whatever else upstream sends.
    #[serde(flatten)]
    rest: HashMap<String, serde_json::Value>,
}

impl RawCatalogRecord {
    /// Ingredient-name slot `index` (1-based, up to [`INGREDIENT_SLOTS`]).
    pub fn ingredient_slot(&self, index: usize) -> Option<String> {
        self.slot("strIngredient", index)
    }

    /// Measure slot `index` (1-based, up to [`INGREDIENT_SLOTS`]).
    pub fn measure_slot(&self, index: usize) -> Option<String> {
        self.slot("strMeasure", index)
    }

    fn slot(&self, prefix: &str, index: usize) -> Option<String> {
        debug_assert!((1..=INGREDIENT_SLOTS).contains(&index));
        self.rest
            .get(&format!("{}{}", prefix, index))
            .cloned()
            .and_then(value_to_string)
    }
}

/// Canonical, UI-ready recipe. Immutable once constructed: every field is
/// populated, so rendering needs no null checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identifier (string form of the upstream numeric id).
    pub id: String,
    pub title: String,
    /// May be empty.
    pub category: String,
    /// May be empty.
    pub area: String,
    pub image: String,
    /// Each entry is `"<measure> <ingredient>"`, trimmed.
    pub ingredients: Vec<String>,
    /// Instruction steps in order, blank lines dropped.
    pub instructions: Vec<String>,
    pub cook_time: String,
    pub servings: String,
    /// Present only when a detail-level fetch supplied it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

/// One entry from the upstream category listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "strCategory")]
    pub name: String,
    #[serde(rename = "strCategoryThumb", default)]
    pub image: String,
    #[serde(rename = "strCategoryDescription", default)]
    pub description: String,
}

/// A saved favorite, owned by the remote store.
///
/// The client creates these via POST and destroys them via DELETE; the only
/// local mutation is the optimistic flag in the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    pub user_id: String,
    #[serde(deserialize_with = "coerce_string")]
    pub recipe_id: String,
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub cook_time: String,
    #[serde(default)]
    pub servings: String,
}

/// Deserialize a value that may arrive as a string or a number into a string.
fn coerce_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_to_string(value).unwrap_or_default())
}

fn opt_coerce_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_coerces_numeric_id_to_string() {
        let record: RawCatalogRecord =
            serde_json::from_value(json!({"idMeal": 52772, "strMeal": "Teriyaki Chicken"}))
                .unwrap();
        assert_eq!(record.id.as_deref(), Some("52772"));
        assert_eq!(record.name.as_deref(), Some("Teriyaki Chicken"));
    }

    #[test]
    fn record_slot_accessors_handle_null_and_missing() {
        let record: RawCatalogRecord = serde_json::from_value(json!({
            "idMeal": "1",
            "strIngredient1": "Chicken",
            "strIngredient2": null,
            "strMeasure1": "1 whole"
        }))
        .unwrap();
        assert_eq!(record.ingredient_slot(1).as_deref(), Some("Chicken"));
        assert_eq!(record.ingredient_slot(2), None);
        assert_eq!(record.ingredient_slot(20), None);
        assert_eq!(record.measure_slot(1).as_deref(), Some("1 whole"));
        assert_eq!(record.measure_slot(2), None);
    }

    #[test]
    fn favorite_entry_round_trips_camel_case() {
        let entry = FavoriteEntry {
            user_id: "u1".to_string(),
            recipe_id: "52772".to_string(),
            title: "Teriyaki Chicken".to_string(),
            image: "https://example.com/thumb.jpg".to_string(),
            cook_time: "30 minutes".to_string(),
            servings: "4".to_string(),
        };
        let wire = serde_json::to_value(&entry).unwrap();
        assert_eq!(wire["userId"], "u1");
        assert_eq!(wire["recipeId"], "52772");
        assert_eq!(wire["cookTime"], "30 minutes");

        let back: FavoriteEntry = serde_json::from_value(wire).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn favorite_entry_accepts_numeric_recipe_id() {
        let entry: FavoriteEntry = serde_json::from_value(json!({
            "userId": "u1",
            "recipeId": 52772,
            "title": "Teriyaki Chicken"
        }))
        .unwrap();
        assert_eq!(entry.recipe_id, "52772");
    }
}
