use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;
use crate::meals::model::{FoodItem, Totals};

/// Sent with every request so the model answers with bare JSON.
pub const SYSTEM_INSTRUCTION: &str = "You estimate the nutrition of meals. \
From the user's description, list each food item it mentions and estimate its calories, \
protein, carbs and fat, then add up totals for the whole meal. \
Reply with exactly one JSON object and nothing else: no prose, no units, no notes. \
The object has two keys: \"totals\", an object with \"calories\", \"protein\", \"carbs\" and \"fat\"; \
and \"foods\", an array of objects with \"name\", \"calories\", \"protein\", \"carbs\" and \"fat\". \
Round every number to a whole number. Example: \
{\"totals\": {\"calories\": 360, \"protein\": 23, \"carbs\": 28, \"fat\": 18}, \
\"foods\": [{\"name\": \"3 eggs\", \"calories\": 210, \"protein\": 18, \"carbs\": 1, \"fat\": 15}, \
{\"name\": \"40g oats\", \"calories\": 150, \"protein\": 5, \"carbs\": 27, \"fat\": 3}]}";

/// A successful estimate: meal totals plus the per-food breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Estimate {
    pub totals: Totals,
    #[serde(default, deserialize_with = "foods_or_empty")]
    pub foods: Vec<FoodItem>,
}

fn foods_or_empty<'de, D>(deserializer: D) -> Result<Vec<FoodItem>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<FoodItem>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Drops every ```` ```json ```` / ```` ``` ```` marker and surrounding whitespace.
pub fn strip_code_fences(text: &str) -> String {
    lazy_static! {
        static ref FENCE_RE: Regex = Regex::new(r"```(?:json)?").unwrap();
    }
    FENCE_RE.replace_all(text, "").trim().to_string()
}

pub fn parse_estimate(text: &str) -> Result<Estimate, EstimationError> {
    let cleaned = strip_code_fences(text);
    serde_json::from_str::<Estimate>(&cleaned)
        .map_err(|e| EstimationError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json() {
        let text = "```json\n{\"totals\": {}}\n```\n";
        assert_eq!(strip_code_fences(text), "{\"totals\": {}}");
        assert_eq!(strip_code_fences("```{}```"), "{}");
        assert_eq!(strip_code_fences("  {} "), "{}");
    }

    #[test]
    fn parses_full_payload() {
        let text = r#"```json
        {"totals": {"calories": 360, "protein": 23, "carbs": 28, "fat": 18},
         "foods": [{"name": "3 eggs", "calories": 210, "protein": 18, "carbs": 1, "fat": 15},
                   {"name": "40g oats", "calories": 150, "protein": 5, "carbs": 27, "fat": 3}]}
        ```"#;
        let est = parse_estimate(text).unwrap();
        assert_eq!(
            est.totals,
            Totals {
                calories: 360,
                carbs: 28,
                protein: 23,
                fat: 18
            }
        );
        assert_eq!(est.foods.len(), 2);
        assert_eq!(est.foods[1].name, "40g oats");
        assert_eq!(est.foods[1].carbs, 27);
    }

    #[test]
    fn missing_fields_default_to_zero_and_empty() {
        let est = parse_estimate(r#"{"totals": {"calories": 512.6}}"#).unwrap();
        assert_eq!(est.totals.calories, 513);
        assert_eq!(est.totals.protein, 0);
        assert!(est.foods.is_empty());

        let est = parse_estimate(r#"{"totals": {}, "foods": null}"#).unwrap();
        assert_eq!(est, Estimate::default());
    }

    #[test]
    fn shape_mismatches_are_validation_errors() {
        for text in [
            "",
            "I think about 500 calories",
            r#"{"foods": []}"#,
            r#"{"totals": 500}"#,
            r#"[1, 2, 3]"#,
            r#"{"totals": {}, "foods": "eggs"}"#,
        ] {
            let err = parse_estimate(text).unwrap_err();
            assert!(matches!(err, EstimationError::Validation(_)), "{text:?}");
        }
    }
}
