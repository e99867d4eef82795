//! Activity classification
//!
//! Maps free-form activity type tags onto the closed [`Modality`] set.
//! Tags are compared case-insensitively after folding separators and
//! CamelCase into snake_case, so "IndoorCycling", "indoor-cycling" and
//! "indoor_cycling" are the same tag.

use crate::types::Modality;

const RUNNING_TAGS: &[&str] = &[
    "running",
    "run",
    "treadmill_running",
    "trail_running",
    "trail_run",
    "virtual_running",
    "virtual_run",
    "track_running",
    "street_running",
    "indoor_running",
    "ultra_run",
    "obstacle_run",
];

const CYCLING_TAGS: &[&str] = &[
    "cycling",
    "road_cycling",
    "road_biking",
    "mountain_biking",
    "indoor_cycling",
    "virtual_ride",
    "e_bike_ride",
    "ebike_ride",
    "e_bike_mountain",
    "gravel_cycling",
    "gravel_ride",
    "cyclocross",
    "track_cycling",
    "recumbent_cycling",
    "mountain_bike_ride",
    "ride",
    "bmx",
];

const SWIMMING_TAGS: &[&str] = &[
    "swimming",
    "swim",
    "lap_swimming",
    "pool_swimming",
    "open_water_swimming",
];

const STRENGTH_TAGS: &[&str] = &[
    "strength_training",
    "weight_training",
    "strength",
    "crossfit",
    "hiit",
    "functional_strength",
    "bodyweight",
];

/// Token prefixes tried when no tag matches exactly, in this order. A keyword
/// matches a `_`-separated token that starts with it, so "swim" covers
/// "swimrun" but "ride" does not match inside "stride".
const FALLBACK_KEYWORDS: &[(&str, Modality)] = &[
    ("swim", Modality::Swimming),
    ("strength", Modality::Strength),
    ("weight", Modality::Strength),
    ("crossfit", Modality::Strength),
    ("hiit", Modality::Strength),
    ("cycling", Modality::Cycling),
    ("biking", Modality::Cycling),
    ("ride", Modality::Cycling),
    ("running", Modality::Running),
];

/// Classify a raw activity type tag. Unknown tags map to [`Modality::Other`].
pub fn classify(type_key: &str) -> Modality {
    let tag = fold_tag(type_key);
    if tag.is_empty() {
        return Modality::Other;
    }

    let exact = [
        (RUNNING_TAGS, Modality::Running),
        (CYCLING_TAGS, Modality::Cycling),
        (SWIMMING_TAGS, Modality::Swimming),
        (STRENGTH_TAGS, Modality::Strength),
    ];
    for (tags, modality) in exact {
        if tags.contains(&tag.as_str()) {
            return modality;
        }
    }

    FALLBACK_KEYWORDS
        .iter()
        .find(|(keyword, _)| tag.split('_').any(|token| token.starts_with(keyword)))
        .map(|(_, modality)| *modality)
        .unwrap_or(Modality::Other)
}

/// Lowercase snake_case form of a tag
fn fold_tag(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;

    for ch in raw.trim().chars() {
        if ch == ' ' || ch == '-' || ch == '_' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower {
            out.push('_');
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        out.extend(ch.to_lowercase());
    }

    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_tags() {
        assert_eq!(classify("indoor_cycling"), Modality::Cycling);
        assert_eq!(classify("crossfit"), Modality::Strength);
        assert_eq!(classify("trail_running"), Modality::Running);
        assert_eq!(classify("open_water_swimming"), Modality::Swimming);
    }

    #[test]
    fn test_unknown_tag_is_other() {
        assert_eq!(classify("kayaking"), Modality::Other);
        assert_eq!(classify(""), Modality::Other);
        assert_eq!(classify("yoga"), Modality::Other);
    }

    #[test]
    fn test_case_and_separator_folding() {
        assert_eq!(classify("INDOOR_CYCLING"), Modality::Cycling);
        assert_eq!(classify("Indoor Cycling"), Modality::Cycling);
        assert_eq!(classify("VirtualRide"), Modality::Cycling);
        assert_eq!(classify("EBikeRide"), Modality::Cycling);
        assert_eq!(classify("TrailRun"), Modality::Running);
        assert_eq!(classify("WeightTraining"), Modality::Strength);
        assert_eq!(classify("Swim"), Modality::Swimming);
    }

    #[test]
    fn test_substring_fallback() {
        assert_eq!(classify("hill_running_repeats"), Modality::Running);
        assert_eq!(classify("winter_swim_challenge"), Modality::Swimming);
        assert_eq!(classify("cargo_biking"), Modality::Cycling);
        assert_eq!(classify("weightlifting"), Modality::Strength);
    }

    #[test]
    fn test_fallback_matches_whole_tokens() {
        assert_eq!(classify("stride_drills"), Modality::Other);
        assert_eq!(classify("overrides"), Modality::Other);
        assert_eq!(classify("group_ride_social"), Modality::Cycling);
    }
}
