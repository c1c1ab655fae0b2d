//! Config validation: unknown-key detection with Levenshtein suggestions.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, misplaced key).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for ServeConfig.
///
/// `units.<Item>` tables are free-form item names and are checked separately.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [data]
        "data",
        "data.food_logs",
        "data.centers",
        "data.distances",
        // [dataset]
        "dataset",
        "dataset.day_column",
        "dataset.slot_column",
        "dataset.items",
        "dataset.ignore_unexpected_columns",
        // [forest]
        "forest",
        "forest.n_trees",
        "forest.max_depth",
        "forest.min_samples_split",
        "forest.min_samples_leaf",
        "forest.bootstrap",
        "forest.seed",
        // [units]
        "units",
        // [server]
        "server",
        "server.addr",
    ];
    keys.iter().copied().collect()
}

/// Keys allowed inside each `[units.<Item>]` table.
const UNIT_SPEC_KEYS: [&str; 2] = ["unit", "scale"];

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Suggest the closest candidate for an unknown key, if within edit distance 3.
///
/// Candidates are scanned in sorted order so equal distances resolve the same
/// way on every run.
pub fn suggest_correction<'a, I>(unknown: &str, candidates: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sorted: Vec<&str> = candidates.into_iter().collect();
    sorted.sort_unstable();

    let mut best: Option<(&str, usize)> = None;
    for k in sorted {
        let dist = levenshtein(unknown, k);
        if dist <= 3 && best.map_or(true, |(_, d)| dist < d) {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if known.contains(key.as_str()) {
            continue;
        }

        if let Some(rest) = key.strip_prefix("units.") {
            // units.<Item> is free-form, units.<Item>.<field> must be unit/scale
            match rest.split_once('.') {
                None => continue,
                Some((item, field)) => {
                    if UNIT_SPEC_KEYS.contains(&field) {
                        continue;
                    }
                    warnings.push(ValidationWarning {
                        field: key.clone(),
                        message: format!("Unknown unit key '{field}' for item '{item}'"),
                        suggestion: suggest_correction(field, UNIT_SPEC_KEYS),
                    });
                    continue;
                }
            }
        }

        warnings.push(ValidationWarning {
            field: key.clone(),
            message: format!("Unknown config key '{key}'"),
            suggestion: suggest_correction(&key, known.iter().copied()),
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("seed", "seed"), 0);
        assert_eq!(levenshtein("sede", "seed"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
    }

    #[test]
    fn test_known_keys_produce_no_warnings() {
        let raw = r#"
            [data]
            food_logs = "logs.csv"
            [forest]
            n_trees = 50
            seed = 1
            [units.Chapati]
            unit = "pcs"
            scale = 50
        "#;
        assert!(validate_unknown_keys(raw).is_empty());
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let raw = "[forest]\nn_tress = 50\n";
        let warnings = validate_unknown_keys(raw);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "forest.n_tress");
        assert_eq!(warnings[0].suggestion.as_deref(), Some("forest.n_trees"));
    }

    #[test]
    fn test_unit_field_typo() {
        let raw = "[units.Curd]\nunit = \"bowls\"\nscael = 15\n";
        let warnings = validate_unknown_keys(raw);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].suggestion.as_deref(), Some("scale"));
    }

    #[test]
    fn test_unrelated_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("[dashboard]\ntheme = \"dark\"\n");
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
    }

    #[test]
    fn test_unparseable_toml_yields_no_warnings() {
        assert!(validate_unknown_keys("[[[").is_empty());
    }
}
