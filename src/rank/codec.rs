use serde_json::Value;

/// Placeholder used when a display name collapses to nothing.
pub const DEFAULT_PLAYER_NAME: &str = "Player";
/// Maximum display-name length after trimming.
pub const MAX_NAME_CHARS: usize = 12;

/// Normalize a raw score: reject NaN/infinite values, round to 2 decimals.
///
/// Returns `None` instead of erroring so callers scanning a store can skip
/// malformed records cheaply.
pub fn normalize_score(raw: f64) -> Option<f64> {
    if !raw.is_finite() {
        return None;
    }
    Some((raw * 100.0).round() / 100.0)
}

/// Lenient score extraction from an untyped store child.
///
/// Remote records written by older clients sometimes carry scores as JSON
/// strings; coerce those the same way a numeric cast would.
pub fn score_from_value(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => normalize_score(n.as_f64()?),
        Some(Value::String(s)) => normalize_score(s.trim().parse::<f64>().ok()?),
        _ => None,
    }
}

/// Trim and truncate a display name; an empty result maps to [`DEFAULT_PLAYER_NAME`].
pub fn sanitize_name(raw: &str) -> String {
    let base: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    if base.is_empty() {
        DEFAULT_PLAYER_NAME.to_owned()
    } else {
        base
    }
}

/// Trim and truncate a nickname candidate without applying the default,
/// so callers can distinguish "empty" from "placeholder".
pub fn normalize_nickname(raw: &str) -> String {
    raw.trim().chars().take(MAX_NAME_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_score_rounds_to_two_decimals() {
        assert_eq!(normalize_score(42.123), Some(42.12));
        assert_eq!(normalize_score(42.126), Some(42.13));
        assert_eq!(normalize_score(0.0), Some(0.0));
        assert_eq!(normalize_score(-7.25), Some(-7.25));
    }

    #[test]
    fn normalize_score_rejects_non_finite() {
        assert_eq!(normalize_score(f64::NAN), None);
        assert_eq!(normalize_score(f64::INFINITY), None);
        assert_eq!(normalize_score(f64::NEG_INFINITY), None);
    }

    #[test]
    fn normalize_score_is_idempotent() {
        for raw in [42.123, 0.005, -17.999, 1e9, 0.1 + 0.2] {
            let once = normalize_score(raw).unwrap();
            assert_eq!(normalize_score(once), Some(once));
        }
    }

    #[test]
    fn score_from_value_coerces_numeric_strings() {
        assert_eq!(score_from_value(Some(&json!(42.123))), Some(42.12));
        assert_eq!(score_from_value(Some(&json!("17.5"))), Some(17.5));
        assert_eq!(score_from_value(Some(&json!("junk"))), None);
        assert_eq!(score_from_value(Some(&json!(null))), None);
        assert_eq!(score_from_value(None), None);
    }

    #[test]
    fn sanitize_name_trims_and_truncates() {
        assert_eq!(sanitize_name("  Ann  "), "Ann");
        assert_eq!(sanitize_name("abcdefghijklmnop"), "abcdefghijkl");
        assert_eq!(sanitize_name("   "), DEFAULT_PLAYER_NAME);
        assert_eq!(sanitize_name(""), DEFAULT_PLAYER_NAME);
    }

    #[test]
    fn normalize_nickname_keeps_empty_distinct() {
        assert_eq!(normalize_nickname("   "), "");
        assert_eq!(normalize_nickname(" Neo "), "Neo");
    }
}
