//! Symbol resolver
//!
//! Maps a numeric reading (usually a percentage) onto a glyph ramp. Readings
//! up to 100 walk the regular ramp, anything above uses the overflow ramp.

/// Ramp used when no usable symbol list is given
pub const DEFAULT_SYMBOLS: &[&str] = &["🟦", "🟩", "🟨", "🟫", "🟥"];

/// Ramp used above 100 when no usable overflow list is given
pub const DEFAULT_OVERFLOW_SYMBOLS: &[&str] = &["⚠️", "💥", "🆘"];

/// Glyph returned for readings that are not numbers
pub const UNKNOWN_SYMBOL: &str = "?";

/// Resolve `raw` (e.g. `"42"`, `"87.5%"`) to a glyph.
///
/// Missing or empty lists fall back to the built-in ramps, a missing or
/// unusable scale falls back to `1.0`. Never panics and never indexes out of
/// bounds.
pub fn resolve(
    raw: &str,
    symbols: Option<&[String]>,
    overflow: Option<&[String]>,
    scale: Option<f64>,
) -> String {
    let reading = match parse_reading(raw) {
        Some(reading) => reading,
        None => return UNKNOWN_SYMBOL.to_string(),
    };

    let scale = scale.filter(|s| s.is_finite() && *s > 0.0).unwrap_or(1.0);
    let value = reading / scale;

    if value <= 100.0 {
        pick(symbols, DEFAULT_SYMBOLS, value)
    } else {
        pick(overflow, DEFAULT_OVERFLOW_SYMBOLS, value)
    }
}

fn parse_reading(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    number.parse::<f64>().ok().filter(|n| !n.is_nan())
}

fn pick(list: Option<&[String]>, fallback: &[&str], value: f64) -> String {
    match list {
        Some(list) if !list.is_empty() => list[index_for(value, list.len())].clone(),
        _ => fallback[index_for(value, fallback.len())].to_string(),
    }
}

/// floor((value / 100) * (len - 1)), clamped into `0..len`
fn index_for(value: f64, len: usize) -> usize {
    let last = len.saturating_sub(1);
    let position = (value / 100.0) * last as f64;
    if position.is_nan() || position <= 0.0 {
        0
    } else if position >= last as f64 {
        last
    } else {
        position.floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_ramp() {
        assert_eq!(resolve("0", None, None, None), "🟦");
        assert_eq!(resolve("25", None, None, None), "🟩");
        assert_eq!(resolve("50%", None, None, None), "🟨");
        assert_eq!(resolve("99", None, None, None), "🟫");
        assert_eq!(resolve("100", None, None, None), "🟥");
    }

    #[test]
    fn test_non_numeric_reading() {
        let ramp = list(&["a", "b"]);
        assert_eq!(resolve("abc", None, None, None), "?");
        assert_eq!(resolve("abc", Some(&ramp), Some(&ramp), Some(2.0)), "?");
        assert_eq!(resolve("", None, None, None), "?");
        assert_eq!(resolve("NaN", None, None, None), "?");
    }

    #[test]
    fn test_percent_suffix_and_whitespace() {
        let ramp = list(&["low", "mid", "high"]);
        assert_eq!(resolve(" 50 % ", Some(&ramp), None, None), "mid");
        assert_eq!(resolve("100%\n", Some(&ramp), None, None), "high");
    }

    #[test]
    fn test_overflow_is_clamped() {
        let ramp = list(&["a", "b", "c"]);
        let over = list(&["x", "y", "z"]);
        // 105 / 100 * 2 = 2.1 -> clamped to the last index
        assert_eq!(resolve("105%", Some(&ramp), Some(&over), None), "z");
        assert_eq!(resolve("100000", Some(&ramp), Some(&over), None), "z");
        assert_eq!(resolve("inf", Some(&ramp), Some(&over), None), "z");
    }

    #[test]
    fn test_overflow_defaults() {
        assert_eq!(resolve("150", None, None, None), "🆘");
        let empty: Vec<String> = Vec::new();
        assert_eq!(resolve("150", None, Some(&empty), None), "🆘");
    }

    #[test]
    fn test_empty_list_falls_back_to_default() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(resolve("0", Some(&empty), None, None), "🟦");
    }

    #[test]
    fn test_negative_readings_use_first_glyph() {
        let ramp = list(&["a", "b", "c"]);
        assert_eq!(resolve("-20", Some(&ramp), None, None), "a");
        assert_eq!(resolve("-inf", Some(&ramp), None, None), "a");
    }

    #[test]
    fn test_single_glyph_ramp() {
        let ramp = list(&["only"]);
        assert_eq!(resolve("0", Some(&ramp), None, None), "only");
        assert_eq!(resolve("100", Some(&ramp), None, None), "only");
        assert_eq!(resolve("300", None, Some(&ramp), None), "only");
    }

    #[test]
    fn test_scale() {
        let ramp = list(&["a", "b", "c"]);
        // 1000 / 10 = 100 -> last regular glyph, not overflow
        assert_eq!(resolve("1000", Some(&ramp), None, Some(10.0)), "c");
        assert_eq!(resolve("500", Some(&ramp), None, Some(10.0)), "b");
        // unusable scales fall back to 1.0
        assert_eq!(resolve("50", Some(&ramp), None, Some(0.0)), "b");
        assert_eq!(resolve("50", Some(&ramp), None, Some(-4.0)), "b");
        assert_eq!(resolve("50", Some(&ramp), None, Some(f64::NAN)), "b");
    }

    #[test]
    fn test_monotonic_over_percent_range() {
        let ramp = list(&["0", "1", "2", "3", "4", "5", "6"]);
        let mut previous = 0usize;
        for step in 0..=1000 {
            let value = step as f64 / 10.0;
            let glyph = resolve(&value.to_string(), Some(&ramp), None, None);
            let index = ramp.iter().position(|g| *g == glyph).unwrap();
            assert!(index >= previous, "index dropped at {}", value);
            previous = index;
        }
        assert_eq!(previous, ramp.len() - 1);
    }
}
