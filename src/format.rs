use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const BYTES_PER_MB: f64 = 1_048_576.0;
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Fit `s` into `max_width` terminal columns, ending with an ellipsis when
/// it had to be cut.
pub fn truncate_unicode(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if width + ch_width > max_width.saturating_sub(1) {
            result.push('\u{2026}');
            break;
        }
        result.push(ch);
        width += ch_width;
    }
    result
}

/// Keep at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

pub fn round_1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

pub fn round_2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_1(bytes as f64 / BYTES_PER_MB)
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_2(bytes as f64 / BYTES_PER_GB)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("ünïcödé", 3), "ünï");
        assert_eq!(truncate_chars("short", 30), "short");
    }

    #[test]
    fn truncate_unicode_adds_ellipsis() {
        assert_eq!(truncate_unicode("firefox-bin", 6), "firef\u{2026}");
        assert_eq!(truncate_unicode("sh", 6), "sh");
    }

    #[test]
    fn unit_conversions_round() {
        assert_eq!(bytes_to_mb(52_428_800), 50.0);
        assert_eq!(bytes_to_mb(1_100_000), 1.0);
        assert_eq!(bytes_to_gb(17_179_869_184), 16.0);
        assert_eq!(round_1(12.345), 12.3);
    }
}
