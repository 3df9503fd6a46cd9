use std::sync::LazyLock;

use regex::Regex;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

static PERCENT_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+)%").ok());

/// Replace everything outside `[A-Za-z0-9]` with `_`, one underscore per
/// UTF-16 code unit, so a character outside the BMP becomes `__`.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len());
    for c in filename.chars() {
        if c.is_ascii_alphanumeric() {
            sanitized.push(c);
        } else {
            sanitized.extend(std::iter::repeat('_').take(c.len_utf16()));
        }
    }
    sanitized
}

/// Extract the most recent `NN.N%` token from a chunk of downloader output.
///
/// yt-dlp redraws its progress line with carriage returns, so a single read
/// can carry several tokens; the last one is the current value.
pub fn parse_progress_percent(text: &str) -> Option<f64> {
    PERCENT_PATTERN
        .as_ref()?
        .captures_iter(text)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .last()
}

/// Human readable size, e.g. `1.5 KB`. Zero is rendered as `0 Bytes`.
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("test/file.mp3"), "test_file_mp3");
        assert_eq!(sanitize_filename("Lecture 01"), "Lecture_01");
        assert_eq!(sanitize_filename("Café"), "Caf_");
    }

    #[test]
    fn test_sanitize_filename_counts_utf16_units() {
        // U+1F600 is a surrogate pair in UTF-16
        assert_eq!(sanitize_filename("A\u{1F600}B"), "A__B");
        assert_eq!(sanitize_filename("\u{1F4DA} Notes"), "___Notes");
    }

    #[test]
    fn test_parse_progress_percent() {
        assert_eq!(
            parse_progress_percent("[download]  42.7% of   12.34MiB at  1.21MiB/s ETA 00:06"),
            Some(42.7)
        );
        assert_eq!(parse_progress_percent("[download] Destination: x.mp4"), None);
        // integer percentages do not match the pattern
        assert_eq!(parse_progress_percent("[download] 100% of 12.34MiB"), None);
    }

    #[test]
    fn test_parse_progress_percent_takes_last_redraw() {
        let chunk = "\r[download]  10.0% of 5.00MiB\r[download]  12.5% of 5.00MiB\r[download]  11.2% of 5.00MiB";
        assert_eq!(parse_progress_percent(chunk), Some(11.2));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(512), "512 Bytes");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1_048_576), "1 MB");
        assert_eq!(format_bytes(1_073_741_824), "1 GB");
        assert_eq!(format_bytes(5 * 1_099_511_627_776), "5120 GB");
    }

    #[test]
    fn test_format_bytes_rounds_to_two_decimals() {
        // 1234567 / 1048576 = 1.1773...
        assert_eq!(format_bytes(1_234_567), "1.18 MB");
        assert_eq!(format_bytes(1023), "1023 Bytes");
    }
}
