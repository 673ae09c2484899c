//! Search-query cleanup for titles listed from a video platform.

use regex::Regex;
use std::sync::LazyLock;

/// Bracketed decorations that only exist on the video platform.
static DECORATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)[\(\[]\s*(?:official\s+(?:music\s+|lyric\s+)?(?:video|audio|visualizer)|(?:official\s+)?lyrics?(?:\s+video)?|audio|visualizer|videoclip|video\s+oficial|hd|hq|4k|remastered(?:\s+\d{4})?)\s*[\)\]]",
    )
    .expect("decoration pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Placeholders the platform lists for entries that cannot be fetched.
const UNAVAILABLE: &[&str] = &["[Deleted video]", "[Private video]", "[Unavailable video]"];

/// True for listing placeholders that should not become search queries.
pub fn is_unavailable_title(title: &str) -> bool {
    let t = title.trim();
    UNAVAILABLE.iter().any(|u| t.eq_ignore_ascii_case(u))
}

/// Strips decorations like "(Official Video)" and normalizes spacing.
///
/// Falls back to the trimmed input when stripping would leave nothing.
pub fn clean_search_title(title: &str) -> String {
    let stripped = DECORATION.replace_all(title, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let cleaned = collapsed
        .trim()
        .trim_end_matches(|c: char| c == '-' || c == '|' || c.is_whitespace())
        .trim();
    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_official_markers() {
        assert_eq!(
            clean_search_title("Daft Punk - Around the World (Official Video)"),
            "Daft Punk - Around the World"
        );
        assert_eq!(
            clean_search_title("Artist - Song [Official Music Video] [HD]"),
            "Artist - Song"
        );
        assert_eq!(
            clean_search_title("Artist - Song (Lyrics) | "),
            "Artist - Song"
        );
        assert_eq!(
            clean_search_title("Artist - Song (official audio)"),
            "Artist - Song"
        );
    }

    #[test]
    fn keeps_meaningful_parentheses() {
        assert_eq!(
            clean_search_title("Artist - Song (feat. Someone)"),
            "Artist - Song (feat. Someone)"
        );
        assert_eq!(clean_search_title("Song (Live at Wembley)"), "Song (Live at Wembley)");
    }

    #[test]
    fn empty_after_strip_falls_back() {
        assert_eq!(clean_search_title(" (Official Video) "), "(Official Video)");
    }

    #[test]
    fn unavailable_placeholders() {
        assert!(is_unavailable_title("[Deleted video]"));
        assert!(is_unavailable_title(" [private video] "));
        assert!(!is_unavailable_title("Private Video Game OST"));
    }
}
