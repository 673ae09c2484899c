//! ASCII-only filename stems.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Returned for empty input.
pub const EMPTY_INPUT_NAME: &str = "Unknown";
/// Returned when nothing survives the whitelist.
pub const EMPTY_RESULT_NAME: &str = "Unknown_Name";

/// Linux NAME_MAX; stems stay below it so an extension still fits.
const MAX_STEM_BYTES: usize = 240;

/// Letters that compatibility decomposition leaves untouched.
fn fold_special(c: char) -> Option<&'static str> {
    let s = match c {
        'Ø' => "O",
        'ø' => "o",
        'Æ' => "AE",
        'æ' => "ae",
        'Œ' => "OE",
        'œ' => "oe",
        'ß' => "ss",
        'Ð' => "D",
        'ð' => "d",
        'Þ' => "TH",
        'þ' => "th",
        'Ł' => "L",
        'ł' => "l",
        'Đ' => "D",
        'đ' => "d",
        'ı' => "i",
        _ => return None,
    };
    Some(s)
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ' ' || c == '-' || c == '_'
}

/// Sanitizes arbitrary text into a filesystem-safe stem.
///
/// - NFKD-normalizes and drops combining marks (`é` → `e`)
/// - Folds letters without a decomposition (`ß` → `ss`, `Ø` → `O`)
/// - Keeps only ASCII alphanumerics, space, `-`, `_`
/// - Collapses whitespace runs and trims
///
/// Idempotent: `safe_filename(&safe_filename(x)) == safe_filename(x)`.
pub fn safe_filename(input: &str) -> String {
    if input.is_empty() {
        return EMPTY_INPUT_NAME.to_string();
    }

    let mut folded = String::with_capacity(input.len());
    for c in input.nfkd() {
        if is_combining_mark(c) {
            continue;
        }
        match fold_special(c) {
            Some(s) => folded.push_str(s),
            None => folded.push(c),
        }
    }

    let mut out = String::with_capacity(folded.len());
    let mut pending_space = false;
    for c in folded.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if !is_allowed(c) {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }

    if out.len() > MAX_STEM_BYTES {
        out.truncate(MAX_STEM_BYTES);
        let trimmed_len = out.trim_end().len();
        out.truncate(trimmed_len);
    }

    if out.is_empty() {
        EMPTY_RESULT_NAME.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_whitelisted(s: &str) -> bool {
        s.chars().all(is_allowed)
    }

    #[test]
    fn strips_diacritics() {
        assert_eq!(safe_filename("Beyoncé - Déjà Vu"), "Beyonce - Deja Vu");
        assert_eq!(safe_filename("Motörhead"), "Motorhead");
    }

    #[test]
    fn folds_special_letters() {
        assert_eq!(safe_filename("Røyksopp"), "Royksopp");
        assert_eq!(safe_filename("Straße"), "Strasse");
        assert_eq!(safe_filename("Æther Łódź"), "AEther Lodz");
    }

    #[test]
    fn drops_punctuation_and_collapses_spaces() {
        assert_eq!(safe_filename("AC/DC: Back  in\tBlack!"), "ACDC Back in Black");
        assert_eq!(safe_filename("  padded  "), "padded");
        assert_eq!(safe_filename("a_b-c"), "a_b-c");
    }

    #[test]
    fn empty_fallbacks() {
        assert_eq!(safe_filename(""), EMPTY_INPUT_NAME);
        assert_eq!(safe_filename("!!!"), EMPTY_RESULT_NAME);
        assert_eq!(safe_filename("東京"), EMPTY_RESULT_NAME);
    }

    #[test]
    fn long_input_is_capped() {
        let long = "a ".repeat(400);
        let out = safe_filename(&long);
        assert!(out.len() <= MAX_STEM_BYTES);
        assert!(!out.ends_with(' '));
    }

    #[test]
    fn idempotent_and_whitelisted() {
        let samples = [
            "",
            "   ",
            "Sigur Rós – Hoppípolla",
            "ﬁne ligature №5",
            "Ø/ß\\Æ:*?\"<>|",
            "Unknown",
            "Unknown_Name",
            "x\u{0301}\u{0301}y",
            "日本語 mixed ascii",
            &"é".repeat(300),
        ];
        for s in samples {
            let once = safe_filename(s);
            assert_eq!(safe_filename(&once), once, "not idempotent for {s:?}");
            assert!(only_whitelisted(&once), "non-whitelisted output {once:?}");
            assert!(!once.is_empty());
        }
    }
}
