//! Estimated speaking duration for when synthesis is unavailable.
//!
//! Caption and typing animations are timed to the audio. Without audio, an
//! estimate keeps the pacing plausible: roughly 90 ms per character, an extra
//! pause per sentence-final punctuation mark, and a fixed load buffer.

use std::time::Duration;

const MS_PER_CHAR: u64 = 90;
const MS_PER_PAUSE_MARK: u64 = 300;
const LOAD_BUFFER_MS: u64 = 500;

fn is_pause_mark(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | ',' | ';' | ':' | '…')
}

/// Estimated time the Oracle would take to speak `text`.
pub fn estimate_speaking_duration(text: &str) -> Duration {
    let text = text.trim();
    if text.is_empty() {
        return Duration::ZERO;
    }
    let chars = text.chars().count() as u64;
    let pauses = text.chars().filter(|c| is_pause_mark(*c)).count() as u64;
    Duration::from_millis(chars * MS_PER_CHAR + pauses * MS_PER_PAUSE_MARK + LOAD_BUFFER_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_instant() {
        assert_eq!(estimate_speaking_duration(""), Duration::ZERO);
        assert_eq!(estimate_speaking_duration("   "), Duration::ZERO);
    }

    #[test]
    fn duration_grows_with_length() {
        let short = estimate_speaking_duration("Yes.");
        let long = estimate_speaking_duration("The digits of your birth are aligning.");
        assert!(long > short);
    }

    #[test]
    fn punctuation_adds_pauses() {
        let flat = estimate_speaking_duration("abcd");
        let marked = estimate_speaking_duration("ab.d");
        assert_eq!(marked - flat, Duration::from_millis(MS_PER_PAUSE_MARK));
    }

    #[test]
    fn rate_stays_in_plausible_band() {
        let text = "You found your way here";
        let d = estimate_speaking_duration(text).as_millis() as u64;
        let chars = text.len() as u64;
        // 85-95 ms/char plus the fixed buffer
        assert!(d >= chars * 85);
        assert!(d <= chars * 95 + LOAD_BUFFER_MS + 3 * MS_PER_PAUSE_MARK);
    }
}
