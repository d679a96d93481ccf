//! Numerology Engine: pure, deterministic figure calculation.
//!
//! Life Path, Expression, Soul Urge, Personality, and Birthday numbers are
//! derived by Pythagorean digit reduction with the master numbers 11, 22, 33
//! exempt from further collapse. Compatibility scoring is the one place
//! randomness enters the system; it is injected through [`Jitter`] so callers
//! choose between the re-rolling product behavior and reproducible scores.

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Sum the decimal digits of `n` until a single digit remains, short-circuiting
/// at 11, 22, or 33 when `preserve_master` is set.
///
/// With `preserve_master` the result is always in {1..9, 11, 22, 33}; without
/// it, {1..9} (for positive input). Callers guarantee well-formed positive sums.
pub fn reduce_to_single_digit(mut n: u32, preserve_master: bool) -> u32 {
    while n > 9 {
        if preserve_master && (n == 11 || n == 22 || n == 33) {
            return n;
        }
        n = digit_sum(n);
    }
    n
}

fn digit_sum(mut n: u32) -> u32 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

/// Life Path: reduce month, day, and year independently (each preserving
/// masters), then reduce the sum of the three once more.
///
/// The two-stage reduction is canonical. Reducing the raw month+day+year sum
/// directly diverges for many dates and must not be substituted.
pub fn calculate_life_path(dob: NaiveDate) -> u32 {
    let month = reduce_to_single_digit(dob.month(), true);
    let day = reduce_to_single_digit(dob.day(), true);
    let year = reduce_to_single_digit(digit_sum(dob.year() as u32), true);
    reduce_to_single_digit(month + day + year, true)
}

/// Birthday Number: the day of the month, reduced (masters preserved).
pub fn calculate_birthday_number(dob: NaiveDate) -> u32 {
    reduce_to_single_digit(dob.day(), true)
}

/// Pythagorean letter value: A,J,S=1; B,K,T=2; C,L,U=3; D,M,V=4; E,N,W=5;
/// F,O,X=6; G,P,Y=7; H,Q,Z=8; I,R=9. Non-letters map to 0.
fn letter_value(c: char) -> u32 {
    match c.to_ascii_uppercase() {
        'A' | 'J' | 'S' => 1,
        'B' | 'K' | 'T' => 2,
        'C' | 'L' | 'U' => 3,
        'D' | 'M' | 'V' => 4,
        'E' | 'N' | 'W' => 5,
        'F' | 'O' | 'X' => 6,
        'G' | 'P' | 'Y' => 7,
        'H' | 'Q' | 'Z' => 8,
        'I' | 'R' => 9,
        _ => 0,
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'A' | 'E' | 'I' | 'O' | 'U')
}

fn name_sum<F: Fn(char) -> bool>(full_name: &str, keep: F) -> u32 {
    full_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .filter(|c| keep(*c))
        .map(letter_value)
        .sum()
}

/// Expression Number: every letter of the full name.
pub fn calculate_expression(full_name: &str) -> u32 {
    reduce_to_single_digit(name_sum(full_name, |_| true), true)
}

/// Soul Urge Number: vowels only (A E I O U).
pub fn calculate_soul_urge(full_name: &str) -> u32 {
    reduce_to_single_digit(name_sum(full_name, is_vowel), true)
}

/// Personality Number: consonants only.
pub fn calculate_personality(full_name: &str) -> u32 {
    reduce_to_single_digit(name_sum(full_name, |c| !is_vowel(c)), true)
}

// ---------------------------------------------------------------------------
// Compatibility
// ---------------------------------------------------------------------------

/// Overall compatibility band derived from the mean area score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompatibilityLevel {
    High,
    Moderate,
    Challenging,
}

impl CompatibilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Moderate => "moderate",
            Self::Challenging => "challenging",
        }
    }

    fn from_score(score: u32) -> Self {
        if score >= 70 {
            Self::High
        } else if score >= 50 {
            Self::Moderate
        } else {
            Self::Challenging
        }
    }
}

/// Per-area compatibility breakdown, each in [20, 100].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityAreas {
    pub communication: u32,
    pub emotional: u32,
    pub physical: u32,
    pub long_term: u32,
}

/// Compatibility between two Life Path numbers: overall 0..100 score, band,
/// and four area scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilityResult {
    pub score: u32,
    pub level: CompatibilityLevel,
    pub areas: CompatibilityAreas,
}

/// Jitter source for the compatibility area scores.
///
/// `Reroll` keeps the original product behavior: every call re-rolls, so
/// identical inputs yield different scores. `Seeded` makes results
/// reproducible; `Flat` pins jitter to zero for tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    Reroll,
    Seeded(u64),
    Flat,
}

impl Default for Jitter {
    fn default() -> Self {
        Self::Reroll
    }
}

impl Jitter {
    /// Parse from config text: `reroll`, `flat`, or `seeded:<n>`.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "reroll" => Some(Self::Reroll),
            "flat" => Some(Self::Flat),
            _ => s
                .strip_prefix("seeded:")
                .and_then(|n| n.trim().parse().ok())
                .map(Self::Seeded),
        }
    }
}

enum JitterRng {
    Std(StdRng),
    Thread,
    Flat,
}

impl JitterRng {
    fn next(&mut self) -> i32 {
        match self {
            Self::Std(rng) => rng.gen_range(-10..=10),
            Self::Thread => rand::thread_rng().gen_range(-10..=10),
            Self::Flat => 0,
        }
    }
}

/// Natural-partner adjacency (bidirectional). Masters pair with their root
/// vibration's classic partner.
const NATURAL_PARTNERS: &[(u32, u32)] = &[
    (1, 3),
    (1, 5),
    (2, 4),
    (2, 8),
    (3, 5),
    (3, 6),
    (4, 8),
    (5, 7),
    (6, 9),
    (7, 9),
    (2, 11),
    (4, 22),
    (6, 33),
];

/// Challenging adjacency (bidirectional).
const CHALLENGING_PAIRS: &[(u32, u32)] = &[
    (1, 8),
    (2, 5),
    (3, 4),
    (4, 5),
    (6, 7),
    (8, 9),
    (1, 22),
    (5, 11),
];

fn pair_in(table: &[(u32, u32)], a: u32, b: u32) -> bool {
    table.iter().any(|&(x, y)| (x == a && y == b) || (x == b && y == a))
}

/// Base score before area jitter: 60 unless the pair is a natural partner
/// (85), a challenging pair (45), or identical (75 for the introspective
/// 7 and 9, 55 otherwise).
fn base_score(lp1: u32, lp2: u32) -> u32 {
    if lp1 == lp2 {
        if lp1 == 7 || lp1 == 9 {
            75
        } else {
            55
        }
    } else if pair_in(NATURAL_PARTNERS, lp1, lp2) {
        85
    } else if pair_in(CHALLENGING_PAIRS, lp1, lp2) {
        45
    } else {
        60
    }
}

/// Compatibility with the default re-rolling jitter (original behavior:
/// repeated calls with identical inputs vary).
pub fn calculate_compatibility(lp1: u32, lp2: u32) -> CompatibilityResult {
    calculate_compatibility_with(lp1, lp2, Jitter::Reroll)
}

/// Compatibility with an explicit jitter source.
pub fn calculate_compatibility_with(lp1: u32, lp2: u32, jitter: Jitter) -> CompatibilityResult {
    let mut rng = match jitter {
        Jitter::Reroll => JitterRng::Thread,
        Jitter::Seeded(seed) => JitterRng::Std(StdRng::seed_from_u64(seed)),
        Jitter::Flat => JitterRng::Flat,
    };
    let base = base_score(lp1, lp2) as i32;

    let area = |bias: i32, rng: &mut JitterRng| (base + bias + rng.next()).clamp(20, 100) as u32;
    let areas = CompatibilityAreas {
        communication: area(0, &mut rng),
        emotional: area(0, &mut rng),
        physical: area(5, &mut rng),
        long_term: area(0, &mut rng),
    };

    let total = areas.communication + areas.emotional + areas.physical + areas.long_term;
    let score = ((total as f64) / 4.0).round() as u32;
    CompatibilityResult {
        score,
        level: CompatibilityLevel::from_score(score),
        areas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn reduce_preserves_masters() {
        assert_eq!(reduce_to_single_digit(29, true), 11);
        assert_eq!(reduce_to_single_digit(29, false), 2);
        assert_eq!(reduce_to_single_digit(22, true), 22);
        assert_eq!(reduce_to_single_digit(33, true), 33);
        assert_eq!(reduce_to_single_digit(7, true), 7);
    }

    #[test]
    fn reduce_is_idempotent() {
        for n in 0..500 {
            let once = reduce_to_single_digit(n, true);
            assert_eq!(reduce_to_single_digit(once, true), once);
        }
    }

    #[test]
    fn life_path_march_15_1990_is_one() {
        // month 3, day 15->6, year 1990->19->10->1; 3+6+1=10->1
        assert_eq!(calculate_life_path(date(1990, 3, 15)), 1);
    }

    #[test]
    fn life_path_stays_in_domain() {
        let allowed = [1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 22, 33];
        let mut d = date(1900, 1, 1);
        let end = date(2025, 12, 31);
        while d <= end {
            assert!(allowed.contains(&calculate_life_path(d)), "failed for {d}");
            d = d.succ_opt().unwrap();
        }
    }

    #[test]
    fn life_path_uses_component_wise_reduction() {
        // Nov 29 1984: month 11 (master, kept), day 29->11 (master, kept),
        // year 1984->22 (master, kept); 11+11+22=44->8.
        assert_eq!(calculate_life_path(date(1984, 11, 29)), 8);
    }

    #[test]
    fn expression_and_soul_urge_match_letter_table() {
        // BARACK OBAMA: 2+1+9+1+3+2 + 6+2+1+4+1 = 18+14 = 32 -> 5
        assert_eq!(calculate_expression("Barack Obama"), 5);
        // Vowels: A A O A A = 1+1+6+1+1 = 10 -> 1
        assert_eq!(calculate_soul_urge("Barack Obama"), 1);
        // Consonants: B R C K B M = 2+9+3+2+2+4 = 22 (master, preserved)
        assert_eq!(calculate_personality("Barack Obama"), 22);
    }

    #[test]
    fn name_numbers_ignore_punctuation_and_case() {
        assert_eq!(
            calculate_expression("mary-jane o'brien"),
            calculate_expression("MARYJANE OBRIEN")
        );
    }

    #[test]
    fn birthday_number_reduces_day() {
        assert_eq!(calculate_birthday_number(date(1990, 3, 15)), 6);
        assert_eq!(calculate_birthday_number(date(1990, 3, 29)), 11);
        assert_eq!(calculate_birthday_number(date(1990, 3, 7)), 7);
    }

    #[test]
    fn identical_non_mystic_pair_is_moderate_without_jitter() {
        let r = calculate_compatibility_with(1, 1, Jitter::Flat);
        // base 55; areas 55/55/60/55 -> mean 56 -> moderate
        assert_eq!(r.score, 56);
        assert_eq!(r.level, CompatibilityLevel::Moderate);
        assert_eq!(r.areas.physical, 60);
    }

    #[test]
    fn identical_sevens_rate_higher() {
        let r = calculate_compatibility_with(7, 7, Jitter::Flat);
        assert_eq!(r.score, 76);
        assert_eq!(r.level, CompatibilityLevel::High);
    }

    #[test]
    fn natural_partners_score_high_and_tables_are_bidirectional() {
        let a = calculate_compatibility_with(1, 3, Jitter::Flat);
        let b = calculate_compatibility_with(3, 1, Jitter::Flat);
        assert_eq!(a.score, b.score);
        assert_eq!(a.level, CompatibilityLevel::High);

        let c = calculate_compatibility_with(1, 8, Jitter::Flat);
        assert_eq!(c.level, CompatibilityLevel::Challenging);
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let a = calculate_compatibility_with(3, 5, Jitter::Seeded(42));
        let b = calculate_compatibility_with(3, 5, Jitter::Seeded(42));
        assert_eq!(a.score, b.score);
        assert_eq!(a.areas.communication, b.areas.communication);
        assert_eq!(a.areas.long_term, b.areas.long_term);
    }

    #[test]
    fn area_scores_stay_clamped() {
        for seed in 0..50 {
            let r = calculate_compatibility_with(1, 8, Jitter::Seeded(seed));
            for v in [
                r.areas.communication,
                r.areas.emotional,
                r.areas.physical,
                r.areas.long_term,
            ] {
                assert!((20..=100).contains(&v));
            }
            assert!(r.score <= 100);
        }
    }
}
