use std::time::Duration;
use tracing::debug;

/// Music-only lead-in before narration, in seconds
pub const LEAD_IN_SECS: f64 = 10.0;

/// Music-only tail after narration, in seconds
pub const FADE_OUT_SECS: f64 = 10.0;

/// Slow narration pace, with room for the pause markup the script embeds
pub const WORDS_PER_MINUTE: f64 = 100.0;

/// Smallest script the generator will ask for
pub const MIN_WORD_BUDGET: u32 = 50;

/// Number of narration words that fit a session of `requested_minutes`
/// once the lead-in and fade-out are taken out.
pub fn word_budget(requested_minutes: f64) -> u32 {
    word_budget_with(requested_minutes, LEAD_IN_SECS, FADE_OUT_SECS, WORDS_PER_MINUTE)
}

pub fn word_budget_with(
    requested_minutes: f64,
    lead_in_secs: f64,
    fade_out_secs: f64,
    words_per_minute: f64,
) -> u32 {
    let speaking_minutes = requested_minutes - lead_in_secs / 60.0 - fade_out_secs / 60.0;
    let raw = (speaking_minutes * words_per_minute).floor();

    let budget = if raw.is_finite() && raw > MIN_WORD_BUDGET as f64 {
        // Saturates on absurdly large inputs
        raw as u32
    } else {
        MIN_WORD_BUDGET
    };

    debug!(
        "Word budget for {:.2} min ({:.0}s lead-in, {:.0}s fade-out, {} wpm): {}",
        requested_minutes, lead_in_secs, fade_out_secs, words_per_minute, budget
    );

    budget
}

/// Rough speaking time of `text` at `words_per_minute`
pub fn estimate_speech_duration(text: &str, words_per_minute: f64) -> Duration {
    let words = text.split_whitespace().count() as f64;
    if words == 0.0 || words_per_minute <= 0.0 {
        return Duration::ZERO;
    }

    Duration::from_secs_f64(words * 60.0 / words_per_minute)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_budget_matches_formula() {
        for minutes in [1.0, 3.0, 5.0, 10.0, 20.0, 45.5] {
            let expected = ((minutes - 10.0 / 60.0 - 10.0 / 60.0) * WORDS_PER_MINUTE).floor() as u32;
            assert_eq!(word_budget(minutes), expected.max(MIN_WORD_BUDGET));
        }

        assert_eq!(word_budget(5.0), 466);
        assert_eq!(word_budget(10.0), 966);
    }

    #[test]
    fn test_word_budget_floor() {
        for minutes in [0.0, 0.1, 0.3, 0.5, -2.0, f64::NAN, f64::NEG_INFINITY] {
            assert_eq!(word_budget(minutes), MIN_WORD_BUDGET, "minutes = {}", minutes);
        }
    }

    #[test]
    fn test_word_budget_never_below_floor_for_non_negative_input() {
        let mut minutes = 0.0;
        while minutes < 3.0 {
            assert!(word_budget(minutes) >= MIN_WORD_BUDGET);
            minutes += 0.05;
        }
    }

    #[test]
    fn test_word_budget_custom_rate() {
        assert_eq!(word_budget_with(2.0, 0.0, 0.0, 130.0), 260);
        assert_eq!(word_budget_with(2.0, 30.0, 30.0, 130.0), 130);
    }

    #[test]
    fn test_estimate_speech_duration() {
        let text = "breathe in slowly and breathe out slowly";
        assert_eq!(estimate_speech_duration(text, 70.0), Duration::from_secs(6));
        assert_eq!(estimate_speech_duration("   ", 100.0), Duration::ZERO);
    }
}
