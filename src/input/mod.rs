//! # Input Collection
//!
//! Parses the three answers a run needs (seed, clip count, effects toggle)
//! and asks for them interactively when they were not given on the command line.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chaos_compositor::input::{collect_request, RequestOverrides};
//!
//! # fn main() -> chaos_compositor::Result<()> {
//! let stdin = std::io::stdin();
//! let request = collect_request(
//!     &mut stdin.lock(),
//!     &mut std::io::stdout(),
//!     RequestOverrides::default(),
//! )?;
//! println!("Chose seed: {}", request.seed);
//! # Ok(())
//! # }
//! ```

pub mod prompt;

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

pub use prompt::prompt_until;

pub const SEED_PROMPT: &str = "Video seed (or 'any' to pick one automatically): ";
pub const COUNT_PROMPT: &str = "Amount of videos: ";
pub const EFFECTS_PROMPT: &str = "Apply video effects? (y/n): ";

/// Tokens that ask for an automatically derived seed
const AUTO_SEED_TOKENS: [&str; 4] = ["any", "skip", "default", "time"];

const YES_TOKENS: [&str; 3] = ["y", "yes", "true"];
const NO_TOKENS: [&str; 3] = ["n", "no", "false"];

/// A seed answer before it is resolved to a number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedChoice {
    Fixed(u64),
    Automatic,
}

impl SeedChoice {
    /// Resolve to a concrete seed, deriving one from the clock if needed
    pub fn resolve(self) -> u64 {
        match self {
            Self::Fixed(seed) => seed,
            Self::Automatic => seed_from_time(),
        }
    }
}

/// Everything the composition needs from the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionRequest {
    pub seed: u64,
    pub video_count: usize,
    pub effects: bool,
}

/// Answers supplied up front; any `None` is asked for interactively
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOverrides {
    pub seed: Option<SeedChoice>,
    pub video_count: Option<usize>,
    pub effects: Option<bool>,
}

/// True for a non-empty run of ASCII digits
fn is_decimal(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a seed answer: digits, or one of the automatic tokens
pub fn parse_seed(input: &str) -> Option<SeedChoice> {
    let input = input.trim();
    if is_decimal(input) {
        return input.parse().ok().map(SeedChoice::Fixed);
    }

    AUTO_SEED_TOKENS
        .contains(&input)
        .then_some(SeedChoice::Automatic)
}

/// Parse a clip count: a non-negative integer literal
pub fn parse_count(input: &str) -> Option<usize> {
    let input = input.trim();
    if !is_decimal(input) {
        return None;
    }
    input.parse().ok()
}

/// Parse the effects toggle, case-insensitively
pub fn parse_effects_toggle(input: &str) -> Option<bool> {
    let answer = input.trim().to_lowercase();
    if YES_TOKENS.contains(&answer.as_str()) {
        Some(true)
    } else if NO_TOKENS.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Seed derived from the system clock, kept within the positive i64 range
pub fn seed_from_time() -> u64 {
    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_micros());
    nanos.unsigned_abs() & (i64::MAX as u64)
}

/// Collect seed, count and effects toggle, prompting for whatever is missing
pub fn collect_request<R, W>(
    reader: &mut R,
    writer: &mut W,
    overrides: RequestOverrides,
) -> Result<CompositionRequest>
where
    R: BufRead,
    W: Write,
{
    let seed_choice = match overrides.seed {
        Some(choice) => choice,
        None => prompt_until(reader, writer, SEED_PROMPT, parse_seed)?,
    };
    let seed = seed_choice.resolve();
    info!("Chose seed: {}", seed);

    let video_count = match overrides.video_count {
        Some(count) => count,
        None => prompt_until(reader, writer, COUNT_PROMPT, parse_count)?,
    };

    let effects = match overrides.effects {
        Some(effects) => effects,
        None => prompt_until(reader, writer, EFFECTS_PROMPT, parse_effects_toggle)?,
    };

    Ok(CompositionRequest {
        seed,
        video_count,
        effects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_seed() {
        assert_eq!(parse_seed("42"), Some(SeedChoice::Fixed(42)));
        assert_eq!(parse_seed("0"), Some(SeedChoice::Fixed(0)));
        assert_eq!(parse_seed("any\n"), Some(SeedChoice::Automatic));
        assert_eq!(parse_seed("time"), Some(SeedChoice::Automatic));
        assert_eq!(parse_seed("skip"), Some(SeedChoice::Automatic));
        assert_eq!(parse_seed("default"), Some(SeedChoice::Automatic));

        assert_eq!(parse_seed("-3"), None);
        assert_eq!(parse_seed("+3"), None);
        assert_eq!(parse_seed("1.5"), None);
        assert_eq!(parse_seed("ANY"), None);
        assert_eq!(parse_seed(""), None);
        assert_eq!(parse_seed("99999999999999999999999"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("0"), Some(0));
        assert_eq!(parse_count("60\n"), Some(60));
        assert_eq!(parse_count("-1"), None);
        assert_eq!(parse_count("six"), None);
        assert_eq!(parse_count(""), None);
    }

    #[test]
    fn test_parse_effects_toggle() {
        for yes in ["y", "YES", "True", "yes\n"] {
            assert_eq!(parse_effects_toggle(yes), Some(true), "{yes}");
        }
        for no in ["n", "No", "FALSE"] {
            assert_eq!(parse_effects_toggle(no), Some(false), "{no}");
        }
        assert_eq!(parse_effects_toggle("maybe"), None);
        assert_eq!(parse_effects_toggle(""), None);
    }

    #[test]
    fn test_time_seed_is_positive_i64() {
        let seed = seed_from_time();
        assert!(seed <= i64::MAX as u64);
    }

    #[test]
    fn test_collect_request_reprompts() {
        let mut input = Cursor::new("abc\n7\nlots\n3\nmaybe\nY\n");
        let mut output = Vec::new();

        let request = collect_request(&mut input, &mut output, RequestOverrides::default()).unwrap();

        assert_eq!(
            request,
            CompositionRequest { seed: 7, video_count: 3, effects: true }
        );

        let printed = String::from_utf8(output).unwrap();
        assert_eq!(printed.matches(SEED_PROMPT).count(), 2);
        assert_eq!(printed.matches(COUNT_PROMPT).count(), 2);
        assert_eq!(printed.matches(EFFECTS_PROMPT).count(), 2);
    }

    #[test]
    fn test_overrides_skip_prompts() {
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        let overrides = RequestOverrides {
            seed: Some(SeedChoice::Fixed(42)),
            video_count: Some(5),
            effects: Some(false),
        };

        let request = collect_request(&mut input, &mut output, overrides).unwrap();

        assert_eq!(request.seed, 42);
        assert_eq!(request.video_count, 5);
        assert!(!request.effects);
        assert!(output.is_empty());
    }
}
