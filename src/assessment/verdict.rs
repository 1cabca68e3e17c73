// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Buy / consider / pass classification of a recommendation headline

use serde::{Deserialize, Serialize};
use std::fmt;

const BUY_PHRASES: &[&str] = &["purchase", "buy", "good buy", "worth buying", "recommend"];
const PASS_PHRASES: &[&str] = &["pass", "skip", "avoid", "skip it", "steer clear"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Buy,
    Consider,
    Pass,
}

impl Verdict {
    /// Classify a free-form headline. Buy phrases win over pass phrases;
    /// anything unrecognised is worth a closer look.
    pub fn from_headline(headline: &str) -> Self {
        let lower = headline.to_lowercase();
        if BUY_PHRASES.iter().any(|p| lower.contains(p)) {
            Self::Buy
        } else if PASS_PHRASES.iter().any(|p| lower.contains(p)) {
            Self::Pass
        } else {
            Self::Consider
        }
    }

    /// Display color used by clients
    pub fn color(&self) -> &'static str {
        match self {
            Self::Buy => "green",
            Self::Consider => "amber",
            Self::Pass => "red",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Consider => "CONSIDER",
            Self::Pass => "PASS",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headlines() {
        assert_eq!(Verdict::from_headline("Purchase this!"), Verdict::Buy);
        assert_eq!(Verdict::from_headline("Worth a closer look"), Verdict::Consider);
        assert_eq!(Verdict::from_headline("Pass"), Verdict::Pass);
        assert_eq!(Verdict::from_headline("Steer clear of this one"), Verdict::Pass);
    }

    #[test]
    fn test_buy_checked_first() {
        // "Don't buy, pass" still contains a buy phrase
        assert_eq!(Verdict::from_headline("Don't buy, pass"), Verdict::Buy);
    }

    #[test]
    fn test_colors() {
        assert_eq!(Verdict::Buy.color(), "green");
        assert_eq!(Verdict::Consider.color(), "amber");
        assert_eq!(Verdict::Pass.color(), "red");
    }
}
