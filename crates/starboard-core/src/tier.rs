//! Display tiers for endorsement counts.
//!
//! Bands are half-open and partition `[0, ∞)`:
//!
//! | count      | tier | icon |
//! |------------|------|------|
//! | `[0, 5)`   | 1    | ⭐   |
//! | `[5, 10)`  | 2    | 🌟   |
//! | `[10, 15)` | 3    | 💫   |
//! | `[15, ∞)`  | 4    | ✨   |

use serde::Serialize;

/// A display band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Tier {
    /// 1-based band number, increasing with count
    pub level: u8,

    /// Inclusive lower bound of the band
    pub lower_bound: u32,

    pub icon: &'static str,
}

/// Band table, highest lower bound first. The first band whose lower bound
/// is at or below the count wins.
pub const TIERS: [Tier; 4] = [
    Tier { level: 4, lower_bound: 15, icon: "✨" },
    Tier { level: 3, lower_bound: 10, icon: "💫" },
    Tier { level: 2, lower_bound: 5, icon: "🌟" },
    Tier { level: 1, lower_bound: 0, icon: "⭐" },
];

/// Tier plus the rendered `"{count} {icon}"` label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierLabel {
    pub tier: Tier,
    pub label: String,
}

/// Resolve the band for a count.
pub fn tier_for(count: u32) -> Tier {
    // the last band has lower bound 0, so the search always succeeds
    TIERS
        .iter()
        .copied()
        .find(|tier| count >= tier.lower_bound)
        .unwrap_or(TIERS[TIERS.len() - 1])
}

/// Classify a count into its tier and display label.
pub fn classify(count: u32) -> TierLabel {
    let tier = tier_for(count);
    TierLabel {
        tier,
        label: format!("{} {}", count, tier.icon),
    }
}
