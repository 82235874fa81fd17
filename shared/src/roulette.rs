use rand::Rng;
use serde::{Serialize, Deserialize};

/// Weights substituted when the configured table has no positive weight at
/// all, so that a draw is always possible.
pub const FALLBACK_LOSE_WEIGHT: i64 = 999_996;
pub const FALLBACK_GIFT_WEIGHT: i64 = 1;

/// Index of the reserved "lose" outcome. Gifts occupy indices 1..=4.
pub const LOSE_IDX: u8 = 0;

/// One slot of the roulette table: the reserved lose slot or a gift.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub idx: u8,
    pub name: String,
    pub weight: i64,
    pub sticker: Option<String>,
}

impl Outcome {
    pub fn is_lose(&self) -> bool {
        self.idx == LOSE_IDX
    }
}

/// Which balance a draw consumed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum SpinType {
    Free,
    Paid,
}

impl SpinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinType::Free => "free",
            SpinType::Paid => "paid",
        }
    }
}

/// Result of a completed draw: what was spent and what came up.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DrawResult {
    pub spin_type: SpinType,
    pub outcome: Outcome,
}

/// Clamps negative weights to zero and, when the whole table sums to zero,
/// substitutes the fallback distribution. The returned list keeps its order:
/// lose first, then gifts 1..=4.
pub fn normalize_outcomes(mut outcomes: Vec<Outcome>) -> Vec<Outcome> {
    for o in &mut outcomes {
        if o.weight < 0 {
            o.weight = 0;
        }
    }
    if total_weight(&outcomes) <= 0 {
        for o in &mut outcomes {
            o.weight = if o.is_lose() {
                FALLBACK_LOSE_WEIGHT
            } else {
                FALLBACK_GIFT_WEIGHT
            };
        }
    }
    outcomes
}

/// Saturating sum, so an absurd stored weight cannot wrap the total
/// negative and trip the fallback path.
pub fn total_weight(outcomes: &[Outcome]) -> i64 {
    outcomes
        .iter()
        .fold(0i64, |acc, o| acc.saturating_add(o.weight))
}

/// Selects the winning slot for a 1-indexed roll `r` in `[1, total_weight]`.
///
/// The cumulative scan walks the table in order (lose, gift 1..4) and stops
/// at the first slot whose running sum reaches `r`. Boundary behavior is a
/// contract: with weights [96, 1, 1, 1, 1], r = 96 is still the lose slot
/// and r = 97 lands on gift 1.
pub fn pick_index(outcomes: &[Outcome], r: i64) -> usize {
    let mut cumulative = 0i64;
    for (i, o) in outcomes.iter().enumerate() {
        cumulative = cumulative.saturating_add(o.weight);
        if r <= cumulative {
            return i;
        }
    }
    0
}

/// Draws one outcome with probability `weight_i / total`. Falls back to the
/// first slot if the table somehow has no weight at call time.
pub fn pick_weighted<'a, R: Rng>(outcomes: &'a [Outcome], rng: &mut R) -> &'a Outcome {
    let total = total_weight(outcomes);
    if total <= 0 {
        return &outcomes[0];
    }
    let r = rng.gen_range(1..=total);
    &outcomes[pick_index(outcomes, r)]
}
