//! FSRS-6 core formulas
//!
//! Pure functions over stability (S, days), difficulty (D, 1-10),
//! retrievability (R, 0-1) and elapsed time (t, days).

use super::scheduler::Rating;

// ============================================================================
// CONSTANTS
// ============================================================================

/// FSRS-6 default weights (21 parameters)
pub const FSRS6_WEIGHTS: [f64; 21] = [
    0.212, 1.2931, 2.3065, 8.2956, 6.4133, 0.8334, 3.0194, 0.001, 1.8722, 0.1666, 0.796, 1.4835,
    0.0614, 0.2629, 1.6483, 0.6014, 1.8729, 0.5425, 0.0912, 0.0658, 0.1542,
];

/// Default forgetting curve decay (w20)
pub const DEFAULT_DECAY: f64 = 0.1542;

/// Default desired retention
pub const DEFAULT_RETENTION: f64 = 0.9;

pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;
pub const MIN_STABILITY: f64 = 0.001;
pub const MAX_STABILITY: f64 = 36500.0;

// ============================================================================
// FORGETTING CURVE
// ============================================================================

fn factor(decay: f64) -> f64 {
    0.9_f64.powf(-1.0 / decay) - 1.0
}

/// Probability of recall after `elapsed_days` with the default decay
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    retrievability_with_decay(stability, elapsed_days, DEFAULT_DECAY)
}

/// R = (1 + FACTOR * t / S)^(-w20)
pub fn retrievability_with_decay(stability: f64, elapsed_days: f64, decay: f64) -> f64 {
    if stability <= 0.0 {
        return 0.0;
    }
    let t = elapsed_days.max(0.0);
    (1.0 + factor(decay) * t / stability).powf(-decay)
}

/// Days until retrievability drops to `desired_retention` (default decay)
pub fn next_interval(stability: f64, desired_retention: f64) -> f64 {
    next_interval_with_decay(stability, desired_retention, DEFAULT_DECAY)
}

/// t = S / FACTOR * (R^(-1/w20) - 1)
pub fn next_interval_with_decay(stability: f64, desired_retention: f64, decay: f64) -> f64 {
    let retention = desired_retention.clamp(0.01, 0.99);
    stability / factor(decay) * (retention.powf(-1.0 / decay) - 1.0)
}

// ============================================================================
// INITIAL STATE
// ============================================================================

pub fn initial_stability(rating: Rating) -> f64 {
    initial_stability_with_weights(rating, &FSRS6_WEIGHTS)
}

/// S0(G) = w[G-1]
pub fn initial_stability_with_weights(rating: Rating, w: &[f64; 21]) -> f64 {
    w[(rating.as_i32() - 1) as usize].clamp(MIN_STABILITY, MAX_STABILITY)
}

pub fn initial_difficulty(rating: Rating) -> f64 {
    initial_difficulty_with_weights(rating, &FSRS6_WEIGHTS)
}

/// D0(G) = w4 - e^(w5 * (G - 1)) + 1
pub fn initial_difficulty_with_weights(rating: Rating, w: &[f64; 21]) -> f64 {
    let g = f64::from(rating.as_i32());
    (w[4] - (w[5] * (g - 1.0)).exp() + 1.0).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

// ============================================================================
// TRANSITIONS
// ============================================================================

pub fn next_difficulty(difficulty: f64, rating: Rating) -> f64 {
    next_difficulty_with_weights(difficulty, rating, &FSRS6_WEIGHTS)
}

/// Linear damping toward 10, then mean reversion toward D0(Easy)
pub fn next_difficulty_with_weights(difficulty: f64, rating: Rating, w: &[f64; 21]) -> f64 {
    let g = f64::from(rating.as_i32());
    let delta = -w[6] * (g - 3.0);
    let damped = difficulty + delta * (MAX_DIFFICULTY - difficulty) / 9.0;
    let target = initial_difficulty_with_weights(Rating::Easy, w);
    (w[7] * target + (1.0 - w[7]) * damped).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

pub fn next_recall_stability(difficulty: f64, stability: f64, retrievability: f64, rating: Rating) -> f64 {
    next_recall_stability_with_weights(difficulty, stability, retrievability, rating, &FSRS6_WEIGHTS)
}

/// Stability after a successful recall (Hard, Good or Easy)
pub fn next_recall_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    rating: Rating,
    w: &[f64; 21],
) -> f64 {
    let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
    let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };
    let growth = w[8].exp()
        * (11.0 - difficulty)
        * stability.powf(-w[9])
        * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
        * hard_penalty
        * easy_bonus;
    (stability * (growth + 1.0)).clamp(MIN_STABILITY, MAX_STABILITY)
}

pub fn next_forget_stability(difficulty: f64, stability: f64, retrievability: f64) -> f64 {
    next_forget_stability_with_weights(difficulty, stability, retrievability, &FSRS6_WEIGHTS)
}

/// Stability after a lapse, never above the pre-lapse value
pub fn next_forget_stability_with_weights(
    difficulty: f64,
    stability: f64,
    retrievability: f64,
    w: &[f64; 21],
) -> f64 {
    let forget = w[11]
        * difficulty.powf(-w[12])
        * ((stability + 1.0).powf(w[13]) - 1.0)
        * (w[14] * (1.0 - retrievability)).exp();
    let short_term_cap = stability / (w[17] * w[18]).exp();
    forget.min(short_term_cap).clamp(MIN_STABILITY, MAX_STABILITY)
}

pub fn same_day_stability(stability: f64, rating: Rating) -> f64 {
    same_day_stability_with_weights(stability, rating, &FSRS6_WEIGHTS)
}

/// Short-term update for reviews on the day of the previous one
pub fn same_day_stability_with_weights(stability: f64, rating: Rating, w: &[f64; 21]) -> f64 {
    let g = f64::from(rating.as_i32());
    let mut increase = (w[17] * (g - 3.0 + w[18])).exp() * stability.powf(-w[19]);
    if rating >= Rating::Good {
        increase = increase.max(1.0);
    }
    (stability * increase).clamp(MIN_STABILITY, MAX_STABILITY)
}
