//! Tinybar <-> weibar conversion (Glossary: "Tinybar / weibar").
//!
//! The upstream network accounts in its native sub-unit ("tinybar"); every
//! value-carrying Ethereum field is its weibar equivalent. The conversion
//! coefficient is fixed by the upstream's protocol (commonly `10^10`) and is
//! not expected to change at runtime, but is not hard-coded as a bare
//! literal scattered through call sites — it is threaded through as an
//! explicit argument so tests can exercise other coefficients.

use alloy_primitives::U256;

/// The conventional tinybar -> weibar coefficient: `10^10`.
pub const DEFAULT_TINYBAR_TO_WEIBAR_COEF: u64 = 10_000_000_000;

/// Converts a tinybar amount to its weibar equivalent.
pub fn tinybar_to_weibar(tinybar: u64, coef: u64) -> U256 {
    U256::from(tinybar) * U256::from(coef)
}

/// Converts a weibar amount back to tinybar, truncating any remainder.
pub fn weibar_to_tinybar(weibar: U256, coef: u64) -> u64 {
    let coef = U256::from(coef);
    if coef.is_zero() {
        return 0;
    }
    (weibar / coef).to::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_exact_multiples() {
        let coef = DEFAULT_TINYBAR_TO_WEIBAR_COEF;
        for tinybar in [0u64, 1, 42, 1_000_000] {
            let weibar = tinybar_to_weibar(tinybar, coef);
            assert_eq!(weibar_to_tinybar(weibar, coef), tinybar);
        }
    }

    #[test]
    fn weibar_to_tinybar_truncates_remainder() {
        let coef = DEFAULT_TINYBAR_TO_WEIBAR_COEF;
        let weibar = tinybar_to_weibar(1, coef) + U256::from(1u64);
        assert_eq!(weibar_to_tinybar(weibar, coef), 1);
    }
}
