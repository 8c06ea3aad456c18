//! Slash aggregation.
//!
//! Each block's `Staking.Slashed` amounts are summed, scaled down to whole
//! tokens and added to the active era's running total. The total is reset
//! by the era-change detector.

use crate::source::ChainState;
use crate::types::{Balance, Decoded};

use super::Exporter;

/// Sums the decodable slash amounts of one block.
///
/// Returns `None` for a block without slash events. Events that failed to
/// decode are logged and contribute nothing.
pub fn sum_slashes(slashes: &[&Decoded<Balance>]) -> Option<Balance> {
    if slashes.is_empty() {
        return None;
    }

    let mut total: Balance = 0;
    for slash in slashes {
        match slash {
            Ok(amount) => {
                total = total.checked_add(*amount).unwrap_or_else(|| {
                    tracing::error!(total, amount, "slash total overflowed, saturating");
                    Balance::MAX
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to process slash event, skipping");
            }
        }
    }
    Some(total)
}

impl<C: ChainState> Exporter<C> {
    /// Adds one block's slashes to the active era total.
    ///
    /// A block without slash events leaves the gauge untouched.
    pub fn update_slashes(&self, slashes: &[&Decoded<Balance>]) {
        let Some(total) = sum_slashes(slashes) else {
            return;
        };

        let scaled = self.token_scale.scale(total);
        tracing::debug!(raw = total, scaled, "recording block slashes");
        self.metrics.active_era_slashes_total.add(scaled as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::{MockChain, test_metrics};
    use crate::error::DecodeError;
    use crate::types::{RelayHead, TokenScale};

    fn exporter(decimals: u32) -> Exporter<MockChain> {
        Exporter::new(
            MockChain::new(100, RelayHead::default()),
            test_metrics(),
            Vec::new(),
            TokenScale::from_decimals(decimals).unwrap(),
        )
    }

    fn malformed() -> Decoded<Balance> {
        Err(DecodeError::new(
            "Staking.Slashed",
            codec::Error::from("not enough data"),
        ))
    }

    #[test]
    fn empty_block_is_none() {
        assert_eq!(sum_slashes(&[]), None);
    }

    #[test]
    fn sums_decodable_amounts() {
        let a: Decoded<Balance> = Ok(250);
        let b: Decoded<Balance> = Ok(1_000);
        let bad = malformed();

        assert_eq!(sum_slashes(&[&a, &bad, &b]), Some(1_250));
        assert_eq!(sum_slashes(&[&bad]), Some(0));
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let a: Decoded<Balance> = Ok(Balance::MAX);
        let b: Decoded<Balance> = Ok(1);
        assert_eq!(sum_slashes(&[&a, &b]), Some(Balance::MAX));
    }

    #[test]
    fn adds_scaled_total_to_gauge() {
        let exporter = exporter(2);
        let a: Decoded<Balance> = Ok(450);
        let b: Decoded<Balance> = Ok(149);

        exporter.update_slashes(&[&a, &b]);
        // 599 / 100 truncates to 5
        assert_eq!(exporter.metrics().active_era_slashes_total.get(), 5.0);

        exporter.update_slashes(&[&a]);
        assert_eq!(exporter.metrics().active_era_slashes_total.get(), 9.0);
    }

    #[test]
    fn block_without_slashes_does_not_touch_gauge() {
        let exporter = exporter(0);
        exporter.metrics().active_era_slashes_total.set(17.0);

        exporter.update_slashes(&[]);
        assert_eq!(exporter.metrics().active_era_slashes_total.get(), 17.0);
    }

    #[test]
    fn scaling_applies_to_the_block_sum() {
        // 60 + 60 = 120 -> 1 token, even though each alone truncates to 0
        let exporter = exporter(2);
        let a: Decoded<Balance> = Ok(60);

        exporter.update_slashes(&[&a, &a]);
        assert_eq!(exporter.metrics().active_era_slashes_total.get(), 1.0);
    }
}
