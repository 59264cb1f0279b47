//! Derivation of the full pairwise rate matrix from direct rates

use crate::core::currency::CurrencyCode;
use crate::core::error::Result;
use crate::core::rates::{DerivedRate, Multipliers, RateSource, RateStore};
use tracing::{debug, info};

/// Computes every ordered pair rate among `reference` and `targets`.
///
/// `targets` carries the direct rate `reference -> target` for each target,
/// in the order the pairs should be visited. The result holds
/// `k * (k - 1)` entries for `k = targets.len() + 1` currencies. Unordered
/// pairs `{ci, cj}` are visited for `i < j` over `[reference, targets..]`,
/// each emitted as `ci -> cj` followed by `cj -> ci`.
///
/// Only inverse-of-reference rates are scaled by `multipliers`; direct and
/// cross rates are written as computed.
pub fn derive_rates(
    reference: &CurrencyCode,
    targets: &[(CurrencyCode, f64)],
    multipliers: &Multipliers,
) -> Vec<DerivedRate> {
    let k = targets.len() + 1;
    let mut rates = Vec::with_capacity(k * (k - 1));

    for (target, direct) in targets {
        rates.push(DerivedRate {
            from: reference.clone(),
            to: target.clone(),
            rate: *direct,
        });
        rates.push(DerivedRate {
            from: target.clone(),
            to: reference.clone(),
            rate: (1.0 / direct) * multipliers.factor(target, reference),
        });
    }

    for (i, (from, from_direct)) in targets.iter().enumerate() {
        for (to, to_direct) in &targets[i + 1..] {
            rates.push(DerivedRate {
                from: from.clone(),
                to: to.clone(),
                rate: to_direct / from_direct,
            });
            rates.push(DerivedRate {
                from: to.clone(),
                to: from.clone(),
                rate: from_direct / to_direct,
            });
        }
    }

    rates
}

/// Writes a complete rate matrix for a list of currencies into a store.
#[derive(Debug, Clone, Default)]
pub struct CrossRateDeriver {
    multipliers: Multipliers,
}

impl CrossRateDeriver {
    pub fn new(multipliers: Multipliers) -> Self {
        Self { multipliers }
    }

    /// Refreshes `source`, fetches one direct rate per non-reference currency
    /// and writes every ordered pair into `store`. The first currency is the
    /// reference. Returns the number of writes.
    ///
    /// The source is refreshed exactly once, even for an empty list. Runs
    /// strictly in sequence. Any source or store error aborts the pass and
    /// leaves the rates written so far in place.
    pub async fn derive_and_store(
        &self,
        currencies: &[CurrencyCode],
        source: &dyn RateSource,
        store: &dyn RateStore,
    ) -> Result<usize> {
        info!(count = currencies.len(), "Deriving exchange rates");
        source.refresh(currencies).await?;

        let Some((reference, others)) = currencies.split_first() else {
            debug!("No currencies given, nothing to derive");
            return Ok(0);
        };
        debug!("Reference currency {}", reference);

        let mut targets = Vec::with_capacity(others.len());
        for target in others {
            let direct = source.get_direct_rate(reference, target).await?;
            debug!("Direct rate {}/{} = {}", reference, target, direct);
            targets.push((target.clone(), direct));
        }

        let rates = derive_rates(reference, &targets, &self.multipliers);
        for rate in &rates {
            store.set_rate(&rate.from, &rate.to, rate.rate).await?;
            debug!("Stored rate {}/{} = {}", rate.from, rate.to, rate.rate);
        }

        info!(writes = rates.len(), "Exchange rates stored");
        Ok(rates.len())
    }
}
