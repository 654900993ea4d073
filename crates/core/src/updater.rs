use tracing::debug;

use super::inverse_index::InverseIndex;
use super::rate_table::RateTable;
use super::registry::CycleRegistry;
use common::error::Error;
use common::numeric_kernel::is_valid_rate;
use common::types::{CycleId, EdgeKey};

/// Applies a single rate change and reprices exactly the cycles that use `edge`.
///
/// The inverse index yields the affected ids; each is repriced from scratch
/// along its own stored path. Cycles that do not contain `edge` are never
/// touched, so their multipliers stay bit-for-bit identical.
///
/// The change is all-or-nothing: inputs and index freshness are checked before
/// the rate table is written, and the new multipliers are computed before any
/// record is overwritten.
///
/// # Returns
/// The ids whose multiplier was recomputed, ascending.
///
/// # Errors
/// - `Error::InvalidRate` → `new_rate` is not finite and positive.
/// - `Error::UnknownEdge` → `edge` is not in the rate table.
/// - `Error::StaleIndex` → `index` does not reflect `registry`'s membership.
pub fn apply_rate_change(
    edge: &EdgeKey,
    new_rate: f64,
    rates: &mut RateTable,
    registry: &mut CycleRegistry,
    index: &InverseIndex,
) -> Result<Vec<CycleId>, Error> {
    if !is_valid_rate(new_rate) {
        return Err(Error::InvalidRate {
            pair: edge.to_string(),
            rate: new_rate,
        });
    }
    if !rates.contains(edge) {
        return Err(Error::UnknownEdge(edge.to_string()));
    }
    let affected = index.affected_cycles(edge, registry)?;

    let previous = rates.set_rate(edge, new_rate)?;

    let repriced = affected
        .iter()
        .map(|&id| registry.price(id, rates).map(|multiplier| (id, multiplier)))
        .collect::<Result<Vec<_>, Error>>();

    let repriced = match repriced {
        Ok(repriced) => repriced,
        Err(e) => {
            rates.set_rate(edge, previous)?;
            return Err(e);
        }
    };

    for (id, multiplier) in repriced {
        registry.set_multiplier(id, multiplier)?;
    }

    debug!(
        %edge,
        previous,
        new_rate,
        affected = affected.len(),
        "rate change applied"
    );

    Ok(affected)
}
