/// Relative tolerance used when comparing multipliers recomputed along different routes.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// Returns true for rates the engine accepts: finite and strictly positive.
pub fn is_valid_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

/// Multiplier of a path: the product of its rates, in path order.
///
/// An empty path converts a currency to itself, so its multiplier is `1.0`.
pub fn path_multiplier<I>(rates: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    rates.into_iter().product()
}

/// Compares two floats within a relative tolerance.
///
/// The tolerance is scaled by the larger magnitude, so values near zero
/// are compared absolutely against `tolerance`.
pub fn approx_eq_relative(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= tolerance * scale
}
