
/// Rounds `value` to `decimals` places with ties going to the even neighbour.
/// This is the precision rule used for every reported percentage and ratio.
/// # Arguments
/// * `value` - the raw value
/// * `decimals` - number of decimal places to keep
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    let scaled = value * scale;
    if !scaled.is_finite() {
        // very large values are already beyond the requested precision
        return value;
    }
    scaled.round_ties_even() / scale
}
