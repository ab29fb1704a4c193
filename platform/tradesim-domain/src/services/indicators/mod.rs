//! Indicator helpers evaluated over the tail of a close-price slice.

/// Simple moving average of the last `window` values.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let slice = &values[values.len() - window..];
    Some(slice.iter().sum::<f64>() / window as f64)
}

/// RSI over the last `period` price changes (fewer if the slice is shorter).
///
/// Gains and losses are plain means of the positive changes and of the
/// absolute negative changes in the window. A window without losses reads 100.
pub fn rsi(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < 2 {
        return None;
    }
    let changes = period.min(values.len() - 1);
    let window = &values[values.len() - changes - 1..];

    let mut sum_gains = 0.0;
    let mut sum_losses = 0.0;
    for pair in window.windows(2) {
        let diff = pair[1] - pair[0];
        if diff > 0.0 {
            sum_gains += diff;
        } else {
            sum_losses += -diff;
        }
    }

    let avg_gain = sum_gains / changes as f64;
    let avg_loss = sum_losses / changes as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}
