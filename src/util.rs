pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Population variance.
pub fn variance(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let sum_sq = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;

            diff * diff
        })
        .sum::<f64>();

    Some(sum_sq / data.len() as f64)
}
