pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}

/// Population standard deviation
pub fn std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;

            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}

/// Seconds with millisecond precision, or a dash when unknown
pub fn format_secs(secs: Option<f64>) -> String {
    match secs {
        Some(s) if s.is_finite() => format!("{s:.3}s"),
        _ => "-".to_string(),
    }
}
