use super::features::{FeatureColumns, EPSILON};

/// 1チャンネルをクリップ内min-maxで[0,1]に写像
///
/// 有限値のみを対象にし、max == min のチャンネルは0に潰れる。
pub fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }

    let range = max - min;
    if !range.is_finite() || range <= EPSILON {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|&v| if v.is_finite() { (v - min) / range } else { 0.0 })
        .collect()
}

/// 全チャンネルを独立に正規化した特徴量列を返す
pub fn normalize_features(raw: &FeatureColumns) -> FeatureColumns {
    FeatureColumns {
        displacement: min_max_normalize(&raw.displacement),
        velocity: min_max_normalize(&raw.velocity),
        acceleration: min_max_normalize(&raw.acceleration),
        direction_change: min_max_normalize(&raw.direction_change),
        pose_change: min_max_normalize(&raw.pose_change),
        valid: raw.valid.clone(),
    }
}
