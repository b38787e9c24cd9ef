use serde::Serialize;

use super::features::FeatureColumns;
use crate::config::MotionWeights;

/// 1フレーム分の重み付き寄与の内訳（デバッグ出力用）
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MiBreakdown {
    pub displacement: f32,
    pub velocity: f32,
    pub acceleration: f32,
    pub direction_change: f32,
    pub pose_change: f32,
}

/// MotionIntensityストリーム
///
/// 構築後は読み取り専用。smoothed は Smoother 適用後に埋まる。
#[derive(Debug, Clone)]
pub struct MiStream {
    pub raw: Vec<f32>,
    pub smoothed: Vec<f32>,
    pub contributions: Vec<MiBreakdown>,
}

impl MiStream {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

/// 正規化済み特徴量の重み付き和 MI(t) を計算する
///
/// 重みの合計が1.0なら MI ∈ [0,1]（検証はconfig側）。
pub fn aggregate(normalized: &FeatureColumns, weights: &MotionWeights) -> (Vec<f32>, Vec<MiBreakdown>) {
    let n = normalized.len();
    let mut raw = Vec::with_capacity(n);
    let mut contributions = Vec::with_capacity(n);

    for t in 0..n {
        let breakdown = MiBreakdown {
            displacement: weights.displacement * normalized.displacement[t],
            velocity: weights.velocity * normalized.velocity[t],
            acceleration: weights.acceleration * normalized.acceleration[t],
            direction_change: weights.direction_change * normalized.direction_change[t],
            pose_change: weights.pose_change * normalized.pose_change[t],
        };
        let mi = breakdown.displacement
            + breakdown.velocity
            + breakdown.acceleration
            + breakdown.direction_change
            + breakdown.pose_change;
        raw.push(mi.clamp(0.0, 1.0));
        contributions.push(breakdown);
    }

    (raw, contributions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(t: usize, fill: f32) -> FeatureColumns {
        FeatureColumns {
            displacement: vec![fill; t],
            velocity: vec![fill; t],
            acceleration: vec![fill; t],
            direction_change: vec![fill; t],
            pose_change: vec![fill; t],
            valid: vec![true; t],
        }
    }

    #[test]
    fn test_all_ones_gives_weight_sum() {
        let (raw, _) = aggregate(&columns(3, 1.0), &MotionWeights::default());
        for mi in raw {
            assert!((mi - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_all_zeros_gives_zero() {
        let (raw, _) = aggregate(&columns(3, 0.0), &MotionWeights::default());
        assert_eq!(raw, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_breakdown_matches_weights() {
        let weights = MotionWeights::default();
        let (raw, contributions) = aggregate(&columns(1, 0.5), &weights);
        let b = &contributions[0];
        assert!((b.displacement - weights.displacement * 0.5).abs() < 1e-6);
        assert!((b.pose_change - weights.pose_change * 0.5).abs() < 1e-6);
        let sum = b.displacement + b.velocity + b.acceleration + b.direction_change + b.pose_change;
        assert!((raw[0] - sum).abs() < 1e-6);
    }

    #[test]
    fn test_mi_stays_in_unit_interval() {
        let mut cols = columns(4, 1.0);
        cols.displacement = vec![0.0, 0.3, 0.9, 1.0];
        let (raw, _) = aggregate(&cols, &MotionWeights::default());
        for mi in raw {
            assert!((0.0..=1.0).contains(&mi));
        }
    }
}
