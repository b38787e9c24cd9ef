use crate::config::{AnalysisConfig, SmoothingMethod};

/// EMAベースの平滑化
///
/// MI̅(t) = α·MI(t) + (1−α)·MI̅(t−1), MI̅(0) = MI(0)
pub fn smooth_ema(values: &[f32], alpha: f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f32> = None;
    for &v in values {
        let smoothed = match prev {
            Some(p) => alpha * v + (1.0 - alpha) * p,
            None => v,
        };
        out.push(smoothed);
        prev = Some(smoothed);
    }
    out
}

/// 中心移動平均（奇数幅、端は切り詰め）
pub fn smooth_window(values: &[f32], window: usize) -> Vec<f32> {
    debug_assert!(window % 2 == 1, "window width must be odd");
    let n = values.len();
    let half = window / 2;
    let mut out = Vec::with_capacity(n);
    for t in 0..n {
        let start = t.saturating_sub(half);
        let end = (t + half + 1).min(n);
        let sum: f32 = values[start..end].iter().sum();
        out.push(sum / (end - start) as f32);
    }
    out
}

/// 設定に応じた平滑化を適用する
pub fn smooth(values: &[f32], config: &AnalysisConfig) -> Vec<f32> {
    match config.smoothing_method {
        SmoothingMethod::Ema => smooth_ema(values, config.smoothing_alpha),
        SmoothingMethod::Window => smooth_window(values, config.smoothing_window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_first_value_passthrough() {
        let out = smooth_ema(&[0.8, 0.0], 0.5);
        assert_eq!(out[0], 0.8);
        assert!((out[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_ema_alpha_one_is_identity() {
        let input = vec![0.1, 0.9, 0.2, 0.7];
        let out = smooth_ema(&input, 1.0);
        assert_eq!(out, input);
    }

    #[test]
    fn test_ema_converges_to_constant() {
        let input = vec![0.5; 20];
        let out = smooth_ema(&input, 0.3);
        for v in out {
            assert!((v - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_window_centered() {
        let out = smooth_window(&[0.0, 3.0, 6.0], 3);
        // 中央: (0+3+6)/3
        assert!((out[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_window_boundary_truncation() {
        let out = smooth_window(&[0.0, 3.0, 6.0], 3);
        // 端は存在する分だけの平均
        assert!((out[0] - 1.5).abs() < 1e-6);
        assert!((out[2] - 4.5).abs() < 1e-6);
    }

    #[test]
    fn test_window_width_one_is_identity() {
        let input = vec![0.2, 0.8, 0.4];
        let out = smooth_window(&input, 1);
        assert_eq!(out, input);
    }

    #[test]
    fn test_smoothed_stays_in_unit_interval() {
        let input = vec![0.0, 1.0, 0.0, 1.0, 0.3];
        for out in [smooth_ema(&input, 0.7), smooth_window(&input, 3)] {
            for v in out {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(smooth_ema(&[], 0.5).is_empty());
        assert!(smooth_window(&[], 3).is_empty());
    }
}
