use super::state::MotionState;
use crate::config::AnalysisConfig;

/// ヒステリシス付き3状態分類器
///
/// 入口より出口のしきい値を厳しくすることで状態のバタつきを抑える。
/// 遷移表:
/// - HIGH から: MI̅ < τ_L−δ → LOW, MI̅ < τ_H−δ → MID, それ以外 HIGH
/// - MID から:  MI̅ ≥ τ_H+δ → HIGH, MI̅ < τ_L−δ → LOW, それ以外 MID
/// - LOW から:  MI̅ ≥ τ_H+δ → HIGH, MI̅ ≥ τ_L+δ → MID, それ以外 LOW
#[derive(Debug, Clone, Copy)]
pub struct HysteresisClassifier {
    high: f32,
    low: f32,
    margin: f32,
}

impl HysteresisClassifier {
    pub fn new(high: f32, low: f32, margin: f32) -> Self {
        Self { high, low, margin }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.threshold_high,
            config.threshold_low,
            config.hysteresis_margin,
        )
    }

    /// 初期状態（t=0）は絶対しきい値で決める
    fn classify_initial(&self, mi: f32) -> MotionState {
        if mi >= self.high {
            MotionState::High
        } else if mi >= self.low {
            MotionState::Mid
        } else {
            MotionState::Low
        }
    }

    /// 1フレーム分の遷移
    pub fn step(&self, mi: f32, previous: Option<MotionState>) -> MotionState {
        let Some(prev) = previous else {
            return self.classify_initial(mi);
        };

        match prev {
            MotionState::High => {
                if mi < self.low - self.margin {
                    MotionState::Low
                } else if mi < self.high - self.margin {
                    MotionState::Mid
                } else {
                    MotionState::High
                }
            }
            MotionState::Mid => {
                if mi >= self.high + self.margin {
                    MotionState::High
                } else if mi < self.low - self.margin {
                    MotionState::Low
                } else {
                    MotionState::Mid
                }
            }
            MotionState::Low => {
                if mi >= self.high + self.margin {
                    MotionState::High
                } else if mi >= self.low + self.margin {
                    MotionState::Mid
                } else {
                    MotionState::Low
                }
            }
        }
    }

    /// 平滑化済みMIストリーム全体を分類する
    pub fn classify(&self, smoothed: &[f32]) -> Vec<MotionState> {
        let mut states = Vec::with_capacity(smoothed.len());
        let mut previous = None;
        for &mi in smoothed {
            let state = self.step(mi, previous);
            states.push(state);
            previous = Some(state);
        }
        states
    }
}
