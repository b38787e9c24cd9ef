use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AnalysisError, Result};

/// 重み合計の許容誤差
pub const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

/// 平滑化方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    /// 指数移動平均
    Ema,
    /// 中心移動平均（奇数幅）
    Window,
}

/// 各特徴量の重み（合計1.0 ± 0.01 必須）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotionWeights {
    #[serde(default = "default_weight_displacement")]
    pub displacement: f32,
    #[serde(default = "default_weight_velocity")]
    pub velocity: f32,
    #[serde(default = "default_weight_acceleration")]
    pub acceleration: f32,
    #[serde(default = "default_weight_direction_change")]
    pub direction_change: f32,
    #[serde(default = "default_weight_pose_change")]
    pub pose_change: f32,
}

impl MotionWeights {
    pub fn sum(&self) -> f32 {
        self.displacement + self.velocity + self.acceleration + self.direction_change + self.pose_change
    }
}

impl Default for MotionWeights {
    fn default() -> Self {
        Self {
            displacement: default_weight_displacement(),
            velocity: default_weight_velocity(),
            acceleration: default_weight_acceleration(),
            direction_change: default_weight_direction_change(),
            pose_change: default_weight_pose_change(),
        }
    }
}

/// 解析パラメータ一式
///
/// オーケストレーターから `--config` のJSON文字列として渡される。
/// 省略されたキーはデフォルト値、未知のキーは警告（エラーにはしない）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// HIGH判定の上側しきい値
    #[serde(default = "default_threshold_high")]
    pub threshold_high: f32,
    /// LOW判定の下側しきい値
    #[serde(default = "default_threshold_low")]
    pub threshold_low: f32,
    /// ヒステリシスマージンδ
    #[serde(default = "default_hysteresis_margin")]
    pub hysteresis_margin: f32,
    /// 状態の最小継続時間（秒）
    #[serde(default = "default_min_duration")]
    pub min_duration: f32,
    #[serde(default = "default_smoothing_method")]
    pub smoothing_method: SmoothingMethod,
    #[serde(default = "default_smoothing_alpha")]
    pub smoothing_alpha: f32,
    /// 中心移動平均の窓幅（奇数）
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    #[serde(default)]
    pub motion_weights: MotionWeights,
    /// タメ/ツメ検出の有効化
    #[serde(default)]
    pub enable_tame_tsume: bool,
    /// ツメ開始点から遡るフレーム数
    #[serde(default = "default_tame_extension_frames")]
    pub tame_extension_frames: usize,
    /// 正規化済み加速度に対するツメ検出しきい値
    #[serde(default = "default_tsume_accel_threshold")]
    pub tsume_accel_threshold: f32,
    /// フレームごとのキーポイントを解析結果に含める
    #[serde(default)]
    pub save_keypoints: bool,
    /// 有効ポーズとみなす最小キーポイント数
    #[serde(default = "default_min_valid_keypoints")]
    pub min_valid_keypoints: usize,
}

fn default_threshold_high() -> f32 { 0.60 }
fn default_threshold_low() -> f32 { 0.35 }
fn default_hysteresis_margin() -> f32 { 0.05 }
fn default_min_duration() -> f32 { 0.08 }
fn default_smoothing_method() -> SmoothingMethod { SmoothingMethod::Ema }
fn default_smoothing_alpha() -> f32 { 0.7 }
fn default_smoothing_window() -> usize { 3 }
fn default_tame_extension_frames() -> usize { 3 }
fn default_tsume_accel_threshold() -> f32 { 0.7 }
fn default_min_valid_keypoints() -> usize { 5 }

fn default_weight_displacement() -> f32 { 0.30 }
fn default_weight_velocity() -> f32 { 0.25 }
fn default_weight_acceleration() -> f32 { 0.20 }
fn default_weight_direction_change() -> f32 { 0.15 }
fn default_weight_pose_change() -> f32 { 0.10 }

/// JSONブロブが認識するトップレベルキー
const KNOWN_KEYS: &[&str] = &[
    "threshold_high",
    "threshold_low",
    "hysteresis_margin",
    "min_duration",
    "smoothing_method",
    "smoothing_alpha",
    "smoothing_window",
    "motion_weights",
    "enable_tame_tsume",
    "tame_extension_frames",
    "tsume_accel_threshold",
    "save_keypoints",
    "min_valid_keypoints",
];

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            threshold_high: default_threshold_high(),
            threshold_low: default_threshold_low(),
            hysteresis_margin: default_hysteresis_margin(),
            min_duration: default_min_duration(),
            smoothing_method: default_smoothing_method(),
            smoothing_alpha: default_smoothing_alpha(),
            smoothing_window: default_smoothing_window(),
            motion_weights: MotionWeights::default(),
            enable_tame_tsume: false,
            tame_extension_frames: default_tame_extension_frames(),
            tsume_accel_threshold: default_tsume_accel_threshold(),
            save_keypoints: false,
            min_valid_keypoints: default_min_valid_keypoints(),
        }
    }
}

impl AnalysisConfig {
    /// JSON文字列からパースして検証する
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| AnalysisError::Config(format!("config is not valid JSON: {}", e)))?;

        if let Some(map) = value.as_object() {
            for key in map.keys() {
                if !KNOWN_KEYS.contains(&key.as_str()) {
                    warn!(key = %key, "unknown config key ignored");
                }
            }
        } else {
            return Err(AnalysisError::Config("config must be a JSON object".into()));
        }

        let config: AnalysisConfig = serde_json::from_value(value)
            .map_err(|e| AnalysisError::Config(format!("config schema mismatch: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// パラメータ間の整合性を検証する
    pub fn validate(&self) -> Result<()> {
        let sum = self.motion_weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(AnalysisError::Config(format!(
                "motion_weights must sum to 1.0 +/- {} (got {:.3})",
                WEIGHT_SUM_TOLERANCE, sum
            )));
        }
        if self.threshold_high <= self.threshold_low {
            return Err(AnalysisError::Config(format!(
                "threshold_high ({}) must be greater than threshold_low ({})",
                self.threshold_high, self.threshold_low
            )));
        }
        if self.hysteresis_margin < 0.0 {
            return Err(AnalysisError::Config("hysteresis_margin must be >= 0".into()));
        }
        if self.min_duration < 0.0 {
            return Err(AnalysisError::Config("min_duration must be >= 0".into()));
        }
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(AnalysisError::Config(format!(
                "smoothing_alpha must be in (0, 1] (got {})",
                self.smoothing_alpha
            )));
        }
        if self.smoothing_window == 0 || self.smoothing_window % 2 == 0 {
            return Err(AnalysisError::Config(format!(
                "smoothing_window must be odd and >= 1 (got {})",
                self.smoothing_window
            )));
        }
        if self.min_valid_keypoints == 0 {
            return Err(AnalysisError::Config("min_valid_keypoints must be >= 1".into()));
        }
        Ok(())
    }
}
