use tracing::warn;

use super::keypoint::{Pose, DEFAULT_CONFIDENCE};
use crate::error::{AnalysisError, Result};

/// スケール下限。バウンディングボックスがこの値未満なら退化とみなす
const SCALE_EPSILON: f32 = 1e-8;

/// 抽出パス後のフレームごとの姿勢
///
/// `valid == false` のフレームは特徴量に寄与しない（スケールは前値を保持）。
#[derive(Debug, Clone)]
pub struct FramePose {
    pub pose: Pose,
    pub valid: bool,
    /// キャラクタースケールS(t)（ピクセル）
    pub scale: f32,
}

/// クリップ全体の姿勢トラック
#[derive(Debug, Clone)]
pub struct PoseTrack {
    pub frames: Vec<FramePose>,
    /// 一時的な検出失敗の回数（回復済み、サマリ報告用）
    pub transient_failures: usize,
}

/// 検出結果列からトラックを構築する
///
/// - 有効キーポイントが `min_valid_keypoints` 未満、検出失敗(None)、
///   スケールが算出できないフレームは invalid として扱う
/// - S(t) は直前の有効値を持ち越す
/// - 全フレームで有効な姿勢が一つも得られなければ `NoSubjectDetected`
pub fn build_track(detections: &[Option<Pose>], min_valid_keypoints: usize) -> Result<PoseTrack> {
    let mut frames = Vec::with_capacity(detections.len());
    let mut carried_scale: Option<f32> = None;
    let mut transient_failures = 0usize;
    let mut any_valid = false;

    for (index, detection) in detections.iter().enumerate() {
        let (pose, mut valid) = match detection {
            Some(pose) => {
                let count = pose.valid_count(DEFAULT_CONFIDENCE);
                (pose.clone(), count >= min_valid_keypoints)
            }
            None => (Pose::default(), false),
        };

        if valid {
            match pose.bbox_diagonal(DEFAULT_CONFIDENCE) {
                Some(diag) if diag >= SCALE_EPSILON => {
                    carried_scale = Some(diag);
                }
                // 退化bboxはスケールを更新しない。持ち越しも無ければ無効
                _ => {
                    if carried_scale.is_none() {
                        valid = false;
                    }
                }
            }
        }

        if !valid {
            transient_failures += 1;
            warn!(frame = index, "pose extraction failed, carrying scale forward");
        } else {
            any_valid = true;
        }

        frames.push(FramePose {
            pose,
            valid,
            scale: carried_scale.unwrap_or(0.0),
        });
    }

    if !any_valid {
        return Err(AnalysisError::NoSubjectDetected);
    }

    Ok(PoseTrack {
        frames,
        transient_failures,
    })
}
