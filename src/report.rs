use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::motion::MiStream;
use crate::pose::keypoint::{KeypointIndex, DEFAULT_CONFIDENCE};
use crate::pose::track::PoseTrack;
use crate::timing::MotionState;

/// 保存用キーポイント（名称付き）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeypointRecord {
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

/// フレームごとの解析レコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRecord {
    pub frame_index: usize,
    /// 秒（frame_index × Δt）
    pub timestamp: f64,
    pub motion_intensity_score: f32,
    pub smoothed_score: f32,
    pub motion_state: MotionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<KeypointRecord>>,
}

/// 永続化される解析結果ドキュメント
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub source_video_path: String,
    pub output_video_path: String,
    /// ISO-8601 UTC
    pub analysis_timestamp: String,
    /// 使用したパラメータのスナップショット
    pub parameters: AnalysisConfig,
    pub frame_data: Vec<FrameRecord>,
}

/// 解析結果ドキュメントを組み立てる
pub fn assemble_result(
    source_path: &str,
    output_path: &str,
    config: &AnalysisConfig,
    track: &PoseTrack,
    mi: &MiStream,
    states: &[MotionState],
    frame_interval: f64,
) -> AnalysisResult {
    let frame_data = (0..states.len())
        .map(|t| {
            let keypoints = if config.save_keypoints {
                Some(keypoint_records(track, t))
            } else {
                None
            };
            FrameRecord {
                frame_index: t,
                timestamp: t as f64 * frame_interval,
                motion_intensity_score: mi.raw[t],
                smoothed_score: mi.smoothed[t],
                motion_state: states[t],
                keypoints,
            }
        })
        .collect();

    AnalysisResult {
        id: None,
        source_video_path: source_path.to_string(),
        output_video_path: output_path.to_string(),
        analysis_timestamp: Utc::now().to_rfc3339(),
        parameters: config.clone(),
        frame_data,
    }
}

/// 有効なキーポイントだけを名称付きで書き出す
fn keypoint_records(track: &PoseTrack, t: usize) -> Vec<KeypointRecord> {
    let frame = &track.frames[t];
    if !frame.valid {
        return Vec::new();
    }
    (0..KeypointIndex::COUNT)
        .filter_map(|i| {
            let kp = &frame.pose.keypoints[i];
            if !kp.is_valid(DEFAULT_CONFIDENCE) {
                return None;
            }
            let index = KeypointIndex::from_index(i)?;
            Some(KeypointRecord {
                name: index.name().to_string(),
                x: kp.x,
                y: kp.y,
                confidence: kp.confidence,
            })
        })
        .collect()
}
