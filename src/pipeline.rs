use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::motion::{self, MiStream};
use crate::pose::keypoint::Pose;
use crate::pose::track::{build_track, PoseTrack};
use crate::timing::{self, MotionState, OutputPlan, TameAnnotation};

/// クリップ1本の解析結果一式
#[derive(Debug, Clone)]
pub struct ClipAnalysis {
    pub track: PoseTrack,
    pub mi: MiStream,
    /// 最小継続時間適用後の最終状態列
    pub states: Vec<MotionState>,
    pub annotation: TameAnnotation,
    pub plan: OutputPlan,
    /// Δt（秒）
    pub frame_interval: f64,
}

/// 検出結果列を解析して状態列と出力計画を得る
///
/// 全パスを左から右へ順に適用する:
/// 特徴量 → 正規化 → MI集約 → 平滑化 → ヒステリシス分類 →
/// 最小継続時間 → タメ/ツメ注釈 → フレーム選択。
pub fn analyze_poses(
    detections: &[Option<Pose>],
    fps: f64,
    config: &AnalysisConfig,
) -> Result<ClipAnalysis> {
    config.validate()?;
    if !(fps.is_finite() && fps > 0.0) {
        return Err(AnalysisError::Config(format!("fps must be positive (got {})", fps)));
    }
    if detections.len() < 3 {
        return Err(AnalysisError::ShortClip(detections.len()));
    }

    let frame_interval = 1.0 / fps;
    let track = build_track(detections, config.min_valid_keypoints)?;

    let raw = motion::compute_features(&track.frames, frame_interval as f32, config.min_valid_keypoints);
    let normalized = motion::normalize_features(&raw);
    let (raw_mi, contributions) = motion::aggregate(&normalized, &config.motion_weights);
    let smoothed = motion::smooth(&raw_mi, config);

    let classifier = timing::HysteresisClassifier::from_config(config);
    let preliminary = classifier.classify(&smoothed);
    let min_frames = timing::min_dwell_frames(config.min_duration, fps);
    let states = timing::enforce_min_dwell(&preliminary, min_frames);

    let annotation = if config.enable_tame_tsume {
        timing::annotate_tame_tsume(&states, &smoothed, &normalized.acceleration, config)
    } else {
        TameAnnotation::empty(states.len())
    };

    let plan = timing::build_plan(&states, &annotation);
    debug_assert_eq!(plan.len(), states.len());

    info!(
        frames = states.len(),
        min_dwell = min_frames,
        tsume_onsets = annotation.tsume_onsets.len(),
        transient_failures = track.transient_failures,
        "clip analysis complete"
    );

    Ok(ClipAnalysis {
        track,
        mi: MiStream {
            raw: raw_mi,
            smoothed,
            contributions,
        },
        states,
        annotation,
        plan,
        frame_interval,
    })
}

#[cfg(feature = "video")]
pub use video_pipeline::{process_clip, ProcessOptions, ProcessOutcome};

#[cfg(feature = "video")]
mod video_pipeline {
    use std::path::PathBuf;

    use tracing::{info, warn};

    use super::*;
    use crate::pose::detector::PoseEstimator;
    use crate::report::{assemble_result, AnalysisResult};
    use crate::store::AnalysisStore;
    use crate::video::{write_retimed_video, VideoReader};

    pub struct ProcessOptions {
        pub input: PathBuf,
        pub output: PathBuf,
        pub config: AnalysisConfig,
    }

    pub struct ProcessOutcome {
        pub database_id: u64,
        pub result: AnalysisResult,
        pub analysis: ClipAnalysis,
    }

    /// 動画1本を解析し、再タイミング動画と解析ドキュメントを書き出す
    ///
    /// 出力は全パス完了後にのみ書かれる。1フレームの検出失敗は回復し、
    /// サマリに計上する。
    pub fn process_clip(
        options: &ProcessOptions,
        estimator: &mut dyn PoseEstimator,
        store: &mut dyn AnalysisStore,
    ) -> Result<ProcessOutcome> {
        options.config.validate()?;

        let mut reader = VideoReader::open(&options.input)?;
        let fps = reader.fps();
        let (width, height) = reader.resolution();
        info!(
            input = %options.input.display(),
            fps,
            width,
            height,
            "decoding and extracting poses"
        );

        let mut detections: Vec<Option<Pose>> = Vec::new();
        while let Some(frame) = reader.next_frame()? {
            match estimator.detect(&frame) {
                Ok(pose) => detections.push(Some(pose)),
                Err(e) => {
                    warn!(frame = detections.len(), error = %e, "pose detection failed");
                    detections.push(None);
                }
            }
        }

        if detections.len() < 3 {
            return Err(AnalysisError::ShortClip(detections.len()));
        }
        reader.validate_frame_rate()?;

        let analysis = analyze_poses(&detections, fps, &options.config)?;

        write_retimed_video(&options.input, &options.output, &analysis.plan, fps)?;

        let result = assemble_result(
            &options.input.to_string_lossy(),
            &options.output.to_string_lossy(),
            &options.config,
            &analysis.track,
            &analysis.mi,
            &analysis.states,
            analysis.frame_interval,
        );
        let database_id = store.insert(&result)?;

        info!(
            output = %options.output.display(),
            database_id,
            frames = detections.len(),
            transient_failures = analysis.track.transient_failures,
            "re-timed video written"
        );

        Ok(ProcessOutcome {
            database_id,
            result: AnalysisResult {
                id: Some(database_id),
                ..result
            },
            analysis,
        })
    }
}
