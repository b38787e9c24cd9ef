use anyhow::{Context, Result};
use opencv::core::Mat;
use opencv::prelude::*;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;

use super::keypoint::{Keypoint, KeypointIndex, Pose};
use super::preprocess::{preprocess_for_movenet, unletterbox_pose};

/// フレームから姿勢を推定する検出器の共通インターフェース
///
/// 座標系は「ピクセル (x, y)」のみを仮定する。実装はONNXモデルでも
/// リモートサービスでもよい。1フレームの失敗はエラーとして返し、
/// 呼び出し側が一時的失敗として回復する。
pub trait PoseEstimator {
    fn detect(&mut self, frame: &Mat) -> Result<Pose>;
}

/// MoveNet (ONNX) を使用した姿勢推定器
pub struct MoveNetEstimator {
    session: Session,
}

impl MoveNetEstimator {
    /// ONNXモデルを読み込んで初期化
    pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path.as_ref())
            .context("Failed to load ONNX model")?;

        Ok(Self { session })
    }
}

impl PoseEstimator for MoveNetEstimator {
    /// 1フレームの姿勢を検出（ピクセル座標）
    ///
    /// 入力: BGRフレーム
    /// 出力: Pose (17キーポイント)
    fn detect(&mut self, frame: &Mat) -> Result<Pose> {
        let frame_w = frame.cols() as f32;
        let frame_h = frame.rows() as f32;

        let (input, letterbox) = preprocess_for_movenet(frame)?;
        let input_tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .context("Inference failed")?;

        // MoveNet の出力は [1, 1, 17, 3] (y, x, confidence)、入力に対する正規化座標
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .context("Failed to extract output tensor")?;

        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for i in 0..KeypointIndex::COUNT {
            let y = output[[0, 0, i, 0]];
            let x = output[[0, 0, i, 1]];
            let confidence = output[[0, 0, i, 2]];
            keypoints[i] = Keypoint::new(x, y, confidence);
        }

        // レターボックスを外してからピクセル座標へ
        let normalized = unletterbox_pose(&Pose::new(keypoints), &letterbox);
        let mut pixels = [Keypoint::default(); KeypointIndex::COUNT];
        for i in 0..KeypointIndex::COUNT {
            let kp = &normalized.keypoints[i];
            pixels[i] = Keypoint::new(kp.x * frame_w, kp.y * frame_h, kp.confidence);
        }

        Ok(Pose::new(pixels))
    }
}
