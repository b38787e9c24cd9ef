use anyhow::{Context, Result};
use ndarray::Array4;
use opencv::core::{Mat, Scalar, Size, BORDER_CONSTANT};
use opencv::imgproc;
use opencv::prelude::*;

use super::keypoint::{Keypoint, KeypointIndex, Pose};

/// MoveNet入力の一辺
pub const MOVENET_INPUT_SIZE: i32 = 192;

/// レターボックス情報（推論後にキーポイント座標を元の画像空間に戻すために使用）
#[derive(Debug, Clone, Copy)]
pub struct LetterboxInfo {
    /// コンテンツ領域の左端（モデル入力幅に対する正規化座標 0.0-1.0）
    pub pad_left: f32,
    /// コンテンツ領域の上端（モデル入力高さに対する正規化座標 0.0-1.0）
    pub pad_top: f32,
    /// コンテンツ幅 / モデル入力幅（0.0-1.0）
    pub content_width: f32,
    /// コンテンツ高さ / モデル入力高さ（0.0-1.0）
    pub content_height: f32,
}

impl LetterboxInfo {
    pub fn identity() -> Self {
        Self {
            pad_left: 0.0,
            pad_top: 0.0,
            content_width: 1.0,
            content_height: 1.0,
        }
    }
}

/// BGRフレームをMoveNet入力テンソル [1, 192, 192, 3] に変換
///
/// アスペクト比を維持してリサイズし、余白は黒でパディングする。
pub fn preprocess_for_movenet(frame: &Mat) -> Result<(Array4<f32>, LetterboxInfo)> {
    let src_w = frame.cols();
    let src_h = frame.rows();
    if src_w <= 0 || src_h <= 0 {
        anyhow::bail!("empty frame");
    }

    let side = MOVENET_INPUT_SIZE;
    let scale = (side as f32 / src_w as f32).min(side as f32 / src_h as f32);
    let content_w = ((src_w as f32 * scale).round() as i32).clamp(1, side);
    let content_h = ((src_h as f32 * scale).round() as i32).clamp(1, side);
    let pad_left = (side - content_w) / 2;
    let pad_top = (side - content_h) / 2;

    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        Size::new(content_w, content_h),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )
    .context("Failed to resize frame")?;

    let mut padded = Mat::default();
    opencv::core::copy_make_border(
        &resized,
        &mut padded,
        pad_top,
        side - content_h - pad_top,
        pad_left,
        side - content_w - pad_left,
        BORDER_CONSTANT,
        Scalar::all(0.0),
    )
    .context("Failed to pad frame")?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(&padded, &mut rgb, imgproc::COLOR_BGR2RGB, 0)
        .context("Failed to convert BGR to RGB")?;

    let mut input = Array4::<f32>::zeros((1, side as usize, side as usize, 3));
    for y in 0..side {
        for x in 0..side {
            let px = rgb.at_2d::<opencv::core::Vec3b>(y, x)?;
            for c in 0..3 {
                input[[0, y as usize, x as usize, c]] = px[c] as f32;
            }
        }
    }

    let info = LetterboxInfo {
        pad_left: pad_left as f32 / side as f32,
        pad_top: pad_top as f32 / side as f32,
        content_width: content_w as f32 / side as f32,
        content_height: content_h as f32 / side as f32,
    };
    Ok((input, info))
}

/// レターボックス座標のキーポイントを元画像の正規化座標に変換
pub fn unletterbox_pose(pose: &Pose, info: &LetterboxInfo) -> Pose {
    let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
    for i in 0..KeypointIndex::COUNT {
        let kp = &pose.keypoints[i];
        keypoints[i] = Keypoint {
            x: (kp.x - info.pad_left) / info.content_width,
            y: (kp.y - info.pad_top) / info.content_height,
            confidence: kp.confidence,
        };
    }
    Pose::new(keypoints)
}
