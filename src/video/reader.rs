use std::path::Path;

use opencv::core::Mat;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoCaptureAPIs};

use crate::error::{AnalysisError, Result};

/// 宣言fpsと実測fpsの許容ずれ（1%）
pub const FPS_TOLERANCE: f64 = 0.01;

/// OpenCVを使用した動画リーダー
///
/// フレームを順に返し、ストリーム位置から実測fpsの検証材料を集める。
pub struct VideoReader {
    capture: VideoCapture,
    fps: f64,
    width: i32,
    height: i32,
    frames_read: usize,
    first_pos_ms: Option<f64>,
    last_pos_ms: f64,
}

impl VideoReader {
    /// 動画ファイルを開く
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::InputNotFound(path.display().to_string()));
        }

        let path_str = path.to_string_lossy();
        let capture = VideoCapture::from_file(&path_str, VideoCaptureAPIs::CAP_ANY as i32)
            .map_err(|e| AnalysisError::InputUnreadable(format!("{}: {}", path_str, e)))?;
        let opened = capture
            .is_opened()
            .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))?;
        if !opened {
            return Err(AnalysisError::InputUnreadable(path.display().to_string()));
        }

        let fps = capture
            .get(videoio::CAP_PROP_FPS)
            .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))?;
        if !(fps.is_finite() && fps > 0.0) {
            return Err(AnalysisError::InputUnreadable(format!(
                "{}: declared fps is {}",
                path_str, fps
            )));
        }

        let width = capture
            .get(videoio::CAP_PROP_FRAME_WIDTH)
            .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))? as i32;
        let height = capture
            .get(videoio::CAP_PROP_FRAME_HEIGHT)
            .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))? as i32;

        Ok(Self {
            capture,
            fps,
            width,
            height,
            frames_read: 0,
            first_pos_ms: None,
            last_pos_ms: 0.0,
        })
    }

    /// 宣言フレームレート
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// フレーム間隔Δt（秒）
    pub fn frame_interval(&self) -> f64 {
        1.0 / self.fps
    }

    pub fn resolution(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn frames_read(&self) -> usize {
        self.frames_read
    }

    /// 次のフレームを読む（BGR形式）。ストリーム終端でNone
    pub fn next_frame(&mut self) -> Result<Option<Mat>> {
        // 位置はデコード前に取得する（read後は次フレームを指す）
        let pos_ms = self
            .capture
            .get(videoio::CAP_PROP_POS_MSEC)
            .unwrap_or(f64::NAN);

        let mut frame = Mat::default();
        let got = self
            .capture
            .read(&mut frame)
            .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))?;
        if !got || frame.empty() {
            return Ok(None);
        }

        if pos_ms.is_finite() {
            if self.first_pos_ms.is_none() {
                self.first_pos_ms = Some(pos_ms);
            }
            self.last_pos_ms = pos_ms;
        }
        self.frames_read += 1;
        Ok(Some(frame))
    }

    /// 読み終えたストリームの実測fpsを宣言値と突き合わせる
    ///
    /// 1%超のずれは可変フレームレートとして拒否する。
    pub fn validate_frame_rate(&self) -> Result<()> {
        let Some(first_ms) = self.first_pos_ms else {
            return Ok(());
        };
        validate_frame_rate(self.fps, first_ms, self.last_pos_ms, self.frames_read)
    }
}

/// 実測fps = (n−1) / 位置スパン。検証可能な情報が無ければ通す
pub fn validate_frame_rate(declared: f64, first_ms: f64, last_ms: f64, frames: usize) -> Result<()> {
    if frames < 2 {
        return Ok(());
    }
    let span_s = (last_ms - first_ms) / 1000.0;
    if !(span_s.is_finite() && span_s > 0.0) {
        return Ok(());
    }
    let measured = (frames as f64 - 1.0) / span_s;
    if ((measured - declared) / declared).abs() > FPS_TOLERANCE {
        return Err(AnalysisError::VariableFrameRate { declared, measured });
    }
    Ok(())
}
