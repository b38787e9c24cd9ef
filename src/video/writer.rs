use std::path::{Path, PathBuf};

use opencv::core::{Mat, Size};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, VideoCaptureAPIs, VideoWriter};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::timing::OutputPlan;

/// 出力計画に従って再タイミングした動画を書き出す
///
/// 計画のインデックスは単調非減少なので、元動画をもう一度先頭から
/// 読み進めるだけで全フレームに到達できる。出力は一時ファイルに
/// 書いてからrenameする（途中失敗で壊れた動画を残さない）。
pub fn write_retimed_video<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    destination: Q,
    plan: &OutputPlan,
    fps: f64,
) -> Result<()> {
    let destination = destination.as_ref();
    let temp_path = temp_path_for(destination);

    let result = write_to_path(source.as_ref(), &temp_path, plan, fps);
    if let Err(e) = result {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    std::fs::rename(&temp_path, destination).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        AnalysisError::OutputWrite(format!("rename to {}: {}", destination.display(), e))
    })
}

/// 同一ディレクトリ内の一時ファイルパス（renameがatomicになる）
fn temp_path_for(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    destination.with_file_name(format!(".{}.tmp", file_name))
}

fn write_to_path(source: &Path, temp_path: &Path, plan: &OutputPlan, fps: f64) -> Result<()> {
    let source_str = source.to_string_lossy();
    let mut capture = VideoCapture::from_file(&source_str, VideoCaptureAPIs::CAP_ANY as i32)
        .map_err(|e| AnalysisError::InputUnreadable(format!("{}: {}", source_str, e)))?;

    let width = capture
        .get(videoio::CAP_PROP_FRAME_WIDTH)
        .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))? as i32;
    let height = capture
        .get(videoio::CAP_PROP_FRAME_HEIGHT)
        .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))? as i32;

    let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')
        .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;
    let mut writer = VideoWriter::new(
        &temp_path.to_string_lossy(),
        fourcc,
        fps,
        Size::new(width, height),
        true,
    )
    .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;
    let opened = writer
        .is_opened()
        .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;
    if !opened {
        return Err(AnalysisError::OutputWrite(format!(
            "could not open video writer for {}",
            temp_path.display()
        )));
    }

    // 現在保持しているフレームと、そのインデックス
    let mut current = Mat::default();
    let mut current_index: Option<usize> = None;

    for &target in &plan.indices {
        while current_index.map_or(true, |i| i < target) {
            let mut frame = Mat::default();
            let got = capture
                .read(&mut frame)
                .map_err(|e| AnalysisError::InputUnreadable(e.to_string()))?;
            if !got || frame.empty() {
                return Err(AnalysisError::OutputWrite(format!(
                    "source ended before frame {}",
                    target
                )));
            }
            current = frame;
            current_index = Some(current_index.map_or(0, |i| i + 1));
        }
        writer
            .write(&current)
            .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;
    }

    writer
        .release()
        .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;
    debug!(frames = plan.indices.len(), path = %temp_path.display(), "wrote re-timed video");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_in_same_directory() {
        let temp = temp_path_for(Path::new("/tmp/out/clip.mp4"));
        assert_eq!(temp.parent(), Some(Path::new("/tmp/out")));
        assert_eq!(temp.file_name().unwrap().to_string_lossy(), ".clip.mp4.tmp");
    }
}
