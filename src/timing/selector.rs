use super::state::{runs, MotionState};
use super::tame::TameAnnotation;

/// 出力フレーム計画
///
/// 出力位置 i に置く元フレームのインデックス列。長さは入力と同じで、
/// インデックスは単調非減少。繰り返しはコマ打ちのホールドを表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    pub indices: Vec<usize>,
}

impl OutputPlan {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// 最終状態列から出力計画を組み立てる
///
/// - HIGH区間: 2コマ打ち（ストライド2、各原画2回）
/// - MID区間: 3コマ打ち（ストライド3、各原画3回）
/// - LOW区間: 全コマそのまま（タメ保全済み区間も同一挙動）
///
/// 区間末尾の端数は最後の原画をホールドして埋める。
pub fn build_plan(states: &[MotionState], annotation: &TameAnnotation) -> OutputPlan {
    let mut indices = Vec::with_capacity(states.len());

    for run in runs(states) {
        let stride = match run.state {
            MotionState::Low => 1,
            MotionState::High => 2,
            MotionState::Mid => 3,
        };
        for offset in 0..run.len {
            let frame = run.start + offset;
            if run.state == MotionState::Low {
                // タメ保全フレームはLOW区間にのみ付き、LOWは常に全コマ保持
                indices.push(frame);
            } else {
                debug_assert!(
                    annotation.preserved.is_empty() || !annotation.preserved[frame],
                    "preserved frame {} outside a LOW run",
                    frame
                );
                indices.push(run.start + stride * (offset / stride));
            }
        }
    }

    OutputPlan { indices }
}
