use serde::{Deserialize, Serialize};

/// 3状態のモーション分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MotionState {
    Low,
    Mid,
    High,
}

impl MotionState {
    /// 1枚の原画を何フレーム見せるか
    ///
    /// LOW: 全コマ保持（タメ）, MID: 3コマ打ち, HIGH: 2コマ打ち
    pub fn frame_hold_count(self) -> usize {
        match self {
            Self::Low => 1,
            Self::Mid => 3,
            Self::High => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Mid => "MID",
            Self::High => "HIGH",
        }
    }
}

/// 同一状態の連続区間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateRun {
    pub start: usize,
    pub len: usize,
    pub state: MotionState,
}

impl StateRun {
    /// 区間の排他的終端
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// 状態列を連続区間に分割する
pub fn runs(states: &[MotionState]) -> Vec<StateRun> {
    let mut out = Vec::new();
    let mut iter = states.iter().enumerate();
    let Some((_, &first)) = iter.next() else {
        return out;
    };
    let mut current = StateRun {
        start: 0,
        len: 1,
        state: first,
    };
    for (i, &state) in iter {
        if state == current.state {
            current.len += 1;
        } else {
            out.push(current);
            current = StateRun {
                start: i,
                len: 1,
                state,
            };
        }
    }
    out.push(current);
    out
}
