use super::state::MotionState;
use crate::config::AnalysisConfig;

/// MI̅がτ_Hを下から越えたとみなす遡り幅（フレーム）
pub const TSUME_RISE_WINDOW: usize = 2;

/// タメ/ツメ注釈
///
/// 状態ラベル自体は変更しない。preserved が立ったフレームは
/// FrameSelector がそのまま出力することを保証する（LOW区間のみ）。
#[derive(Debug, Clone)]
pub struct TameAnnotation {
    /// タメとして保全するフレーム
    pub preserved: Vec<bool>,
    /// 検出されたツメ開始フレーム
    pub tsume_onsets: Vec<usize>,
}

impl TameAnnotation {
    pub fn empty(len: usize) -> Self {
        Self {
            preserved: vec![false; len],
            tsume_onsets: Vec::new(),
        }
    }
}

/// ツメ開始点を検出し、直前のタメ（LOW区間）を保全対象として注釈する
///
/// ツメ開始の条件（いずれか）:
/// - MI̅ が直近 `TSUME_RISE_WINDOW` フレーム以内に τ_H を下から上に越えた
/// - 正規化加速度が `tsume_accel_threshold` 以上で、直前状態が LOW/MID
///
/// 各開始点から `tame_extension_frames` だけ遡り、LOWフレームが見つかれば
/// そのLOW区間全体（区間先頭まで）を保全対象にする。
pub fn annotate_tame_tsume(
    states: &[MotionState],
    smoothed: &[f32],
    norm_accel: &[f32],
    config: &AnalysisConfig,
) -> TameAnnotation {
    let n = states.len();
    let mut annotation = TameAnnotation::empty(n);
    if n == 0 {
        return annotation;
    }

    let high = config.threshold_high;

    for t in 1..n {
        let rise = smoothed[t] >= high
            && (t.saturating_sub(TSUME_RISE_WINDOW)..t).any(|j| smoothed[j] < high);
        let spike = norm_accel[t] >= config.tsume_accel_threshold
            && matches!(states[t - 1], MotionState::Low | MotionState::Mid);
        if !(rise || spike) {
            continue;
        }
        annotation.tsume_onsets.push(t);

        // 遡り窓内にLOWフレームがあれば、その区間を先頭まで保全
        let window_start = t.saturating_sub(config.tame_extension_frames);
        for j in (window_start..t).rev() {
            if states[j] != MotionState::Low {
                continue;
            }
            let mut run_start = j;
            while run_start > 0 && states[run_start - 1] == MotionState::Low {
                run_start -= 1;
            }
            let mut run_end = j + 1;
            while run_end < n && states[run_end] == MotionState::Low {
                run_end += 1;
            }
            for flag in &mut annotation.preserved[run_start..run_end] {
                *flag = true;
            }
            break;
        }
    }

    annotation
}

#[cfg(test)]
mod tests {
    use super::*;
    use MotionState::*;

    fn config() -> AnalysisConfig {
        AnalysisConfig::default()
    }

    #[test]
    fn test_rise_onset_preserves_preceding_low_run() {
        // LOW×10 → HIGH×5, MI̅ が t=10 で 0.60 を越える
        let states = [vec![Low; 10], vec![High; 5]].concat();
        let smoothed = [vec![0.10; 10], vec![0.80; 5]].concat();
        let accel = vec![0.0; 15];

        let ann = annotate_tame_tsume(&states, &smoothed, &accel, &config());
        // t=10 と、窓内に t=9 の低値が残る t=11 が開始点になる
        assert_eq!(ann.tsume_onsets, vec![10, 11]);
        // LOW区間全体（0..10）が保全される
        for t in 0..10 {
            assert!(ann.preserved[t], "frame {} must be preserved", t);
        }
        for t in 10..15 {
            assert!(!ann.preserved[t]);
        }
    }

    #[test]
    fn test_accel_spike_onset() {
        let states = [vec![Low; 5], vec![Mid; 5]].concat();
        let smoothed = vec![0.3; 10];
        let mut accel = vec![0.0; 10];
        accel[5] = 0.9;

        let ann = annotate_tame_tsume(&states, &smoothed, &accel, &config());
        assert_eq!(ann.tsume_onsets, vec![5]);
        // 遡り窓内 (2,3,4) はLOW → 区間先頭 0 まで保全
        for t in 0..5 {
            assert!(ann.preserved[t]);
        }
    }

    #[test]
    fn test_no_low_in_window_preserves_nothing() {
        // MID×6 → HIGH×4: 遡り窓(デフォルト3)にLOWが無い
        let states = [vec![Mid; 6], vec![High; 4]].concat();
        let smoothed = [vec![0.5; 6], vec![0.8; 4]].concat();
        let accel = vec![0.0; 10];

        let ann = annotate_tame_tsume(&states, &smoothed, &accel, &config());
        assert_eq!(ann.tsume_onsets, vec![6, 7]);
        assert!(ann.preserved.iter().all(|&p| !p));
    }

    #[test]
    fn test_rise_onsets_limited_to_window() {
        // 一度越えたら、窓から下側の値が消えるまでが1回の開始
        let states = [vec![Low; 4], vec![High; 6]].concat();
        let smoothed = [vec![0.1; 4], vec![0.9; 6]].concat();
        let accel = vec![0.0; 10];

        let ann = annotate_tame_tsume(&states, &smoothed, &accel, &config());
        // t=4 (0.1→0.9) と t=5 (窓内に t=3 の 0.1 が残る) のみ
        assert_eq!(ann.tsume_onsets, vec![4, 5]);
    }

    #[test]
    fn test_annotation_never_changes_states() {
        let states = [vec![Low; 10], vec![High; 5]].concat();
        let before = states.clone();
        let smoothed = [vec![0.10; 10], vec![0.80; 5]].concat();
        let accel = vec![0.0; 15];
        let _ = annotate_tame_tsume(&states, &smoothed, &accel, &config());
        assert_eq!(states, before);
    }

    #[test]
    fn test_empty_input() {
        let ann = annotate_tame_tsume(&[], &[], &[], &config());
        assert!(ann.preserved.is_empty());
        assert!(ann.tsume_onsets.is_empty());
    }
}
