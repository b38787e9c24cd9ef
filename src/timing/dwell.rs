use super::state::{runs, MotionState};

/// 最小継続時間をフレーム数の下限に変換する
///
/// ⌈min_duration / Δt⌉。fps と min_duration は検証済みの正の値。
pub fn min_dwell_frames(min_duration: f32, fps: f64) -> usize {
    (min_duration as f64 * fps).ceil() as usize
}

/// 最小継続フレーム数を満たさない区間を書き換える
///
/// 左から右へ走査し、短い区間は直前の区間の状態で上書きする。
/// 先頭の短い区間は次の区間の状態を取る。クリップ末尾の区間だけは
/// 短いまま残ることが許される。書き換えで区間が併合されるため、
/// 変化が無くなるまで走査を繰り返す（1回の書き換えごとに区間数が
/// 減るので必ず停止する）。
pub fn enforce_min_dwell(states: &[MotionState], min_frames: usize) -> Vec<MotionState> {
    let mut out = states.to_vec();
    if min_frames <= 1 || states.is_empty() {
        return out;
    }

    loop {
        let rs = runs(&out);
        let mut changed = false;
        for (i, run) in rs.iter().enumerate() {
            let is_last = i == rs.len() - 1;
            if run.len >= min_frames || is_last {
                continue;
            }
            let replacement = if run.start == 0 {
                rs[i + 1].state
            } else {
                // 直前の区間は同一走査内で書き換え済みかもしれないので out 側を見る
                out[run.start - 1]
            };
            if replacement != run.state {
                for s in &mut out[run.start..run.end()] {
                    *s = replacement;
                }
                changed = true;
            }
        }
        if !changed {
            return out;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MotionState::*;

    #[test]
    fn test_min_dwell_frames_rounds_up() {
        // 0.08s @ 30fps = 2.4 → 3
        assert_eq!(min_dwell_frames(0.08, 30.0), 3);
        assert_eq!(min_dwell_frames(0.1, 30.0), 3);
        assert_eq!(min_dwell_frames(0.1, 10.0), 1);
    }

    #[test]
    fn test_short_interior_run_takes_previous_state() {
        let states = [Low, Low, Low, High, Low, Low, Low];
        let out = enforce_min_dwell(&states, 3);
        assert_eq!(out, vec![Low; 7]);
    }

    #[test]
    fn test_long_runs_unchanged() {
        let states = [Low, Low, Low, High, High, High, Mid, Mid, Mid];
        let out = enforce_min_dwell(&states, 3);
        assert_eq!(out.as_slice(), states.as_slice());
    }

    #[test]
    fn test_short_first_run_takes_next_state() {
        let states = [High, Mid, Mid, Mid, Mid];
        let out = enforce_min_dwell(&states, 3);
        assert_eq!(out, vec![Mid; 5]);
    }

    #[test]
    fn test_final_run_may_stay_short() {
        let states = [Low, Low, Low, High];
        let out = enforce_min_dwell(&states, 3);
        assert_eq!(out.as_slice(), states.as_slice());
    }

    #[test]
    fn test_cascading_merge() {
        // 短い区間が連続しても、書き換え後の直前状態を引き継ぐ
        let states = [Low, Low, Low, High, Mid, Low, Low, Low];
        let out = enforce_min_dwell(&states, 3);
        assert_eq!(out, vec![Low; 8]);
    }

    #[test]
    fn test_head_merge_reaches_fixpoint() {
        // 先頭の書き換えが新たな短区間を作るケース
        let states = [Low, Mid, Low, Low, Low, High, Low, Mid, Mid, Mid, Mid];
        let out = enforce_min_dwell(&states, 3);
        let expected = [vec![Low; 7], vec![Mid; 4]].concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_no_op_when_min_is_one() {
        let states = [Low, High, Mid];
        let out = enforce_min_dwell(&states, 1);
        assert_eq!(out.as_slice(), states.as_slice());
    }

    #[test]
    fn test_dwell_invariant_holds() {
        let cases: Vec<Vec<MotionState>> = vec![
            vec![Low, Mid, Low, Low, Low, High, Low, Mid, Mid, Mid, Mid],
            vec![High, Low, High, Low, High, Low, High, Low],
            vec![Mid, Mid, High, High, Low, Low, Mid, Mid, High],
        ];
        let min = 3;
        for states in cases {
            let out = enforce_min_dwell(&states, min);
            let rs = runs(&out);
            for (i, run) in rs.iter().enumerate() {
                if i < rs.len() - 1 {
                    assert!(run.len >= min, "run {:?} shorter than {} in {:?}", run, min, out);
                }
            }
        }
    }
}
