use crate::pose::keypoint::{KeypointIndex, DEFAULT_CONFIDENCE, JOINT_TRIPLES};
use crate::pose::track::FramePose;

/// ゼロ除算ガード
pub const EPSILON: f32 = 1e-8;

/// フレームごとの生特徴量（列指向）
///
/// D: 正規化変位, V: 速度, A: 加速度(絶対値), Θ: 方向転換, P: ポーズ変化。
/// すべて長さT。t=0は全て0、Aは t<2 で0。
#[derive(Debug, Clone)]
pub struct FeatureColumns {
    pub displacement: Vec<f32>,
    pub velocity: Vec<f32>,
    pub acceleration: Vec<f32>,
    pub direction_change: Vec<f32>,
    pub pose_change: Vec<f32>,
    /// 共通有効点数が最小値を満たしたか
    pub valid: Vec<bool>,
}

impl FeatureColumns {
    pub fn len(&self) -> usize {
        self.displacement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.displacement.is_empty()
    }
}

/// 三点 a-b-c の b における関節角（ラジアン, 0..π）
fn joint_angle(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let u = (a.0 - b.0, a.1 - b.1);
    let v = (c.0 - b.0, c.1 - b.1);
    let dot = u.0 * v.0 + u.1 * v.1;
    let norm = (u.0 * u.0 + u.1 * u.1).sqrt() * (v.0 * v.0 + v.1 * v.1).sqrt();
    (dot / (norm + EPSILON)).clamp(-1.0, 1.0).acos()
}

/// 連続する姿勢から特徴量列を計算する
///
/// 両フレームで有効な点のみが寄与する。寄与点数が
/// `min_valid_keypoints` 未満の特徴量は0になり、validフラグが落ちる。
pub fn compute_features(track: &[FramePose], dt: f32, min_valid_keypoints: usize) -> FeatureColumns {
    let n = track.len();
    let mut out = FeatureColumns {
        displacement: vec![0.0; n],
        velocity: vec![0.0; n],
        acceleration: vec![0.0; n],
        direction_change: vec![0.0; n],
        pose_change: vec![0.0; n],
        valid: vec![false; n],
    };

    // 前フレームの点ごとの速度と変位ベクトル（Aとθの算出に持ち越す）
    let mut prev_vel: [Option<f32>; KeypointIndex::COUNT] = [None; KeypointIndex::COUNT];
    let mut prev_disp: [Option<(f32, f32)>; KeypointIndex::COUNT] = [None; KeypointIndex::COUNT];

    for t in 1..n {
        let cur = &track[t];
        let prev = &track[t - 1];

        let mut cur_vel: [Option<f32>; KeypointIndex::COUNT] = [None; KeypointIndex::COUNT];
        let mut cur_disp: [Option<(f32, f32)>; KeypointIndex::COUNT] = [None; KeypointIndex::COUNT];

        if cur.valid && prev.valid && cur.scale > EPSILON && dt > 0.0 {
            let mut d_sum = 0.0f32;
            let mut d_count = 0usize;

            for i in 0..KeypointIndex::COUNT {
                let kp_cur = &cur.pose.keypoints[i];
                let kp_prev = &prev.pose.keypoints[i];
                if !kp_cur.is_valid(DEFAULT_CONFIDENCE) || !kp_prev.is_valid(DEFAULT_CONFIDENCE) {
                    continue;
                }
                let dx = kp_cur.x - kp_prev.x;
                let dy = kp_cur.y - kp_prev.y;
                let d = (dx * dx + dy * dy).sqrt() / cur.scale;
                cur_disp[i] = Some((dx, dy));
                cur_vel[i] = Some(d / dt);
                d_sum += d;
                d_count += 1;
            }

            if d_count >= min_valid_keypoints {
                out.displacement[t] = d_sum / d_count as f32;
                out.velocity[t] = out.displacement[t] / dt;
                out.valid[t] = true;
            }

            // 加速度: 両ステップで速度が定義された点のみ（t>=2で初めて非ゼロ）
            let mut a_sum = 0.0f32;
            let mut a_count = 0usize;
            for i in 0..KeypointIndex::COUNT {
                if let (Some(v), Some(pv)) = (cur_vel[i], prev_vel[i]) {
                    a_sum += ((v - pv) / dt).abs();
                    a_count += 1;
                }
            }
            if a_count >= min_valid_keypoints {
                out.acceleration[t] = a_sum / a_count as f32;
            }

            // 方向転換: 連続2ステップの変位ベクトルの成す角
            let mut theta_sum = 0.0f32;
            let mut theta_count = 0usize;
            for i in 0..KeypointIndex::COUNT {
                if let (Some(u), Some(pu)) = (cur_disp[i], prev_disp[i]) {
                    let norm = (u.0 * u.0 + u.1 * u.1).sqrt() * (pu.0 * pu.0 + pu.1 * pu.1).sqrt();
                    // 静止点（ゼロベクトル）は方向転換なしとして数える
                    if norm > EPSILON {
                        let dot = u.0 * pu.0 + u.1 * pu.1;
                        let angle = (dot / (norm + EPSILON)).clamp(-1.0, 1.0).acos();
                        theta_sum += angle / std::f32::consts::PI;
                    }
                    theta_count += 1;
                }
            }
            if theta_count >= min_valid_keypoints {
                out.direction_change[t] = theta_sum / theta_count as f32;
            }

            // ポーズ変化: 関節角の変化量の平均
            let mut p_sum = 0.0f32;
            let mut p_count = 0usize;
            for (a, b, c) in JOINT_TRIPLES {
                let ok = [a, b, c].iter().all(|&idx| {
                    cur.pose.get(idx).is_valid(DEFAULT_CONFIDENCE)
                        && prev.pose.get(idx).is_valid(DEFAULT_CONFIDENCE)
                });
                if !ok {
                    continue;
                }
                let angle_cur = joint_angle(
                    point_of(cur, a),
                    point_of(cur, b),
                    point_of(cur, c),
                );
                let angle_prev = joint_angle(
                    point_of(prev, a),
                    point_of(prev, b),
                    point_of(prev, c),
                );
                p_sum += (angle_cur - angle_prev).abs() / std::f32::consts::PI;
                p_count += 1;
            }
            if p_count > 0 {
                out.pose_change[t] = p_sum / p_count as f32;
            }
        }

        prev_vel = cur_vel;
        prev_disp = cur_disp;
    }

    out
}

fn point_of(frame: &FramePose, idx: KeypointIndex) -> (f32, f32) {
    let kp = frame.pose.get(idx);
    (kp.x, kp.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::keypoint::{Keypoint, Pose};
    use crate::pose::track::build_track;

    const DT: f32 = 1.0 / 30.0;

    /// 全17点が格子状に並んだポーズを (ox, oy) だけ平行移動
    fn grid_pose(ox: f32, oy: f32) -> Pose {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for i in 0..KeypointIndex::COUNT {
            let gx = (i % 4) as f32 * 40.0;
            let gy = (i / 4) as f32 * 40.0;
            keypoints[i] = Keypoint::new(ox + gx, oy + gy, 0.9);
        }
        Pose::new(keypoints)
    }

    fn track_of(offsets: &[(f32, f32)]) -> Vec<FramePose> {
        let detections: Vec<Option<Pose>> =
            offsets.iter().map(|&(x, y)| Some(grid_pose(x, y))).collect();
        build_track(&detections, 5).unwrap().frames
    }

    #[test]
    fn test_first_frame_is_all_zero() {
        let track = track_of(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let f = compute_features(&track, DT, 5);
        assert_eq!(f.displacement[0], 0.0);
        assert_eq!(f.velocity[0], 0.0);
        assert_eq!(f.acceleration[0], 0.0);
        assert_eq!(f.direction_change[0], 0.0);
        assert_eq!(f.pose_change[0], 0.0);
        assert!(!f.valid[0]);
    }

    #[test]
    fn test_uniform_translation_displacement() {
        let track = track_of(&[(0.0, 0.0), (3.0, 4.0)]);
        let f = compute_features(&track, DT, 5);
        // 全点が距離5移動。スケールはbbox対角
        let scale = track[1].scale;
        let expected = 5.0 / scale;
        assert!((f.displacement[1] - expected).abs() < 1e-5);
        assert!((f.velocity[1] - expected / DT).abs() < 1e-3);
        assert!(f.valid[1]);
    }

    #[test]
    fn test_acceleration_zero_until_t2_and_for_constant_velocity() {
        let track = track_of(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
        let f = compute_features(&track, DT, 5);
        // t=1: 前ステップの速度が無いので0
        assert_eq!(f.acceleration[1], 0.0);
        // 等速なのでその後も0
        assert!(f.acceleration[2].abs() < 1e-4);
        assert!(f.acceleration[3].abs() < 1e-4);
    }

    #[test]
    fn test_acceleration_on_speed_change() {
        let track = track_of(&[(0.0, 0.0), (10.0, 0.0), (40.0, 0.0)]);
        let f = compute_features(&track, DT, 5);
        let scale1 = track[1].scale;
        let scale2 = track[2].scale;
        let v1 = (10.0 / scale1) / DT;
        let v2 = (30.0 / scale2) / DT;
        let expected = (v2 - v1).abs() / DT;
        assert!((f.acceleration[2] - expected).abs() / expected < 1e-3);
    }

    #[test]
    fn test_direction_reversal() {
        let track = track_of(&[(0.0, 0.0), (10.0, 0.0), (0.0, 0.0)]);
        let f = compute_features(&track, DT, 5);
        // 真逆方向: θ/π ≈ 1
        assert!(f.direction_change[2] > 0.99);
        // 直進時は0
        let straight = track_of(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
        let fs = compute_features(&straight, DT, 5);
        assert!(fs.direction_change[2] < 1e-3);
    }

    #[test]
    fn test_rigid_translation_has_zero_pose_change() {
        let track = track_of(&[(0.0, 0.0), (25.0, 13.0)]);
        let f = compute_features(&track, DT, 5);
        // 平行移動では関節角は変わらない
        assert!(f.pose_change[1] < 1e-4);
    }

    #[test]
    fn test_joint_bend_produces_pose_change() {
        let base = grid_pose(0.0, 0.0);
        let mut bent = grid_pose(0.0, 0.0);
        // 左手首だけ大きく動かして肘角を変える
        let wrist = KeypointIndex::LeftWrist as usize;
        bent.keypoints[wrist].x += 80.0;
        bent.keypoints[wrist].y -= 60.0;

        let detections = vec![Some(base), Some(bent)];
        let track = build_track(&detections, 5).unwrap().frames;
        let f = compute_features(&track, DT, 5);
        assert!(f.pose_change[1] > 0.0);
        assert!(f.pose_change[1] <= 1.0);
    }

    #[test]
    fn test_invalid_frame_zeroes_features() {
        let detections = vec![
            Some(grid_pose(0.0, 0.0)),
            None,
            Some(grid_pose(20.0, 0.0)),
        ];
        let track = build_track(&detections, 5).unwrap().frames;
        let f = compute_features(&track, DT, 5);
        // 無効フレームとその直後は共通有効点が無い
        assert_eq!(f.displacement[1], 0.0);
        assert!(!f.valid[1]);
        assert_eq!(f.displacement[2], 0.0);
        assert!(!f.valid[2]);
    }

    #[test]
    fn test_joint_angle_right_angle() {
        let angle = joint_angle((1.0, 0.0), (0.0, 0.0), (0.0, 1.0));
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_joint_angle_straight() {
        let angle = joint_angle((-1.0, 0.0), (0.0, 0.0), (1.0, 0.0));
        assert!((angle - std::f32::consts::PI).abs() < 1e-3);
    }
}
