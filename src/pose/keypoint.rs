/// 17 キーポイントインデックス（COCO配列）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Nose),
            1 => Some(Self::LeftEye),
            2 => Some(Self::RightEye),
            3 => Some(Self::LeftEar),
            4 => Some(Self::RightEar),
            5 => Some(Self::LeftShoulder),
            6 => Some(Self::RightShoulder),
            7 => Some(Self::LeftElbow),
            8 => Some(Self::RightElbow),
            9 => Some(Self::LeftWrist),
            10 => Some(Self::RightWrist),
            11 => Some(Self::LeftHip),
            12 => Some(Self::RightHip),
            13 => Some(Self::LeftKnee),
            14 => Some(Self::RightKnee),
            15 => Some(Self::LeftAnkle),
            16 => Some(Self::RightAnkle),
            _ => None,
        }
    }

    /// 解析結果に書き出す名称
    pub fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

/// 関節角を測る三点組（中央点が関節）
///
/// ポーズ変化量P(t)の算出に使う。左右の肘・膝・肩・腰の8関節。
pub const JOINT_TRIPLES: [(KeypointIndex, KeypointIndex, KeypointIndex); 8] = [
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftElbow, KeypointIndex::LeftWrist),
    (KeypointIndex::RightShoulder, KeypointIndex::RightElbow, KeypointIndex::RightWrist),
    (KeypointIndex::LeftHip, KeypointIndex::LeftKnee, KeypointIndex::LeftAnkle),
    (KeypointIndex::RightHip, KeypointIndex::RightKnee, KeypointIndex::RightAnkle),
    (KeypointIndex::LeftElbow, KeypointIndex::LeftShoulder, KeypointIndex::LeftHip),
    (KeypointIndex::RightElbow, KeypointIndex::RightShoulder, KeypointIndex::RightHip),
    (KeypointIndex::LeftShoulder, KeypointIndex::LeftHip, KeypointIndex::LeftKnee),
    (KeypointIndex::RightShoulder, KeypointIndex::RightHip, KeypointIndex::RightKnee),
];

/// 有効判定のデフォルト信頼度しきい値
pub const DEFAULT_CONFIDENCE: f32 = 0.2;

/// 単一キーポイント（ピクセル座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// 信頼度スコア (0.0〜1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// 信頼度が閾値以上か
    pub fn is_valid(&self, threshold: f32) -> bool {
        self.confidence >= threshold
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: 0.0,
        }
    }
}

/// 17キーポイントからなる姿勢
#[derive(Debug, Clone)]
pub struct Pose {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl Pose {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// インデックスでキーポイントを取得
    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// 閾値以上のキーポイント数
    pub fn valid_count(&self, threshold: f32) -> usize {
        self.keypoints.iter().filter(|k| k.is_valid(threshold)).count()
    }

    /// 有効キーポイントの軸並行バウンディングボックス対角長
    ///
    /// キャラクタースケールS(t)の素。 有効点が2未満ならNone。
    pub fn bbox_diagonal(&self, threshold: f32) -> Option<f32> {
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        let mut count = 0usize;

        for kp in self.keypoints.iter().filter(|k| k.is_valid(threshold)) {
            min_x = min_x.min(kp.x);
            min_y = min_y.min(kp.y);
            max_x = max_x.max(kp.x);
            max_y = max_y.max(kp.y);
            count += 1;
        }

        if count < 2 {
            return None;
        }
        let dx = max_x - min_x;
        let dy = max_y - min_y;
        Some((dx * dx + dy * dy).sqrt())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypoint_index_count() {
        assert_eq!(KeypointIndex::COUNT, 17);
    }

    #[test]
    fn test_keypoint_index_from_index() {
        assert_eq!(KeypointIndex::from_index(0), Some(KeypointIndex::Nose));
        assert_eq!(KeypointIndex::from_index(16), Some(KeypointIndex::RightAnkle));
        assert_eq!(KeypointIndex::from_index(17), None);
    }

    #[test]
    fn test_keypoint_is_valid() {
        let kp = Keypoint::new(100.0, 50.0, 0.7);
        assert!(kp.is_valid(0.5));
        assert!(!kp.is_valid(0.8));
    }

    #[test]
    fn test_joint_triples_are_distinct() {
        for (a, b, c) in JOINT_TRIPLES {
            assert_ne!(a, b);
            assert_ne!(b, c);
            assert_ne!(a, c);
        }
    }

    #[test]
    fn test_valid_count() {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[0] = Keypoint::new(0.0, 0.0, 0.9);
        keypoints[1] = Keypoint::new(1.0, 1.0, 0.9);
        let pose = Pose::new(keypoints);
        assert_eq!(pose.valid_count(0.2), 2);
        assert_eq!(pose.valid_count(0.95), 0);
    }

    #[test]
    fn test_bbox_diagonal_3_4_5() {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[0] = Keypoint::new(0.0, 0.0, 0.9);
        keypoints[1] = Keypoint::new(3.0, 4.0, 0.9);
        let pose = Pose::new(keypoints);
        let diag = pose.bbox_diagonal(0.2).unwrap();
        assert!((diag - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_bbox_diagonal_needs_two_points() {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[0] = Keypoint::new(10.0, 10.0, 0.9);
        let pose = Pose::new(keypoints);
        assert!(pose.bbox_diagonal(0.2).is_none());
    }

    #[test]
    fn test_low_confidence_points_excluded_from_bbox() {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[0] = Keypoint::new(0.0, 0.0, 0.9);
        keypoints[1] = Keypoint::new(3.0, 4.0, 0.9);
        // 外れ値だが信頼度が低いので無視される
        keypoints[2] = Keypoint::new(10000.0, 10000.0, 0.05);
        let pose = Pose::new(keypoints);
        let diag = pose.bbox_diagonal(0.2).unwrap();
        assert!((diag - 5.0).abs() < 1e-5);
    }
}
