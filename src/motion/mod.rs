pub mod features;
pub mod intensity;
pub mod normalize;
pub mod smooth;

pub use features::{compute_features, FeatureColumns, EPSILON};
pub use intensity::{aggregate, MiBreakdown, MiStream};
pub use normalize::{min_max_normalize, normalize_features};
pub use smooth::{smooth, smooth_ema, smooth_window};
