//! Geomorphic classification
//!
//! Cell-wise classifiers combining curvature, slope and the channel network:
//! - Topographic classes: 9 curvature classes from profile and planform
//!   curvature, folded into convex / planar / concave
//! - Geomorphic classes: the 9 curvature classes plus channel and ravine

mod classifier;
mod topographic;

pub use classifier::{geomorphic_classes, GeomorphicClasses, GeomorphicClassifier, GeomorphicParams};
pub use topographic::{topographic_classes, TopographicClasses, TopographicParams};

/// Class codes
pub mod class {
    // Curvature classes: profile curvature first, planform second
    pub const CONVEX_CONVEX: f64 = 10.0;
    pub const CONVEX_PLANAR: f64 = 20.0;
    pub const CONVEX_CONCAVE: f64 = 30.0;
    pub const PLANAR_CONVEX: f64 = 40.0;
    pub const PLANAR_PLANAR: f64 = 50.0;
    pub const PLANAR_CONCAVE: f64 = 60.0;
    pub const CONCAVE_CONVEX: f64 = 70.0;
    pub const CONCAVE_PLANAR: f64 = 80.0;
    pub const CONCAVE_CONCAVE: f64 = 90.0;

    pub const CHANNEL: f64 = 100.0;
    pub const RAVINE: f64 = 110.0;

    // Aggregated
    pub const CONVEX: f64 = 15.0;
    pub const PLANAR: f64 = 25.0;
    pub const CONCAVE: f64 = 35.0;
}

/// Fold a class code into its aggregated class.
///
/// Channel and ravine map to themselves; anything that is not a class code
/// gives `None`.
pub fn aggregate(code: f64) -> Option<f64> {
    use crate::geomorphology::class::*;

    if code == CONVEX_CONVEX || code == CONVEX_PLANAR || code == PLANAR_CONVEX {
        Some(CONVEX)
    } else if code == CONVEX_CONCAVE || code == PLANAR_PLANAR || code == CONCAVE_CONVEX {
        Some(PLANAR)
    } else if code == PLANAR_CONCAVE || code == CONCAVE_PLANAR || code == CONCAVE_CONCAVE {
        Some(CONCAVE)
    } else if code == CHANNEL || code == RAVINE {
        Some(code)
    } else {
        None
    }
}
