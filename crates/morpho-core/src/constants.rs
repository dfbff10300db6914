/// Parent id carried by the root record.
pub const ROOT_PARENT: i64 = -1;

/// Largest accepted coordinate magnitude. Differences and squared lengths of
/// points within this bound stay finite.
pub const MAX_COORDINATE: f64 = 1e150;

/// Numerical epsilon for near-zero comparisons
pub const EPSILON: f64 = 1e-10;

/// Auxiliary key for the precomputed relative soma depth.
pub const RELATIVE_SOMA_DEPTH: &str = "relative_soma_depth";
