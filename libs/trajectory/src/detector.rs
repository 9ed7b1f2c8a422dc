/// Threshold classifier: an actor is stalled when its path distance
/// within the window stays below `minimum_distance` (km).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StallDetector {
    pub minimum_distance: f64,
}

impl StallDetector {
    pub fn new(minimum_distance: f64) -> Self {
        Self { minimum_distance }
    }

    /// A non-positive threshold can never be "not met", so it never stalls.
    pub fn is_stalled(&self, distance_travelled: f64) -> bool {
        self.minimum_distance > 0.0 && distance_travelled < self.minimum_distance
    }
}
