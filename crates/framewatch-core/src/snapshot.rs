use framewatch_detect::Reading;

/// One reading of playback state, taken at `observed_at` (milliseconds).
///
/// Built fresh on every tick and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoSnapshot {
    pub exists: bool,
    pub duration: Option<f64>,
    pub current_time: Option<f64>,
    pub paused: Option<bool>,
    pub observed_at: u64,
}

impl VideoSnapshot {
    /// "No video here."
    pub fn empty(observed_at: u64) -> Self {
        Self {
            exists: false,
            duration: None,
            current_time: None,
            paused: None,
            observed_at,
        }
    }

    pub fn from_reading(reading: Reading, observed_at: u64) -> Self {
        Self {
            exists: true,
            duration: Some(reading.duration),
            current_time: Some(reading.position),
            paused: Some(reading.paused),
            observed_at,
        }
    }
}
