// Ancestor walks used while locating student cards and course rows.
pub const DEFAULT_CONTAINER_DEPTH: usize = 12;
pub const DEFAULT_ROW_DEPTH: usize = 6;

// Course names outside this window are boilerplate or noise.
pub const MIN_COURSE_NAME_LEN: usize = 3;
pub const MAX_COURSE_NAME_LEN: usize = 120;

// Heatmap window used when no check-in carries a usable date.
pub const EMPTY_HEATMAP_DAYS: i64 = 14;

// Largest gap between check-ins that still continues a streak.
pub const STREAK_GAP_HOURS: i64 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Levels to climb from a student anchor to its card container.
    pub container_depth: usize,
    /// Levels to climb from a progress bar to its course row.
    pub row_depth: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            container_depth: DEFAULT_CONTAINER_DEPTH,
            row_depth: DEFAULT_ROW_DEPTH,
        }
    }
}
