pub const PROFILES: &str = "profiles";
pub const PROGRESS_COUNTERS: &str = "progress_counters";
pub const SERIES_PROGRESS: &str = "series_progress";
pub const COMPLETIONS: &str = "completions";
pub const PAIRS: &str = "pairs";
pub const META: &str = "meta";

pub const ALL: [&str; 6] = [
    PROFILES,
    PROGRESS_COUNTERS,
    SERIES_PROGRESS,
    COMPLETIONS,
    PAIRS,
    META,
];
