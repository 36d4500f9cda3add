//! Critical-file classification.

/// Save files whose staleness corrupts game state. They are transferred on
/// every run, in the run's direction, regardless of timestamps or the
/// smart-sync setting. The same list is the CriticalOnly enumeration set.
pub const CRITICAL_FILES: [&str; 4] = [
    "CCLocalLevels.dat",
    "CCLocalLevels2.dat",
    "CCGameManager.dat",
    "CCGameManager2.dat",
];

/// Exact, case-sensitive match against the critical registry.
pub fn is_critical(filename: &str) -> bool {
    CRITICAL_FILES.contains(&filename)
}
