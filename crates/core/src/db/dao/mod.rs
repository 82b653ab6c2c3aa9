pub mod check_ins;
pub mod preferences;

pub use check_ins::CheckInDao;
pub use preferences::PreferencesDao;
