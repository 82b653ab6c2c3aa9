pub mod check_in;
pub mod preferences;
pub mod qr;

pub use check_in::{CheckInHistory, CheckInRecord, HistoryChange};
pub use preferences::{AppColorScheme, AppTheme, UserPreferences};
pub use qr::QrData;
