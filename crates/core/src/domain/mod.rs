pub mod history;
pub mod preferences;
pub mod qr;

pub use history::CheckInHistoryStore;
pub use preferences::PreferencesService;
pub use qr::{QrPayloadGenerator, QrRefreshHandle};
