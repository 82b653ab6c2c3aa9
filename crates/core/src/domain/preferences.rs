use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::db::{Database, PreferencesDao};
use crate::error::Result;
use crate::models::{AppColorScheme, AppTheme, UserPreferences};

const MBR_ID: &str = "mbr_id";
const FIRST_NAME: &str = "first_name";
const THEME: &str = "theme";
const COLOR_SCHEME: &str = "color_scheme";
const QR_ON_OPEN: &str = "qr_on_open";
const QR_MAX_BRIGHTNESS: &str = "qr_max_brightness";
const PURE_BLACK: &str = "pure_black";
const USE_NTP: &str = "use_ntp";
const NTP_SERVER: &str = "ntp_server";

/// User display and behavior preferences, published to subscribers
#[derive(Clone)]
pub struct PreferencesService {
    inner: Arc<Inner>,
}

struct Inner {
    dao: PreferencesDao,
    write_lock: Mutex<()>,
    current: watch::Sender<UserPreferences>,
}

impl PreferencesService {
    /// Load stored preferences. A failed read falls back to the defaults.
    pub fn open(db: Arc<Database>) -> Self {
        let dao = PreferencesDao::new(db);

        let prefs = match dao.get_all() {
            Ok(values) => from_values(&values),
            Err(e) => {
                tracing::error!(error = %e, "Error reading preferences, using defaults");
                UserPreferences::default()
            }
        };

        let (current, _) = watch::channel(prefs);

        Self {
            inner: Arc::new(Inner {
                dao,
                write_lock: Mutex::new(()),
                current,
            }),
        }
    }

    pub fn current(&self) -> UserPreferences {
        self.inner.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<UserPreferences> {
        self.inner.current.subscribe()
    }

    pub fn set_member_id(&self, member_id: &str) -> Result<()> {
        let member_id = member_id.trim().to_string();
        self.save(MBR_ID, member_id.clone(), |prefs| prefs.member_id = member_id)
    }

    pub fn set_first_name(&self, first_name: &str) -> Result<()> {
        let first_name = first_name.trim().to_string();
        self.save(FIRST_NAME, first_name.clone(), |prefs| {
            prefs.first_name = first_name
        })
    }

    /// Save member id and first name together
    pub fn set_user_info(&self, member_id: &str, first_name: &str) -> Result<()> {
        let member_id = member_id.trim().to_string();
        let first_name = first_name.trim().to_string();

        let _guard = self.inner.write_lock.lock();
        self.inner.dao.set_many(&[
            (MBR_ID, member_id.clone()),
            (FIRST_NAME, first_name.clone()),
        ])?;

        tracing::debug!("Saved user info");

        self.inner.current.send_modify(|prefs| {
            prefs.member_id = member_id;
            prefs.first_name = first_name;
        });

        Ok(())
    }

    pub fn set_theme(&self, theme: AppTheme) -> Result<()> {
        self.save(THEME, theme.to_string(), |prefs| prefs.theme = theme)
    }

    pub fn set_color_scheme(&self, color_scheme: AppColorScheme) -> Result<()> {
        self.save(COLOR_SCHEME, color_scheme.to_string(), |prefs| {
            prefs.color_scheme = color_scheme
        })
    }

    pub fn set_qr_on_open(&self, qr_on_open: bool) -> Result<()> {
        self.save(QR_ON_OPEN, qr_on_open.to_string(), |prefs| {
            prefs.qr_on_open = qr_on_open
        })
    }

    pub fn set_qr_max_brightness(&self, qr_max_brightness: bool) -> Result<()> {
        self.save(QR_MAX_BRIGHTNESS, qr_max_brightness.to_string(), |prefs| {
            prefs.qr_max_brightness = qr_max_brightness
        })
    }

    pub fn set_pure_black(&self, pure_black: bool) -> Result<()> {
        self.save(PURE_BLACK, pure_black.to_string(), |prefs| {
            prefs.pure_black = pure_black
        })
    }

    pub fn set_use_ntp(&self, use_ntp: bool) -> Result<()> {
        self.save(USE_NTP, use_ntp.to_string(), |prefs| prefs.use_ntp = use_ntp)
    }

    pub fn set_ntp_server(&self, ntp_server: &str) -> Result<()> {
        let ntp_server = ntp_server.trim().to_string();
        self.save(NTP_SERVER, ntp_server.clone(), |prefs| {
            prefs.ntp_server = ntp_server
        })
    }

    fn save<F>(&self, key: &str, value: String, update: F) -> Result<()>
    where
        F: FnOnce(&mut UserPreferences),
    {
        let _guard = self.inner.write_lock.lock();
        self.inner.dao.set(key, &value)?;

        tracing::debug!(key, %value, "Saved preference");

        self.inner.current.send_modify(update);
        Ok(())
    }
}

fn from_values(values: &HashMap<String, String>) -> UserPreferences {
    let defaults = UserPreferences::default();

    UserPreferences {
        member_id: values.get(MBR_ID).cloned().unwrap_or(defaults.member_id),
        first_name: values
            .get(FIRST_NAME)
            .cloned()
            .unwrap_or(defaults.first_name),
        theme: parse_or(values, THEME, defaults.theme),
        color_scheme: parse_or(values, COLOR_SCHEME, defaults.color_scheme),
        qr_on_open: parse_or(values, QR_ON_OPEN, defaults.qr_on_open),
        qr_max_brightness: parse_or(values, QR_MAX_BRIGHTNESS, defaults.qr_max_brightness),
        pure_black: parse_or(values, PURE_BLACK, defaults.pure_black),
        use_ntp: parse_or(values, USE_NTP, defaults.use_ntp),
        ntp_server: values
            .get(NTP_SERVER)
            .cloned()
            .unwrap_or(defaults.ntp_server),
    }
}

fn parse_or<T: FromStr>(values: &HashMap<String, String>, key: &str, default: T) -> T {
    match values.get(key) {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!(key, %value, "Ignoring unrecognized preference value");
            default
        }),
    }
}
