use crate::error::Error;
use chrono::NaiveDate;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    pub key: String,
    /// `DD/MM/YYYY`, as written in the sheet.
    pub expiration_date: String,
}

impl AccessKey {
    pub fn expires_on(&self) -> Option<NaiveDate> {
        parse_expiration(&self.expiration_date)
    }
}

pub fn parse_expiration(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum AccessDenied {
    #[display("Please enter an access key.")]
    Empty,
    #[display("Invalid access key. Please try again.")]
    NotFound,
    #[display("This access key has expired. Contact the administrator to renew it.")]
    Expired,
    #[display("The expiration date for this key is malformed in the sheet. Contact the administrator.")]
    MalformedDate,
}

impl From<AccessDenied> for Error {
    fn from(denied: AccessDenied) -> Self {
        Error::Validation(denied.to_string())
    }
}

/// Check `input` against the loaded keys. A key stays valid through the whole of its expiry day.
pub fn validate_access_key(
    input: &str,
    keys: &[AccessKey],
    today: NaiveDate,
) -> Result<AccessKey, AccessDenied> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AccessDenied::Empty);
    }

    let found = keys
        .iter()
        .find(|candidate| candidate.key == input)
        .ok_or(AccessDenied::NotFound)?;
    let expires_on = found.expires_on().ok_or(AccessDenied::MalformedDate)?;

    if today > expires_on {
        return Err(AccessDenied::Expired);
    }
    Ok(found.clone())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(AccessKey),
}

/// Login gate over the access keys loaded for this session.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    keys: Vec<AccessKey>,
    state: AuthState,
}

impl AccessGate {
    pub fn new(keys: Vec<AccessKey>) -> Self {
        Self {
            keys,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn current_key(&self) -> Option<&AccessKey> {
        match &self.state {
            AuthState::Authenticated(key) => Some(key),
            AuthState::Unauthenticated => None,
        }
    }

    /// A failed attempt leaves the current state untouched.
    pub fn login(&mut self, input: &str, today: NaiveDate) -> Result<AccessKey, AccessDenied> {
        let key = validate_access_key(input, &self.keys, today)?;
        info!("access key accepted");
        self.state = AuthState::Authenticated(key.clone());
        Ok(key)
    }

    /// Re-check a key persisted by an earlier session against the fresh list.
    pub fn restore(&mut self, persisted: Option<&str>, today: NaiveDate) -> bool {
        let Some(persisted) = persisted else {
            return false;
        };
        match validate_access_key(persisted, &self.keys, today) {
            Ok(key) => {
                self.state = AuthState::Authenticated(key);
                true
            }
            Err(reason) => {
                warn!(%reason, "stored access key no longer valid");
                false
            }
        }
    }

    pub fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    fn key(name: &str, date: NaiveDate) -> AccessKey {
        AccessKey {
            key: name.into(),
            expiration_date: date.format(DATE_FORMAT).to_string(),
        }
    }

    fn keys() -> Vec<AccessKey> {
        vec![
            key("today", today()),
            key("yesterday", today() - Duration::days(1)),
            AccessKey {
                key: "garbled".into(),
                expiration_date: "2025-99-99".into(),
            },
        ]
    }

    #[test]
    fn key_expiring_today_is_accepted() {
        let accepted = validate_access_key(" today ", &keys(), today()).unwrap();
        assert_eq!(accepted.key, "today");
    }

    #[test]
    fn rejection_reasons() {
        let keys = keys();
        assert_eq!(validate_access_key("yesterday", &keys, today()), Err(AccessDenied::Expired));
        assert_eq!(validate_access_key("nope", &keys, today()), Err(AccessDenied::NotFound));
        assert_eq!(validate_access_key("   ", &keys, today()), Err(AccessDenied::Empty));
        assert_eq!(
            validate_access_key("garbled", &keys, today()),
            Err(AccessDenied::MalformedDate)
        );
    }

    #[test]
    fn dates_are_day_month_year() {
        assert_eq!(
            parse_expiration("05/06/2030"),
            NaiveDate::from_ymd_opt(2030, 6, 5)
        );
        assert_eq!(parse_expiration("31/02/2030"), None);
    }

    #[test]
    fn failed_login_keeps_the_state() {
        let mut gate = AccessGate::new(keys());
        assert!(gate.login("today", today()).is_ok());
        assert!(gate.login("yesterday", today()).is_err());
        assert_eq!(gate.current_key().map(|k| k.key.as_str()), Some("today"));

        gate.logout();
        assert_eq!(gate.state(), &AuthState::Unauthenticated);
    }

    #[test]
    fn restore_revalidates_the_persisted_key() {
        let mut gate = AccessGate::new(keys());
        assert!(!gate.restore(Some("yesterday"), today()));
        assert!(!gate.is_authenticated());
        assert!(gate.restore(Some("today"), today()));
        assert!(gate.is_authenticated());
    }
}
