//! User accounts: registration, sign-in, profile and password management.
//!
//! Passwords are stored as salted SHA-256 digests; the salt is a random
//! per-user token generated at registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::session::SessionContext;
use crate::snippet::Snippet;
use crate::store::{SharedStore, StoreError};

const USERS_KEY: &str = "users";

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("please fill all fields")]
    MissingFields,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("current password is incorrect")]
    WrongPassword,

    #[error("not logged in")]
    NotLoggedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Form-side strength score, 0–100: +25 each for length >= 8, an uppercase
/// letter, a digit, and a symbol.
pub fn password_strength(password: &str) -> u8 {
    let mut strength = 0;
    if password.len() >= 8 {
        strength += 25;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        strength += 25;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        strength += 25;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        strength += 25;
    }
    strength
}

#[derive(Clone)]
pub struct AccountService {
    store: SharedStore,
}

impl AccountService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn users(&self) -> Vec<User> {
        self.store
            .lock()
            .map(|store| store.get(USERS_KEY))
            .unwrap_or_default()
    }

    /// Writes `user` back, matched by id; unknown users are appended.
    pub fn persist(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users();
        match users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => *slot = user.clone(),
            None => users.push(user.clone()),
        }
        self.save_users(&users)
    }

    /// Creates an account and signs it in (process-local session).
    pub fn register(
        &self,
        session: &mut SessionContext,
        account: NewAccount,
    ) -> Result<User, AccountError> {
        if account.username.trim().is_empty()
            || account.email.trim().is_empty()
            || account.password.is_empty()
            || account.confirm_password.is_empty()
        {
            return Err(AccountError::MissingFields);
        }
        if account.password != account.confirm_password {
            return Err(AccountError::PasswordMismatch);
        }

        let mut users = self.users();
        if users.iter().any(|u| u.email == account.email) {
            return Err(AccountError::EmailTaken);
        }

        let salt = Uuid::new_v4().simple().to_string();
        let user = User {
            id: Uuid::new_v4(),
            username: account.username.trim().to_string(),
            email: account.email.trim().to_string(),
            password_hash: hash_password(&salt, &account.password),
            salt,
            created_at: Utc::now(),
            avatar: None,
            snippets: Vec::new(),
        };
        users.push(user.clone());
        self.save_users(&users)?;
        session.sign_in(&self.store, user.id, false)?;
        tracing::info!(user = %user.id, "account registered");
        Ok(user)
    }

    pub fn login(
        &self,
        session: &mut SessionContext,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<User, AccountError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields);
        }
        let user = self
            .users()
            .into_iter()
            .find(|u| u.email == email && u.password_hash == hash_password(&u.salt, password))
            .ok_or(AccountError::InvalidCredentials)?;
        session.sign_in(&self.store, user.id, remember)?;
        tracing::info!(user = %user.id, "signed in");
        Ok(user)
    }

    pub fn logout(&self, session: &mut SessionContext) -> Result<(), StoreError> {
        session.sign_out(&self.store)
    }

    /// The signed-in user's record, if any. A dangling session pointer (user
    /// deleted underneath it) resolves to none.
    pub fn current_user(&self, session: &SessionContext) -> Option<User> {
        let id = session.current()?;
        self.users().into_iter().find(|u| u.id == id)
    }

    pub fn update_profile(
        &self,
        user: &mut User,
        display_name: &str,
    ) -> Result<(), AccountError> {
        if display_name.trim().is_empty() {
            return Err(AccountError::MissingFields);
        }
        user.username = display_name.trim().to_string();
        self.persist(user)?;
        Ok(())
    }

    /// Stores an avatar image as a data URI on the profile.
    pub fn set_avatar(&self, user: &mut User, data_uri: String) -> Result<(), AccountError> {
        user.avatar = Some(data_uri);
        self.persist(user)?;
        Ok(())
    }

    pub fn change_password(
        &self,
        user: &mut User,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AccountError> {
        if current.is_empty() || new.is_empty() || confirm.is_empty() {
            return Err(AccountError::MissingFields);
        }
        if hash_password(&user.salt, current) != user.password_hash {
            return Err(AccountError::WrongPassword);
        }
        if new != confirm {
            return Err(AccountError::PasswordMismatch);
        }
        user.password_hash = hash_password(&user.salt, new);
        self.persist(user)?;
        Ok(())
    }

    /// Deletes the account after re-verifying the password, and tears down
    /// the session.
    pub fn delete_account(
        &self,
        session: &mut SessionContext,
        user: &User,
        password: &str,
    ) -> Result<(), AccountError> {
        if hash_password(&user.salt, password) != user.password_hash {
            return Err(AccountError::WrongPassword);
        }
        let users: Vec<User> = self.users().into_iter().filter(|u| u.id != user.id).collect();
        self.save_users(&users)?;
        session.sign_out(&self.store)?;
        tracing::info!(user = %user.id, "account deleted");
        Ok(())
    }

    fn save_users(&self, users: &[User]) -> Result<(), StoreError> {
        let Ok(mut store) = self.store.lock() else {
            return Ok(());
        };
        store.put(USERS_KEY, users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;
    use pretty_assertions::assert_eq;

    fn service() -> (AccountService, SessionContext) {
        (
            AccountService::new(RecordStore::in_memory().into_shared()),
            SessionContext::default(),
        )
    }

    fn ada() -> NewAccount {
        NewAccount {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        }
    }

    #[test]
    fn register_signs_in_and_stores_salted_hash() {
        let (accounts, mut session) = service();
        let user = accounts.register(&mut session, ada()).unwrap();

        assert_eq!(session.current(), Some(user.id));
        assert_ne!(user.password_hash, "hunter22");
        assert!(!user.salt.is_empty());
        assert_eq!(user.password_hash, hash_password(&user.salt, "hunter22"));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (accounts, mut session) = service();
        accounts.register(&mut session, ada()).unwrap();
        let err = accounts.register(&mut session, ada()).unwrap_err();
        assert!(matches!(err, AccountError::EmailTaken));
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let (accounts, mut session) = service();
        let err = accounts
            .register(
                &mut session,
                NewAccount {
                    confirm_password: "other".into(),
                    ..ada()
                },
            )
            .unwrap_err();
        assert!(matches!(err, AccountError::PasswordMismatch));
    }

    #[test]
    fn login_verifies_credentials() {
        let (accounts, mut session) = service();
        accounts.register(&mut session, ada()).unwrap();
        accounts.logout(&mut session).unwrap();

        assert!(matches!(
            accounts.login(&mut session, "ada@example.com", "wrong", false),
            Err(AccountError::InvalidCredentials)
        ));
        assert!(!session.is_signed_in());

        let user = accounts
            .login(&mut session, "ada@example.com", "hunter22", false)
            .unwrap();
        assert_eq!(accounts.current_user(&session).unwrap().id, user.id);
    }

    #[test]
    fn change_password_requires_current() {
        let (accounts, mut session) = service();
        let mut user = accounts.register(&mut session, ada()).unwrap();

        assert!(matches!(
            accounts.change_password(&mut user, "nope", "new-pass", "new-pass"),
            Err(AccountError::WrongPassword)
        ));

        accounts
            .change_password(&mut user, "hunter22", "new-pass", "new-pass")
            .unwrap();
        accounts.logout(&mut session).unwrap();
        accounts
            .login(&mut session, "ada@example.com", "new-pass", false)
            .unwrap();
    }

    #[test]
    fn delete_account_requires_password_and_signs_out() {
        let (accounts, mut session) = service();
        let user = accounts.register(&mut session, ada()).unwrap();

        assert!(matches!(
            accounts.delete_account(&mut session, &user, "wrong"),
            Err(AccountError::WrongPassword)
        ));

        accounts
            .delete_account(&mut session, &user, "hunter22")
            .unwrap();
        assert!(!session.is_signed_in());
        assert!(accounts.users().is_empty());
    }

    #[test]
    fn dangling_session_resolves_to_none() {
        let (accounts, mut session) = service();
        let user = accounts.register(&mut session, ada()).unwrap();
        accounts.delete_account(&mut session, &user, "hunter22").unwrap();

        let store = RecordStore::in_memory().into_shared();
        let mut stale = SessionContext::default();
        stale.sign_in(&store, user.id, false).unwrap();
        assert!(accounts.current_user(&stale).is_none());
    }

    #[test]
    fn strength_scores_accumulate() {
        assert_eq!(password_strength(""), 0);
        assert_eq!(password_strength("abcdefgh"), 25);
        assert_eq!(password_strength("Abcdefgh"), 50);
        assert_eq!(password_strength("Abcdefg1"), 75);
        assert_eq!(password_strength("Abcdef1!"), 100);
    }

    #[test]
    fn profile_updates_persist() {
        let (accounts, mut session) = service();
        let mut user = accounts.register(&mut session, ada()).unwrap();

        accounts.update_profile(&mut user, "Ada L.").unwrap();
        accounts
            .set_avatar(&mut user, "data:image/png;base64,AAAA".into())
            .unwrap();

        let stored = accounts.current_user(&session).unwrap();
        assert_eq!(stored.username, "Ada L.");
        assert!(stored.avatar.is_some());
    }
}
