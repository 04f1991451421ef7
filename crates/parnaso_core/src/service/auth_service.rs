//! Account registration, sign-in and the remembered session.
//!
//! # Responsibility
//! - Create accounts with Argon2 password hashes.
//! - Authenticate by e-mail and password, refusing blocked accounts.
//! - Remember the signed-in account id in the key-value store.
//!
//! # Invariants
//! - Wrong e-mail and wrong password produce the same error.
//! - The first account registered on an empty database becomes admin.
//! - A taken e-mail is always `EmailTaken`, even when two registrations race.
//! - Passwords and hashes are never logged.

use crate::model::user::{normalize_email, User, UserId, UserRole};
use crate::model::ValidationError;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use crate::service::UserSession;
use crate::storage::keys::CURRENT_USER_KEY;
use crate::storage::{KeyValueStore, StorageError};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug)]
pub enum AuthError {
    Validation(ValidationError),
    PasswordTooShort { min_chars: usize },
    EmailTaken(String),
    InvalidCredentials,
    AccountBlocked,
    /// Password hashing backend failure.
    Hash(String),
    Repo(RepoError),
    Storage(StorageError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::PasswordTooShort { min_chars } => {
                write!(f, "password must have at least {min_chars} characters")
            }
            Self::EmailTaken(email) => write!(f, "e-mail already registered: {email}"),
            Self::InvalidCredentials => write!(f, "invalid e-mail or password"),
            Self::AccountBlocked => write!(f, "account blocked by the administrator"),
            Self::Hash(message) => write!(f, "password hash error: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<StorageError> for AuthError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

pub struct AuthService<P: ProfileRepository> {
    profiles: P,
}

impl<P: ProfileRepository> AuthService<P> {
    pub fn new(profiles: P) -> Self {
        Self { profiles }
    }

    /// Creates an account and returns its profile.
    pub fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyField("name").into());
        }
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::PasswordTooShort {
                min_chars: MIN_PASSWORD_CHARS,
            });
        }
        if self.profiles.find_by_email(&email)?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let role = if self.profiles.list_profiles()?.is_empty() {
            UserRole::Admin
        } else {
            UserRole::User
        };
        let user = User {
            id: UserId::generate(),
            name: name.to_string(),
            email,
            role,
            is_blocked: false,
        };
        let password_hash = hash_password(password)?;
        // The lookup above can race another registration; the unique index decides.
        match self.profiles.create_profile(&user, &password_hash) {
            Ok(()) => {}
            Err(RepoError::Conflict(_)) => return Err(AuthError::EmailTaken(user.email)),
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=auth_register module=auth status=ok user_id={} role={}",
            user.id,
            user.role.as_str()
        );
        Ok(user)
    }

    /// Verifies credentials and returns the signed-in session.
    pub fn login(&self, email: &str, password: &str) -> Result<UserSession, AuthError> {
        let Some(user) = self.profiles.find_by_email(email.trim())? else {
            warn!("event=auth_login module=auth status=rejected reason=unknown_email");
            return Err(AuthError::InvalidCredentials);
        };
        let Some(stored_hash) = self.profiles.password_hash(&user.id)? else {
            warn!(
                "event=auth_login module=auth status=rejected reason=no_credentials user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        };
        if !verify_password(&stored_hash, password)? {
            warn!(
                "event=auth_login module=auth status=rejected reason=bad_password user_id={}",
                user.id
            );
            return Err(AuthError::InvalidCredentials);
        }
        if user.is_blocked {
            warn!(
                "event=auth_login module=auth status=rejected reason=blocked user_id={}",
                user.id
            );
            return Err(AuthError::AccountBlocked);
        }

        info!("event=auth_login module=auth status=ok user_id={}", user.id);
        Ok(UserSession::new(user))
    }

    /// Signs in and remembers the account in `store`.
    pub fn login_and_remember<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
        email: &str,
        password: &str,
    ) -> Result<UserSession, AuthError> {
        let session = self.login(email, password)?;
        store.set_item(CURRENT_USER_KEY, session.user_id().as_str())?;
        Ok(session)
    }

    /// Restores the remembered session.
    ///
    /// A remembered id whose profile is gone or now blocked is forgotten.
    pub fn current_session<S: KeyValueStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<Option<UserSession>, AuthError> {
        let Some(raw_id) = store.get_item(CURRENT_USER_KEY)? else {
            return Ok(None);
        };
        let user_id = UserId::new(raw_id);
        match self.profiles.get_profile(&user_id)? {
            Some(user) if !user.is_blocked => Ok(Some(UserSession::new(user))),
            _ => {
                store.remove_item(CURRENT_USER_KEY)?;
                info!("event=auth_restore module=auth status=cleared user_id={user_id}");
                Ok(None)
            }
        }
    }
}

/// Forgets the remembered session.
pub fn logout<S: KeyValueStore + ?Sized>(store: &S) -> Result<(), AuthError> {
    store.remove_item(CURRENT_USER_KEY)?;
    info!("event=auth_logout module=auth status=ok");
    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Hash(err.to_string()))
}

fn verify_password(hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|err| AuthError::Hash(err.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn password_hash_verifies_only_the_hashed_password() {
        let hash = hash_password("segredo123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "segredo123").unwrap());
        assert!(!verify_password(&hash, "segredo124").unwrap());
    }
}
