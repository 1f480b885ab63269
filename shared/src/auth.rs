//! Password hashing and credential checks.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::models::{normalize_email, Account};
use crate::store::AccountStore;
use crate::{Error, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Create a new account, rejecting duplicate emails.
pub async fn register<S: AccountStore + ?Sized>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<Account> {
    if store
        .find_account_by_email(&normalize_email(email))
        .await?
        .is_some()
    {
        return Err(Error::Validation("Email already exists".to_string()));
    }

    let password_hash = hash_password(password)?;
    store.insert_account(Account::new(email, password_hash)).await
}

/// Look up an account by email and verify its password.
pub async fn login<S: AccountStore + ?Sized>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<Account> {
    let account = store
        .find_account_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| Error::Auth("Invalid credentials".to_string()))?;

    if !verify_password(password, &account.password_hash) {
        return Err(Error::Auth("Invalid credentials".to_string()));
    }

    Ok(account)
}
