//! Password strength validation and hashing.
//!
//! Raw passwords pass through [ValidatedPassword], which gates on a zxcvbn
//! strength score, before they can be hashed into a [PasswordHash] for
//! storage. Only the bcrypt hash ever reaches the database.

use std::fmt::Display;

use bcrypt::BcryptError;
use serde::{Deserialize, Serialize};
use zxcvbn::{Score, feedback::Feedback, zxcvbn};

use crate::Error;

/// A raw password that has passed the strength check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPassword(String);

impl ValidatedPassword {
    /// Check the strength of `raw_password` and wrap it if it scores at
    /// least 3 out of 4 with zxcvbn.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] with zxcvbn's feedback text when the score
    /// is below the cutoff. The feedback explains what makes the password
    /// guessable and how to improve it.
    pub fn new(raw_password: &str) -> Result<Self, Error> {
        let analysis = zxcvbn(raw_password, &[]);

        if analysis.score() < Score::Three {
            let feedback = analysis
                .feedback()
                .unwrap_or(&Feedback::default())
                .to_string();

            return Err(Error::TooWeak(feedback));
        }

        Ok(Self(raw_password.to_owned()))
    }

    /// Wrap `raw_password` without checking its strength.
    ///
    /// Not `unsafe` despite the name: a weak password causes no memory
    /// unsafety, it only weakens the account it protects. Intended for tests
    /// and for passwords validated elsewhere.
    pub fn new_unchecked(raw_password: &str) -> Self {
        Self(raw_password.to_owned())
    }
}

// Keeps raw passwords out of debug logs and error messages.
impl Display for ValidatedPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", str::repeat("*", 8))
    }
}

/// A bcrypt password hash, safe to store and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// The recommended bcrypt work factor.
    pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

    /// Hash a validated password with the given bcrypt `cost`.
    ///
    /// Higher costs slow down both hashing and verification. Use
    /// [PasswordHash::DEFAULT_COST] outside of tests, where a minimum cost
    /// keeps the test suite fast.
    ///
    /// # Errors
    /// Returns [Error::HashingError] if bcrypt rejects the cost or fails
    /// internally.
    pub fn new(password: ValidatedPassword, cost: u32) -> Result<Self, Error> {
        bcrypt::hash(&password.0, cost)
            .map(Self)
            .map_err(|error| Error::HashingError(error.to_string()))
    }

    /// Wrap an existing hash string without re-validating it.
    ///
    /// For hashes read back from the database, which were validated when
    /// first stored.
    pub fn new_unchecked(raw_password_hash: &str) -> Self {
        Self(raw_password_hash.to_owned())
    }

    /// Validate and hash `raw_password` in one step.
    ///
    /// Named explicitly instead of implementing `FromStr` to make clear
    /// that the input is a raw password, not an existing hash.
    ///
    /// # Errors
    /// Returns [Error::TooWeak] or [Error::HashingError], matching
    /// [ValidatedPassword::new] and [PasswordHash::new].
    pub fn from_raw_password(raw_password: &str, cost: u32) -> Result<Self, Error> {
        Self::new(ValidatedPassword::new(raw_password)?, cost)
    }

    /// Check whether `raw_password` matches this hash.
    pub fn verify(&self, raw_password: &str) -> Result<bool, BcryptError> {
        bcrypt::verify(raw_password, &self.0)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
