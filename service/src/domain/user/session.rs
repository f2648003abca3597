//! [`Session`] definitions.

use std::time::Duration;

use common::{unit::Expiration, DateTime, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// Authenticated session of a [`User`].
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Starts a new [`Session`] of the [`User`] lasting for the provided
    /// [`Duration`] since now.
    #[must_use]
    pub fn start(user_id: user::Id, ttl: Duration) -> Self {
        Self {
            user_id,
            expires_at: (DateTime::now() + ttl).coerce(),
        }
    }

    /// Signs this [`Session`] into a [`Token`] with the provided
    /// [`EncodingKey`].
    ///
    /// # Errors
    ///
    /// If [`jsonwebtoken`] fails to encode this [`Session`].
    pub fn sign(
        &self,
        key: &EncodingKey,
    ) -> Result<Token, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&Header::default(), self, key).map(Token)
    }
}

/// Signed access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    /// Verifies this [`Token`] with the provided [`DecodingKey`] and
    /// extracts the [`Session`] from it.
    ///
    /// # Errors
    ///
    /// If this [`Token`] is malformed, has a wrong signature or is expired.
    pub fn verify(
        &self,
        key: &DecodingKey,
    ) -> Result<Session, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Session>(&self.0, key, &Validation::default())
            .map(|data| data.claims)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey};

    use crate::domain::user;

    use super::{Session, Token};

    const SECRET: &[u8] = b"housing-fund-secret";

    #[test]
    fn verifies_signed_token() {
        let session =
            Session::start(user::Id::from(7), Duration::from_secs(60));

        let token = session
            .sign(&EncodingKey::from_secret(SECRET))
            .expect("signed");
        let verified = token
            .verify(&DecodingKey::from_secret(SECRET))
            .expect("verified");

        assert_eq!(verified.user_id, session.user_id);
        assert_eq!(
            verified.expires_at.unix_timestamp(),
            session.expires_at.unix_timestamp(),
        );
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = Session::start(user::Id::from(1), Duration::from_secs(60))
            .sign(&EncodingKey::from_secret(SECRET))
            .expect("signed");

        let err = token
            .verify(&DecodingKey::from_secret(b"another"))
            .expect_err("wrong signature");

        assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
    }

    #[test]
    fn rejects_garbage() {
        let token = "not.a.token".parse::<Token>().expect("any string");

        assert!(token.verify(&DecodingKey::from_secret(SECRET)).is_err());
    }
}
