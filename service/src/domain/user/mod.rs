//! [`User`] definitions.

pub mod session;

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rand::{seq::SliceRandom as _, Rng as _};
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

pub use self::session::Session;

/// Operator of the registry.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Login`] of this [`User`].
    pub login: Login,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Salt`] the [`PasswordHash`] of this [`User`] is calculated with.
    pub salt: Salt,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

impl User {
    /// Verifies the provided [`Password`] against the stored [`PasswordHash`]
    /// of this [`User`].
    #[must_use]
    pub fn verify_password(&self, password: &Password) -> bool {
        self.password_hash.verify(password, &self.salt)
    }
}

/// Attributes of a [`User`] which is not registered yet.
#[derive(Clone, Debug)]
pub struct Draft {
    /// [`Login`] of the [`User`].
    pub login: Login,

    /// [`PasswordHash`] of the [`User`].
    pub password_hash: PasswordHash,

    /// [`Salt`] of the [`PasswordHash`].
    pub salt: Salt,
}

impl Draft {
    /// Creates a new [`Draft`] with a freshly [generated](Salt::generate)
    /// [`Salt`] for the provided [`Password`].
    #[must_use]
    pub fn new(login: Login, password: &Password) -> Self {
        let salt = Salt::generate();
        Self {
            login,
            password_hash: PasswordHash::new(password, &salt),
            salt,
        }
    }
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    derive_more::FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(i32);

/// Login of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Login(String);

impl Login {
    /// Maximal length of a [`Login`] in characters.
    pub const MAX_LEN: usize = 50;

    /// Minimal length of a [`Login`] (in characters) accepted on
    /// registration.
    pub const MIN_REGISTRATION_LEN: usize = 3;

    /// Creates a new [`Login`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `login` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Indicates whether this [`Login`] is long enough to be registered.
    #[must_use]
    pub fn is_registrable(&self) -> bool {
        self.0.chars().count() >= Self::MIN_REGISTRATION_LEN
    }

    /// Checks whether the given `login` is a valid [`Login`].
    fn check(login: impl AsRef<str>) -> bool {
        let login = login.as_ref();
        login.trim() == login
            && !login.is_empty()
            && login.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct Password(String);

impl Password {
    /// Minimal length of a [`Password`] in characters.
    pub const MIN_LEN: usize = 8;

    /// Maximal length of a [`Password`] in characters.
    pub const MAX_LEN: usize = 50;

    /// Length of a [generated](Password::generate) [`Password`] by default.
    pub const DEFAULT_GENERATED_LEN: usize = 12;

    /// Special characters a [generated](Password::generate) [`Password`]
    /// consists of.
    const SPECIALS: &'static str = "!@#$%^&*()-_=+[]{}|;:,.<>?";

    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Generates a new random [strong](Password::is_strong) [`Password`] of
    /// the provided length, clamped to the [`Password`] length bounds.
    #[must_use]
    pub fn generate(len: usize) -> Self {
        let len = len.clamp(Self::MIN_LEN, Self::MAX_LEN);
        let uppers = ('A'..='Z').collect::<Vec<_>>();
        let lowers = ('a'..='z').collect::<Vec<_>>();
        let digits = ('0'..='9').collect::<Vec<_>>();
        let specials = Self::SPECIALS.chars().collect::<Vec<_>>();
        let all = [&uppers, &lowers, &digits, &specials]
            .into_iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>();

        let mut rng = rand::thread_rng();
        let mut password = [&uppers, &lowers, &digits, &specials]
            .into_iter()
            .map(|class| class[rng.gen_range(0..class.len())])
            .collect::<Vec<_>>();
        password.extend(
            (password.len()..len).map(|_| all[rng.gen_range(0..all.len())]),
        );
        password.shuffle(&mut rng);

        Self(password.into_iter().collect())
    }

    /// Indicates whether this [`Password`] contains an upper-case letter, a
    /// lower-case letter, a digit and a special character at once.
    #[must_use]
    pub fn is_strong(&self) -> bool {
        let (mut upper, mut lower, mut digit, mut special) =
            (false, false, false, false);
        for c in self.0.chars() {
            if c.is_uppercase() {
                upper = true;
            } else if c.is_lowercase() {
                lower = true;
            } else if c.is_numeric() {
                digit = true;
            } else if !c.is_whitespace() && !c.is_control() {
                special = true;
            }
        }
        upper && lower && digit && special
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        (Self::MIN_LEN..=Self::MAX_LEN)
            .contains(&password.as_ref().chars().count())
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// Random salt mixed into a [`PasswordHash`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Salt(String);

impl Salt {
    /// Number of random bytes in a [generated](Salt::generate) [`Salt`].
    pub const BYTES: usize = 32;

    /// Creates a new [`Salt`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `salt` is a non-empty string.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(salt: impl Into<String>) -> Self {
        Self(salt.into())
    }

    /// Generates a new random [`Salt`] of [`Salt::BYTES`] hex-encoded bytes.
    #[must_use]
    pub fn generate() -> Self {
        let bytes: [u8; Self::BYTES] = rand::thread_rng().gen();
        Self(hex::encode(bytes))
    }
}

/// Password hash of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(forward)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Creates a new [`PasswordHash`] from the given [`Password`] and
    /// [`Salt`].
    ///
    /// It's a hex-encoded SHA-256 digest of the [`Password`] followed by the
    /// [`Salt`].
    #[must_use]
    pub fn new(password: &Password, salt: &Salt) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(password.0.as_bytes());
        hasher.update(salt.0.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Creates a new [`PasswordHash`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `hash` is a hex-encoded SHA-256
    /// digest.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Verifies that this [`PasswordHash`] is calculated from the provided
    /// [`Password`] and [`Salt`].
    ///
    /// Digests are compared in constant time.
    #[must_use]
    pub fn verify(&self, password: &Password, salt: &Salt) -> bool {
        let expected = Self::new(password, salt);
        let (a, b) = (self.0.as_bytes(), expected.0.as_bytes());
        a.len() == b.len()
            && a.iter().zip(b).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Login, Password, PasswordHash, Salt};

    #[test]
    fn validates_login() {
        assert!(Login::new("admin").is_some());
        assert!(Login::new("я").is_some());
        assert!(Login::new("").is_none());
        assert!(Login::new(" admin").is_none());
        assert!(Login::new("ж".repeat(Login::MAX_LEN)).is_some());
        assert!(Login::new("ж".repeat(Login::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn requires_registrable_login_length() {
        assert!(!Login::new("ab").unwrap().is_registrable());
        assert!(Login::new("abc").unwrap().is_registrable());
        assert!(Login::new("абв").unwrap().is_registrable());
    }

    #[test]
    fn validates_password_length() {
        assert!(Password::new("1234567").is_none());
        assert!(Password::new("12345678").is_some());
        assert!(Password::new("п".repeat(Password::MAX_LEN)).is_some());
        assert!(Password::new("п".repeat(Password::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn detects_strong_password() {
        for strong in ["Passw0rd!", "Пароль#2024", "Zz9_zzzz"] {
            assert!(Password::new(strong).unwrap().is_strong(), "{strong}");
        }
        for weak in ["password1!", "PASSWORD1!", "Password!!", "Password12"] {
            assert!(!Password::new(weak).unwrap().is_strong(), "{weak}");
        }
    }

    #[test]
    fn whitespace_is_not_special() {
        assert!(!Password::new("Passw0rd  ").unwrap().is_strong());
    }

    #[test]
    fn generates_strong_password() {
        for len in [0, 8, Password::DEFAULT_GENERATED_LEN, 50, 100] {
            let password = Password::generate(len);

            assert!(password.is_strong(), "{password}");
            assert_eq!(
                password.0.chars().count(),
                len.clamp(Password::MIN_LEN, Password::MAX_LEN),
            );
        }
    }

    #[test]
    fn generates_unique_salts() {
        let (a, b) = (Salt::generate(), Salt::generate());

        assert_eq!(a.0.len(), Salt::BYTES * 2);
        assert!(a.0.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hashes_password_with_salt() {
        let password = Password::new("password").unwrap();
        #[expect(unsafe_code, reason = "test")]
        let salt = unsafe { Salt::new_unchecked("salt") };

        // sha256("passwordsalt")
        assert_eq!(
            PasswordHash::new(&password, &salt).0,
            "7a37b85c8918eac19a9089c0fa5a2ab4dce3f90528dcdeec108b23ddf3607b99",
        );
    }

    #[test]
    fn verifies_password() {
        let password = Password::new("Passw0rd!").unwrap();
        let other = Password::new("Passw0rd?").unwrap();
        let salt = Salt::generate();
        let hash = PasswordHash::new(&password, &salt);

        assert!(hash.verify(&password, &salt));
        assert!(!hash.verify(&other, &salt));
        assert!(!hash.verify(&password, &Salt::generate()));
    }
}
