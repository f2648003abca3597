//! [`Address`] of a [`House`] and its normalization.
//!
//! [`House`]: super::House

use std::{str::FromStr, sync::LazyLock};

use derive_more::{AsRef, Display};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;

/// Postal address of a [`House`].
///
/// [`House`]: super::House
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Address(String);

impl Address {
    /// Maximal length of an [`Address`] in characters.
    pub const MAX_LEN: usize = 255;

    /// Creates a new [`Address`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Address`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Returns the [normalized](normalize) form of this [`Address`].
    #[must_use]
    pub fn normalized(&self) -> String {
        normalize(&self.0)
    }

    /// Checks whether the given `address` is a valid [`Address`].
    fn check(address: impl AsRef<str>) -> bool {
        let address = address.as_ref();
        address.trim() == address
            && !address.is_empty()
            && address.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Address {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Address`")
    }
}

/// Non-empty fragment of an [`Address`] to be searched for case-insensitively.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(forward)]
pub struct Fragment(String);

impl Fragment {
    /// Creates a new [`Fragment`] if the given `fragment` is not blank and not
    /// longer than an [`Address`] may be.
    ///
    /// Surrounding whitespace is trimmed.
    #[must_use]
    pub fn new(fragment: impl AsRef<str>) -> Option<Self> {
        let fragment = fragment.as_ref().trim();
        (!fragment.is_empty() && fragment.chars().count() <= Address::MAX_LEN)
            .then(|| Self(fragment.to_owned()))
    }

    /// Checks whether the provided `address` contains this [`Fragment`],
    /// ignoring letter case.
    #[must_use]
    pub fn is_in(&self, address: &str) -> bool {
        address.to_lowercase().contains(&self.0.to_lowercase())
    }
}

impl FromStr for Fragment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid address `Fragment`")
    }
}

/// Normalizes the provided free-text address, so different spellings of the
/// same address become equal.
///
/// The text is lower-cased, whitespace runs are collapsed and trimmed, street
/// (`ул.`, `улица`), avenue (`пр.`, `проспект`, `пр-т`) and building (`д.`,
/// `дом`) designators are unified, and then commas and periods are stripped.
///
/// Stripping punctuation may form a new designator or whitespace run, so the
/// steps are repeated until the result stops changing. Every repetition which
/// changes something makes the text shorter, so this always terminates, and
/// normalizing an already normalized text returns it as is.
#[must_use]
pub fn normalize(text: &str) -> String {
    let mut normalized = normalize_once(text);
    loop {
        let next = normalize_once(&normalized);
        if next == normalized {
            return normalized;
        }
        normalized = next;
    }
}

/// Performs a single pass of the [`normalize()`] steps.
fn normalize_once(text: &str) -> String {
    /// Run of whitespace characters.
    static WHITESPACE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    /// Street designator variants.
    static STREET: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\bул\.|\bулица\b").expect("valid regex")
    });

    /// Avenue designator variants.
    static AVENUE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\bпр\.|\bпроспект\b|\bпр-т\b").expect("valid regex")
    });

    /// Building designator variants.
    static BUILDING: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\bд\.|\bдом\b").expect("valid regex")
    });

    /// Punctuation to strip.
    static PUNCTUATION: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[.,]").expect("valid regex"));

    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lowered, " ");
    let street = STREET.replace_all(collapsed.trim(), "ул");
    let avenue = AVENUE.replace_all(&street, "пр");
    let building = BUILDING.replace_all(&avenue, "д");
    PUNCTUATION.replace_all(&building, "").into_owned()
}

#[cfg(test)]
mod spec {
    use super::{normalize, Address, Fragment};

    #[test]
    fn ignores_case_and_whitespace() {
        assert_eq!(normalize("УЛ.  Ленина,  д.5"), normalize("ул ленина д5"));
        assert_eq!(normalize("ул ленина д5"), "ул ленина д5");
    }

    #[test]
    fn unifies_street_designators() {
        assert_eq!(normalize("улица Ленина"), "ул ленина");
        assert_eq!(normalize("ул. Ленина"), "ул ленина");
        assert_eq!(normalize("Ленина ул."), "ленина ул");
    }

    #[test]
    fn unifies_avenue_designators() {
        assert_eq!(normalize("проспект Мира"), "пр мира");
        assert_eq!(normalize("пр. Мира"), "пр мира");
        assert_eq!(normalize("пр-т Мира"), "пр мира");
    }

    #[test]
    fn unifies_building_designators() {
        assert_eq!(
            normalize("пр. Мира, д. 10"),
            normalize("проспект Мира дом 10"),
        );
        assert_eq!(normalize("Мира дом 10"), "мира д 10");
    }

    #[test]
    fn keeps_designators_inside_words() {
        assert_eq!(
            normalize("ул. Домостроителей, д. 3"),
            "ул домостроителей д 3",
        );
        assert_eq!(normalize("Улицкая 7"), "улицкая 7");
        assert_eq!(normalize("Прудная 2"), "прудная 2");
    }

    #[test]
    fn strips_punctuation() {
        assert_eq!(normalize("Baker Street, 221B."), "baker street 221b");
    }

    #[test]
    fn handles_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \t\n "), "");
        assert_eq!(normalize(",."), "");
    }

    #[test]
    fn is_idempotent() {
        for input in [
            "УЛ.  Ленина,  д.5",
            "у.лица Мира , дом 3",
            "пр.-т Победы,д.1",
            "  ул , , Ленина  ",
            "д.о.м 7",
            "Проспект  Мира,\tдом 10, корп. 2",
            "",
            "ул.. Ленина",
        ] {
            let once = normalize(input);

            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn normalizes_address() {
        let address = Address::new("улица Ленина, дом 5").unwrap();

        assert_eq!(address.normalized(), "ул ленина д 5");
    }

    #[test]
    fn validates_address() {
        assert!(Address::new("ул Ленина д5").is_some());
        assert!(Address::new("").is_none());
        assert!(Address::new(" ул Ленина").is_none());
        assert!(Address::new("ул Ленина ").is_none());
        assert!(Address::new("д".repeat(Address::MAX_LEN)).is_some());
        assert!(Address::new("д".repeat(Address::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn matches_fragment_ignoring_case() {
        let fragment = Fragment::new("  ЛЕНИНА ").unwrap();

        assert_eq!(fragment.to_string(), "ЛЕНИНА");
        assert!(fragment.is_in("ул Ленина д5"));
        assert!(!fragment.is_in("пр Мира 10"));
        assert!(Fragment::new(" \t").is_none());
        assert!(Fragment::new("").is_none());
    }
}
