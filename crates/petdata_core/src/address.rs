//! Content URI resolution.
//!
//! # Responsibility
//! - Map textual content URIs to the two addressable shapes.
//! - Build item URIs from a collection URI and a store-assigned id.
//!
//! # Invariants
//! - A matcher's pattern table is built once and never mutated.
//! - Item ids are decimal digits that fit in `i64`; anything else does not match.
//! - Matching sees only scheme, authority and path. Query, fragment and one
//!   empty trailing segment are ignored.

use crate::contract::{CONTENT_AUTHORITY, CONTENT_SCHEME, PATH_PETS};
use crate::model::pet::PetId;
use once_cell::sync::Lazy;
use regex::Regex;

static DEFAULT_MATCHER: Lazy<AddressMatcher> =
    Lazy::new(|| AddressMatcher::new(CONTENT_AUTHORITY, PATH_PETS));

/// Resolved request address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// The whole pet collection.
    Collection,
    /// Exactly one pet.
    Item { id: PetId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressShape {
    Collection,
    Item,
}

/// Immutable pattern table mapping URIs to address shapes.
#[derive(Debug)]
pub struct AddressMatcher {
    patterns: Vec<(Regex, AddressShape)>,
}

impl AddressMatcher {
    /// Builds the collection and item patterns for `authority`/`path`.
    ///
    /// Both inputs are regex-escaped, so the patterns always compile.
    pub fn new(authority: &str, path: &str) -> Self {
        let base = format!(
            "^{}://{}/{}",
            regex::escape(CONTENT_SCHEME),
            regex::escape(authority),
            regex::escape(path)
        );
        let patterns = [
            (format!("{base}$"), AddressShape::Collection),
            (format!("{base}/([0-9]+)$"), AddressShape::Item),
        ]
        .into_iter()
        .map(|(pattern, shape)| {
            let regex = Regex::new(&pattern).expect("escaped address pattern");
            (regex, shape)
        })
        .collect();

        Self { patterns }
    }

    /// Matcher for the default pets authority.
    pub fn default_matcher() -> &'static AddressMatcher {
        &DEFAULT_MATCHER
    }

    /// Resolves `uri`, returning `None` for anything unrecognized.
    pub fn resolve(&self, uri: &str) -> Option<Address> {
        let path = content_path(uri);
        self.patterns.iter().find_map(|(regex, shape)| {
            let captures = regex.captures(path)?;
            match shape {
                AddressShape::Collection => Some(Address::Collection),
                AddressShape::Item => {
                    let id = captures.get(1)?.as_str().parse::<PetId>().ok()?;
                    Some(Address::Item { id })
                }
            }
        })
    }
}

/// Strips query, fragment and one empty trailing segment from `uri`.
pub fn content_path(uri: &str) -> &str {
    let path = uri.split(['?', '#']).next().unwrap_or_default();
    path.strip_suffix('/').unwrap_or(path)
}

/// Appends `/<id>` to the path of a collection URI.
pub fn with_appended_id(uri: &str, id: PetId) -> String {
    format!("{}/{id}", content_path(uri))
}

/// Returns the trailing id of an item URI, if any.
pub fn parse_id(uri: &str) -> Option<PetId> {
    uri.rsplit('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{content_path, parse_id, with_appended_id, Address, AddressMatcher};

    #[test]
    fn resolves_collection_and_item() {
        let matcher = AddressMatcher::default_matcher();
        assert_eq!(
            matcher.resolve("content://com.example.android.pets/pets"),
            Some(Address::Collection)
        );
        assert_eq!(
            matcher.resolve("content://com.example.android.pets/pets/42"),
            Some(Address::Item { id: 42 })
        );
    }

    #[test]
    fn rejects_other_shapes() {
        let matcher = AddressMatcher::default_matcher();
        for uri in [
            "content://com.example.android.pets/owners",
            "content://com.example.android.pets/pets/abc",
            "content://com.example.android.pets/pets/1/2",
            "content://com.example.android.pets/pets//1",
            "content://com.example.android.pets/pets//",
            "content://com.example.android.pets/pets/-1",
            "content://other.authority/pets",
            "content://com.example.android.pets/pets/99999999999999999999",
            "http://com.example.android.pets/pets",
            "",
        ] {
            assert_eq!(matcher.resolve(uri), None, "{uri} should not match");
        }
    }

    #[test]
    fn ignores_query_fragment_and_trailing_slash() {
        let matcher = AddressMatcher::default_matcher();
        for uri in [
            "content://com.example.android.pets/pets?limit=1",
            "content://com.example.android.pets/pets/",
            "content://com.example.android.pets/pets#top",
            "content://com.example.android.pets/pets/?limit=1#top",
        ] {
            assert_eq!(matcher.resolve(uri), Some(Address::Collection), "{uri}");
        }
        for uri in [
            "content://com.example.android.pets/pets/1#frag",
            "content://com.example.android.pets/pets/1/",
            "content://com.example.android.pets/pets/1?fields=name",
        ] {
            assert_eq!(matcher.resolve(uri), Some(Address::Item { id: 1 }), "{uri}");
        }
    }

    #[test]
    fn content_path_drops_only_non_path_parts() {
        assert_eq!(content_path("content://a/pets?x=1#y"), "content://a/pets");
        assert_eq!(content_path("content://a/pets/3/"), "content://a/pets/3");
        assert_eq!(content_path("content://a/pets//"), "content://a/pets/");
    }

    #[test]
    fn regex_metacharacters_in_authority_are_literal() {
        let matcher = AddressMatcher::new("a+b(c)[d]", "pe.ts");
        assert_eq!(
            matcher.resolve("content://a+b(c)[d]/pe.ts/5"),
            Some(Address::Item { id: 5 })
        );
        assert_eq!(matcher.resolve("content://aab(c)[d]/pe.ts"), None);
        assert_eq!(matcher.resolve("content://a+b(c)[d]/pexts"), None);
    }

    #[test]
    fn authority_dots_are_literal() {
        let matcher = AddressMatcher::new("a.b", "pets");
        assert_eq!(matcher.resolve("content://a.b/pets"), Some(Address::Collection));
        assert_eq!(matcher.resolve("content://axb/pets"), None);
    }

    #[test]
    fn appended_id_round_trips() {
        let uri = with_appended_id("content://com.example.android.pets/pets", 7);
        assert_eq!(uri, "content://com.example.android.pets/pets/7");
        assert_eq!(parse_id(&uri), Some(7));
        assert_eq!(
            with_appended_id("content://com.example.android.pets/pets/?limit=1", 8),
            "content://com.example.android.pets/pets/8"
        );
    }
}
