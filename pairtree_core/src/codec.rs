//! Identifier <-> path codec.
//!
//! This implementation follows the Pairtree 0.1 draft at
//! https://datatracker.ietf.org/doc/html/draft-kunze-pairtree-01
//!
//! Cleaning happens in two steps. First every byte outside visible ASCII
//! (`0x21..=0x7e`) and every byte of `" * + , < = > ? \ ^ |` is written as
//! `^` followed by two lowercase hex digits. Then `/`, `:` and `.` are
//! replaced by `=`, `+` and `,`. A clean identifier is then chunked into
//! two-character directory names:
//!
//! ```text
//! ark:/13030/xt12t3  ->  ark+=13030=xt12t3  ->  ar/k+/=1/30/30/=x/t1/2t/3
//! ```

use crate::error::{PairtreeError, PairtreeResult};
use serde::{Deserialize, Serialize};

/// Marker that starts a `^xx` hex escape.
pub const ESCAPE_MARKER: char = '^';

/// Characters that are visible ASCII but still hex escaped.
const HEX_ESCAPED: &[u8] = b"\"*+,<=>?\\^|";
const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

fn needs_hex(byte: u8) -> bool {
    !(0x21..=0x7e).contains(&byte) || HEX_ESCAPED.contains(&byte)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

fn char_len(segment: &str) -> usize {
    segment.chars().count()
}

/// Converts an arbitrary identifier into its filesystem-safe clean form.
pub fn clean(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len());
    for &byte in identifier.as_bytes() {
        match byte {
            b'/' => out.push('='),
            b':' => out.push('+'),
            b'.' => out.push(','),
            b if needs_hex(b) => {
                out.push(ESCAPE_MARKER);
                out.push(HEX_DIGITS[usize::from(b >> 4)] as char);
                out.push(HEX_DIGITS[usize::from(b & 0x0f)] as char);
            }
            // Only visible ASCII reaches this arm.
            b => out.push(b as char),
        }
    }
    out
}

/// Inverse of [`clean`].
pub fn unclean(clean_id: &str) -> PairtreeResult<String> {
    let bytes = clean_id.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'^' => {
                let hi = bytes.get(i + 1).copied().and_then(hex_value);
                let lo = bytes.get(i + 2).copied().and_then(hex_value);
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(PairtreeError::Decode {
                        input: clean_id.to_owned(),
                        reason: "escape marker must be followed by two lowercase hex digits",
                    });
                };
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
            b'=' => out.push(b'/'),
            b'+' => out.push(b':'),
            b',' => out.push(b'.'),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8(out).map_err(|_| PairtreeError::Decode {
        input: clean_id.to_owned(),
        reason: "escaped bytes are not valid UTF-8",
    })
}

/// Splits a clean identifier into its pair segments.
///
/// Every segment has two characters except a trailing one-character
/// remainder when the identifier has odd length.
pub fn pair_segments(clean_id: &str) -> PairtreeResult<Vec<&str>> {
    if clean_id.is_empty() {
        return Err(PairtreeError::EmptyIdentifier);
    }
    let mut segments = Vec::with_capacity(clean_id.len().div_ceil(2));
    let mut rest = clean_id;
    while !rest.is_empty() {
        let split = rest.char_indices().nth(2).map_or(rest.len(), |(idx, _)| idx);
        let (head, tail) = rest.split_at(split);
        segments.push(head);
        rest = tail;
    }
    Ok(segments)
}

/// Returns the clean identifier of an object directory given its segments
/// relative to the storage root.
///
/// Matches only the layout written by `StorageObject`: a well-formed pair
/// path followed by an encapsulating directory equal to the concatenated
/// pairs.
pub fn encapsulated_id<'a>(segments: &[&'a str]) -> Option<&'a str> {
    let (last, pairs) = segments.split_last()?;
    if check_pairs(pairs).is_err() {
        return None;
    }
    let mut rest = *last;
    for pair in pairs {
        rest = rest.strip_prefix(*pair)?;
    }
    rest.is_empty().then_some(*last)
}

/// Splits off a trailing encapsulating directory, if the shape of the path
/// says there is one.
fn split_encapsulating<'a, 'b>(segments: &'b [&'a str]) -> (&'b [&'a str], Option<&'a str>) {
    let Some((last, init)) = segments.split_last() else {
        return (segments, None);
    };
    // Pairing never emits a chunk longer than two characters, and never
    // continues after a one-character remainder.
    if char_len(last) > 2 || init.last().is_some_and(|prev| char_len(prev) == 1) {
        (init, Some(*last))
    } else {
        (segments, None)
    }
}

fn check_pairs(pairs: &[&str]) -> Result<(), String> {
    if pairs.is_empty() {
        return Err("no pair segments".to_owned());
    }
    let last = pairs.len() - 1;
    for (i, segment) in pairs.iter().enumerate() {
        let len = char_len(segment);
        if len == 2 || (i == last && len == 1) {
            continue;
        }
        return Err(format!(
            "segment {segment:?} at position {i} has length {len}, expected 2"
        ));
    }
    Ok(())
}

/// Separator-aware codec operations.
///
/// The separator only affects how pair paths are rendered and parsed as
/// strings; it is fixed per codec value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairtreeCodec {
    separator: char,
}

impl Default for PairtreeCodec {
    fn default() -> Self {
        Self::new('/')
    }
}

impl PairtreeCodec {
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Codec using the platform's path separator.
    pub const fn native() -> Self {
        Self::new(std::path::MAIN_SEPARATOR)
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut buf = [0u8; 4];
        segments.join(&*self.separator.encode_utf8(&mut buf))
    }

    /// Splits a path into segments, ignoring one leading and one trailing
    /// separator.
    pub fn split<'a>(&self, path: &'a str) -> Vec<&'a str> {
        let path = path.strip_prefix(self.separator).unwrap_or(path);
        let path = path.strip_suffix(self.separator).unwrap_or(path);
        if path.is_empty() {
            return Vec::new();
        }
        path.split(self.separator).collect()
    }

    /// Renders the pair path of an already cleaned identifier.
    pub fn pair_path(&self, clean_id: &str) -> PairtreeResult<String> {
        Ok(self.join(&pair_segments(clean_id)?))
    }

    /// Cleans `identifier`, renders its pair path below `root` and appends
    /// `encapsulating` as a final segment when it is non-empty.
    pub fn pair_path_for(
        &self,
        root: Option<&str>,
        identifier: &str,
        encapsulating: Option<&str>,
    ) -> PairtreeResult<String> {
        let clean_id = clean(identifier);
        let mut path = String::new();
        if let Some(root) = root.filter(|root| !root.is_empty()) {
            path.push_str(root.trim_end_matches(self.separator));
            path.push(self.separator);
        }
        path.push_str(&self.pair_path(&clean_id)?);
        if let Some(name) = encapsulating.filter(|name| !name.is_empty()) {
            path.push(self.separator);
            path.push_str(name);
        }
        Ok(path)
    }

    /// Recovers the identifier stored at `path`, optionally relative to `root`.
    pub fn id_from_pair_path(&self, path: &str, root: Option<&str>) -> PairtreeResult<String> {
        let relative = match root.filter(|root| !root.is_empty()) {
            Some(root) => {
                let not_under_root = || PairtreeError::NotUnderRoot {
                    path: path.to_owned(),
                    root: root.to_owned(),
                };
                let rest = path
                    .strip_prefix(root.trim_end_matches(self.separator))
                    .ok_or_else(not_under_root)?;
                if !rest.is_empty() && !rest.starts_with(self.separator) {
                    return Err(not_under_root());
                }
                rest
            }
            None => path,
        };

        let segments = self.split(relative);
        let (pairs, _) = split_encapsulating(&segments);
        check_pairs(pairs).map_err(|reason| PairtreeError::malformed(path, reason))?;
        unclean(&pairs.concat())
    }

    /// Returns the encapsulating directory at the end of `path`, or `None`
    /// when the path ends with its natural pairing tail.
    pub fn extract_encapsulating_directory(&self, path: &str) -> PairtreeResult<Option<String>> {
        let segments = self.split(path);
        if segments.is_empty() {
            return Ok(None);
        }
        let (pairs, encapsulating) = split_encapsulating(&segments);
        // A segment longer than two is never a pair, even on its own.
        if !pairs.is_empty() {
            check_pairs(pairs).map_err(|reason| PairtreeError::malformed(path, reason))?;
        }
        Ok(encapsulating.map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::random_identifier;

    #[test]
    fn test_clean_ark_identifier() {
        assert_eq!(clean("ark:/13030/xt12t3"), "ark+=13030=xt12t3");
    }

    #[test]
    fn test_clean_reserved_characters() {
        assert_eq!(clean("what-the-*@?#!^!?"), "what-the-^2a@^3f#!^5e!^3f");
    }

    #[test]
    fn test_clean_placeholders_are_escaped() {
        assert_eq!(clean("a+b=c,d"), "a^2bb^3dc^2cd");
        assert_eq!(unclean("a^2bb^3dc^2cd").unwrap(), "a+b=c,d");
    }

    #[test]
    fn test_clean_whitespace_and_controls() {
        assert_eq!(clean("a b\tc\n"), "a^20b^09c^0a");
        assert_eq!(clean("\u{7f}"), "^7f");
    }

    #[test]
    fn test_clean_non_ascii_is_escaped_per_byte() {
        assert_eq!(clean("é"), "^c3^a9");
        assert_eq!(unclean("^c3^a9").unwrap(), "é");
    }

    #[test]
    fn test_clean_period_only_identifiers() {
        assert_eq!(clean("."), ",");
        assert_eq!(clean(".."), ",,");
    }

    #[test]
    fn test_unclean_inverts_examples() {
        assert_eq!(unclean("ark+=13030=xt12t3").unwrap(), "ark:/13030/xt12t3");
        assert_eq!(
            unclean("what-the-^2a@^3f#!^5e!^3f").unwrap(),
            "what-the-*@?#!^!?"
        );
    }

    #[test]
    fn test_unclean_rejects_bad_escapes() {
        for bad in ["^", "^2", "abc^zz", "^2A", "x^g0"] {
            assert!(
                matches!(unclean(bad), Err(PairtreeError::Decode { .. })),
                "{bad:?} should not decode"
            );
        }
    }

    #[test]
    fn test_unclean_rejects_invalid_utf8() {
        let err = unclean("^ff").unwrap_err();
        assert!(matches!(
            err,
            PairtreeError::Decode {
                reason: "escaped bytes are not valid UTF-8",
                ..
            }
        ));
    }

    #[test]
    fn test_roundtrip_random_identifiers() {
        let mut rng = rand::rng();
        for _ in 0..500 {
            let id = random_identifier(&mut rng, 24);
            let cleaned = clean(&id);
            assert_eq!(unclean(&cleaned).unwrap(), id);
            assert_eq!(clean(&unclean(&cleaned).unwrap()), cleaned);
        }
    }

    #[test]
    fn test_escape_marker_only_starts_escapes() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let cleaned = clean(&random_identifier(&mut rng, 16));
            let bytes = cleaned.as_bytes();
            for (i, _) in cleaned.match_indices(ESCAPE_MARKER) {
                assert!(bytes.get(i + 1).copied().and_then(hex_value).is_some());
                assert!(bytes.get(i + 2).copied().and_then(hex_value).is_some());
            }
            assert!(cleaned.bytes().all(|b| (0x21..=0x7e).contains(&b)));
        }
    }

    #[test]
    fn test_pair_path_ark() {
        let codec = PairtreeCodec::default();
        assert_eq!(
            codec.pair_path("ark+=13030=xt12t3").unwrap(),
            "ar/k+/=1/30/30/=x/t1/2t/3"
        );
    }

    #[test]
    fn test_pair_path_empty_is_error() {
        let codec = PairtreeCodec::default();
        assert!(matches!(
            codec.pair_path(""),
            Err(PairtreeError::EmptyIdentifier)
        ));
    }

    #[test]
    fn test_pair_segments_shape() {
        let mut rng = rand::rng();
        for _ in 0..200 {
            let cleaned = clean(&random_identifier(&mut rng, 20));
            if cleaned.is_empty() {
                continue;
            }
            let segments = pair_segments(&cleaned).unwrap();
            assert_eq!(segments.len(), cleaned.len().div_ceil(2));
            let (last, init) = segments.split_last().unwrap();
            assert!(init.iter().all(|s| s.len() == 2));
            assert_eq!(last.len() == 1, cleaned.len() % 2 == 1);
        }
    }

    #[test]
    fn test_pair_path_for_with_encapsulating_directory() {
        let codec = PairtreeCodec::default();
        assert_eq!(
            codec
                .pair_path_for(None, "13030_45xqv_793842495", Some("793842495"))
                .unwrap(),
            "13/03/0_/45/xq/v_/79/38/42/49/5/793842495"
        );
    }

    #[test]
    fn test_pair_path_for_normalizes_root() {
        let codec = PairtreeCodec::default();
        let expected = "/data/pairtree_root/ab/cd/abcd";
        for root in ["/data/pairtree_root", "/data/pairtree_root/"] {
            assert_eq!(
                codec.pair_path_for(Some(root), "abcd", Some("abcd")).unwrap(),
                expected
            );
        }
        assert_eq!(codec.pair_path_for(Some(""), "abc", None).unwrap(), "ab/c");
    }

    #[test]
    fn test_pair_path_for_custom_separator() {
        let codec = PairtreeCodec::new('\\');
        assert_eq!(
            codec.pair_path_for(Some("C:\\store\\"), "abc", Some("abc")).unwrap(),
            "C:\\store\\ab\\c\\abc"
        );
    }

    #[test]
    fn test_id_from_pair_path() {
        let codec = PairtreeCodec::default();
        assert_eq!(
            codec
                .id_from_pair_path("ar/k+/=1/30/30/=x/t1/2t/3", None)
                .unwrap(),
            "ark:/13030/xt12t3"
        );
        assert_eq!(
            codec
                .id_from_pair_path(
                    "/store/ar/k+/=1/30/30/=x/t1/2t/3/ark+=13030=xt12t3/",
                    Some("/store/")
                )
                .unwrap(),
            "ark:/13030/xt12t3"
        );
    }

    #[test]
    fn test_id_from_pair_path_root_mismatch() {
        let codec = PairtreeCodec::default();
        assert!(matches!(
            codec.id_from_pair_path("/other/ab/cd", Some("/store")),
            Err(PairtreeError::NotUnderRoot { .. })
        ));
        assert!(matches!(
            codec.id_from_pair_path("/storex/ab/cd", Some("/store")),
            Err(PairtreeError::NotUnderRoot { .. })
        ));
    }

    #[test]
    fn test_id_from_pair_path_malformed() {
        let codec = PairtreeCodec::default();
        assert!(matches!(
            codec.id_from_pair_path("ab/cdx/efg", None),
            Err(PairtreeError::MalformedPath { .. })
        ));
        assert!(matches!(
            codec.id_from_pair_path("", None),
            Err(PairtreeError::MalformedPath { .. })
        ));
    }

    #[test]
    fn test_extract_encapsulating_directory() {
        let codec = PairtreeCodec::default();
        let cases = [
            ("ab/cd/ef", None),
            ("ab/cd/e", None),
            ("ab/cd/ef/", None),
            ("ab/cd/efg", Some("efg")),
            ("ab/c/d", Some("d")),
            ("ab/c/de", Some("de")),
            ("ab/c/def", Some("def")),
            ("ab/cd/abcd/", Some("abcd")),
            ("abc", Some("abc")),
            ("/ark+=13030=xt12t3/", Some("ark+=13030=xt12t3")),
            ("a", None),
            ("", None),
        ];
        for (path, expected) in cases {
            assert_eq!(
                codec.extract_encapsulating_directory(path).unwrap().as_deref(),
                expected,
                "path {path:?}"
            );
        }
    }

    #[test]
    fn test_extract_encapsulating_directory_malformed() {
        let codec = PairtreeCodec::default();
        for path in ["ab/cdx/efg", "ab/c/d/e", "ab//cd", "abc/d"] {
            assert!(
                matches!(
                    codec.extract_encapsulating_directory(path),
                    Err(PairtreeError::MalformedPath { .. })
                ),
                "{path:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_extract_is_inverse_of_pair_path_for() {
        let codec = PairtreeCodec::default();
        let mut rng = rand::rng();
        for _ in 0..200 {
            let id = random_identifier(&mut rng, 20);
            let cleaned = clean(&id);
            // A two-character encapsulating directory after a full pair is
            // indistinguishable from the natural tail.
            if cleaned.len() <= 2 {
                continue;
            }
            let path = codec
                .pair_path_for(Some("/root"), &id, Some(&cleaned))
                .unwrap();
            let relative = path.strip_prefix("/root").unwrap();
            assert_eq!(
                codec.extract_encapsulating_directory(relative).unwrap(),
                Some(cleaned.clone())
            );
            assert_eq!(codec.id_from_pair_path(&path, Some("/root")).unwrap(), id);
        }
    }

    #[test]
    fn test_natural_tail_is_none() {
        let codec = PairtreeCodec::default();
        let mut rng = rand::rng();
        for _ in 0..200 {
            let cleaned = clean(&random_identifier(&mut rng, 20));
            if cleaned.is_empty() {
                continue;
            }
            let path = codec.pair_path(&cleaned).unwrap();
            assert_eq!(codec.extract_encapsulating_directory(&path).unwrap(), None);
        }
    }

    #[test]
    fn test_encapsulated_id() {
        assert_eq!(encapsulated_id(&["ab", "cd", "abcd"]), Some("abcd"));
        assert_eq!(encapsulated_id(&["ab", "c", "abc"]), Some("abc"));
        assert_eq!(encapsulated_id(&["ab", "ab"]), Some("ab"));
        assert_eq!(encapsulated_id(&["ab", "cd"]), None);
        assert_eq!(encapsulated_id(&["ab", "cd", "abcd", "data"]), None);
        assert_eq!(encapsulated_id(&["ab"]), None);
        assert_eq!(encapsulated_id(&[]), None);
    }
}
