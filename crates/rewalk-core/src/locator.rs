//! Canonical location identity for walked entries.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::error::WalkError;

const SCHEME: &str = "file://";
const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// The `file://` URI identifying a file or directory.
///
/// Locators are compared as strings, so two locators are equal exactly when
/// they were built from the same absolute path. Bytes outside the unreserved
/// set (plus `/`) are percent-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(CompactString);

impl Locator {
    /// Build the locator for an absolute path.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let bytes = path_bytes(path.as_ref());
        let mut uri = CompactString::with_capacity(SCHEME.len() + bytes.len() + 1);
        uri.push_str(SCHEME);
        if bytes.first() != Some(&b'/') {
            uri.push('/');
        }
        for &byte in bytes.iter() {
            if is_unreserved(byte) {
                uri.push(byte as char);
            } else {
                uri.push('%');
                uri.push(HEX[(byte >> 4) as usize] as char);
                uri.push(HEX[(byte & 0x0f) as usize] as char);
            }
        }
        Self(uri)
    }

    /// Parse and validate a locator string.
    pub fn parse(uri: &str) -> Result<Self, WalkError> {
        let locator = Self(CompactString::from(uri));
        locator.decode()?;
        Ok(locator)
    }

    /// The URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the locator back into a filesystem path.
    pub fn to_path(&self) -> Result<PathBuf, WalkError> {
        let bytes = self.decode()?;
        bytes_to_path(bytes).map_err(|reason| self.invalid(reason))
    }

    /// Whether `other` lies strictly beneath this locator.
    pub fn is_ancestor_of(&self, other: &Locator) -> bool {
        let (parent, child) = (self.as_str(), other.as_str());
        child.len() > parent.len()
            && child.starts_with(parent)
            && (parent.ends_with('/') || child.as_bytes()[parent.len()] == b'/')
    }

    fn decode(&self) -> Result<Vec<u8>, WalkError> {
        let encoded = self
            .0
            .strip_prefix(SCHEME)
            .ok_or_else(|| self.invalid("missing file:// scheme"))?;
        if !encoded.starts_with('/') {
            return Err(self.invalid("path is not absolute"));
        }

        let raw = encoded.as_bytes();
        let mut decoded = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'%' {
                let hi = raw.get(i + 1).copied().and_then(hex_value);
                let lo = raw.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => decoded.push((hi << 4) | lo),
                    _ => return Err(self.invalid("malformed percent escape")),
                }
                i += 3;
            } else {
                decoded.push(raw[i]);
                i += 1;
            }
        }
        Ok(decoded)
    }

    fn invalid(&self, reason: &str) -> WalkError {
        WalkError::InvalidLocator {
            locator: self.0.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Locator {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~' | b'/')
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    Cow::Owned(path.to_string_lossy().replace('\\', "/").into_bytes())
}

#[cfg(unix)]
fn bytes_to_path(bytes: Vec<u8>) -> Result<PathBuf, &'static str> {
    use std::os::unix::ffi::OsStringExt;
    Ok(PathBuf::from(std::ffi::OsString::from_vec(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: Vec<u8>) -> Result<PathBuf, &'static str> {
    let path = String::from_utf8(bytes).map_err(|_| "path is not valid UTF-8")?;
    // "/C:/dir" -> "C:/dir"
    let trimmed = match path.as_bytes() {
        [b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => &path[1..],
        _ => path.as_str(),
    };
    Ok(PathBuf::from(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let locator = Locator::from_path("/srv/archive/report.pdf");
        assert_eq!(locator.as_str(), "file:///srv/archive/report.pdf");
    }

    #[cfg(unix)]
    #[test]
    fn test_reserved_bytes_are_escaped() {
        let locator = Locator::from_path("/srv/my files/100%.txt");
        assert_eq!(locator.as_str(), "file:///srv/my%20files/100%25.txt");
        assert_eq!(
            locator.to_path().unwrap(),
            PathBuf::from("/srv/my files/100%.txt")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_survives() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"/data/\xff\xfe.bin"));
        let locator = Locator::from_path(path);
        assert_eq!(locator.as_str(), "file:///data/%FF%FE.bin");
        assert_eq!(locator.to_path().unwrap(), path);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Locator::parse("file:///ok/path").is_ok());
        assert!(Locator::parse("http://example.com/x").is_err());
        assert!(Locator::parse("file://relative").is_err());
        assert!(Locator::parse("file:///bad/%zz").is_err());
        assert!(Locator::parse("file:///bad/%4").is_err());
    }

    #[test]
    fn test_is_ancestor_of() {
        let root = Locator::from_path("/data");
        let child = Locator::from_path("/data/a");
        let sibling = Locator::from_path("/database");

        assert!(root.is_ancestor_of(&child));
        assert!(!root.is_ancestor_of(&sibling));
        assert!(!root.is_ancestor_of(&root));
        assert!(!child.is_ancestor_of(&root));
        assert!(Locator::from_path("/").is_ancestor_of(&root));
    }

    #[test]
    fn test_serializes_as_string() {
        let locator = Locator::from_path("/data/a");
        let json = serde_json::to_string(&locator).unwrap();
        assert_eq!(json, "\"file:///data/a\"");
        let back: Locator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, locator);
    }
}
