//! Checksum file lines in `sha256sum` / `b3sum` format
//!
//! A line is the lowercase hex digest, two spaces, the file name and a
//! newline. When reading, the binary-mode marker (`<hex> *<name>`) is
//! accepted as well.
//!
//! Names containing a backslash, newline or carriage return are escaped
//! as `sha256sum` does: the line starts with `\` and those characters are
//! written as `\\`, `\n` and `\r`.

use super::digest::{Digest256, DigestPair, DIGEST_HEX_LEN};
use crate::config::HashAlgorithm;
use crate::error::{DigestError, Result};
use serde::{Deserialize, Serialize};

/// One parsed checksum line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumEntry {
    /// Expected digest
    pub digest: Digest256,
    /// File name as written in the line
    pub file_name: String,
}

/// Render one checksum line for the chosen digest
pub fn checksum_line(algorithm: HashAlgorithm, digests: &DigestPair, file_name: &str) -> String {
    if file_name.contains(['\\', '\n', '\r']) {
        format!(
            "\\{}  {}\n",
            digests.get(algorithm),
            escape_file_name(file_name)
        )
    } else {
        format!("{}  {}\n", digests.get(algorithm), file_name)
    }
}

fn escape_file_name(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_file_name(name: &str) -> Result<String> {
    let mut unescaped = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            unescaped.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => unescaped.push('\\'),
            Some('n') => unescaped.push('\n'),
            Some('r') => unescaped.push('\r'),
            other => {
                return Err(DigestError::InvalidDigest(format!(
                    "bad escape in checksum file name: \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(unescaped)
}

/// Render a checksum file for several entries, in the given order
pub fn checksum_manifest<'a, I>(algorithm: HashAlgorithm, entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a DigestPair)>,
{
    entries
        .into_iter()
        .map(|(name, digests)| checksum_line(algorithm, digests, name))
        .collect()
}

/// Parse one checksum line
pub fn parse_checksum_line(line: &str) -> Result<ChecksumEntry> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (escaped, line) = match line.strip_prefix('\\') {
        Some(rest) => (true, rest),
        None => (false, line),
    };

    if line.len() < DIGEST_HEX_LEN + 2 || !line.is_char_boundary(DIGEST_HEX_LEN) {
        return Err(DigestError::InvalidDigest(format!(
            "malformed checksum line: {:?}",
            line
        )));
    }

    let (hex, rest) = line.split_at(DIGEST_HEX_LEN);
    let file_name = rest
        .strip_prefix("  ")
        .or_else(|| rest.strip_prefix(" *"))
        .ok_or_else(|| {
            DigestError::InvalidDigest(format!("missing separator in checksum line: {:?}", line))
        })?;

    if file_name.is_empty() {
        return Err(DigestError::InvalidDigest(
            "checksum line has no file name".to_string(),
        ));
    }

    let file_name = if escaped {
        unescape_file_name(file_name)?
    } else {
        file_name.to_string()
    };

    Ok(ChecksumEntry {
        digest: Digest256::from_hex(hex)?,
        file_name,
    })
}

/// Parse a whole checksum file, skipping blank lines and `#` comments
pub fn parse_checksum_manifest(text: &str) -> Result<Vec<ChecksumEntry>> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .map(parse_checksum_line)
        .collect()
}
