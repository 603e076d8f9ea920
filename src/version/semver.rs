use std::cmp::Ordering;

use semver::Version;

use crate::version::types::Prerelease;

/// Parse a version string into a semver::Version, normalizing partial versions.
///
/// Handles partial versions like "1" or "1.2" by padding with zeros.
/// Does NOT strip 'v' prefix.
///
/// Examples:
/// - "1" -> Version(1, 0, 0)
/// - "1.2" -> Version(1, 2, 0)
/// - "1.2.3" -> Version(1, 2, 3)
pub fn parse_version(version: &str) -> Option<Version> {
    let parts: Vec<&str> = version.split('.').collect();
    let normalized = match parts.len() {
        1 => format!("{}.0.0", parts[0]),
        2 => format!("{}.{}.0", parts[0], parts[1]),
        _ => version.to_string(),
    };
    Version::parse(&normalized).ok()
}

/// Prerelease flag for registries whose versions are strict semver
///
/// Anything that is not valid semver stays `Unknown` so the text heuristic
/// can still look at it.
pub fn semver_prerelease(version: &str) -> Prerelease {
    match Version::parse(version) {
        Ok(parsed) => Prerelease::from(!parsed.pre.is_empty()),
        Err(_) => Prerelease::Unknown,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Number(u64),
    Text(&'a str),
}

fn chunks(version: &str) -> Vec<Chunk<'_>> {
    let mut result = Vec::new();
    for part in version.split(['.', '-', '_', '+']) {
        let mut rest = part;
        while let Some(first) = rest.chars().next() {
            let is_digit = first.is_ascii_digit();
            let end = rest
                .find(|c: char| c.is_ascii_digit() != is_digit)
                .unwrap_or(rest.len());
            let (token, tail) = rest.split_at(end);
            result.push(match token.parse::<u64>() {
                Ok(n) if is_digit => Chunk::Number(n),
                _ => Chunk::Text(token),
            });
            rest = tail;
        }
    }
    result
}

/// Order two version strings that are not necessarily semver
///
/// Semver-shaped versions (after padding) compare by semver rules. Others
/// are split into numeric and alphabetic runs; numbers compare numerically
/// and rank above text, so "1.10" > "1.9" and "2.0" > "2.0rc1".
pub fn compare_loose(a: &str, b: &str) -> Ordering {
    if let (Some(va), Some(vb)) = (parse_version(a), parse_version(b)) {
        return va.cmp(&vb);
    }

    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ordering = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => x.cmp(y),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Greater,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Less,
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    // "2.0" vs "2.0rc1": a trailing text run marks a pre-release
    match (ca.get(cb.len()), cb.get(ca.len())) {
        (Some(Chunk::Text(_)), None) => Ordering::Less,
        (None, Some(Chunk::Text(_))) => Ordering::Greater,
        _ => ca.len().cmp(&cb.len()),
    }
}

/// Sort versions from newest to oldest using [`compare_loose`]
pub fn sort_newest_first(versions: &mut [String]) {
    versions.sort_by(|a, b| compare_loose(b, a));
}
