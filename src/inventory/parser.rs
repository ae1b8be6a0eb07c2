//! Parsers for gem listings.
//!
//! Two line grammars are understood:
//!
//! - listing: `name (v1, v2, v3)`, used by the desired-state file and by
//!   `gem list`
//! - outdated: `name (current < latest)`, used by `gem outdated`
//!
//! Blank lines are always ignored. What happens to a malformed line depends
//! on the [`ParseMode`].

use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{InventoryError, Result};

use super::types::{Inventory, OutdatedRecord, PackageRecord, VersionOrder};

/// How to treat lines that do not match the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Reject the input at the first malformed line.
    Strict,
    /// Skip malformed lines with a warning.
    Lenient,
}

/// Parser for listing and outdated text.
#[derive(Debug, Default)]
pub struct InventoryParser;

impl InventoryParser {
    /// Creates a new parser.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Loads the desired-state file and parses it strictly.
    ///
    /// # Errors
    ///
    /// Returns `MissingFile` if the file cannot be read and `MalformedLine`
    /// for the first line that does not match `name (v1, v2)`.
    pub fn load_desired(&self, path: impl AsRef<Path>) -> Result<Inventory> {
        let path = path.as_ref();
        info!("Loading gem list from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| InventoryError::MissingFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let records = self.parse_listing(&content, ParseMode::Strict)?;
        debug!("Gem list declares {} records", records.len());
        Ok(Inventory::new(records, VersionOrder::AsListed))
    }

    /// Parses `gem list` output into a newest-first inventory.
    ///
    /// # Errors
    ///
    /// Never fails in practice since malformed lines are skipped, but keeps
    /// the same signature as the strict entry points.
    pub fn parse_installed(&self, text: &str) -> Result<Inventory> {
        let records = self.parse_listing(text, ParseMode::Lenient)?;
        Ok(Inventory::new(records, VersionOrder::NewestFirst))
    }

    /// Parses listing lines of the form `name (v1, v2, v3)`.
    ///
    /// Only lenient parsing strips `gem list` decorations. In strict mode a
    /// version entry must be a single bare token.
    ///
    /// # Errors
    ///
    /// In strict mode, returns `MalformedLine` for the first bad line.
    pub fn parse_listing(&self, text: &str, mode: ParseMode) -> Result<Vec<PackageRecord>> {
        parse_lines(text, mode, |line| {
            let (name, inner) = split_line(line)?;
            let versions = inner
                .split(',')
                .map(|raw| parse_version(raw, mode))
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(PackageRecord {
                name: name.to_string(),
                versions,
            })
        })
    }

    /// Parses outdated lines of the form `name (current < latest)`.
    ///
    /// # Errors
    ///
    /// In strict mode, returns `MalformedLine` for the first bad line.
    pub fn parse_outdated(&self, text: &str, mode: ParseMode) -> Result<Vec<OutdatedRecord>> {
        parse_lines(text, mode, |line| {
            let (name, inner) = split_line(line)?;
            let mut parts = inner.split('<').map(str::trim);

            match (parts.next(), parts.next(), parts.next()) {
                (Some(current), Some(latest), None) if !current.is_empty() && !latest.is_empty() => {
                    Ok(OutdatedRecord {
                        name: name.to_string(),
                        current: current.to_string(),
                        latest: latest.to_string(),
                    })
                }
                _ => Err(String::from("expected exactly two versions separated by '<'")),
            }
        })
    }
}

/// Runs `parse` over every non-blank line, applying the mode's error policy.
fn parse_lines<T>(
    text: &str,
    mode: ParseMode,
    parse: impl Fn(&str) -> std::result::Result<T, String>,
) -> Result<Vec<T>> {
    let mut items = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        match parse(line) {
            Ok(item) => items.push(item),
            Err(reason) => match mode {
                ParseMode::Strict => {
                    return Err(InventoryError::malformed(idx + 1, line, reason).into());
                }
                ParseMode::Lenient => {
                    warn!("Skipping line {}: '{}' ({reason})", idx + 1, line);
                }
            },
        }
    }

    Ok(items)
}

/// Splits `name (inner)` into the trimmed name and the text between parens.
fn split_line(line: &str) -> std::result::Result<(&str, &str), String> {
    let open = line.find('(').ok_or_else(|| String::from("missing '('"))?;
    let close = line.rfind(')').ok_or_else(|| String::from("missing ')'"))?;

    if close < open {
        return Err(String::from("')' before '('"));
    }
    if close + 1 != line.len() {
        return Err(String::from("unexpected text after ')'"));
    }

    let name = line[..open].trim();
    if name.is_empty() {
        return Err(String::from("missing package name"));
    }
    if name.contains(char::is_whitespace) || name.contains(')') {
        return Err(format!("invalid package name '{name}'"));
    }

    let inner = &line[open + 1..close];
    if inner.trim().is_empty() {
        return Err(String::from("empty version list"));
    }

    Ok((name, inner))
}

/// Parses one comma-separated version entry.
fn parse_version(raw: &str, mode: ParseMode) -> std::result::Result<String, String> {
    let version = match mode {
        ParseMode::Strict => raw.trim().to_string(),
        ParseMode::Lenient => normalize_version(raw),
    };

    if version.is_empty() {
        return Err(String::from("empty version entry"));
    }
    if version.contains(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '<')) {
        return Err(format!("invalid version '{version}'"));
    }

    Ok(version)
}

/// Reduces a listed version to the string `gem` accepts with `-v`.
///
/// `gem list` decorates versions: `default: 2.4.10` marks a default gem and
/// `1.15.4 x86_64-linux` carries a platform. Both decorations are dropped.
fn normalize_version(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("default:").map_or(trimmed, str::trim_start);
    trimmed
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
