//! # Naming
//!
//! Converts catalog identifiers (snake_case column and table names) into exported Go
//! identifiers and derives the secondary names the documents need: route names, plural
//! id parameters and short receiver abbreviations.
//!
//! ```rust
//! use grom::naming::to_exported_name;
//!
//! assert_eq!(to_exported_name("user_id", true), "UserID");
//! assert_eq!(to_exported_name("user_id", false), "UserId");
//! ```
//!
//! Normalization is lossy: `user_id` and `USER_ID` map to the same name and there is no
//! way back to the raw spelling. Documents always carry the raw name alongside.

use heck::{ToKebabCase, ToSnakeCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::config::RouteStyle;

/// Common Go initialisms (golint's list).
pub const INITIALISMS: &[&str] = &[
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

static INITIALISM_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| INITIALISMS.iter().copied().collect());

/// Reports whether `word` (any casing) is a known initialism.
pub fn is_initialism(word: &str) -> bool {
    INITIALISM_SET.contains(word.to_uppercase().as_str())
}

/// Convert a raw catalog name into an exported identifier.
///
/// The name is split on `_`; every segment becomes Title case (first char upper, the rest
/// lower). With `enable_initialism` a segment that is a known initialism is emitted all caps
/// instead. Segments in scripts without case pass through untouched.
pub fn to_exported_name(raw: &str, enable_initialism: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for segment in raw.split('_') {
        if segment.is_empty() {
            continue;
        }
        let upper = segment.to_uppercase();
        if enable_initialism && INITIALISM_SET.contains(upper.as_str()) {
            out.push_str(&upper);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            for c in chars {
                out.extend(c.to_lowercase());
            }
        }
    }
    out
}

/// Replace Title-case initialism words inside an already exported name (`UserId` → `UserID`).
///
/// Words are the runs starting at each upper-case letter, so `Ids` or `Identity` are left
/// alone; only an exact `Id` word is replaced.
pub fn replace_initialisms(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for word in split_camel_words(name) {
        if word.len() > 1 && is_title_case(word) && INITIALISM_SET.contains(word.to_uppercase().as_str()) {
            out.push_str(&word.to_uppercase());
        } else {
            out.push_str(word);
        }
    }
    out
}

fn is_title_case(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| !c.is_uppercase()),
        _ => false,
    }
}

/// Split a camel-case name at every upper-case letter.
fn split_camel_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    for (idx, c) in name.char_indices() {
        if idx > start && c.is_uppercase() {
            words.push(&name[start..idx]);
            start = idx;
        }
    }
    if start < name.len() {
        words.push(&name[start..]);
    }
    words
}

/// Upper camel case without initialism handling (`user_info` → `UserInfo`).
pub fn to_camel(name: &str) -> String {
    name.to_upper_camel_case()
}

/// Lower camel case of an exported name, keeping a leading initialism lower-cased whole
/// (`ID` → `id`, `UserName` → `userName`, `URLPath` → `urlPath`).
pub fn to_lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut leading = true;
    for word in split_camel_words(name) {
        let single = word.chars().count() == 1;
        if leading && (single || out.is_empty()) {
            out.push_str(&word.to_lowercase());
            leading = single;
        } else {
            out.push_str(word);
            leading = false;
        }
    }
    out
}

/// Route name of an exported struct name in the configured style.
pub fn to_route_name(struct_name: &str, style: RouteStyle) -> String {
    match style {
        RouteStyle::Snake => struct_name.to_snake_case(),
        RouteStyle::Kebab => struct_name.to_kebab_case(),
    }
}

/// Abbreviation made of the lower-cased capitals of the camel form (`UserInfo` → `ui`).
pub fn to_abbr(name: &str) -> String {
    to_camel(name.trim())
        .chars()
        .filter(char::is_ascii_uppercase)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Plural of an identifier.
///
/// A trailing all-caps initialism gets a bare `s` (`ID` → `IDs`, `UserID` → `UserIDs`);
/// everything else goes through the inflector (`id` → `ids`, `category` → `categories`).
pub fn pluralize(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let trailing_caps = name
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .count();
    if trailing_caps > 1 {
        return format!("{name}s");
    }
    pluralizer::pluralize(name, 2, false)
}
