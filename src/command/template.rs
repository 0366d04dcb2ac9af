// src/command/template.rs

//! `{{TOKEN}}` substitution for rendered settings files.
//!
//! Recognised tokens: `CONTEXT`, `URL`, `THREAD_COUNT`, `LABEL`, `PUBLIC_ID`.
//! Unknown tokens are copied through verbatim so a template can carry
//! placeholders meant for another tool.

use std::borrow::Cow;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::model::Rig;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Z_]+)\s*\}\}").expect("template token pattern is valid")
});

/// Value substituted for `token`, or `None` if the token is unknown.
fn lookup<'a>(rig: &'a Rig, token: &str) -> Option<&'a str> {
    match token {
        "CONTEXT" => Some(&rig.context),
        "URL" => Some(&rig.url),
        "THREAD_COUNT" => Some(&rig.thread_count),
        "LABEL" => Some(&rig.label),
        "PUBLIC_ID" => Some(&rig.public_id),
        _ => None,
    }
}

/// Render `template` for one rig.
pub fn render(template: &str, rig: &Rig) -> String {
    let rendered = TOKEN_PATTERN.replace_all(template, |caps: &Captures| {
        match lookup(rig, &caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });

    match rendered {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

/// File-name-safe form of a context.
///
/// `[A-Za-z0-9.-]` is kept; every other byte, `_` included, becomes `_XX`
/// (uppercase hex). Distinct contexts therefore always give distinct names.
pub fn sanitize_for_file_name(context: &str) -> String {
    let mut out = String::with_capacity(context.len());
    for byte in context.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'.' | b'-') {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "_{byte:02X}");
        }
    }
    out
}
