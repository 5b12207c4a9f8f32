use std::{collections::BTreeSet, sync::LazyLock};

use regex::Regex;

static COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/([A-Za-z0-9_-]+)").expect("command pattern is valid"));

const REVIEWER_DELIMITERS: [char; 4] = [' ', ',', ';', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// The command name, without its leading `/`.
    pub name: &'a str,
    /// Everything after the name, untouched. Commands trim it themselves.
    pub args: &'a str,
}

/// Extracts the `/name` token a comment starts with.
///
/// Returns `None` when the comment doesn't start with `/`, or when no name follows it (`/`,
/// `/ request`, `/!`).
pub fn parse_command(body: &str) -> Option<ParsedCommand<'_>> {
    let name = COMMAND.captures(body)?.get(1)?;

    Some(ParsedCommand {
        name: name.as_str(),
        args: &body[name.end()..],
    })
}

/// Splits the argument line of a reviewer command into GitHub logins.
///
/// Only the first line is considered, the rest of the comment is free text. Logins may be
/// separated by spaces, commas, semicolons or colons, and written as `@mentions`.
pub fn split_reviewers(args: &str) -> BTreeSet<String> {
    args.lines()
        .next()
        .unwrap_or_default()
        .split(REVIEWER_DELIMITERS)
        .map(str::trim)
        .map(|token| token.strip_prefix('@').unwrap_or(token))
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .collect()
}
