//! Argument matchers for mocked calls
//!
//! A stub registered with a matcher is stored under the matcher's key; an
//! actual call argument is mapped to the key it would be looked up under.

use std::fmt;

use regex::Regex;

/// Wildcard matcher keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatcherKey {
    Any,
    AnyString,
    AnyBoolean,
    AnyNumber,
    AnyObject,
    AnyFunction,
}

impl MatcherKey {
    pub fn as_str(self) -> &'static str {
        match self {
            MatcherKey::Any => "<any>",
            MatcherKey::AnyString => "<any String>",
            MatcherKey::AnyBoolean => "<any Boolean>",
            MatcherKey::AnyNumber => "<any Number>",
            MatcherKey::AnyObject => "<any Object>",
            MatcherKey::AnyFunction => "<any Function>",
        }
    }
}

impl fmt::Display for MatcherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key a stub was registered under
#[derive(Debug, Clone)]
pub enum StubKey {
    Matcher(MatcherKey),
    Regex(Regex),
}

impl StubKey {
    /// Build a regex stub key; rejects invalid patterns
    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(StubKey::Regex)
    }

    /// Key the stub is stored under: the matcher string, or the pattern itself
    pub fn key(&self) -> &str {
        match self {
            StubKey::Matcher(matcher) => matcher.as_str(),
            StubKey::Regex(regex) => regex.as_str(),
        }
    }
}

/// A call argument, by runtime type
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a> {
    String(&'a str),
    Boolean(bool),
    Number(f64),
    Object(&'a serde_json::Value),
    Function,
    Undefined,
}

/// What an argument resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKey {
    Matcher(MatcherKey),
    RegexMatch(bool),
}

/// Map a call argument to its stub lookup key
///
/// A stub registered with `Any` matches everything. Without a regex the
/// argument's type picks the matcher; a string with a regex yields whether
/// it matched.
pub fn return_key(
    argument: &Argument<'_>,
    regex: Option<&Regex>,
    stub_key: Option<&StubKey>,
) -> Option<ReturnKey> {
    if let Some(StubKey::Matcher(MatcherKey::Any)) = stub_key {
        return Some(ReturnKey::Matcher(MatcherKey::Any));
    }

    match (argument, regex) {
        (Argument::String(s), Some(regex)) => Some(ReturnKey::RegexMatch(regex.is_match(s))),
        (_, Some(_)) => None,
        (Argument::String(_), None) => Some(ReturnKey::Matcher(MatcherKey::AnyString)),
        (Argument::Boolean(_), None) => Some(ReturnKey::Matcher(MatcherKey::AnyBoolean)),
        (Argument::Number(_), None) => Some(ReturnKey::Matcher(MatcherKey::AnyNumber)),
        (Argument::Object(_), None) => Some(ReturnKey::Matcher(MatcherKey::AnyObject)),
        (Argument::Function, None) => Some(ReturnKey::Matcher(MatcherKey::AnyFunction)),
        (Argument::Undefined, None) => None,
    }
}
