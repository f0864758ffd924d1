//! Resource-path matching for policy grants.
//!
//! The model file selects one matcher for the whole grant table. Grants
//! written for one matcher are not reinterpreted under another.

use std::fmt;

/// How a grant's path pattern is compared against the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// Pattern and path must be byte-equal.
    Exact,
    /// Pattern must be a prefix of the path.
    Prefix,
    /// Segment-wise matching: `*` matches one path segment, a trailing `*`
    /// matches one or more remaining segments.
    Glob,
}

impl MatcherKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "prefix" => Some(Self::Prefix),
            "glob" => Some(Self::Glob),
            _ => None,
        }
    }

    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        match self {
            Self::Exact => pattern == path,
            Self::Prefix => path.starts_with(pattern),
            Self::Glob => glob_match(pattern, path),
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exact => "exact",
            Self::Prefix => "prefix",
            Self::Glob => "glob",
        };
        f.write_str(name)
    }
}

fn glob_match(pattern: &str, path: &str) -> bool {
    let pat: Vec<&str> = pattern.split('/').collect();
    let segs: Vec<&str> = path.split('/').collect();

    for (i, p) in pat.iter().enumerate() {
        // A trailing `*` swallows the rest of the path, but `/users/*`
        // does not match `/users` itself.
        if *p == "*" && i == pat.len() - 1 {
            return segs.len() > i;
        }
        match segs.get(i) {
            Some(s) if *p == "*" || p == s => continue,
            _ => return false,
        }
    }
    segs.len() == pat.len()
}
