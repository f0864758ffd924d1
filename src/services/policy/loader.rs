//! Parsing of the human-editable policy resources.
//!
//! Two files back the engine:
//! - model: `key = value` lines, currently just `matcher = exact|prefix|glob`
//! - grants: CSV lines `role, path-pattern, action`
//!
//! `#` starts a comment in both files; blank lines are ignored.

use std::fs;
use std::path::Path;

use super::error::PolicyError;
use super::matcher::MatcherKind;

/// Matching rules shared by every grant in the table.
#[derive(Debug, Clone, Copy)]
pub struct Model {
    pub matcher: MatcherKind,
}

/// One policy assignment: (role, path pattern, action).
///
/// `action` is an HTTP method name or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub role: String,
    pub pattern: String,
    pub action: String,
}

pub fn parse_model(text: &str) -> Result<Model, PolicyError> {
    let mut matcher = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| PolicyError::Model(format!("line {}: expected `key = value`", idx + 1)))?;
        match key {
            "matcher" => {
                matcher = Some(MatcherKind::parse(value).ok_or_else(|| {
                    PolicyError::Model(format!("line {}: unknown matcher `{}`", idx + 1, value))
                })?);
            }
            other => {
                return Err(PolicyError::Model(format!(
                    "line {}: unknown key `{}`",
                    idx + 1,
                    other
                )));
            }
        }
    }

    let matcher = matcher.ok_or_else(|| PolicyError::Model("missing `matcher`".into()))?;
    Ok(Model { matcher })
}

pub fn parse_grants(text: &str) -> Result<Vec<Grant>, PolicyError> {
    let mut grants = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = strip_comment(raw);
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let [role, pattern, action] = fields.as_slice() else {
            return Err(PolicyError::Grants(format!(
                "line {}: expected `role, path-pattern, action`, got {} fields",
                idx + 1,
                fields.len()
            )));
        };
        if role.is_empty() || pattern.is_empty() || action.is_empty() {
            return Err(PolicyError::Grants(format!("line {}: empty field", idx + 1)));
        }
        grants.push(Grant {
            role: role.to_string(),
            pattern: pattern.to_string(),
            action: action.to_string(),
        });
    }

    Ok(grants)
}

pub fn load_model(path: &Path) -> Result<Model, PolicyError> {
    let text = fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_model(&text)
}

pub fn load_grants(path: &Path) -> Result<Vec<Grant>, PolicyError> {
    let text = fs::read_to_string(path).map_err(|source| PolicyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_grants(&text)
}

fn strip_comment(line: &str) -> &str {
    match line.split_once('#') {
        Some((before, _)) => before.trim(),
        None => line.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_with_comments() {
        let model = parse_model("# matching rules\nmatcher = glob\n").unwrap();
        assert_eq!(model.matcher, MatcherKind::Glob);
    }

    #[test]
    fn rejects_unknown_matcher() {
        let err = parse_model("matcher = regex\n").unwrap_err();
        assert!(matches!(err, PolicyError::Model(_)));
    }

    #[test]
    fn rejects_missing_matcher() {
        let err = parse_model("# empty\n").unwrap_err();
        assert!(matches!(err, PolicyError::Model(_)));
    }

    #[test]
    fn parses_grants_skipping_comments_and_blanks() {
        let grants = parse_grants(
            "# public endpoints\nunauthorized, /health, GET\n\nadmin, /users/*, *  # full access\n",
        )
        .unwrap();
        assert_eq!(grants.len(), 2);
        assert_eq!(
            grants[0],
            Grant {
                role: "unauthorized".into(),
                pattern: "/health".into(),
                action: "GET".into(),
            }
        );
        assert_eq!(grants[1].action, "*");
    }

    #[test]
    fn rejects_wrong_field_count() {
        let err = parse_grants("admin, /users\n").unwrap_err();
        assert!(matches!(err, PolicyError::Grants(_)));
    }

    #[test]
    fn rejects_empty_field() {
        let err = parse_grants("admin, , GET\n").unwrap_err();
        assert!(matches!(err, PolicyError::Grants(_)));
    }
}
