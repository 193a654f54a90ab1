//! Resource templates.
//!
//! A resource template names the gateway resource a path belongs to:
//!
//! ```text
//! /users/{id}          matches /users/42           -> {"id": "42"}
//! /files/{proxy+}      matches /files/a/b/c.txt    -> {"proxy": "a/b/c.txt"}
//! ```
//!
//! `{name}` captures exactly one non-empty segment. `{name+}` must be the last
//! segment and captures one or more remaining segments. Without a matching
//! template the event's `resource` is the path itself and `pathParameters`
//! is `null`.

use std::collections::BTreeMap;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Greedy(String),
}

/// A parsed resource template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse a template such as `/users/{id}`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidTemplate {
            template: raw.to_owned(),
            reason,
        };

        let body = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        let parts: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (idx, part) in parts.iter().enumerate() {
            let segment = match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => match name.strip_suffix('+') {
                    Some(greedy) => {
                        if idx + 1 != parts.len() {
                            return Err(invalid("greedy parameter must be the last segment"));
                        }
                        Segment::Greedy(greedy.to_owned())
                    }
                    None => Segment::Param(name.to_owned()),
                },
                None => {
                    if part.contains(['{', '}']) {
                        return Err(invalid("parameters must span a whole segment"));
                    }
                    Segment::Literal((*part).to_owned())
                }
            };
            if let Segment::Param(name) | Segment::Greedy(name) = &segment {
                if name.is_empty() {
                    return Err(invalid("parameter name must not be empty"));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: raw.to_owned(),
            segments,
        })
    }

    /// The template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning the captured parameters.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let body = path.strip_prefix('/')?;
        let parts: Vec<&str> = body.split('/').collect();
        let mut params = BTreeMap::new();

        for (idx, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(lit) => {
                    if parts.get(idx) != Some(&lit.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(idx).filter(|v| !v.is_empty())?;
                    params.insert(name.clone(), (*value).to_owned());
                }
                Segment::Greedy(name) => {
                    let rest = parts.get(idx..)?.join("/");
                    if rest.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), rest);
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

/// Ordered list of resource templates; the first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    templates: Vec<RouteTemplate>,
}

/// Result of resolving a path against a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResource {
    /// Resource template, or the path when nothing matched.
    pub resource: String,
    /// Captures; `None` when nothing matched.
    pub path_parameters: Option<BTreeMap<String, String>>,
}

impl RouteTable {
    /// Parse all templates, failing on the first invalid one.
    pub fn from_templates<S: AsRef<str>>(raw: &[S]) -> Result<Self, ConfigError> {
        let templates = raw
            .iter()
            .map(|t| RouteTemplate::parse(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { templates })
    }

    /// Resolve the resource for `path`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> ResolvedResource {
        self.templates
            .iter()
            .find_map(|t| {
                t.matches(path).map(|params| ResolvedResource {
                    resource: t.as_str().to_owned(),
                    path_parameters: Some(params),
                })
            })
            .unwrap_or_else(|| ResolvedResource {
                resource: path.to_owned(),
                path_parameters: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(raw: &[&str]) -> RouteTable {
        RouteTable::from_templates(raw).unwrap()
    }

    #[test]
    fn test_should_capture_single_segment() {
        let resolved = table(&["/users/{id}"]).resolve("/users/42");
        assert_eq!(resolved.resource, "/users/{id}");
        assert_eq!(resolved.path_parameters.unwrap()["id"], "42");
    }

    #[test]
    fn test_should_capture_greedy_tail() {
        let resolved = table(&["/files/{proxy+}"]).resolve("/files/a/b/c.txt");
        assert_eq!(resolved.path_parameters.unwrap()["proxy"], "a/b/c.txt");
    }

    #[test]
    fn test_should_not_match_empty_greedy_tail() {
        let resolved = table(&["/files/{proxy+}"]).resolve("/files/");
        assert_eq!(resolved.resource, "/files/");
        assert!(resolved.path_parameters.is_none());
    }

    #[test]
    fn test_should_fall_back_to_path() {
        let resolved = table(&["/users/{id}"]).resolve("/users/42/orders");
        assert_eq!(resolved.resource, "/users/42/orders");
        assert!(resolved.path_parameters.is_none());
    }

    #[test]
    fn test_should_prefer_first_matching_template() {
        let resolved = table(&["/users/me", "/users/{id}"]).resolve("/users/me");
        assert_eq!(resolved.resource, "/users/me");
        assert_eq!(resolved.path_parameters, Some(BTreeMap::new()));
    }

    #[test]
    fn test_should_match_root_template() {
        let resolved = table(&["/"]).resolve("/");
        assert_eq!(resolved.resource, "/");
        assert!(table(&["/"]).resolve("/x").path_parameters.is_none());
    }

    #[test]
    fn test_should_reject_invalid_templates() {
        assert!(RouteTemplate::parse("users/{id}").is_err());
        assert!(RouteTemplate::parse("/files/{proxy+}/tail").is_err());
        assert!(RouteTemplate::parse("/users/{}").is_err());
        assert!(RouteTemplate::parse("/users/id-{id}").is_err());
    }
}
