//! `${name:default}` expansion against a parent scope and an ambient fallback.

use crate::{AmbientLookup, MergedProperties, PropertyLayer, ResolutionOptions, ResolveError};

/// Read-only lookup view used while expanding one layer.
///
/// Names are looked up in the parent's resolved properties first, then in
/// the ambient scope, then (when attached) in the layer's own raw values.
#[derive(Clone, Copy)]
pub struct ResolutionScope<'a> {
    parent: &'a MergedProperties,
    ambient: &'a dyn AmbientLookup,
    siblings: Option<&'a PropertyLayer>,
    /// Key of the layer entry being expanded; never its own fallback.
    current_key: Option<&'a str>,
}

impl<'a> ResolutionScope<'a> {
    pub fn new(parent: &'a MergedProperties, ambient: &'a dyn AmbientLookup) -> Self {
        Self {
            parent,
            ambient,
            siblings: None,
            current_key: None,
        }
    }

    /// Attach the raw layer being expanded as the last-resort source.
    pub fn with_siblings(mut self, siblings: &'a PropertyLayer) -> Self {
        self.siblings = Some(siblings);
        self
    }

    /// Mark `key` as the entry being expanded, so `${key}` inside its own
    /// value skips the sibling fallback and takes its default instead.
    pub fn for_key(mut self, key: &'a str) -> Self {
        self.current_key = Some(key);
        self
    }

    /// Parent value, else ambient value.
    pub fn lookup(&self, name: &str) -> Option<String> {
        self.parent
            .get(name)
            .map(str::to_string)
            .or_else(|| self.ambient.lookup(name))
    }

    fn sibling(&self, name: &str) -> Option<&'a str> {
        self.siblings?.get(name).map(String::as_str)
    }
}

/// Expand every placeholder in `raw`.
///
/// Values found in the parent or ambient scope are substituted verbatim and
/// never re-expanded; sibling values are raw and get expanded on use. The
/// inner text of an expression (name and default alike) is expanded before
/// lookup, so `${a.${b}}` and `${a:${b}}` both work.
pub fn expand_placeholders(
    raw: &str,
    scope: &ResolutionScope<'_>,
    options: &ResolutionOptions,
) -> Result<String, ResolveError> {
    let mut visiting: Vec<String> = scope.current_key.map(str::to_string).into_iter().collect();
    PlaceholderParser::new(options)
        .parse(raw, scope, &mut visiting)
        .map_err(|err| match err {
            ResolveError::UnresolvedPlaceholder { name, .. } => {
                ResolveError::UnresolvedPlaceholder {
                    name,
                    value: raw.to_string(),
                }
            }
            other => other,
        })
}

struct PlaceholderParser<'a> {
    prefix: &'a str,
    suffix: &'a str,
    /// Opener that raises nesting depth inside an open expression.
    simple_prefix: &'a str,
    separator: &'a str,
    ignore_unresolvable: bool,
}

impl<'a> PlaceholderParser<'a> {
    fn new(options: &'a ResolutionOptions) -> Self {
        let prefix = options.placeholder_prefix.as_str();
        let suffix = options.placeholder_suffix.as_str();
        Self {
            prefix,
            suffix,
            simple_prefix: simple_prefix(prefix, suffix),
            separator: options.value_separator.as_str(),
            ignore_unresolvable: options.ignore_unresolvable,
        }
    }

    /// `visiting` holds sibling names currently being expanded, innermost last.
    fn parse(
        &self,
        value: &str,
        scope: &ResolutionScope<'_>,
        visiting: &mut Vec<String>,
    ) -> Result<String, ResolveError> {
        let mut result = value.to_string();
        let mut start = find_from(&result, self.prefix, 0);

        while let Some(start_index) = start {
            let Some(end_index) = self.find_end(&result, start_index) else {
                break;
            };
            let expression = self.parse(
                &result[start_index + self.prefix.len()..end_index],
                scope,
                visiting,
            )?;
            let placeholder_end = end_index + self.suffix.len();

            match self.resolve_expression(&expression, scope, visiting)? {
                Some(resolved) => {
                    result.replace_range(start_index..placeholder_end, &resolved);
                    start = find_from(&result, self.prefix, start_index + resolved.len());
                }
                None if self.ignore_unresolvable => {
                    start = find_from(&result, self.prefix, placeholder_end);
                }
                None => {
                    return Err(ResolveError::UnresolvedPlaceholder {
                        name: expression,
                        value: value.to_string(),
                    });
                }
            }
        }
        Ok(result)
    }

    /// Whole expression first, then `name` with `default` as the fallback.
    fn resolve_expression(
        &self,
        expression: &str,
        scope: &ResolutionScope<'_>,
        visiting: &mut Vec<String>,
    ) -> Result<Option<String>, ResolveError> {
        if let Some(found) = self.lookup(expression, scope, visiting)? {
            return Ok(Some(found));
        }
        if self.separator.is_empty() {
            return Ok(None);
        }
        let Some((name, default)) = expression.split_once(self.separator) else {
            return Ok(None);
        };
        Ok(self
            .lookup(name, scope, visiting)?
            .or_else(|| Some(default.to_string())))
    }

    fn lookup(
        &self,
        name: &str,
        scope: &ResolutionScope<'_>,
        visiting: &mut Vec<String>,
    ) -> Result<Option<String>, ResolveError> {
        if let Some(found) = scope.lookup(name) {
            return Ok(Some(found));
        }
        let Some(raw) = scope.sibling(name) else {
            return Ok(None);
        };
        if visiting.last().is_some_and(|current| current == name) {
            return Ok(None);
        }
        if visiting.iter().any(|seen| seen == name) {
            return Err(ResolveError::CircularPlaceholder {
                name: name.to_string(),
            });
        }
        visiting.push(name.to_string());
        let expanded = self.parse(raw, scope, visiting)?;
        visiting.pop();
        Ok(Some(expanded))
    }

    /// Index of the suffix closing the expression opened at `start`.
    fn find_end(&self, buf: &str, start: usize) -> Option<usize> {
        let bytes = buf.as_bytes();
        let suffix = self.suffix.as_bytes();
        let opener = self.simple_prefix.as_bytes();
        let mut index = start + self.prefix.len();
        let mut nested = 0usize;

        while index < bytes.len() {
            let rest = &bytes[index..];
            if rest.starts_with(suffix) {
                if nested == 0 {
                    return Some(index);
                }
                nested -= 1;
                index += suffix.len();
            } else if rest.starts_with(opener) {
                nested += 1;
                index += opener.len();
            } else {
                index += 1;
            }
        }
        None
    }
}

/// `{` for a `${`/`}` pair (likewise `[`/`]`, `(`/`)`), else the full prefix.
fn simple_prefix<'a>(prefix: &'a str, suffix: &str) -> &'a str {
    let opener = match suffix {
        "}" => "{",
        "]" => "[",
        ")" => "(",
        _ => return prefix,
    };
    if prefix.ends_with(opener) {
        &prefix[prefix.len() - opener.len()..]
    } else {
        prefix
    }
}

fn find_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .find(needle)
        .map(|index| index + from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NoAmbient;
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, HashMap};

    fn parent() -> MergedProperties {
        MergedProperties::from(BTreeMap::from([
            ("user.name".to_string(), "kwon37xi".to_string()),
            ("user.email".to_string(), "kwon37xi@gmail.com".to_string()),
            ("user.home".to_string(), "/home/kwon37xi".to_string()),
            ("env".to_string(), "prod".to_string()),
            ("db.prod.url".to_string(), "jdbc:prod".to_string()),
            ("raw".to_string(), "${not.expanded}".to_string()),
        ]))
    }

    fn expand(raw: &str, options: &ResolutionOptions) -> Result<String, ResolveError> {
        let parent = parent();
        let scope = ResolutionScope::new(&parent, &NoAmbient);
        expand_placeholders(raw, &scope, options)
    }

    fn strict(raw: &str) -> String {
        expand(raw, &ResolutionOptions::default()).expect("expand")
    }

    #[test]
    fn substitutes_parent_values() {
        assert_eq!(strict("${user.name}"), "kwon37xi");
        assert_eq!(strict("${user.email}"), "kwon37xi@gmail.com");
        assert_eq!(strict("${user.home}/tmp"), "/home/kwon37xi/tmp");
        assert_eq!(strict("no placeholders"), "no placeholders");
    }

    #[test]
    fn default_used_only_when_missing() {
        assert_eq!(strict("${user.my.home:/home/user}/test"), "/home/user/test");
        assert_eq!(strict("${user.home:/home/user}/test"), "/home/kwon37xi/test");
        assert_eq!(strict("${missing:}"), "");
    }

    #[test]
    fn default_splits_on_first_separator() {
        assert_eq!(strict("${missing:jdbc:h2:mem}"), "jdbc:h2:mem");
    }

    #[test]
    fn strict_mode_fails_on_missing_name() {
        let err = expand("${user.not.exists}", &ResolutionOptions::default()).unwrap_err();
        match err {
            ResolveError::UnresolvedPlaceholder { name, value } => {
                assert_eq!(name, "user.not.exists");
                assert_eq!(value, "${user.not.exists}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_mode_keeps_literal() {
        let options = ResolutionOptions::default().with_ignore_unresolvable(true);
        assert_eq!(
            expand("${user.not.exists}/hello", &options).expect("expand"),
            "${user.not.exists}/hello"
        );
        assert_eq!(
            expand("${missing}-${user.name}", &options).expect("expand"),
            "${missing}-kwon37xi"
        );
    }

    #[test]
    fn nested_name_is_expanded_first() {
        assert_eq!(strict("${db.${env}.url}"), "jdbc:prod");
    }

    #[test]
    fn nested_default_is_expanded() {
        assert_eq!(strict("${missing:${user.name}}"), "kwon37xi");
        assert_eq!(strict("${missing:${also.missing:fallback}}"), "fallback");
    }

    #[test]
    fn braces_inside_expression_balance() {
        assert_eq!(strict("${missing:{a}}"), "{a}");
    }

    #[test]
    fn found_values_are_not_re_expanded() {
        assert_eq!(strict("${raw}"), "${not.expanded}");
    }

    #[test]
    fn repeated_placeholders_resolve_identically() {
        assert_eq!(strict("${user.name}/${user.name}"), "kwon37xi/kwon37xi");
    }

    #[test]
    fn unterminated_prefix_is_literal() {
        assert_eq!(strict("${user.name"), "${user.name");
        assert_eq!(strict("a ${user.name} ${open"), "a kwon37xi ${open");
    }

    #[test]
    fn multibyte_text_around_placeholders() {
        assert_eq!(strict("안녕 ${user.name}! 세상아"), "안녕 kwon37xi! 세상아");
    }

    #[test]
    fn custom_syntax() {
        let options = ResolutionOptions::default()
            .with_placeholder_prefix("#[")
            .with_placeholder_suffix("]")
            .with_value_separator("?:");
        assert_eq!(expand("#[user.name]", &options).expect("expand"), "kwon37xi");
        assert_eq!(expand("#[missing?:x:y]", &options).expect("expand"), "x:y");
        assert_eq!(expand("${user.name}", &options).expect("expand"), "${user.name}");
    }

    #[test]
    fn empty_separator_disables_defaults() {
        let options = ResolutionOptions::default().with_value_separator("");
        let err = expand("${missing:d}", &options).unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedPlaceholder { .. }));
    }

    #[test]
    fn parent_wins_over_ambient() {
        let parent = MergedProperties::from(BTreeMap::from([(
            "u".to_string(),
            "A".to_string(),
        )]));
        let ambient = HashMap::from([
            ("u".to_string(), "B".to_string()),
            ("only.ambient".to_string(), "C".to_string()),
        ]);
        let scope = ResolutionScope::new(&parent, &ambient);
        let options = ResolutionOptions::default();
        assert_eq!(expand_placeholders("${u}", &scope, &options).expect("u"), "A");
        assert_eq!(
            expand_placeholders("${only.ambient}", &scope, &options).expect("ambient"),
            "C"
        );
    }

    #[test]
    fn siblings_are_the_last_fallback() {
        let parent = parent();
        let siblings = PropertyLayer::from([
            ("user.name".to_string(), "sibling".to_string()),
            ("project".to_string(), "P-${user.name}".to_string()),
        ]);
        let scope = ResolutionScope::new(&parent, &NoAmbient).with_siblings(&siblings);
        let options = ResolutionOptions::default();
        assert_eq!(
            expand_placeholders("${user.name}", &scope, &options).expect("parent"),
            "kwon37xi"
        );
        assert_eq!(
            expand_placeholders("${project:none}", &scope, &options).expect("sibling"),
            "P-kwon37xi"
        );
    }

    #[test]
    fn circular_siblings_fail() {
        let parent = MergedProperties::new();
        let siblings = PropertyLayer::from([
            ("a".to_string(), "${b}".to_string()),
            ("b".to_string(), "${a}".to_string()),
        ]);
        let scope = ResolutionScope::new(&parent, &NoAmbient).with_siblings(&siblings);
        let err = expand_placeholders("${a}", &scope, &ResolutionOptions::default()).unwrap_err();
        assert!(matches!(err, ResolveError::CircularPlaceholder { .. }));
    }

    #[test]
    fn nested_failure_reports_whole_value() {
        let err = expand("url=${db.${stage}.url}", &ResolutionOptions::default()).unwrap_err();
        match err {
            ResolveError::UnresolvedPlaceholder { name, value } => {
                assert_eq!(name, "stage");
                assert_eq!(value, "url=${db.${stage}.url}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn current_key_is_not_its_own_sibling() {
        let parent = MergedProperties::new();
        let siblings = PropertyLayer::from([("a".to_string(), "${a:fallback}".to_string())]);
        let scope = ResolutionScope::new(&parent, &NoAmbient)
            .with_siblings(&siblings)
            .for_key("a");
        assert_eq!(
            expand_placeholders("${a:fallback}", &scope, &ResolutionOptions::default())
                .expect("expand"),
            "fallback"
        );
    }

    #[test]
    fn simple_prefix_pairs() {
        assert_eq!(simple_prefix("${", "}"), "{");
        assert_eq!(simple_prefix("#[", "]"), "[");
        assert_eq!(simple_prefix("%%", "%%"), "%%");
    }
}
