//! Path-template trie used by the registry, one per HTTP method.
//!
//! Template segments:
//! - `literal`: matches the identical segment text
//! - `{name}`: named wildcard, the matched segment is captured under `name`
//! - `*`: plain wildcard, matches one segment without capturing
//! - `$key`: literal placeholder replaced by `substitutes[key]` at insert time
//!
//! Lookup is a depth-first search that prefers literal > named > plain at each
//! level and backtracks out of dead ends, so the most specific template that
//! consumes the whole path wins.

use crate::error::SpecError;
use std::collections::HashMap;

/// Plain (non-capturing) wildcard segment.
pub const WILDCARD: &str = "*";

/// Split a path into its non-empty segments. Leading, trailing and doubled
/// separators are ignored.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Name of a `{name}` segment, or `None` for any other segment.
pub fn wildcard_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .filter(|name| !name.is_empty())
}

enum Segment {
    Literal(String),
    Named(String),
    Wildcard,
}

fn parse_segment(raw: &str, substitutes: &HashMap<String, String>) -> Result<Segment, SpecError> {
    if let Some(key) = raw.strip_prefix('$') {
        return substitutes
            .get(key)
            .map(|s| Segment::Literal(s.clone()))
            .ok_or_else(|| SpecError::Invalid(format!("no substitute provided for ${}", key)));
    }
    if raw == WILDCARD {
        return Ok(Segment::Wildcard);
    }
    if let Some(name) = wildcard_name(raw) {
        let name = substitutes.get(name).map(String::as_str).unwrap_or(name);
        return Ok(Segment::Named(name.to_string()));
    }
    Ok(Segment::Literal(raw.to_string()))
}

#[derive(Debug)]
struct Terminal<T> {
    value: T,
    /// Capture names of this template, in the order its named wildcards occur.
    captures: Vec<String>,
}

#[derive(Debug)]
struct Node<T> {
    literals: HashMap<String, Node<T>>,
    named: Option<Box<Node<T>>>,
    wildcard: Option<Box<Node<T>>>,
    terminal: Option<Terminal<T>>,
}

impl<T> Node<T> {
    fn new() -> Self {
        Self {
            literals: HashMap::new(),
            named: None,
            wildcard: None,
            terminal: None,
        }
    }

    fn find<'n, 'p>(&'n self, segments: &[&'p str], taken: &mut Vec<&'p str>) -> Option<&'n Terminal<T>> {
        let Some((first, rest)) = segments.split_first() else {
            return self.terminal.as_ref();
        };
        if let Some(child) = self.literals.get(*first) {
            if let Some(found) = child.find(rest, taken) {
                return Some(found);
            }
        }
        if let Some(child) = &self.named {
            taken.push(*first);
            if let Some(found) = child.find(rest, taken) {
                return Some(found);
            }
            taken.pop();
        }
        self.wildcard.as_ref().and_then(|child| child.find(rest, taken))
    }
}

/// Prefix tree from path templates to registered values.
#[derive(Debug)]
pub struct PathTrie<T> {
    root: Node<T>,
}

impl<T> Default for PathTrie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PathTrie<T> {
    pub fn new() -> Self {
        Self { root: Node::new() }
    }

    /// Register `value` under `template`, replacing any value already stored for
    /// the same template. Nothing is inserted when the template is rejected.
    pub fn insert(&mut self, template: &str, substitutes: &HashMap<String, String>, value: T) -> Result<(), SpecError> {
        let segments = path_segments(template)
            .into_iter()
            .map(|raw| parse_segment(raw, substitutes))
            .collect::<Result<Vec<_>, _>>()?;

        let mut captures: Vec<String> = Vec::new();
        for segment in &segments {
            if let Segment::Named(name) = segment {
                if captures.contains(name) {
                    return Err(SpecError::Invalid(format!(
                        "duplicate wildcard name '{}' in path {}",
                        name, template
                    )));
                }
                captures.push(name.clone());
            }
        }

        let mut node = &mut self.root;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.literals.entry(text).or_insert_with(Node::new),
                Segment::Named(_) => &mut **node.named.get_or_insert_with(|| Box::new(Node::new())),
                Segment::Wildcard => &mut **node.wildcard.get_or_insert_with(|| Box::new(Node::new())),
            };
        }
        node.terminal = Some(Terminal { value, captures });
        Ok(())
    }

    /// Find the value whose template matches all of `path`. Named-wildcard
    /// captures of the matching template are written to `captures`; nothing is
    /// written on a miss.
    pub fn lookup(&self, path: &str, captures: &mut HashMap<String, String>) -> Option<&T> {
        let segments = path_segments(path);
        let mut taken = Vec::new();
        let terminal = self.root.find(&segments, &mut taken)?;
        for (name, value) in terminal.captures.iter().zip(taken) {
            captures.insert(name.clone(), value.to_string());
        }
        Some(&terminal.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_subs() -> HashMap<String, String> {
        HashMap::new()
    }

    fn trie(templates: &[&'static str]) -> PathTrie<&'static str> {
        let mut t = PathTrie::new();
        for tpl in templates {
            t.insert(tpl, &no_subs(), *tpl).unwrap();
        }
        t
    }

    #[test]
    fn literal_beats_named_wildcard() {
        let t = trie(&["/c/{collection}", "/c/_list"]);
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("/c/_list", &mut caps), Some(&"/c/_list"));
        assert!(caps.is_empty());
        assert_eq!(t.lookup("/c/films", &mut caps), Some(&"/c/{collection}"));
        assert_eq!(caps.get("collection").map(String::as_str), Some("films"));
    }

    #[test]
    fn named_wildcard_beats_plain_wildcard() {
        let t = trie(&["/a/*", "/a/{name}"]);
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("/a/x", &mut caps), Some(&"/a/{name}"));
        assert_eq!(caps["name"], "x");
    }

    #[test]
    fn captures_every_named_segment() {
        let t = trie(&["/c/{x}/shards/{y}"]);
        let mut caps = HashMap::new();
        assert!(t.lookup("/c/films/shards/shard1", &mut caps).is_some());
        assert_eq!(caps.len(), 2);
        assert_eq!(caps["x"], "films");
        assert_eq!(caps["y"], "shard1");
    }

    #[test]
    fn partial_prefix_is_a_miss() {
        let t = trie(&["/c/{collection}/shards"]);
        let mut caps = HashMap::new();
        assert!(t.lookup("/c/films", &mut caps).is_none());
        assert!(t.lookup("/c/films/shards/extra", &mut caps).is_none());
        assert!(t.lookup("/c", &mut caps).is_none());
        assert!(caps.is_empty());
    }

    #[test]
    fn backtracks_out_of_literal_dead_end() {
        let t = trie(&["/c/_list/items", "/c/{collection}/config"]);
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("/c/_list/config", &mut caps), Some(&"/c/{collection}/config"));
        assert_eq!(caps["collection"], "_list");
    }

    #[test]
    fn failed_branches_discard_their_captures() {
        let t = trie(&["/n/{a}/{b}/leaf", "/n/*/x/other"]);
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("/n/1/x/other", &mut caps), Some(&"/n/*/x/other"));
        assert!(caps.is_empty());
    }

    #[test]
    fn templates_sharing_a_wildcard_keep_their_own_names() {
        let t = trie(&["/c/{collection}", "/c/{name}/props"]);
        let mut caps = HashMap::new();
        t.lookup("/c/films/props", &mut caps).unwrap();
        assert_eq!(caps.get("name").map(String::as_str), Some("films"));
        assert!(!caps.contains_key("collection"));
    }

    #[test]
    fn literal_template_matches_only_itself() {
        let t = trie(&["/cluster/overseer"]);
        let mut caps = HashMap::new();
        assert!(t.lookup("cluster/overseer/", &mut caps).is_some());
        assert!(t.lookup("//cluster//overseer", &mut caps).is_some());
        assert!(t.lookup("/cluster/other", &mut caps).is_none());
    }

    #[test]
    fn root_template_matches_empty_path() {
        let t = trie(&["/"]);
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("", &mut caps), Some(&"/"));
    }

    #[test]
    fn reinsert_replaces_value() {
        let mut t = PathTrie::new();
        t.insert("/a/{x}", &no_subs(), 1).unwrap();
        t.insert("/a/{x}", &no_subs(), 2).unwrap();
        assert_eq!(t.lookup("/a/b", &mut HashMap::new()), Some(&2));
    }

    #[test]
    fn substitutes_placeholders_and_wildcard_names() {
        let subs: HashMap<String, String> = [
            ("handlerName".to_string(), "select".to_string()),
            ("core".to_string(), "collection".to_string()),
        ]
        .into_iter()
        .collect();
        let mut t = PathTrie::new();
        t.insert("/c/{core}/$handlerName", &subs, "h").unwrap();
        let mut caps = HashMap::new();
        assert_eq!(t.lookup("/c/films/select", &mut caps), Some(&"h"));
        assert_eq!(caps["collection"], "films");
    }

    #[test]
    fn missing_placeholder_substitute_is_rejected() {
        let mut t = PathTrie::new();
        let err = t.insert("/c/$handlerName", &no_subs(), ()).unwrap_err();
        assert!(matches!(err, SpecError::Invalid(_)));
    }

    #[test]
    fn duplicate_wildcard_names_are_rejected() {
        let mut t = PathTrie::new();
        assert!(t.insert("/a/{x}/b/{x}", &no_subs(), ()).is_err());
        assert!(t.lookup("/a/1/b/2", &mut HashMap::new()).is_none());
    }

    #[test]
    fn wildcard_name_parses_braces_only() {
        assert_eq!(wildcard_name("{collection}"), Some("collection"));
        assert_eq!(wildcard_name("{}"), None);
        assert_eq!(wildcard_name("collection"), None);
        assert_eq!(wildcard_name("*"), None);
    }
}
