//! Mention resolution.
//!
//! Candidates are collected from the tree, looked up through the
//! [`MentionResolver`], and the ones that do not resolve are put back as the
//! text they were written as.

use futures::future::join_all;
use rustc_hash::FxHashSet;
use std::time::Duration;

use crate::adapters::MentionResolver;
use crate::error::Diagnostic;
use crate::nodes::{Node, NodeValue};

/// The names confirmed to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionSet {
    resolved: FxHashSet<String>,
}

impl MentionSet {
    /// Whether `name` was confirmed.
    pub fn contains(&self, name: &str) -> bool {
        self.resolved.contains(name)
    }

    /// Number of confirmed names.
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether no name was confirmed.
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl FromIterator<String> for MentionSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        MentionSet {
            resolved: iter.into_iter().collect(),
        }
    }
}

/// Whether `node` sits inside link text, where a mention would nest one
/// link in another.
fn in_link<'a>(node: Node<'a>) -> bool {
    node.ancestors()
        .skip(1)
        .any(|a| matches!(a.data().value, NodeValue::Link(..)))
}

/// Every distinct mentioned name outside link text, in order of first
/// appearance.
pub fn candidates<'a>(root: Node<'a>) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut names = vec![];
    for node in root.descendants() {
        if let NodeValue::Mention(ref nm) = node.data().value {
            if !in_link(node) && seen.insert(nm.name.clone()) {
                names.push(nm.name.clone());
            }
        }
    }
    names
}

/// Look up `names` concurrently.  A lookup that does not answer within
/// `timeout` counts as not found.
pub async fn resolve(
    names: Vec<String>,
    resolver: &(dyn MentionResolver + '_),
    timeout: Duration,
) -> MentionSet {
    let lookups = names.into_iter().map(|name| async move {
        match tokio::time::timeout(timeout, resolver.exists(&name)).await {
            Ok(true) => Some(name),
            Ok(false) => None,
            Err(_) => {
                tracing::warn!(name = %name, ?timeout, "mention lookup timed out");
                None
            }
        }
    });

    let resolved: MentionSet = join_all(lookups).await.into_iter().flatten().collect();
    tracing::debug!(resolved = resolved.len(), "mention lookups finished");
    resolved
}

/// Turn every mention not in `resolved` back into its source text.  With no
/// set at all, every mention becomes text and nothing is reported.
/// Mentions inside link text always become text, silently.
pub fn apply<'a>(root: Node<'a>, resolved: Option<&MentionSet>, messages: &mut Vec<Diagnostic>) {
    let mentions: Vec<Node<'a>> = root
        .descendants()
        .filter(|n| matches!(n.data().value, NodeValue::Mention(..)))
        .collect();

    for node in mentions {
        let linked = in_link(node);
        let mut ast = node.data_mut();
        let (name, literal) = match ast.value {
            NodeValue::Mention(ref nm) => (nm.name.clone(), nm.literal.clone()),
            _ => continue,
        };

        match resolved {
            _ if linked => {}
            Some(set) if set.contains(&name) => continue,
            Some(_) => messages.push(Diagnostic::unresolved(
                format!("unknown member \"{}\"", name),
                ast.line,
            )),
            None => {}
        }

        ast.value = NodeValue::Text(literal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::Arena;
    use crate::{parse_document, Options};
    use async_trait::async_trait;

    struct Slow;

    #[async_trait]
    impl MentionResolver for Slow {
        async fn exists(&self, name: &str) -> bool {
            if name == "slow" {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            true
        }
    }

    #[test]
    fn candidates_are_distinct() {
        let arena = Arena::new();
        let root = parse_document(&arena, "@a @b @a @**c d**", &Options::default());
        assert_eq!(candidates(root), vec!["a", "b", "c d"]);
    }

    #[test]
    fn link_text_is_not_a_candidate() {
        let arena = Arena::new();
        let root = parse_document(&arena, "[@alice](http://x) @bob", &Options::default());
        assert_eq!(candidates(root), vec!["bob"]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_count_as_missing() {
        let set = resolve(
            vec!["slow".to_string(), "quick".to_string()],
            &Slow,
            Duration::from_millis(50),
        )
        .await;
        assert!(set.contains("quick"));
        assert!(!set.contains("slow"));
    }
}
