//! Org-mode outline parsing.
//!
//! Only the parts of org syntax that carry event data are understood:
//! headlines (stars, keyword, priority, title, tags), the `SCHEDULED:`
//! planning entry, the `:PROPERTIES:` drawer, and body text. Everything
//! else is kept verbatim as content.
//!
//! Nodes live in an arena owned by `Outline`; parents are referenced by
//! index, so walking up for inherited tags never touches ownership.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::timestamp::Scheduled;

static HEADLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\*+)\s+(.*?)\s*$").expect("valid regex"));
static PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[#[A-Za-z0-9]\]\s*").expect("valid regex"));
static TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s+)(:(?:[\w@#%]+:)+)$").expect("valid regex"));
static SCHEDULED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"SCHEDULED:\s*([<\[][^>\]]*[>\]](?:--[<\[][^>\]]*[>\]])?)").expect("valid regex")
});
static PROPERTY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*:([^:\s]+):(?:\s+(.*?))?\s*$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Where in the outline to look: the document itself, or a headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Root,
    Node(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headline {
    pub level: usize,
    /// Todo/done keyword, if the title started with one
    pub state: Option<String>,
    pub title: String,
    /// Own tags only, in the order written
    pub tags: Vec<String>,
    pub scheduled: Option<Scheduled>,
    /// Drawer properties, keys upper-cased
    pub properties: BTreeMap<String, String>,
    pub content: String,
}

impl Headline {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct Node {
    headline: Headline,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct Outline {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
}

impl Outline {
    /// Parse org text. `keywords` are the todo and done keywords recognized
    /// as a headline's state.
    pub fn parse(text: &str, keywords: &[String]) -> Self {
        let mut outline = Outline::default();
        // Innermost open headline at each depth
        let mut stack: Vec<NodeId> = Vec::new();
        let mut body = BodyParser::default();

        for line in text.lines() {
            if let Some(headline) = parse_headline(line, keywords) {
                if let Some(&open) = stack.last() {
                    body.finish(&mut outline.nodes[open.0].headline);
                }
                body = BodyParser::default();

                while stack
                    .last()
                    .is_some_and(|id| outline.nodes[id.0].headline.level >= headline.level)
                {
                    stack.pop();
                }

                let id = NodeId(outline.nodes.len());
                let parent = stack.last().copied();
                outline.nodes.push(Node {
                    headline,
                    parent,
                    children: Vec::new(),
                });
                match parent {
                    Some(parent) => outline.nodes[parent.0].children.push(id),
                    None => outline.roots.push(id),
                }
                stack.push(id);
            } else if let Some(&open) = stack.last() {
                body.feed(line, &mut outline.nodes[open.0].headline);
            }
        }

        if let Some(&open) = stack.last() {
            body.finish(&mut outline.nodes[open.0].headline);
        }

        outline
    }

    pub fn headline(&self, id: NodeId) -> &Headline {
        &self.nodes[id.0].headline
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, position: Position) -> &[NodeId] {
        match position {
            Position::Root => &self.roots,
            Position::Node(id) => &self.nodes[id.0].children,
        }
    }

    /// All nodes below `position`, depth first in document order.
    pub fn descendants(&self, position: Position) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut pending: Vec<NodeId> = self.children(position).iter().rev().copied().collect();
        while let Some(id) = pending.pop() {
            found.push(id);
            pending.extend(self.nodes[id.0].children.iter().rev());
        }
        found
    }

    /// Own tags plus those of every ancestor.
    pub fn inherited_tags(&self, position: Position) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        let mut current = match position {
            Position::Root => None,
            Position::Node(id) => Some(id),
        };
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            tags.extend(node.headline.tags.iter().cloned());
            current = node.parent;
        }
        tags
    }

    /// Follow slash-separated headline titles from the root. An empty path is
    /// the root itself.
    pub fn find_path(&self, path: &str) -> Option<Position> {
        let mut position = Position::Root;
        for wanted in path.split('/').map(str::trim).filter(|s| !s.is_empty()) {
            let next = self
                .children(position)
                .iter()
                .find(|id| self.headline(**id).title.trim() == wanted)?;
            position = Position::Node(*next);
        }
        Some(position)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn parse_headline(line: &str, keywords: &[String]) -> Option<Headline> {
    let captures = HEADLINE.captures(line)?;
    let level = captures[1].len();
    let mut rest = captures[2].to_string();

    let mut tags = Vec::new();
    if let Some(found) = TAGS.captures(&rest) {
        let whole = found.get(0).map(|m| m.start()).unwrap_or(rest.len());
        tags = found[1]
            .split(':')
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        rest.truncate(whole);
    }

    let (first, remainder) = rest
        .split_once(char::is_whitespace)
        .unwrap_or((rest.as_str(), ""));
    let state = keywords
        .iter()
        .any(|k| k == first)
        .then(|| first.to_string());
    let text = if state.is_some() {
        remainder.trim_start()
    } else {
        rest.as_str()
    };

    let title = PRIORITY.replace(text, "").trim_end().to_string();

    Some(Headline {
        level,
        state,
        title,
        tags,
        ..Headline::default()
    })
}

/// Line-by-line parser for the text under one headline.
#[derive(Default)]
struct BodyParser {
    /// Planning and drawer lines are only read before any body text
    seen_text: bool,
    in_properties: bool,
    content: Vec<String>,
}

impl BodyParser {
    fn feed(&mut self, line: &str, headline: &mut Headline) {
        let trimmed = line.trim();

        if self.in_properties {
            if trimmed.eq_ignore_ascii_case(":END:") {
                self.in_properties = false;
            } else if let Some(captures) = PROPERTY.captures(line) {
                let value = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
                headline
                    .properties
                    .insert(captures[1].to_uppercase(), value.to_string());
            }
            return;
        }

        if !self.seen_text {
            if trimmed.eq_ignore_ascii_case(":PROPERTIES:") {
                self.in_properties = true;
                return;
            }
            if is_planning(trimmed) {
                if let Some(captures) = SCHEDULED.captures(trimmed) {
                    headline.scheduled = Scheduled::parse(&captures[1]);
                }
                return;
            }
        }

        if !trimmed.is_empty() {
            self.seen_text = true;
        }
        self.content.push(line.to_string());
    }

    fn finish(&mut self, headline: &mut Headline) {
        headline.content = self.content.join("\n");
    }
}

fn is_planning(line: &str) -> bool {
    ["SCHEDULED:", "DEADLINE:", "CLOSED:"]
        .iter()
        .any(|keyword| line.starts_with(keyword))
}
