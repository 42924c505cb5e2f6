//! Maps pointer events over the host page to the symbol token under the cursor.
//!
//! The host DOM is reached only through [`HostNode`], a small capability trait:
//! the host supplies structure (tag, class attribute, parent, children, text,
//! bounding box) and this module implements the "matches", "closest ancestor"
//! and "descendants in document order" queries on top of it.

use crate::config::Config;
use crate::geometry::Rect;
use crate::types::SymbolKey;
use serde::Deserialize;

/// How a [`Selector`] tests the class attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassMatch {
    /// One of the whitespace-separated classes equals the value.
    Class(String),
    /// The raw class attribute starts with the value (CSS `[class^=...]`).
    ClassPrefix(String),
}

/// A minimal element selector: optional tag name plus a class test.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Selector {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(flatten)]
    pub class: ClassMatch,
}

impl Selector {
    pub fn class(tag: Option<&str>, class: &str) -> Self {
        Self {
            tag: tag.map(str::to_string),
            class: ClassMatch::Class(class.to_string()),
        }
    }

    pub fn class_prefix(tag: Option<&str>, prefix: &str) -> Self {
        Self {
            tag: tag.map(str::to_string),
            class: ClassMatch::ClassPrefix(prefix.to_string()),
        }
    }

    pub fn matches<N: HostNode>(&self, node: &N) -> bool {
        if let Some(tag) = &self.tag
            && !node.tag_name().eq_ignore_ascii_case(tag)
        {
            return false;
        }
        let class_attr = node.class_name();
        match &self.class {
            ClassMatch::Class(class) => class_attr.split_whitespace().any(|c| c == class),
            ClassMatch::ClassPrefix(prefix) => class_attr.starts_with(prefix.as_str()),
        }
    }
}

/// Read-only view of a host page element.
pub trait HostNode: Clone {
    fn tag_name(&self) -> &str;
    /// The raw `class` attribute, empty when absent.
    fn class_name(&self) -> &str;
    fn parent(&self) -> Option<Self>;
    /// Child elements in document order.
    fn children(&self) -> Vec<Self>;
    fn text_content(&self) -> String;
    /// Bounding box in client coordinates.
    fn bounding_rect(&self) -> Rect;

    fn matches(&self, selector: &Selector) -> bool {
        selector.matches(self)
    }

    /// The nearest inclusive ancestor matching `selector`.
    fn closest(&self, selector: &Selector) -> Option<Self> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.matches(selector) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// Descendants (excluding `self`) matching `selector`, in document order.
    fn find_all(&self, selector: &Selector) -> Vec<Self> {
        let mut found = Vec::new();
        let mut stack: Vec<Self> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.matches(selector) {
                found.push(node.clone());
            }
            stack.extend(node.children().into_iter().rev());
        }
        found
    }
}

/// A token picked out of the host page.
#[derive(Debug, Clone)]
pub struct ResolvedToken<N> {
    /// The element, kept for highlighting.
    pub element: N,
    pub key: SymbolKey,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct TokenResolver {
    token: Selector,
    line: Selector,
}

impl TokenResolver {
    pub const fn new(token: Selector, line: Selector) -> Self {
        Self { token, line }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.token_selector.clone(), config.line_selector.clone())
    }

    /// Finds the token for a pointer event on `target` at horizontal client
    /// position `pointer_x`.
    ///
    /// A target that is itself a token wins. Otherwise, inside a code line,
    /// the token whose left edge is closest to the pointer is chosen, the
    /// first in document order on a tie.
    pub fn resolve<N: HostNode>(&self, target: &N, pointer_x: f64) -> Option<ResolvedToken<N>> {
        let element = if target.matches(&self.token) {
            target.clone()
        } else {
            let line = target.closest(&self.line)?;
            nearest_by_left_edge(line.find_all(&self.token), pointer_x)?
        };

        let key = SymbolKey::new(&element.text_content())?;
        let rect = element.bounding_rect();
        Some(ResolvedToken { element, key, rect })
    }
}

fn nearest_by_left_edge<N: HostNode>(candidates: Vec<N>, pointer_x: f64) -> Option<N> {
    let mut best: Option<(f64, N)> = None;
    for node in candidates {
        let distance = (node.bounding_rect().left - pointer_x).abs();
        match &best {
            Some((best_distance, _)) if distance >= *best_distance => {}
            _ => best = Some((distance, node)),
        }
    }
    best.map(|(_, node)| node)
}
