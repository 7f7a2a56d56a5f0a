//! Arena-backed XML element tree.
//!
//! Elements live in a flat `Vec` and refer to each other through [`NodeId`]
//! handles. Each element stores its parent handle and its ordered child
//! handles, which gives sibling lookup and in-place editing without
//! bidirectional references.
//!
//! Removing an element detaches it from its parent; the arena slot is kept
//! (handles stay valid) but the element is no longer reachable from the root.

#![deny(unsafe_code)]

use std::fmt;

/// Handle to an element inside a [`Document`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Where an element came from in the source document.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourcePosition {
    /// 1-based line of the start tag; 0 when the element was built in memory.
    pub line: usize,
    /// Element path, e.g. `/SchoolUpload/School[2]/Students/Student[1]/Address/Unit`.
    pub path: String,
}

impl SourcePosition {
    pub fn new(line: usize, path: impl Into<String>) -> Self {
        Self {
            line,
            path: path.into(),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line > 0 {
            write!(f, "line {}", self.line)
        } else {
            f.write_str(&self.path)
        }
    }
}

/// A single XML element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written in the source (`ns1:Phone`).
    pub name: String,
    /// Namespace URI the prefix resolved to, if any.
    pub namespace: Option<String>,
    /// Attributes in source order, namespace declarations included.
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub position: SourcePosition,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(name: impl Into<String>, position: SourcePosition) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            text: None,
            position,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        match self.name.rsplit_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.rsplit_once(':').map(|(prefix, _)| prefix)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// An ordered element tree owned by a single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Element>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the root element. Replaces any previous root.
    pub fn set_root(&mut self, element: Element) -> NodeId {
        let id = self.push(element);
        self.root = Some(id);
        id
    }

    /// Append `element` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, mut element: Element) -> NodeId {
        element.parent = Some(parent);
        let id = self.push(element);
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(element);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn element(&self, id: NodeId) -> &Element {
        &self.nodes[id.0]
    }

    pub fn element_mut(&mut self, id: NodeId) -> &mut Element {
        &mut self.nodes[id.0]
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].text = Some(value.into());
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First direct child of `id` satisfying `predicate`, in document order.
    pub fn find_child<F>(&self, id: NodeId, mut predicate: F) -> Option<NodeId>
    where
        F: FnMut(&Element) -> bool,
    {
        self.children(id)
            .iter()
            .copied()
            .find(|child| predicate(self.element(*child)))
    }

    /// Whether `id` is still reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if Some(current) == self.root {
                return true;
            }
            match self.nodes[current.0].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Detach `id` from its parent. Returns false for the root or an
    /// already-detached element.
    pub fn detach(&mut self, id: NodeId) -> bool {
        let Some(parent) = self.nodes[id.0].parent.take() else {
            return false;
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
        true
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Pre-order walk of every attached element.
    pub fn iter(&self) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: self.root.into_iter().collect(),
        }
    }

    /// Number of attached elements.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

/// Pre-order iterator over element handles.
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}
