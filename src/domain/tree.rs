//! Fact tree model shared by the builder, the display applier and the response.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Content of a tree node.
///
/// Single-row facts become `Text`, multi-row facts become `List`, sections become
/// `Children`. The untagged representation keeps the wire format of the review
/// response: `null`, a string, a list of strings or a list of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeValue {
    #[default]
    Empty,
    Text(String),
    List(Vec<String>),
    Children(Vec<TreeNode>),
}

impl NodeValue {
    /// Whether the value carries anything worth displaying.
    pub fn has_content(&self) -> bool {
        match self {
            NodeValue::Empty => false,
            NodeValue::Text(_) => true,
            NodeValue::List(values) => !values.is_empty(),
            NodeValue::Children(children) => !children.is_empty(),
        }
    }

    /// Number of displayable items (a text counts as one).
    pub fn len(&self) -> usize {
        match self {
            NodeValue::Empty => 0,
            NodeValue::Text(_) => 1,
            NodeValue::List(values) => values.len(),
            NodeValue::Children(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all content while keeping the list shape, so clients that iterate
    /// over the value still receive a list.
    pub fn clear(&mut self) {
        *self = match self {
            NodeValue::List(_) => NodeValue::List(Vec::new()),
            NodeValue::Children(_) => NodeValue::Children(Vec::new()),
            NodeValue::Empty | NodeValue::Text(_) => NodeValue::Empty,
        };
    }

    /// Keep leaf text found in `kept`; child nodes are kept by key.
    pub fn retain(&mut self, kept: &HashSet<String>) {
        match self {
            NodeValue::Empty => {}
            NodeValue::Text(text) => {
                if !kept.contains(text.as_str()) {
                    *self = NodeValue::Empty;
                }
            }
            NodeValue::List(values) => values.retain(|v| kept.contains(v.as_str())),
            NodeValue::Children(children) => children.retain(|c| kept.contains(c.key.as_str())),
        }
    }
}

/// Display hints attached by the display configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// Render the node expanded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<bool>,
    /// Important-info weight; lower ranks first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
}

impl NodeStyle {
    pub fn is_empty(&self) -> bool {
        self.collapse.is_none() && self.highlight.is_none() && self.top.is_none()
    }
}

/// Labelled node of the case tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub key: String,
    #[serde(rename = "values", default)]
    pub value: NodeValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<NodeStyle>,
}

impl TreeNode {
    pub fn new(key: impl Into<String>, value: NodeValue) -> Self {
        Self {
            key: key.into(),
            value,
            style: None,
        }
    }

    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(key, NodeValue::Text(text.into()))
    }

    pub fn branch(key: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self::new(key, NodeValue::Children(children))
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn has_content(&self) -> bool {
        self.value.has_content()
    }

    pub fn children(&self) -> &[TreeNode] {
        match &self.value {
            NodeValue::Children(children) => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<TreeNode>> {
        match &mut self.value {
            NodeValue::Children(children) => Some(children),
            _ => None,
        }
    }

    /// First child carrying `key`.
    pub fn child(&self, key: &str) -> Option<&TreeNode> {
        self.children().iter().find(|c| c.key == key)
    }
}

/// Collapse fetched rows into one node value.
///
/// One row yields its text (or nothing), several rows yield the list of their
/// non-empty texts in fetch order, no rows yield nothing.
pub fn reduce_rows<T, E>(
    rows: &[T],
    mut value_of: impl FnMut(&T) -> Result<Option<String>, E>,
) -> Result<NodeValue, E> {
    match rows {
        [] => Ok(NodeValue::Empty),
        [row] => Ok(value_of(row)?.map_or(NodeValue::Empty, NodeValue::Text)),
        _ => {
            let mut values = Vec::with_capacity(rows.len());
            for row in rows {
                if let Some(value) = value_of(row)? {
                    values.push(value);
                }
            }
            Ok(NodeValue::List(values))
        }
    }
}
