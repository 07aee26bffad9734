//! Design document tree and named-node lookup
//!
//! Mirrors the subset of the Figma file JSON the pipeline needs. Lookup walks
//! a page depth-first in pre-order with an explicit stack, so arbitrarily deep
//! trees never touch the call stack.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in design units, origin top-left, y growing downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A node in the design tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub children: Vec<Node>,
    #[serde(
        rename = "absoluteBoundingBox",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub absolute_bounding_box: Option<BoundingBox>,
}

/// Full file response from the tree source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTree {
    #[serde(default)]
    pub name: String,
    pub document: Node,
}

impl DocumentTree {
    /// Page (direct child of the document root) with an exactly matching name
    pub fn page(&self, page_name: &str) -> Option<&Node> {
        self.document
            .children
            .iter()
            .find(|page| page.name == page_name)
    }
}

impl Node {
    /// First descendant, in depth-first pre-order, whose name equals `name`.
    ///
    /// The node itself is not a candidate; only its children and below.
    pub fn find_descendant(&self, name: &str) -> Option<&Node> {
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();

        while let Some(node) = stack.pop() {
            if node.name == name {
                return Some(node);
            }
            // Reverse push keeps the leftmost child on top
            stack.extend(node.children.iter().rev());
        }

        None
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_finds_node_nested_deep() {
        let page = group(
            "1:0",
            "Page 1",
            vec![group(
                "1:1",
                "outer",
                vec![group(
                    "1:2",
                    "middle",
                    vec![group("1:3", "inner", vec![leaf("1:4", "target", None)])],
                )],
            )],
        );

        let found = page.find_descendant("target").expect("target should be found");
        assert_eq!(found.id, "1:4");
    }

    #[test]
    fn test_reports_not_found() {
        let page = group("1:0", "Page 1", vec![leaf("1:1", "a", None)]);
        assert!(page.find_descendant("missing").is_none());
    }

    #[test]
    fn test_page_itself_is_not_a_candidate() {
        let page = group("1:0", "same", vec![leaf("1:1", "other", None)]);
        assert!(page.find_descendant("same").is_none());
    }

    #[test]
    fn test_pre_order_first_match_wins() {
        // Depth-first: the nested match under the first child precedes the
        // shallower match in the second child.
        let page = group(
            "1:0",
            "Page 1",
            vec![
                group("1:1", "first", vec![leaf("1:2", "dup", None)]),
                leaf("1:3", "dup", None),
            ],
        );
        assert_eq!(page.find_descendant("dup").unwrap().id, "1:2");
    }

    #[test]
    fn test_parent_precedes_its_children() {
        let page = group(
            "1:0",
            "Page 1",
            vec![group("1:1", "dup", vec![leaf("1:2", "dup", None)])],
        );
        assert_eq!(page.find_descendant("dup").unwrap().id, "1:1");
    }

    #[test]
    fn test_name_match_is_exact() {
        let page = group("1:0", "Page 1", vec![leaf("1:1", "Button ", None)]);
        assert!(page.find_descendant("Button").is_none());
        assert!(page.find_descendant("button ").is_none());
    }

    #[test]
    fn test_very_deep_tree_does_not_overflow() {
        let mut node = leaf("deep", "target", None);
        for i in 0..50_000 {
            node = group(&format!("n{}", i), "level", vec![node]);
        }
        let page = group("p", "Page", vec![node]);
        assert_eq!(page.find_descendant("target").unwrap().id, "deep");

        // Flatten iteratively so Drop does not recurse 50k frames deep
        let mut pending = vec![page];
        while let Some(mut n) = pending.pop() {
            pending.append(&mut n.children);
        }
    }

    #[test]
    fn test_page_lookup() {
        let doc = tree(vec![
            group("1:0", "Cover", vec![]),
            group("2:0", "Page 2", vec![]),
        ]);
        assert_eq!(doc.page("Page 2").unwrap().id, "2:0");
        assert!(doc.page("Page 3").is_none());
    }

    #[test]
    fn test_deserializes_figma_shape() {
        let json = r#"{
            "name": "Landing",
            "lastModified": "2024-01-01T00:00:00Z",
            "document": {
                "id": "0:0",
                "name": "Document",
                "type": "DOCUMENT",
                "children": [{
                    "id": "0:1",
                    "name": "Page 2",
                    "type": "CANVAS",
                    "children": [{
                        "id": "12:7",
                        "name": "hero",
                        "type": "FRAME",
                        "absoluteBoundingBox": {"x": 100.0, "y": 200.0, "width": 400.0, "height": 300.0},
                        "children": [{
                            "id": "12:9",
                            "name": "cta",
                            "type": "INSTANCE",
                            "absoluteBoundingBox": {"x": 350, "y": 420, "width": 80, "height": 40}
                        }]
                    }]
                }]
            }
        }"#;

        let doc: DocumentTree = serde_json::from_str(json).unwrap();
        let page = doc.page("Page 2").unwrap();
        let button = page.find_descendant("cta").unwrap();
        assert_eq!(button.node_type, "INSTANCE");
        assert_eq!(
            button.absolute_bounding_box,
            Some(BoundingBox::new(350.0, 420.0, 80.0, 40.0))
        );
    }
}
