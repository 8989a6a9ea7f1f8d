//! Path grouping tree.
//!
//! Groups the flat set of leaf conditions by relationship path, independent
//! of the AND/OR logic, to discover which joins a filter requires. The
//! WHERE-clause semantics stay on the original AST and are walked
//! separately by the compiler.

use crate::ast::Condition;

/// Anything that sits at the end of a relation path. Implemented by the
/// logical [`Condition`] and by the compiler's mapped condition type so
/// both can be grouped with the same machinery.
pub trait HasRelationPath {
    fn relation_path(&self) -> &[String];
}

impl HasRelationPath for Condition {
    fn relation_path(&self) -> &[String] {
        Condition::relation_path(self)
    }
}

impl<T: HasRelationPath + ?Sized> HasRelationPath for &T {
    fn relation_path(&self) -> &[String] {
        (**self).relation_path()
    }
}

/// One node per distinct relation path. Children are created lazily on
/// first occurrence and keep first-seen order; all conditions sharing an
/// identical relation path accumulate into one node.
#[derive(Debug)]
pub struct FilterTreeNode<T> {
    relation_path: Vec<String>,
    conditions: Vec<T>,
    children: Vec<(String, FilterTreeNode<T>)>,
}

impl<T: HasRelationPath> FilterTreeNode<T> {
    /// Builds the tree from flattened AST leaves.
    pub fn build<I: IntoIterator<Item = T>>(items: I) -> Self {
        let mut root = FilterTreeNode::with_path(Vec::new());
        for item in items {
            let path = item.relation_path().to_vec();
            root.insert(item, &path, 0);
        }
        root
    }

    fn with_path(relation_path: Vec<String>) -> Self {
        Self {
            relation_path,
            conditions: Vec::new(),
            children: Vec::new(),
        }
    }

    fn insert(&mut self, item: T, path: &[String], depth: usize) {
        if depth == path.len() {
            self.conditions.push(item);
            return;
        }
        let segment = &path[depth];
        let index = match self.children.iter().position(|(name, _)| name == segment) {
            Some(index) => index,
            None => {
                let mut child_path = self.relation_path.clone();
                child_path.push(segment.clone());
                self.children
                    .push((segment.clone(), FilterTreeNode::with_path(child_path)));
                self.children.len() - 1
            }
        };
        self.children[index].1.insert(item, path, depth + 1);
    }
}

impl<T> FilterTreeNode<T> {
    /// The relation segments leading to this node; empty at the root.
    pub fn relation_path(&self) -> &[String] {
        &self.relation_path
    }

    /// Conditions whose dotted path minus its final attribute segment
    /// equals this node's relation path.
    pub fn conditions(&self) -> &[T] {
        &self.conditions
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &FilterTreeNode<T>)> {
        self.children.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn child(&self, segment: &str) -> Option<&FilterTreeNode<T>> {
        self.children
            .iter()
            .find(|(name, _)| name == segment)
            .map(|(_, node)| node)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ConditionGroup, FilterExpr};
    use crate::parser::parse;

    fn load(input: &str) -> FilterExpr {
        let node = parse(input).expect("parse should succeed").expect("non-empty");
        ConditionGroup::load(node)
    }

    #[test]
    fn test_grouping_by_relation_path() {
        let expr = load("one=1&rel1.a1=1&rel1.a2=2&rel1.rel2.b1=3&rel1.rel2.b2=4");
        let tree = FilterTreeNode::build(expr.flatten());

        assert_eq!(tree.conditions().len(), 1);
        assert_eq!(tree.child_count(), 1);

        let rel1 = tree.child("rel1").expect("rel1 node");
        assert_eq!(rel1.relation_path(), ["rel1"]);
        assert_eq!(rel1.conditions().len(), 2);
        assert_eq!(rel1.child_count(), 1);

        let rel2 = rel1.child("rel2").expect("rel2 node");
        assert_eq!(rel2.relation_path(), ["rel1", "rel2"]);
        assert_eq!(rel2.conditions().len(), 2);
        assert_eq!(rel2.child_count(), 0);
    }

    #[test]
    fn test_spec_example_counts() {
        let expr = load("one=1&rel1.a1=1&rel1.a2=2&rel1.rel2.b1=3&rel1.rel2.b2=4|two=2");
        let tree = FilterTreeNode::build(expr.flatten());
        // Root holds `one` and `two`; AND/OR structure is irrelevant here.
        assert_eq!(tree.conditions().len(), 2);
    }

    #[test]
    fn test_shared_prefix_creates_single_node() {
        let expr = load("taggings.label=primary&taggings.tag_id=2");
        let tree = FilterTreeNode::build(expr.flatten());
        assert_eq!(tree.child_count(), 1);
        let taggings = tree.child("taggings").expect("taggings node");
        assert_eq!(taggings.conditions().len(), 2);
    }

    #[test]
    fn test_attribute_and_relation_prefix_stay_independent() {
        let expr = load("author=1&author.name=2");
        let tree = FilterTreeNode::build(expr.flatten());
        // A root-level condition named `author` and a child node keyed
        // "author" holding the `name` condition, with no merging.
        assert_eq!(tree.conditions().len(), 1);
        assert_eq!(tree.conditions()[0].attribute(), "author");
        let child = tree.child("author").expect("author node");
        assert_eq!(child.conditions().len(), 1);
        assert_eq!(child.conditions()[0].attribute(), "name");
    }

    #[test]
    fn test_first_seen_child_order() {
        let expr = load("b.x=1&a.y=2&b.z=3");
        let tree = FilterTreeNode::build(expr.flatten());
        let order: Vec<_> = tree.children().map(|(name, _)| name).collect();
        assert_eq!(order, ["b", "a"]);
        assert_eq!(tree.child("b").expect("b node").conditions().len(), 2);
    }
}
