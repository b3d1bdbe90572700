//! The category tree.
//!
//! Categories form a self-referential hierarchy of arbitrary depth. Every
//! surface that renders categories - storefront navigation, footer, the
//! category grid, admin category management, and the JSON category endpoints -
//! goes through this one component instead of re-walking the flat records.
//!
//! The tree is built from the flat record set the repository returns:
//!
//! 1. [`CategoryTree::build`] assembles parent/child links, treating records
//!    whose parent is missing as roots and rejecting parent chains that form
//!    a cycle.
//! 2. A post-order pass computes each node's rolled-up product count
//!    (the node's own products plus all descendants').
//! 3. [`CategoryTree::flatten`] produces a depth-annotated list, parents
//!    before children and siblings in name order, ready for menus and
//!    `<select>` option lists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Slug};

/// A flat category record as loaded from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    /// Number of products directly in this category (not descendants).
    pub product_count: i64,
}

/// A node in the assembled tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: Slug,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Products directly in this category.
    pub product_count: i64,
    /// Products in this category and every descendant.
    pub total_product_count: i64,
    pub children: Vec<CategoryNode>,
}

/// A flattened tree entry for menu and option-list rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatCategory {
    pub id: CategoryId,
    pub parent_id: Option<CategoryId>,
    pub name: String,
    pub slug: Slug,
    /// 0 for roots, 1 for their children, and so on.
    pub depth: usize,
    pub product_count: i64,
    pub total_product_count: i64,
    pub has_children: bool,
}

/// Errors detected while assembling the tree.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CategoryTreeError {
    /// A parent chain loops back on itself.
    #[error("category {0} is part of a parent cycle")]
    Cycle(CategoryId),
    /// The same id appeared twice in the input records.
    #[error("duplicate category id {0}")]
    DuplicateId(CategoryId),
}

/// The assembled category hierarchy.
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    roots: Vec<CategoryNode>,
    /// Ids whose parent was absent from the record set; promoted to roots.
    orphans: Vec<CategoryId>,
}

impl CategoryTree {
    /// Build the tree from flat records.
    ///
    /// Records referencing a parent that is absent from `records` are
    /// promoted to roots and reported via [`Self::orphans`]. Siblings are
    /// ordered by name (case-insensitive), ties broken by id for stability.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryTreeError::Cycle`] if any parent chain loops, and
    /// [`CategoryTreeError::DuplicateId`] if an id appears twice.
    pub fn build(records: Vec<CategoryRecord>) -> Result<Self, CategoryTreeError> {
        let mut by_id: HashMap<CategoryId, CategoryRecord> = HashMap::with_capacity(records.len());
        for record in records {
            let id = record.id;
            if by_id.insert(id, record).is_some() {
                return Err(CategoryTreeError::DuplicateId(id));
            }
        }

        detect_cycles(&by_id)?;

        // Group children under their (present) parent; missing parents make roots.
        let mut children_of: HashMap<Option<CategoryId>, Vec<CategoryId>> = HashMap::new();
        let mut orphans = Vec::new();
        for record in by_id.values() {
            let effective_parent = match record.parent_id {
                Some(parent) if by_id.contains_key(&parent) => Some(parent),
                Some(_) => {
                    orphans.push(record.id);
                    None
                }
                None => None,
            };
            children_of.entry(effective_parent).or_default().push(record.id);
        }
        orphans.sort_unstable();

        let mut roots = assemble(None, &by_id, &children_of);
        sort_siblings(&mut roots);

        Ok(Self { roots, orphans })
    }

    /// Root nodes, siblings in name order.
    #[must_use]
    pub fn roots(&self) -> &[CategoryNode] {
        &self.roots
    }

    /// Ids that referenced a missing parent and were promoted to roots.
    ///
    /// Callers should surface these (the storefront logs them at warn);
    /// they indicate a half-deleted hierarchy.
    #[must_use]
    pub fn orphans(&self) -> &[CategoryId] {
        &self.orphans
    }

    /// Total number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        fn count(nodes: &[CategoryNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.roots)
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find a node by slug anywhere in the tree.
    #[must_use]
    pub fn find_by_slug(&self, slug: &Slug) -> Option<&CategoryNode> {
        fn walk<'a>(nodes: &'a [CategoryNode], slug: &Slug) -> Option<&'a CategoryNode> {
            for node in nodes {
                if &node.slug == slug {
                    return Some(node);
                }
                if let Some(found) = walk(&node.children, slug) {
                    return Some(found);
                }
            }
            None
        }
        walk(&self.roots, slug)
    }

    /// Ids of a category and all its descendants.
    ///
    /// This is what "products in a category" means on the storefront: the
    /// category page for `kitchen` includes products filed under
    /// `kitchen/boards` and deeper.
    #[must_use]
    pub fn subtree_ids(&self, id: CategoryId) -> Vec<CategoryId> {
        fn find(nodes: &[CategoryNode], id: CategoryId) -> Option<&CategoryNode> {
            for node in nodes {
                if node.id == id {
                    return Some(node);
                }
                if let Some(found) = find(&node.children, id) {
                    return Some(found);
                }
            }
            None
        }

        fn collect(node: &CategoryNode, out: &mut Vec<CategoryId>) {
            out.push(node.id);
            for child in &node.children {
                collect(child, out);
            }
        }

        let mut out = Vec::new();
        if let Some(node) = find(&self.roots, id) {
            collect(node, &mut out);
        }
        out
    }

    /// Flatten the tree into a depth-annotated list.
    ///
    /// Parents precede their children; siblings keep their name order. The
    /// output drives the nav menu, the footer, and admin parent selectors.
    #[must_use]
    pub fn flatten(&self) -> Vec<FlatCategory> {
        fn walk(nodes: &[CategoryNode], depth: usize, out: &mut Vec<FlatCategory>) {
            for node in nodes {
                out.push(FlatCategory {
                    id: node.id,
                    parent_id: node.parent_id,
                    name: node.name.clone(),
                    slug: node.slug.clone(),
                    depth,
                    product_count: node.product_count,
                    total_product_count: node.total_product_count,
                    has_children: !node.children.is_empty(),
                });
                walk(&node.children, depth + 1, out);
            }
        }

        let mut out = Vec::with_capacity(self.len());
        walk(&self.roots, 0, &mut out);
        out
    }
}

/// Walk every parent chain once, marking visited nodes, to reject cycles.
fn detect_cycles(by_id: &HashMap<CategoryId, CategoryRecord>) -> Result<(), CategoryTreeError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<CategoryId, Mark> = HashMap::with_capacity(by_id.len());

    for &start in by_id.keys() {
        if marks.contains_key(&start) {
            continue;
        }

        // Follow the parent chain, recording the path so the whole chain can
        // be marked Done (or the offender reported) in one pass.
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            match marks.get(&id) {
                Some(Mark::Done) => break,
                Some(Mark::InProgress) => return Err(CategoryTreeError::Cycle(id)),
                None => {}
            }
            marks.insert(id, Mark::InProgress);
            path.push(id);
            current = by_id.get(&id).and_then(|r| r.parent_id).filter(|p| by_id.contains_key(p));
        }
        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    Ok(())
}

/// Recursively assemble nodes under `parent`, computing rolled-up counts.
fn assemble(
    parent: Option<CategoryId>,
    by_id: &HashMap<CategoryId, CategoryRecord>,
    children_of: &HashMap<Option<CategoryId>, Vec<CategoryId>>,
) -> Vec<CategoryNode> {
    let Some(ids) = children_of.get(&parent) else {
        return Vec::new();
    };

    ids.iter()
        .filter_map(|id| by_id.get(id))
        .map(|record| {
            let mut children = assemble(Some(record.id), by_id, children_of);
            sort_siblings(&mut children);
            let total_product_count = record.product_count
                + children.iter().map(|c| c.total_product_count).sum::<i64>();
            CategoryNode {
                id: record.id,
                parent_id: record.parent_id,
                name: record.name.clone(),
                slug: record.slug.clone(),
                description: record.description.clone(),
                product_count: record.product_count,
                total_product_count,
                children,
            }
        })
        .collect()
}

fn sort_siblings(nodes: &mut [CategoryNode]) {
    nodes.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(id: i32, parent: Option<i32>, name: &str, count: i64) -> CategoryRecord {
        CategoryRecord {
            id: CategoryId::new(id),
            parent_id: parent.map(CategoryId::new),
            name: name.to_string(),
            slug: Slug::slugify(name).unwrap(),
            description: None,
            product_count: count,
        }
    }

    #[test]
    fn test_empty_input() {
        let tree = CategoryTree::build(Vec::new()).unwrap();
        assert!(tree.is_empty());
        assert!(tree.flatten().is_empty());
    }

    #[test]
    fn test_single_root() {
        let tree = CategoryTree::build(vec![record(1, None, "Gifts", 3)]).unwrap();
        assert_eq!(tree.roots().len(), 1);
        assert_eq!(tree.roots()[0].total_product_count, 3);
    }

    #[test]
    fn test_rollup_counts() {
        // kitchen(2) -> boards(5), mugs(1); mugs -> travel-mugs(4)
        let tree = CategoryTree::build(vec![
            record(1, None, "Kitchen", 2),
            record(2, Some(1), "Boards", 5),
            record(3, Some(1), "Mugs", 1),
            record(4, Some(3), "Travel Mugs", 4),
        ])
        .unwrap();

        let kitchen = &tree.roots()[0];
        assert_eq!(kitchen.product_count, 2);
        assert_eq!(kitchen.total_product_count, 12);

        let mugs = kitchen
            .children
            .iter()
            .find(|c| c.name == "Mugs")
            .unwrap();
        assert_eq!(mugs.total_product_count, 5);
    }

    #[test]
    fn test_sibling_order_by_name_then_id() {
        let tree = CategoryTree::build(vec![
            record(3, None, "candles", 0),
            record(1, None, "Baskets", 0),
            record(2, None, "Candles", 0),
        ])
        .unwrap();

        let names: Vec<_> = tree.roots().iter().map(|n| n.name.as_str()).collect();
        // Case-insensitive name order; equal names fall back to id order.
        assert_eq!(names, vec!["Baskets", "Candles", "candles"]);
    }

    #[test]
    fn test_missing_parent_promotes_to_root() {
        let tree = CategoryTree::build(vec![
            record(1, None, "Kitchen", 0),
            record(2, Some(99), "Stranded", 7),
        ])
        .unwrap();

        assert_eq!(tree.roots().len(), 2);
        assert_eq!(tree.orphans(), &[CategoryId::new(2)]);
        let stranded = tree.find_by_slug(&Slug::parse("stranded").unwrap()).unwrap();
        assert_eq!(stranded.total_product_count, 7);
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let err = CategoryTree::build(vec![record(1, Some(1), "Loop", 0)]).unwrap_err();
        assert_eq!(err, CategoryTreeError::Cycle(CategoryId::new(1)));
    }

    #[test]
    fn test_two_node_cycle() {
        let err = CategoryTree::build(vec![
            record(1, Some(2), "A", 0),
            record(2, Some(1), "B", 0),
        ])
        .unwrap_err();
        assert!(matches!(err, CategoryTreeError::Cycle(_)));
    }

    #[test]
    fn test_cycle_below_valid_nodes() {
        let err = CategoryTree::build(vec![
            record(1, None, "Root", 0),
            record(2, Some(1), "Fine", 0),
            record(3, Some(4), "C", 0),
            record(4, Some(5), "D", 0),
            record(5, Some(3), "E", 0),
        ])
        .unwrap_err();
        assert!(matches!(err, CategoryTreeError::Cycle(_)));
    }

    #[test]
    fn test_duplicate_id() {
        let err = CategoryTree::build(vec![
            record(1, None, "One", 0),
            record(1, None, "Other", 0),
        ])
        .unwrap_err();
        assert_eq!(err, CategoryTreeError::DuplicateId(CategoryId::new(1)));
    }

    #[test]
    fn test_flatten_depth_and_order() {
        let tree = CategoryTree::build(vec![
            record(1, None, "Kitchen", 2),
            record(2, Some(1), "Boards", 5),
            record(3, Some(1), "Mugs", 1),
            record(4, Some(3), "Travel Mugs", 4),
            record(5, None, "Stationery", 9),
        ])
        .unwrap();

        let flat = tree.flatten();
        let entries: Vec<_> = flat.iter().map(|f| (f.name.as_str(), f.depth)).collect();
        assert_eq!(
            entries,
            vec![
                ("Kitchen", 0),
                ("Boards", 1),
                ("Mugs", 1),
                ("Travel Mugs", 2),
                ("Stationery", 0),
            ]
        );

        let kitchen = &flat[0];
        assert!(kitchen.has_children);
        assert_eq!(kitchen.total_product_count, 12);
        assert!(!flat[4].has_children);
    }

    #[test]
    fn test_flatten_len_matches_tree_len() {
        let tree = CategoryTree::build(vec![
            record(1, None, "A", 0),
            record(2, Some(1), "B", 0),
            record(3, Some(2), "C", 0),
            record(4, Some(2), "D", 0),
        ])
        .unwrap();
        assert_eq!(tree.flatten().len(), tree.len());
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_subtree_ids() {
        let tree = CategoryTree::build(vec![
            record(1, None, "Kitchen", 0),
            record(2, Some(1), "Boards", 0),
            record(3, Some(2), "End Grain", 0),
            record(4, None, "Stationery", 0),
        ])
        .unwrap();

        let mut ids = tree.subtree_ids(CategoryId::new(2));
        ids.sort_unstable();
        assert_eq!(ids, vec![CategoryId::new(2), CategoryId::new(3)]);

        assert_eq!(tree.subtree_ids(CategoryId::new(99)), Vec::<CategoryId>::new());
    }

    #[test]
    fn test_deep_chain() {
        // A 300-deep chain; the iterative cycle walk must not blow the stack
        // and the rollup must reach the root.
        let mut records = vec![record(1, None, "Root", 1)];
        for i in 2..=300 {
            records.push(record(i, Some(i - 1), &format!("Level {i}"), 1));
        }
        let tree = CategoryTree::build(records).unwrap();
        assert_eq!(tree.roots()[0].total_product_count, 300);
        assert_eq!(tree.flatten().last().unwrap().depth, 299);
    }
}
