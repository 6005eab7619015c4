//! Grouping algorithms.

use super::types::{Group, GroupArena, GroupId, GroupNode, GroupPath};
use std::collections::HashSet;

/// Combines the classifications of several attributes into one path.
///
/// All paths are laid out root to leaf, one after another, and folded into
/// a single chain: each step's name becomes `"<previous> ∩ <step>"` and it
/// keeps its own color unless that color is the default, in which case it
/// inherits the previous step's color. The last step of the result is the
/// intersection group; the earlier steps are its ancestors.
///
/// An empty input yields the default group. A single path without
/// ancestors is returned as is.
pub fn join_groups(paths: &[GroupPath]) -> GroupPath {
    match paths {
        [] => GroupPath::default_group(),
        [single] if !single.has_parent() => single.clone(),
        _ => {
            let mut steps = paths.iter().flat_map(|p| p.steps().iter());
            let Some(first) = steps.next() else {
                return GroupPath::default_group();
            };
            let mut joined = vec![first.clone()];
            for step in steps {
                let previous = &joined[joined.len() - 1];
                let color = if step.has_default_color() {
                    previous.color.clone()
                } else {
                    step.color.clone()
                };
                let name = format!("{} ∩ {}", previous.name, step.name);
                joined.push(Group::new(name, color));
            }
            GroupPath::from_steps(joined).unwrap_or_else(GroupPath::default_group)
        }
    }
}

/// Shares identical ancestors between independently classified groups.
///
/// Walks all chains from their roots. At each level, a node that directly
/// follows a node with the same name and the same parent, where both have
/// children, is merged into the earlier one: its children move over and
/// are re-pointed, and the merge continues one level down. Merged-away
/// nodes are left detached in the arena. Leaves are never shared.
pub fn unify_parents(arena: &mut GroupArena, groups: &[GroupId]) {
    if groups.len() <= 1 {
        return;
    }
    let roots: Vec<GroupId> = groups.iter().map(|&g| arena.root(g)).collect();
    remove_duplicates(arena, roots);
}

fn is_same(arena: &GroupArena, kept: GroupId, candidate: GroupId) -> bool {
    let a = &arena[kept];
    let b = &arena[candidate];
    b.name == a.name && b.parent == a.parent && b.is_parent()
}

fn remove_duplicates(arena: &mut GroupArena, level: Vec<GroupId>) -> Vec<GroupId> {
    let mut real = Vec::with_capacity(level.len());
    let mut queue = level.into_iter().peekable();

    while let Some(node) = queue.next() {
        if !arena[node].is_parent() {
            real.push(node);
            continue;
        }
        real.push(node);

        let mut children = arena[node].sub_groups.clone();
        while let Some(&next) = queue.peek() {
            if next == node {
                queue.next();
                continue;
            }
            if !is_same(arena, node, next) {
                break;
            }
            queue.next();
            if let Some(duplicate) = arena.get_mut(next) {
                children.append(&mut duplicate.sub_groups);
                duplicate.parent = None;
            }
        }

        let mut seen = HashSet::with_capacity(children.len());
        children.retain(|c| seen.insert(*c));
        for &child in &children {
            if let Some(c) = arena.get_mut(child) {
                c.parent = Some(node);
            }
        }
        let unified = remove_duplicates(arena, children);
        if let Some(n) = arena.get_mut(node) {
            n.sub_groups = unified;
        }
    }
    real
}

/// Distinct topmost ancestors of `groups`, in first-seen order.
pub fn group_roots(arena: &GroupArena, groups: &[GroupId]) -> Vec<GroupId> {
    let mut seen = HashSet::new();
    groups
        .iter()
        .map(|&g| arena.root(g))
        .filter(|root| seen.insert(*root))
        .collect()
}

/// Clones `id` and its ancestors into fresh nodes of the same arena.
///
/// The clone has no order and no children; each cloned ancestor lists only
/// the cloned node below it.
pub fn duplicate_group(arena: &mut GroupArena, id: GroupId) -> GroupId {
    let source = &arena[id];
    let mut clone = GroupNode::new(source.group());
    let parent = source.parent;
    clone.parent = parent.map(|p| duplicate_group(arena, p));
    let cloned = arena.add(clone);
    if let Some(p) = arena[cloned].parent {
        if let Some(parent) = arena.get_mut(p) {
            parent.sub_groups.push(cloned);
        }
    }
    cloned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::{OrderedGroups, DEFAULT_COLOR, DEFAULT_GROUP_NAME};

    fn path(steps: &[(&str, &str)]) -> GroupPath {
        GroupPath::from_steps(steps.iter().map(|(n, c)| Group::new(*n, *c)).collect()).unwrap()
    }

    #[test]
    fn test_join_empty_is_default() {
        let joined = join_groups(&[]);
        assert_eq!(joined.name(), DEFAULT_GROUP_NAME);
        assert_eq!(joined.color(), DEFAULT_COLOR);
    }

    #[test]
    fn test_join_single_parentless_is_copy() {
        let single = path(&[("EU", "blue")]);
        assert_eq!(join_groups(&[single.clone()]), single);
    }

    #[test]
    fn test_join_two_attributes() {
        let joined = join_groups(&[path(&[("Region=EU", "blue")]), path(&[("Type=A", "red")])]);
        assert_eq!(joined.depth(), 2);
        assert_eq!(joined.steps()[0].name, "Region=EU");
        assert_eq!(joined.name(), "Region=EU ∩ Type=A");
        assert_eq!(joined.color(), "red");
    }

    #[test]
    fn test_join_inherits_color_when_default() {
        let joined = join_groups(&[
            path(&[("EU", "blue")]),
            path(&[("A", DEFAULT_COLOR)]),
            path(&[("x", DEFAULT_COLOR)]),
        ]);
        assert_eq!(joined.name(), "EU ∩ A ∩ x");
        assert_eq!(joined.color(), "blue");
        assert_eq!(joined.steps()[1].color, "blue");
    }

    #[test]
    fn test_join_flattens_nested_paths() {
        let joined = join_groups(&[
            path(&[("Europe", "blue"), ("EU", "green")]),
            path(&[("A", "red")]),
        ]);
        let names: Vec<&str> = joined.steps().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Europe", "Europe ∩ EU", "Europe ∩ EU ∩ A"]);
    }

    #[test]
    fn test_unify_shares_identical_parent() {
        let mut groups = OrderedGroups::from_paths(vec![
            (path(&[("Region=EU", "blue"), ("Region=EU ∩ Type=A", "red")]), vec![0]),
            (path(&[("Region=EU", "blue"), ("Region=EU ∩ Type=B", "green")]), vec![1]),
        ]);
        groups.unify_parents();

        let leaves = groups.groups().to_vec();
        let arena = groups.arena();
        let first_parent = arena[leaves[0]].parent.unwrap();
        let second_parent = arena[leaves[1]].parent.unwrap();
        assert_eq!(first_parent, second_parent);
        assert_eq!(arena[first_parent].sub_groups, leaves);
        assert_eq!(groups.roots(), vec![first_parent]);
    }

    #[test]
    fn test_unify_keeps_distinct_parents() {
        let mut groups = OrderedGroups::from_paths(vec![
            (path(&[("EU", "blue"), ("EU ∩ A", "red")]), vec![0]),
            (path(&[("US", "blue"), ("US ∩ A", "red")]), vec![1]),
        ]);
        groups.unify_parents();
        assert_eq!(groups.roots().len(), 2);
    }

    #[test]
    fn test_unify_only_merges_adjacent_runs() {
        let mut groups = OrderedGroups::from_paths(vec![
            (path(&[("EU", "blue"), ("EU ∩ A", "red")]), vec![0]),
            (path(&[("US", "blue"), ("US ∩ A", "red")]), vec![1]),
            (path(&[("EU", "blue"), ("EU ∩ B", "red")]), vec![2]),
        ]);
        groups.unify_parents();
        assert_eq!(groups.roots().len(), 3);
        assert_eq!(groups.order(), vec![0, 1, 2]);
    }

    #[test]
    fn test_unify_three_levels() {
        let mut groups = OrderedGroups::from_paths(vec![
            (path(&[("a", "c"), ("a ∩ b", "c"), ("a ∩ b ∩ x", "c")]), vec![0]),
            (path(&[("a", "c"), ("a ∩ b", "c"), ("a ∩ b ∩ y", "c")]), vec![1]),
        ]);
        groups.unify_parents();

        let leaves = groups.groups().to_vec();
        let arena = groups.arena();
        let middle = arena[leaves[0]].parent.unwrap();
        assert_eq!(arena[leaves[1]].parent, Some(middle));
        assert_eq!(arena[middle].sub_groups, leaves);
        let root = arena[middle].parent.unwrap();
        assert_eq!(arena[root].sub_groups, vec![middle]);
        assert_eq!(groups.roots(), vec![root]);
    }

    #[test]
    fn test_unify_never_merges_leaves() {
        let mut groups = OrderedGroups::from_paths(vec![
            (path(&[("a", "c")]), vec![0]),
            (path(&[("a", "c")]), vec![1]),
        ]);
        groups.unify_parents();
        assert_eq!(groups.roots().len(), 2);
    }

    #[test]
    fn test_group_roots_dedup_by_identity() {
        let mut arena = GroupArena::new();
        let a = arena.insert_path(&path(&[("r", "c"), ("x", "c")]), None);
        let root = arena.root(a);
        let mut leaf = GroupNode::new(Group::named("y"));
        leaf.parent = Some(root);
        let b = arena.add(leaf);
        let other = arena.insert_path(&path(&[("r", "c")]), None);

        assert_eq!(group_roots(&arena, &[a, b, other]), vec![root, other]);
    }

    #[test]
    fn test_duplicate_group_clones_chain() {
        let mut arena = GroupArena::new();
        let leaf = arena.insert_path(&path(&[("EU", "blue"), ("EU ∩ A", "red")]), Some(vec![4, 2]));

        let clone = duplicate_group(&mut arena, leaf);
        assert_ne!(clone, leaf);
        assert_eq!(arena[clone].name, "EU ∩ A");
        assert!(arena[clone].order.is_none());
        assert!(arena[clone].sub_groups.is_empty());

        let cloned_parent = arena[clone].parent.unwrap();
        assert_ne!(Some(cloned_parent), arena[leaf].parent);
        assert_eq!(arena[cloned_parent].name, "EU");
        assert_eq!(arena[cloned_parent].sub_groups, vec![clone]);
        assert_eq!(arena[leaf].order.as_deref(), Some(&[4, 2][..]));
    }
}
