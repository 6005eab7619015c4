//! Group values, the group arena and ordered group sets.

use std::collections::HashSet;
use std::ops::Index;

/// Color of groups that do not pick their own.
///
/// When groups are joined, a step with this color inherits the color of
/// the step before it.
pub const DEFAULT_COLOR: &str = "gray";

/// Name of the group that holds every row when nothing is grouped.
pub const DEFAULT_GROUP_NAME: &str = "Default";

/// A group label: name and color, without tree links.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Group {
    pub name: String,
    pub color: String,
}

impl Group {
    /// Creates a group label.
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }

    /// A group with the default color.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, DEFAULT_COLOR)
    }

    /// The shared default group.
    pub fn default_group() -> Self {
        Self::new(DEFAULT_GROUP_NAME, DEFAULT_COLOR)
    }

    pub fn has_default_color(&self) -> bool {
        self.color == DEFAULT_COLOR
    }
}

/// Root-to-leaf lineage of a classified row.
///
/// Always holds at least one step; the last step is the group the row
/// belongs to, the earlier ones are its ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupPath {
    steps: Vec<Group>,
}

impl GroupPath {
    /// A path with a single, parentless group.
    pub fn new(group: Group) -> Self {
        Self { steps: vec![group] }
    }

    /// Builds a path from root-to-leaf steps. Returns `None` when empty.
    pub fn from_steps(steps: Vec<Group>) -> Option<Self> {
        if steps.is_empty() {
            None
        } else {
            Some(Self { steps })
        }
    }

    /// The default group as a path.
    pub fn default_group() -> Self {
        Self::new(Group::default_group())
    }

    /// Extends this path with a child group, which becomes the new leaf.
    pub fn child(mut self, group: Group) -> Self {
        self.steps.push(group);
        self
    }

    /// The group the row belongs to.
    pub fn leaf(&self) -> &Group {
        // non-empty by construction
        &self.steps[self.steps.len() - 1]
    }

    pub fn name(&self) -> &str {
        &self.leaf().name
    }

    pub fn color(&self) -> &str {
        &self.leaf().color
    }

    pub fn steps(&self) -> &[Group] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Group> {
        self.steps
    }

    /// Whether the leaf has ancestors.
    pub fn has_parent(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl From<Group> for GroupPath {
    fn from(group: Group) -> Self {
        Self::new(group)
    }
}

/// Index of a node in a [`GroupArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A group node in the arena.
///
/// `parent` and `sub_groups` are indices into the same arena. A node with
/// `order` set is an ordered group: it owns the row indices assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub color: String,
    pub parent: Option<GroupId>,
    pub sub_groups: Vec<GroupId>,
    pub order: Option<Vec<usize>>,
}

impl GroupNode {
    /// A detached node: no parent, no subgroups, no rows.
    pub fn new(group: Group) -> Self {
        Self {
            name: group.name,
            color: group.color,
            parent: None,
            sub_groups: Vec::new(),
            order: None,
        }
    }

    /// Whether this node has children.
    pub fn is_parent(&self) -> bool {
        !self.sub_groups.is_empty()
    }

    pub fn is_ordered(&self) -> bool {
        self.order.is_some()
    }

    /// The label of this node.
    pub fn group(&self) -> Group {
        Group::new(self.name.clone(), self.color.clone())
    }
}

/// Arena of group nodes linked by index.
///
/// Nodes are never removed; merges detach nodes instead, so every
/// [`GroupId`] handed out stays valid for the arena's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupArena {
    nodes: Vec<GroupNode>,
}

impl GroupArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a node and returns its id.
    pub fn add(&mut self, node: GroupNode) -> GroupId {
        self.nodes.push(node);
        GroupId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: GroupId) -> Option<&GroupNode> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: GroupId) -> Option<&mut GroupNode> {
        self.nodes.get_mut(id.0)
    }

    /// Materializes a path as a fresh chain of nodes and returns the leaf.
    ///
    /// Each step becomes the only child of the step before it. The leaf
    /// receives `order`.
    pub fn insert_path(&mut self, path: &GroupPath, order: Option<Vec<usize>>) -> GroupId {
        let mut parent: Option<GroupId> = None;
        for step in path.steps() {
            let mut node = GroupNode::new(step.clone());
            node.parent = parent;
            let id = self.add(node);
            if let Some(p) = parent {
                self.nodes[p.0].sub_groups.push(id);
            }
            parent = Some(id);
        }
        let leaf = parent.unwrap_or_else(|| self.add(GroupNode::new(Group::default_group())));
        self.nodes[leaf.0].order = order;
        leaf
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn path(&self, id: GroupId) -> Vec<GroupId> {
        let mut path = vec![id];
        let mut current = self[id].parent;
        while let Some(p) = current {
            path.push(p);
            current = self[p].parent;
        }
        path.reverse();
        path
    }

    /// The topmost ancestor of `id`.
    pub fn root(&self, id: GroupId) -> GroupId {
        let mut current = id;
        while let Some(p) = self[current].parent {
            current = p;
        }
        current
    }

    /// The lineage of `id` as a value path.
    pub fn group_path(&self, id: GroupId) -> GroupPath {
        let steps = self.path(id).into_iter().map(|g| self[g].group()).collect();
        GroupPath { steps }
    }
}

impl Index<GroupId> for GroupArena {
    type Output = GroupNode;

    fn index(&self, id: GroupId) -> &GroupNode {
        &self.nodes[id.0]
    }
}

/// A group as seen by a sibling-group comparator.
#[derive(Debug, Clone, Copy)]
pub struct GroupData<'a> {
    pub name: &'a str,
    pub color: &'a str,
    /// Row indices assigned to the group.
    pub rows: &'a [usize],
}

/// The result of an order computation: ordered groups in display order,
/// backed by an arena holding them and their ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedGroups {
    arena: GroupArena,
    groups: Vec<GroupId>,
}

impl OrderedGroups {
    /// Wraps an arena and the ordered groups within it.
    pub fn new(arena: GroupArena, groups: Vec<GroupId>) -> Self {
        Self { arena, groups }
    }

    /// A single default group holding `order`.
    pub fn single(order: Vec<usize>) -> Self {
        let mut arena = GroupArena::new();
        let mut node = GroupNode::new(Group::default_group());
        node.order = Some(order);
        let id = arena.add(node);
        Self {
            arena,
            groups: vec![id],
        }
    }

    /// Materializes classified groups, one fresh chain per entry, in the
    /// given order.
    pub fn from_paths<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (GroupPath, Vec<usize>)>,
    {
        let mut arena = GroupArena::new();
        let groups = entries
            .into_iter()
            .map(|(path, order)| arena.insert_path(&path, Some(order)))
            .collect();
        Self { arena, groups }
    }

    pub fn arena(&self) -> &GroupArena {
        &self.arena
    }

    /// The ordered groups, in display order.
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Rows assigned to `id`; empty for unordered nodes.
    pub fn group_order(&self, id: GroupId) -> &[usize] {
        self.arena[id].order.as_deref().unwrap_or(&[])
    }

    /// All rows, group after group.
    pub fn order(&self) -> Vec<usize> {
        match self.groups.as_slice() {
            [] => Vec::new(),
            [single] => self.group_order(*single).to_vec(),
            groups => groups
                .iter()
                .flat_map(|&g| self.group_order(g).iter().copied())
                .collect(),
        }
    }

    /// Comparator view of an ordered group.
    pub fn group_data(&self, id: GroupId) -> GroupData<'_> {
        let node = &self.arena[id];
        GroupData {
            name: &node.name,
            color: &node.color,
            rows: self.group_order(id),
        }
    }

    /// Reorders the groups with a sibling-group comparator.
    pub fn sort_groups_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&GroupData<'_>, &GroupData<'_>) -> std::cmp::Ordering,
    {
        let mut groups = std::mem::take(&mut self.groups);
        groups.sort_by(|&a, &b| compare(&self.group_data(a), &self.group_data(b)));
        self.groups = groups;
    }

    /// Distinct root ancestors of the groups.
    pub fn roots(&self) -> Vec<GroupId> {
        super::ops::group_roots(&self.arena, &self.groups)
    }

    /// Shares structurally identical ancestors between the groups.
    pub fn unify_parents(&mut self) {
        super::ops::unify_parents(&mut self.arena, &self.groups);
    }

    /// Whether the concatenated order is a permutation of `0..row_count`.
    pub fn is_permutation_of(&self, row_count: usize) -> bool {
        let order = self.order();
        if order.len() != row_count {
            return false;
        }
        let mut seen = HashSet::with_capacity(row_count);
        order.iter().all(|&row| row < row_count && seen.insert(row))
    }

    /// Whether the concatenated order holds exactly the rows in `rows`.
    pub fn covers(&self, rows: &[usize]) -> bool {
        let mut expected: Vec<usize> = rows.to_vec();
        let mut actual = self.order();
        expected.sort_unstable();
        actual.sort_unstable();
        expected == actual
    }
}

impl Default for OrderedGroups {
    fn default() -> Self {
        Self::single(Vec::new())
    }
}
