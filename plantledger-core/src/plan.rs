//! Strategic plans as a parent-indexed arena.
//!
//! Subtasks live in a flat map keyed by id. Each node knows its parent and
//! keeps an ordered list of child ids, so edits at any depth touch only the
//! node itself and its parent's child list.

use crate::error::LedgerError;
use plantledger_schemas::plan::{StrategicPlan, Subtask};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SubtaskNode {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

/// A partial update for `PlanTree::update`. `None` leaves a field unchanged.
#[derive(Debug, Default, Clone)]
pub struct SubtaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanTree {
    plan_id: String,
    title: String,
    description: Option<String>,
    nodes: HashMap<String, SubtaskNode>,
    roots: Vec<String>,
    next_id: u64,
}

impl PlanTree {
    pub fn new(plan_id: &str, title: &str) -> Self {
        Self {
            plan_id: plan_id.to_string(),
            title: title.to_string(),
            description: None,
            nodes: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Flattens a nested plan into the arena, keeping sibling order.
    pub fn from_plan(plan: &StrategicPlan) -> Result<Self, LedgerError> {
        let mut tree = Self::new(&plan.plan_id, &plan.title);
        tree.description = plan.description.clone();

        let mut pending: Vec<(&Subtask, Option<String>)> =
            plan.subtasks.iter().rev().map(|s| (s, None)).collect();
        while let Some((subtask, parent)) = pending.pop() {
            if tree.nodes.contains_key(&subtask.id) {
                return Err(LedgerError::DuplicateSubtask(subtask.id.clone()));
            }
            match &parent {
                Some(parent_id) => {
                    if let Some(parent_node) = tree.nodes.get_mut(parent_id) {
                        parent_node.children.push(subtask.id.clone());
                    }
                }
                None => tree.roots.push(subtask.id.clone()),
            }
            tree.nodes.insert(
                subtask.id.clone(),
                SubtaskNode {
                    id: subtask.id.clone(),
                    title: subtask.title.clone(),
                    completed: subtask.completed,
                    parent,
                    children: Vec::new(),
                },
            );
            pending.extend(
                subtask
                    .subtasks
                    .iter()
                    .rev()
                    .map(|child| (child, Some(subtask.id.clone()))),
            );
        }
        Ok(tree)
    }

    /// Rebuilds the nested form.
    pub fn to_plan(&self) -> StrategicPlan {
        StrategicPlan {
            plan_id: self.plan_id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            subtasks: self.roots.iter().filter_map(|id| self.nest(id)).collect(),
        }
    }

    fn nest(&self, id: &str) -> Option<Subtask> {
        let node = self.nodes.get(id)?;
        Some(Subtask {
            id: node.id.clone(),
            title: node.title.clone(),
            completed: node.completed,
            subtasks: node.children.iter().filter_map(|c| self.nest(c)).collect(),
        })
    }

    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&SubtaskNode> {
        self.nodes.get(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn children(&self, id: &str) -> Result<&[String], LedgerError> {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .ok_or_else(|| LedgerError::SubtaskNotFound(id.to_string()))
    }

    /// Inserts a new subtask under `parent` (or at the top level) at `index`.
    /// The index is clamped to the number of siblings; `None` appends.
    pub fn insert(
        &mut self,
        parent: Option<&str>,
        index: Option<usize>,
        title: &str,
    ) -> Result<String, LedgerError> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(parent_id) {
                return Err(LedgerError::SubtaskNotFound(parent_id.to_string()));
            }
        }
        let id = self.fresh_id();
        self.nodes.insert(
            id.clone(),
            SubtaskNode {
                id: id.clone(),
                title: title.to_string(),
                completed: false,
                parent: parent.map(str::to_string),
                children: Vec::new(),
            },
        );
        self.attach(&id, parent, index);
        Ok(id)
    }

    /// Removes a subtask and everything beneath it. Returns the removed nodes,
    /// the requested node first.
    pub fn remove(&mut self, id: &str) -> Result<Vec<SubtaskNode>, LedgerError> {
        if !self.nodes.contains_key(id) {
            return Err(LedgerError::SubtaskNotFound(id.to_string()));
        }
        self.detach(id);

        let mut removed = Vec::new();
        let mut stack = vec![id.to_string()];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children.iter().rev().cloned());
                removed.push(node);
            }
        }
        Ok(removed)
    }

    pub fn update(&mut self, id: &str, patch: SubtaskPatch) -> Result<&SubtaskNode, LedgerError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| LedgerError::SubtaskNotFound(id.to_string()))?;
        if let Some(title) = patch.title {
            node.title = title;
        }
        if let Some(completed) = patch.completed {
            node.completed = completed;
        }
        Ok(&*node)
    }

    /// Moves a subtask (with its subtree) under `new_parent` at `index`.
    pub fn move_to(
        &mut self,
        id: &str,
        new_parent: Option<&str>,
        index: Option<usize>,
    ) -> Result<(), LedgerError> {
        if !self.nodes.contains_key(id) {
            return Err(LedgerError::SubtaskNotFound(id.to_string()));
        }
        if let Some(target) = new_parent {
            if !self.nodes.contains_key(target) {
                return Err(LedgerError::SubtaskNotFound(target.to_string()));
            }
            if target == id || self.is_ancestor(id, target) {
                return Err(LedgerError::InvalidMove(id.to_string(), target.to_string()));
            }
        }
        self.detach(id);
        if let Some(node) = self.nodes.get_mut(id) {
            node.parent = new_parent.map(str::to_string);
        }
        self.attach(id, new_parent, index);
        Ok(())
    }

    /// Every node in display order, paired with its depth (roots are 0).
    pub fn depth_first(&self) -> Vec<(usize, &SubtaskNode)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(usize, &String)> = self.roots.iter().rev().map(|id| (0, id)).collect();
        while let Some((depth, id)) = stack.pop() {
            if let Some(node) = self.nodes.get(id) {
                out.push((depth, node));
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            }
        }
        out
    }

    /// Fraction of leaf subtasks marked completed, or `None` for an empty plan.
    pub fn progress(&self) -> Option<f64> {
        let leaves: Vec<&SubtaskNode> =
            self.nodes.values().filter(|n| n.children.is_empty()).collect();
        if leaves.is_empty() {
            return None;
        }
        let done = leaves.iter().filter(|n| n.completed).count();
        Some(done as f64 / leaves.len() as f64)
    }

    fn is_ancestor(&self, ancestor: &str, id: &str) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.parent.as_deref());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(parent).and_then(|n| n.parent.as_deref());
        }
        false
    }

    fn siblings_mut(&mut self, parent: Option<&str>) -> Option<&mut Vec<String>> {
        match parent {
            Some(parent_id) => self.nodes.get_mut(parent_id).map(|n| &mut n.children),
            None => Some(&mut self.roots),
        }
    }

    fn attach(&mut self, id: &str, parent: Option<&str>, index: Option<usize>) {
        if let Some(siblings) = self.siblings_mut(parent) {
            let at = index.map_or(siblings.len(), |i| i.min(siblings.len()));
            siblings.insert(at, id.to_string());
        }
    }

    fn detach(&mut self, id: &str) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(siblings) = self.siblings_mut(parent.as_deref()) {
            siblings.retain(|s| s != id);
        }
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let candidate = format!("{}-{}", self.plan_id, self.next_id);
            self.next_id += 1;
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, completed: bool) -> Subtask {
        Subtask {
            id: id.to_string(),
            title: id.to_uppercase(),
            completed,
            subtasks: vec![],
        }
    }

    fn sample() -> StrategicPlan {
        StrategicPlan {
            plan_id: "P".to_string(),
            title: "Expand workshop".to_string(),
            description: None,
            subtasks: vec![
                Subtask {
                    id: "a".to_string(),
                    title: "Lease".to_string(),
                    completed: false,
                    subtasks: vec![leaf("a1", true), leaf("a2", false)],
                },
                leaf("b", true),
            ],
        }
    }

    fn ids(tree: &PlanTree) -> Vec<(usize, String)> {
        tree.depth_first()
            .into_iter()
            .map(|(d, n)| (d, n.id.clone()))
            .collect()
    }

    #[test]
    fn nested_form_survives_the_arena() {
        let plan = sample();
        let tree = PlanTree::from_plan(&plan).unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get("a1").unwrap().parent.as_deref(), Some("a"));
        assert_eq!(tree.to_plan(), plan);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut plan = sample();
        plan.subtasks.push(leaf("a1", false));
        assert!(matches!(
            PlanTree::from_plan(&plan),
            Err(LedgerError::DuplicateSubtask(id)) if id == "a1"
        ));
    }

    #[test]
    fn insert_respects_index_and_clamps() {
        let mut tree = PlanTree::from_plan(&sample()).unwrap();
        let first = tree.insert(Some("a"), Some(0), "Survey").unwrap();
        let last = tree.insert(Some("a"), Some(99), "Move in").unwrap();
        assert_eq!(
            tree.children("a").unwrap(),
            &[first.clone(), "a1".to_string(), "a2".to_string(), last.clone()]
        );
        assert_ne!(first, last);
        assert!(tree.insert(Some("missing"), None, "x").is_err());
    }

    #[test]
    fn remove_drops_the_whole_subtree() {
        let mut tree = PlanTree::from_plan(&sample()).unwrap();
        let removed = tree.remove("a").unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(removed[0].id, "a");
        assert_eq!(tree.roots(), &["b".to_string()]);
        assert!(tree.get("a2").is_none());
        assert!(matches!(tree.remove("a"), Err(LedgerError::SubtaskNotFound(_))));
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let mut tree = PlanTree::from_plan(&sample()).unwrap();
        let node = tree
            .update("a2", SubtaskPatch { title: None, completed: Some(true) })
            .unwrap();
        assert!(node.completed);
        assert_eq!(node.title, "A2");
        assert_eq!(tree.progress(), Some(1.0));
    }

    #[test]
    fn move_keeps_order_and_rejects_cycles() {
        let mut tree = PlanTree::from_plan(&sample()).unwrap();
        tree.move_to("b", Some("a"), Some(1)).unwrap();
        assert_eq!(
            ids(&tree),
            vec![
                (0, "a".to_string()),
                (1, "a1".to_string()),
                (1, "b".to_string()),
                (1, "a2".to_string()),
            ]
        );
        assert!(matches!(tree.move_to("a", Some("a1"), None), Err(LedgerError::InvalidMove(_, _))));
        assert!(matches!(tree.move_to("a", Some("a"), None), Err(LedgerError::InvalidMove(_, _))));

        tree.move_to("a1", None, Some(0)).unwrap();
        assert_eq!(tree.roots(), &["a1".to_string(), "a".to_string()]);
        assert_eq!(tree.get("a1").unwrap().parent, None);
    }

    #[test]
    fn progress_counts_leaves() {
        let tree = PlanTree::from_plan(&sample()).unwrap();
        // leaves: a1 (done), a2, b (done)
        let progress = tree.progress().unwrap();
        assert!((progress - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(PlanTree::new("E", "Empty").progress(), None);
    }
}
