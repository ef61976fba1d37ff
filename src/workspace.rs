//! # Workspace: multi-branch registry and dispatcher.
//!
//! A [`Workspace`] owns branches and supervisors, hands out component ids,
//! and spreads [`Workspace::submit`] calls over its branches round-robin.
//! It shares no state with workers — dispatch picks a branch under the
//! workspace lock and forwards with the lock released.
//!
//! Teardown order is the point of attaching supervisors here: the
//! workspace drops every supervisor (stopping its control thread) before
//! any branch, so a supervisor can never observe a dying branch.
//!
//! # Example
//! ```
//! use arbor::{Branch, WaitStrategy, Workspace};
//!
//! let workspace = Workspace::new();
//! let a = workspace.attach_branch(Branch::new(2, WaitStrategy::Blocking));
//! let _b = workspace.attach_branch(Branch::new(2, WaitStrategy::Blocking));
//!
//! workspace.submit(|| println!("lands on some branch"));
//! assert!(workspace.branch(a).is_some());
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

use crate::branch::Branch;
use crate::supervisor::Supervisor;

/// Identifier of a branch attached to a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchId(u64);

/// Identifier of a supervisor attached to a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupervisorId(u64);

struct Registry {
    next_id: u64,
    cursor: usize,
    branches: Vec<(BranchId, Arc<Branch>)>,
    supervisors: Vec<(SupervisorId, Arc<Supervisor>)>,
}

impl Registry {
    fn fresh_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Registry of branches and supervisors with round-robin dispatch.
pub struct Workspace {
    registry: Mutex<Registry>,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry {
                next_id: 0,
                cursor: 0,
                branches: Vec::new(),
                supervisors: Vec::new(),
            }),
        }
    }

    // ---- registry ----

    /// Takes ownership of `branch` and returns its component id.
    pub fn attach_branch(&self, branch: Branch) -> BranchId {
        let mut registry = self.registry.lock();
        let id = BranchId(registry.fresh_id());
        registry.branches.push((id, Arc::new(branch)));
        id
    }

    /// Takes ownership of `supervisor` and returns its component id.
    pub fn attach_supervisor(&self, supervisor: Supervisor) -> SupervisorId {
        let mut registry = self.registry.lock();
        let id = SupervisorId(registry.fresh_id());
        registry.supervisors.push((id, Arc::new(supervisor)));
        id
    }

    /// Looks up an attached branch.
    pub fn branch(&self, id: BranchId) -> Option<Arc<Branch>> {
        let registry = self.registry.lock();
        registry
            .branches
            .iter()
            .find(|(bid, _)| *bid == id)
            .map(|(_, branch)| Arc::clone(branch))
    }

    /// Looks up an attached supervisor.
    pub fn supervisor(&self, id: SupervisorId) -> Option<Arc<Supervisor>> {
        let registry = self.registry.lock();
        registry
            .supervisors
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, supervisor)| Arc::clone(supervisor))
    }

    /// Removes and destroys an attached branch. Returns whether `id` was
    /// present.
    pub fn detach_branch(&self, id: BranchId) -> bool {
        let removed = {
            let mut registry = self.registry.lock();
            let before = registry.branches.len();
            registry.branches.retain(|(bid, _)| *bid != id);
            registry.cursor = 0;
            before != registry.branches.len()
        };
        removed
    }

    /// Removes and destroys an attached supervisor. Returns whether `id`
    /// was present.
    pub fn detach_supervisor(&self, id: SupervisorId) -> bool {
        let mut registry = self.registry.lock();
        let before = registry.supervisors.len();
        registry.supervisors.retain(|(sid, _)| *sid != id);
        before != registry.supervisors.len()
    }

    /// Number of attached branches.
    pub fn num_branches(&self) -> usize {
        self.registry.lock().branches.len()
    }

    // ---- dispatch ----

    /// Submits a fire-and-forget task to the next branch in round-robin
    /// order, at normal priority.
    ///
    /// At least one branch must be attached.
    pub fn submit<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let branch = {
            let mut registry = self.registry.lock();
            assert!(
                !registry.branches.is_empty(),
                "submit on a workspace with no attached branch"
            );
            registry.cursor = (registry.cursor + 1) % registry.branches.len();
            Arc::clone(&registry.branches[registry.cursor].1)
        };
        branch.submit(f);
    }

    /// Applies `f` to each attached branch, under the workspace lock.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Branch),
    {
        let registry = self.registry.lock();
        for (_, branch) in &registry.branches {
            f(branch);
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Workspace {
    /// Supervisors are stopped before any branch is destroyed.
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        registry.supervisors.clear();
        registry.branches.clear();
    }
}
