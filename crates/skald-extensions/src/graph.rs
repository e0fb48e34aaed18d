//! Dependency graph views
//!
//! A [`DependencyGraphView`] is a lazily expanded tree over a lookup of
//! known extensions. Each node keeps a link to its parent so expansion
//! stops at the first repeated identifier on the path from the root,
//! which keeps cyclic declarations finite.
//!
//! [`dependency_closure`] is the flat counterpart used when toggling
//! enablement: an iterative walk with a visited set.

use crate::entity::ExtensionEntity;
use skald_core::types::canonical_id;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

/// Known extensions keyed by canonical id
pub type ExtensionLookup = HashMap<String, ExtensionEntity>;

/// One node of a lazily expanded dependency tree
#[derive(Debug)]
pub struct DependencyGraphView {
    identifier: String,
    extension: Option<ExtensionEntity>,
    lookup: Arc<ExtensionLookup>,
    parent: Option<Arc<DependencyGraphView>>,
    has_dependencies: OnceLock<bool>,
}

impl DependencyGraphView {
    /// Root view for `extension`
    pub fn root(extension: ExtensionEntity, lookup: ExtensionLookup) -> Arc<Self> {
        Arc::new(Self {
            identifier: extension.id(),
            extension: Some(extension),
            lookup: Arc::new(lookup),
            parent: None,
            has_dependencies: OnceLock::new(),
        })
    }

    /// Canonical id this node stands for
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// The resolved entity; `None` when the id is unknown to the lookup
    pub fn extension(&self) -> Option<&ExtensionEntity> {
        self.extension.as_ref()
    }

    pub fn parent(&self) -> Option<&Arc<DependencyGraphView>> {
        self.parent.as_ref()
    }

    /// Whether this node should expand.
    ///
    /// False when the extension declares nothing or when an ancestor
    /// already stands for the same identifier. Computed once.
    pub fn has_dependencies(&self) -> bool {
        *self.has_dependencies.get_or_init(|| {
            let Some(extension) = &self.extension else {
                return false;
            };
            if extension.dependencies().is_empty() {
                return false;
            }

            let mut ancestor = self.parent.as_ref();
            while let Some(node) = ancestor {
                if node.identifier == self.identifier {
                    return false;
                }
                ancestor = node.parent.as_ref();
            }
            true
        })
    }

    /// Child views, one per declared dependency, built on each call
    pub fn dependencies(self: &Arc<Self>) -> Vec<Arc<DependencyGraphView>> {
        if !self.has_dependencies() {
            return Vec::new();
        }
        let Some(extension) = &self.extension else {
            return Vec::new();
        };

        extension
            .dependencies()
            .iter()
            .map(|dependency| {
                let identifier = canonical_id(dependency);
                Arc::new(DependencyGraphView {
                    extension: self.lookup.get(&identifier).cloned(),
                    identifier,
                    lookup: Arc::clone(&self.lookup),
                    parent: Some(Arc::clone(self)),
                    has_dependencies: OnceLock::new(),
                })
            })
            .collect()
    }

    /// Depth of this node below the root
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut ancestor = self.parent.as_ref();
        while let Some(node) = ancestor {
            depth += 1;
            ancestor = node.parent.as_ref();
        }
        depth
    }
}

/// Every installed extension reachable from `roots` through declared
/// dependencies, each at most once, in discovery order.
///
/// `visited` seeds the ids that must never be returned (typically the
/// extension being toggled). Extensions rejected by `include` are
/// neither returned nor expanded.
pub fn dependency_closure<'a, F>(
    roots: &[String],
    installed: &'a [ExtensionEntity],
    mut visited: HashSet<String>,
    include: F,
) -> Vec<&'a ExtensionEntity>
where
    F: Fn(&ExtensionEntity) -> bool,
{
    let mut closure = Vec::new();
    let mut stack: Vec<String> = roots.iter().rev().map(|id| canonical_id(id)).collect();

    while let Some(id) = stack.pop() {
        if visited.contains(&id) {
            continue;
        }
        let Some(extension) = installed.iter().find(|e| e.id() == id) else {
            continue;
        };
        visited.insert(id);
        if !include(extension) {
            continue;
        }

        closure.push(extension);
        stack.extend(
            extension
                .dependencies()
                .iter()
                .rev()
                .map(|dependency| canonical_id(dependency)),
        );
    }

    closure
}
