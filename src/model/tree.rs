//! Scope tree arena
//!
//! The scope tree stores every scope node in an arena addressed by
//! `ScopeId`; parent/child relationships are ids, so back-references and
//! merge/detach rewrites never fight the borrow checker.
//!
//! Children are kept in buckets keyed by scope identity (structural path for
//! blocks, name for named scopes). Attaching a scope tries to merge it with
//! each bucket candidate in order; when nothing merges, the scope stays in
//! the bucket as a sibling. Same-identity siblings that refuse to merge are
//! a deliberate ambiguity bucket, not a failure mode.

use crate::language::Language;
use crate::location::{SourceLocation, StructuralPath};
use crate::model::declaration::VariableDeclaration;
use crate::model::scope::{ScopeKind, TypeData};
use crate::model::uses::Use;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Write as _;

/// Unique identifier for a scope within one tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// Identity key used to bucket merge candidates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKey {
    /// Anonymous scopes: primary structural path
    Path(StructuralPath),
    /// Named scopes: name
    Name(String),
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKey::Path(path) => write!(f, "{path}"),
            ScopeKey::Name(name) => write!(f, "{name}"),
        }
    }
}

/// What kind of placeholder an unresolved parent link materializes as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Namespace,
    Type,
}

/// One link of an unresolved parent chain.
///
/// `namespace A.B.C { }` produces scope `C` carrying links `[A, B]`; the
/// chain is spliced into real scopes when `C` is attached to a tree. Removal
/// reuses the same mechanism to re-home scopes whose parent was pruned away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLink {
    pub name: String,
    pub kind: LinkKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ChildBucket {
    key: ScopeKey,
    members: Vec<ScopeId>,
}

/// A node in the scope tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeNode {
    pub kind: ScopeKind,
    pub language: Language,
    locations: Vec<SourceLocation>,
    variables: std::collections::BTreeMap<String, VariableDeclaration>,
    calls: Vec<Use>,
    unresolved_parent: Vec<ParentLink>,
    parent: Option<ScopeId>,
    children: Vec<ChildBucket>,
}

impl ScopeNode {
    fn new(kind: ScopeKind, language: Language) -> Self {
        Self {
            kind,
            language,
            locations: Vec::new(),
            variables: std::collections::BTreeMap::new(),
            calls: Vec::new(),
            unresolved_parent: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// The scope's name, `None` for blocks.
    pub fn name(&self) -> Option<&str> {
        self.kind.name()
    }

    /// All recorded locations, definitions and references alike.
    pub fn locations(&self) -> &[SourceLocation] {
        &self.locations
    }

    /// First non-reference location, or the first location if every one is
    /// a reference.
    pub fn primary_location(&self) -> Option<&SourceLocation> {
        self.locations
            .iter()
            .find(|l| !l.is_reference)
            .or_else(|| self.locations.first())
    }

    /// Variables declared directly in this scope.
    pub fn variables(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.variables.values()
    }

    /// Declared variable lookup by name.
    pub fn variable(&self, name: &str) -> Option<&VariableDeclaration> {
        self.variables.get(name)
    }

    /// Method-call sites recorded in this scope.
    pub fn calls(&self) -> &[Use] {
        &self.calls
    }

    /// The owning scope, `None` for detached nodes and the root.
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /// Pending parent chain, spliced on attach.
    pub fn unresolved_parent(&self) -> &[ParentLink] {
        &self.unresolved_parent
    }

    fn identity_key(&self) -> ScopeKey {
        match self.kind.name() {
            Some(name) => ScopeKey::Name(name.to_string()),
            None => match self.primary_location() {
                Some(loc) => ScopeKey::Path(loc.path.clone()),
                None => ScopeKey::Name(String::new()),
            },
        }
    }

    fn child_ids(&self) -> Vec<ScopeId> {
        self.children
            .iter()
            .flat_map(|b| b.members.iter().copied())
            .collect()
    }
}

/// Outcome of pruning one node during file removal.
enum RemoveOutcome {
    Kept { changed: bool },
    /// The node detached itself; surviving descendants are handed upward for
    /// re-attachment.
    Detached { orphans: Vec<ScopeId> },
}

/// Counts over a scope tree, for logging and the CLI.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub files: usize,
    pub scopes: usize,
    pub named_scopes: usize,
    pub declarations: usize,
    pub call_sites: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scope Tree Statistics:")?;
        writeln!(f, "  Files: {}", self.files)?;
        writeln!(f, "  Scopes: {} (named: {})", self.scopes, self.named_scopes)?;
        writeln!(f, "  Declarations: {}", self.declarations)?;
        writeln!(f, "  Call sites: {}", self.call_sites)
    }
}

/// The scope tree: one global namespace root plus everything merged into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeTree {
    nodes: Vec<Option<ScopeNode>>,
    free: Vec<u32>,
    root: ScopeId,
    files: BTreeSet<String>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// Create a tree holding only an empty global namespace.
    pub fn new() -> Self {
        let root = ScopeNode::new(
            ScopeKind::Namespace(crate::model::scope::NamespaceData::global()),
            Language::CSharp,
        );
        Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            root: ScopeId(0),
            files: BTreeSet::new(),
        }
    }

    /// The global namespace.
    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Look up a node; `None` for stale or foreign ids.
    pub fn get(&self, id: ScopeId) -> Option<&ScopeNode> {
        self.nodes.get(id.0 as usize).and_then(|slot| slot.as_ref())
    }

    fn node(&self, id: ScopeId) -> &ScopeNode {
        self.get(id).expect("stale scope id")
    }

    fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        self.nodes
            .get_mut(id.0 as usize)
            .and_then(|slot| slot.as_mut())
            .expect("stale scope id")
    }

    fn alloc(&mut self, node: ScopeNode) -> ScopeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot as usize] = Some(node);
                ScopeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                ScopeId((self.nodes.len() - 1) as u32)
            }
        }
    }

    fn take_node(&mut self, id: ScopeId) -> ScopeNode {
        let node = self.nodes[id.0 as usize].take().expect("stale scope id");
        self.free.push(id.0);
        node
    }

    /// Files that contributed to this tree.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn contains_file(&self, file: &str) -> bool {
        self.files.contains(file)
    }

    /// Whether the tree is just an empty global namespace.
    pub fn is_empty(&self) -> bool {
        let root = self.node(self.root);
        root.locations.is_empty()
            && root.children.is_empty()
            && root.variables.is_empty()
            && root.calls.is_empty()
    }

    // ---- construction ----

    /// Create a detached scope. Fill it with locations/variables/calls, then
    /// `attach` it.
    pub fn create_scope(&mut self, kind: ScopeKind, language: Language) -> ScopeId {
        let id = self.alloc(ScopeNode::new(kind, language));
        self.rebind_node(id);
        id
    }

    /// Bind every use stored inside a node (base types, parameter and
    /// variable types, call sites) to the node itself, so resolution can
    /// find their owning scope.
    fn rebind_node(&mut self, id: ScopeId) {
        let node = self.node_mut(id);
        match &mut node.kind {
            ScopeKind::Type(data) => {
                for parent in &mut data.parents {
                    parent.bind(id);
                }
            }
            ScopeKind::Method(data) => {
                if let Some(return_type) = &mut data.return_type {
                    return_type.bind(id);
                }
                for parameter in &mut data.parameters {
                    if let Some(param_type) = &mut parameter.param_type {
                        param_type.bind(id);
                    }
                }
            }
            ScopeKind::Property(data) => {
                if let Some(value_type) = &mut data.value_type {
                    value_type.bind(id);
                }
            }
            ScopeKind::Block | ScopeKind::Namespace(_) => {}
        }
        for declaration in node.variables.values_mut() {
            if let Some(variable_type) = &mut declaration.variable_type {
                variable_type.bind(id);
            }
        }
        for call in &mut node.calls {
            call.bind(id);
        }
    }

    pub fn add_location(&mut self, id: ScopeId, location: SourceLocation) {
        self.files.insert(location.file.clone());
        self.node_mut(id).locations.push(location);
    }

    /// Record a variable declared directly in `id`. The first declaration
    /// for a name wins; later ones are dropped.
    pub fn declare_variable(&mut self, id: ScopeId, mut declaration: VariableDeclaration) {
        self.files.insert(declaration.location.file.clone());
        if let Some(variable_type) = &mut declaration.variable_type {
            variable_type.bind(id);
        }
        self.node_mut(id)
            .variables
            .entry(declaration.name.clone())
            .or_insert(declaration);
    }

    /// Record a method-call site inside `id`.
    pub fn add_call(&mut self, id: ScopeId, mut call: Use) {
        self.files.insert(call.location.file.clone());
        call.bind(id);
        self.node_mut(id).calls.push(call);
    }

    /// Set the pending parent chain for a qualified declaration
    /// (`namespace A.B.C` gives `C` the chain `[A, B]`).
    pub fn set_unresolved_parent(&mut self, id: ScopeId, links: Vec<ParentLink>) {
        self.node_mut(id).unresolved_parent = links;
    }

    /// Make a file's alias directives visible at every use site in the
    /// tree that does not already carry its own alias list. Called by the
    /// working set before a fragment is merged.
    pub fn apply_aliases(&mut self, aliases: &[crate::model::alias::Alias]) {
        if aliases.is_empty() {
            return;
        }
        for id in self.scopes().collect::<Vec<_>>() {
            let node = self.node_mut(id);
            for call in &mut node.calls {
                if call.aliases.is_empty() {
                    call.aliases = aliases.to_vec();
                }
            }
            match &mut node.kind {
                ScopeKind::Type(data) => {
                    for parent in &mut data.parents {
                        if parent.aliases.is_empty() {
                            parent.aliases = aliases.to_vec();
                        }
                    }
                }
                ScopeKind::Method(data) => {
                    if let Some(return_type) = &mut data.return_type {
                        if return_type.aliases.is_empty() {
                            return_type.aliases = aliases.to_vec();
                        }
                    }
                    for parameter in &mut data.parameters {
                        if let Some(param_type) = &mut parameter.param_type {
                            if param_type.aliases.is_empty() {
                                param_type.aliases = aliases.to_vec();
                            }
                        }
                    }
                }
                ScopeKind::Property(data) => {
                    if let Some(value_type) = &mut data.value_type {
                        if value_type.aliases.is_empty() {
                            value_type.aliases = aliases.to_vec();
                        }
                    }
                }
                ScopeKind::Block | ScopeKind::Namespace(_) => {}
            }
            for declaration in node.variables.values_mut() {
                if let Some(variable_type) = &mut declaration.variable_type {
                    if variable_type.aliases.is_empty() {
                        variable_type.aliases = aliases.to_vec();
                    }
                }
            }
        }
    }

    // ---- attach & merge ----

    /// Attach a detached scope under `parent`, splicing any unresolved
    /// parent chain first, then merging with a same-identity child when the
    /// merge predicate allows it. Returns the id of the surviving node.
    pub fn attach(&mut self, parent: ScopeId, id: ScopeId) -> ScopeId {
        let links = std::mem::take(&mut self.node_mut(id).unresolved_parent);
        let mut target = parent;
        for link in links {
            target = self.ensure_link_scope(target, &link, id);
        }
        self.attach_direct(target, id)
    }

    /// Materialize one link of an unresolved parent chain as a child of
    /// `parent`, merging with an existing scope of the same name when
    /// possible. The placeholder borrows the origin's primary location,
    /// downgraded to a reference.
    fn ensure_link_scope(&mut self, parent: ScopeId, link: &ParentLink, origin: ScopeId) -> ScopeId {
        let language = self.node(origin).language;
        let kind = match link.kind {
            LinkKind::Namespace => ScopeKind::Namespace(crate::model::scope::NamespaceData::named(
                link.name.clone(),
            )),
            LinkKind::Type => {
                ScopeKind::Type(TypeData::new(link.name.clone(), crate::model::scope::TypeKind::Class).partial())
            }
        };
        let placeholder = self.create_scope(kind, language);
        if let Some(loc) = self.node(origin).primary_location().cloned() {
            let mut reference = loc;
            reference.is_reference = true;
            self.add_location(placeholder, reference);
        }
        self.attach_direct(parent, placeholder)
    }

    fn attach_direct(&mut self, parent: ScopeId, id: ScopeId) -> ScopeId {
        let key = self.node(id).identity_key();
        let candidates: Vec<ScopeId> = self
            .node(parent)
            .children
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.members.clone())
            .unwrap_or_default();

        for candidate in candidates {
            if candidate != id && self.can_merge(candidate, id) {
                tracing::debug!(
                    key = %key,
                    "merging {} into existing scope",
                    self.node(id).kind.label()
                );
                self.merge_nodes(candidate, id);
                return candidate;
            }
        }

        let parent_node = self.node_mut(parent);
        match parent_node.children.iter_mut().find(|b| b.key == key) {
            Some(bucket) => bucket.members.push(id),
            None => parent_node.children.push(ChildBucket {
                key,
                members: vec![id],
            }),
        }
        self.node_mut(id).parent = Some(parent);
        id
    }

    /// The merge predicate. Blocks merge on equal primary location
    /// (file + structural path); named scopes merge on equal name and kind.
    /// Types must both be partial; methods must agree on constructor/
    /// destructor flags and parameter count so overloads stay apart.
    fn can_merge(&self, a: ScopeId, b: ScopeId) -> bool {
        let (a, b) = (self.node(a), self.node(b));
        match (&a.kind, &b.kind) {
            (ScopeKind::Block, ScopeKind::Block) => match (a.primary_location(), b.primary_location()) {
                (Some(la), Some(lb)) => la.file == lb.file && la.path == lb.path,
                _ => false,
            },
            (ScopeKind::Namespace(na), ScopeKind::Namespace(nb)) => na.name == nb.name,
            (ScopeKind::Type(ta), ScopeKind::Type(tb)) => {
                ta.name == tb.name && ta.is_partial && tb.is_partial
            }
            (ScopeKind::Method(ma), ScopeKind::Method(mb)) => {
                ma.name == mb.name
                    && ma.is_constructor == mb.is_constructor
                    && ma.is_destructor == mb.is_destructor
                    && ma.parameters.len() == mb.parameters.len()
            }
            (ScopeKind::Property(pa), ScopeKind::Property(pb)) => pa.name == pb.name,
            _ => false,
        }
    }

    /// Union `victim` into `target` and free its slot. Children cascade
    /// through `attach`, so nested merges happen recursively.
    fn merge_nodes(&mut self, target: ScopeId, victim: ScopeId) {
        let victim_node = self.take_node(victim);

        // Kind payloads first: fill holes in the survivor from the victim.
        {
            let target_node = self.node_mut(target);
            match (&mut target_node.kind, victim_node.kind) {
                (ScopeKind::Type(ta), ScopeKind::Type(tb)) => {
                    if ta.accessibility == crate::model::scope::Accessibility::Unspecified {
                        ta.accessibility = tb.accessibility;
                    }
                    for parent in tb.parents {
                        if !ta.parents.iter().any(|p| p.name == parent.name) {
                            ta.parents.push(parent);
                        }
                    }
                }
                (ScopeKind::Method(ma), ScopeKind::Method(mb)) => {
                    if ma.return_type.is_none() {
                        ma.return_type = mb.return_type;
                    }
                    for (param, other) in ma.parameters.iter_mut().zip(mb.parameters) {
                        param.has_default |= other.has_default;
                        if param.param_type.is_none() {
                            param.param_type = other.param_type;
                        }
                        if param.name.is_empty() {
                            param.name = other.name;
                        }
                    }
                }
                (ScopeKind::Property(pa), ScopeKind::Property(pb)) => {
                    if pa.value_type.is_none() {
                        pa.value_type = pb.value_type;
                    }
                }
                _ => {}
            }

            target_node.locations.extend(victim_node.locations);
            for (name, declaration) in victim_node.variables {
                target_node.variables.entry(name).or_insert(declaration);
            }
        }
        for call in victim_node.calls {
            self.node_mut(target).calls.push(call);
        }
        self.rebind_node(target);

        for child in victim_node
            .children
            .into_iter()
            .flat_map(|b| b.members)
        {
            self.node_mut(child).parent = None;
            self.attach(target, child);
        }
    }

    /// Fold a per-file fragment into this tree. Both roots must be global
    /// namespaces; everything below merges through `attach`.
    pub fn merge(&mut self, fragment: &ScopeTree) -> Result<()> {
        let fragment_root = fragment.node(fragment.root);
        if !fragment_root.kind.is_global_namespace() {
            return Err(Error::InvalidStructure(format!(
                "fragment root must be the global namespace, got {}",
                fragment_root.kind.label()
            )));
        }

        if self.is_empty() {
            self.node_mut(self.root).language = fragment_root.language;
        }

        let root = self.root;
        for location in fragment_root.locations.clone() {
            self.add_location(root, location);
        }
        for declaration in fragment_root.variables.values().cloned() {
            self.declare_variable(root, declaration);
        }
        for call in fragment_root.calls.clone() {
            self.add_call(root, call);
        }

        for child in fragment_root.child_ids() {
            self.graft(root, fragment, child);
        }
        Ok(())
    }

    /// Copy one fragment subtree node under `parent`, then graft its
    /// children into whatever node survived the attach.
    fn graft(&mut self, parent: ScopeId, src: &ScopeTree, src_id: ScopeId) -> ScopeId {
        let src_node = src.node(src_id);
        let mut copy = ScopeNode::new(src_node.kind.clone(), src_node.language);
        copy.locations = src_node.locations.clone();
        copy.variables = src_node.variables.clone();
        copy.calls = src_node.calls.clone();
        copy.unresolved_parent = src_node.unresolved_parent.clone();

        let new_id = self.alloc(copy);
        self.rebind_node(new_id);
        for location in self.node(new_id).locations.clone() {
            self.files.insert(location.file);
        }
        for declaration in src_node.variables.values() {
            self.files.insert(declaration.location.file.clone());
        }
        for call in src_node.calls.iter() {
            self.files.insert(call.location.file.clone());
        }

        let attached = self.attach(parent, new_id);
        for child in src_node.child_ids() {
            self.graft(attached, src, child);
        }
        attached
    }

    // ---- removal ----

    /// Remove everything a file contributed. Returns true when the tree
    /// changed.
    ///
    /// Scopes whose every location was in the file detach; their surviving
    /// descendants are re-attached at the nearest surviving ancestor with
    /// the dead parent's name recorded as an unresolved parent link, so a
    /// later re-add of the file reconstructs the same shape.
    pub fn remove_file(&mut self, file: &str) -> bool {
        if !self.files.contains(file) {
            return false;
        }
        let changed = match self.remove_file_from(self.root, file) {
            RemoveOutcome::Kept { changed } => changed,
            RemoveOutcome::Detached { .. } => unreachable!("root never detaches"),
        };
        self.files.remove(file);
        tracing::debug!(file, changed, "removed file from scope tree");
        changed
    }

    fn remove_file_from(&mut self, id: ScopeId, file: &str) -> RemoveOutcome {
        let is_root = id == self.root;
        let mut changed = false;
        let mut orphans: Vec<ScopeId> = Vec::new();

        for child in self.node(id).child_ids() {
            match self.remove_file_from(child, file) {
                RemoveOutcome::Kept { changed: c } => changed |= c,
                RemoveOutcome::Detached { orphans: mut o } => {
                    changed = true;
                    self.remove_child_entry(id, child);
                    orphans.append(&mut o);
                }
            }
        }

        let (had_in_file, now_empty, childless) = {
            let node = self.node_mut(id);
            let before = node.locations.len();
            node.locations.retain(|l| l.file != file);
            let had_in_file = node.locations.len() != before;
            changed |= had_in_file;

            let before = node.variables.len();
            node.variables.retain(|_, d| d.location.file != file);
            changed |= node.variables.len() != before;

            let before = node.calls.len();
            node.calls.retain(|c| c.location.file != file);
            changed |= node.calls.len() != before;

            if let ScopeKind::Type(data) = &mut node.kind {
                let before = data.parents.len();
                data.parents.retain(|p| p.location.file != file);
                changed |= data.parents.len() != before;
            }

            (
                had_in_file,
                node.locations.is_empty(),
                node.children.iter().all(|b| b.members.is_empty()),
            )
        };

        if !is_root && now_empty && (had_in_file || (childless && orphans.is_empty() && changed)) {
            // The scope existed only in the removed file (or is a husk whose
            // whole subtree died). Detach it; surviving children become
            // orphans carrying this scope's name as a pending parent link.
            let survivors = self.node(id).child_ids();
            let dead = self.take_node(id);
            let link = match &dead.kind {
                ScopeKind::Namespace(data) if !data.name.is_empty() => Some(ParentLink {
                    name: data.name.clone(),
                    kind: LinkKind::Namespace,
                }),
                ScopeKind::Type(data) => Some(ParentLink {
                    name: data.name.clone(),
                    kind: LinkKind::Type,
                }),
                _ => None,
            };

            let mut all = survivors;
            all.append(&mut orphans);
            for orphan in &all {
                self.node_mut(*orphan).parent = None;
                if let Some(link) = &link {
                    self.node_mut(*orphan).unresolved_parent.insert(0, link.clone());
                }
            }
            return RemoveOutcome::Detached { orphans: all };
        }

        for orphan in orphans {
            self.attach(id, orphan);
        }
        RemoveOutcome::Kept { changed }
    }

    fn remove_child_entry(&mut self, parent: ScopeId, child: ScopeId) {
        let parent_node = self.node_mut(parent);
        for bucket in &mut parent_node.children {
            bucket.members.retain(|m| *m != child);
        }
        parent_node.children.retain(|b| !b.members.is_empty());
    }

    // ---- navigation ----

    /// All children of a scope, flattened across buckets.
    pub fn children(&self, id: ScopeId) -> Vec<ScopeId> {
        self.node(id).child_ids()
    }

    /// Children sharing a name; more than one element means the ambiguity
    /// bucket is populated.
    pub fn named_children(&self, id: ScopeId, name: &str) -> Vec<ScopeId> {
        self.node(id)
            .children
            .iter()
            .find(|b| matches!(&b.key, ScopeKey::Name(n) if n == name))
            .map(|b| b.members.clone())
            .unwrap_or_default()
    }

    /// The scope and its ancestors, innermost first, ending at the root.
    pub fn ancestors_and_self(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut chain = vec![id];
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Nearest enclosing type scope, including `id` itself.
    pub fn enclosing_type(&self, id: ScopeId) -> Option<ScopeId> {
        self.ancestors_and_self(id)
            .into_iter()
            .find(|s| matches!(self.node(*s).kind, ScopeKind::Type(_)))
    }

    /// Full name by concatenating named ancestors with the language
    /// separator. Empty for the global namespace.
    pub fn full_name(&self, id: ScopeId) -> String {
        let separator = self.node(id).language.separator();
        let mut names: Vec<&str> = self
            .ancestors_and_self(id)
            .into_iter()
            .filter_map(|s| self.node(s).name())
            .filter(|n| !n.is_empty())
            .collect();
        names.reverse();
        names.join(separator)
    }

    /// Innermost scope containing a location, by structural-path nesting.
    pub fn find_scope_for_location(&self, location: &SourceLocation) -> Option<ScopeId> {
        self.find_scope_for_path(&location.file, &location.path)
    }

    /// Innermost scope whose location set encloses `path` within `file`.
    pub fn find_scope_for_path(&self, file: &str, path: &StructuralPath) -> Option<ScopeId> {
        self.find_containing(self.root, file, path)
    }

    fn find_containing(&self, id: ScopeId, file: &str, path: &StructuralPath) -> Option<ScopeId> {
        for child in self.node(id).child_ids() {
            if let Some(found) = self.find_containing(child, file, path) {
                return Some(found);
            }
        }
        let contains = self
            .node(id)
            .locations
            .iter()
            .any(|l| l.file == file && l.path.is_prefix_of(path));
        contains.then_some(id)
    }

    /// Every live scope id, root included.
    pub fn scopes(&self) -> impl Iterator<Item = ScopeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ScopeId(i as u32))
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            files: self.files.len(),
            scopes: 0,
            named_scopes: 0,
            declarations: 0,
            call_sites: 0,
        };
        for id in self.scopes() {
            let node = self.node(id);
            stats.scopes += 1;
            if node.name().is_some() {
                stats.named_scopes += 1;
            }
            stats.declarations += node.variables.len();
            stats.call_sites += node.calls.len();
        }
        stats
    }

    // ---- canonical form ----

    /// Deterministic, id-free rendering of the tree. Two trees with the same
    /// canonical form are structurally identical; used by merge-idempotence
    /// checks and the CLI `show` command.
    pub fn format_tree(&self) -> String {
        let mut out = String::new();
        self.format_node(self.root, 0, &mut out);
        out
    }

    /// Structural equality, ignoring ids and insertion order.
    pub fn structurally_eq(&self, other: &ScopeTree) -> bool {
        self.format_tree() == other.format_tree()
    }

    fn format_node(&self, id: ScopeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let indent = "  ".repeat(depth);

        let header = match &node.kind {
            ScopeKind::Block => "block".to_string(),
            ScopeKind::Namespace(data) if data.name.is_empty() => "namespace <global>".to_string(),
            ScopeKind::Namespace(data) => format!("namespace {}", data.name),
            ScopeKind::Type(data) => {
                let mut parents: Vec<String> =
                    data.parents.iter().map(|p| p.to_string()).collect();
                parents.sort();
                format!(
                    "type {}{}{}",
                    data.name,
                    if data.is_partial { " partial" } else { "" },
                    if parents.is_empty() {
                        String::new()
                    } else {
                        format!(" : {}", parents.join(", "))
                    }
                )
            }
            ScopeKind::Method(data) => {
                let params: Vec<String> = data
                    .parameters
                    .iter()
                    .map(|p| {
                        format!("{}{}", p.name, if p.has_default { "=?" } else { "" })
                    })
                    .collect();
                format!("method {}({})", data.name, params.join(", "))
            }
            ScopeKind::Property(data) => format!("property {}", data.name),
        };

        let mut locations: Vec<String> = node
            .locations
            .iter()
            .map(|l| {
                format!(
                    "{}@{}{}",
                    l.file,
                    l.path,
                    if l.is_reference { "(ref)" } else { "" }
                )
            })
            .collect();
        locations.sort();
        let _ = writeln!(out, "{indent}{header} [{}]", locations.join(" "));

        for declaration in node.variables.values() {
            let ty = declaration
                .variable_type
                .as_ref()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "?".to_string());
            let _ = writeln!(
                out,
                "{indent}  var {}: {} @{}",
                declaration.name, ty, declaration.location.file
            );
        }

        let mut calls: Vec<String> = node
            .calls
            .iter()
            .map(|c| format!("{indent}  call {} @{}", c, c.location.file))
            .collect();
        calls.sort();
        for call in calls {
            let _ = writeln!(out, "{call}");
        }

        let mut rendered: Vec<(String, String)> = Vec::new();
        for bucket in &node.children {
            for member in &bucket.members {
                let mut sub = String::new();
                self.format_node(*member, depth + 1, &mut sub);
                rendered.push((bucket.key.to_string(), sub));
            }
        }
        rendered.sort();
        for (_, sub) in rendered {
            out.push_str(&sub);
        }
    }
}
