//! Name, type, and call resolution
//!
//! Resolution answers "what does this use refer to" against the current
//! global scope tree. The search order, shared by every use kind:
//!
//! 1. Self/supertype keywords resolve straight to the enclosing type or its
//!    declared parents.
//! 2. A qualifying prefix (`A.B.C`) is resolved first; only the resolved
//!    scopes' named children are searched, never the lexical chain.
//! 3. A member access (`x.Foo()`) resolves the operand's type and searches
//!    it; `this.Foo()` searches the enclosing type directly.
//! 4. Otherwise the lexical ancestor chain is walked, and for every type on
//!    it the resolved base-type chain is searched as well.
//! 5. Aliases visible at the use site act as a fallback: namespace imports
//!    are re-rooted at the global scope, named aliases substitute their
//!    target.
//! 6. Type uses that still have no candidates fall through to the built-in
//!    inventory.
//!
//! An empty candidate set is a normal outcome, not an error. Multiple
//! candidates mean the ambiguity bucket is populated; callers decide.

use crate::builtins::{BuiltInType, BuiltInTypeTable};
use crate::language::Language;
use crate::model::scope::ScopeKind;
use crate::model::tree::{ScopeId, ScopeTree};
use crate::model::uses::{Caller, Use, UseKind};
use crate::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// One resolution candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    /// A scope in the tree (namespace, type, method, property)
    Definition(ScopeId),
    /// A variable declared in `scope`
    Variable { scope: ScopeId, name: String },
    /// A language primitive
    BuiltIn(Arc<BuiltInType>),
}

/// Resolver over one tree snapshot.
pub struct Resolver<'a> {
    tree: &'a ScopeTree,
    builtins: &'a BuiltInTypeTable,
}

impl<'a> Resolver<'a> {
    pub fn new(tree: &'a ScopeTree, builtins: &'a BuiltInTypeTable) -> Self {
        Self { tree, builtins }
    }

    /// Find every definition a use may refer to, most local first.
    ///
    /// Fails with `Error::DetachedUse` when the use was never attached to a
    /// scope tree; an unresolvable-but-attached use yields `Ok(vec![])`.
    pub fn find_matches(&self, use_: &Use) -> Result<Vec<Candidate>> {
        self.find_matches_inner(use_, true)
    }

    /// `include_inherited` is switched off when resolving the base-type
    /// uses that build an inheritance chain, so cyclic declarations
    /// (`A : B`, `B : A`) cannot recurse through the chain they are
    /// defining.
    fn find_matches_inner(&self, use_: &Use, include_inherited: bool) -> Result<Vec<Candidate>> {
        let origin = use_.parent_scope()?;
        let language = use_.language;

        if language.is_resolution_keyword(&use_.name) {
            return self.resolve_keyword(use_, origin);
        }

        if let Some(prefix) = use_.prefix.as_ref().filter(|p| !p.is_empty()) {
            let links = prefix.links();
            let mut scopes = self.resolve_simple_name(origin, &links[0], use_)?;
            for link in &links[1..] {
                scopes = scopes
                    .iter()
                    .flat_map(|s| self.tree.named_children(*s, link))
                    .filter(|s| self.is_container(*s))
                    .collect();
            }
            let names = [use_.name.clone()];
            let mut results = Vec::new();
            for scope in scopes {
                self.collect_in_scope(use_, &names, scope, &mut results);
            }
            // Qualified names never fall back to unqualified lexical search.
            return Ok(dedup(results));
        }

        if let UseKind::Call(data) = &use_.kind {
            if let Some(caller) = &data.caller {
                return self.resolve_member_access(use_, origin, caller);
            }
        }

        let names = [use_.name.clone()];
        let mut results = Vec::new();

        for ancestor in self.tree.ancestors_and_self(origin) {
            self.collect_in_scope(use_, &names, ancestor, &mut results);
            if include_inherited
                && matches!(self.tree.get(ancestor).map(|n| &n.kind), Some(ScopeKind::Type(_)))
            {
                for parent_type in self.parent_types_and_self(ancestor) {
                    if parent_type != ancestor {
                        self.collect_in_scope(use_, &names, parent_type, &mut results);
                    }
                }
            }
        }

        for alias in &use_.aliases {
            if alias.is_namespace_import {
                for namespace in self.resolve_path_from_root(&alias.target, language) {
                    self.collect_in_scope(use_, &names, namespace, &mut results);
                }
            } else if alias.binds(&use_.name) {
                for target in self.resolve_path_from_root(&alias.target, language) {
                    if self.kind_compatible(use_, target) {
                        results.push(Candidate::Definition(target));
                    }
                }
            }
        }

        if results.is_empty() && matches!(use_.kind, UseKind::Type) {
            if let Some(builtin) = self.builtins.resolve(language, &use_.name) {
                results.push(Candidate::BuiltIn(builtin));
            }
        }

        Ok(dedup(results))
    }

    // ---- step 1: keywords ----

    fn resolve_keyword(&self, use_: &Use, origin: ScopeId) -> Result<Vec<Candidate>> {
        let language = use_.language;
        let Some(enclosing) = self.tree.enclosing_type(origin) else {
            return Ok(Vec::new());
        };
        let is_self = language.self_keyword() == Some(use_.name.as_str());

        if let UseKind::Call(_) = &use_.kind {
            // Constructor chaining: this(...) targets the enclosing type's
            // own constructors, base(...)/super(...) the direct parents'.
            let search: Vec<ScopeId> = if is_self {
                vec![enclosing]
            } else {
                self.direct_parent_types(enclosing)
            };
            let names = self.possible_names(use_, origin);
            let mut results = Vec::new();
            for scope in search {
                for child in self.tree.children(scope) {
                    if self.matches(use_, &names, child) {
                        results.push(Candidate::Definition(child));
                    }
                }
            }
            return Ok(dedup(results));
        }

        if is_self {
            return Ok(vec![Candidate::Definition(enclosing)]);
        }
        Ok(dedup(
            self.direct_parent_types(enclosing)
                .into_iter()
                .map(Candidate::Definition)
                .collect(),
        ))
    }

    // ---- step 3: member access ----

    fn resolve_member_access(
        &self,
        use_: &Use,
        origin: ScopeId,
        caller: &Caller,
    ) -> Result<Vec<Candidate>> {
        let receiver_types: Vec<ScopeId> = match caller {
            Caller::SelfRef => self.tree.enclosing_type(origin).into_iter().collect(),
            Caller::Name(operand) => {
                let mut types = Vec::new();
                for candidate in self.find_matches_inner(operand, true)? {
                    types.extend(self.type_scopes_for_candidate(&candidate)?);
                }
                types
            }
        };

        let names = self.possible_names(use_, origin);
        let mut results = Vec::new();
        for receiver in receiver_types {
            for scope in self.parent_types_and_self(receiver) {
                self.collect_in_scope(use_, &names, scope, &mut results);
            }
        }
        Ok(dedup(results))
    }

    /// The type scopes a resolved operand stands for: a type itself, or a
    /// variable's declared type. Built-ins expose no members.
    fn type_scopes_for_candidate(&self, candidate: &Candidate) -> Result<Vec<ScopeId>> {
        match candidate {
            Candidate::Definition(id) => {
                Ok(match self.tree.get(*id).map(|n| &n.kind) {
                    Some(ScopeKind::Type(_)) => vec![*id],
                    _ => Vec::new(),
                })
            }
            Candidate::Variable { scope, name } => {
                let Some(declaration) = self.tree.get(*scope).and_then(|n| n.variable(name))
                else {
                    return Ok(Vec::new());
                };
                let Some(variable_type) = &declaration.variable_type else {
                    return Ok(Vec::new());
                };
                let mut types = Vec::new();
                for candidate in self.find_matches_inner(variable_type, true)? {
                    if let Candidate::Definition(id) = candidate {
                        if matches!(self.tree.get(id).map(|n| &n.kind), Some(ScopeKind::Type(_))) {
                            types.push(id);
                        }
                    }
                }
                Ok(types)
            }
            Candidate::BuiltIn(_) => Ok(Vec::new()),
        }
    }

    // ---- shared search machinery ----

    /// Matches within one scope: declared variables (name uses only), then
    /// named children.
    fn collect_in_scope(
        &self,
        use_: &Use,
        names: &[String],
        scope: ScopeId,
        results: &mut Vec<Candidate>,
    ) {
        if matches!(use_.kind, UseKind::Name) {
            for name in names {
                if self.tree.get(scope).and_then(|n| n.variable(name)).is_some() {
                    results.push(Candidate::Variable {
                        scope,
                        name: name.clone(),
                    });
                }
            }
        }
        for name in names {
            for child in self.tree.named_children(scope, name) {
                if self.matches(use_, names, child) {
                    results.push(Candidate::Definition(child));
                }
            }
        }
    }

    /// The kind-specific matching predicate.
    fn matches(&self, use_: &Use, names: &[String], candidate: ScopeId) -> bool {
        let Some(node) = self.tree.get(candidate) else {
            return false;
        };
        let Some(candidate_name) = node.name() else {
            return false;
        };
        if !names.iter().any(|n| n == candidate_name) {
            return false;
        }
        match (&use_.kind, &node.kind) {
            (UseKind::Type, ScopeKind::Type(_)) => true,
            (UseKind::Namespace, ScopeKind::Namespace(_)) => true,
            (UseKind::Name, _) => true,
            (UseKind::Call(data), ScopeKind::Method(method)) => {
                method.is_constructor == data.is_constructor
                    && method.is_destructor == data.is_destructor
                    && method.accepts_arity(data.arguments)
            }
            _ => false,
        }
    }

    /// Kind compatibility without name equality, for named-alias targets
    /// whose bound name differs from the definition's.
    fn kind_compatible(&self, use_: &Use, candidate: ScopeId) -> bool {
        let Some(node) = self.tree.get(candidate) else {
            return false;
        };
        match (&use_.kind, &node.kind) {
            (UseKind::Type, ScopeKind::Type(_)) => true,
            (UseKind::Namespace, ScopeKind::Namespace(_)) => true,
            (UseKind::Name, _) => node.name().is_some(),
            (UseKind::Call(data), ScopeKind::Method(method)) => {
                method.is_constructor == data.is_constructor
                    && method.is_destructor == data.is_destructor
                    && method.accepts_arity(data.arguments)
            }
            _ => false,
        }
    }

    /// Expand self/supertype keywords into the concrete type names a call
    /// can match; any other name passes through unchanged.
    fn possible_names(&self, use_: &Use, origin: ScopeId) -> Vec<String> {
        let language = use_.language;
        if language.self_keyword() == Some(use_.name.as_str()) {
            if let Some(enclosing) = self.tree.enclosing_type(origin) {
                if let Some(name) = self.tree.get(enclosing).and_then(|n| n.name()) {
                    return vec![name.to_string()];
                }
            }
            return Vec::new();
        }
        if language.supertype_keyword() == Some(use_.name.as_str()) {
            if let Some(enclosing) = self.tree.enclosing_type(origin) {
                return self
                    .direct_parent_types(enclosing)
                    .iter()
                    .filter_map(|t| self.tree.get(*t).and_then(|n| n.name()))
                    .map(str::to_string)
                    .collect();
            }
            return Vec::new();
        }
        vec![use_.name.clone()]
    }

    /// Resolve one unqualified namespace-or-type name from a scope: lexical
    /// chain first, then aliases. Used for the first link of a prefix.
    fn resolve_simple_name(&self, origin: ScopeId, name: &str, use_: &Use) -> Result<Vec<ScopeId>> {
        let mut out = Vec::new();
        for ancestor in self.tree.ancestors_and_self(origin) {
            for child in self.tree.named_children(ancestor, name) {
                if self.is_container(child) {
                    out.push(child);
                }
            }
        }
        for alias in &use_.aliases {
            if alias.is_namespace_import {
                for namespace in self.resolve_path_from_root(&alias.target, use_.language) {
                    for child in self.tree.named_children(namespace, name) {
                        if self.is_container(child) {
                            out.push(child);
                        }
                    }
                }
            } else if alias.binds(name) {
                out.extend(self.resolve_path_from_root(&alias.target, use_.language));
            }
        }
        Ok(out)
    }

    /// Walk a qualified name down from the global root.
    fn resolve_path_from_root(&self, target: &str, language: Language) -> Vec<ScopeId> {
        let mut scopes = vec![self.tree.root()];
        for link in target.split(language.separator()) {
            scopes = scopes
                .iter()
                .flat_map(|s| self.tree.named_children(*s, link))
                .filter(|s| self.is_container(*s))
                .collect();
            if scopes.is_empty() {
                break;
            }
        }
        scopes
    }

    fn is_container(&self, id: ScopeId) -> bool {
        matches!(
            self.tree.get(id).map(|n| &n.kind),
            Some(ScopeKind::Namespace(_)) | Some(ScopeKind::Type(_))
        )
    }

    /// A type's resolved direct parents.
    fn direct_parent_types(&self, type_id: ScopeId) -> Vec<ScopeId> {
        let Some(ScopeKind::Type(data)) = self.tree.get(type_id).map(|n| &n.kind) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for parent_use in &data.parents {
            let Ok(candidates) = self.find_matches_inner(parent_use, false) else {
                continue;
            };
            for candidate in candidates {
                if let Candidate::Definition(id) = candidate {
                    if matches!(self.tree.get(id).map(|n| &n.kind), Some(ScopeKind::Type(_))) {
                        out.push(id);
                    }
                }
            }
        }
        out
    }

    /// The type plus its transitive resolved parents, cycle-guarded.
    fn parent_types_and_self(&self, type_id: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = vec![type_id];
        while let Some(id) = queue.pop() {
            if !visited.insert(id) {
                continue;
            }
            out.push(id);
            queue.extend(self.direct_parent_types(id));
        }
        out
    }
}

fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for candidate in candidates {
        let key = match &candidate {
            Candidate::Definition(id) => format!("d{}", id.0),
            Candidate::Variable { scope, name } => format!("v{}:{}", scope.0, name),
            Candidate::BuiltIn(builtin) => format!("b{}:{}", builtin.language, builtin.name),
        };
        if seen.insert(key) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{SourceLocation, StructuralPath};
    use crate::model::alias::Alias;
    use crate::model::declaration::VariableDeclaration;
    use crate::model::scope::{MethodData, NamespaceData, Parameter, TypeData, TypeKind};
    use crate::model::uses::{CallData, NamePrefix};
    use crate::Error;

    fn path(raw: &str) -> StructuralPath {
        StructuralPath::parse(raw).unwrap()
    }

    fn def(file: &str, line: u32, raw_path: &str) -> SourceLocation {
        SourceLocation::definition(file, line, 1, path(raw_path))
    }

    fn reference(file: &str, line: u32) -> SourceLocation {
        SourceLocation::reference(file, line, 1, path("/unit/expr[1]"))
    }

    fn call_data(arguments: usize) -> CallData {
        CallData {
            arguments,
            type_arguments: Vec::new(),
            is_constructor: false,
            is_destructor: false,
            caller: None,
        }
    }

    /// App.Widget : App.Base, with methods and a nested namespace; returns
    /// (tree, ids) for the interesting scopes.
    struct Fixture {
        tree: ScopeTree,
        app: ScopeId,
        base: ScopeId,
        widget: ScopeId,
        render: ScopeId,
    }

    fn fixture() -> Fixture {
        let mut tree = ScopeTree::new();
        let root = tree.root();

        let app = tree.create_scope(
            ScopeKind::Namespace(NamespaceData::named("App")),
            Language::CSharp,
        );
        tree.add_location(app, def("w.cs", 1, "/unit/namespace[1]"));
        let app = tree.attach(root, app);

        let base = tree.create_scope(
            ScopeKind::Type(TypeData::new("Base", TypeKind::Class)),
            Language::CSharp,
        );
        tree.add_location(base, def("w.cs", 2, "/unit/namespace[1]/class[1]"));
        let base = tree.attach(app, base);

        let refresh = tree.create_scope(
            ScopeKind::Method(MethodData::new("Refresh")),
            Language::CSharp,
        );
        tree.add_location(refresh, def("w.cs", 3, "/unit/namespace[1]/class[1]/function[1]"));
        tree.attach(base, refresh);

        let parent_use = Use::type_use("Base", reference("w.cs", 5), Language::CSharp);
        let widget = tree.create_scope(
            ScopeKind::Type(TypeData::new("Widget", TypeKind::Class).with_parent(parent_use)),
            Language::CSharp,
        );
        tree.add_location(widget, def("w.cs", 5, "/unit/namespace[1]/class[2]"));
        let widget = tree.attach(app, widget);

        let render = tree.create_scope(
            ScopeKind::Method(
                MethodData::new("Render")
                    .with_parameter(Parameter::new("a"))
                    .with_parameter(Parameter::new("b"))
                    .with_parameter(Parameter::new("c").with_default()),
            ),
            Language::CSharp,
        );
        tree.add_location(render, def("w.cs", 6, "/unit/namespace[1]/class[2]/function[1]"));
        let render = tree.attach(widget, render);

        Fixture {
            tree,
            app,
            base,
            widget,
            render,
        }
    }

    fn resolver<'a>(tree: &'a ScopeTree, builtins: &'a BuiltInTypeTable) -> Resolver<'a> {
        Resolver::new(tree, builtins)
    }

    #[test]
    fn test_detached_use_is_a_hard_error() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let use_ = Use::type_use("Widget", reference("w.cs", 10), Language::CSharp);
        let err = resolver(&f.tree, &builtins).find_matches(&use_).unwrap_err();
        assert!(matches!(err, Error::DetachedUse(_)));
    }

    #[test]
    fn test_lexical_resolution_walks_ancestors() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        // Attached inside Render's method scope: Base is two ancestors up.
        let mut use_ = Use::type_use("Base", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.render);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.base)]);
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::type_use("Missing", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.widget);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_qualified_prefix_never_falls_back() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();

        let mut qualified = Use::type_use("Widget", reference("w.cs", 10), Language::CSharp)
            .with_prefix(NamePrefix::new(vec!["App".into()]));
        qualified.parent_scope = Some(f.tree.root());
        let matches = resolver(&f.tree, &builtins).find_matches(&qualified).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.widget)]);

        // Widget resolves lexically, but not under the wrong prefix.
        let mut wrong = Use::type_use("Widget", reference("w.cs", 10), Language::CSharp)
            .with_prefix(NamePrefix::new(vec!["Other".into()]));
        wrong.parent_scope = Some(f.widget);
        let matches = resolver(&f.tree, &builtins).find_matches(&wrong).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_self_keyword_resolves_to_enclosing_type() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::name_use("this", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.render);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.widget)]);
    }

    #[test]
    fn test_supertype_keyword_resolves_to_declared_parents() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::name_use("base", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.render);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.base)]);
    }

    #[test]
    fn test_inherited_method_resolves_without_qualification() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::call(
            "Refresh",
            reference("w.cs", 10),
            Language::CSharp,
            call_data(0),
        );
        use_.parent_scope = Some(f.render);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches.len(), 1, "base-class method found from subclass");
    }

    #[test]
    fn test_member_access_through_variable_type() {
        let mut f = fixture();
        let builtins = BuiltInTypeTable::new();

        // var w: Widget declared in Base.Refresh's scope; w.Render(2 args).
        let var_type = Use::type_use("Widget", reference("w.cs", 7), Language::CSharp);
        f.tree.declare_variable(
            f.base,
            VariableDeclaration::new("w", def("w.cs", 7, "/unit/namespace[1]/class[1]/decl[1]"))
                .with_type(var_type),
        );

        let mut operand = Use::name_use("w", reference("w.cs", 8), Language::CSharp);
        operand.parent_scope = Some(f.base);
        let mut call = Use::call(
            "Render",
            reference("w.cs", 8),
            Language::CSharp,
            CallData {
                caller: Some(Caller::Name(Box::new(operand))),
                ..call_data(2)
            },
        );
        call.parent_scope = Some(f.base);

        let matches = resolver(&f.tree, &builtins).find_matches(&call).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.render)]);
    }

    #[test]
    fn test_this_member_access_searches_enclosing_type() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut call = Use::call(
            "Refresh",
            reference("w.cs", 10),
            Language::CSharp,
            CallData {
                caller: Some(Caller::SelfRef),
                ..call_data(0)
            },
        );
        call.parent_scope = Some(f.render);
        let matches = resolver(&f.tree, &builtins).find_matches(&call).unwrap();
        assert_eq!(matches.len(), 1, "this.Refresh() reaches the base class");
    }

    #[test]
    fn test_arity_window_filters_calls() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();

        for (arguments, expect) in [(1, 0), (2, 1), (3, 1), (4, 0)] {
            let mut call = Use::call(
                "Render",
                reference("w.cs", 10),
                Language::CSharp,
                call_data(arguments),
            );
            call.parent_scope = Some(f.widget);
            let matches = resolver(&f.tree, &builtins).find_matches(&call).unwrap();
            assert_eq!(matches.len(), expect, "{arguments} arguments");
        }
    }

    #[test]
    fn test_namespace_import_alias_fallback() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        // Use site outside App, with `using App;` in effect.
        let alias = Alias::namespace_import("App", reference("other.cs", 1), Language::CSharp);
        let mut use_ = Use::type_use("Widget", reference("other.cs", 2), Language::CSharp)
            .with_aliases(vec![alias]);
        use_.parent_scope = Some(f.tree.root());
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.widget)]);
    }

    #[test]
    fn test_named_alias_substitutes_target() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let alias = Alias::named("W", "App.Widget", reference("other.cs", 1), Language::CSharp);
        let mut use_ = Use::type_use("W", reference("other.cs", 2), Language::CSharp)
            .with_aliases(vec![alias]);
        use_.parent_scope = Some(f.tree.root());
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.widget)]);
    }

    #[test]
    fn test_alias_on_prefix_first_link() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        // using A = App; then A.Widget.
        let alias = Alias::named("A", "App", reference("other.cs", 1), Language::CSharp);
        let mut use_ = Use::type_use("Widget", reference("other.cs", 2), Language::CSharp)
            .with_prefix(NamePrefix::new(vec!["A".into()]))
            .with_aliases(vec![alias]);
        use_.parent_scope = Some(f.tree.root());
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches, vec![Candidate::Definition(f.widget)]);
    }

    #[test]
    fn test_builtin_terminal_lookup_shares_definitions() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::type_use("int", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.widget);

        let first = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        let second = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        let (Candidate::BuiltIn(a), Candidate::BuiltIn(b)) = (&first[0], &second[0]) else {
            panic!("expected built-in candidates");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn test_ambiguous_types_surface_as_multiple_candidates() {
        let mut f = fixture();
        let builtins = BuiltInTypeTable::new();

        // Two non-partial Gadget classes refuse to merge and both match.
        for file in ["x.cs", "y.cs"] {
            let gadget = f.tree.create_scope(
                ScopeKind::Type(TypeData::new("Gadget", TypeKind::Class)),
                Language::CSharp,
            );
            f.tree.add_location(gadget, def(file, 1, "/unit/class[9]"));
            f.tree.attach(f.app, gadget);
        }

        let mut use_ = Use::type_use("Gadget", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.widget);
        let matches = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn test_resolution_survives_serde_roundtrip() {
        let f = fixture();
        let builtins = BuiltInTypeTable::new();
        let mut use_ = Use::type_use("Base", reference("w.cs", 10), Language::CSharp);
        use_.parent_scope = Some(f.render);

        let before = resolver(&f.tree, &builtins).find_matches(&use_).unwrap();
        let restored: ScopeTree =
            serde_json::from_str(&serde_json::to_string(&f.tree).unwrap()).unwrap();
        let after = resolver(&restored, &builtins).find_matches(&use_).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_cyclic_inheritance_terminates() {
        let mut tree = ScopeTree::new();
        let root = tree.root();

        let a_parent = Use::type_use("B", reference("c.cs", 1), Language::CSharp);
        let a = tree.create_scope(
            ScopeKind::Type(TypeData::new("A", TypeKind::Class).with_parent(a_parent)),
            Language::CSharp,
        );
        tree.add_location(a, def("c.cs", 1, "/unit/class[1]"));
        let a = tree.attach(root, a);

        let b_parent = Use::type_use("A", reference("c.cs", 2), Language::CSharp);
        let b = tree.create_scope(
            ScopeKind::Type(TypeData::new("B", TypeKind::Class).with_parent(b_parent)),
            Language::CSharp,
        );
        tree.add_location(b, def("c.cs", 2, "/unit/class[2]"));
        let b = tree.attach(root, b);

        let builtins = BuiltInTypeTable::new();
        let mut call = Use::call("Anything", reference("c.cs", 3), Language::CSharp, call_data(0));
        call.parent_scope = Some(a);
        // Terminates despite A : B : A.
        let matches = resolver(&tree, &builtins).find_matches(&call).unwrap();
        assert!(matches.is_empty());
        let chain = resolver(&tree, &builtins).parent_types_and_self(a);
        assert_eq!(chain.len(), 2);
        assert!(chain.contains(&b));
    }
}
