use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, hash_map::Entry},
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
};

use thiserror::Error;
use tracing::debug;

use crate::{Compilation, ast::Ast, compile};

/// Hash of formula source text, the key of the compiled-tree cache.
#[must_use]
pub fn source_hash(source: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    hasher.finish()
}

/// A named formula with its cached compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaEntry {
    name:        String,
    source:      String,
    source_hash: u64,
    compiled:    Compilation,
}

impl FormulaEntry {
    /// Compiles `source` into a new entry.
    #[must_use]
    pub fn compile(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        Self { name: name.into(),
               source_hash: source_hash(&source),
               compiled: compile(&source),
               source }
    }

    /// Registry key.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Formula source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Hash of [`FormulaEntry::source`].
    #[must_use]
    pub const fn source_hash(&self) -> u64 {
        self.source_hash
    }

    /// Tree and syntax diagnostics.
    #[must_use]
    pub const fn compilation(&self) -> &Compilation {
        &self.compiled
    }

    /// The compiled tree, if the source compiled without errors.
    #[must_use]
    pub fn ast(&self) -> Option<&Ast> {
        if self.compiled.is_accepted() { self.compiled.ast.as_ref() } else { None }
    }

    /// Names of the formulas this one references.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.compiled.ast.iter().flat_map(Ast::references)
    }
}

/// Formulas left over when sorting by dependencies, because they are part
/// of a reference cycle or depend on one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("formulas in or behind a reference cycle: {}", names.join(", "))]
pub struct CycleError {
    /// The unsortable formulas, alphabetically.
    pub names: Vec<String>,
}

type Entries = Arc<HashMap<String, Arc<FormulaEntry>>>;

/// Mutable owner of named formulas.
///
/// Compiled trees are cached per entry and rebuilt only when the source
/// hash changes. Entries are shared with outstanding snapshots; changing
/// the registry copies the map first, so a snapshot never sees later
/// changes.
#[derive(Debug, Clone, Default)]
pub struct FormulaRegistry {
    entries: Entries,
}

impl FormulaRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces formula `name`.
    ///
    /// Recompiles only when the source text changed.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::registry::FormulaRegistry;
    ///
    /// let mut registry = FormulaRegistry::new();
    /// registry.define("alos", "solar(16.1, before_sunrise)");
    /// let entry = registry.define("misheyakir", "@alos + 30min");
    ///
    /// assert_eq!(entry.references().collect::<Vec<_>>(), ["alos"]);
    /// assert_eq!(registry.len(), 2);
    /// ```
    pub fn define(&mut self, name: impl Into<String>, source: impl Into<String>) -> &FormulaEntry {
        let source = source.into();
        let hash = source_hash(&source);

        match Arc::make_mut(&mut self.entries).entry(name.into()) {
            Entry::Occupied(mut slot) => {
                if slot.get().source_hash == hash {
                    debug!(formula = %slot.key(), "source unchanged, reusing compiled formula");
                } else {
                    let entry = FormulaEntry::compile(slot.key().clone(), source);
                    slot.insert(Arc::new(entry));
                }
                slot.into_mut()
            },
            Entry::Vacant(slot) => {
                let entry = FormulaEntry::compile(slot.key().clone(), source);
                slot.insert(Arc::new(entry))
            },
        }
    }

    /// Removes formula `name`. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        Arc::make_mut(&mut self.entries).remove(name).is_some()
    }

    /// Looks up a formula.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormulaEntry> {
        self.entries.get(name).map(AsRef::as_ref)
    }

    /// Number of formulas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// An immutable view of the current formulas, safe to share across
    /// threads for a whole batch of evaluations.
    #[must_use]
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot { entries: Arc::clone(&self.entries) }
    }
}

impl<N: Into<String>, S: Into<String>> FromIterator<(N, S)> for FormulaRegistry {
    fn from_iter<I: IntoIterator<Item = (N, S)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (name, source) in iter {
            registry.define(name, source);
        }
        registry
    }
}

/// Read-only view of a [`FormulaRegistry`] at one point in time.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    entries: Entries,
}

impl RegistrySnapshot {
    /// Looks up a formula.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormulaEntry> {
        self.entries.get(name).map(AsRef::as_ref)
    }

    /// Whether formula `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Every formula name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of formulas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether following references from `from` eventually arrives at
    /// `target`. Every formula reaches itself.
    #[must_use]
    pub fn reaches(&self, from: &str, target: &str) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();

        while let Some(name) = stack.pop() {
            if name == target {
                return true;
            }
            if seen.insert(name)
               && let Some(entry) = self.get(name)
            {
                stack.extend(entry.references());
            }
        }

        false
    }

    /// Sorts formulas so that every formula comes after the formulas it
    /// references. Ties are broken alphabetically; references to missing
    /// formulas are ignored.
    ///
    /// # Errors
    /// [`CycleError`] with every formula that cannot be placed.
    ///
    /// ## Example
    /// ```
    /// use zmanim_dsl::registry::FormulaRegistry;
    ///
    /// let registry: FormulaRegistry = [("tzais", "@shkia + 18min"), ("shkia", "sunset")].into_iter()
    ///                                                                                   .collect();
    ///
    /// assert_eq!(registry.snapshot().calculation_order().unwrap(), ["shkia", "tzais"]);
    /// ```
    pub fn calculation_order(&self) -> Result<Vec<String>, CycleError> {
        let mut pending: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for (name, entry) in self.entries.iter() {
            let dependencies: BTreeSet<&str> =
                entry.references().filter(|r| self.contains(r)).collect();
            pending.insert(name, dependencies.len());
            for dependency in dependencies {
                dependents.entry(dependency).or_default().push(name);
            }
        }

        let mut ready: BTreeSet<&str> =
            pending.iter().filter(|(_, count)| **count == 0).map(|(name, _)| *name).collect();
        let mut order = Vec::with_capacity(pending.len());

        while let Some(name) = ready.pop_first() {
            pending.remove(name);
            order.push(name.to_string());
            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = pending.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if pending.is_empty() {
            Ok(order)
        } else {
            Err(CycleError { names: pending.keys().map(ToString::to_string).collect() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_source_keeps_the_compiled_tree() {
        let mut registry = FormulaRegistry::new();
        registry.define("alos", "solar(16.1, before_sunrise)");
        let before = Arc::clone(&registry.entries["alos"]);

        registry.define("alos", "solar(16.1, before_sunrise)");
        assert!(Arc::ptr_eq(&before, &registry.entries["alos"]));

        registry.define("alos", "solar(18, before_sunrise)");
        assert!(!Arc::ptr_eq(&before, &registry.entries["alos"]));
    }

    #[test]
    fn snapshots_do_not_see_later_changes() {
        let mut registry = FormulaRegistry::new();
        registry.define("a", "sunrise");
        let snapshot = registry.snapshot();

        registry.define("a", "sunset");
        registry.define("b", "sunrise");
        registry.remove("a");

        assert_eq!(snapshot.get("a").map(FormulaEntry::source), Some("sunrise"));
        assert!(!snapshot.contains("b"));
        assert_eq!(registry.snapshot().names(), ["b"]);
    }

    #[test]
    fn entries_with_syntax_errors_have_no_tree() {
        let entry = FormulaEntry::compile("broken", "sunrise +");
        assert!(entry.ast().is_none());
        assert!(entry.compilation().ast.is_some());
    }

    #[test]
    fn reaches_follows_reference_chains() {
        let registry: FormulaRegistry =
            [("a", "@b"), ("b", "@c + 5min"), ("c", "sunrise")].into_iter().collect();
        let snapshot = registry.snapshot();
        assert!(snapshot.reaches("a", "c"));
        assert!(!snapshot.reaches("c", "a"));
    }

    #[test]
    fn calculation_order_reports_cycles() {
        let registry: FormulaRegistry =
            [("a", "@b"), ("b", "@a"), ("c", "@a + 5min"), ("d", "sunrise")].into_iter().collect();
        let error = registry.snapshot().calculation_order().unwrap_err();
        assert_eq!(error.names, ["a", "b", "c"]);
    }

    #[test]
    fn calculation_order_ignores_missing_references() {
        let registry: FormulaRegistry = [("a", "@ghost + 5min")].into_iter().collect();
        assert_eq!(registry.snapshot().calculation_order().unwrap(), ["a"]);
    }
}
