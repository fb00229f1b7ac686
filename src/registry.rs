//! The converter registry: priority-ranked converter chain
//! resolution, the type blacklist, and the two concurrent caches.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::converter::Converter;
use crate::reflect::{Reflect, Reflectable};
use crate::type_id::TypeGraph;

/// An instance factory: builds a fresh default-valued `Box<dyn Reflect>`
/// for one concrete registered type.
type Factory = dyn Fn() -> Box<dyn Reflect> + Send + Sync;

/// Caches are capped at this many entries; overflow triggers a full clear
/// rather than LRU eviction.
pub const CACHE_CAPACITY: usize = 1000;

#[derive(Default)]
struct Caches {
    /// `converter-chain-for-type -> ordered converter list`, indices into `converters`.
    chain: HashMap<String, Vec<usize>>,
    /// `type -> blacklisted?`.
    blacklisted: HashMap<String, bool>,
}

impl Caches {
    fn clear(&mut self) {
        self.chain.clear();
        self.blacklisted.clear();
    }
}

struct BlacklistSet {
    closed: HashSet<String>,
    open_generics: HashSet<String>,
}

/// Priority-ordered set of converters plus the type blacklist, guarded by
/// a single `RwLock`. Owned by the facade; lifetime = facade lifetime.
pub struct ConverterRegistry {
    converters: RwLock<Vec<Arc<dyn Converter>>>,
    blacklist: RwLock<BlacklistSet>,
    graph: RwLock<TypeGraph>,
    caches: RwLock<Caches>,
    capacity: usize,
    /// Type-ids whose `Reflectable::register_converters` has already run,
    /// so a type reachable from several fields only recurses once.
    registered: RwLock<HashSet<String>>,
    /// One factory per concrete type that has ever been registered, keyed
    /// by its type-id.
    factories: RwLock<HashMap<String, Arc<Factory>>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        ConverterRegistry {
            converters: RwLock::new(Vec::new()),
            blacklist: RwLock::new(BlacklistSet {
                closed: HashSet::new(),
                open_generics: HashSet::new(),
            }),
            graph: RwLock::new(TypeGraph::new()),
            caches: RwLock::new(Caches::default()),
            capacity,
            registered: RwLock::new(HashSet::new()),
            factories: RwLock::new(HashMap::new()),
        }
    }

    // -- instance construction -------------------------------------------

    /// Registers `T`'s converters and instance factory exactly once per
    /// type-id, recursing into whatever component types `T::register_converters`
    /// reaches. Safe to call repeatedly from every wrapper/field site that
    /// touches `T` — only the first call does any work.
    pub fn ensure_registered<T: Reflectable>(&self) {
        let name = T::static_type_name();
        {
            let mut registered = self.registered.write().expect("registry poisoned");
            if !registered.insert(name) {
                return;
            }
        }
        self.ensure_factory::<T>();
        T::register_converters(self);
    }

    /// Registers `T`'s instance factory if it doesn't have one yet, without
    /// touching the `register_converters` recursion.
    pub fn ensure_factory<T: Reflectable>(&self) {
        let name = T::static_type_name();
        let mut factories = self.factories.write().expect("registry poisoned");
        factories
            .entry(name)
            .or_insert_with(|| Arc::new(|| Box::new(T::create_default()) as Box<dyn Reflect>));
    }

    /// Builds a default instance of `type_name` via its registered factory,
    /// ignoring its declared [`crate::type_id::TypeKind`]. Callers that need
    /// the interface/abstract gate (the public `create_instance` surface on
    /// [`crate::converter::Engine`]) check `kind_of` themselves before
    /// calling this.
    pub fn create_instance(&self, type_name: &str) -> Option<Box<dyn Reflect>> {
        let factories = self.factories.read().expect("registry poisoned");
        factories.get(type_name).map(|factory| factory())
    }

    // -- converter management -------------------------------------------------

    pub fn add(&self, converter: Arc<dyn Converter>) {
        let mut converters = self.converters.write().expect("registry poisoned");
        converters.push(converter);
        self.invalidate_caches();
    }

    pub fn remove_by_name(&self, name: &str) {
        let mut converters = self.converters.write().expect("registry poisoned");
        converters.retain(|c| c.name() != name);
        self.invalidate_caches();
    }

    pub fn clear(&self) {
        self.converters.write().expect("registry poisoned").clear();
        self.invalidate_caches();
    }

    fn invalidate_caches(&self) {
        self.caches.write().expect("registry poisoned").clear();
    }

    /// `registry.chain(type) -> list<converter>`.
    ///
    /// Every converter's `priority(T)` is evaluated, priority-0 converters
    /// are dropped, the remainder is sorted descending by priority with
    /// ties broken by registration order (last-registered wins).
    pub fn chain(&self, type_name: &str) -> Vec<Arc<dyn Converter>> {
        if let Some(indices) = self.caches.read().expect("registry poisoned").chain.get(type_name) {
            let converters = self.converters.read().expect("registry poisoned");
            return indices.iter().filter_map(|&i| converters.get(i).cloned()).collect();
        }

        let converters = self.converters.read().expect("registry poisoned");
        let graph = self.graph.read().expect("registry poisoned");
        let mut scored: Vec<(usize, u32)> = converters
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.priority(type_name, &graph)))
            .filter(|(_, p)| *p > 0)
            .collect();
        // Stable sort descending by priority; since ties keep registration
        // order after a stable sort on the reversed index, the
        // last-registered among equal priorities ends up first.
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));

        let indices: Vec<usize> = scored.iter().map(|(i, _)| *i).collect();
        let result: Vec<Arc<dyn Converter>> = indices.iter().filter_map(|&i| converters.get(i).cloned()).collect();

        drop(graph);
        drop(converters);
        self.store_chain_cache(type_name, indices);
        result
    }

    fn store_chain_cache(&self, type_name: &str, indices: Vec<usize>) {
        let mut caches = self.caches.write().expect("registry poisoned");
        if caches.chain.len() >= self.capacity {
            debug!(cap = self.capacity, "converter chain cache full, clearing");
            caches.chain.clear();
        }
        caches.chain.insert(type_name.to_string(), indices);
    }

    // -- type graph -------------------------------------------------------

    pub fn declare_relations(
        &self,
        type_name: impl Into<String>,
        bases: impl IntoIterator<Item = String>,
        interfaces: impl IntoIterator<Item = String>,
    ) {
        self.graph
            .write()
            .expect("registry poisoned")
            .declare_relations(type_name, bases, interfaces);
        self.invalidate_caches();
    }

    pub fn declare_kind(&self, type_name: impl Into<String>, kind: crate::type_id::TypeKind) {
        self.graph.write().expect("registry poisoned").declare_kind(type_name, kind);
    }

    pub fn kind_of(&self, type_name: &str) -> crate::type_id::TypeKind {
        self.graph.read().expect("registry poisoned").kind_of(type_name)
    }

    pub fn with_graph<R>(&self, f: impl FnOnce(&TypeGraph) -> R) -> R {
        f(&self.graph.read().expect("registry poisoned"))
    }

    // -- blacklist ----------------------------------------------------------

    pub fn blacklist(&self, type_name: impl Into<String>) {
        self.blacklist.write().expect("registry poisoned").closed.insert(type_name.into());
        self.invalidate_caches();
    }

    pub fn blacklist_open_generic(&self, generic_definition: impl Into<String>) {
        self.blacklist
            .write()
            .expect("registry poisoned")
            .open_generics
            .insert(generic_definition.into());
        self.invalidate_caches();
    }

    pub fn blacklist_many(&self, type_names: impl IntoIterator<Item = String>) {
        let mut bl = self.blacklist.write().expect("registry poisoned");
        bl.closed.extend(type_names);
        drop(bl);
        self.invalidate_caches();
    }

    pub fn remove_from_blacklist(&self, type_name: &str) {
        self.blacklist.write().expect("registry poisoned").closed.remove(type_name);
        self.invalidate_caches();
    }

    pub fn all_blacklisted(&self) -> HashSet<String> {
        self.blacklist.read().expect("registry poisoned").closed.clone()
    }

    /// `is_blacklisted(T)`.
    pub fn is_blacklisted(&self, type_name: &str) -> bool {
        if let Some(cached) = self.caches.read().expect("registry poisoned").blacklisted.get(type_name) {
            return *cached;
        }
        let result = self.is_blacklisted_uncached(type_name);
        let mut caches = self.caches.write().expect("registry poisoned");
        if caches.blacklisted.len() >= self.capacity {
            caches.blacklisted.clear();
        }
        caches.blacklisted.insert(type_name.to_string(), result);
        result
    }

    fn is_blacklisted_uncached(&self, type_name: &str) -> bool {
        let bl = self.blacklist.read().expect("registry poisoned");
        if bl.closed.contains(type_name) {
            return true;
        }
        if let Some(def) = generic_definition_of(type_name) {
            if bl.open_generics.contains(&def) {
                return true;
            }
        }
        drop(bl);

        let graph = self.graph.read().expect("registry poisoned");
        let ancestors = graph.ancestors(type_name);
        let interfaces = graph.all_interfaces(type_name);
        drop(graph);

        for ancestor in &ancestors {
            if self.blacklist.read().expect("registry poisoned").closed.contains(ancestor) {
                return true;
            }
        }
        for iface in &interfaces {
            if self.is_blacklisted(iface) {
                return true;
            }
        }

        if let Some(element) = array_element_of(type_name) {
            if self.is_blacklisted(element) {
                return true;
            }
        }
        if let Some(args) = generic_args_of(type_name) {
            if args.iter().any(|a| self.is_blacklisted(a)) {
                return true;
            }
        }
        false
    }
}

/// `Vec<i32>` -> `Some("Vec")`. Returns `None` for non-generic type-ids.
fn generic_definition_of(type_name: &str) -> Option<String> {
    type_name.find('<').map(|i| type_name[..i].to_string())
}

/// `T[]` -> `Some("T")`.
fn array_element_of(type_name: &str) -> Option<&str> {
    type_name.strip_suffix("[]")
}

/// `Map<K, V>` -> `Some(["K", "V"])`, splitting on top-level commas only.
fn generic_args_of(type_name: &str) -> Option<Vec<&str>> {
    let open = type_name.find('<')?;
    let close = type_name.rfind('>')?;
    if close <= open {
        return None;
    }
    let inner = &type_name[open + 1..close];
    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_args_splits_top_level_commas_only() {
        assert_eq!(generic_args_of("Map<String, Vec<i32>>"), Some(vec!["String", "Vec<i32>"]));
        assert_eq!(generic_args_of("Vec<i32>"), Some(vec!["i32"]));
        assert_eq!(generic_args_of("i32"), None);
    }

    #[test]
    fn array_element_strips_suffix() {
        assert_eq!(array_element_of("i32[]"), Some("i32"));
        assert_eq!(array_element_of("i32"), None);
    }

    #[test]
    fn blacklist_is_monotonic_and_cache_invalidates() {
        let reg = ConverterRegistry::new();
        assert!(!reg.is_blacklisted("Secret"));
        reg.blacklist("Secret");
        assert!(reg.is_blacklisted("Secret"));
        reg.remove_from_blacklist("Secret");
        assert!(!reg.is_blacklisted("Secret"));
    }

    #[test]
    fn blacklist_propagates_through_base_chain() {
        let reg = ConverterRegistry::new();
        reg.declare_relations("Derived", ["Base".to_string()], []);
        reg.blacklist("Base");
        assert!(reg.is_blacklisted("Derived"));
    }

    #[test]
    fn blacklist_propagates_through_arrays_and_generics() {
        let reg = ConverterRegistry::new();
        reg.blacklist("Secret");
        assert!(reg.is_blacklisted("Secret[]"));
        assert!(reg.is_blacklisted("Vec<Secret>"));
        assert!(!reg.is_blacklisted("Vec<Public>"));
    }
}
