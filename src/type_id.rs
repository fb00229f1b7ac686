//! Type identity utilities.
//!
//! Rust has no first-class inheritance, so "base chain" / "implemented
//! interfaces" are modeled as an explicit relation graph that a type optionally
//! registers alongside itself — the engine cannot discover trait impls
//! reflectively at runtime, so it is told about them instead. A type
//! that never declares relations is simply unrelated to everything but
//! itself, which is the correct, conservative default.

use std::collections::{HashMap, HashSet, VecDeque};

/// Whether a type can be the target of `create_instance` at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// A concrete, instantiable type.
    Concrete,
    /// An interface (trait-object family) — can never be directly instantiated.
    Interface,
    /// An abstract base — can never be directly instantiated.
    Abstract,
}

impl TypeKind {
    pub fn is_instantiable(self) -> bool {
        matches!(self, TypeKind::Concrete)
    }
}

/// A declared base type and the interfaces/traits a type says it implements.
/// Populated by [`TypeGraph::declare_relations`]; consulted by
/// `inheritance_distance` and the blacklist walk.
#[derive(Debug, Clone, Default)]
struct TypeRelations {
    bases: Vec<String>,
    interfaces: Vec<String>,
}

/// Explicit base-chain / interface-implementation graph over canonical
/// type-id strings. Lives inside the registry
/// ([`crate::registry::ConverterRegistry`]); never global.
#[derive(Debug, Default)]
pub struct TypeGraph {
    relations: HashMap<String, TypeRelations>,
    kinds: HashMap<String, TypeKind>,
}

impl TypeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `type_name` extends `bases` and implements `interfaces`.
    pub fn declare_relations(
        &mut self,
        type_name: impl Into<String>,
        bases: impl IntoIterator<Item = String>,
        interfaces: impl IntoIterator<Item = String>,
    ) {
        let entry = self.relations.entry(type_name.into()).or_default();
        entry.bases.extend(bases);
        entry.interfaces.extend(interfaces);
    }

    pub fn declare_kind(&mut self, type_name: impl Into<String>, kind: TypeKind) {
        self.kinds.insert(type_name.into(), kind);
    }

    pub fn kind_of(&self, type_name: &str) -> TypeKind {
        self.kinds.get(type_name).copied().unwrap_or(TypeKind::Concrete)
    }

    fn bases_of(&self, type_name: &str) -> &[String] {
        self.relations
            .get(type_name)
            .map(|r| r.bases.as_slice())
            .unwrap_or(&[])
    }

    fn interfaces_of(&self, type_name: &str) -> &[String] {
        self.relations
            .get(type_name)
            .map(|r| r.interfaces.as_slice())
            .unwrap_or(&[])
    }

    /// `inheritance_distance(base, derived)`: 0 if identical,
    /// the hop count through declared base types if `derived` extends
    /// `base`, `1 + hop-count` through a declared interface set, or -1 if
    /// unrelated.
    pub fn inheritance_distance(&self, base: &str, derived: &str) -> i64 {
        if base == derived {
            return 0;
        }
        // BFS over the base chain first (shortest path via `bases`).
        if let Some(d) = self.bfs(derived, base, false) {
            return d;
        }
        // Then via implemented interfaces, penalized by one hop: a
        // cross-implementation distance is 1 + hop-count.
        if let Some(d) = self.bfs(derived, base, true) {
            return d + 1;
        }
        -1
    }

    fn bfs(&self, start: &str, target: &str, via_interfaces: bool) -> Option<i64> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, i64)> = VecDeque::new();
        queue.push_back((start, 0));
        visited.insert(start);
        while let Some((current, dist)) = queue.pop_front() {
            let neighbors = if via_interfaces {
                self.interfaces_of(current)
            } else {
                self.bases_of(current)
            };
            for next in neighbors {
                if next == target {
                    return Some(dist + 1);
                }
                if visited.insert(next.as_str()) {
                    queue.push_back((next, dist + 1));
                }
            }
        }
        None
    }

    /// True if `derived` is `base` or (transitively) extends/implements it.
    pub fn is_castable(&self, derived: &str, base: &str) -> bool {
        self.inheritance_distance(base, derived) >= 0
    }

    /// Every ancestor (base, transitively) of `type_name`, nearest first.
    pub fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut frontier = vec![type_name.to_string()];
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(t) = frontier.pop() {
            for base in self.bases_of(&t) {
                if seen.insert(base.clone()) {
                    out.push(base.clone());
                    frontier.push(base.clone());
                }
            }
        }
        out
    }

    /// Every interface (transitively, including via base types)
    /// `type_name` implements.
    pub fn all_interfaces(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut frontier = vec![type_name.to_string()];
        frontier.extend(self.ancestors(type_name));
        for t in frontier {
            for iface in self.interfaces_of(&t) {
                if seen.insert(iface.clone()) {
                    out.push(iface.clone());
                }
            }
        }
        out
    }
}

/// Peels `Option<T>`'s canonical type-id down to `T`'s
/// "nullability peel". Canonical option ids always have the shape
/// `Option<Inner>`.
pub fn peel_nullable(type_name: &str) -> &str {
    if let Some(inner) = type_name
        .strip_prefix("Option<")
        .and_then(|s| s.strip_suffix('>'))
    {
        inner
    } else {
        type_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_zero_for_identical_type() {
        let g = TypeGraph::new();
        assert_eq!(g.inheritance_distance("Animal", "Animal"), 0);
    }

    #[test]
    fn distance_unrelated_is_negative_one() {
        let g = TypeGraph::new();
        assert_eq!(g.inheritance_distance("Animal", "Rock"), -1);
    }

    #[test]
    fn distance_via_base_chain() {
        let mut g = TypeGraph::new();
        g.declare_relations("Dog", ["Animal".to_string()], []);
        g.declare_relations("Animal", ["LivingThing".to_string()], []);
        assert_eq!(g.inheritance_distance("LivingThing", "Dog"), 2);
        assert_eq!(g.inheritance_distance("Animal", "Dog"), 1);
    }

    #[test]
    fn distance_via_interface_adds_one_hop() {
        let mut g = TypeGraph::new();
        g.declare_relations("Dog", [], ["Pet".to_string()]);
        assert_eq!(g.inheritance_distance("Pet", "Dog"), 1);
    }

    #[test]
    fn peel_nullable_strips_option_wrapper() {
        assert_eq!(peel_nullable("Option<i32>"), "i32");
        assert_eq!(peel_nullable("i32"), "i32");
    }
}
