use std::rc::Rc;

use super::Directive;

/// Ordered name → directive map.
///
/// The iteration order is a semantic contract, not an implementation detail:
/// the substitution executor scans macros front to back, so which macro's
/// expansion becomes visible to subsequently-scanned macros depends on it.
/// Newly defined object-like macros go to the *front*; function-like and
/// native macros append to the back. Redefining a non-object-like macro
/// overwrites it in place.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<(String, Rc<Directive>)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: &str, directive: Directive) {
        let directive = Rc::new(directive);
        match &*directive {
            Directive::ObjectLike(_) => {
                self.remove(name);
                self.entries.insert(0, (name.to_owned(), directive));
            }
            _ => {
                if let Some(position) = self.position(name) {
                    self.entries[position].1 = directive;
                } else {
                    self.entries.push((name.to_owned(), directive));
                }
            }
        }
    }

    pub fn undef(&mut self, name: &str) -> bool {
        self.remove(name)
    }

    pub fn defined(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn find(&self, name: &str) -> Option<Rc<Directive>> {
        self.position(name).map(|i| self.entries[i].1.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<Directive>)> {
        self.entries.iter().map(|(name, d)| (name.as_str(), d))
    }

    /// Snapshot of the current iteration order. The executor works over this
    /// snapshot while it splices replacements into the body being scanned.
    pub fn snapshot(&self) -> Vec<(String, Rc<Directive>)> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(n, _)| n == name)
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(position) => {
                self.entries.remove(position);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_initial_state() {
        let registry = Registry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_define_and_undef() {
        let mut registry = Registry::new();
        registry.define("example", Directive::object_like(""));
        assert_eq!(registry.len(), 1);
        assert!(registry.defined("example"));

        assert!(registry.undef("example"));
        assert!(!registry.defined("example"));
        assert!(!registry.undef("example"));
    }

    #[test]
    fn test_object_like_macros_are_prepended() {
        let mut registry = Registry::new();
        registry.define("first", Directive::object_like("1"));
        registry.define("second", Directive::object_like("2"));

        let order: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["second", "first"]);
    }

    #[test]
    fn test_function_like_macros_are_appended() {
        let mut registry = Registry::new();
        registry.define("obj", Directive::object_like("1"));
        registry.define("f", Directive::function_like(vec!["x".into()], "x"));
        registry.define("obj2", Directive::object_like("2"));

        let order: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["obj2", "obj", "f"]);
    }

    #[test]
    fn test_redefined_object_like_moves_to_front() {
        let mut registry = Registry::new();
        registry.define("a", Directive::object_like("1"));
        registry.define("b", Directive::object_like("2"));
        registry.define("a", Directive::object_like("3"));

        let order: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["a", "b"]);
        match registry.find("a").unwrap().as_ref() {
            Directive::ObjectLike(d) => assert_eq!(d.body(), "3"),
            other => panic!("expected object-like directive, got {other:?}"),
        }
    }
}
