//! Predefined macros from the ISO C standards, seeded into a registry at
//! construction time.

use std::cell::Cell;
use std::rc::Rc;

use chrono::Utc;

use crate::directives::{Directive, Registry};

/// `__STDC_VERSION__` values for the supported language revisions.
pub mod c_version {
    pub const ISO_C94: i64 = 199409;
    pub const ISO_C99: i64 = 199901;
    pub const ISO_C11: i64 = 201112;
    pub const ISO_C18: i64 = 201710;
}

/// Host description seeded as predefined macros. The defaults describe a
/// freestanding C18 implementation without the optional features, which
/// matches what header-parsing callers expect.
#[derive(Debug, Clone)]
pub struct StandardEnvironment {
    pub version: i64,
    pub hosted: bool,
    pub atomics: bool,
    pub threads: bool,
    pub vla: bool,
}

impl Default for StandardEnvironment {
    fn default() -> Self {
        Self {
            version: c_version::ISO_C18,
            hosted: false,
            atomics: false,
            threads: false,
            vla: false,
        }
    }
}

impl StandardEnvironment {
    pub fn apply_to(&self, registry: &mut Registry) {
        let now = Utc::now();

        registry.define("__DATE__", Directive::object_like(&now.format("%b %d %Y").to_string()));
        registry.define("__TIME__", Directive::object_like(&now.format("%I:%M:%S").to_string()));

        registry.define("__STDC__", Directive::object_like(""));
        registry.define(
            "__STDC_VERSION__",
            Directive::object_like(&self.version.to_string()),
        );
        registry.define(
            "__STDC_HOSTED__",
            Directive::object_like(if self.hosted { "1" } else { "0" }),
        );

        if !self.atomics {
            registry.define("__STDC_NO_ATOMICS__", Directive::object_like("1"));
        }
        if !self.hosted {
            registry.define("__STDC_NO_COMPLEX__", Directive::object_like("1"));
        }
        if !self.threads {
            registry.define("__STDC_NO_THREADS__", Directive::object_like("1"));
        }
        if !self.vla {
            registry.define("__STDC_NO_VLA__", Directive::object_like("1"));
        }

        // Expands to an integer starting at 0, incremented on every use,
        // including uses inside included headers.
        let counter = Rc::new(Cell::new(0u64));
        registry.define(
            "__COUNTER__",
            Directive::native(0, 0, move |_| {
                let value = counter.get();
                counter.set(value + 1);
                value.to_string()
            }),
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_environment_seeds_standard_macros() {
        let mut registry = Registry::new();
        StandardEnvironment::default().apply_to(&mut registry);

        for name in [
            "__DATE__",
            "__TIME__",
            "__STDC__",
            "__STDC_VERSION__",
            "__STDC_HOSTED__",
            "__STDC_NO_ATOMICS__",
            "__STDC_NO_COMPLEX__",
            "__STDC_NO_THREADS__",
            "__STDC_NO_VLA__",
            "__COUNTER__",
        ] {
            assert!(registry.defined(name), "{name} should be predefined");
        }

        let version = registry.find("__STDC_VERSION__").unwrap();
        assert_eq!(version.invoke("__STDC_VERSION__", &[]).unwrap(), "201710");
    }

    #[test]
    fn test_hosted_environment_omits_the_no_complex_flag() {
        let mut registry = Registry::new();
        let env = StandardEnvironment {
            hosted: true,
            ..Default::default()
        };
        env.apply_to(&mut registry);
        assert!(!registry.defined("__STDC_NO_COMPLEX__"));
        let hosted = registry.find("__STDC_HOSTED__").unwrap();
        assert_eq!(hosted.invoke("__STDC_HOSTED__", &[]).unwrap(), "1");
    }

    #[test]
    fn test_counter_increments_per_use() {
        let mut registry = Registry::new();
        StandardEnvironment::default().apply_to(&mut registry);
        let counter = registry.find("__COUNTER__").unwrap();
        assert_eq!(counter.invoke("__COUNTER__", &[]).unwrap(), "0");
        assert_eq!(counter.invoke("__COUNTER__", &[]).unwrap(), "1");
    }
}
