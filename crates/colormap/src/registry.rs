//! Named colormap lookup: custom registrations first, then built-ins.

use std::collections::BTreeMap;

use crate::builtin::BuiltinColormap;
use crate::color::Color;
use crate::colormap::Colormap;

/// Registry of colormaps available to an engine.
///
/// Custom names are matched exactly and shadow a built-in of the same name;
/// built-in names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ColormapRegistry {
    custom: BTreeMap<String, Colormap>,
}

impl ColormapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a custom colormap under its own name.
    pub fn register(&mut self, colormap: Colormap) -> Option<Colormap> {
        self.custom.insert(colormap.name().to_string(), colormap)
    }

    pub fn remove(&mut self, name: &str) -> Option<Colormap> {
        self.custom.remove(name)
    }

    pub fn custom(&self, name: &str) -> Option<&Colormap> {
        self.custom.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.custom.contains_key(name) || BuiltinColormap::from_name(name).is_some()
    }

    /// Materialize `name` as `n` LUT entries, or `None` if it is unknown.
    pub fn resolve(&self, name: &str, n: usize) -> Option<Vec<Color>> {
        if let Some(map) = self.custom.get(name) {
            return Some(map.resample(n));
        }
        BuiltinColormap::from_name(name).map(|builtin| builtin.generate(n))
    }

    /// Built-in names in canonical order, then custom names sorted. A custom
    /// map shadowing a built-in is listed once, in the built-in position.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = BuiltinColormap::ALL
            .iter()
            .map(|b| b.name().to_string())
            .collect();
        let builtin_count = names.len();
        for name in self.custom.keys() {
            if !names[..builtin_count].contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}
