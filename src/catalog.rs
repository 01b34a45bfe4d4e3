use std::collections::HashMap;

use crate::{
    error::{BoothError, BoothResult},
    filter::Filter,
    layout::Layout,
    presets,
};

/// An entry that can be looked up by id and validated before registration.
pub trait CatalogEntry: Clone {
    /// Used in `NotFound` errors, e.g. `"layout"`.
    const KIND: &'static str;

    fn id(&self) -> &str;
    fn validate(&self) -> BoothResult<()>;
}

impl CatalogEntry for Filter {
    const KIND: &'static str = "filter";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> BoothResult<()> {
        Filter::validate(self)
    }
}

impl CatalogEntry for Layout {
    const KIND: &'static str = "layout";

    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self) -> BoothResult<()> {
        Layout::validate(self)
    }
}

/// Ordered, read-only table of validated entries with unique ids.
#[derive(Clone, Debug)]
pub struct Catalog<T> {
    entries: Vec<T>,
    index_by_id: HashMap<String, usize>,
}

pub type FilterRegistry = Catalog<Filter>;
pub type LayoutRegistry = Catalog<Layout>;

impl<T: CatalogEntry> Catalog<T> {
    /// Validates every entry; any invalid or duplicate entry rejects the
    /// whole table.
    pub fn new(entries: impl IntoIterator<Item = T>) -> BoothResult<Self> {
        let mut catalog = Self {
            entries: Vec::new(),
            index_by_id: HashMap::new(),
        };
        catalog.extend(entries)?;
        Ok(catalog)
    }

    /// Appends entries after the existing ones. On error nothing is added.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = T>) -> BoothResult<()> {
        let mut staged = self.clone();
        for entry in entries {
            entry.validate()?;
            let id = entry.id().to_owned();
            if staged.index_by_id.contains_key(&id) {
                return Err(BoothError::validation(format!(
                    "duplicate {} id '{id}'",
                    T::KIND
                )));
            }
            staged.index_by_id.insert(id, staged.entries.len());
            staged.entries.push(entry);
        }
        *self = staged;
        Ok(())
    }

    pub fn list(&self) -> &[T] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> BoothResult<&T> {
        self.index_by_id
            .get(id)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| BoothError::not_found(T::KIND, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Catalog<Filter> {
    /// The built-in filters, `none` first.
    pub fn builtin() -> BoothResult<Self> {
        Self::new(presets::builtin_filters()?)
    }
}

impl Catalog<Layout> {
    /// The built-in layouts, `strip-4` first.
    pub fn builtin() -> BoothResult<Self> {
        Self::new(presets::builtin_layouts())
    }
}
