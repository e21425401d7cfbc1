//! Point lookups: architectures, instruction listings, instruction variants.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Missing, Page, PageMeta, PageRequest, ResolveError, ResolveResult};
use crate::model::{Architecture, Instruction, Register};
use crate::store::DataStore;

/// Column used to order paginated instruction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Mnemonic,
    Category,
    Extension,
    IsaSet,
    Description,
}

impl SortKey {
    /// Parse a column name; unknown names fall back to mnemonic.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "category" => SortKey::Category,
            "extension" => SortKey::Extension,
            "isa_set" => SortKey::IsaSet,
            "description" => SortKey::Description,
            _ => SortKey::Mnemonic,
        }
    }

    fn field<'a>(&self, instr: &'a Instruction) -> &'a str {
        match self {
            SortKey::Mnemonic => &instr.mnemonic,
            SortKey::Category => &instr.category,
            SortKey::Extension => &instr.extension,
            SortKey::IsaSet => &instr.isa_set,
            SortKey::Description => &instr.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc` in any case; anything else is ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Resolves architecture and instruction identifiers.
#[derive(Clone)]
pub struct LookupResolver {
    store: Arc<dyn DataStore>,
}

impl LookupResolver {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Every architecture, ordered by name.
    pub fn list_architectures(&self) -> ResolveResult<Vec<Arc<Architecture>>> {
        let mut out = Vec::new();
        for name in self.store.architecture_names()? {
            if let Some(arch) = self.store.architecture(&name)? {
                out.push(arch);
            }
        }
        Ok(out)
    }

    /// Architecture by exact (case-sensitive) name.
    pub fn architecture(&self, name: &str) -> ResolveResult<Arc<Architecture>> {
        self.store
            .architecture(name)?
            .ok_or_else(|| ResolveError::architecture_not_found(name))
    }

    /// Register file of an architecture ordered by (display type, name).
    pub fn registers(&self, arch: &str) -> ResolveResult<Vec<Register>> {
        let mut registers = self.architecture(arch)?.registers.clone();
        registers.sort_by(|a, b| {
            a.display_type()
                .cmp(b.display_type())
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(registers)
    }

    /// All instructions for an architecture, ordered by (mnemonic, variant).
    ///
    /// Unknown architecture is `NotFound`; a known architecture without
    /// instructions yields an empty list.
    pub fn instructions(&self, arch: &str) -> ResolveResult<Vec<Arc<Instruction>>> {
        self.ensure_architecture(arch)?;
        Ok(self.store.instructions(arch)?)
    }

    /// Every variant of a mnemonic within an architecture.
    pub fn instruction(&self, arch: &str, mnemonic: &str) -> ResolveResult<Vec<Arc<Instruction>>> {
        self.ensure_architecture(arch)?;
        let variants = self.store.instruction_variants(arch, mnemonic.trim())?;
        if variants.is_empty() {
            return Err(ResolveError::NotFound(Missing::Instruction {
                arch: arch.to_string(),
                mnemonic: mnemonic.trim().to_string(),
            }));
        }
        Ok(variants)
    }

    /// Number of instruction records for an architecture.
    pub fn instruction_count(&self, arch: &str) -> ResolveResult<usize> {
        self.ensure_architecture(arch)?;
        Ok(self.store.instruction_count(arch)?)
    }

    /// Unique mnemonics grouped by lowercased category, each group sorted.
    pub fn instruction_groups(&self, arch: &str) -> ResolveResult<BTreeMap<String, Vec<String>>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for instr in self.instructions(arch)? {
            let group = groups.entry(instr.category.to_lowercase()).or_default();
            if !group.contains(&instr.mnemonic) {
                group.push(instr.mnemonic.clone());
            }
        }
        for group in groups.values_mut() {
            group.sort();
        }
        Ok(groups)
    }

    /// One page of an architecture's instructions in the requested order.
    pub fn instructions_page(
        &self,
        arch: &str,
        request: PageRequest,
        sort_by: SortKey,
        direction: SortDirection,
    ) -> ResolveResult<Page<Arc<Instruction>>> {
        let mut all = self.instructions(arch)?;
        all.sort_by(|a, b| {
            let primary = sort_by.field(a).cmp(sort_by.field(b));
            let primary = match direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary
                .then_with(|| a.mnemonic.cmp(&b.mnemonic))
                .then_with(|| a.variant.cmp(&b.variant))
        });

        let meta = PageMeta::new(request, all.len());
        let items = all
            .into_iter()
            .skip(request.offset())
            .take(request.page_size)
            .collect();
        Ok(Page { items, meta })
    }

    fn ensure_architecture(&self, arch: &str) -> ResolveResult<()> {
        if self.store.has_architecture(arch)? {
            Ok(())
        } else {
            Err(ResolveError::architecture_not_found(arch))
        }
    }
}
