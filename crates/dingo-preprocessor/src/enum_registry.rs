//! Per-file registry of `enum` declarations, populated by the enum
//! pass and consulted by the rust-match pass (to resolve a bare variant
//! name to its owning type's tag constant) and later by the
//! exhaustiveness analyzer (to fetch a type's full variant set).

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone)]
pub struct VariantDef {
    pub name: String,
    pub tag_const: String,
    /// Empty for a unit variant, one synthetic field for a tuple
    /// variant (`Variant(T)`), named fields for a struct variant.
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub tag_type: String,
    pub variants: Vec<VariantDef>,
}

impl EnumDef {
    pub fn variant(&self, name: &str) -> Option<&VariantDef> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_names(&self) -> Vec<&str> {
        self.variants.iter().map(|v| v.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    enums: HashMap<String, EnumDef>,
}

impl EnumRegistry {
    pub fn register(&mut self, def: EnumDef) {
        self.enums.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&EnumDef> {
        self.enums.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }

    /// Finds the (possibly unique) enum declaring a variant with this
    /// name. Ambiguous if two registered enums share a variant name;
    /// the first registration wins, which is a known limitation of
    /// resolving variants without scrutinee type info.
    pub fn resolve_variant(&self, variant_name: &str) -> Option<(&EnumDef, &VariantDef)> {
        self.enums.values().find_map(|def| def.variant(variant_name).map(|v| (def, v)))
    }
}
