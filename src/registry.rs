// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error::{Error, ErrorCode, Property, Result};
use crate::types::{CustomType, TypeDescriptor, BUILTIN_TYPE_NAMES};
use crate::Rc;

use dashmap::DashMap;

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::new(
            ErrorCode::SemanticUnionTypeInvalid,
            "type names must not be empty or whitespace-only",
        ));
    }
    let upper = name.to_ascii_uppercase();
    if BUILTIN_TYPE_NAMES.contains(&upper.as_str()) {
        return Err(Error::new(
            ErrorCode::SemanticDuplicateTypeName,
            format!("'{name}' is a builtin type"),
        )
        .with_property(Property::TypeName, name));
    }
    Ok(())
}

/// Thread-safe registry of named custom types.
///
/// Names are matched case-insensitively. Each entry resolves to one type or
/// to a flat, duplicate-free union of types.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    inner: DashMap<Rc<str>, Rc<CustomType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    /// Register `name` as a union of `members`.
    ///
    /// Custom members are replaced by what they stand for. A single member
    /// registers an alias rather than a union.
    pub fn register(&self, name: &str, members: Vec<TypeDescriptor>) -> Result<Rc<CustomType>> {
        validate_name(name)?;

        let mut flat = Vec::with_capacity(members.len());
        for member in members {
            if let TypeDescriptor::Custom(c) = &member {
                if c.name().eq_ignore_ascii_case(name) {
                    return Err(Error::new(
                        ErrorCode::SemanticUnionTypeInvalid,
                        format!("type '{name}' refers to itself"),
                    )
                    .with_property(Property::TypeName, name));
                }
            }
            flat.push(member.resolve().clone());
        }

        let target = match flat.len() {
            1 => flat.swap_remove(0),
            _ => TypeDescriptor::union(flat)?,
        };

        let key: Rc<str> = name.to_ascii_uppercase().into();
        use dashmap::mapref::entry::Entry;
        match self.inner.entry(key) {
            Entry::Occupied(e) => Err(Error::new(
                ErrorCode::SemanticDuplicateTypeName,
                format!("type '{}' is already registered", e.key()),
            )
            .with_property(Property::TypeName, name)),
            Entry::Vacant(e) => {
                let custom = Rc::new(CustomType::new(name, target));
                tracing::trace!(name, target = %custom.target(), "registered type");
                e.insert(custom.clone());
                Ok(custom)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Rc<CustomType>> {
        self.inner
            .get(name.to_ascii_uppercase().as_str())
            .map(|entry| Rc::clone(entry.value()))
    }

    pub fn remove(&self, name: &str) -> Option<Rc<CustomType>> {
        self.inner
            .remove(name.to_ascii_uppercase().as_str())
            .map(|(_, v)| v)
    }

    /// Registered names in the case they were registered with.
    pub fn list_names(&self) -> Vec<Rc<str>> {
        let mut names: Vec<Rc<str>> = self
            .inner
            .iter()
            .map(|entry| entry.value().name().into())
            .collect();
        names.sort();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name.to_ascii_uppercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

impl core::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.list_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntWidth;

    #[test]
    fn registers_and_resolves_names() {
        let registry = TypeRegistry::new();
        let t = registry
            .register(
                "Numberish",
                vec![TypeDescriptor::Int(IntWidth::Int8), TypeDescriptor::Float],
            )
            .unwrap();
        assert!(matches!(t.target(), TypeDescriptor::Union(u) if u.members().len() == 2));
        assert!(registry.contains("NUMBERISH"));
        assert_eq!(registry.list_names(), vec![Rc::from("Numberish")]);

        let parsed = TypeDescriptor::parse("numberish", Some(&registry)).unwrap();
        assert_eq!(parsed.to_string(), "Numberish");

        assert!(registry.remove("numberish").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_invalid_registrations() {
        let registry = TypeRegistry::new();
        let alias = registry.register("flag", vec![TypeDescriptor::Bool]).unwrap();

        for (name, members, code) in [
            ("flag", vec![TypeDescriptor::Float], ErrorCode::SemanticDuplicateTypeName),
            ("Integer", vec![TypeDescriptor::Float], ErrorCode::SemanticDuplicateTypeName),
            ("  ", vec![TypeDescriptor::Float], ErrorCode::SemanticUnionTypeInvalid),
            (
                "two",
                vec![TypeDescriptor::Bool, TypeDescriptor::Custom(alias.clone())],
                ErrorCode::SemanticUnionTypeInvalid,
            ),
            (
                "FLAG",
                vec![TypeDescriptor::Custom(alias.clone())],
                ErrorCode::SemanticUnionTypeInvalid,
            ),
        ] {
            let err = registry.register(name, members).unwrap_err();
            assert_eq!(err.code(), code, "{name}");
        }
        assert_eq!(registry.len(), 1);
    }
}
