use super::{parse_type, Generator};
use crate::error::{GeneratorError, Result};
use crate::type_index::{type_to_string, TypeDef, TypeKey};
use heck::ToUpperCamelCase;
use log::debug;

/// Name a type gets when nothing else names it.
///
/// Full names prefix the identifier with its module path in UpperCamelCase, so
/// `openapi::Y` becomes `OpenapiY`; short names are the bare identifier.
pub fn default_type_name(key: &TypeKey, full: bool) -> String {
    if !full {
        return key.ident.clone();
    }
    let mut name: String = key
        .module_path
        .iter()
        .map(|segment| segment.to_upper_camel_case())
        .collect();
    name.push_str(&key.ident);
    name
}

impl Generator {
    /// Returns the schema name of a type expression.
    ///
    /// `Option`, pointer wrappers and aliases are looked through. Anything that is not
    /// a named struct or enum has the empty name.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidTypeExpr`] if `ty` does not parse.
    pub fn type_name(&self, ty: &str) -> Result<String> {
        let ty = parse_type(ty)?;
        Ok(self
            .named_def(&ty, &[])
            .map(|def| self.name_of(&def))
            .unwrap_or_default())
    }

    /// Names a type explicitly, taking precedence over any other naming.
    ///
    /// Registering the same pair again is a no-op.
    ///
    /// # Errors
    ///
    /// Fails if `name` is empty, if the type already has a different override, if
    /// another type owns `name`, or if `ty` is not a named type.
    pub fn override_type_name(&mut self, ty: &str, name: &str) -> Result<()> {
        let parsed = parse_type(ty)?;
        let def = self
            .named_def(&parsed, &[])
            .ok_or_else(|| GeneratorError::UnnamedType(type_to_string(&parsed)))?;

        if name.is_empty() {
            return Err(GeneratorError::EmptyTypeName(def.key.to_string()));
        }
        if let Some(existing) = self.overrides.get(&def.key) {
            if existing == name {
                return Ok(());
            }
            return Err(GeneratorError::TypeAlreadyNamed {
                ty: def.key.to_string(),
                existing: existing.clone(),
            });
        }
        if let Some(owner) = self.owners.get(name).filter(|owner| **owner != def.key) {
            return Err(GeneratorError::NameTaken {
                name: name.to_string(),
                owner: owner.to_string(),
            });
        }

        debug!("Naming type `{}` `{}`", def.key, name);
        self.overrides.insert(def.key.clone(), name.to_string());
        self.owners.insert(name.to_string(), def.key.clone());
        Ok(())
    }

    /// Override, then self-chosen name, then default name.
    pub(crate) fn name_of(&self, def: &TypeDef) -> String {
        if let Some(name) = self.overrides.get(&def.key) {
            return name.clone();
        }
        let self_named = self
            .config
            .type_namer_method
            .as_deref()
            .and_then(|method| self.index.literal_method(&def.key, method));
        if let Some(name) = self_named {
            return name.to_string();
        }
        default_type_name(&def.key, self.full_names)
    }
}
