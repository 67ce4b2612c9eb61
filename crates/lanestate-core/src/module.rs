use crate::function::{Function, FunctionAttributes, FunctionDecl, FunctionSignature};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: IndexMap<String, Function>,
    pub declarations: IndexMap<String, FunctionDecl>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
            declarations: IndexMap::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn kernels(&self) -> impl Iterator<Item = &Function> {
        self.functions.values().filter(|f| f.is_kernel())
    }

    pub fn resolve_callee(&self, name: &str) -> Option<(&FunctionSignature, &FunctionAttributes)> {
        if let Some(function) = self.functions.get(name) {
            return Some((&function.signature, &function.attributes));
        }
        self.declarations
            .get(name)
            .map(|decl| (&decl.signature, &decl.attributes))
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.declarations.contains_key(name)
    }
}
