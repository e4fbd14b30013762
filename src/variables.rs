//! Typed key/value inputs read by components while populating.

use std::collections::BTreeMap;

use crate::error::{LookupError, Result, VariableError};
use crate::math::Vector3;

/// One stored variable.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    Float(f64),
    Int(i64),
    Str(String),
    Vec3(Vector3),
}

impl From<f64> for Variable {
    fn from(v: f64) -> Self {
        Variable::Float(v)
    }
}

impl From<i64> for Variable {
    fn from(v: i64) -> Self {
        Variable::Int(v)
    }
}

impl From<i32> for Variable {
    fn from(v: i32) -> Self {
        Variable::Int(i64::from(v))
    }
}

impl From<&str> for Variable {
    fn from(v: &str) -> Self {
        Variable::Str(v.to_string())
    }
}

impl From<String> for Variable {
    fn from(v: String) -> Self {
        Variable::Str(v)
    }
}

impl From<Vector3> for Variable {
    fn from(v: Vector3) -> Self {
        Variable::Vec3(v)
    }
}

/// Conversion from a stored [`Variable`] into a concrete type.
///
/// Integers promote to floats. Nothing converts the other way.
pub trait FromVariable: Sized {
    /// Name used in type-mismatch errors.
    const TYPE_NAME: &'static str;

    fn from_variable(var: &Variable) -> Option<Self>;
}

impl FromVariable for f64 {
    const TYPE_NAME: &'static str = "float";

    #[allow(clippy::cast_precision_loss)]
    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Float(v) => Some(*v),
            Variable::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromVariable for i64 {
    const TYPE_NAME: &'static str = "int";

    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromVariable for i32 {
    const TYPE_NAME: &'static str = "int";

    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Int(v) => i32::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromVariable for usize {
    const TYPE_NAME: &'static str = "size";

    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Int(v) => usize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl FromVariable for String {
    const TYPE_NAME: &'static str = "string";

    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromVariable for Vector3 {
    const TYPE_NAME: &'static str = "vector";

    fn from_variable(var: &Variable) -> Option<Self> {
        match var {
            Variable::Vec3(v) => Some(*v),
            _ => None,
        }
    }
}

/// String-keyed table of model parameters.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: BTreeMap<String, Variable>,
}

impl VariableTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a variable.
    pub fn add_variable(&mut self, key: &str, value: impl Into<Variable>) {
        self.vars.insert(key.to_string(), value.into());
    }

    #[must_use]
    pub fn has_variable(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// The raw stored value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.vars.get(key)
    }

    /// Reads `key` as `T`.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the key is missing and a variable error if
    /// the stored value does not convert to `T`.
    pub fn eval<T: FromVariable>(&self, key: &str) -> Result<T> {
        let var = self
            .vars
            .get(key)
            .ok_or_else(|| LookupError::not_found("variable", key))?;
        convert(key, var)
    }

    /// Reads `key` as `T`, or returns `default` if the key is missing.
    ///
    /// # Errors
    ///
    /// Returns a variable error if the key exists with the wrong type.
    pub fn eval_def<T: FromVariable>(&self, key: &str, default: T) -> Result<T> {
        match self.vars.get(key) {
            Some(var) => convert(key, var),
            None => Ok(default),
        }
    }

    /// Reads `primary`, falling back to `fallback` if `primary` is missing.
    ///
    /// Components use this for `<key><name>` overrides of a shared `<key>`
    /// default.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if neither key exists and a variable error on
    /// a type mismatch.
    pub fn eval_pair<T: FromVariable>(&self, primary: &str, fallback: &str) -> Result<T> {
        if self.vars.contains_key(primary) {
            self.eval(primary)
        } else {
            self.eval(fallback)
        }
    }
}

fn convert<T: FromVariable>(key: &str, var: &Variable) -> Result<T> {
    T::from_variable(var).ok_or_else(|| {
        VariableError::TypeMismatch {
            key: key.to_string(),
            expected: T::TYPE_NAME,
        }
        .into()
    })
}

/// Material name to integer ID lookup. `"Void"` is always 0.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    materials: BTreeMap<String, i32>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        let mut materials = BTreeMap::new();
        materials.insert("Void".to_string(), 0);
        Self { materials }
    }
}

impl MaterialTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is already bound to a different ID.
    pub fn add_material(&mut self, name: &str, id: i32) -> Result<()> {
        match self.materials.get(name) {
            Some(&existing) if existing != id => Err(LookupError::duplicate("material", name).into()),
            _ => {
                self.materials.insert(name.to_string(), id);
                Ok(())
            }
        }
    }

    /// # Errors
    ///
    /// Returns a lookup error for an unknown material name.
    pub fn material(&self, name: &str) -> Result<i32> {
        self.materials
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::not_found("material", name).into())
    }

    /// Reads a variable holding either a material name or a numeric ID.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the variable or the named material is
    /// missing, and a variable error for any other stored type.
    pub fn eval_mat(&self, vars: &VariableTable, key: &str) -> Result<i32> {
        match vars.get(key) {
            Some(Variable::Str(name)) => self.material(name),
            Some(var) => convert(key, var),
            None => Err(LookupError::not_found("variable", key).into()),
        }
    }

    /// As [`Self::eval_mat`], with `default` used when `key` is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable exists but does not resolve.
    pub fn eval_def_mat(&self, vars: &VariableTable, key: &str, default: i32) -> Result<i32> {
        if vars.has_variable(key) {
            self.eval_mat(vars, key)
        } else {
            Ok(default)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CombLayerError;

    fn table() -> VariableTable {
        let mut vars = VariableTable::new();
        vars.add_variable("PipeLength", 40.0);
        vars.add_variable("PipeNLayers", 3);
        vars.add_variable("PipeMat", "Stainless304");
        vars.add_variable("PipeVoidMat", "Void");
        vars.add_variable("PipeOffset", Vector3::new(0.0, 2.0, 0.0));
        vars
    }

    #[test]
    fn typed_reads() {
        let vars = table();
        assert!((vars.eval::<f64>("PipeLength").unwrap() - 40.0).abs() < 1e-12);
        assert_eq!(vars.eval::<usize>("PipeNLayers").unwrap(), 3);
        assert_eq!(vars.eval::<String>("PipeMat").unwrap(), "Stainless304");
        assert_eq!(vars.eval::<Vector3>("PipeOffset").unwrap().y, 2.0);
    }

    #[test]
    fn int_promotes_but_float_does_not_truncate() {
        let vars = table();
        assert!((vars.eval::<f64>("PipeNLayers").unwrap() - 3.0).abs() < 1e-12);
        assert!(matches!(
            vars.eval::<i32>("PipeLength"),
            Err(CombLayerError::Variable(VariableError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn missing_and_default() {
        let vars = table();
        assert!(matches!(
            vars.eval::<f64>("PipeRadius"),
            Err(CombLayerError::Lookup(LookupError::NotFound { .. }))
        ));
        assert!((vars.eval_def("PipeRadius", 4.5).unwrap() - 4.5).abs() < 1e-12);
        assert!(vars.eval_def::<i32>("PipeMat", 1).is_err());
    }

    #[test]
    fn pair_prefers_primary() {
        let mut vars = table();
        vars.add_variable("PipeALength", 12.0);
        assert!((vars.eval_pair::<f64>("PipeALength", "PipeLength").unwrap() - 12.0).abs() < 1e-12);
        assert!((vars.eval_pair::<f64>("PipeBLength", "PipeLength").unwrap() - 40.0).abs() < 1e-12);
    }

    #[test]
    fn materials_resolve_by_name_or_id() {
        let vars = {
            let mut v = table();
            v.add_variable("FlangeMat", 7);
            v
        };
        let mut mats = MaterialTable::new();
        mats.add_material("Stainless304", 3).unwrap();
        assert_eq!(mats.eval_mat(&vars, "PipeMat").unwrap(), 3);
        assert_eq!(mats.eval_mat(&vars, "PipeVoidMat").unwrap(), 0);
        assert_eq!(mats.eval_mat(&vars, "FlangeMat").unwrap(), 7);
        assert_eq!(mats.eval_def_mat(&vars, "WallMat", 5).unwrap(), 5);
        assert!(mats.add_material("Stainless304", 4).is_err());
        assert!(mats.material("Copper").is_err());
    }
}
