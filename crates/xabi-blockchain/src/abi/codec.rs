use std::collections::HashMap;

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    hex,
};
use serde_json::{Map, Value};
use xabi_domain::AbiParam;

const EMPTY_RESULT: &str = "Empty";

/// Raw argument strings keyed by parameter name (`param_<i>` for unnamed inputs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArguments(HashMap<String, String>);

impl CallArguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallArguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parse one raw argument into a typed value. Strings are taken verbatim,
/// everything else is trimmed first.
pub(super) fn coerce_argument(ty: &DynSolType, raw: &str) -> Result<DynSolValue, String> {
    let raw = match ty {
        DynSolType::String => raw,
        _ => raw.trim(),
    };
    ty.coerce_str(raw).map_err(|e| e.to_string())
}

/// Render decoded return values as text.
///
/// A single scalar renders in its natural form, booleans as `true`/`false`.
/// Structured values and multiple outputs render as pretty JSON with integers
/// as decimal strings. No values, or an empty string, render as `Empty`.
pub(super) fn render_outputs(values: &[DynSolValue], outputs: &[AbiParam]) -> String {
    match values {
        [] => EMPTY_RESULT.to_string(),
        [single] => {
            let param = outputs.first().cloned().unwrap_or_default();
            render_single(single, &param)
        }
        many => {
            let mut object = Map::new();
            for (index, value) in many.iter().enumerate() {
                let param = outputs.get(index).cloned().unwrap_or_default();
                let key = if param.name.is_empty() || object.contains_key(&param.name) {
                    index.to_string()
                } else {
                    param.name.clone()
                };
                object.insert(key, to_json(value, &param));
            }
            pretty(&Value::Object(object))
        }
    }
}

fn render_single(value: &DynSolValue, param: &AbiParam) -> String {
    match to_json(value, param) {
        Value::String(s) if s.is_empty() => EMPTY_RESULT.to_string(),
        Value::String(s) => s,
        Value::Bool(b) => b.to_string(),
        structured => pretty(&structured),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn to_json(value: &DynSolValue, param: &AbiParam) -> Value {
    match value {
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::Address(address) => Value::String(address.to_checksum(None)),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(hex::encode_prefixed(&word.as_slice()[..(*size).min(32)]))
        }
        DynSolValue::Function(function) => Value::String(hex::encode_prefixed(function.as_slice())),
        DynSolValue::Bytes(bytes) => Value::String(hex::encode_prefixed(bytes)),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let element = element_param(param);
            Value::Array(items.iter().map(|item| to_json(item, &element)).collect())
        }
        DynSolValue::Tuple(fields) => tuple_to_json(fields, &param.components),
        #[allow(unreachable_patterns)]
        other => Value::String(format!("{other:?}")),
    }
}

/// Tuples with fully named components render as objects, otherwise as arrays.
fn tuple_to_json(fields: &[DynSolValue], components: &[AbiParam]) -> Value {
    let named = components.len() == fields.len()
        && components.iter().all(|component| !component.name.is_empty());

    if named {
        let mut object = Map::new();
        for (field, component) in fields.iter().zip(components) {
            object.insert(component.name.clone(), to_json(field, component));
        }
        Value::Object(object)
    } else {
        let default = AbiParam::default();
        Value::Array(
            fields
                .iter()
                .enumerate()
                .map(|(index, field)| to_json(field, components.get(index).unwrap_or(&default)))
                .collect(),
        )
    }
}

fn element_param(param: &AbiParam) -> AbiParam {
    let ty = match param.ty.rfind('[') {
        Some(position) => param.ty[..position].to_string(),
        None => param.ty.clone(),
    };
    AbiParam {
        name: String::new(),
        ty,
        internal_type: None,
        components: param.components.clone(),
    }
}
