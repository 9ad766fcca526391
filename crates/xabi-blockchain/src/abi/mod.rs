mod codec;
mod registry;

use serde_json::Value;
use thiserror::Error;
use xabi_domain::{AbiFunctionDescriptor, AbiParam, StateMutability};

use crate::ErrorKind;

pub use codec::CallArguments;
pub use registry::{CompiledFunction, FunctionRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("Invalid ABI JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("ABI document must be a JSON array of entries")]
    NotAnArray,

    #[error("Malformed ABI entry #{index}: {reason}")]
    MalformedAbi { index: usize, reason: String },

    #[error("Function '{name}' not found in ABI")]
    UnknownFunction { name: String },

    #[error("Function name '{name}' is overloaded; use one of: {}", candidates.join(", "))]
    AmbiguousFunction {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Unsupported type '{ty}' in {signature}: {reason}")]
    UnsupportedType {
        signature: String,
        ty: String,
        reason: String,
    },

    #[error("Missing argument '{name}'")]
    MissingArgument { name: String },

    #[error("Invalid value for argument '{name}' ({ty}): {reason}")]
    InvalidArgument {
        name: String,
        ty: String,
        reason: String,
    },

    #[error("Failed to decode result of {signature}: {reason}")]
    Decode { signature: String, reason: String },
}

impl AbiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AbiError::InvalidJson { .. }
            | AbiError::NotAnArray
            | AbiError::MalformedAbi { .. }
            | AbiError::UnknownFunction { .. }
            | AbiError::AmbiguousFunction { .. } => ErrorKind::Validation,
            AbiError::UnsupportedType { .. }
            | AbiError::MissingArgument { .. }
            | AbiError::InvalidArgument { .. }
            | AbiError::Decode { .. } => ErrorKind::CallExecution,
        }
    }
}

/// How a function is offered to the user. Derived from mutability and arity only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    ReadNoInput,
    ReadWithInput,
    Write,
}

impl OperationClass {
    pub fn of(descriptor: &AbiFunctionDescriptor) -> Self {
        match (
            descriptor.state_mutability.is_read_only(),
            descriptor.inputs.is_empty(),
        ) {
            (true, true) => OperationClass::ReadNoInput,
            (true, false) => OperationClass::ReadWithInput,
            (false, _) => OperationClass::Write,
        }
    }
}

/// Functions partitioned by [`OperationClass`], each class in ABI order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub read_no_input: Vec<AbiFunctionDescriptor>,
    pub read_with_input: Vec<AbiFunctionDescriptor>,
    pub write: Vec<AbiFunctionDescriptor>,
}

impl Classification {
    pub fn total(&self) -> usize {
        self.read_no_input.len() + self.read_with_input.len() + self.write.len()
    }
}

pub fn classify(descriptors: &[AbiFunctionDescriptor]) -> Classification {
    let mut classification = Classification::default();
    for descriptor in descriptors {
        let bucket = match OperationClass::of(descriptor) {
            OperationClass::ReadNoInput => &mut classification.read_no_input,
            OperationClass::ReadWithInput => &mut classification.read_with_input,
            OperationClass::Write => &mut classification.write,
        };
        bucket.push(descriptor.clone());
    }
    classification
}

/// Parse the `function` entries of an ABI JSON document.
///
/// Constructors, events, errors and fallbacks are skipped. A function entry
/// without a recognised `stateMutability` rejects the whole document.
pub fn parse_abi(raw_json: &str) -> Result<Vec<AbiFunctionDescriptor>, AbiError> {
    let document: Value = serde_json::from_str(raw_json).map_err(|e| AbiError::InvalidJson {
        reason: e.to_string(),
    })?;
    let Value::Array(entries) = document else {
        return Err(AbiError::NotAnArray);
    };

    let mut functions = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        if entry.get("type").and_then(Value::as_str) != Some("function") {
            continue;
        }
        functions.push(parse_function(index, entry)?);
    }

    Ok(functions)
}

fn parse_function(index: usize, entry: Value) -> Result<AbiFunctionDescriptor, AbiError> {
    let malformed = |reason: String| AbiError::MalformedAbi { index, reason };

    let name = entry
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| malformed("function entry has no name".to_string()))?
        .to_string();

    let mutability = entry
        .get("stateMutability")
        .ok_or_else(|| malformed(format!("function '{name}' has no stateMutability")))?;
    let state_mutability: StateMutability = serde_json::from_value(mutability.clone())
        .map_err(|_| malformed(format!("function '{name}' has unknown stateMutability {mutability}")))?;

    let params = |field: &str| -> Result<Vec<AbiParam>, AbiError> {
        match entry.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| malformed(format!("function '{name}' has invalid {field}: {e}"))),
        }
    };

    Ok(AbiFunctionDescriptor {
        inputs: params("inputs")?,
        outputs: params("outputs")?,
        name,
        state_mutability,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const ERC20_FRAGMENT: &str = r#"[
        {"type":"constructor","inputs":[],"stateMutability":"nonpayable"},
        {"name":"totalSupply","type":"function","inputs":[],"outputs":[{"type":"uint256"}],"stateMutability":"view"},
        {"name":"balanceOf","type":"function","inputs":[{"name":"owner","type":"address"}],"outputs":[{"type":"uint256"}],"stateMutability":"view"},
        {"name":"transfer","type":"function","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}],"outputs":[{"type":"bool"}],"stateMutability":"nonpayable"},
        {"name":"deposit","type":"function","inputs":[],"outputs":[],"stateMutability":"payable"},
        {"name":"DECIMALS","type":"function","inputs":[],"outputs":[{"type":"uint8"}],"stateMutability":"pure"},
        {"name":"Transfer","type":"event","inputs":[],"anonymous":false}
    ]"#;

    #[test]
    fn test_parse_abi_keeps_functions_only() {
        let functions = parse_abi(ERC20_FRAGMENT).unwrap();
        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["totalSupply", "balanceOf", "transfer", "deposit", "DECIMALS"]
        );
        assert_eq!(functions[1].inputs[0].name, "owner");
        assert_eq!(functions[3].state_mutability, StateMutability::Nonpayable);
    }

    #[test]
    fn test_parse_abi_rejects_missing_state_mutability() {
        let raw = r#"[{"name":"legacy","type":"function","inputs":[],"outputs":[],"constant":true}]"#;
        let err = parse_abi(raw).unwrap_err();
        assert!(matches!(err, AbiError::MalformedAbi { index: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_parse_abi_rejects_non_array_and_bad_json() {
        assert_eq!(parse_abi(r#"{"abi":[]}"#).unwrap_err(), AbiError::NotAnArray);
        assert!(matches!(
            parse_abi("not json").unwrap_err(),
            AbiError::InvalidJson { .. }
        ));
    }

    #[test]
    fn test_classify_partitions_every_function_once() {
        let functions = parse_abi(ERC20_FRAGMENT).unwrap();
        let classification = classify(&functions);

        assert_eq!(classification.total(), functions.len());
        let names = |list: &[AbiFunctionDescriptor]| -> Vec<String> {
            list.iter().map(|f| f.name.clone()).collect()
        };
        assert_eq!(names(&classification.read_no_input), vec!["totalSupply", "DECIMALS"]);
        assert_eq!(names(&classification.read_with_input), vec!["balanceOf"]);
        assert_eq!(names(&classification.write), vec!["transfer", "deposit"]);
    }

    #[test]
    fn test_payable_with_no_inputs_is_write() {
        let functions = parse_abi(ERC20_FRAGMENT).unwrap();
        assert_eq!(OperationClass::of(&functions[3]), OperationClass::Write);
    }
}
