use std::{collections::HashMap, sync::Arc};

use alloy::{
    dyn_abi::{DynSolType, DynSolValue},
    primitives::{Bytes, keccak256},
};
use xabi_domain::{AbiFunctionDescriptor, AbiParam};

use super::{
    AbiError, Classification, OperationClass, classify,
    codec::{CallArguments, coerce_argument, render_outputs},
    parse_abi,
};

#[derive(Debug, Clone)]
struct FunctionTypes {
    inputs: Vec<DynSolType>,
    outputs: Vec<DynSolType>,
}

/// A function with its signature, selector and Solidity types resolved once.
///
/// Types that cannot be resolved do not remove the function; every
/// invocation of it fails with the resolution error instead.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    descriptor: AbiFunctionDescriptor,
    signature: String,
    selector: [u8; 4],
    class: OperationClass,
    types: Result<FunctionTypes, AbiError>,
}

impl CompiledFunction {
    pub fn compile(descriptor: AbiFunctionDescriptor) -> Self {
        let signature = descriptor.signature();
        let hash = keccak256(signature.as_bytes());
        let selector = [hash[0], hash[1], hash[2], hash[3]];
        let class = OperationClass::of(&descriptor);
        let types = resolve_types(&signature, &descriptor);

        Self {
            descriptor,
            signature,
            selector,
            class,
            types,
        }
    }

    pub fn descriptor(&self) -> &AbiFunctionDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    pub fn class(&self) -> OperationClass {
        self.class
    }

    fn types(&self) -> Result<&FunctionTypes, AbiError> {
        self.types.as_ref().map_err(Clone::clone)
    }

    /// Selector followed by the ABI-encoded arguments, bound in declared order.
    pub fn encode_call(&self, arguments: &CallArguments) -> Result<Bytes, AbiError> {
        let types = self.types()?;

        let mut values = Vec::with_capacity(types.inputs.len());
        for (index, (param, ty)) in self.descriptor.inputs.iter().zip(&types.inputs).enumerate() {
            let key = self.descriptor.argument_key(index);
            let raw = arguments
                .get(&key)
                .ok_or_else(|| AbiError::MissingArgument { name: key.clone() })?;
            let value = coerce_argument(ty, raw).map_err(|reason| AbiError::InvalidArgument {
                name: key.clone(),
                ty: param.canonical_type(),
                reason,
            })?;
            values.push(value);
        }

        let mut data = self.selector.to_vec();
        data.extend(DynSolValue::Tuple(values).abi_encode_params());
        Ok(Bytes::from(data))
    }

    /// Decode `eth_call` return data and render it as text.
    pub fn decode_output(&self, data: &[u8]) -> Result<String, AbiError> {
        let types = self.types()?;
        if types.outputs.is_empty() || data.is_empty() {
            return Ok(render_outputs(&[], &self.descriptor.outputs));
        }

        let decoded = DynSolType::Tuple(types.outputs.clone())
            .abi_decode_params(data)
            .map_err(|e| AbiError::Decode {
                signature: self.signature.clone(),
                reason: e.to_string(),
            })?;
        let values = match decoded {
            DynSolValue::Tuple(values) => values,
            other => vec![other],
        };

        Ok(render_outputs(&values, &self.descriptor.outputs))
    }
}

fn resolve_types(
    signature: &str,
    descriptor: &AbiFunctionDescriptor,
) -> Result<FunctionTypes, AbiError> {
    let resolve = |params: &[AbiParam]| -> Result<Vec<DynSolType>, AbiError> {
        params
            .iter()
            .map(|param| {
                let ty = param.canonical_type();
                DynSolType::parse(&ty).map_err(|e| AbiError::UnsupportedType {
                    signature: signature.to_string(),
                    ty,
                    reason: e.to_string(),
                })
            })
            .collect()
    };

    Ok(FunctionTypes {
        inputs: resolve(&descriptor.inputs)?,
        outputs: resolve(&descriptor.outputs)?,
    })
}

/// The callable surface of one contract, indexed by function signature.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<Arc<CompiledFunction>>,
    by_signature: HashMap<String, usize>,
}

impl FunctionRegistry {
    pub fn new(descriptors: Vec<AbiFunctionDescriptor>) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            let compiled = CompiledFunction::compile(descriptor);
            if registry.by_signature.contains_key(compiled.signature()) {
                tracing::warn!(
                    signature = %compiled.signature(),
                    "Duplicate function signature in ABI; keeping the first entry"
                );
                continue;
            }
            registry
                .by_signature
                .insert(compiled.signature().to_string(), registry.functions.len());
            registry.functions.push(Arc::new(compiled));
        }
        registry
    }

    pub fn from_json(raw_json: &str) -> Result<Self, AbiError> {
        Ok(Self::new(parse_abi(raw_json)?))
    }

    pub fn functions(&self) -> &[Arc<CompiledFunction>] {
        &self.functions
    }

    pub fn descriptors(&self) -> Vec<AbiFunctionDescriptor> {
        self.functions
            .iter()
            .map(|function| function.descriptor().clone())
            .collect()
    }

    pub fn classification(&self) -> Classification {
        classify(&self.descriptors())
    }

    /// Look a function up by full signature (`transfer(address,uint256)`) or,
    /// when the name is not overloaded, by bare name.
    pub fn resolve(&self, name_or_signature: &str) -> Result<Arc<CompiledFunction>, AbiError> {
        let key: String = name_or_signature
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if key.contains('(') {
            return self
                .by_signature
                .get(&key)
                .map(|&index| Arc::clone(&self.functions[index]))
                .ok_or(AbiError::UnknownFunction { name: key });
        }

        let mut matches = self.functions.iter().filter(|f| f.name() == key);
        match (matches.next(), matches.next()) {
            (Some(only), None) => Ok(Arc::clone(only)),
            (None, _) => Err(AbiError::UnknownFunction { name: key }),
            (Some(_), Some(_)) => Err(AbiError::AmbiguousFunction {
                candidates: self
                    .functions
                    .iter()
                    .filter(|f| f.name() == key)
                    .map(|f| f.signature().to_string())
                    .collect(),
                name: key,
            }),
        }
    }
}
