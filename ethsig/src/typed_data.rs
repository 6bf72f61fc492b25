//! EIP-712 typed data as an explicit, validated schema.
//!
//! A [`TypedDataSchema`] is checked once at construction: every field type is
//! parsed into a [`FieldType`] tree, every struct reference must resolve, and
//! the primary type must be known (or inferable). Hashing afterwards can only
//! fail on the message values themselves.
//!
//! `encodeType`, `encodeData` and the signing hash are computed by
//! [`alloy_dyn_abi`]'s EIP-712 resolver, which also coerces JSON message
//! values (numeric strings, `"true"`, hex) the way wallets do.
//!
//! The `EIP712Domain` entry of the incoming `types` map, if any, is dropped.
//! The domain type is always derived from the populated [`TypedDataDomain`]
//! fields, in the canonical order `name, version, chainId, verifyingContract, salt`.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use alloy_dyn_abi::{Eip712Domain, PropertyDef, Resolver, TypeDef, TypedData};
use alloy_primitives::{Address, B256, U256, keccak256};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

const DOMAIN_TYPE: &str = "EIP712Domain";

/// Errors raised while building a schema or hashing a message against it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeEncodingError {
    /// A field references a struct type that is not defined.
    #[error("field {parent}.{field} references undefined type {referenced}")]
    UndefinedType {
        /// Struct holding the field.
        parent: String,
        /// Field name.
        field: String,
        /// The missing struct name.
        referenced: String,
    },
    /// A struct was requested by name but is not part of the schema.
    #[error("unknown struct type {0}")]
    UnknownStruct(String),
    /// A `types` key is not a valid struct name.
    #[error("invalid struct name {0:?}")]
    InvalidStructName(String),
    /// A field type string is not a valid EIP-712 type.
    #[error("unsupported type {ty:?} for field {parent}.{field}")]
    UnsupportedType {
        /// Struct holding the field.
        parent: String,
        /// Field name.
        field: String,
        /// The offending type string.
        ty: String,
    },
    /// The same field name appears twice in one struct.
    #[error("duplicate field {field} in {parent}")]
    DuplicateField {
        /// Struct holding the field.
        parent: String,
        /// Field name.
        field: String,
    },
    /// No `primaryType` given and every type is referenced by another.
    #[error("cannot infer primary type: every type is referenced by another")]
    NoPrimaryType,
    /// No `primaryType` given and several unreferenced types exist.
    #[error("ambiguous primary type, candidates: {0:?}")]
    AmbiguousPrimaryType(Vec<String>),
    /// A message value is missing or does not fit its declared type.
    #[error("cannot encode {struct_name}: {reason}")]
    Encoding {
        /// Struct being encoded.
        struct_name: String,
        /// The encoder's complaint.
        reason: String,
    },
}

impl TypeEncodingError {
    fn encoding(struct_name: &str, err: &alloy_dyn_abi::Error) -> Self {
        Self::Encoding {
            struct_name: struct_name.to_owned(),
            reason: err.to_string(),
        }
    }
}

/// Parsed form of an EIP-712 field type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `address`
    Address,
    /// `bool`
    Bool,
    /// `uintN`, bit width in `8..=256`.
    Uint(u16),
    /// `intN`, bit width in `8..=256`.
    Int(u16),
    /// `bytesN`, length in `1..=32`.
    FixedBytes(usize),
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// `T[]` or `T[k]`.
    Array(Box<FieldType>, Option<usize>),
    /// Reference to a struct defined in the schema.
    Struct(String),
}

impl FieldType {
    /// Parses a Solidity-style type string. Returns `None` when the string is
    /// not a valid EIP-712 type.
    #[must_use]
    pub fn parse(ty: &str) -> Option<Self> {
        if let Some(open) = ty.strip_suffix(']').and_then(|s| s.rfind('[')) {
            let inner = Self::parse(&ty[..open])?;
            let len = &ty[open + 1..ty.len() - 1];
            let len = if len.is_empty() {
                None
            } else {
                Some(len.parse::<usize>().ok()?)
            };
            return Some(Self::Array(Box::new(inner), len));
        }
        match ty {
            "address" => return Some(Self::Address),
            "bool" => return Some(Self::Bool),
            "string" => return Some(Self::String),
            "bytes" => return Some(Self::Bytes),
            "uint" => return Some(Self::Uint(256)),
            "int" => return Some(Self::Int(256)),
            _ => {}
        }
        if let Some(bits) = numeric_suffix(ty, "uint") {
            return parse_bits(bits).map(Self::Uint);
        }
        if let Some(bits) = numeric_suffix(ty, "int") {
            return parse_bits(bits).map(Self::Int);
        }
        if let Some(len) = numeric_suffix(ty, "bytes") {
            let len = len.parse::<usize>().ok()?;
            return (1..=32).contains(&len).then_some(Self::FixedBytes(len));
        }
        is_identifier(ty).then(|| Self::Struct(ty.to_owned()))
    }

    /// The struct this type ultimately refers to, looking through arrays.
    #[must_use]
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Self::Struct(name) => Some(name),
            Self::Array(inner, _) => inner.struct_name(),
            _ => None,
        }
    }
}

fn numeric_suffix<'a>(ty: &'a str, prefix: &str) -> Option<&'a str> {
    ty.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_bits(bits: &str) -> Option<u16> {
    if bits.starts_with('0') {
        return None;
    }
    let bits = bits.parse::<u16>().ok()?;
    (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits)
}

fn is_identifier(ty: &str) -> bool {
    let mut chars = ty.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A single `{ name, type }` member of a struct definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedField {
    /// Field name.
    pub name: String,
    /// Type string exactly as supplied.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// The EIP-712 domain. Only populated fields take part in the separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    /// Signing domain name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Signing domain version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// EIP-155 chain id; accepts a JSON number, decimal or hex string.
    #[serde(
        default,
        deserialize_with = "deserialize_chain_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub chain_id: Option<U256>,
    /// Verifying contract address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
    /// Disambiguating salt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<B256>,
}

fn deserialize_chain_id<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => uint_from_json(&value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Wire shape of typed-data JSON, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTypedData {
    types: BTreeMap<String, Vec<TypedField>>,
    #[serde(default)]
    primary_type: Option<String>,
    #[serde(default)]
    domain: TypedDataDomain,
    #[serde(default)]
    message: Value,
}

/// A validated EIP-712 payload: struct definitions, primary type, domain and message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTypedData")]
pub struct TypedDataSchema {
    types: BTreeMap<String, Vec<TypedField>>,
    resolver: Resolver,
    primary_type: String,
    domain: TypedDataDomain,
    message: Value,
}

impl TryFrom<RawTypedData> for TypedDataSchema {
    type Error = TypeEncodingError;

    fn try_from(raw: RawTypedData) -> Result<Self, Self::Error> {
        Self::new(raw.types, raw.primary_type, raw.domain, raw.message)
    }
}

impl TypedDataSchema {
    /// Validates the type definitions and resolves the primary type.
    ///
    /// When `primary_type` is `None` it is inferred as the only struct not
    /// referenced by any other struct.
    ///
    /// # Errors
    ///
    /// Returns [`TypeEncodingError`] for unparseable field types, duplicate
    /// fields, unresolved struct references, or an unknown or ambiguous
    /// primary type.
    pub fn new(
        mut types: BTreeMap<String, Vec<TypedField>>,
        primary_type: Option<String>,
        domain: TypedDataDomain,
        message: Value,
    ) -> Result<Self, TypeEncodingError> {
        types.remove(DOMAIN_TYPE);

        let mut resolver = Resolver::default();
        let mut referenced = BTreeSet::new();
        for (parent, fields) in &types {
            let mut seen = BTreeSet::new();
            let mut props = Vec::with_capacity(fields.len());
            for field in fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(TypeEncodingError::DuplicateField {
                        parent: parent.clone(),
                        field: field.name.clone(),
                    });
                }
                let unsupported = || TypeEncodingError::UnsupportedType {
                    parent: parent.clone(),
                    field: field.name.clone(),
                    ty: field.type_name.clone(),
                };
                let kind = FieldType::parse(&field.type_name).ok_or_else(unsupported)?;
                if let Some(name) = kind.struct_name() {
                    if !types.contains_key(name) {
                        return Err(TypeEncodingError::UndefinedType {
                            parent: parent.clone(),
                            field: field.name.clone(),
                            referenced: name.to_owned(),
                        });
                    }
                    if name != parent {
                        referenced.insert(name.to_owned());
                    }
                }
                props.push(
                    PropertyDef::new(field.type_name.as_str(), field.name.as_str())
                        .map_err(|_| unsupported())?,
                );
            }
            let def = TypeDef::new(parent.as_str(), props)
                .map_err(|_| TypeEncodingError::InvalidStructName(parent.clone()))?;
            resolver.ingest(def);
        }

        let primary_type = match primary_type {
            Some(primary) if types.contains_key(&primary) => primary,
            Some(primary) => return Err(TypeEncodingError::UnknownStruct(primary)),
            None => {
                let mut roots = types.keys().filter(|name| !referenced.contains(*name));
                match (roots.next(), roots.next()) {
                    (Some(root), None) => root.clone(),
                    (None, _) => return Err(TypeEncodingError::NoPrimaryType),
                    (Some(_), Some(_)) => {
                        let candidates = types
                            .keys()
                            .filter(|name| !referenced.contains(*name))
                            .cloned()
                            .collect();
                        return Err(TypeEncodingError::AmbiguousPrimaryType(candidates));
                    }
                }
            }
        };

        Ok(Self {
            types,
            resolver,
            primary_type,
            domain,
            message,
        })
    }

    /// Struct definitions, without `EIP712Domain`.
    #[must_use]
    pub const fn types(&self) -> &BTreeMap<String, Vec<TypedField>> {
        &self.types
    }

    /// Name of the struct the message is an instance of.
    #[must_use]
    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }

    /// The signing domain.
    #[must_use]
    pub const fn domain(&self) -> &TypedDataDomain {
        &self.domain
    }

    /// The message values.
    #[must_use]
    pub const fn message(&self) -> &Value {
        &self.message
    }

    /// Canonical type signature: the struct itself followed by every struct
    /// it references, transitively, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`TypeEncodingError::UnknownStruct`] when `name` is not defined.
    pub fn encode_type(&self, name: &str) -> Result<String, TypeEncodingError> {
        self.require_struct(name)?;
        self.resolver
            .encode_type(name)
            .map_err(|e| TypeEncodingError::encoding(name, &e))
    }

    /// `keccak256(encode_type(name))`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encode_type`].
    pub fn type_hash(&self, name: &str) -> Result<B256, TypeEncodingError> {
        self.encode_type(name).map(keccak256)
    }

    /// `keccak256(typeHash(name) ‖ encodeData(name, value))`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeEncodingError`] when `value` does not fit struct `name`.
    pub fn hash_struct(&self, name: &str, value: &Value) -> Result<B256, TypeEncodingError> {
        self.typed_data(name, value)?
            .hash_struct()
            .map_err(|e| TypeEncodingError::encoding(name, &e))
    }

    /// Hash of the populated domain fields under the derived `EIP712Domain` type.
    #[must_use]
    pub fn domain_separator(&self) -> B256 {
        self.eip712_domain().separator()
    }

    /// The EIP-712 signing hash of the message:
    /// `keccak256(0x1901 ‖ domainSeparator ‖ hashStruct(primaryType, message))`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeEncodingError::Encoding`] when the message does not fit
    /// the primary type.
    pub fn signing_hash(&self) -> Result<B256, TypeEncodingError> {
        self.typed_data(&self.primary_type, &self.message)?
            .eip712_signing_hash()
            .map_err(|e| TypeEncodingError::encoding(&self.primary_type, &e))
    }

    fn require_struct(&self, name: &str) -> Result<(), TypeEncodingError> {
        if self.types.contains_key(name) {
            Ok(())
        } else {
            Err(TypeEncodingError::UnknownStruct(name.to_owned()))
        }
    }

    fn eip712_domain(&self) -> Eip712Domain {
        let domain = &self.domain;
        Eip712Domain::new(
            domain.name.clone().map(Cow::Owned),
            domain.version.clone().map(Cow::Owned),
            domain.chain_id,
            domain.verifying_contract,
            domain.salt,
        )
    }

    fn typed_data(&self, name: &str, value: &Value) -> Result<TypedData, TypeEncodingError> {
        self.require_struct(name)?;
        Ok(TypedData {
            domain: self.eip712_domain(),
            resolver: self.resolver.clone(),
            primary_type: name.to_owned(),
            message: value.clone(),
        })
    }
}

fn uint_from_json(value: &Value) -> Result<U256, String> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("{n} is not an unsigned integer")),
        Value::String(s) => U256::from_str(s).map_err(|e| format!("{s:?}: {e}")),
        _ => Err("expected number or numeric string".into()),
    }
}
