use anyhow::Error as AnyError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};

/// An untyped (JSON) Object from which [TypedParameters](TypedParameter) can be parsed.
///
/// Can represent metadata, request objects or JWT claim sets.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UntypedObject(pub(crate) Map<String, Json>);

/// A strongly typed parameter that can represent metadata entries or request parameters.
pub trait TypedParameter:
    TryFrom<Json, Error = AnyError> + Into<Json> + Clone + std::fmt::Debug
{
    const KEY: &'static str;
}

impl UntypedObject {
    /// Get a [TypedParameter] from the Object.
    ///
    /// Note that this method clones the underlying data.
    pub fn get<T: TypedParameter>(&self) -> Option<anyhow::Result<T>> {
        Some(T::try_from(self.0.get(T::KEY)?.clone()))
    }

    /// Insert a [TypedParameter], returning the raw value it replaced.
    pub fn insert<T: TypedParameter>(&mut self, t: T) -> Option<Json> {
        self.0.insert(T::KEY.to_owned(), t.into())
    }
}

impl From<Map<String, Json>> for UntypedObject {
    fn from(value: Map<String, Json>) -> Self {
        Self(value)
    }
}

impl From<UntypedObject> for Json {
    fn from(value: UntypedObject) -> Self {
        value.0.into()
    }
}

pub trait ParsingErrorContext {
    type T: TypedParameter;

    fn parsing_error(self) -> Result<Self::T>;
}

impl<T: TypedParameter> ParsingErrorContext for Option<anyhow::Result<T>> {
    type T = T;

    fn parsing_error(self) -> Result<T> {
        self.ok_or_else(|| Error::Parse(format!("'{}' is missing", T::KEY)))?
            .parsing_error()
    }
}

impl<T: TypedParameter> ParsingErrorContext for anyhow::Result<T> {
    type T = T;

    fn parsing_error(self) -> Result<T> {
        self.map_err(|e| Error::Parse(format!("'{}' could not be parsed: {e}", T::KEY)))
    }
}

/// Declare a string-valued [TypedParameter].
macro_rules! string_parameter {
    ($(#[$meta:meta])* $name:ident, $key:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $crate::core::object::TypedParameter for $name {
            const KEY: &'static str = $key;
        }

        impl TryFrom<serde_json::Value> for $name {
            type Error = anyhow::Error;

            fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
                Ok(Self(serde_json::from_value(value)?))
            }
        }

        impl From<$name> for serde_json::Value {
            fn from(value: $name) -> Self {
                serde_json::Value::String(value.0)
            }
        }
    };
}

pub(crate) use string_parameter;
