//! Typed extraction of backend options from address parameters.
//!
//! Backends build their option structs by taking each known key out of an
//! [`Options`] bag, then either reject what is left ([`Options::finish`]) or
//! keep it as pass-through settings ([`Options::into_extra`]).
//!
//! ```rust
//! use libdata_core::{Address, Options};
//!
//! let addr = Address::parse("sqlite:///tmp/app.db?table=users&busy_timeout=250").unwrap();
//! let mut opts = Options::from_address(&addr);
//! let table = opts.take_string("table").unwrap();
//! let timeout = opts.take_u64("busy_timeout").unwrap().unwrap_or(5000);
//! opts.finish().unwrap();
//!
//! assert_eq!(table.as_deref(), Some("users"));
//! assert_eq!(timeout, 250);
//! ```

use serde_json::Value;

use crate::address::{Address, Parameters};
use crate::error::{DataError, DataResult};

/// Remaining, not yet consumed option values.
#[derive(Debug, Clone, Default)]
pub struct Options {
    values: Parameters,
}

impl Options {
    /// Options from an address's query parameters.
    pub fn from_address(address: &Address) -> Self {
        Self {
            values: address.parameters().clone(),
        }
    }

    /// Options from an explicit map.
    pub fn from_parameters(values: Parameters) -> Self {
        Self { values }
    }

    /// Take a raw value.
    pub fn take_value(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Take a boolean. `1`/`0` and `yes`/`no` are accepted too.
    pub fn take_bool(&mut self, key: &str) -> DataResult<Option<bool>> {
        let Some(value) = self.take_value(key) else {
            return Ok(None);
        };
        let parsed = match &value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_u64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "yes" | "on" | "true" => Some(true),
                "no" | "off" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| type_error(key, "a boolean", &value))
    }

    /// Take a non-negative integer.
    pub fn take_u64(&mut self, key: &str) -> DataResult<Option<u64>> {
        let Some(value) = self.take_value(key) else {
            return Ok(None);
        };
        value
            .as_u64()
            .map(Some)
            .ok_or_else(|| type_error(key, "a non-negative integer", &value))
    }

    /// Take a non-negative integer that fits `usize`.
    pub fn take_usize(&mut self, key: &str) -> DataResult<Option<usize>> {
        match self.take_u64(key)? {
            None => Ok(None),
            Some(n) => usize::try_from(n)
                .map(Some)
                .map_err(|_| DataError::invalid_option(key, format!("{n} is too large"))),
        }
    }

    /// Take a signed integer.
    pub fn take_i64(&mut self, key: &str) -> DataResult<Option<i64>> {
        let Some(value) = self.take_value(key) else {
            return Ok(None);
        };
        value
            .as_i64()
            .map(Some)
            .ok_or_else(|| type_error(key, "an integer", &value))
    }

    /// Take a string. Numbers and booleans are accepted in their text form,
    /// since a bare `table=2024` is coerced to an integer.
    pub fn take_string(&mut self, key: &str) -> DataResult<Option<String>> {
        let Some(value) = self.take_value(key) else {
            return Ok(None);
        };
        match value {
            Value::String(s) => Ok(Some(s)),
            Value::Number(n) => Ok(Some(n.to_string())),
            Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(type_error(key, "a string", &other)),
        }
    }

    /// Whether `key` has not been consumed yet.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Whether every option has been consumed.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fail on the first unconsumed option.
    pub fn finish(self) -> DataResult<()> {
        match self.values.keys().next() {
            None => Ok(()),
            Some(key) => Err(DataError::invalid_option(key.as_str(), "unrecognized option")),
        }
    }

    /// Hand back the unconsumed options as pass-through settings.
    pub fn into_extra(self) -> Parameters {
        self.values
    }
}

fn type_error(key: &str, expected: &str, got: &Value) -> DataError {
    DataError::invalid_option(key, format!("expected {expected}, got {got}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(query: &str) -> Options {
        let addr = Address::parse(&format!("x://host/?{query}")).unwrap();
        Options::from_address(&addr)
    }

    #[test]
    fn test_take_typed() {
        let mut o = opts("a=5&b=true&c=abc&d=-3&e=0");
        assert_eq!(o.take_u64("a").unwrap(), Some(5));
        assert_eq!(o.take_bool("b").unwrap(), Some(true));
        assert_eq!(o.take_string("c").unwrap().as_deref(), Some("abc"));
        assert_eq!(o.take_i64("d").unwrap(), Some(-3));
        assert_eq!(o.take_bool("e").unwrap(), Some(false));
        assert_eq!(o.take_u64("missing").unwrap(), None);
        assert!(o.is_empty());
        o.finish().unwrap();
    }

    #[test]
    fn test_wrong_type() {
        let mut o = opts("size=big&flag=maybe&n=-1");
        assert!(matches!(
            o.take_u64("size").unwrap_err(),
            DataError::InvalidOption { ref key, .. } if key == "size"
        ));
        assert!(o.take_bool("flag").is_err());
        assert!(o.take_usize("n").is_err());
    }

    #[test]
    fn test_numeric_string() {
        let mut o = opts("table=2024");
        assert_eq!(o.take_string("table").unwrap().as_deref(), Some("2024"));
    }

    #[test]
    fn test_unknown_rejected() {
        let mut o = opts("table=t&colour=red");
        o.take_string("table").unwrap();
        let err = o.finish().unwrap_err();
        assert_eq!(err.to_string(), "Invalid option 'colour': unrecognized option");
    }

    #[test]
    fn test_into_extra() {
        let mut o = opts("region=eu&anon=true");
        o.take_string("region").unwrap();
        let extra = o.into_extra();
        assert_eq!(extra.len(), 1);
        assert_eq!(extra.get("anon"), Some(&json!(true)));
    }
}
