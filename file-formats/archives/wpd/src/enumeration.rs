//! Named value tables for symbolic attribute editing

use crate::value::{AttributeType, AttributeValue};
use crate::{Error, Result};

/// A table of symbolic names bound to scalar values of one type.
///
/// Entries keep their declaration order (inherited entries first), and
/// reverse lookups return the first entry in that order carrying the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Enum {
    name: String,
    value_type: AttributeType,
    strict: bool,
    values: Vec<(String, AttributeValue)>,
}

impl Enum {
    /// Create an empty enumeration
    pub fn new(name: impl Into<String>, value_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            value_type,
            strict: false,
            values: Vec::new(),
        }
    }

    /// Set whether reverse-lookup misses should be reported during a dump
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Name of the enumeration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scalar type of every value in the table
    pub fn value_type(&self) -> AttributeType {
        self.value_type
    }

    /// Whether reverse-lookup misses are reported
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Declare a value. A name that already exists keeps its position and
    /// takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) -> Result<()> {
        if value.attribute_type() != self.value_type {
            return Err(Error::TypeMismatch {
                expected: self.value_type,
                found: value.attribute_type(),
            });
        }

        let name = name.into();
        match self.values.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name, value)),
        }
        Ok(())
    }

    /// Copy the table of `parent` into this enumeration.
    ///
    /// Inheritance only happens when both declare the same scalar type;
    /// returns whether the table was copied.
    pub fn inherit(&mut self, parent: &Enum) -> bool {
        if parent.value_type != self.value_type {
            return false;
        }
        self.values.clone_from(&parent.values);
        true
    }

    /// Look up the value declared for `symbol`
    pub fn get(&self, symbol: &str) -> Result<&AttributeValue> {
        self.values
            .iter()
            .find(|(name, _)| name == symbol)
            .map(|(_, value)| value)
            .ok_or_else(|| Error::UnknownSymbol {
                symbol: symbol.to_string(),
                enumeration: self.name.clone(),
            })
    }

    /// Look up an unsigned value by name
    pub fn get_unsigned(&self, symbol: &str) -> Result<u32> {
        self.get(symbol)?.as_unsigned()
    }

    /// Look up a signed value by name
    pub fn get_signed(&self, symbol: &str) -> Result<i32> {
        self.get(symbol)?.as_signed()
    }

    /// Look up a float value by name
    pub fn get_float(&self, symbol: &str) -> Result<f32> {
        self.get(symbol)?.as_float()
    }

    /// Look up a string value by name
    pub fn get_string(&self, symbol: &str) -> Result<&str> {
        self.get(symbol)?.as_str()
    }

    /// Find the first name declared for `value`
    pub fn get_name(&self, value: &AttributeValue) -> Result<&str> {
        self.values
            .iter()
            .find(|(_, candidate)| candidate.same_as(value))
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| Error::UnknownValue {
                value: value.to_string(),
                enumeration: self.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elements() -> Enum {
        let mut element = Enum::new("Element", AttributeType::Unsigned);
        element.insert("None", AttributeValue::Unsigned(0)).unwrap();
        element.insert("Fire", AttributeValue::Unsigned(1)).unwrap();
        element.insert("Ice", AttributeValue::Unsigned(2)).unwrap();
        element
    }

    #[test]
    fn test_lookup_by_name() {
        let element = elements();
        assert_eq!(element.get_unsigned("Fire").unwrap(), 1);
        assert!(matches!(
            element.get_unsigned("Water"),
            Err(Error::UnknownSymbol { ref symbol, .. }) if symbol == "Water"
        ));
        assert!(matches!(
            element.get_signed("Fire"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_reverse_lookup_is_first_in_declaration_order() {
        let mut element = elements();
        element.insert("Frost", AttributeValue::Unsigned(2)).unwrap();
        assert_eq!(element.get_name(&AttributeValue::Unsigned(2)).unwrap(), "Ice");
        assert!(matches!(
            element.get_name(&AttributeValue::Unsigned(9)),
            Err(Error::UnknownValue { .. })
        ));
    }

    #[test]
    fn test_insert_checks_type_and_overrides_in_place() {
        let mut element = elements();
        assert!(element.insert("Bad", AttributeValue::Signed(1)).is_err());

        element.insert("Fire", AttributeValue::Unsigned(7)).unwrap();
        assert_eq!(element.len(), 3);
        let names: Vec<_> = element.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["None", "Fire", "Ice"]);
        assert_eq!(element.get_unsigned("Fire").unwrap(), 7);
    }

    #[test]
    fn test_inherit_requires_same_type() {
        let parent = elements();

        let mut child = Enum::new("ElementEx", AttributeType::Unsigned);
        assert!(child.inherit(&parent));
        child.insert("Lightning", AttributeValue::Unsigned(3)).unwrap();
        assert_eq!(child.len(), 4);
        assert_eq!(child.get_unsigned("Ice").unwrap(), 2);

        let mut signed = Enum::new("Offsets", AttributeType::Signed);
        assert!(!signed.inherit(&parent));
        assert!(signed.is_empty());
    }

    #[test]
    fn test_string_and_float_tables() {
        let mut models = Enum::new("Model", AttributeType::String).with_strict(true);
        models.insert("Sword", AttributeValue::from("wea_sw01")).unwrap();
        assert!(models.is_strict());
        assert_eq!(models.get_string("Sword").unwrap(), "wea_sw01");
        assert_eq!(
            models.get_name(&AttributeValue::from("wea_sw01")).unwrap(),
            "Sword"
        );

        let mut rates = Enum::new("Rate", AttributeType::Float);
        rates.insert("Half", AttributeValue::Float(0.5)).unwrap();
        assert_eq!(rates.get_float("Half").unwrap(), 0.5);
        assert_eq!(rates.get_name(&AttributeValue::Float(0.5)).unwrap(), "Half");
    }
}
