// ABOUTME: Product-qualified object specifications such as `PRODUCT:BASELINE`.
// ABOUTME: Normalizes to upper case and validates both halves are present.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectSpecError {
    #[error("product name cannot be empty")]
    EmptyProduct,

    #[error("object name cannot be empty")]
    EmptyName,

    #[error("object spec must have the form PRODUCT:NAME, got '{0}'")]
    MissingSeparator(String),
}

/// A product-qualified engine object (baseline, project, or stream).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectSpec {
    product: String,
    name: String,
}

impl ObjectSpec {
    pub fn new(product: &str, name: &str) -> Result<Self, ObjectSpecError> {
        let product = product.trim();
        let name = name.trim();

        if product.is_empty() {
            return Err(ObjectSpecError::EmptyProduct);
        }
        if name.is_empty() {
            return Err(ObjectSpecError::EmptyName);
        }

        Ok(Self {
            product: product.to_uppercase(),
            name: name.to_uppercase(),
        })
    }

    /// Parse `PRODUCT:NAME`.
    pub fn parse(spec: &str) -> Result<Self, ObjectSpecError> {
        let (product, name) = spec
            .split_once(':')
            .ok_or_else(|| ObjectSpecError::MissingSeparator(spec.to_string()))?;
        Self::new(product, name)
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ObjectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.product, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_upper_case() {
        let spec = ObjectSpec::new("qlarius", "baseline_1").unwrap();
        assert_eq!(spec.to_string(), "QLARIUS:BASELINE_1");
    }

    #[test]
    fn parse_splits_on_first_colon() {
        let spec = ObjectSpec::parse("prod:main stream").unwrap();
        assert_eq!(spec.product(), "PROD");
        assert_eq!(spec.name(), "MAIN STREAM");
    }

    #[test]
    fn rejects_missing_parts() {
        assert_eq!(ObjectSpec::new("", "x"), Err(ObjectSpecError::EmptyProduct));
        assert_eq!(ObjectSpec::new("p", " "), Err(ObjectSpecError::EmptyName));
        assert!(matches!(
            ObjectSpec::parse("nocolon"),
            Err(ObjectSpecError::MissingSeparator(_))
        ));
    }
}
