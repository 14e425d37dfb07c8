use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for feature ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Interned feature identifier. Copy, and compares in O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeatureId(Spur);

impl FeatureId {
    /// Intern a string as a FeatureId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        FeatureId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &'static str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh random id (32 lowercase hex chars).
    pub fn generate() -> Self {
        let raw = uuid::Uuid::new_v4();
        Self::intern(&raw.simple().to_string())
    }
}

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for FeatureId {
    fn from(s: &str) -> Self {
        FeatureId::intern(s)
    }
}

impl Serialize for FeatureId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FeatureId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = FeatureId::intern("parcel_7");
        let b = FeatureId::intern("parcel_7");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "parcel_7");
    }

    #[test]
    fn generated_ids_are_unique_hex() {
        let a = FeatureId::generate();
        let b = FeatureId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
