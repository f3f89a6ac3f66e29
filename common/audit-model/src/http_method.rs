use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Verb allow-list for the audit record. Deserialization accepts any
/// letter case and canonicalizes to upper; an unknown value fails with a
/// message naming the offending string rather than a generic enum error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct HttpMethodVisitor;

impl<'de> Visitor<'de> for HttpMethodVisitor {
    type Value = HttpMethod;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("one of GET, POST, PUT, DELETE (any letter case)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        HttpMethod::parse(v).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid HTTP method {v:?}: allowed values are GET, POST, PUT, DELETE"
            ))
        })
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_str(HttpMethodVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_any_case() {
        let v: HttpMethod = serde_json::from_str("\"post\"").unwrap();
        assert_eq!(v, HttpMethod::Post);
        let v: HttpMethod = serde_json::from_str("\"PUT\"").unwrap();
        assert_eq!(v, HttpMethod::Put);
    }

    #[test]
    fn rejects_unknown_method_naming_it() {
        let err = serde_json::from_str::<HttpMethod>("\"PATCH\"").unwrap_err();
        assert!(err.to_string().contains("PATCH"));
    }

    #[test]
    fn serializes_canonical_upper() {
        let s = serde_json::to_string(&HttpMethod::Get).unwrap();
        assert_eq!(s, "\"GET\"");
    }
}
