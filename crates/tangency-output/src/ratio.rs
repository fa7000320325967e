//! Serde adapter for ratios that may be infinite.
//!
//! JSON has no infinity, so `±∞` is written as the strings `"inf"` and `"-inf"`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

pub(crate) fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_none()
    } else if *value > 0.0 {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(f64::NAN),
        Some(Repr::Number(value)) => Ok(value),
        Some(Repr::Text(text)) => match text.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            other => Err(D::Error::custom(format!("invalid ratio {other:?}"))),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Wrapper(#[serde(with = "super")] f64);

    #[test]
    fn test_infinite_ratio_as_string() {
        assert_eq!(serde_json::to_string(&Wrapper(f64::INFINITY)).unwrap(), "\"inf\"");
        assert_eq!(serde_json::to_string(&Wrapper(f64::NEG_INFINITY)).unwrap(), "\"-inf\"");
        assert_eq!(serde_json::to_string(&Wrapper(1.5)).unwrap(), "1.5");

        let back: Wrapper = serde_json::from_str("\"-inf\"").unwrap();
        assert_eq!(back.0, f64::NEG_INFINITY);
        assert!(serde_json::from_str::<Wrapper>("\"big\"").is_err());
    }
}
