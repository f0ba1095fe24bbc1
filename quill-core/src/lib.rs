//! Quill Core - Fundamental types
//!
//! This crate provides the core types used throughout Quill:
//! - `Value`: Tagged runtime values at the host/script boundary
//! - `ServiceError`: Structured errors from host-side services
//! - `LogSink`: Injected logging abstraction

mod error;
mod log;
mod value;

pub use error::ServiceError;
pub use log::{tracing_sink, LogSink, TracingSink};
pub use value::Value;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{LogSink, ServiceError, Value};
}

#[cfg(test)]
mod tests {
    use super::*;

    mod value_tests {
        use super::*;
        use std::collections::HashMap;

        #[test]
        fn test_from_i64() {
            let v: Value = 42i64.into();
            assert_eq!(v.as_number(), Some(42.0));
        }

        #[test]
        fn test_from_str() {
            let v: Value = "hello".into();
            assert_eq!(v.as_text(), Some("hello"));
        }

        #[test]
        fn test_from_vec() {
            let v: Value = vec![1i64, 2, 3].into();
            assert_eq!(v.as_list().map(|l| l.len()), Some(3));
        }

        #[test]
        fn test_type_name() {
            assert_eq!(Value::Number(0.0).type_name(), "Number");
            assert_eq!(Value::Text(String::new()).type_name(), "Text");
            assert_eq!(Value::Bool(true).type_name(), "Bool");
            assert_eq!(Value::Null.type_name(), "Null");
        }

        #[test]
        fn test_truthiness() {
            assert!(!Value::Null.is_truthy());
            assert!(!Value::Number(0.0).is_truthy());
            assert!(Value::Number(1.5).is_truthy());
            assert!(!Value::Text(String::new()).is_truthy());
            assert!(Value::Text("x".into()).is_truthy());
        }

        #[test]
        fn test_display_integral_number() {
            assert_eq!(Value::Number(5.0).to_string(), "5");
            assert_eq!(Value::Number(2.5).to_string(), "2.5");
        }

        #[test]
        fn test_display_object_sorted() {
            let mut map = HashMap::new();
            map.insert("b".to_string(), Value::Number(2.0));
            map.insert("a".to_string(), Value::Number(1.0));
            assert_eq!(Value::Object(map).to_string(), "{a: 1, b: 2}");
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_unknown_method_display() {
            let err = ServiceError::unknown_method("math", "frobnicate");
            let msg = err.to_string();
            assert!(msg.contains("math"));
            assert!(msg.contains("frobnicate"));
        }

        #[test]
        fn test_arg_count_display() {
            let err = ServiceError::arg_count("add", 2, 3);
            assert!(err.to_string().contains("expected 2"));
        }
    }
}
