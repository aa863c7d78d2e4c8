use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding the resolved output path.
pub const RESPONSE_OUT: &str = "out";
/// Key holding the completed project.
pub const RESPONSE_PROJECT: &str = "project";

/// Core→host bag. Values keep their structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response {
    values: Map<String, Value>,
}

impl Response {
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.values.get(key) {
            Some(value) => Ok(Some(T::deserialize(value)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

#[derive(Debug, Default)]
pub struct ResponseBuilder {
    values: Map<String, Value>,
}

impl ResponseBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(mut self, key: &str, value: &T) -> Result<Self> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    #[must_use]
    pub fn flag(mut self, key: &str, value: bool) -> Self {
        self.values.insert(key.to_string(), Value::Bool(value));
        self
    }

    #[must_use]
    pub fn build(self) -> Response {
        Response {
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builds_typed_response() {
        let response = ResponseBuilder::new()
            .set(RESPONSE_OUT, &"/tmp/out")
            .unwrap()
            .set(RESPONSE_PROJECT, &vec!["a", "b"])
            .unwrap()
            .flag("fromCache", true)
            .build();

        assert_eq!(
            response.get::<String>(RESPONSE_OUT).unwrap().as_deref(),
            Some("/tmp/out")
        );
        assert_eq!(
            response.get::<Vec<String>>(RESPONSE_PROJECT).unwrap(),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(response.get::<bool>("fromCache").unwrap(), Some(true));
        assert_eq!(response.get::<bool>("missing").unwrap(), None);
        assert_eq!(
            response.keys().collect::<Vec<_>>(),
            vec!["fromCache", "out", "project"]
        );
    }

    #[test]
    fn wrong_type_is_an_error() {
        let response = ResponseBuilder::new().flag("fromCache", true).build();
        assert!(response.get::<String>("fromCache").is_err());
    }

    #[test]
    fn serializes_as_plain_object() {
        let response = ResponseBuilder::new().flag("fromCache", false).build();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"fromCache":false}"#
        );
    }
}
