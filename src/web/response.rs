use serde::{Deserialize, Serialize};

/// Uniform response envelope for the JSON API.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenericResponse<T = serde_json::Value> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<T>,
}

impl<T> Default for GenericResponse<T> {
    fn default() -> Self {
        Self {
            success: false,
            message: None,
            object: None,
        }
    }
}

impl<T> GenericResponse<T> {
    pub fn ok(object: T) -> Self {
        Self {
            success: true,
            object: Some(object),
            ..Default::default()
        }
    }

    /// Payload without the success flag set.
    pub fn object(object: T) -> Self {
        Self {
            object: Some(object),
            ..Default::default()
        }
    }

    pub fn failure(messages: Vec<String>) -> Self {
        Self {
            message: Some(messages),
            ..Default::default()
        }
    }

    pub fn with_object(mut self, object: T) -> Self {
        self.object = Some(object);
        self
    }
}
