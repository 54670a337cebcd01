use serde::Serialize;

pub mod terminations;

/// Envelope shared by every API response: `{done, message?, data?, count?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            done: true,
            message: None,
            data: Some(data),
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            done: false,
            message: Some(message.into()),
            data: None,
            count: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// A failed list keeps the shape of a list: no records, zero count.
    pub fn empty_list(message: impl Into<String>) -> Self {
        Self {
            done: false,
            message: Some(message.into()),
            data: Some(Vec::new()),
            count: Some(0),
        }
    }
}
