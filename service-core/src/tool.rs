use serde::Serialize;

/// Response envelope for tool-style operations on resource servers.
///
/// Denials and argument problems are normal, reportable payloads rather than
/// HTTP errors, so a tool caller (an agent loop) can keep going after one.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ToolResponse<T> {
    Ok(T),
    Err { error: String },
}

impl<T> ToolResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        ToolResponse::Err {
            error: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_serializes_flat() {
        #[derive(Serialize)]
        struct Payload {
            users: Vec<String>,
        }
        let response = ToolResponse::Ok(Payload {
            users: vec!["linda_baker".to_string()],
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["users"][0], "linda_baker");
    }

    #[test]
    fn test_error_shape() {
        let response: ToolResponse<()> = ToolResponse::error("denied");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "denied");
    }
}
