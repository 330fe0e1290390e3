use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Function response envelope: `body` is itself a JSON string, which is the
/// shape callers of the collector already parse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Response {
    pub fn ok(body: &Value) -> Self {
        Self {
            status_code: 200,
            body: body.to_string(),
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            body: serde_json::json!({ "error": message }).to_string(),
        }
    }

    /// Parsed `body`, or an empty object when it is not valid JSON.
    pub fn parsed_body(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::Object(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_is_a_json_string() {
        let response = Response::ok(&json!({ "message": "done" }));
        let wire = serde_json::to_value(&response).unwrap();

        assert_eq!(wire["statusCode"], 200);
        assert_eq!(wire["body"], "{\"message\":\"done\"}");
        assert_eq!(response.parsed_body()["message"], "done");
    }

    #[test]
    fn error_carries_the_message() {
        let response = Response::error(500, "boom");

        assert_eq!(response.status_code, 500);
        assert_eq!(response.parsed_body()["error"], "boom");
    }
}
