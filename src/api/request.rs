use reqwest::Method;
use serde_json::Value;

/// Snapshot of an outbound API call.
///
/// The client keeps the whole request as a value so it can re-send it
/// unchanged after a token refresh. `retried` is the one-shot marker that
/// caps the automatic retry at a single attempt per request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub(crate) retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Attach an extra header, re-sent unchanged if the request is retried.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_set_method_and_path() {
        let request = ApiRequest::get("/courses");
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/courses");
        assert!(request.query.is_empty());
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert!(!request.retried);

        let request = ApiRequest::delete("/courses/42");
        assert_eq!(request.method, Method::DELETE);
    }

    #[test]
    fn test_query_parameters_accumulate_in_order() {
        let request = ApiRequest::get("/courses")
            .query("page", 2)
            .query("limit", 20)
            .query("search", "rust");
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "20".to_string()),
                ("search".to_string(), "rust".to_string()),
            ]
        );
    }

    #[test]
    fn test_headers_accumulate() {
        let request = ApiRequest::get("/courses")
            .header("x-client-feature", "beta")
            .header("accept-language", "bn-BD");
        assert_eq!(
            request.headers,
            vec![
                ("x-client-feature".to_string(), "beta".to_string()),
                ("accept-language".to_string(), "bn-BD".to_string()),
            ]
        );
    }

    #[test]
    fn test_json_body_attaches() {
        let request = ApiRequest::post("/auth/login")
            .json(serde_json::json!({ "email": "a@b.c", "password": "hunter2" }));
        assert_eq!(
            request.body.unwrap()["email"],
            serde_json::json!("a@b.c")
        );
    }
}
