//! JSON output formatting

use crate::engine::QueryResult;

pub fn format_json(result: &QueryResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaddockError;

    #[test]
    fn test_json_shape() {
        let parsed: serde_json::Value =
            serde_json::from_str(&format_json(&QueryResult::message("done"))).unwrap();
        assert_eq!(parsed["columns"][0]["name"], "result");
        assert_eq!(parsed["columns"][0]["type"], "TEXT");
        assert_eq!(parsed["rows"][0][0], "done");
        assert!(parsed.get("is_error").is_none());

        let err = QueryResult::error(&PaddockError::InvalidQuery("x".to_string()));
        let parsed: serde_json::Value = serde_json::from_str(&format_json(&err)).unwrap();
        assert_eq!(parsed["is_error"], true);
    }
}
