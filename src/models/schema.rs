//! Schema-related data models.
//!
//! These are the shapes returned by `get_tables` and `get_table_detail`.

use serde::{Deserialize, Serialize};

/// Literal nullability markers. Kept as strings so callers can match them exactly.
pub const NULLABLE_YES: &str = "YES";
pub const NULLABLE_NO: &str = "NO";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub table_name: String,
    /// Empty when the engine has no comment support or none was set
    pub table_comment: String,
}

impl TableInfo {
    /// Create a new table info.
    pub fn new(table_name: impl Into<String>, table_comment: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            table_comment: table_comment.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub column_name: String,
    /// Engine-native type text, e.g. `varchar(64)`, `Nullable(String)`
    pub column_type: String,
    pub column_comment: String,
    /// Always exactly "YES" or "NO"
    pub is_nullable: String,
    pub column_default: Option<String>,
}

/// Table metadata plus its columns in ordinal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    #[serde(flatten)]
    pub info: TableInfo,
    pub columns: Vec<ColumnInfo>,
}

impl TableDetail {
    /// True when neither the table nor any column was found.
    pub fn is_empty(&self) -> bool {
        self.info.table_name.is_empty() && self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, column_type: &str, is_nullable: &str) -> ColumnInfo {
        ColumnInfo {
            column_name: name.to_string(),
            column_type: column_type.to_string(),
            column_comment: String::new(),
            is_nullable: is_nullable.to_string(),
            column_default: None,
        }
    }

    #[test]
    fn test_table_detail_flattens_info() {
        let email = ColumnInfo {
            column_comment: "login".to_string(),
            column_default: Some("''".to_string()),
            ..column("email", "varchar(255)", NULLABLE_YES)
        };
        let detail = TableDetail {
            info: TableInfo::new("users", "User accounts"),
            columns: vec![column("id", "bigint", NULLABLE_NO), email],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["table_name"], "users");
        assert_eq!(json["table_comment"], "User accounts");
        assert_eq!(json["columns"][0]["is_nullable"], "NO");
        assert_eq!(json["columns"][0]["column_default"], serde_json::Value::Null);
        assert_eq!(json["columns"][1]["is_nullable"], "YES");
        assert_eq!(json["columns"][1]["column_default"], "''");
        assert_eq!(json["columns"][1]["column_comment"], "login");
    }

    #[test]
    fn test_empty_detail() {
        let detail = TableDetail::default();
        assert!(detail.is_empty());

        let json = serde_json::to_string(&detail).unwrap();
        assert_eq!(
            json,
            r#"{"table_name":"","table_comment":"","columns":[]}"#
        );
    }
}
