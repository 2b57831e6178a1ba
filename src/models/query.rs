//! Query-related data models.
//!
//! This module defines the uniform result shape of executed SQL and the
//! statement purposes used to label failures.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Default query deadline in seconds.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// One result row: column name to portable value. A repeated column name keeps the last value.
pub type Row = serde_json::Map<String, JsonValue>;

/// Which statement a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    ListTables,
    TableInfo,
    ColumnsOf,
    Execute,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ListTables => "listTables",
            Self::TableInfo => "tableInfo",
            Self::ColumnsOf => "columnsOf",
            Self::Execute => "execute",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of an executed statement.
///
/// Serializes as a bare JSON array for row sets and as `{"rows_affected": n}`
/// for statements that only report a count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryOutcome {
    Rows(Vec<Row>),
    Affected { rows_affected: u64 },
}

impl QueryOutcome {
    /// Build an outcome from collected rows and the summed affected count.
    ///
    /// A statement that yielded no rows and touched nothing reports an empty
    /// row set, which is also what an empty SELECT looks like.
    pub fn from_parts(rows: Vec<Row>, rows_affected: u64) -> Self {
        if rows.is_empty() && rows_affected > 0 {
            Self::Affected { rows_affected }
        } else {
            Self::Rows(rows)
        }
    }

    pub fn rows(&self) -> &[Row] {
        match self {
            Self::Rows(rows) => rows,
            Self::Affected { .. } => &[],
        }
    }

    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Rows(_) => None,
            Self::Affected { rows_affected } => Some(*rows_affected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rows_serialize_as_array() {
        let mut row = Row::new();
        row.insert("1".to_string(), json!(1));
        let outcome = QueryOutcome::Rows(vec![row]);
        assert_eq!(serde_json::to_value(&outcome).unwrap(), json!([{"1": 1}]));
    }

    #[test]
    fn test_affected_serializes_as_object() {
        let outcome = QueryOutcome::Affected { rows_affected: 3 };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"rows_affected": 3})
        );
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(
            QueryOutcome::from_parts(vec![], 2),
            QueryOutcome::Affected { rows_affected: 2 }
        );
        assert_eq!(QueryOutcome::from_parts(vec![], 0), QueryOutcome::Rows(vec![]));

        let mut row = Row::new();
        row.insert("n".to_string(), json!(1));
        let outcome = QueryOutcome::from_parts(vec![row], 0);
        assert_eq!(outcome.rows().len(), 1);
        assert_eq!(outcome.rows_affected(), None);
    }

    #[test]
    fn test_duplicate_column_last_value_wins() {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(1));
        row.insert("id".to_string(), json!(2));
        assert_eq!(row.len(), 1);
        assert_eq!(row["id"], json!(2));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ListTables.to_string(), "listTables");
        assert_eq!(Stage::TableInfo.to_string(), "tableInfo");
        assert_eq!(Stage::ColumnsOf.to_string(), "columnsOf");
        assert_eq!(Stage::Execute.to_string(), "execute");
    }
}
