//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some` fields
//! generate SET clauses in the dynamic UPDATE SQL. The same structs deserialize
//! straight from PATCH bodies: a missing key leaves the column alone, an
//! explicit `null` clears a nullable column.

pub mod client;
pub mod cpd;
pub mod mentoring;
pub mod profile;
pub mod session;

use serde::{Deserialize, Deserializer};

/// Distinguish an absent key (`None`) from an explicit `null` (`Some(None)`).
///
/// # Errors
///
/// Propagates the inner deserializer's error.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Accumulates `SET col = ?n` clauses and their parameters.
#[derive(Debug, Default)]
pub(crate) struct SetClauses {
    sets: Vec<String>,
    params: Vec<libsql::Value>,
}

impl SetClauses {
    pub(crate) fn push(&mut self, column: &str, value: impl Into<libsql::Value>) {
        self.params.push(value.into());
        self.sets.push(format!("{column} = ?{}", self.params.len()));
    }

    pub(crate) fn push_opt(&mut self, column: &str, value: Option<impl Into<libsql::Value>>) {
        match value {
            Some(v) => self.push(column, v),
            None => self.push(column, libsql::Value::Null),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Finish into `UPDATE {table} SET ..., updated_at = ? WHERE {key} = ? AND user_id = ?`.
    /// Tables keyed by `user_id` get a single condition.
    pub(crate) fn into_statement(
        mut self,
        table: &str,
        key_column: &str,
        key: &str,
        user_id: &str,
        now: &str,
    ) -> (String, Vec<libsql::Value>) {
        self.push("updated_at", now.to_string());
        let key_idx = self.params.len() + 1;
        self.params.push(key.to_string().into());
        let mut sql = format!(
            "UPDATE {table} SET {} WHERE {key_column} = ?{key_idx}",
            self.sets.join(", ")
        );
        if key_column != "user_id" {
            self.params.push(user_id.to_string().into());
            sql.push_str(&format!(" AND user_id = ?{}", key_idx + 1));
        }
        (sql, self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_clauses_number_parameters() {
        let mut sets = SetClauses::default();
        sets.push("name", "Ann".to_string());
        sets.push_opt("email", None::<String>);
        let (sql, params) = sets.into_statement("clients", "id", "cli-1", "user_1", "now");
        assert_eq!(
            sql,
            "UPDATE clients SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4 AND user_id = ?5"
        );
        assert_eq!(params.len(), 5);
    }

    #[test]
    fn user_keyed_table_has_single_condition() {
        let mut sets = SetClauses::default();
        sets.push("full_name", "Ann".to_string());
        let (sql, params) = sets.into_statement("profiles", "user_id", "user_1", "user_1", "now");
        assert_eq!(
            sql,
            "UPDATE profiles SET full_name = ?1, updated_at = ?2 WHERE user_id = ?3"
        );
        assert_eq!(params.len(), 3);
    }
}
