//! Small query-specification layer over the store.
//!
//! Read paths describe what they want as a [`Select`] — table, equality and
//! range filters, ordering, limit — and a generic executor turns that into
//! SQL. Table and column names are `&'static str` constants owned by the
//! `db` module, never caller input.

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;

use crate::error::StoreError;

#[derive(Debug, Clone)]
pub enum SqlValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Int(v as i64)
    }
}

#[derive(Debug, Clone)]
enum Filter {
    Eq(&'static str, SqlValue),
    Lt(&'static str, SqlValue),
    /// Inclusive range, `column BETWEEN lo AND hi`.
    Between(&'static str, SqlValue, SqlValue),
    IsNull(&'static str),
    IsNotNull(&'static str),
}

#[derive(Debug, Clone, Copy)]
enum Order {
    Asc,
    Desc,
}

/// Declarative single-table select.
#[derive(Debug, Clone)]
pub struct Select {
    table: &'static str,
    filters: Vec<Filter>,
    order: Vec<(&'static str, Order)>,
    limit: Option<i64>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn lt(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.filters.push(Filter::Lt(column, value.into()));
        self
    }

    pub fn between(
        mut self,
        column: &'static str,
        lo: impl Into<SqlValue>,
        hi: impl Into<SqlValue>,
    ) -> Self {
        self.filters
            .push(Filter::Between(column, lo.into(), hi.into()));
        self
    }

    pub fn is_null(mut self, column: &'static str) -> Self {
        self.filters.push(Filter::IsNull(column));
        self
    }

    pub fn is_not_null(mut self, column: &'static str) -> Self {
        self.filters.push(Filter::IsNotNull(column));
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order.push((column, Order::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: &'static str) -> Self {
        self.order.push((column, Order::Desc));
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    fn sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table);
        for (i, filter) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            match filter {
                Filter::Eq(col, _) => sql.push_str(&format!("{col} = ?")),
                Filter::Lt(col, _) => sql.push_str(&format!("{col} < ?")),
                Filter::Between(col, _, _) => sql.push_str(&format!("{col} BETWEEN ? AND ?")),
                Filter::IsNull(col) => sql.push_str(&format!("{col} IS NULL")),
                Filter::IsNotNull(col) => sql.push_str(&format!("{col} IS NOT NULL")),
            }
        }
        for (i, (col, order)) in self.order.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            sql.push_str(col);
            if let Order::Desc = order {
                sql.push_str(" DESC");
            }
        }
        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }
        sql
    }

    fn bind_values(&self) -> impl Iterator<Item = &SqlValue> {
        self.filters.iter().flat_map(|f| match f {
            Filter::Eq(_, v) | Filter::Lt(_, v) => vec![v],
            Filter::Between(_, lo, hi) => vec![lo, hi],
            Filter::IsNull(_) | Filter::IsNotNull(_) => vec![],
        })
    }

    pub async fn fetch_all<T>(self, pool: &SqlitePool) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = self.sql();
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in self.bind_values() {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Real(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
            };
        }
        query.fetch_all(pool).await.map_err(Into::into)
    }

    pub async fn fetch_optional<T>(self, pool: &SqlitePool) -> Result<Option<T>, StoreError>
    where
        T: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
    {
        let sql = self.sql();
        let mut query = sqlx::query_as::<_, T>(&sql);
        for value in self.bind_values() {
            query = match value {
                SqlValue::Int(v) => query.bind(*v),
                SqlValue::Real(v) => query.bind(*v),
                SqlValue::Text(v) => query.bind(v.clone()),
            };
        }
        query.fetch_optional(pool).await.map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_filters_in_declaration_order() {
        let select = Select::from("workouts")
            .between("date", "2025-01-01", "2025-01-31")
            .is_not_null("end_time")
            .order_by_desc("date")
            .order_by_desc("start_time")
            .limit(5);
        assert_eq!(
            select.sql(),
            "SELECT * FROM workouts WHERE date BETWEEN ? AND ? \
             AND end_time IS NOT NULL ORDER BY date DESC, start_time DESC LIMIT 5"
        );
    }

    #[test]
    fn equality_only() {
        let select = Select::from("sets").eq("workout_exercise_id", 3i64);
        assert_eq!(
            select.sql(),
            "SELECT * FROM sets WHERE workout_exercise_id = ?"
        );
    }
}
