//! Backing-store contract and SQLite implementation for pets.
//!
//! # Responsibility
//! - Execute table-level query/insert/update/delete calls for the gateway.
//! - Keep SQL text assembly inside the persistence boundary.
//!
//! # Invariants
//! - Column names come from the typed `Column` set, never from callers.
//! - Selection and sort order are passed to SQLite verbatim; syntax errors
//!   surface as `StoreError::Db`.
//! - Unset payload slots are left out of INSERT/UPDATE statements.

use crate::contract::{
    Gender, COLUMN_BREED, COLUMN_GENDER, COLUMN_ID, COLUMN_NAME, COLUMN_WEIGHT,
};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::pet::{Field, Pet, PetId, PetValues};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StoreResult<T> = Result<T, StoreError>;

/// Backing-store failure.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted pet data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Addressable pet column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Id,
    Name,
    Breed,
    Gender,
    Weight,
}

impl Column {
    /// Every column in table order.
    pub const ALL: [Column; 5] = [
        Column::Id,
        Column::Name,
        Column::Breed,
        Column::Gender,
        Column::Weight,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Id => COLUMN_ID,
            Self::Name => COLUMN_NAME,
            Self::Breed => COLUMN_BREED,
            Self::Gender => COLUMN_GENDER,
            Self::Weight => COLUMN_WEIGHT,
        }
    }
}

/// One result row holding the projected columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CursorRow {
    values: BTreeMap<Column, Value>,
}

impl CursorRow {
    pub fn new(values: impl IntoIterator<Item = (Column, Value)>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Returns whether `column` was part of the projection.
    pub fn contains(&self, column: Column) -> bool {
        self.values.contains_key(&column)
    }

    pub fn value(&self, column: Column) -> Option<&Value> {
        self.values.get(&column)
    }

    /// Returns true for projected SQL NULL values.
    pub fn is_null(&self, column: Column) -> bool {
        matches!(self.values.get(&column), Some(Value::Null))
    }

    pub fn get_i64(&self, column: Column) -> Option<i64> {
        match self.values.get(&column)? {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn get_text(&self, column: Column) -> Option<&str> {
        match self.values.get(&column)? {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn columns(&self) -> impl Iterator<Item = Column> + '_ {
        self.values.keys().copied()
    }

    /// Converts a full-projection row into a `Pet`.
    ///
    /// # Errors
    /// - `InvalidData` when a required column is missing, null or out of range.
    pub fn to_pet(&self) -> StoreResult<Pet> {
        let id = self
            .get_i64(Column::Id)
            .ok_or_else(|| missing(Column::Id))?;
        let name = self
            .get_text(Column::Name)
            .ok_or_else(|| missing(Column::Name))?
            .to_string();
        let gender_code = self
            .get_i64(Column::Gender)
            .ok_or_else(|| missing(Column::Gender))?;
        let gender = Gender::from_code(gender_code).ok_or_else(|| {
            StoreError::InvalidData(format!("invalid gender `{gender_code}` in pets.gender"))
        })?;

        Ok(Pet {
            id,
            name,
            breed: self.get_text(Column::Breed).map(str::to_string),
            gender,
            weight: self.get_i64(Column::Weight),
        })
    }
}

fn missing(column: Column) -> StoreError {
    StoreError::InvalidData(format!("missing or mistyped pets.{}", column.name()))
}

/// Table-level operations the gateway relies on.
pub trait PetStore {
    /// Runs a projection over `table`; an empty projection means all columns.
    fn query(
        &self,
        table: &str,
        projection: &[Column],
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> StoreResult<Vec<CursorRow>>;

    /// Inserts one row and returns its store-assigned id.
    fn insert(&self, table: &str, values: &PetValues) -> StoreResult<PetId>;

    /// Applies `values` to every matching row, returning the affected count.
    fn update(
        &self,
        table: &str,
        values: &PetValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> StoreResult<usize>;

    /// Deletes every matching row, returning the affected count.
    fn delete(
        &self,
        table: &str,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> StoreResult<usize>;
}

/// SQLite-backed pet store owning its connection.
pub struct SqlitePetStore {
    conn: Connection,
}

impl SqlitePetStore {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl PetStore for SqlitePetStore {
    fn query(
        &self,
        table: &str,
        projection: &[Column],
        selection: Option<&str>,
        selection_args: &[Value],
        sort_order: Option<&str>,
    ) -> StoreResult<Vec<CursorRow>> {
        let columns: &[Column] = if projection.is_empty() {
            &Column::ALL
        } else {
            projection
        };
        let column_list = columns
            .iter()
            .map(|column| column.name())
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!("SELECT {column_list} FROM {}", quote_identifier(table));
        push_where(&mut sql, selection);
        if let Some(order) = non_blank(sort_order) {
            sql.push_str(" ORDER BY ");
            sql.push_str(order);
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(selection_args.iter()))?;
        let mut result = Vec::new();

        while let Some(row) = rows.next()? {
            let mut values = BTreeMap::new();
            for (index, column) in columns.iter().enumerate() {
                values.insert(*column, row.get::<_, Value>(index)?);
            }
            result.push(CursorRow { values });
        }

        Ok(result)
    }

    fn insert(&self, table: &str, values: &PetValues) -> StoreResult<PetId> {
        let assignments = payload_columns(values);
        let table = quote_identifier(table);

        if assignments.is_empty() {
            self.conn
                .execute(&format!("INSERT INTO {table} DEFAULT VALUES;"), [])?;
        } else {
            let names = assignments
                .iter()
                .map(|(column, _)| column.name())
                .collect::<Vec<_>>()
                .join(", ");
            let placeholders = vec!["?"; assignments.len()].join(", ");
            self.conn.execute(
                &format!("INSERT INTO {table} ({names}) VALUES ({placeholders});"),
                params_from_iter(assignments.into_iter().map(|(_, value)| value)),
            )?;
        }

        Ok(self.conn.last_insert_rowid())
    }

    fn update(
        &self,
        table: &str,
        values: &PetValues,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> StoreResult<usize> {
        let assignments = payload_columns(values);
        if assignments.is_empty() {
            return Ok(0);
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!("UPDATE {} SET {set_clause}", quote_identifier(table));
        push_where(&mut sql, selection);

        let bind_values = assignments
            .into_iter()
            .map(|(_, value)| value)
            .chain(selection_args.iter().cloned());
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn delete(
        &self,
        table: &str,
        selection: Option<&str>,
        selection_args: &[Value],
    ) -> StoreResult<usize> {
        let mut sql = format!("DELETE FROM {}", quote_identifier(table));
        push_where(&mut sql, selection);
        let changed = self
            .conn
            .execute(&sql, params_from_iter(selection_args.iter()))?;
        Ok(changed)
    }
}

fn payload_columns(values: &PetValues) -> Vec<(Column, Value)> {
    let mut assignments = Vec::with_capacity(values.len());
    push_field(&mut assignments, Column::Name, &values.name, |v| {
        Value::Text(v.clone())
    });
    push_field(&mut assignments, Column::Breed, &values.breed, |v| {
        Value::Text(v.clone())
    });
    push_field(&mut assignments, Column::Gender, &values.gender, |v| {
        Value::Integer(*v)
    });
    push_field(&mut assignments, Column::Weight, &values.weight, |v| {
        Value::Integer(*v)
    });
    assignments
}

fn push_field<T>(
    assignments: &mut Vec<(Column, Value)>,
    column: Column,
    field: &Field<T>,
    to_value: impl FnOnce(&T) -> Value,
) {
    match field {
        Field::Unset => {}
        Field::Null => assignments.push((column, Value::Null)),
        Field::Value(value) => assignments.push((column, to_value(value))),
    }
}

fn push_where(sql: &mut String, selection: Option<&str>) {
    if let Some(selection) = non_blank(selection) {
        sql.push_str(" WHERE ");
        sql.push_str(selection);
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
