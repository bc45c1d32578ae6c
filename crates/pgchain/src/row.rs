//! Materialized rows with typed accessors

use crate::error::{ChainError, ChainResult};
use crate::value::Value;
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// One returned tuple, keyed by column name.
///
/// When a result carries two columns with the same name the later one wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    data: BTreeMap<String, Value>,
}

macro_rules! accessor {
    ($(#[$doc:meta])* $name:ident -> $ty:ty, $variant:ident, $expected:literal) => {
        $(#[$doc])*
        pub fn $name(&self, column: &str) -> ChainResult<$ty> {
            match self.data.get(column) {
                Some(Value::$variant(v)) => Ok(v.clone()),
                Some(other) => Err(mismatch(column, $expected, other.type_name())),
                None => Err(missing(column)),
            }
        }
    };
}

impl Row {
    /// Pair a column list with one tuple of values.
    pub fn from_parts(columns: &[String], values: Vec<Value>) -> Self {
        Self {
            data: columns.iter().cloned().zip(values).collect(),
        }
    }

    /// Raw stored value for `column`, if present.
    pub fn column(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    accessor!(
        /// Text column value.
        string -> String, Text, "string"
    );
    accessor!(
        /// Integer column value (int2, int4, int8 and oid all land here).
        integer -> i64, Int, "integer"
    );
    accessor!(boolean -> bool, Bool, "boolean");
    accessor!(
        /// Float column value. Integers and numerics are not widened.
        float -> f64, Float, "float"
    );
    accessor!(decimal -> Decimal, Decimal, "decimal");
    accessor!(
        /// JSON object column value.
        map -> BTreeMap<String, Value>, Map, "map"
    );
    accessor!(
        /// Array or JSON array column value.
        list -> Vec<Value>, List, "list"
    );

    /// Reshape this row into any deserializable type via JSON.
    ///
    /// ```ignore
    /// #[derive(serde::Deserialize)]
    /// struct Film { title: String }
    ///
    /// let film: Film = row.transfer()?;
    /// ```
    pub fn transfer<T: DeserializeOwned>(&self) -> ChainResult<T> {
        let json = serde_json::to_value(self)?;
        Ok(serde_json::from_value(json)?)
    }
}

fn mismatch(column: &str, expected: &str, found: &str) -> ChainError {
    ChainError::decode(
        column,
        format!("could not coerce {found} value to {expected}"),
    )
}

fn missing(column: &str) -> ChainError {
    ChainError::decode(column, "no such column in row")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vals;

    fn film_row() -> Row {
        let columns = ["title", "length", "rate", "special", "meta", "tags", "note"]
            .map(String::from);
        let mut meta = BTreeMap::new();
        meta.insert("rating".to_string(), Value::from("PG"));
        Row::from_parts(
            &columns,
            vals![
                "Chamber Italian",
                117,
                4.99,
                true,
                meta,
                Value::list(["Trailers", "Deleted Scenes"]),
                None::<String>,
            ],
        )
    }

    #[test]
    fn typed_accessors_return_stored_values() {
        let row = film_row();
        assert_eq!(row.string("title").unwrap(), "Chamber Italian");
        assert_eq!(row.integer("length").unwrap(), 117);
        assert_eq!(row.float("rate").unwrap(), 4.99);
        assert!(row.boolean("special").unwrap());
        assert_eq!(row.map("meta").unwrap()["rating"], Value::from("PG"));
        assert_eq!(row.list("tags").unwrap().len(), 2);
    }

    #[test]
    fn mismatch_names_actual_type() {
        let row = film_row();
        let err = row.integer("title").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Decode error on column 'title': could not coerce string value to integer"
        );
        assert_eq!(row.integer("title").unwrap_or_default(), 0);
    }

    #[test]
    fn float_does_not_widen_integers() {
        let row = film_row();
        assert!(row.float("length").is_err());
    }

    #[test]
    fn null_is_a_mismatch() {
        let row = film_row();
        let err = row.string("note").unwrap_err();
        assert!(err.to_string().contains("could not coerce null value to string"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let row = film_row();
        assert!(row.string("nope").is_err());
        assert!(row.column("nope").is_none());
        assert_eq!(row.column("length"), Some(&Value::Int(117)));
    }

    #[test]
    fn transfer_into_struct() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Film {
            title: String,
            length: i64,
            tags: Vec<String>,
            note: Option<String>,
        }

        let film: Film = film_row().transfer().unwrap();
        assert_eq!(
            film,
            Film {
                title: "Chamber Italian".into(),
                length: 117,
                tags: vec!["Trailers".into(), "Deleted Scenes".into()],
                note: None,
            }
        );
    }

    #[test]
    fn transfer_reports_shape_errors() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Wrong {
            title: i64,
        }

        let err = film_row().transfer::<Wrong>().unwrap_err();
        assert!(matches!(err, ChainError::Serialization(_)));
    }
}
