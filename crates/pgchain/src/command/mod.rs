//! Chainable command builder.
//!
//! A [`Command`] accumulates SQL text with positional `?` markers, the values bound to them
//! and, for inserts, the column list and rows to load. Every method consumes the command and
//! returns the next one, so a shared base can be cloned and extended independently.
//!
//! Mistakes do not panic and do not stop the chain: the first [`BuildError`] sticks, every
//! later call returns it unchanged, and [`Command::pp`] / [`Command::go`] report it without
//! touching the database.
//!
//! # Example
//!
//! ```ignore
//! use pgchain::command;
//!
//! let q = command()
//!     .select(["title"])
//!     .from(["film"])
//!     .where_("film_id = ?", [133]);
//! assert_eq!(q.pp()?, "SELECT title FROM film WHERE film_id = 133");
//!
//! let films = q.go(&client).await?.expect("SELECT returns rows");
//! ```

mod exec;
mod insert;

pub use insert::POSTGRES_MAX_COLUMNS;


use crate::config::ExecConfig;
use crate::error::{BuildError, ChainResult};
use crate::placeholder::{render_debug, translate_placeholders};
use crate::relation::{Field, Relation};
use crate::value::Value;

/// Start an empty command.
pub fn command() -> Command {
    Command::new()
}

/// Bindings for a predicate without `?` markers: `.where_("deleted_at IS NULL", NO_ARGS)`.
pub const NO_ARGS: [Value; 0] = [];

/// One item of a SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A column name or expression, emitted verbatim.
    Name(String),
    /// A typed column reference.
    Field(Field),
    /// A value only known at runtime; accepted when it is text.
    Dynamic(Value),
}

impl From<&str> for SelectItem {
    fn from(v: &str) -> Self {
        SelectItem::Name(v.to_string())
    }
}

impl From<String> for SelectItem {
    fn from(v: String) -> Self {
        SelectItem::Name(v)
    }
}

impl From<&String> for SelectItem {
    fn from(v: &String) -> Self {
        SelectItem::Name(v.clone())
    }
}

impl From<Field> for SelectItem {
    fn from(v: Field) -> Self {
        SelectItem::Field(v)
    }
}

impl From<&Field> for SelectItem {
    fn from(v: &Field) -> Self {
        SelectItem::Field(v.clone())
    }
}

impl From<Value> for SelectItem {
    fn from(v: Value) -> Self {
        SelectItem::Dynamic(v)
    }
}

/// Accumulated statement state.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Draft {
    text: String,
    args: Vec<Value>,
    /// Target table of an insert, without alias or column list.
    table: Option<String>,
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// Columns stashed by `insert` until `into` names the table.
    pending_columns: Option<Vec<String>>,
    is_void: bool,
}

impl Draft {
    fn new() -> Self {
        Self {
            is_void: true,
            ..Default::default()
        }
    }

    fn is_insert_mode(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// A SQL statement under construction.
#[derive(Debug, Clone)]
pub struct Command {
    state: Result<Draft, BuildError>,
    config: ExecConfig,
}

impl Default for Command {
    fn default() -> Self {
        Self::new()
    }
}

/// Two commands are equal when they would build the same statement; config is ignored.
impl PartialEq for Command {
    fn eq(&self, other: &Self) -> bool {
        self.state == other.state
    }
}

impl Command {
    pub fn new() -> Self {
        Self {
            state: Ok(Draft::new()),
            config: ExecConfig::default(),
        }
    }

    /// Replace the execution options used by [`Command::go`].
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Run `f` against the draft unless the chain already failed.
    fn apply<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Draft) -> Result<(), BuildError>,
    {
        if let Ok(draft) = &mut self.state {
            if let Err(err) = f(draft) {
                tracing::trace!(target: "pgchain.build", error = %err, "command chain failed");
                self.state = Err(err);
            }
        }
        self
    }

    // ==================== Query clauses ====================

    /// Start a `SELECT` with the given columns; an empty list selects `*`.
    ///
    /// This replaces any text accumulated so far and marks the command as returning rows.
    pub fn select<I, S>(self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let items: Vec<SelectItem> = items.into_iter().map(Into::into).collect();
        self.apply(move |draft| {
            let mut names = Vec::with_capacity(items.len().max(1));
            for (position, item) in items.into_iter().enumerate() {
                match item {
                    SelectItem::Name(name) => names.push(name),
                    SelectItem::Field(field) => names.push(field.name().to_string()),
                    SelectItem::Dynamic(Value::Text(name)) => names.push(name),
                    SelectItem::Dynamic(other) => {
                        return Err(BuildError::InvalidSelectArgument {
                            position,
                            found: other.type_name(),
                        });
                    }
                }
            }
            if names.is_empty() {
                names.push("*".to_string());
            }
            draft.is_void = false;
            draft.text = format!("SELECT {}", names.join(", "));
            Ok(())
        })
    }

    /// `SELECT *`.
    pub fn select_all(self) -> Self {
        self.select(Vec::<SelectItem>::new())
    }

    /// Append ` FROM a,b,...` using each entity's display name.
    pub fn from<I, R>(self, entities: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Relation,
    {
        let names: Vec<String> = entities.into_iter().map(|e| e.display_name()).collect();
        self.apply(move |draft| {
            draft.text.push_str(" FROM ");
            draft.text.push_str(&names.join(","));
            Ok(())
        })
    }

    /// Append ` WHERE predicate` and bind `args` to its `?` markers.
    ///
    /// Repeated calls concatenate; connectives such as `AND` belong in the predicate text.
    pub fn where_<I, V>(self, predicate: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.clause(" WHERE ", predicate, args)
    }

    /// Append ` JOIN entity`. Follow it with [`Command::on`].
    pub fn join(self, entity: impl Relation) -> Self {
        let name = entity.display_name();
        self.apply(move |draft| {
            draft.text.push_str(" JOIN ");
            draft.text.push_str(&name);
            Ok(())
        })
    }

    /// Append ` ON predicate` and bind `args` to its `?` markers.
    pub fn on<I, V>(self, predicate: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.clause(" ON ", predicate, args)
    }

    fn clause<I, V>(self, keyword: &'static str, predicate: &str, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let args: Vec<Value> = args.into_iter().map(Into::into).collect();
        self.apply(move |draft| {
            draft.text.push_str(keyword);
            draft.text.push_str(predicate);
            draft.args.extend(args);
            Ok(())
        })
    }

    /// Append ` ORDER BY spec`.
    pub fn order_by(self, spec: &str) -> Self {
        self.push_text(format!(" ORDER BY {spec}"))
    }

    /// Close an existing `ORDER BY` with ` ASC`.
    pub fn asc(self) -> Self {
        self.push_text(" ASC".to_string())
    }

    /// Close an existing `ORDER BY` with ` DESC`.
    pub fn desc(self) -> Self {
        self.push_text(" DESC".to_string())
    }

    /// Append a complete ` ORDER BY column ASC`.
    pub fn asc_by(self, column: &str) -> Self {
        self.order_by(column).asc()
    }

    /// Append a complete ` ORDER BY column DESC`.
    pub fn desc_by(self, column: &str) -> Self {
        self.order_by(column).desc()
    }

    /// Append ` LIMIT n`. The value is not range checked.
    pub fn limit(self, n: i64) -> Self {
        self.push_text(format!(" LIMIT {n}"))
    }

    /// Append ` OFFSET n`. The value is not range checked.
    pub fn offset(self, n: i64) -> Self {
        self.push_text(format!(" OFFSET {n}"))
    }

    /// Append ` AS alias`.
    pub fn alias(self, alias: &str) -> Self {
        self.push_text(format!(" AS {alias}"))
    }

    fn push_text(self, fragment: String) -> Self {
        self.apply(move |draft| {
            draft.text.push_str(&fragment);
            Ok(())
        })
    }

    // ==================== Inspection ====================

    /// The recorded build error, if the chain has failed.
    pub fn build_error(&self) -> Option<&BuildError> {
        self.state.as_ref().err()
    }

    /// Render the statement with every `?` replaced, in order, by its bound value.
    ///
    /// Values are inserted with their plain `Display` form, unquoted and unescaped: use this for
    /// logs and assertions, never for execution.
    pub fn pp(&self) -> ChainResult<String> {
        let draft = self.draft()?;
        Ok(render_debug(&draft.text, &draft.args))
    }

    /// The statement as it will be sent, with `$1, $2, ...` parameters.
    pub fn to_sql(&self) -> ChainResult<String> {
        Ok(translate_placeholders(&self.draft()?.text))
    }

    /// Values bound so far, in marker order. Empty once the chain has failed.
    pub fn args(&self) -> &[Value] {
        match &self.state {
            Ok(draft) => &draft.args,
            Err(_) => &[],
        }
    }

    /// Whether executing this command returns no rows.
    pub fn is_void(&self) -> bool {
        self.state.as_ref().map_or(true, |d| d.is_void)
    }

    /// Whether an insert column list has been recorded.
    pub fn is_insert_mode(&self) -> bool {
        self.state.as_ref().is_ok_and(Draft::is_insert_mode)
    }

    /// Recorded insert columns.
    pub fn insert_columns(&self) -> &[String] {
        match &self.state {
            Ok(draft) => &draft.columns,
            Err(_) => &[],
        }
    }

    /// Recorded insert rows.
    pub fn insert_rows(&self) -> &[Vec<Value>] {
        match &self.state {
            Ok(draft) => &draft.rows,
            Err(_) => &[],
        }
    }

    fn draft(&self) -> ChainResult<&Draft> {
        self.state.as_ref().map_err(|err| err.clone().into())
    }
}
