//! Named entities and typed column references.
//!
//! Anything implementing [`Relation`] can be passed where a command expects a table:
//! plain strings, or a [`Table`] carrying an optional alias.
//!
//! ```ignore
//! use pgchain::{Table, command};
//!
//! let mut rental = Table::new("rental");
//! rental.alias("r");
//! let q = command().select_all().from([&rental]);
//! assert_eq!(q.pp()?, "SELECT * FROM rental r");
//! ```

/// An entity a command can refer to by name.
pub trait Relation {
    /// The text emitted into SQL for this entity.
    fn display_name(&self) -> String;
}

impl Relation for &str {
    fn display_name(&self) -> String {
        (*self).to_string()
    }
}

impl Relation for String {
    fn display_name(&self) -> String {
        self.clone()
    }
}

impl Relation for &String {
    fn display_name(&self) -> String {
        (*self).clone()
    }
}

/// A table reference with an optional alias and attached DDL text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    name: String,
    alias: Option<String>,
    ddl: String,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            ddl: String::new(),
        }
    }

    /// Set the alias used by later renderings of this table.
    pub fn alias(&mut self, alias: impl Into<String>) -> &mut Self {
        let alias = alias.into();
        self.alias = (!alias.is_empty()).then_some(alias);
        self
    }

    /// Builder form of [`Table::alias`].
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias(alias);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// `alias.column` when aliased, `name.column` otherwise.
    pub fn qualified(&self, column: &str) -> String {
        let prefix = self.alias.as_deref().unwrap_or(&self.name);
        format!("{prefix}.{column}")
    }

    /// Store DDL text for this table. The text is not checked.
    pub fn set_ddl(&mut self, ddl: impl Into<String>) -> &mut Self {
        self.ddl = ddl.into();
        self
    }

    pub fn ddl(&self) -> &str {
        &self.ddl
    }
}

impl Relation for Table {
    /// `name alias` when aliased, `name` otherwise.
    fn display_name(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

impl Relation for &Table {
    fn display_name(&self) -> String {
        Table::display_name(self)
    }
}

impl Relation for &mut Table {
    fn display_name(&self) -> String {
        Table::display_name(self)
    }
}

/// A named column with a column-definition fragment.
///
/// Fields can be selected directly and build simple comparison predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    ddl: String,
    quoted: bool,
}

impl Field {
    /// An `integer` column; values are rendered bare.
    pub fn integer(name: impl Into<String>) -> Self {
        let name = name.into();
        let ddl = format!("{name} integer");
        Self {
            name,
            ddl,
            quoted: false,
        }
    }

    /// A `varchar` column; values are rendered single-quoted.
    pub fn varchar(name: impl Into<String>) -> Self {
        let name = name.into();
        let ddl = format!("{name} varchar");
        Self {
            name,
            ddl,
            quoted: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ddl(&self) -> &str {
        &self.ddl
    }

    /// `name op value`, quoting the value for text fields.
    pub fn is(&self, op: &str, value: impl std::fmt::Display) -> String {
        if self.quoted {
            let escaped = value.to_string().replace('\'', "''");
            format!("{} {} '{}'", self.name, op, escaped)
        } else {
            format!("{} {} {}", self.name, op, value)
        }
    }

    pub fn eq(&self, value: impl std::fmt::Display) -> String {
        self.is("=", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_without_alias_is_its_name() {
        let actor = Table::new("actor");
        assert_eq!(actor.display_name(), "actor");
        assert_eq!(actor.qualified("actor_id"), "actor.actor_id");
    }

    #[test]
    fn alias_is_reflected_after_it_is_set() {
        let mut rental = Table::new("rental");
        assert_eq!(rental.display_name(), "rental");
        rental.alias("r");
        assert_eq!(rental.display_name(), "rental r");
        assert_eq!(rental.alias_name(), Some("r"));
        assert_eq!(rental.qualified("rental_id"), "r.rental_id");
    }

    #[test]
    fn empty_alias_clears() {
        let mut t = Table::new("film").with_alias("f");
        t.alias("");
        assert_eq!(t.display_name(), "film");
    }

    #[test]
    fn ddl_is_stored_verbatim() {
        let mut t = Table::new("actor");
        t.set_ddl("CREATE TABLE actor (actor_id serial)");
        assert_eq!(t.ddl(), "CREATE TABLE actor (actor_id serial)");
    }

    #[test]
    fn field_predicates() {
        assert_eq!(Field::integer("age").eq(4), "age = 4");
        assert_eq!(Field::varchar("name").eq("Ryan"), "name = 'Ryan'");
        assert_eq!(Field::varchar("name").is("<>", "O'Hara"), "name <> 'O''Hara'");
        assert_eq!(Field::varchar("email").ddl(), "email varchar");
    }

    #[test]
    fn strings_are_relations() {
        assert_eq!("film f".display_name(), "film f");
        assert_eq!(String::from("film").display_name(), "film");
    }
}
