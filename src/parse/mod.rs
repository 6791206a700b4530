//! Module `parse` implement the SQL lexer and parser.
//!
//! The dialect is deliberately small: `select ... from ... [where]`,
//! `insert into ... values`, `delete from`, `update ... set`, and
//! `create table|view|index`. Predicates are conjunctions of equality
//! terms. The parser is recursive descent over [lex::Lexer] tokens and
//! produces plain statement data for the planner.

use std::{fmt, result};

mod lex;
mod parser;

pub use lex::Lexer;
pub use parser::Parser;

use crate::{
    query::{Constant, Expression, Predicate},
    record::Schema,
};

/// Data of a `select` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryData {
    pub fields: Vec<String>,
    pub tables: Vec<String>,
    pub pred: Predicate,
}

impl fmt::Display for QueryData {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "select {} ", self.fields.join(", "))?;
        write!(f, "from {}", self.tables.join(", "))?;
        if !self.pred.is_empty() {
            write!(f, " where {}", self.pred)?;
        }
        Ok(())
    }
}

/// Data of an `insert` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct InsertData {
    pub table_name: String,
    pub fields: Vec<String>,
    pub values: Vec<Constant>,
}

/// Data of a `delete` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct DeleteData {
    pub table_name: String,
    pub pred: Predicate,
}

/// Data of an `update` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct ModifyData {
    pub table_name: String,
    pub field_name: String,
    pub new_value: Expression,
    pub pred: Predicate,
}

/// Data of a `create table` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateTableData {
    pub table_name: String,
    pub schema: Schema,
}

/// Data of a `create view` statement. The definition is stored as the
/// re-rendered text of the defining query.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateViewData {
    pub view_name: String,
    pub view_def: QueryData,
}

impl CreateViewData {
    pub fn view_def_text(&self) -> String {
        self.view_def.to_string()
    }
}

/// Data of a `create index` statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateIndexData {
    pub index_name: String,
    pub table_name: String,
    pub field_name: String,
}

/// Any statement other than a query.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateCmd {
    Insert(InsertData),
    Delete(DeleteData),
    Modify(ModifyData),
    CreateTable(CreateTableData),
    CreateView(CreateViewData),
    CreateIndex(CreateIndexData),
}
