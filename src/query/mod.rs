//! Module `query` implement the relational operators.
//!
//! Every operator is a variant of the [Scan] enum, a tagged tree whose
//! leaves are table scans and whose composites wrap owned child scans.
//! Updatability is a property of the variant: table scans update in
//! place, select scans forward updates to their inner scan, every
//! other composite rejects update calls. There is no downcasting.
//!
//! Predicates are conjunctions of equality [Term]s over [Expression]s,
//! each expression being a field name or a [Constant].

use std::{collections::HashSet, fmt, result};

mod product;
mod project;
mod select;

pub use product::ProductScan;
pub use project::ProjectScan;
pub use select::SelectScan;

use crate::{
    err_at,
    index::{IndexJoinScan, IndexSelectScan},
    plan::Plan,
    record::{Rid, Schema, TableScan},
    tx::Transaction,
    Result,
};

/// A value stored in the database, integer or string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Int(i32),
    Str(String),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Constant::Int(val) => write!(f, "{}", val),
            Constant::Str(val) => write!(f, "'{}'", val),
        }
    }
}

impl Constant {
    pub fn as_int(&self) -> Result<i32> {
        match self {
            Constant::Int(val) => Ok(*val),
            Constant::Str(_) => err_at!(FailConvert, msg: "constant {} as int", self),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Constant::Str(val) => Ok(val),
            Constant::Int(_) => err_at!(FailConvert, msg: "constant {} as str", self),
        }
    }
}

/// A SQL expression, either a constant or a field reference.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    Const(Constant),
    Field(String),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        match self {
            Expression::Const(val) => write!(f, "{}", val),
            Expression::Field(name) => write!(f, "{}", name),
        }
    }
}

impl Expression {
    /// Value of this expression at the scan's current record.
    pub fn evaluate(&self, scan: &Scan, tx: &mut Transaction) -> Result<Constant> {
        match self {
            Expression::Const(val) => Ok(val.clone()),
            Expression::Field(name) => scan.get_val(tx, name),
        }
    }

    pub fn is_field_name(&self) -> bool {
        matches!(self, Expression::Field(_))
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Const(val) => Some(val),
            Expression::Field(_) => None,
        }
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::Field(name) => Some(name),
            Expression::Const(_) => None,
        }
    }

    /// Whether every field this expression mentions is in `schema`.
    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Const(_) => true,
            Expression::Field(name) => schema.has_field(name),
        }
    }
}

/// An equality between two expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}

impl Term {
    pub fn new(lhs: Expression, rhs: Expression) -> Term {
        Term { lhs, rhs }
    }

    pub fn is_satisfied(&self, scan: &Scan, tx: &mut Transaction) -> Result<bool> {
        Ok(self.lhs.evaluate(scan, tx)? == self.rhs.evaluate(scan, tx)?)
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }

    /// Estimate how much this term cuts down `plan`'s output.
    pub fn reduction_factor(&self, plan: &Plan) -> i32 {
        match (self.lhs.as_field_name(), self.rhs.as_field_name()) {
            (Some(lhs), Some(rhs)) => {
                std::cmp::max(plan.distinct_values(lhs), plan.distinct_values(rhs))
            }
            (Some(lhs), None) => plan.distinct_values(lhs),
            (None, Some(rhs)) => plan.distinct_values(rhs),
            (None, None) if self.lhs == self.rhs => 1,
            (None, None) => i32::MAX,
        }
    }

    /// The constant `field` is equated with, if any.
    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(name), Expression::Const(val)) if name == field => {
                Some(val)
            }
            (Expression::Const(val), Expression::Field(name)) if name == field => {
                Some(val)
            }
            _ => None,
        }
    }

    /// The other field `field` is equated with, if any.
    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        match (&self.lhs, &self.rhs) {
            (Expression::Field(lhs), Expression::Field(rhs)) if lhs == field => {
                Some(rhs)
            }
            (Expression::Field(lhs), Expression::Field(rhs)) if rhs == field => {
                Some(lhs)
            }
            _ => None,
        }
    }
}

/// Conjunction of terms. An empty predicate is always satisfied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    terms: Vec<Term>,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        let parts: Vec<String> = self.terms.iter().map(|t| t.to_string()).collect();
        write!(f, "{}", parts.join(" and "))
    }
}

impl Predicate {
    pub fn new() -> Predicate {
        Predicate::default()
    }

    pub fn from_term(term: Term) -> Predicate {
        Predicate { terms: vec![term] }
    }

    pub fn add_term(&mut self, term: Term) {
        self.terms.push(term)
    }

    pub fn conjoin_with(&mut self, other: Predicate) {
        self.terms.extend(other.terms)
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_satisfied(&self, scan: &Scan, tx: &mut Transaction) -> Result<bool> {
        for term in self.terms.iter() {
            if !term.is_satisfied(scan, tx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn reduction_factor(&self, plan: &Plan) -> i32 {
        self.terms
            .iter()
            .map(|t| t.reduction_factor(plan))
            .fold(1_i32, |a, b| a.saturating_mul(b))
    }

    /// Subpredicate of the terms that mention only fields of `schema`.
    pub fn select_sub_pred(&self, schema: &Schema) -> Option<Predicate> {
        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| t.applies_to(schema))
            .cloned()
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Predicate { terms })
        }
    }

    /// Subpredicate of the terms that join the two schemas, mentioning
    /// fields of both but fitting in neither alone.
    pub fn join_sub_pred(&self, sch1: &Schema, sch2: &Schema) -> Option<Predicate> {
        let mut both = Schema::new();
        both.add_all(sch1).ok()?;
        both.add_all(sch2).ok()?;

        let terms: Vec<Term> = self
            .terms
            .iter()
            .filter(|t| {
                !t.applies_to(sch1) && !t.applies_to(sch2) && t.applies_to(&both)
            })
            .cloned()
            .collect();
        if terms.is_empty() {
            None
        } else {
            Some(Predicate { terms })
        }
    }

    pub fn equates_with_constant(&self, field: &str) -> Option<&Constant> {
        self.terms.iter().find_map(|t| t.equates_with_constant(field))
    }

    pub fn equates_with_field(&self, field: &str) -> Option<&str> {
        self.terms.iter().find_map(|t| t.equates_with_field(field))
    }
}

/// A tree of relational operators executed as an iterator.
///
/// `before_first` rewinds, `next` advances and reports whether a
/// current record exists, getters read fields of the current record.
/// Update calls succeed only on scans whose construction made them
/// updatable, a table scan or a select scan over one.
pub enum Scan {
    Table(TableScan),
    Select(SelectScan),
    Project(ProjectScan),
    Product(ProductScan),
    IndexSelect(IndexSelectScan),
    IndexJoin(IndexJoinScan),
}

impl Scan {
    pub fn before_first(&mut self, tx: &mut Transaction) -> Result<()> {
        match self {
            Scan::Table(s) => s.before_first(tx),
            Scan::Select(s) => s.before_first(tx),
            Scan::Project(s) => s.before_first(tx),
            Scan::Product(s) => s.before_first(tx),
            Scan::IndexSelect(s) => s.before_first(tx),
            Scan::IndexJoin(s) => s.before_first(tx),
        }
    }

    pub fn next(&mut self, tx: &mut Transaction) -> Result<bool> {
        match self {
            Scan::Table(s) => s.next(tx),
            Scan::Select(s) => s.next(tx),
            Scan::Project(s) => s.next(tx),
            Scan::Product(s) => s.next(tx),
            Scan::IndexSelect(s) => s.next(tx),
            Scan::IndexJoin(s) => s.next(tx),
        }
    }

    pub fn get_int(&self, tx: &mut Transaction, field: &str) -> Result<i32> {
        match self {
            Scan::Table(s) => s.get_int(tx, field),
            Scan::Select(s) => s.get_int(tx, field),
            Scan::Project(s) => s.get_int(tx, field),
            Scan::Product(s) => s.get_int(tx, field),
            Scan::IndexSelect(s) => s.get_int(tx, field),
            Scan::IndexJoin(s) => s.get_int(tx, field),
        }
    }

    pub fn get_string(&self, tx: &mut Transaction, field: &str) -> Result<String> {
        match self {
            Scan::Table(s) => s.get_string(tx, field),
            Scan::Select(s) => s.get_string(tx, field),
            Scan::Project(s) => s.get_string(tx, field),
            Scan::Product(s) => s.get_string(tx, field),
            Scan::IndexSelect(s) => s.get_string(tx, field),
            Scan::IndexJoin(s) => s.get_string(tx, field),
        }
    }

    pub fn get_val(&self, tx: &mut Transaction, field: &str) -> Result<Constant> {
        match self {
            Scan::Table(s) => s.get_val(tx, field),
            Scan::Select(s) => s.get_val(tx, field),
            Scan::Project(s) => s.get_val(tx, field),
            Scan::Product(s) => s.get_val(tx, field),
            Scan::IndexSelect(s) => s.get_val(tx, field),
            Scan::IndexJoin(s) => s.get_val(tx, field),
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        match self {
            Scan::Table(s) => s.has_field(field),
            Scan::Select(s) => s.has_field(field),
            Scan::Project(s) => s.has_field(field),
            Scan::Product(s) => s.has_field(field),
            Scan::IndexSelect(s) => s.has_field(field),
            Scan::IndexJoin(s) => s.has_field(field),
        }
    }

    pub fn close(&mut self, tx: &mut Transaction) -> Result<()> {
        match self {
            Scan::Table(s) => s.close(tx),
            Scan::Select(s) => s.close(tx),
            Scan::Project(s) => s.close(tx),
            Scan::Product(s) => s.close(tx),
            Scan::IndexSelect(s) => s.close(tx),
            Scan::IndexJoin(s) => s.close(tx),
        }
    }

    // update surface, available on updatable variants only.

    pub fn set_int(&mut self, tx: &mut Transaction, field: &str, val: i32) -> Result<()> {
        match self {
            Scan::Table(s) => s.set_int(tx, field, val),
            Scan::Select(s) => s.set_int(tx, field, val),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn set_string(
        &mut self,
        tx: &mut Transaction,
        field: &str,
        val: &str,
    ) -> Result<()> {
        match self {
            Scan::Table(s) => s.set_string(tx, field, val),
            Scan::Select(s) => s.set_string(tx, field, val),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn set_val(
        &mut self,
        tx: &mut Transaction,
        field: &str,
        val: &Constant,
    ) -> Result<()> {
        match self {
            Scan::Table(s) => s.set_val(tx, field, val),
            Scan::Select(s) => s.set_val(tx, field, val),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn insert(&mut self, tx: &mut Transaction) -> Result<()> {
        match self {
            Scan::Table(s) => s.insert(tx),
            Scan::Select(s) => s.insert(tx),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn delete(&mut self, tx: &mut Transaction) -> Result<()> {
        match self {
            Scan::Table(s) => s.delete(tx),
            Scan::Select(s) => s.delete(tx),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn get_rid(&self) -> Result<Rid> {
        match self {
            Scan::Table(s) => s.get_rid(),
            Scan::Select(s) => s.get_rid(),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }

    pub fn move_to_rid(&mut self, tx: &mut Transaction, rid: &Rid) -> Result<()> {
        match self {
            Scan::Table(s) => s.move_to_rid(tx, rid),
            Scan::Select(s) => s.move_to_rid(tx, rid),
            _ => err_at!(InvalidInput, msg: "scan is not updatable"),
        }
    }
}

/// Set of field names, used by projection.
pub type FieldSet = HashSet<String>;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
