use std::convert::TryFrom;

use crate::{
    err_at,
    parse::{
        CreateIndexData, CreateTableData, CreateViewData, DeleteData, InsertData,
        Lexer, ModifyData, QueryData, UpdateCmd,
    },
    query::{Constant, Expression, Predicate, Term},
    record::Schema,
    Result,
};

/// Recursive descent parser for the SQL dialect.
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(statement: &str) -> Result<Parser> {
        Ok(Parser {
            lexer: Lexer::new(statement)?,
        })
    }

    pub fn parse_field(&mut self) -> Result<String> {
        self.lexer.eat_id()
    }

    pub fn parse_constant(&mut self) -> Result<Constant> {
        if self.lexer.match_string_constant() {
            Ok(Constant::Str(self.lexer.eat_string_constant()?))
        } else {
            Ok(Constant::Int(self.lexer.eat_int_constant()?))
        }
    }

    pub fn parse_expression(&mut self) -> Result<Expression> {
        if self.lexer.match_id() {
            Ok(Expression::Field(self.lexer.eat_id()?))
        } else {
            Ok(Expression::Const(self.parse_constant()?))
        }
    }

    pub fn parse_term(&mut self) -> Result<Term> {
        let lhs = self.parse_expression()?;
        self.lexer.eat_delim('=')?;
        let rhs = self.parse_expression()?;
        Ok(Term::new(lhs, rhs))
    }

    pub fn parse_predicate(&mut self) -> Result<Predicate> {
        let mut pred = Predicate::from_term(self.parse_term()?);
        if self.lexer.match_keyword("and") {
            self.lexer.eat_keyword("and")?;
            pred.conjoin_with(self.parse_predicate()?);
        }
        Ok(pred)
    }

    /// `select f1, f2 from t1, t2 [where pred]`
    pub fn parse_query(&mut self) -> Result<QueryData> {
        self.lexer.eat_keyword("select")?;
        let fields = self.parse_select_list()?;
        self.lexer.eat_keyword("from")?;
        let tables = self.parse_table_list()?;
        let pred = if self.lexer.match_keyword("where") {
            self.lexer.eat_keyword("where")?;
            self.parse_predicate()?
        } else {
            Predicate::new()
        };
        Ok(QueryData {
            fields,
            tables,
            pred,
        })
    }

    /// Any statement that is not a query, dispatched on its first
    /// keyword.
    pub fn parse_update_cmd(&mut self) -> Result<UpdateCmd> {
        if self.lexer.match_keyword("insert") {
            Ok(UpdateCmd::Insert(self.parse_insert()?))
        } else if self.lexer.match_keyword("delete") {
            Ok(UpdateCmd::Delete(self.parse_delete()?))
        } else if self.lexer.match_keyword("update") {
            Ok(UpdateCmd::Modify(self.parse_modify()?))
        } else if self.lexer.match_keyword("create") {
            self.lexer.eat_keyword("create")?;
            if self.lexer.match_keyword("table") {
                Ok(UpdateCmd::CreateTable(self.parse_create_table()?))
            } else if self.lexer.match_keyword("view") {
                Ok(UpdateCmd::CreateView(self.parse_create_view()?))
            } else if self.lexer.match_keyword("index") {
                Ok(UpdateCmd::CreateIndex(self.parse_create_index()?))
            } else {
                err_at!(BadSyntax, msg: "expected table, view or index after create")
            }
        } else {
            err_at!(BadSyntax, msg: "unrecognized statement")
        }
    }

    fn parse_insert(&mut self) -> Result<InsertData> {
        self.lexer.eat_keyword("insert")?;
        self.lexer.eat_keyword("into")?;
        let table_name = self.lexer.eat_id()?;
        self.lexer.eat_delim('(')?;
        let fields = self.parse_field_list()?;
        self.lexer.eat_delim(')')?;
        self.lexer.eat_keyword("values")?;
        self.lexer.eat_delim('(')?;
        let values = self.parse_constant_list()?;
        self.lexer.eat_delim(')')?;
        if fields.len() != values.len() {
            return err_at!(
                BadSyntax, msg: "{} fields, {} values", fields.len(), values.len()
            );
        }
        Ok(InsertData {
            table_name,
            fields,
            values,
        })
    }

    fn parse_delete(&mut self) -> Result<DeleteData> {
        self.lexer.eat_keyword("delete")?;
        self.lexer.eat_keyword("from")?;
        let table_name = self.lexer.eat_id()?;
        let pred = if self.lexer.match_keyword("where") {
            self.lexer.eat_keyword("where")?;
            self.parse_predicate()?
        } else {
            Predicate::new()
        };
        Ok(DeleteData { table_name, pred })
    }

    fn parse_modify(&mut self) -> Result<ModifyData> {
        self.lexer.eat_keyword("update")?;
        let table_name = self.lexer.eat_id()?;
        self.lexer.eat_keyword("set")?;
        let field_name = self.parse_field()?;
        self.lexer.eat_delim('=')?;
        let new_value = self.parse_expression()?;
        let pred = if self.lexer.match_keyword("where") {
            self.lexer.eat_keyword("where")?;
            self.parse_predicate()?
        } else {
            Predicate::new()
        };
        Ok(ModifyData {
            table_name,
            field_name,
            new_value,
            pred,
        })
    }

    fn parse_create_table(&mut self) -> Result<CreateTableData> {
        self.lexer.eat_keyword("table")?;
        let table_name = self.lexer.eat_id()?;
        self.lexer.eat_delim('(')?;
        let schema = self.parse_field_defs()?;
        self.lexer.eat_delim(')')?;
        Ok(CreateTableData { table_name, schema })
    }

    fn parse_create_view(&mut self) -> Result<CreateViewData> {
        self.lexer.eat_keyword("view")?;
        let view_name = self.lexer.eat_id()?;
        self.lexer.eat_keyword("as")?;
        let view_def = self.parse_query()?;
        Ok(CreateViewData {
            view_name,
            view_def,
        })
    }

    fn parse_create_index(&mut self) -> Result<CreateIndexData> {
        self.lexer.eat_keyword("index")?;
        let index_name = self.lexer.eat_id()?;
        self.lexer.eat_keyword("on")?;
        let table_name = self.lexer.eat_id()?;
        self.lexer.eat_delim('(')?;
        let field_name = self.parse_field()?;
        self.lexer.eat_delim(')')?;
        Ok(CreateIndexData {
            index_name,
            table_name,
            field_name,
        })
    }

    fn parse_select_list(&mut self) -> Result<Vec<String>> {
        self.parse_field_list()
    }

    fn parse_table_list(&mut self) -> Result<Vec<String>> {
        let mut tables = vec![self.lexer.eat_id()?];
        while self.lexer.match_delim(',') {
            self.lexer.eat_delim(',')?;
            tables.push(self.lexer.eat_id()?);
        }
        Ok(tables)
    }

    fn parse_field_list(&mut self) -> Result<Vec<String>> {
        let mut fields = vec![self.parse_field()?];
        while self.lexer.match_delim(',') {
            self.lexer.eat_delim(',')?;
            fields.push(self.parse_field()?);
        }
        Ok(fields)
    }

    fn parse_constant_list(&mut self) -> Result<Vec<Constant>> {
        let mut values = vec![self.parse_constant()?];
        while self.lexer.match_delim(',') {
            self.lexer.eat_delim(',')?;
            values.push(self.parse_constant()?);
        }
        Ok(values)
    }

    // `name int | name varchar ( n )`, comma separated
    fn parse_field_defs(&mut self) -> Result<Schema> {
        let mut schema = Schema::new();
        loop {
            let field = self.parse_field()?;
            if self.lexer.match_keyword("int") {
                self.lexer.eat_keyword("int")?;
                schema.add_int_field(&field);
            } else {
                self.lexer.eat_keyword("varchar")?;
                self.lexer.eat_delim('(')?;
                let n = self.lexer.eat_int_constant()?;
                self.lexer.eat_delim(')')?;
                let n = err_at!(FailConvert, usize::try_from(n), "varchar({})", n)?;
                schema.add_string_field(&field, n);
            }
            if !self.lexer.match_delim(',') {
                break;
            }
            self.lexer.eat_delim(',')?;
        }
        Ok(schema)
    }
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod parser_test;
