use std::sync::LazyLock;

use regex::Regex;
use sqlparser::ast::{
    self, AssignmentTarget, BinaryOperator, Expr, FromTable, ObjectNamePart, SetExpr, Statement,
    TableFactor, TableObject, UnaryOperator, Value, ValueWithSpan,
};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

use crate::model::*;

static CAR_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C\d+$").expect("car id pattern is valid"));

const CAR_COLUMNS: &[&str] = &["id", "make", "model"];
const RESERVATION_COLUMNS: &[&str] = &["start", "duration"];

/// Parsed command from SQL input.
#[derive(Debug, PartialEq)]
pub enum Command {
    InsertCar {
        id: String,
        make: String,
        model: String,
    },
    UpdateCar {
        id: String,
        make: String,
        model: String,
    },
    DeleteCar {
        id: String,
    },
    SelectCars {
        id: Option<String>,
    },
    InsertReservation {
        start: Ms,
        duration: Ms,
    },
    SelectReservations {
        car_id: Option<String>,
    },
    SelectAvailability {
        start: Ms,
        duration: Ms,
    },
}

/// Parse exactly one statement into a [`Command`].
pub fn parse_sql(sql: &str) -> Result<Command, SqlError> {
    let dialect = PostgreSqlDialect {};
    let stmts = Parser::parse_sql(&dialect, sql).map_err(|e| SqlError::Parse(e.to_string()))?;
    let stmt = match stmts.as_slice() {
        [] => return Err(SqlError::Empty),
        [stmt] => stmt,
        _ => {
            return Err(SqlError::Unsupported(format!(
                "{} statements in one command",
                stmts.len()
            )));
        }
    };

    match stmt {
        Statement::Insert(insert) => parse_insert(insert),
        Statement::Update {
            table,
            assignments,
            selection,
            ..
        } => parse_update(&table.relation, assignments, selection.as_ref()),
        Statement::Delete(delete) => parse_delete(delete),
        Statement::Query(query) => parse_select(query),
        other => Err(SqlError::Unsupported(format!("{other}"))),
    }
}

fn parse_insert(insert: &ast::Insert) -> Result<Command, SqlError> {
    let table = match &insert.table {
        TableObject::TableName(name) => last_ident(name)?,
        _ => return Err(SqlError::Parse("INSERT target must be a table".into())),
    };

    match table.as_str() {
        "cars" => {
            let row = Row::bind(insert, "cars", CAR_COLUMNS)?;
            let id = required_string(row.get("id"), "id")?;
            validate_car_id(&id)?;
            Ok(Command::InsertCar {
                id,
                make: required_string(row.get("make"), "make")?,
                model: required_string(row.get("model"), "model")?,
            })
        }
        "reservations" => {
            let row = Row::bind(insert, "reservations", RESERVATION_COLUMNS)?;
            Ok(Command::InsertReservation {
                start: required_i64(row.get("start"), "start")?,
                duration: required_i64(row.get("duration"), "duration")?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_update(
    relation: &TableFactor,
    assignments: &[ast::Assignment],
    selection: Option<&Expr>,
) -> Result<Command, SqlError> {
    let table = relation_name(relation)?;
    if table != "cars" {
        return Err(SqlError::UnknownTable(table));
    }
    let id = id_filter(selection)?;

    let (mut make, mut model) = (None, None);
    for assignment in assignments {
        let AssignmentTarget::ColumnName(name) = &assignment.target else {
            return Err(SqlError::Unsupported("tuple assignment".into()));
        };
        let slot = match last_ident(name)?.as_str() {
            "make" => &mut make,
            "model" => &mut model,
            "id" => return Err(SqlError::Unsupported("changing a car id".into())),
            other => return Err(SqlError::Unsupported(format!("column {other}"))),
        };
        if slot.is_some() {
            return Err(SqlError::Unsupported("column assigned twice".into()));
        }
        *slot = Some(&assignment.value);
    }

    Ok(Command::UpdateCar {
        id,
        make: required_string(make, "make")?,
        model: required_string(model, "model")?,
    })
}

fn parse_delete(delete: &ast::Delete) -> Result<Command, SqlError> {
    let (FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables)) = &delete.from;
    let table = match tables.as_slice() {
        [only] => relation_name(&only.relation)?,
        [] => return Err(SqlError::Parse("DELETE without table".into())),
        _ => return Err(SqlError::Unsupported("DELETE from several tables".into())),
    };

    match table.as_str() {
        "cars" => Ok(Command::DeleteCar {
            id: id_filter(delete.selection.as_ref())?,
        }),
        "reservations" => Err(SqlError::Unsupported("cancelling reservations".into())),
        _ => Err(SqlError::UnknownTable(table)),
    }
}

fn parse_select(query: &ast::Query) -> Result<Command, SqlError> {
    let SetExpr::Select(select) = query.body.as_ref() else {
        return Err(SqlError::Unsupported("non-SELECT query".into()));
    };
    let from = match select.from.as_slice() {
        [only] if only.joins.is_empty() => only,
        [] => return Err(SqlError::Parse("SELECT without FROM".into())),
        _ => return Err(SqlError::Unsupported("joins".into())),
    };
    let table = relation_name(&from.relation)?;
    let selection = select.selection.as_ref();

    match table.as_str() {
        "cars" => {
            let filters = Filters::collect(selection, &["id"])?;
            Ok(Command::SelectCars {
                id: filters.get("id").map(text_literal).transpose()?,
            })
        }
        "reservations" => {
            let filters = Filters::collect(selection, &["car_id"])?;
            Ok(Command::SelectReservations {
                car_id: filters.get("car_id").map(text_literal).transpose()?,
            })
        }
        "availability" => {
            let filters = Filters::collect(selection, &["start", "duration"])?;
            let start = filters.get("start").ok_or(SqlError::MissingFilter("start"))?;
            let duration = filters
                .get("duration")
                .ok_or(SqlError::MissingFilter("duration"))?;
            Ok(Command::SelectAvailability {
                start: int_literal(start)?,
                duration: int_literal(duration)?,
            })
        }
        _ => Err(SqlError::UnknownTable(table)),
    }
}

// ── Rows and predicates ───────────────────────────────────────

/// Values of a single-row INSERT keyed by column. Without a column list the
/// values bind to `schema` in order.
struct Row<'a> {
    fields: Vec<(&'static str, &'a Expr)>,
}

impl<'a> Row<'a> {
    fn bind(
        insert: &'a ast::Insert,
        table: &'static str,
        schema: &[&'static str],
    ) -> Result<Self, SqlError> {
        let values = single_row(insert)?;
        if values.len() > schema.len() {
            return Err(SqlError::WrongArity(table, schema.len(), values.len()));
        }

        let columns = if insert.columns.is_empty() {
            schema[..values.len()].to_vec()
        } else {
            if insert.columns.len() != values.len() {
                return Err(SqlError::WrongArity(table, insert.columns.len(), values.len()));
            }
            let mut columns: Vec<&'static str> = Vec::with_capacity(values.len());
            for ident in &insert.columns {
                let name = ident.value.to_lowercase();
                let column = known_column(schema, &name)
                    .ok_or_else(|| SqlError::Unsupported(format!("column {name} in {table}")))?;
                if columns.contains(&column) {
                    return Err(SqlError::InvalidValue(column, "column listed twice".into()));
                }
                columns.push(column);
            }
            columns
        };

        Ok(Self {
            fields: columns.into_iter().zip(values).collect(),
        })
    }

    fn get(&self, column: &str) -> Option<&'a Expr> {
        self.fields.iter().find(|(c, _)| *c == column).map(|(_, e)| *e)
    }
}

/// `col = literal` predicates joined by AND, restricted to `allowed` columns.
/// Anything else in a WHERE clause is refused rather than ignored.
struct Filters<'a> {
    terms: Vec<(&'static str, &'a Expr)>,
}

impl<'a> Filters<'a> {
    fn collect(selection: Option<&'a Expr>, allowed: &[&'static str]) -> Result<Self, SqlError> {
        let mut filters = Self { terms: Vec::new() };
        if let Some(expr) = selection {
            filters.push(expr, allowed)?;
        }
        Ok(filters)
    }

    fn push(&mut self, expr: &'a Expr, allowed: &[&'static str]) -> Result<(), SqlError> {
        match expr {
            Expr::Nested(inner) => self.push(inner, allowed),
            Expr::BinaryOp {
                left,
                op: BinaryOperator::And,
                right,
            } => {
                self.push(left, allowed)?;
                self.push(right, allowed)
            }
            Expr::BinaryOp {
                left,
                op: BinaryOperator::Eq,
                right,
            } => {
                let name = column_ref(left)
                    .ok_or_else(|| SqlError::Unsupported(format!("predicate {expr}")))?;
                let column = known_column(allowed, &name)
                    .ok_or_else(|| SqlError::Unsupported(format!("filter on {name}")))?;
                if self.get(column).is_some() {
                    return Err(SqlError::Unsupported(format!("{column} filtered twice")));
                }
                self.terms.push((column, &**right));
                Ok(())
            }
            other => Err(SqlError::Unsupported(format!("predicate {other}"))),
        }
    }

    fn get(&self, column: &str) -> Option<&'a Expr> {
        self.terms.iter().find(|(c, _)| *c == column).map(|(_, e)| *e)
    }
}

/// The `id = '...'` a car UPDATE or DELETE must carry.
fn id_filter(selection: Option<&Expr>) -> Result<String, SqlError> {
    let filters = Filters::collect(selection, &["id"])?;
    text_literal(filters.get("id").ok_or(SqlError::MissingFilter("id"))?)
}

fn known_column(columns: &[&'static str], name: &str) -> Option<&'static str> {
    columns.iter().copied().find(|c| *c == name)
}

// ── Field checks ──────────────────────────────────────────────

fn validate_car_id(id: &str) -> Result<(), SqlError> {
    if !CAR_ID.is_match(id) {
        return Err(SqlError::InvalidValue(
            "id",
            format!("{id:?} must be C followed by digits"),
        ));
    }
    Ok(())
}

/// Non-null, non-blank string value.
fn required_string(expr: Option<&Expr>, field: &'static str) -> Result<String, SqlError> {
    let expr = expr.ok_or(SqlError::MissingValue(field))?;
    if is_null(expr) {
        return Err(SqlError::MissingValue(field));
    }
    let s = text_literal(expr).map_err(|e| SqlError::InvalidValue(field, e.to_string()))?;
    if s.trim().is_empty() {
        return Err(SqlError::MissingValue(field));
    }
    Ok(s)
}

fn required_i64(expr: Option<&Expr>, field: &'static str) -> Result<i64, SqlError> {
    let expr = expr.ok_or(SqlError::MissingValue(field))?;
    if is_null(expr) {
        return Err(SqlError::MissingValue(field));
    }
    int_literal(expr).map_err(|e| SqlError::InvalidValue(field, e.to_string()))
}

// ── AST access ────────────────────────────────────────────────

fn last_ident(name: &ast::ObjectName) -> Result<String, SqlError> {
    match name.0.last() {
        Some(ObjectNamePart::Identifier(ident)) => Ok(ident.value.to_lowercase()),
        _ => Err(SqlError::Parse(format!("unsupported name {name}"))),
    }
}

fn relation_name(relation: &TableFactor) -> Result<String, SqlError> {
    match relation {
        TableFactor::Table { name, .. } => last_ident(name),
        _ => Err(SqlError::Unsupported("derived tables".into())),
    }
}

fn single_row(insert: &ast::Insert) -> Result<&[Expr], SqlError> {
    let source = insert
        .source
        .as_deref()
        .ok_or_else(|| SqlError::Parse("INSERT without VALUES".into()))?;
    let SetExpr::Values(values) = source.body.as_ref() else {
        return Err(SqlError::Unsupported("INSERT from a query".into()));
    };
    match values.rows.as_slice() {
        [row] => Ok(row),
        [] => Err(SqlError::Parse("empty VALUES".into())),
        _ => Err(SqlError::Unsupported("multi-row INSERT".into())),
    }
}

fn column_ref(expr: &Expr) -> Option<String> {
    let ident = match expr {
        Expr::Identifier(ident) => ident,
        Expr::CompoundIdentifier(parts) => parts.last()?,
        _ => return None,
    };
    Some(ident.value.to_lowercase())
}

fn literal(expr: &Expr) -> Option<&Value> {
    let Expr::Value(ValueWithSpan { value, .. }) = expr else {
        return None;
    };
    Some(value)
}

fn is_null(expr: &Expr) -> bool {
    matches!(literal(expr), Some(Value::Null))
}

fn text_literal(expr: &Expr) -> Result<String, SqlError> {
    match literal(expr) {
        Some(Value::SingleQuotedString(s)) => Ok(s.clone()),
        _ => Err(SqlError::Parse(format!("expected a quoted string, got {expr}"))),
    }
}

/// Integer literal, optionally negated or quoted.
fn int_literal(expr: &Expr) -> Result<i64, SqlError> {
    let digits = match expr {
        Expr::UnaryOp {
            op: UnaryOperator::Minus,
            expr: inner,
        } => return int_literal(inner).map(|n| -n),
        _ => match literal(expr) {
            Some(Value::Number(s, _)) | Some(Value::SingleQuotedString(s)) => s,
            _ => return Err(SqlError::Parse(format!("expected an integer, got {expr}"))),
        },
    };
    digits
        .parse()
        .map_err(|e| SqlError::Parse(format!("bad integer {digits}: {e}")))
}

// ── Errors ────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub enum SqlError {
    Parse(String),
    Empty,
    Unsupported(String),
    UnknownTable(String),
    WrongArity(&'static str, usize, usize),
    MissingFilter(&'static str),
    MissingValue(&'static str),
    InvalidValue(&'static str, String),
}

impl SqlError {
    /// Request field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            SqlError::MissingFilter(f)
            | SqlError::MissingValue(f)
            | SqlError::InvalidValue(f, _) => Some(*f),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlError::Parse(s) => write!(f, "parse error: {s}"),
            SqlError::Empty => write!(f, "empty query"),
            SqlError::Unsupported(s) => write!(f, "unsupported: {s}"),
            SqlError::UnknownTable(t) => write!(f, "unknown table: {t}"),
            SqlError::WrongArity(t, expected, got) => {
                write!(f, "{t}: expected {expected} values, got {got}")
            }
            SqlError::MissingFilter(col) => write!(f, "missing filter: {col}"),
            SqlError::MissingValue(field) => write!(f, "the {field} field is required"),
            SqlError::InvalidValue(field, reason) => write!(f, "invalid {field}: {reason}"),
        }
    }
}

impl std::error::Error for SqlError {}
