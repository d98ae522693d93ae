//! Rendering of query values into parameterized PostGIS SQL.
//!
//! Every value is bound as a `$n` parameter. Identifiers come from
//! configuration and are quoted.

use serde::Serialize;
use std::fmt;

use super::expr::{DistanceOrder, GeogExpr, Predicate, ScalarQuery, SpatialQuery};
use crate::models::{TableRef, WGS84_SRID};

/// A bound statement parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlParam {
    Float(f64),
    Int(i64),
    Text(String),
    IntArray(Vec<i64>),
}

/// SQL text with its positional parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[derive(Default)]
struct SqlWriter {
    sql: String,
    params: Vec<SqlParam>,
}

impl SqlWriter {
    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn bind(&mut self, param: SqlParam) {
        self.params.push(param);
        self.sql.push_str(&format!("${}", self.params.len()));
    }

    fn ident(&mut self, ident: &str) {
        self.sql.push_str(&quote_ident(ident));
    }

    fn geog(&mut self, expr: &GeogExpr) {
        match expr {
            GeogExpr::Column { name } => self.ident(name),
            GeogExpr::Literal { value } => {
                self.push("ST_GeogFromText(");
                self.bind(SqlParam::Text(value.as_str().to_string()));
                self.push(")");
            }
            GeogExpr::MakePoint { lng, lat } => {
                self.push("ST_SetSRID(ST_MakePoint(");
                self.bind(SqlParam::Float(*lng));
                self.push(", ");
                self.bind(SqlParam::Float(*lat));
                self.push(&format!("), {})::geography", WGS84_SRID));
            }
            GeogExpr::Envelope { bbox } => {
                self.push("ST_MakeEnvelope(");
                for corner in bbox.to_array() {
                    self.bind(SqlParam::Float(corner));
                    self.push(", ");
                }
                self.push(&format!("{})::geography", WGS84_SRID));
            }
        }
    }

    fn binary(&mut self, function: &str, left: &GeogExpr, right: &GeogExpr) {
        self.push(function);
        self.push("(");
        self.geog(left);
        self.push(", ");
        self.geog(right);
    }

    fn predicate(&mut self, predicate: &Predicate) {
        match predicate {
            Predicate::DWithin {
                left,
                right,
                meters,
            } => {
                self.binary("ST_DWithin", left, right);
                self.push(", ");
                self.bind(SqlParam::Float(*meters));
                self.push(")");
            }
            Predicate::Covers {
                container,
                contained,
            } => {
                self.binary("ST_Covers", container, contained);
                self.push(")");
            }
            Predicate::Intersects { left, right } => {
                self.binary("ST_Intersects", left, right);
                self.push(")");
            }
        }
    }

    fn order(&mut self, order: &DistanceOrder) {
        self.push(" ORDER BY ");
        self.binary("ST_Distance", &order.left, &order.right);
        self.push(") ASC");
    }

    fn where_id(&mut self, table: &TableRef) {
        self.push(" FROM ");
        self.ident(&table.table);
        self.push(" WHERE ");
        self.ident(&table.id_column);
        self.push(" = ");
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

impl SpatialQuery {
    /// Render as `SELECT <id> FROM <table> WHERE ... [ORDER BY ...] [LIMIT ...]`
    pub fn to_statement(&self) -> Statement {
        let mut w = SqlWriter::default();
        w.push("SELECT ");
        w.ident(&self.table.id_column);
        w.push(" FROM ");
        w.ident(&self.table.table);
        w.push(" WHERE ");
        w.predicate(&self.predicate);
        if let Some(order) = &self.order_by {
            w.order(order);
        }
        if let Some(limit) = self.limit {
            w.push(" LIMIT ");
            w.bind(SqlParam::Int(limit as i64));
        }
        w.finish()
    }
}

impl ScalarQuery {
    pub fn to_statement(&self) -> Statement {
        let mut w = SqlWriter::default();
        match self {
            ScalarQuery::Test { predicate } => {
                w.push("SELECT ");
                w.predicate(predicate);
            }
            ScalarQuery::UnionSimplify {
                table,
                ids,
                tolerance,
            } => {
                w.push("SELECT ST_AsText(ST_SimplifyPreserveTopology(ST_Union(");
                w.ident(&table.shape_column);
                w.push("::geometry), ");
                w.bind(SqlParam::Float(*tolerance));
                w.push(")::geography) FROM ");
                w.ident(&table.table);
                w.push(" WHERE ");
                w.ident(&table.id_column);
                w.push(" = ANY(");
                w.bind(SqlParam::IntArray(ids.clone()));
                w.push(")");
            }
            ScalarQuery::Distance { table, id, other } => {
                w.push("SELECT ST_Distance(");
                w.ident(&table.point_column);
                w.push(", ");
                w.geog(other);
                w.push(")");
                w.where_id(table);
                w.bind(SqlParam::Int(*id));
            }
            ScalarQuery::Area { table, id } => {
                w.push("SELECT ST_Area(");
                w.ident(&table.shape_column);
                w.push(")");
                w.where_id(table);
                w.bind(SqlParam::Int(*id));
            }
        }
        w.finish()
    }
}
