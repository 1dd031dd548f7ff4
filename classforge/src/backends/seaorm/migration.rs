//! SQL migration generation
//!
//! SeaORM applications get plain SQL files, one per table, numbered in
//! dependency order. Only the primary-key column differs between drivers.

use crate::backends::{BackendError, EmitContext, connection_profile};
use crate::plan::{ColumnPlan, JoinTablePlan, TablePlan};
use crate::types::CanonicalType;

fn primary_key(ctx: &EmitContext<'_>) -> &'static str {
    match connection_profile(&ctx.config.connection).scheme {
        "postgres" => "id BIGSERIAL PRIMARY KEY",
        "sqlite" => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        "mssql" => "id BIGINT IDENTITY(1,1) PRIMARY KEY",
        _ => "id BIGINT AUTO_INCREMENT PRIMARY KEY",
    }
}

/// SQL literal for a declared default
fn sql_literal(canonical: CanonicalType, value: &str) -> Result<String, BackendError> {
    if canonical == CanonicalType::Boolean {
        return match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok("TRUE".to_string()),
            "false" | "0" | "no" => Ok("FALSE".to_string()),
            other => Err(BackendError::CodeGenError(format!(
                "invalid boolean default '{}'",
                other
            ))),
        };
    }
    if canonical.is_numeric() {
        return value.parse::<f64>().map(|_| value.to_string()).map_err(|_| {
            BackendError::CodeGenError(format!("invalid numeric default '{}'", value))
        });
    }
    Ok(format!("'{}'", value.replace('\'', "''")))
}

fn column_line(column: &ColumnPlan) -> Result<String, BackendError> {
    let mut line = column.fragment.clone();
    if !column.nullable {
        line.push_str(" NOT NULL");
    }
    if column.unique {
        line.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        line.push_str(" DEFAULT ");
        line.push_str(&sql_literal(column.canonical_type, default)?);
    }
    Ok(line)
}

fn create_table(header: String, table: &str, lines: Vec<String>) -> String {
    let body = lines
        .iter()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{}\nCREATE TABLE {} (\n{}\n);\n", header, table, body)
}

/// Generate the create-table migration of one model
pub fn generate_table(
    plan: &TablePlan,
    sequence: usize,
    ctx: &EmitContext<'_>,
) -> Result<String, BackendError> {
    let mut lines = vec![primary_key(ctx).to_string()];
    for column in &plan.columns {
        lines.push(column_line(column)?);
    }
    for fk in &plan.foreign_keys {
        let null = if fk.nullable { "" } else { " NOT NULL" };
        lines.push(format!("{} BIGINT{}", fk.column, null));
    }
    lines.push("created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
    lines.push("updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP".to_string());
    for fk in &plan.foreign_keys {
        lines.push(format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} ({}) ON DELETE {}",
            plan.table,
            fk.column,
            fk.column,
            fk.references_table,
            fk.references_column,
            fk.on_delete.as_sql()
        ));
    }

    let header = format!(
        "-- Migration {:04}: create {} for {}",
        sequence, plan.table, plan.class_name
    );
    Ok(create_table(header, &plan.table, lines))
}

/// Generate the join-table migration of a many-to-many relationship
pub fn generate_join_table(plan: &JoinTablePlan, sequence: usize) -> String {
    let mut lines = Vec::new();
    for side in [&plan.left, &plan.right] {
        lines.push(format!("{} BIGINT NOT NULL", side.column));
    }
    lines.push(format!(
        "PRIMARY KEY ({}, {})",
        plan.left.column, plan.right.column
    ));
    for side in [&plan.left, &plan.right] {
        lines.push(format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {} (id) ON DELETE CASCADE",
            plan.table, side.column, side.column, side.references_table
        ));
    }

    let header = format!(
        "-- Migration {:04}: create {} joining {} and {}",
        sequence, plan.table, plan.left.references_table, plan.right.references_table
    );
    create_table(header, &plan.table, lines)
}
