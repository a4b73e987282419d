//! Resolve/eval command handlers

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use unicode_width::UnicodeWidthStr;

use super::{EvalCommands, OutputFormat, ResolveCommands};
use crate::config::GridConfig;
use crate::expression::LuaEngine;
use crate::model::{ColumnDefinition, Entity, Record};
use crate::resolve::Resolver;
use crate::translation::{Locale, MessageCatalog};

/// Handle the resolve command
pub fn handle_resolve_command(args: ResolveCommands) -> Result<()> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = GridConfig::load(&args.grid)?;
    let columns = select_columns(config.columns()?, &args.columns)?;

    let catalog = match &args.messages {
        Some(path) => MessageCatalog::load(path)?,
        None => MessageCatalog::new(),
    };

    let entities = read_records(&args.records, &config.data_definition.name)?;
    log::info!(
        "Resolving {} columns for {} records",
        columns.len(),
        entities.len()
    );

    let resolver = Resolver::new(LuaEngine::new(), Arc::new(catalog));
    let locale = Locale::new(args.locale);
    let rows = resolver
        .resolve_rows(entities.iter().map(|e| e as &dyn Record), &columns, &locale)
        .context("Failed to resolve grid")?;

    let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match args.format {
        OutputFormat::Table => write_table(&mut out, &header, &rows)?,
        OutputFormat::Csv => write_csv(&mut out, &header, &rows)?,
    }

    Ok(())
}

/// Handle the eval command
pub fn handle_eval_command(args: EvalCommands) -> Result<()> {
    let entity = match &args.record {
        Some(path) => {
            let json = read_json(path)?;
            if !json.is_object() {
                anyhow::bail!("Record file must contain a JSON object: {}", path.display());
            }
            Some(Entity::from_json(&args.entity, &json))
        }
        None => None,
    };

    let resolver = Resolver::new(LuaEngine::new(), Arc::new(MessageCatalog::new()));
    let value = resolver
        .resolve_expression(entity.as_ref().map(|e| e as &dyn Record), &args.expression)
        .with_context(|| format!("Failed to evaluate expression: {}", args.expression))?;

    match value {
        Some(text) => println!("{}", text),
        None => println!("{}", "(empty)".dimmed()),
    }

    Ok(())
}

/// Keep only the requested columns, in the order requested
fn select_columns(
    columns: Vec<ColumnDefinition>,
    wanted: &[String],
) -> Result<Vec<ColumnDefinition>> {
    if wanted.is_empty() {
        return Ok(columns);
    }

    wanted
        .iter()
        .map(|name| {
            columns
                .iter()
                .find(|c| &c.name == name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("Unknown column: {}", name))
        })
        .collect()
}

fn read_json(path: &Path) -> Result<serde_json::Value> {
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON: {}", path.display()))
}

/// Read a JSON object or an array of objects as entities
fn read_records(path: &Path, entity_name: &str) -> Result<Vec<Entity>> {
    match read_json(path)? {
        serde_json::Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if !item.is_object() {
                    anyhow::bail!("Record {} in {} is not a JSON object", i, path.display());
                }
                Ok(Entity::from_json(entity_name, item))
            })
            .collect(),
        json @ serde_json::Value::Object(_) => Ok(vec![Entity::from_json(entity_name, &json)]),
        _ => anyhow::bail!(
            "Records file must contain a JSON object or array: {}",
            path.display()
        ),
    }
}

fn write_table(
    out: &mut impl Write,
    header: &[&str],
    rows: &[Vec<Option<String>>],
) -> Result<()> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let width = cell.as_deref().map(|c| c.width()).unwrap_or(0);
            widths[i] = widths[i].max(width);
        }
    }

    let header_line = header
        .iter()
        .zip(&widths)
        .map(|(h, w)| pad(h, *w).bold().to_string())
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", header_line.trim_end())?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| pad(cell.as_deref().unwrap_or(""), *w))
            .collect::<Vec<_>>()
            .join("  ");
        writeln!(out, "{}", line.trim_end())?;
    }

    Ok(())
}

/// Left-align text to a display width
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn write_csv(out: &mut impl Write, header: &[&str], rows: &[Vec<Option<String>>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("grid-cells-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_records_array_and_object() {
        let array = write_temp("array.json", r#"[{"orderid": 1}, {"orderid": 2}]"#);
        let entities = read_records(&array, "order").unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[1].id, Value::Int(2));

        let object = write_temp("object.json", r#"{"id": 5, "number": "ORD-5"}"#);
        let entities = read_records(&object, "order").unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, Value::Int(5));
    }

    #[test]
    fn test_read_records_rejects_scalars() {
        let scalar = write_temp("scalar.json", "42");
        assert!(read_records(&scalar, "order").is_err());

        let mixed = write_temp("mixed.json", r#"[{"id": 1}, 2]"#);
        assert!(read_records(&mixed, "order").is_err());
    }

    #[test]
    fn test_select_columns() {
        let columns = vec![
            ColumnDefinition::expression("a", "1"),
            ColumnDefinition::expression("b", "2"),
        ];

        let selected = select_columns(columns.clone(), &["b".to_string()]).unwrap();
        assert_eq!(selected, vec![columns[1].clone()]);

        assert!(select_columns(columns, &["c".to_string()]).is_err());
    }

    #[test]
    fn test_write_csv() {
        let mut out = Vec::new();
        let rows = vec![
            vec![Some("ORD-1".to_string()), None],
            vec![Some("A, B".to_string()), Some("4".to_string())],
        ];
        write_csv(&mut out, &["number", "double"], &rows).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "number,double\nORD-1,\n\"A, B\",4\n"
        );
    }

    #[test]
    fn test_write_table_aligns_columns() {
        colored::control::set_override(false);

        let mut out = Vec::new();
        let rows = vec![vec![Some("ORD-1".to_string()), Some("4".to_string())]];
        write_table(&mut out, &["n", "double"], &rows).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "n      double\nORD-1  4\n"
        );
    }
}
