//! Command-line interface

pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::resolve::{EvalCommands, ResolveCommands};

/// Resolve grid cell text from records
#[derive(Debug, Parser)]
#[command(name = "grid-cells", version, about)]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve every column of a grid for a file of records
    Resolve(ResolveCommands),
    /// Evaluate a single expression against a record
    Eval(EvalCommands),
}

/// Dispatch a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Resolve(args) => commands::resolve::handle_resolve_command(args),
        Commands::Eval(args) => commands::resolve::handle_eval_command(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commands::resolve::OutputFormat;

    #[test]
    fn test_parse_eval_with_positional_expression() {
        let cli = Cli::try_parse_from([
            "grid-cells",
            "eval",
            "number .. '!'",
            "--record",
            "order.json",
            "--entity",
            "order",
        ])
        .unwrap();

        match cli.command {
            Commands::Eval(args) => {
                assert_eq!(args.expression, "number .. '!'");
                assert_eq!(args.entity, "order");
                assert!(args.record.is_some());
            }
            other => panic!("expected eval, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "grid-cells",
            "-v",
            "resolve",
            "--grid",
            "orders.toml",
            "--records",
            "orders.json",
            "--column",
            "state",
            "--column",
            "paid",
            "--format",
            "csv",
            "--no-color",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.columns, vec!["state", "paid"]);
                assert_eq!(args.format, OutputFormat::Csv);
                assert_eq!(args.locale, "en");
                assert!(args.no_color);
            }
            other => panic!("expected resolve, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_has_no_entity_flag() {
        let parsed = Cli::try_parse_from([
            "grid-cells",
            "resolve",
            "--grid",
            "g.toml",
            "--records",
            "r.json",
            "--entity",
            "order",
        ]);
        assert!(parsed.is_err());
    }
}
