//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, supplier::SupplierCommands, taxon::TaxonCommands,
};

#[derive(Parser)]
#[command(name = "taxon")]
#[command(author, version, about = "Taxonomy catalog manager")]
#[command(long_about = "Manage locations, categories, sub-categories, generics and suppliers, with icon assets, in a local SQLite catalog.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging, status intent)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Configuration file (merged over the global config)
    #[arg(long, global = true, env = "TAXON_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Location management
    #[command(subcommand, visible_alias = "loc")]
    Location(TaxonCommands),

    /// Category management (each category belongs to a location)
    #[command(subcommand, visible_alias = "cat")]
    Category(TaxonCommands),

    /// Sub-category management (each sub-category belongs to a category)
    #[command(subcommand, visible_alias = "sub")]
    Subcategory(TaxonCommands),

    /// Generic name management
    #[command(subcommand, visible_alias = "gen")]
    Generic(TaxonCommands),

    /// Supplier management
    #[command(subcommand, visible_alias = "sup")]
    Supplier(SupplierCommands),

    /// List recorded icon assets
    Assets,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, table for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated table (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_category_create() {
        let cli = Cli::try_parse_from([
            "taxon", "category", "create", "--name", "Grocery", "--parent", "abc", "-f", "id",
        ])
        .unwrap();
        assert_eq!(cli.global.format, OutputFormat::Id);
        assert!(matches!(cli.command, Commands::Category(TaxonCommands::Create(_))));
    }

    #[test]
    fn test_list_window_accepts_raw_text() {
        // validated by the operation, not by clap
        let cli = Cli::try_parse_from(["taxon", "loc", "list", "--limit", "-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Location(TaxonCommands::List(_))));
    }
}
