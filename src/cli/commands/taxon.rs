//! `taxon location|category|subcategory|generic` - kinds with the common shape

use clap::Subcommand;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::{open_catalog, stage_icon};
use crate::cli::output::{print_id_reply, print_page_reply, print_record_reply};
use crate::cli::GlobalOpts;
use crate::core::entity::{Fields, NoAttrs, Taxon};
use crate::core::resource::ListQuery;

#[derive(Subcommand, Debug)]
pub enum TaxonCommands {
    /// Create a record
    Create(CreateArgs),

    /// List records, newest first
    List(ListArgs),

    /// Show one record
    Show(IdArgs),

    /// Change the supplied fields of a record
    Update(UpdateArgs),

    /// Delete a record and its icon
    #[command(visible_alias = "rm")]
    Remove(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Parent record id (location for a category, category for a sub-category)
    #[arg(long, short = 'p')]
    pub parent: Option<String>,

    /// Icon image to upload
    #[arg(long)]
    pub icon: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Record id
    pub id: String,

    /// New display name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New parent record id
    #[arg(long, short = 'p')]
    pub parent: Option<String>,

    /// Replacement icon image
    #[arg(long)]
    pub icon: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Page size (default from config, 10)
    #[arg(long, short = 'l', allow_hyphen_values = true)]
    pub limit: Option<String>,

    /// Number of records to skip
    #[arg(long, short = 'o', allow_hyphen_values = true)]
    pub offset: Option<String>,

    /// Case-insensitive name substring (or exact id, where supported)
    #[arg(long, short = 'k')]
    pub keyword: Option<String>,
}

impl ListArgs {
    pub fn into_query(self) -> ListQuery {
        ListQuery {
            limit: self.limit,
            offset: self.offset,
            keyword: self.keyword,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Record id
    pub id: String,
}

pub fn run<T>(cmd: TaxonCommands, global: &GlobalOpts) -> Result<()>
where
    T: Taxon<Attrs = NoAttrs>,
{
    let (catalog, config) = open_catalog(global)?;
    let resource = catalog.resource::<T>();

    match cmd {
        TaxonCommands::Create(args) => {
            let icon = stage_icon(args.icon.as_deref(), &config)?;
            let fields = Fields {
                name: Some(args.name),
                parent: args.parent,
                attrs: (),
            };
            print_id_reply(&resource.create(fields, icon)?, global)
        }
        TaxonCommands::List(args) => {
            print_page_reply(T::KIND, &resource.list(args.into_query())?, global)
        }
        TaxonCommands::Show(args) => print_record_reply(T::KIND, &resource.show(&args.id)?, global),
        TaxonCommands::Update(args) => {
            let icon = stage_icon(args.icon.as_deref(), &config)?;
            let fields = Fields {
                name: args.name,
                parent: args.parent,
                attrs: (),
            };
            print_id_reply(&resource.update(&args.id, fields, icon)?, global)
        }
        TaxonCommands::Remove(args) => {
            print_record_reply(T::KIND, &resource.remove(&args.id)?, global)
        }
    }
}
