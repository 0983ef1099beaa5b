//! `taxon supplier` command - Supplier management

use clap::Subcommand;
use miette::Result;
use std::path::PathBuf;

use crate::cli::commands::taxon::{IdArgs, ListArgs};
use crate::cli::commands::{open_catalog, stage_icon};
use crate::cli::output::{print_id_reply, print_page_reply, print_record_reply};
use crate::cli::GlobalOpts;
use crate::core::entity::{Fields, Taxon};
use crate::entities::{Supplier, SupplierPatch};

#[derive(Subcommand, Debug)]
pub enum SupplierCommands {
    /// Create a supplier
    Create(CreateArgs),

    /// List suppliers, newest first (keyword matches name or slug)
    List(ListArgs),

    /// Show a supplier's details
    Show(IdArgs),

    /// Change the supplied fields of a supplier
    Update(UpdateArgs),

    /// Delete a supplier and its icon
    #[command(visible_alias = "rm")]
    Remove(IdArgs),
}

/// Supplier-specific fields; an empty value clears an optional field on update
#[derive(clap::Args, Debug, Default)]
pub struct SupplierFieldArgs {
    /// Category of supplier (e.g. "Wholesaler")
    #[arg(long = "category")]
    pub category_of_supplier: Option<String>,

    /// Product category supplied
    #[arg(long = "product-category")]
    pub supplier_product_category: Option<String>,

    /// Status (e.g. "Active")
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Postal address
    #[arg(long = "address")]
    pub supplier_address: Option<String>,

    /// Contact phone number
    #[arg(long = "phone")]
    pub contact_number: Option<String>,

    /// Contact email address
    #[arg(long = "email")]
    pub email_address: Option<String>,

    /// Contact person
    #[arg(long = "contact")]
    pub contact_person: Option<String>,
}

impl From<SupplierFieldArgs> for SupplierPatch {
    fn from(args: SupplierFieldArgs) -> Self {
        SupplierPatch {
            category_of_supplier: args.category_of_supplier,
            supplier_product_category: args.supplier_product_category,
            status: args.status,
            supplier_address: args.supplier_address,
            contact_number: args.contact_number,
            email_address: args.email_address,
            contact_person: args.contact_person,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct CreateArgs {
    /// Supplier name
    #[arg(long, short = 'n')]
    pub name: String,

    #[command(flatten)]
    pub fields: SupplierFieldArgs,

    /// Icon image to upload
    #[arg(long)]
    pub icon: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Supplier id
    pub id: String,

    /// New supplier name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    #[command(flatten)]
    pub fields: SupplierFieldArgs,

    /// Replacement icon image
    #[arg(long)]
    pub icon: Option<PathBuf>,
}

pub fn run(cmd: SupplierCommands, global: &GlobalOpts) -> Result<()> {
    let (catalog, config) = open_catalog(global)?;
    let resource = catalog.resource::<Supplier>();

    match cmd {
        SupplierCommands::Create(args) => {
            let icon = stage_icon(args.icon.as_deref(), &config)?;
            let fields = Fields {
                name: Some(args.name),
                parent: None,
                attrs: args.fields.into(),
            };
            print_id_reply(&resource.create(fields, icon)?, global)
        }
        SupplierCommands::List(args) => {
            print_page_reply(Supplier::KIND, &resource.list(args.into_query())?, global)
        }
        SupplierCommands::Show(args) => {
            print_record_reply(Supplier::KIND, &resource.show(&args.id)?, global)
        }
        SupplierCommands::Update(args) => {
            let icon = stage_icon(args.icon.as_deref(), &config)?;
            let fields = Fields {
                name: args.name,
                parent: None,
                attrs: args.fields.into(),
            };
            print_id_reply(&resource.update(&args.id, fields, icon)?, global)
        }
        SupplierCommands::Remove(args) => {
            print_record_reply(Supplier::KIND, &resource.remove(&args.id)?, global)
        }
    }
}
