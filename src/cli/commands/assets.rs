//! `taxon assets` - inventory of recorded icon assets

use miette::Result;

use crate::cli::commands::open_catalog;
use crate::cli::output::print_assets;
use crate::cli::GlobalOpts;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let (catalog, _config) = open_catalog(global)?;
    print_assets(&catalog.list_assets()?, global)
}
