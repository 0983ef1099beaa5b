use clap::Parser;
use miette::Result;
use taxon::cli::commands;
use taxon::cli::{Cli, Commands, GlobalOpts};
use taxon::entities::{Category, Generic, Location, Subcategory};
use tracing_subscriber::EnvFilter;

fn init_tracing(global: &GlobalOpts) {
    let default = if global.verbose { "taxon=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TAXON_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Reset SIGPIPE so piping into `head` and friends exits quietly
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(&global);

    match cli.command {
        Commands::Location(cmd) => commands::taxon::run::<Location>(cmd, &global),
        Commands::Category(cmd) => commands::taxon::run::<Category>(cmd, &global),
        Commands::Subcategory(cmd) => commands::taxon::run::<Subcategory>(cmd, &global),
        Commands::Generic(cmd) => commands::taxon::run::<Generic>(cmd, &global),
        Commands::Supplier(cmd) => commands::supplier::run(cmd, &global),
        Commands::Assets => commands::assets::run(&global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
