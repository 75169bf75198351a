use clap::Parser;
use miette::Result;
use plp::cli::commands::{completions, config, ingest, query, stats};
use plp::cli::{helpers, Cli, Commands};

fn main() -> Result<()> {
    // Die quietly on a closed stdout (`plp query units | head`)
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

    let cfg = helpers::load_config(&global)?;
    helpers::setup_logging(&global, &cfg);

    match cli.command {
        Commands::Ingest(args) => ingest::run(args, &global, &cfg),
        Commands::Query(cmd) => query::run(cmd, &global, &cfg),
        Commands::Stats(args) => stats::run(args, &global, &cfg),
        Commands::Config(cmd) => config::run(cmd, &global, &cfg),
        Commands::Completions(args) => completions::run(args),
    }
}
