use clap::Parser;
use clap::error::ErrorKind;
use nodelint_cli::{CliArgs, driver};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{e}");
            std::process::exit(0);
        }
        Err(e) => {
            // Argument mistakes exit 1, with usage on stderr.
            eprint!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = driver::run(&args) {
        // Unrecoverable failures: unreadable input, unparsable modules,
        // missing project manifest.
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
