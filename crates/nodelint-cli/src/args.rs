//! CLI arguments for the nodelint binary.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nodelint",
    version,
    about = "Static analyzer for JavaScript projects",
    after_help = "Target:\n  \
        <file.js>        Analyze a single file\n  \
        <directory>      Analyze all .js files in this directory (excluding node_modules)\n  \
        <package.json>   Analyze all project files imported from the main file"
)]
pub struct CliArgs {
    /// Source file, directory, or project package.json to analyze.
    pub target: PathBuf,

    /// Show debug output.
    #[arg(short = 'd')]
    pub debug: bool,

    /// Show suggestions. May include many false positives.
    #[arg(short = 's')]
    pub suggest: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use clap::error::ErrorKind;

    #[test]
    fn flags_parse_alongside_the_target() {
        let args = CliArgs::try_parse_from(["nodelint", "-d", "-s", "src/app.js"]).unwrap();
        assert!(args.debug);
        assert!(args.suggest);
        assert_eq!(args.target, PathBuf::from("src/app.js"));

        let args = CliArgs::try_parse_from(["nodelint", "package.json"]).unwrap();
        assert!(!args.debug);
        assert!(!args.suggest);
    }

    #[test]
    fn the_target_is_required() {
        let err = CliArgs::try_parse_from(["nodelint"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        let err = CliArgs::try_parse_from(["nodelint", "-q", "a.js"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn help_is_a_clean_exit() {
        let err = CliArgs::try_parse_from(["nodelint", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }
}
