#![forbid(unsafe_code)]

use std::path::PathBuf;

use crate::error::CliError;

pub const USAGE: &str = "\
usage: dualfm [--cd FILE] [PATH]

  PATH         directory to start in (default: current directory)
  --cd FILE    on quit, write the last directory to FILE
  -h, --help   show this help
  -V, --version
";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cli {
    pub start: Option<PathBuf>,
    pub exit_marker: Option<PathBuf>,
    pub help: bool,
    pub version: bool,
}

impl Cli {
    /// Parses arguments without the program name.
    pub fn parse<I>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cli = Cli::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => cli.help = true,
                "-V" | "--version" => cli.version = true,
                "--cd" => {
                    let file = args.next().ok_or_else(|| CliError::MissingValue(arg.clone()))?;
                    cli.exit_marker = Some(PathBuf::from(file));
                }
                _ if arg.starts_with("--cd=") => {
                    cli.exit_marker = Some(PathBuf::from(&arg["--cd=".len()..]));
                }
                _ if arg.starts_with('-') && arg.len() > 1 => return Err(CliError::UnknownOption(arg)),
                _ if cli.start.is_none() => cli.start = Some(PathBuf::from(arg)),
                _ => return Err(CliError::UnexpectedArgument(arg)),
            }
        }
        Ok(cli)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, CliError> {
        Cli::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn no_arguments_start_in_cwd() {
        assert_eq!(parse(&[]).unwrap(), Cli::default());
    }

    #[test]
    fn start_path_and_exit_marker() {
        let cli = parse(&["--cd", "/tmp/last", "/srv"]).unwrap();
        assert_eq!(cli.start, Some(PathBuf::from("/srv")));
        assert_eq!(cli.exit_marker, Some(PathBuf::from("/tmp/last")));
        let cli = parse(&["--cd=/tmp/x"]).unwrap();
        assert_eq!(cli.exit_marker, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn rejects_bad_arguments() {
        assert_eq!(parse(&["--cd"]), Err(CliError::MissingValue("--cd".to_string())));
        assert_eq!(parse(&["--bogus"]), Err(CliError::UnknownOption("--bogus".to_string())));
        assert_eq!(parse(&["a", "b"]), Err(CliError::UnexpectedArgument("b".to_string())));
    }
}
