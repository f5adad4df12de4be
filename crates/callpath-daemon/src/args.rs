//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for the callpath daemon
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "callpathd")]
#[command(about = "Keeps the voice-call audio path between modem and codec wired")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Name of the codec's ALSA card
    #[arg(long, short = 'c', value_name = "NAME")]
    pub codec: Option<String>,

    /// Name of the modem's ALSA card
    #[arg(long, short = 'm', value_name = "NAME")]
    pub modem: Option<String>,

    /// Configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("callpathd").chain(args.iter().copied()))
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_short_and_long() {
        let args = parse(&["-c", "sgtl5000", "--modem", "SIMcom SIM7100", "--config=/tmp/c.toml"]).unwrap();
        assert_eq!(
            args,
            Args {
                codec: Some("sgtl5000".into()),
                modem: Some("SIMcom SIM7100".into()),
                config: Some(PathBuf::from("/tmp/c.toml")),
            }
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["-c", "x", "--help"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse(&["-V"]).unwrap_err().kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--modem"]).is_err());
        assert!(parse(&["sgtl5000"]).is_err());
        assert_eq!(parse(&["--verbose"]).unwrap_err().kind(), ErrorKind::UnknownArgument);
    }
}
