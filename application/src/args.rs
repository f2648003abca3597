//! [`Args`] definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Server of the housing fund registry.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Mode to run in. Serves the API, if omitted.
    #[command(subcommand)]
    pub mode: Option<Mode>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Mode of running the application.
#[derive(Debug, Subcommand)]
pub enum Mode {
    /// Serve the GraphQL API.
    Serve,

    /// Export the registered houses into a delimited text file.
    Export(Export),
}

/// Arguments of the [`Mode::Export`].
#[derive(Debug, clap::Args)]
pub struct Export {
    /// Path of the file to write.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Fields to export, in order. All the fields, if omitted.
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Delimiter of the exported fields.
    #[arg(short, long, value_enum, default_value_t = Delimiter::Tab)]
    pub delimiter: Delimiter,

    /// Omit the header row.
    #[arg(long)]
    pub no_header: bool,

    /// Only export houses which address contains this text.
    #[arg(long)]
    pub address: Option<String>,
}

/// Delimiter of exported fields.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Delimiter {
    /// Tab character.
    Tab,

    /// Semicolon.
    Semicolon,

    /// Comma.
    Comma,
}

impl From<Delimiter> for service::export::Delimiter {
    fn from(value: Delimiter) -> Self {
        match value {
            Delimiter::Tab => Self::Tab,
            Delimiter::Semicolon => Self::Semicolon,
            Delimiter::Comma => Self::Comma,
        }
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Args, Delimiter, Mode};

    #[test]
    fn serves_by_default() {
        let args = Args::try_parse_from(["app"]).expect("valid args");

        assert_eq!(args.config, "config.toml");
        assert!(args.mode.is_none());
    }

    #[test]
    fn parses_export() {
        let args = Args::try_parse_from([
            "app",
            "--config",
            "prod.toml",
            "export",
            "--output",
            "houses.csv",
            "--fields",
            "address,build_year",
            "--delimiter",
            "semicolon",
            "--no-header",
        ])
        .expect("valid args");

        let Some(Mode::Export(export)) = args.mode else {
            panic!("expected `export` mode");
        };
        assert_eq!(args.config, "prod.toml");
        assert_eq!(export.output.to_str(), Some("houses.csv"));
        assert_eq!(export.fields, ["address", "build_year"]);
        assert!(matches!(export.delimiter, Delimiter::Semicolon));
        assert!(export.no_header);
        assert!(export.address.is_none());
    }
}
