use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use unisensctl::cmd_attrs;
use unisensctl::cmd_data::{self, DataArgs};
use unisensctl::cmd_list;
use unisensctl::cmd_show;

#[derive(Parser, Debug)]
#[command(name = "unisensctl", version, about = "Unisens recording inspector")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Output JSON where applicable
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the entries of a recording
    List {
        /// Recording folder or its unisens.xml
        path: PathBuf,
    },
    /// Print one entry's attributes and XML
    Show {
        path: PathBuf,
        #[arg(long)]
        id: String,
    },
    /// Decode an entry's payload as JSON
    Data {
        path: PathBuf,
        #[arg(long)]
        id: String,
        /// list, pandas or numpy
        #[arg(long, default_value = "list")]
        mode: String,
        /// Skip lsbValue scaling
        #[arg(long)]
        raw: bool,
        /// Override the declared byte order
        #[arg(long)]
        big_endian: bool,
    },
    /// Print the recording's custom attributes
    Attrs { path: PathBuf },
}

fn main() -> Result<()> {
    let Cli { verbose, json, cmd } = Cli::parse();

    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.into()),
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cmd {
        Cmd::List { path } => cmd_list::run(&path, json)?,
        Cmd::Show { path, id } => cmd_show::run(&path, &id, json)?,
        Cmd::Data {
            path,
            id,
            mode,
            raw,
            big_endian,
        } => {
            let args = DataArgs {
                id,
                mode,
                raw,
                big_endian,
            };
            cmd_data::run(&path, args)?
        }
        Cmd::Attrs { path } => cmd_attrs::run(&path, json)?,
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_data_defaults() {
        let cli = Cli::parse_from(["unisensctl", "data", "rec", "--id", "ecg.bin"]);
        match cli.cmd {
            Cmd::Data {
                path,
                id,
                mode,
                raw,
                big_endian,
            } => {
                assert_eq!(path, PathBuf::from("rec"));
                assert_eq!(id, "ecg.bin");
                assert_eq!(mode, "list");
                assert!(!raw);
                assert!(!big_endian);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["unisensctl", "-vv", "--json", "list", "rec/unisens.xml"]);
        assert_eq!(cli.verbose, 2);
        assert!(cli.json);
        match cli.cmd {
            Cmd::List { path } => assert_eq!(path, PathBuf::from("rec/unisens.xml")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn show_requires_id() {
        assert!(Cli::try_parse_from(["unisensctl", "show", "rec"]).is_err());
    }
}
