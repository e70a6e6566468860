use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "objnet",
    about = "objnet — content-addressed object propagation between peers",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a node that accepts peer connections
    Serve(ServeArgs),
    /// Announce objects from a JSON file to a node
    Push(PushArgs),
    /// Print the id of every object in a JSON file
    Id(IdArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on (overrides the config file)
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Directory for durable object storage (overrides the config file)
    #[arg(long)]
    pub db: Option<PathBuf>,
}

#[derive(Args)]
pub struct PushArgs {
    /// JSON array of `{ "name": ..., "deps": [...] }` objects
    pub file: PathBuf,
    #[arg(long, default_value = "127.0.0.1:18018")]
    pub peer: SocketAddr,
    /// Seconds to keep answering `getobject` requests before disconnecting
    #[arg(long, default_value = "6")]
    pub linger: u64,
}

#[derive(Args)]
pub struct IdArgs {
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn push_defaults() {
        let cli = Cli::parse_from(["objnet", "push", "objects.json"]);
        match cli.command {
            Command::Push(args) => {
                assert_eq!(args.peer, "127.0.0.1:18018".parse::<SocketAddr>().unwrap());
                assert_eq!(args.linger, 6);
            }
            _ => panic!("expected push"),
        }
    }

    #[test]
    fn serve_overrides() {
        let cli = Cli::parse_from(["objnet", "-v", "serve", "--bind", "127.0.0.1:9999", "--db", "data"]);
        assert!(cli.verbose);
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.bind, Some("127.0.0.1:9999".parse().unwrap()));
                assert_eq!(args.db, Some(PathBuf::from("data")));
                assert!(args.config.is_none());
            }
            _ => panic!("expected serve"),
        }
    }
}
