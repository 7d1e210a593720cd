use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "camli",
    about = "Content-addressed blob server and upload client",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the blob server daemon
    Serve(ServeArgs),
    /// Upload files as blobs, skipping those the server already has
    Upload(UploadArgs),
    /// Print the blob reference of each file
    Blobref(BlobrefArgs),
    /// Verify every blob in a storage root without modifying it
    Fsck(FsckArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// host:port to listen on
    #[arg(long, env = "CAMLI_LISTEN")]
    pub listen: Option<SocketAddr>,
    /// Root directory to store blobs in
    #[arg(long, env = "CAMLI_ROOT")]
    pub root: Option<PathBuf>,
    /// Shared secret clients must send as their Basic auth password
    #[arg(long, env = "CAMLI_PASSWORD", hide_env_values = true)]
    pub password: String,
    /// Answer preupload requests without credentials
    #[arg(long)]
    pub allow_anonymous_preupload: bool,
    /// Show a descriptive root page instead of the stealth one
    #[arg(long)]
    pub no_stealth: bool,
}

#[derive(Args)]
pub struct UploadArgs {
    /// Server base URL
    #[arg(long, env = "CAMLI_SERVER", default_value = "http://localhost:3179")]
    pub server: String,
    #[arg(long, default_value = "")]
    pub user: String,
    #[arg(long, env = "CAMLI_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct BlobrefArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args)]
pub struct FsckArgs {
    /// Storage root to check
    #[arg(long, env = "CAMLI_ROOT", default_value = "/tmp/camliroot")]
    pub root: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from([
            "camli",
            "serve",
            "--listen",
            "127.0.0.1:8080",
            "--root",
            "/srv/blobs",
            "--password",
            "pw",
        ])
        .unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.listen, Some("127.0.0.1:8080".parse().unwrap()));
            assert_eq!(args.root, Some(PathBuf::from("/srv/blobs")));
            assert_eq!(args.password, "pw");
            assert!(!args.allow_anonymous_preupload);
            assert!(!args.no_stealth);
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_rejects_bad_listen() {
        assert!(Cli::try_parse_from([
            "camli", "serve", "--listen", "nowhere", "--password", "pw"
        ])
        .is_err());
    }

    #[test]
    fn parse_upload() {
        let cli = Cli::try_parse_from([
            "camli",
            "upload",
            "--server",
            "http://blobs:3179/",
            "--password",
            "pw",
            "a.txt",
            "b.txt",
        ])
        .unwrap();
        if let Command::Upload(args) = cli.command {
            assert_eq!(args.server, "http://blobs:3179/");
            assert_eq!(args.user, "");
            assert_eq!(args.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_blobref_requires_files() {
        assert!(Cli::try_parse_from(["camli", "blobref"]).is_err());
        let cli = Cli::try_parse_from(["camli", "blobref", "x"]).unwrap();
        assert!(matches!(cli.command, Command::Blobref(_)));
    }

    #[test]
    fn parse_fsck() {
        let cli = Cli::try_parse_from(["camli", "fsck", "--root", "/data"]).unwrap();
        if let Command::Fsck(args) = cli.command {
            assert_eq!(args.root, PathBuf::from("/data"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::try_parse_from(["camli", "--verbose", "blobref", "x"]).unwrap();
        assert!(cli.verbose);
    }
}
