use clap::{Parser, Subcommand};

/// jrun - Run source files with embedded build directives
///
/// jrun turns a single source file (plus whatever it declares via `//TAG`
/// comment directives) into a resolved, runnable unit: dependencies,
/// included sources, remote references, and execution mode all come from
/// the file itself.
#[derive(Parser, Debug)]
#[command(name = "jrun")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run source files with embedded build directives", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Common configuration arguments shared across commands
#[derive(Parser, Debug, Clone)]
pub struct CommonConfigArgs {
    /// Config file path
    #[arg(short = 'c', long, env = "JRUN_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, build and run a source reference
    Run(RunArgs),

    /// Resolve and build without running
    Build(BuildArgs),

    /// Print the resolved view of a reference as JSON
    Info(InfoArgs),

    /// Manage trusted remote source prefixes
    Trust(TrustArgs),

    /// Manage the content cache
    Cache(CacheArgs),
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: CommonConfigArgs,

    /// File path, URL, or jar to run
    pub reference: String,

    /// Start an interactive shell session over the sources
    #[arg(short = 'i', long)]
    pub interactive: bool,

    /// Force shell execution even for compilable sources
    #[arg(long, conflicts_with = "force_jar")]
    pub jsh: bool,

    /// Force jar execution for compilable sources (not usable with `.jsh` scripts)
    #[arg(long = "jar", conflicts_with = "jsh")]
    pub force_jar: bool,

    /// Property value for `${name}` placeholders (key=value, repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Extra dependency coordinates, in addition to declared ones
    #[arg(long, value_delimiter = ',')]
    pub deps: Vec<String>,

    /// Extra repositories, in addition to declared ones
    #[arg(long, value_delimiter = ',')]
    pub repos: Vec<String>,

    /// Extra JVM runtime options
    #[arg(long = "java-options", value_name = "OPTION")]
    pub java_options: Vec<String>,

    /// Only print the command line instead of executing it
    #[arg(long)]
    pub dry_run: bool,

    /// Arguments passed through to the program (after `--`)
    #[arg(last = true)]
    pub args: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub config: CommonConfigArgs,

    /// File path, URL, or jar to build
    pub reference: String,

    /// Property value for `${name}` placeholders (key=value, repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub config: CommonConfigArgs,

    /// File path, URL, or jar to inspect
    pub reference: String,

    /// Also resolve and include the classpath (may touch the network)
    #[arg(long)]
    pub classpath: bool,

    /// Property value for `${name}` placeholders (key=value, repeatable)
    #[arg(short = 'D', value_name = "KEY=VALUE")]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct TrustArgs {
    #[command(subcommand)]
    pub command: TrustCommands,
}

#[derive(Subcommand, Debug)]
pub enum TrustCommands {
    /// Allow remote sources under a URL prefix
    Add {
        /// URL prefix, e.g. https://github.com/acme/
        prefix: String,
    },

    /// Remove a previously trusted prefix
    Remove {
        /// Exact prefix to remove
        prefix: String,
    },

    /// List trusted prefixes
    List,
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(flatten)]
    pub config: CommonConfigArgs,

    #[command(subcommand)]
    pub command: CacheCommands,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Remove all cached remote content and built jars
    Clear,

    /// Print the cache directory path
    Path,

    /// Show cache entry counts and sizes
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_args_parse() {
        let cli = Cli::try_parse_from([
            "jrun", "run", "-D", "version=1.0", "--deps", "a:b:1,c:d:2", "Main.java", "--",
            "--app-flag",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.reference, "Main.java");
                assert_eq!(args.properties, ["version=1.0"]);
                assert_eq!(args.deps, ["a:b:1", "c:d:2"]);
                assert_eq!(args.args, ["--app-flag"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_forced_kinds_conflict() {
        assert!(Cli::try_parse_from(["jrun", "run", "--jsh", "--jar", "x.java"]).is_err());
    }

    #[test]
    fn test_trust_subcommands() {
        let cli = Cli::try_parse_from(["jrun", "trust", "add", "https://github.com/acme/"])
            .unwrap();
        match cli.command {
            Commands::Trust(TrustArgs {
                command: TrustCommands::Add { prefix },
            }) => assert_eq!(prefix, "https://github.com/acme/"),
            _ => panic!("expected trust add"),
        }
    }
}
