use std::path::PathBuf;

use anyhow::{bail, Result};

/// Command-line overrides layered on top of the environment configuration.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub mapping: Option<PathBuf>,
    pub master: Option<String>,
    pub login: Option<String>,
    pub help: bool,
}

/// Parse `boardsync` arguments.
///
/// Supported forms:
///   boardsync
///   boardsync --mapping state/mapping.json
///   boardsync --master "Portfolio Overview" --login octocat
pub fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut i = 0;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => parsed.help = true,
            "--mapping" => {
                i += 1;
                match args.get(i) {
                    Some(value) => parsed.mapping = Some(PathBuf::from(value)),
                    None => bail!("Missing value for --mapping"),
                }
            }
            "--master" => {
                i += 1;
                match args.get(i) {
                    Some(value) => parsed.master = Some(value.clone()),
                    None => bail!("Missing value for --master"),
                }
            }
            "--login" => {
                i += 1;
                match args.get(i) {
                    Some(value) => parsed.login = Some(value.clone()),
                    None => bail!("Missing value for --login"),
                }
            }
            other => bail!("Unknown argument: {other}\n\nRun `boardsync --help` for usage."),
        }
        i += 1;
    }

    Ok(parsed)
}

pub fn print_help() {
    println!("boardsync — mirror your repositories onto a master project board\n");
    println!("USAGE:");
    println!("  boardsync [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --mapping <path>   Mapping file location (default: repo_project_mapping.json)");
    println!("  --master <title>   Master board title (default: Master Project)");
    println!("  --login <login>    Account to reconcile (default: the token's account)");
    println!("  -h, --help         Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("  GITHUB_TOKEN       Bearer token with the `project` scope (required)");
    println!("  GITHUB_LOGIN       Same as --login");
}
