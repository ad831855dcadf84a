use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use imagechain::{Chain, LoadOpts, NodeRegistry, UnknownTypePolicy};

#[derive(Parser, Debug)]
#[command(name = "imagechain", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a chain representation and print its structure.
    Check(CheckArgs),
    /// Rewrite a chain representation as canonical pretty JSON.
    Fmt(FmtArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input chain JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Fail on node types the built-in registry does not know instead of loading placeholders.
    #[arg(long)]
    strict: bool,
}

#[derive(Parser, Debug)]
struct FmtArgs {
    /// Input chain JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Fmt(args) => cmd_fmt(args),
    }
}

fn load_chain(path: &PathBuf, unknown_types: UnknownTypePolicy) -> anyhow::Result<Chain> {
    let registry = NodeRegistry::with_builtins();
    let opts = LoadOpts { unknown_types };
    Chain::from_path(path, &registry, &opts)
        .with_context(|| format!("load chain '{}'", path.display()))
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let policy = if args.strict {
        UnknownTypePolicy::Reject
    } else {
        UnknownTypePolicy::Placeholder
    };
    let chain = load_chain(&args.in_path, policy)?;

    println!("chain '{}': {} item(s)", chain.name(), chain.len());
    for (i, type_name) in chain.type_names().iter().enumerate() {
        println!("  [{i}] {type_name}");
    }
    Ok(())
}

fn cmd_fmt(args: FmtArgs) -> anyhow::Result<()> {
    let chain = load_chain(&args.in_path, UnknownTypePolicy::Placeholder)?;
    let json = chain
        .to_json_pretty()
        .with_context(|| "serialize chain representation")?;

    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, format!("{json}\n"))
                .with_context(|| format!("write chain '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
