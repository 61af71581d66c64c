use clap::{Parser as ClapParser, Subcommand};
use jsonsift::cli::{self, CliError, PatchOptions, SelectOptions, SelectResult};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "sift")]
#[command(about = "sift - JSONPath selection and JSON Merge Patch from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a JSONPath query
    Select {
        /// The JSONPath query, e.g. '$..book[?(@.price < 10)].title'
        query: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Print normalized paths instead of values
        #[arg(long)]
        paths: bool,

        /// Print path/value pairs
        #[arg(long, conflicts_with = "paths")]
        nodes: bool,

        /// Drop results with a path already printed
        #[arg(long)]
        no_dups: bool,

        /// Order results by path
        #[arg(long)]
        sort: bool,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Apply a JSON Merge Patch (RFC 7396)
    Patch {
        /// Document to patch (reads from stdin if not provided)
        #[arg(short, long)]
        target: Option<String>,

        /// The merge patch
        #[arg(long)]
        patch: String,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Select {
            query,
            input,
            paths,
            nodes,
            no_dups,
            sort,
            pretty,
            syntax_only,
        } => read_input(input).and_then(|input| {
            let options = SelectOptions {
                query,
                input,
                paths,
                nodes,
                no_dups,
                sort,
                syntax_only,
            };
            run_select(&options, pretty)
        }),
        Commands::Patch {
            target,
            patch,
            pretty,
        } => read_input(target).and_then(|target| {
            let options = PatchOptions { target, patch };
            cli::execute_patch(&options).and_then(|output| print_json(&output, pretty))
        }),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

/// The argument if given, else stdin when it is not a terminal.
fn read_input(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn run_select(options: &SelectOptions, pretty: bool) -> Result<(), CliError> {
    match cli::execute_select(options)? {
        SelectResult::SyntaxValid => println!("Syntax is valid"),
        SelectResult::Success(output) => print_json(&output, pretty)?,
    }
    Ok(())
}

fn print_json(output: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(output)
    } else {
        serde_json::to_string(output)
    }?;
    println!("{}", json);
    Ok(())
}
