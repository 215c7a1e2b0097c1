use std::fs;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use argdoc_parser::{ArgumentParser, ParseFlags};

#[derive(Debug, Parser)]
#[command(name = "argdoc")]
#[command(about = "Parse command lines against a usage document")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind an argv to names and print the result as JSON.
    Parse(ParseArgs),
    /// Classify each argv slot as valid or invalid.
    Validate(ValidateArgs),
    /// Print completion candidates for a partial command line.
    Suggest(SuggestArgs),
    /// Print the description of one option.
    Describe(DescribeArgs),
    /// List the program names of the usage patterns.
    Commands(DocArgs),
    /// List every variable the document mentions.
    Variables(DocArgs),
}

#[derive(Debug, Args)]
struct DocArgs {
    /// Path to the usage document.
    #[arg(long)]
    doc: PathBuf,
}

#[derive(Debug, Args)]
struct ParseArgs {
    #[command(flatten)]
    doc: DocArgs,
    /// Resolve unambiguous long-option prefixes.
    #[arg(long)]
    prefix_match: bool,
    /// Require argv separators to match the declared ones.
    #[arg(long)]
    strict_separators: bool,
    /// Emit empty entries and defaults for every known name.
    #[arg(long)]
    empty_args: bool,
    /// The argv to parse, program name first.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    argv: Vec<String>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[command(flatten)]
    doc: DocArgs,
    #[arg(long)]
    prefix_match: bool,
    /// The argv to classify, program name first.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    argv: Vec<String>,
}

#[derive(Debug, Args)]
struct SuggestArgs {
    #[command(flatten)]
    doc: DocArgs,
    /// Accept partial command lines while matching.
    #[arg(long)]
    incomplete: bool,
    /// The partial argv, program name first.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    argv: Vec<String>,
}

#[derive(Debug, Args)]
struct DescribeArgs {
    #[command(flatten)]
    doc: DocArgs,
    /// The option to look up, e.g. `-v` or `--verbose`.
    #[arg(allow_hyphen_values = true)]
    option: String,
}

fn load_parser(doc: &DocArgs) -> Result<ArgumentParser, String> {
    let text = fs::read_to_string(&doc.doc)
        .map_err(|err| format!("cannot read {}: {err}", doc.doc.display()))?;
    ArgumentParser::new(text).map_err(|err| {
        let mut message = err.to_string();
        for diagnostic in err.diagnostics() {
            message.push_str(&format!("\n  {diagnostic}"));
        }
        message
    })
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let parser = load_parser(&args.doc)?;
    let mut flags = ParseFlags::default();
    if args.prefix_match {
        flags = flags.with_prefix_matching();
    }
    if args.strict_separators {
        flags = flags.with_strict_separators();
    }
    if args.empty_args {
        flags = flags.with_empty_args();
    }
    let outcome = parser.parse_arguments(&args.argv, flags);
    let rendered =
        serde_json::to_string_pretty(&outcome).map_err(|err| format!("serialization: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let parser = load_parser(&args.doc)?;
    let mut flags = ParseFlags::default();
    if args.prefix_match {
        flags = flags.with_prefix_matching();
    }
    let statuses = parser.validate_arguments(&args.argv, flags);
    let rendered =
        serde_json::to_string(&statuses).map_err(|err| format!("serialization: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn run_suggest(args: SuggestArgs) -> Result<(), String> {
    let parser = load_parser(&args.doc)?;
    let mut flags = ParseFlags::default();
    if args.incomplete {
        flags = flags.with_incomplete_matching();
    }
    let suggestions = parser.suggest_next_argument(&args.argv, flags);
    let rendered =
        serde_json::to_string(&suggestions).map_err(|err| format!("serialization: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn run_describe(args: DescribeArgs) -> Result<(), String> {
    let parser = load_parser(&args.doc)?;
    match parser.description_for_option(&args.option) {
        Some(description) => {
            println!("{description}");
            Ok(())
        }
        None => Err(format!("no description for {}", args.option)),
    }
}

fn run_commands(args: DocArgs) -> Result<(), String> {
    let parser = load_parser(&args)?;
    let rendered = serde_json::to_string(&parser.command_names())
        .map_err(|err| format!("serialization: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn run_variables(args: DocArgs) -> Result<(), String> {
    let parser = load_parser(&args)?;
    let rendered = serde_json::to_string(&parser.variables())
        .map_err(|err| format!("serialization: {err}"))?;
    println!("{rendered}");
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Validate(args) => run_validate(args),
        Command::Suggest(args) => run_suggest(args),
        Command::Describe(args) => run_describe(args),
        Command::Commands(args) => run_commands(args),
        Command::Variables(args) => run_variables(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
