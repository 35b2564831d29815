use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use clap::{Args, Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use ripple_ir::interp::Interpreter;
use ripple_lower::{LowerConfig, LowerOutput, Lowerer, PointerWidth};
use tracing::{debug, error, warn};

use ripple_driver::{
    bind_printing_hosts, load_program, load_source, parse_args, render_diagnostics,
};

#[derive(Parser)]
#[command(
    name = "ripple",
    version = "0.1.0",
    about = "Lowers TypeScript-flavoured statements onto a structured stack-machine IR"
)]
struct Cli {
    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Pointer width used to resolve `usize`
    #[arg(long, global = true, default_value = "32", value_parser = parse_pointer_width)]
    pointer_width: PointerWidth,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Program in its JSON encoding
    program: PathBuf,

    /// Source text the program's spans refer to
    #[arg(long)]
    source: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Lower a program and print the IR
    Lower {
        #[command(flatten)]
        input: Input,
    },

    /// Lower a program and run one of its functions
    Run {
        #[command(flatten)]
        input: Input,

        /// Function to call
        #[arg(long, default_value = "main")]
        entry: String,

        /// Argument for the entry function (repeatable)
        #[arg(long = "arg", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Execution step limit
        #[arg(long, default_value_t = 1_000_000)]
        fuel: u64,
    },

    /// Lower a program and report diagnostics only
    Check {
        #[command(flatten)]
        input: Input,
    },
}

fn parse_pointer_width(text: &str) -> Result<PointerWidth, String> {
    let bits: u32 = text.parse().map_err(|_| format!("`{}` is not a number", text))?;
    PointerWidth::try_from(bits)
        .map_err(|bits| format!("unsupported pointer width {}, expected 32 or 64", bits))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match execute(cli) {
        Ok(code) => code,
        Err(err) => {
            error!(?err, "command failed");
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let config = LowerConfig::default().with_pointer_width(cli.pointer_width);

    match cli.command {
        Commands::Lower { input } => lower_command(&input, config),
        Commands::Run {
            input,
            entry,
            args,
            fuel,
        } => run_command(&input, config, &entry, &args, fuel),
        Commands::Check { input } => check_command(&input, config),
    }
}

/// Lowers the input program and prints its diagnostics.
fn lower_input(input: &Input, config: LowerConfig) -> Result<LowerOutput> {
    let program = load_program(&input.program)?;
    let source = input.source.as_deref().map(load_source).transpose()?;

    let output = Lowerer::new(config)
        .lower_program(&program)
        .wrap_err_with(|| {
            format!("internal error while lowering {}", input.program.display())
        })?;
    debug!(diagnostics = output.diagnostics.len(), "lowered");

    let filename = display_name(input);
    render_diagnostics(&output.diagnostics, &filename, source.as_deref())
        .wrap_err("failed to write diagnostics")?;
    Ok(output)
}

fn display_name(input: &Input) -> String {
    let path: &Path = input.source.as_deref().unwrap_or(&input.program);
    path.to_string_lossy().to_string()
}

fn lower_command(input: &Input, config: LowerConfig) -> Result<ExitCode> {
    let output = lower_input(input, config)?;
    print!("{}", output.module);
    Ok(exit_code(&output))
}

fn run_command(
    input: &Input,
    config: LowerConfig,
    entry: &str,
    args: &[String],
    fuel: u64,
) -> Result<ExitCode> {
    let output = lower_input(input, config)?;
    if !output.diagnostics.is_empty() {
        warn!(diagnostics = output.diagnostics.len(), "not running a program with errors");
        return Ok(ExitCode::FAILURE);
    }

    let module = &output.module;
    let func = module
        .find_function(entry)
        .ok_or_else(|| eyre!("no function named `{}`", entry))?;
    let args = parse_args(func, args)?;

    let mut interp = Interpreter::new(module).with_fuel(fuel);
    let stdout = Rc::new(RefCell::new(io::stdout()));
    bind_printing_hosts(&mut interp, module, stdout)?;

    let result = interp
        .invoke(entry, &args)
        .wrap_err_with(|| format!("`{}` trapped", entry))?;
    if let Some(value) = result {
        println!("{}", value);
    }
    Ok(ExitCode::SUCCESS)
}

fn check_command(input: &Input, config: LowerConfig) -> Result<ExitCode> {
    let output = lower_input(input, config)?;
    if output.diagnostics.is_empty() {
        println!("{}: ok", input.program.display());
    } else {
        println!(
            "{}: {} error(s)",
            input.program.display(),
            output.diagnostics.len()
        );
    }
    Ok(exit_code(&output))
}

fn exit_code(output: &LowerOutput) -> ExitCode {
    if output.diagnostics.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
