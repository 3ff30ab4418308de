use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::{Parser, Subcommand};
use symview_core::error::SymviewResult;
use symview_core::loader::load_units;
use symview_core::{Address, DebugSession, MemoryImage, SessionConfig, SymbolTable, SymviewError, TargetProfile};
use symview_utils::{debug, init_logging, LogLevel, LoggingConfig};

/// Inspect C variables of an embedded image by name, decoded from DWARF.
#[derive(Parser, Debug)]
#[command(name = "symview")]
#[command(version)]
#[command(about = "Inspect C variables of an embedded image by name, decoded from DWARF", long_about = None)]
struct Cli
{
    /// ELF image with debug info
    elf: PathBuf,

    /// Log level (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Cap on type-reference hops per symbol
    #[arg(long, global = true)]
    type_depth: Option<usize>,

    /// Nesting limit for structure member expansion
    #[arg(long, global = true)]
    member_depth: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// Print the value of a variable (`name` or `name.member.member`)
    Value
    {
        name: String,
        /// Raw memory dump to read values from instead of the image's initial data
        #[arg(long, requires = "dump_base")]
        dump: Option<PathBuf>,
        /// Target address of the first byte of the dump (hex with 0x, or decimal)
        #[arg(long, value_parser = parse_address, requires = "dump")]
        dump_base: Option<Address>,
        /// Render nested structures instead of `{...}`
        #[arg(long, default_value_t = false)]
        expand_nested: bool,
        /// One structure member per line
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the member layout of a structure variable
    Members
    {
        name: String,
    },
    /// Print the entry address of a function
    Address
    {
        function: String,
    },
}

fn main()
{
    let cli = Cli::parse();

    let logging = LoggingConfig::from_env().with_level(cli.log_level);
    let _guard = match init_logging(&logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(1);
        }
    };

    match run(cli) {
        Ok(output) => println!("{output}"),
        Err(e) if e.is_not_found() => {
            eprintln!("{e}");
            process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> SymviewResult<String>
{
    let bytes = fs::read(&cli.elf)?;
    let file = object::File::parse(&*bytes)?;
    let profile = TargetProfile::from_object(&file);
    debug!(elf = %cli.elf.display(), %profile, "loading image");

    let units = load_units(&file, profile)?;
    let symbols = SymbolTable::from_object(&file);

    let mut config = SessionConfig::from_env();
    if let Some(depth) = cli.type_depth {
        config = config.with_type_chain_depth(depth);
    }
    if let Some(depth) = cli.member_depth {
        config = config.with_member_depth(depth);
    }

    match cli.command {
        Commands::Value {
            name,
            dump,
            dump_base,
            expand_nested,
            pretty,
        } => {
            let memory = match (dump, dump_base) {
                (Some(path), Some(base)) => load_dump(&path, base)?,
                _ => MemoryImage::from_object(&file)?,
            };
            let config = if expand_nested {
                config.with_expand_nested(true)
            } else {
                config
            };
            let session = DebugSession::new(&units, profile, memory, symbols).with_config(config);
            if pretty {
                session.value_of_symbol_pretty(&name)
            } else {
                session.value_of_symbol(&name)
            }
        }
        Commands::Members { name } => {
            let session = DebugSession::new(&units, profile, MemoryImage::new(), symbols).with_config(config);
            session.member_table(&name).map(|table| table.trim_end().to_string())
        }
        Commands::Address { function } => {
            let session = DebugSession::new(&units, profile, MemoryImage::new(), symbols).with_config(config);
            session
                .function_address(&function)
                .map(|address| address.to_string())
                .ok_or(SymviewError::SymbolNotFound(function))
        }
    }
}

fn load_dump(path: &Path, base: Address) -> SymviewResult<MemoryImage>
{
    let bytes = fs::read(path)?;
    debug!(dump = %path.display(), %base, len = bytes.len(), "loaded memory dump");
    Ok(MemoryImage::new().with_segment(base.value(), bytes))
}

fn parse_address(text: &str) -> Result<Address, String>
{
    Address::parse(text).ok_or_else(|| format!("invalid address: {text} (use 0x-prefixed hex or decimal)"))
}
