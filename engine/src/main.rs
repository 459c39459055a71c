//! csvmelt CLI - load tagged CSV files into JSON records
//!
//! # Main Commands
//!
//! ```bash
//! csvmelt load input.csv --schema apple.json        # Load rows into records
//! csvmelt load input.csv -s apple.json -c load.json # ... with a load config
//! ```
//!
//! # Inspection Commands
//!
//! ```bash
//! csvmelt headers input.csv        # Header row with spreadsheet column ids
//! csvmelt separator input.csv      # Guess the separator
//! csvmelt column XFD               # Column id <-> number
//! csvmelt tags apple.json          # Show how each field tag is read
//! ```

use clap::{Parser, Subcommand};
use csvmelt::{
    column_id_to_number, column_number_to_id, guess_separator, load_file, read_headers,
    JsonSink, LoadConfig, RecordSink, SchemaDescriptor, DIRECTIVE_CACHE, LOG_BROADCASTER,
};
use serde_json::json;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable holding a default load config path.
const CONFIG_ENV: &str = "CSVMELT_CONFIG";

#[derive(Parser)]
#[command(name = "csvmelt")]
#[command(about = "Load CSV rows into records described by field tags", long_about = None)]
struct Cli {
    /// Only print results, no progress
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV file into JSON records
    Load {
        /// Input CSV file
        input: PathBuf,

        /// JSON schema descriptor of the records
        #[arg(short, long)]
        schema: PathBuf,

        /// JSON load config (default: $CSVMELT_CONFIG)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Exit with an error status when any row failed
        #[arg(long)]
        strict: bool,
    },

    /// Show the header row
    Headers {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Guess the separator of a CSV file
    Separator {
        /// Input CSV file
        input: PathBuf,
    },

    /// Convert a spreadsheet column id to its number, or back
    Column {
        /// Column id (e.g. AB) or number (e.g. 28)
        column: String,
    },

    /// Show the parsed tags of a schema descriptor
    Tags {
        /// JSON schema descriptor
        schema: PathBuf,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }

    let result = match cli.command {
        Commands::Load {
            input,
            schema,
            config,
            delimiter,
            output,
            strict,
        } => cmd_load(
            &input,
            &schema,
            config.as_deref(),
            delimiter,
            output.as_deref(),
            strict,
            cli.quiet,
        ),

        Commands::Headers { input, delimiter } => cmd_headers(&input, delimiter),

        Commands::Separator { input } => cmd_separator(&input),

        Commands::Column { column } => cmd_column(&column),

        Commands::Tags { schema } => cmd_tags(&schema),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Config from the flag, else from the environment, else defaults.
fn load_config(path: Option<&Path>) -> Result<LoadConfig, Box<dyn std::error::Error>> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(p) => Ok(LoadConfig::from_file(&p)?),
        None => Ok(LoadConfig::default()),
    }
}

fn delimiter_byte(delimiter: Option<char>) -> Result<Option<u8>, Box<dyn std::error::Error>> {
    Ok(delimiter.map(csvmelt::config::delimiter_byte).transpose()?)
}

fn cmd_load(
    input: &Path,
    schema_path: &Path,
    config_path: Option<&Path>,
    delimiter: Option<char>,
    output: Option<&Path>,
    strict: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !quiet {
        eprintln!("📄 Loading: {}", input.display());
    }

    let config = load_config(config_path)?;
    let schema = SchemaDescriptor::from_file(schema_path)?.to_schema();

    let report = load_file(input, delimiter_byte(delimiter)?, &schema, &config)?;
    let (records, errors) = report.into_parts();

    if let Some(errors) = &errors {
        eprintln!("⚠️  {}", errors);
    }

    let written = match output {
        Some(p) => {
            let mut sink = JsonSink::new(File::create(p)?);
            let written = sink.persist(records.as_slice())?;
            if !quiet {
                eprintln!("💾 Output written to: {}", p.display());
            }
            written
        }
        None => JsonSink::new(std::io::stdout().lock()).persist(records.as_slice())?,
    };

    if !quiet {
        eprintln!("✅ {} records", written);
    }

    match errors {
        Some(errors) if strict => Err(Box::new(errors)),
        _ => Ok(()),
    }
}

fn cmd_headers(input: &Path, delimiter: Option<char>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None)?;
    let mut file = File::open(input)?;
    let delimiter = match delimiter_byte(delimiter)? {
        Some(d) => d,
        None => guess_separator(&mut file, &config.separator_bytes()?, config.sniff_lines)?,
    };

    let headers = read_headers(&mut file, delimiter)?;
    let mut out = std::io::stdout().lock();
    for (i, header) in headers.iter().enumerate() {
        writeln!(out, "{}", header_line(i + 1, header))?;
    }
    Ok(())
}

/// One line of `csvmelt headers`; columns past the spreadsheet limit get a blank id.
fn header_line(number: usize, header: &str) -> String {
    let id = column_number_to_id(number as i64).unwrap_or_default();
    format!("{:>4}  {:<3}  {}", number, id, header)
}

fn cmd_separator(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(None)?;
    let mut file = File::open(input)?;
    let sep = guess_separator(&mut file, &config.separator_bytes()?, config.sniff_lines)?;
    println!("{}", csvmelt::parser::display_delimiter(sep));
    Ok(())
}

fn cmd_column(column: &str) -> Result<(), Box<dyn std::error::Error>> {
    match column.trim().parse::<i64>() {
        Ok(number) => println!("{}", column_number_to_id(number)?),
        Err(_) => println!("{}", column_id_to_number(column)?),
    }
    Ok(())
}

fn cmd_tags(schema_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(schema_path)?;
    let descriptor = SchemaDescriptor::from_json(&content)?;
    let schema = descriptor.to_schema();
    let directives = DIRECTIVE_CACHE.directives_for(&schema)?;

    let fields: Vec<_> = schema
        .fields()
        .iter()
        .zip(&directives)
        .map(|(field, directive)| {
            json!({
                "field": field.name,
                "type": field.field_type,
                "role": directive.role(),
                "directive": directive.as_ref(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}
