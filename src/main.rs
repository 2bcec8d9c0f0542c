use clap::{ArgAction, Parser, Subcommand};
use sheet_export::cli::{self, ConnectionArgs, PlanFormat, Selection};
use sheet_export::config::ExportSettings;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheet-export")]
#[command(about = "Export spreadsheet ranges to MySQL tables")]
#[command(long_about = "Sheet Export - spreadsheet ranges to MySQL tables

Reads a range of an Excel workbook, proposes a MySQL table for it and
creates that table with the range's data.

COMMANDS:
  sheets   - List worksheets and their used ranges
  types    - List the MySQL data types a column can be given
  propose  - Print the proposed table as an editable export plan
  sql      - Print the CREATE TABLE and INSERT statements
  check    - Validate the proposal (exit code 1 on blocking errors)
  preview  - Write a colored .xlsx preview of the proposal
  export   - Create the table and insert the rows

WORKFLOW:
  1. sheet-export propose orders.xlsx -s Orders -o orders.plan.yaml
  2. Edit the plan: rename columns, change types, exclude columns
  3. sheet-export check orders.xlsx -p orders.plan.yaml
  4. sheet-export export orders.xlsx -p orders.plan.yaml --schema sales

SETTINGS:
  --config settings.yaml sets the defaults used for new proposals
  (use_formatted_values, detect_data_types, auto_index_int_columns,
  auto_allow_empty_non_index_columns, rows_per_insert, default_schema).

Logging goes to stderr. Use -v / -vv or RUST_LOG to see more.")]
#[command(version)]
struct Cli {
    /// Settings file (YAML)
    #[arg(long, global = true, env = "SHEET_EXPORT_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List worksheets and their used ranges
    Sheets {
        /// Workbook to read
        file: PathBuf,
    },

    /// List the MySQL data types a column can be given
    Types,

    #[command(long_about = "Print the proposed table as an export plan.

The plan lists the table name, the primary key and every column of the
range with its name, data type and flags. Edit it and pass it back with
--plan to any other command.

PRIMARY KEY:
  primary_key:
    synthetic: orders_id      # add an AUTO_INCREMENT column
  or
  primary_key:
    columns: [Id]             # use existing columns

EXAMPLES:
  sheet-export propose orders.xlsx                       # YAML to stdout
  sheet-export propose orders.xlsx -r B2:F40 -o plan.yaml
  sheet-export propose orders.xlsx --format json")]
    /// Print the proposed table as an export plan
    Propose {
        #[command(flatten)]
        selection: Selection,

        /// Plan format
        #[arg(long, value_enum, default_value_t = PlanFormat::Yaml)]
        format: PlanFormat,

        /// Write the plan to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the CREATE TABLE and INSERT statements
    Sql {
        #[command(flatten)]
        selection: Selection,

        /// Qualify the table with this schema
        #[arg(long)]
        schema: Option<String>,

        /// Write the statements to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    #[command(long_about = "Validate the proposal.

Lists every error and warning. Errors block the export (empty or duplicate
names, no primary key, empty values in a key column, duplicate values in a
unique column); warnings do not.

Exits with status 1 when any error is found.")]
    /// Validate the proposal
    Check {
        #[command(flatten)]
        selection: Selection,
    },

    /// Write a colored .xlsx preview of the proposal
    Preview {
        #[command(flatten)]
        selection: Selection,

        /// Output workbook (.xlsx)
        #[arg(short, long)]
        output: PathBuf,
    },

    #[command(long_about = "Create the table and insert the rows.

Runs CREATE TABLE, then INSERT statements of rows_per_insert rows each.
Nothing is rolled back: when an INSERT fails the table and the rows
inserted so far stay in place, and the error says how many rows made it.

CONNECTION:
  --host, --port, --user, --password and --schema, or the environment
  variables SHEET_EXPORT_HOST, SHEET_EXPORT_PORT, SHEET_EXPORT_USER,
  SHEET_EXPORT_PASSWORD and SHEET_EXPORT_SCHEMA.

EXAMPLES:
  sheet-export export orders.xlsx --schema sales
  sheet-export export orders.xlsx -p plan.yaml --schema sales --yes
  sheet-export export orders.xlsx --schema sales --rename-if-exists")]
    /// Create the table and insert the rows
    Export {
        #[command(flatten)]
        selection: Selection,

        #[command(flatten)]
        connection: ConnectionArgs,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Use name_2, name_3, ... when the table already exists
        #[arg(long)]
        rename_if_exists: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "sheet_export=warn",
        1 => "sheet_export=debug",
        _ => "sheet_export=trace,sqlx=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = ExportSettings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Sheets { file } => cli::sheets(file, &settings)?,

        Commands::Types => cli::types()?,

        Commands::Propose {
            selection,
            format,
            output,
        } => cli::propose(selection, format, output, &settings)?,

        Commands::Sql {
            selection,
            schema,
            output,
        } => cli::sql(selection, schema, output, &settings)?,

        Commands::Check { selection } => cli::check(selection, &settings)?,

        Commands::Preview { selection, output } => cli::preview(selection, output, &settings)?,

        Commands::Export {
            selection,
            connection,
            yes,
            rename_if_exists,
        } => cli::export(selection, connection, yes, rename_if_exists, &settings)?,
    }
    Ok(())
}
