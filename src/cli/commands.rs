use crate::cli::{ConnectionArgs, PlanFormat, Selection};
use crate::config::ExportSettings;
use crate::db::{
    outcome_after_close, ConnectionDescriptor, DbSchema, ExportOptions, Exporter, MySqlExecutor,
};
use crate::error::{ExportError, ExportResult};
use crate::excel::{PreviewWriter, RangeAddress, WorkbookReader};
use crate::schema::{ExportPlan, TableProposal, ValidationIssue, CATALOG};
use crate::sql::SqlGenerator;
use colored::Colorize;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads the selected range and applies the plan, if any
fn load_proposal(selection: &Selection, settings: &ExportSettings) -> ExportResult<TableProposal> {
    let plan = selection
        .plan
        .as_deref()
        .map(ExportPlan::load)
        .transpose()?;

    let sheet = selection
        .sheet
        .clone()
        .or_else(|| plan.as_ref().and_then(|p| p.sheet.clone()));
    let range = selection
        .range
        .clone()
        .or_else(|| plan.as_ref().and_then(|p| p.range.clone()))
        .map(|r| r.parse::<RangeAddress>())
        .transpose()?;

    let mut reader = WorkbookReader::open(&selection.file, settings.use_formatted_values)?;
    let grid = reader.read_range(sheet.as_deref(), range.as_ref())?;
    let mut proposal = TableProposal::from_grid(grid, settings)?;

    if selection.no_headers {
        proposal.set_first_row_is_headers(false);
    }
    if let Some(plan) = &plan {
        plan.apply(&mut proposal)?;
    }
    debug!(table = proposal.name(), "proposal ready");
    Ok(proposal)
}

fn print_proposal(proposal: &TableProposal) {
    let grid = proposal.grid();
    println!(
        "   Range: {}!{} ({} data rows)",
        grid.sheet_name,
        grid.address(),
        proposal.row_count()
    );
    let name = if proposal.name().is_empty() {
        "(empty)".red().to_string()
    } else {
        proposal.name().bright_blue().bold().to_string()
    };
    println!("   Table: {}", name);

    if proposal.add_primary_key() {
        println!(
            "   🔑 {} {}",
            proposal.synthetic_key().name.cyan(),
            "INTEGER AUTO_INCREMENT (added)".dimmed()
        );
    }
    for column in proposal.data_columns() {
        let mut flags = Vec::new();
        if column.primary_key && !proposal.add_primary_key() {
            flags.push("key");
        }
        if column.unique {
            flags.push("unique");
        }
        if column.create_index {
            flags.push("index");
        }
        if column.allow_null {
            flags.push("null");
        }
        let line = format!(
            "{} {} {}",
            column.name,
            column.data_type,
            if flags.is_empty() {
                String::new()
            } else {
                format!("[{}]", flags.join(", "))
            }
        );
        if column.exclude {
            println!("   ⏭️  {}", format!("{} (excluded)", line).dimmed());
        } else if column.primary_key && !proposal.add_primary_key() {
            println!("   🔑 {}", line.cyan());
        } else {
            println!("   📋 {}", line);
        }
    }
    if !proposal.add_primary_key() {
        println!(
            "   {}",
            format!("Key candidates: {}", proposal.primary_key_candidates().join(", ")).dimmed()
        );
    }
    println!();
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        if issue.blocking {
            println!("   {}", format!("❌ {}", issue).red());
        } else {
            println!("   {}", format!("⚠️  {}", issue).yellow());
        }
    }
}

fn write_output(path: &Path, content: &str) -> ExportResult<()> {
    fs::write(path, content)?;
    println!("{}", format!("✅ Written to {}", path.display()).bold().green());
    Ok(())
}

/// Execute the sheets command
pub fn sheets(file: PathBuf, settings: &ExportSettings) -> ExportResult<()> {
    println!("{}", "📗 Worksheets".bold().green());
    println!("   File: {}\n", file.display());

    let mut reader = WorkbookReader::open(&file, settings.use_formatted_values)?;
    for sheet in reader.sheets()? {
        match sheet.used_range {
            Some(range) => println!(
                "   📄 {} {} ({} x {})",
                sheet.name.bright_blue().bold(),
                range.to_string().cyan(),
                range.height(),
                range.width()
            ),
            None => println!("   📄 {} {}", sheet.name.bright_blue().bold(), "(empty)".dimmed()),
        }
    }
    Ok(())
}

/// Execute the types command
pub fn types() -> ExportResult<()> {
    println!("{}", "📚 MySQL data types".bold().green());
    for (kind, description) in CATALOG {
        let label = kind.to_string();
        let text = description
            .strip_prefix(label.as_str())
            .map(|rest| rest.trim_start_matches(" - "))
            .unwrap_or(*description);
        println!("   {:<16} {}", label.cyan(), text);
    }
    println!();
    println!(
        "   {}",
        "Any Varchar(n) up to 65535 and Decimal(p, s) up to (65, 30) are accepted too".dimmed()
    );
    Ok(())
}

/// Execute the propose command.
///
/// Without an output file the plan goes to stdout so it can be redirected.
pub fn propose(
    selection: Selection,
    format: PlanFormat,
    output: Option<PathBuf>,
    settings: &ExportSettings,
) -> ExportResult<()> {
    let proposal = load_proposal(&selection, settings)?;
    let plan = ExportPlan::from_proposal(&proposal);
    let content = match format {
        PlanFormat::Yaml => plan.to_yaml()?,
        PlanFormat::Json => plan.to_json()?,
    };

    match output {
        Some(path) => {
            println!("{}", "🧭 Proposed table".bold().green());
            println!("   File: {}", selection.file.display());
            print_proposal(&proposal);
            print_issues(&proposal.validate());
            write_output(&path, &content)
        }
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Execute the sql command
pub fn sql(
    selection: Selection,
    schema: Option<String>,
    output: Option<PathBuf>,
    settings: &ExportSettings,
) -> ExportResult<()> {
    let proposal = load_proposal(&selection, settings)?;
    let schema = schema.or_else(|| settings.default_schema.clone());
    let generator = SqlGenerator::new(&proposal)
        .with_schema(schema.as_deref())
        .with_rows_per_insert(settings.rows_per_insert);
    let text = generator.copy_sql();

    if !proposal.is_exportable() {
        eprintln!(
            "{}",
            "⚠️  The proposal has blocking issues, run 'check' for details".yellow()
        );
    }

    match output {
        Some(path) => write_output(&path, &format!("{}\n", text)),
        None => {
            println!("{}", text);
            Ok(())
        }
    }
}

/// Execute the check command. Fails when any issue blocks the export.
pub fn check(selection: Selection, settings: &ExportSettings) -> ExportResult<()> {
    println!("{}", "✅ Checking proposal".bold().green());
    println!("   File: {}", selection.file.display());

    let proposal = load_proposal(&selection, settings)?;
    print_proposal(&proposal);

    let issues = proposal.validate();
    if issues.is_empty() {
        println!("{}", "✅ Ready to export".bold().green());
        return Ok(());
    }
    print_issues(&issues);
    println!();

    let blocking: Vec<ValidationIssue> = issues.into_iter().filter(|i| i.blocking).collect();
    if blocking.is_empty() {
        println!("{}", "✅ Ready to export (with warnings)".bold().green());
        Ok(())
    } else {
        println!(
            "{}",
            format!("❌ {} blocking issue(s)", blocking.len()).bold().red()
        );
        Err(ExportError::Validation(blocking))
    }
}

/// Execute the preview command
pub fn preview(selection: Selection, output: PathBuf, settings: &ExportSettings) -> ExportResult<()> {
    println!("{}", "🎨 Writing preview".bold().green());
    println!("   File: {}", selection.file.display());

    let proposal = load_proposal(&selection, settings)?;
    print_proposal(&proposal);

    let report = PreviewWriter::new(&proposal).write(&output)?;
    println!(
        "{}",
        format!(
            "✅ Preview of {} rows written to {} (sheet '{}')",
            report.rows,
            output.display(),
            report.data_sheet
        )
        .bold()
        .green()
    );
    println!("   Protection key: {}", report.protection_key.dimmed());
    Ok(())
}

fn confirm(prompt: &str) -> ExportResult<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Execute the export command
pub fn export(
    selection: Selection,
    connection: ConnectionArgs,
    yes: bool,
    rename_if_exists: bool,
    settings: &ExportSettings,
) -> ExportResult<()> {
    println!("{}", "🐬 Exporting to MySQL".bold().green());
    println!("   File: {}", selection.file.display());

    let mut proposal = load_proposal(&selection, settings)?;
    print_proposal(&proposal);

    let schema_name = connection
        .schema
        .clone()
        .or_else(|| settings.default_schema.clone())
        .ok_or_else(|| {
            ExportError::Config("no schema given (use --schema or default_schema)".to_string())
        })?;
    let descriptor = ConnectionDescriptor::new(connection.host, connection.port, connection.user)
        .with_password(connection.password);
    let schema = DbSchema::new(descriptor, schema_name);

    let issues = proposal.validate();
    print_issues(&issues);
    if issues.iter().any(|i| i.blocking) {
        return Err(ExportError::Validation(
            issues.into_iter().filter(|i| i.blocking).collect(),
        ));
    }

    if !yes
        && !confirm(&format!(
            "Create {} and insert {} rows?",
            schema.qualify(proposal.name()),
            proposal.row_count()
        ))?
    {
        println!("{}", "⏹️  Export cancelled".yellow());
        return Ok(());
    }

    let options = ExportOptions {
        rows_per_insert: settings.rows_per_insert,
        rename_if_exists,
    };
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(async {
        let mut executor = MySqlExecutor::connect(&schema.connection, Some(schema.name.as_str())).await?;
        let result = Exporter::new(&mut executor, &schema, options)
            .export(&mut proposal)
            .await;
        let closed = executor.close().await;
        outcome_after_close(result, closed)
    })?;

    println!(
        "{}",
        format!(
            "✅ Created {} with {} rows ({} INSERT statements)",
            schema.qualify(&report.table),
            report.rows_inserted,
            report.insert_statements
        )
        .bold()
        .green()
    );
    Ok(())
}
