//! gendb - A small parameterized SQL query builder.

use gendb::cli::Cli;
use gendb::config::Config;
use gendb::db::SqlxConnector;
use gendb::error::Result;
use gendb::logging::{LogOutput, LogSettings};
use gendb::query::QueryBuilder;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_args();

    let output = if cli.verbose {
        LogOutput::Both
    } else {
        LogOutput::File
    };
    let _guard = LogSettings::from_env().with_output(output).init();

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        eprintln!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let environment = cli.resolve_environment(&config)?;
    let mut builder = QueryBuilder::new(environment)
        .with_settings(cli.settings(&config))
        .with_sql(&cli.sql)?
        .with_vars(cli.parsed_vars());

    for (field, operator, value) in cli.parsed_conditions()? {
        builder.add_conditional(&field, &operator, value)?;
    }

    builder.execute(&SqlxConnector::new()).await?;
    let mut result = builder.into_result();

    let mapping = cli.rename_mapping()?;
    if !mapping.is_empty() {
        result.rename_fields(&mapping);
    }

    let mut exported = false;
    if let Some(path) = &cli.csv {
        let written = result.export_csv(path, &cli.select)?;
        println!("Wrote {} rows to {}", result.len(), written.display());
        exported = true;
    }
    if let Some(path) = &cli.json {
        let written = result.export_json(path, &cli.select)?;
        println!("Wrote {} rows to {}", result.len(), written.display());
        exported = true;
    }

    if !exported {
        if !cli.select.is_empty() {
            result = result.select_fields(&cli.select);
        }
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| gendb::GenDbError::export(format!("Failed to encode rows: {e}")))?;
        println!("{json}");
    }

    Ok(())
}
