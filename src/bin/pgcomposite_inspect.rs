//! Fetches one composite value and prints how its binary form decodes.
//!
//! The query runs twice: once in text format for reference, once in binary
//! format for decoding. Exits with status 1 on any error.

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pgcomposite::report::{render_json, render_text, write_stdout};
use pgcomposite::source::PgSource;
use pgcomposite::CompositeDecoder;
use tracing_subscriber::EnvFilter;

/// Output format of the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// CLI options.
#[derive(Parser, Debug)]
#[command(name = "pgcomposite-inspect", version)]
struct Args {
    /// Connection string, e.g. `user=user password=password host=127.0.0.1 port=5432 dbname=name`
    #[arg(long, env = "PGCOMPOSITE_DSN")]
    dsn: String,

    /// Query returning one composite value, e.g. `select '(42,foo)'::type_name`
    #[arg(long, env = "PGCOMPOSITE_SQL")]
    sql: String,

    /// Report format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Skip fetching the text form of the value.
    #[arg(long)]
    skip_text: bool,

    /// Maximum nesting of record fields.
    #[arg(long, default_value_t = pgcomposite::DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pgcomposite=info,warn")),
        )
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let source = PgSource::connect(&args.dsn)
        .await
        .context("failed to connect")?;

    let text = if args.skip_text {
        None
    } else {
        source
            .fetch_composite_text(&args.sql)
            .await
            .context("text query failed")?
    };

    let payload = source
        .fetch_composite_binary(&args.sql, &[])
        .await
        .context("binary query failed")?
        .context("query returned a NULL composite")?;

    source.close().await;

    let decoder = CompositeDecoder::builder().max_depth(args.max_depth).build();
    let out = match args.format {
        Format::Text => render_text(&decoder, text.as_deref(), &payload),
        Format::Json => render_json(&decoder, text.as_deref(), &payload),
    }
    .context("failed to decode composite")?;

    write_stdout(&out)?;
    Ok(())
}
