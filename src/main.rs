use anyhow::{bail, Context};
use clap::Parser;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use sigsearch::cli::{self, Command};
use sigsearch::factory::{AppFactory, LocalApp};
use sigsearch::model::{DocumentInput, ImageInput, ImageQuery, Metadata, VectorQuery};
use sigsearch::parse_vector;

fn parse_metadata(metadata: Option<String>) -> anyhow::Result<Metadata> {
    match metadata {
        None => Ok(Metadata::new()),
        Some(raw) => serde_json::from_str(&raw).context("metadata must be a JSON object"),
    }
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(tracing::Level::INFO).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(app: LocalApp, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Index { content, metadata } => {
            let input = DocumentInput::new(content).with_metadata(parse_metadata(metadata)?);
            let doc = app.service.index_text(input).await?;
            app.persist()?;
            print_json(&doc)
        }

        Command::Search {
            text,
            limit,
            filter,
        } => {
            let limit = limit.unwrap_or(app.config.default_search_limit);
            let filter = filter.map(|f| parse_metadata(Some(f))).transpose()?;
            let docs = app
                .service
                .search_by_text_filtered(&text, limit, filter)
                .await?;
            print_json(&docs)
        }

        Command::IndexImage {
            file,
            description,
            metadata,
        } => {
            let image_data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let input = ImageInput {
                description,
                image_data,
                metadata: parse_metadata(metadata)?,
            };
            let image = app.service.index_image(input).await?;
            app.persist()?;
            print_json(&image)
        }

        Command::SearchImage {
            file,
            description,
            limit,
        } => {
            let image_data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let query = ImageQuery {
                image_data,
                description,
                limit,
            };
            let images = app.service.search_images(query).await?;
            print_json(&images)
        }

        Command::SearchVector {
            vector,
            limit,
            candidates,
        } => {
            let query_vector = match parse_vector(&vector) {
                Ok(v) => v,
                Err(e) => bail!("invalid vector '{}': {}", vector, e),
            };
            let query = VectorQuery {
                query_vector,
                limit,
                num_candidates: candidates,
                filter: None,
            };
            let docs = app.service.search_by_vector(query).await?;
            print_json(&docs)
        }
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();

    let base_path = match args.base_path {
        Some(path) => path,
        None => AppFactory::get_base_path()?,
    };
    let config = AppFactory::create_config(&base_path)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            let app = AppFactory::create_local_app(config).await?;
            run(app, args.command).await
        })
}
