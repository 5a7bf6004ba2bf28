//! pdfchat: drive the PDF Chat workspace from the command line.
//!
//! Reads PDFCHAT_* settings from the environment (and `.env`). Results are printed as
//! JSON on stdout, logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pdfchat_api_client::ApiClient;
use pdfchat_cli::{init_tracing, load_upload_file, ProgressPrinter};
use pdfchat_core::{ChatResponder, Config};
use pdfchat_workspace::{PlaceholderResponder, Workspace};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pdfchat", about = "PDF Chat workspace CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List uploaded documents
    List,
    /// Upload a PDF
    Upload {
        /// Path to the file to upload
        file: PathBuf,
    },
    /// Open a document and navigate it
    View {
        /// Document url, as shown by `list`
        url: String,
        /// Page count to assume instead of downloading the document
        #[arg(long)]
        pages: Option<u32>,
        /// Pages to advance
        #[arg(long, default_value = "0")]
        next: u32,
        /// Zoom-in steps
        #[arg(long, default_value = "0")]
        zoom_in: u32,
        /// Zoom-out steps
        #[arg(long, default_value = "0")]
        zoom_out: u32,
    },
    /// Ask a question about a document
    Ask {
        /// Document url, as shown by `list`
        url: String,
        /// The question
        question: String,
        /// Answer locally with the placeholder reply instead of calling the backend
        #[arg(long)]
        placeholder: bool,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn open_document(workspace: &Workspace, url: &str) -> anyhow::Result<()> {
    workspace
        .refresh_list()
        .await
        .context("Failed to fetch documents")?;
    workspace
        .select_document(Some(url))
        .with_context(|| format!("No document with url {}", url))?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let client = Arc::new(
        ApiClient::from_config(&config.client)
            .context("Failed to create API client. Check PDFCHAT_API_URL")?,
    );

    let cli = Cli::parse();

    let responder: Arc<dyn ChatResponder> = match &cli.command {
        Commands::Ask {
            placeholder: true, ..
        } => Arc::new(PlaceholderResponder::default()),
        _ => client.clone(),
    };
    let workspace = Workspace::new(client.clone(), responder, &config.workspace);

    match cli.command {
        Commands::List => {
            workspace
                .refresh_list()
                .await
                .context("Failed to fetch documents")?;
            print_json(&workspace.snapshot().documents)?;
        }
        Commands::Upload { file } => {
            let upload = load_upload_file(&file)?;
            let printer =
                ProgressPrinter::spawn(workspace.subscribe(), |line| eprintln!("{}", line));
            let result = workspace.upload_file(upload).await;
            printer.finish(workspace.snapshot().upload).await;
            let document = result.context("Upload failed")?;
            print_json(&document)?;
        }
        Commands::View {
            url,
            pages,
            next,
            zoom_in,
            zoom_out,
        } => {
            open_document(&workspace, &url).await?;
            match pages {
                Some(count) => {
                    workspace.document_loaded(&url, count);
                }
                None => {
                    workspace
                        .render_selected(client.as_ref())
                        .await
                        .context("Failed to read page count")?;
                }
            }
            for _ in 0..next {
                workspace.next_page();
            }
            for _ in 0..zoom_in {
                workspace.zoom_in();
            }
            for _ in 0..zoom_out {
                workspace.zoom_out();
            }

            let viewer = workspace.snapshot().viewer;
            let zoom_percent = viewer.zoom_percent();
            let can_go_next = viewer.can_go_next();
            let can_go_prev = viewer.can_go_prev();
            print_json(&serde_json::json!({
                "viewer": viewer,
                "zoomPercent": zoom_percent,
                "canGoNext": can_go_next,
                "canGoPrev": can_go_prev,
            }))?;
        }
        Commands::Ask { url, question, .. } => {
            open_document(&workspace, &url).await?;
            let reply = workspace.ask(&question).await.context("Ask failed")?;
            print_json(&reply)?;
        }
    }

    Ok(())
}
