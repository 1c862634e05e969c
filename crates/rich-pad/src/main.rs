mod script;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rich_pad_config::{DraftRecord, DraftStore, EditorConfig};
use rich_pad_core::{
    EditorSession, ExportSanitizer, HistoryConfig, MemoryField, SessionOptions, TreeHost,
};

/// Replays an editing script on the rich-text surface and prints the export.
#[derive(Parser, Debug)]
#[command(name = "rich-pad", version, about)]
struct Cli {
    /// JSON script of editor events to replay.
    script: PathBuf,

    /// Config file to use instead of `rich-pad.json` next to the executable.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draft id: start from the stored draft and save the export back to it.
    #[arg(long = "store")]
    store: Option<String>,

    /// Print every history snapshot after the replay.
    #[arg(long = "print-history")]
    print_history: bool,
}

fn session_options(config: &EditorConfig) -> SessionOptions {
    SessionOptions {
        history: HistoryConfig::with_max_states(config.max_history_states),
        max_image_width: config.max_image_width,
        code_placeholder: config.code_placeholder.clone(),
        inserted_image_alt: config.inserted_image_alt.clone(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting rich-pad");

    let config_path = cli.config.unwrap_or_else(EditorConfig::config_path);
    let config = EditorConfig::load_or_create(&config_path);

    let steps = script::load_script(&cli.script)?;

    let drafts = match &cli.store {
        Some(_) => Some(DraftStore::open(&config.resolve_draft_db_path())?),
        None => None,
    };
    let initial = match (&drafts, &cli.store) {
        (Some(store), Some(id)) => store.load(id)?.map(|draft| draft.html),
        _ => None,
    }
    .unwrap_or_default();

    let mut session = EditorSession::with_sanitizer(
        TreeHost::new(&initial),
        MemoryField::default(),
        session_options(&config),
        ExportSanitizer::with_caption_line_height(config.caption_line_height),
    );
    script::replay(&mut session, &steps)?;

    let export = session.field().value();
    let counts = session.word_count();
    println!("{export}");
    println!("{counts}");

    if cli.print_history {
        let history = session.history();
        for (i, snapshot) in history.entries().enumerate() {
            let marker = if history.index() == Some(i) { '*' } else { ' ' };
            println!("{marker}{i:>3} {snapshot}");
        }
    }

    if let (Some(store), Some(id)) = (&drafts, &cli.store) {
        let record = DraftRecord::new(export, counts.words, counts.characters);
        store
            .save(id, &record)
            .with_context(|| format!("Failed to save draft '{id}'"))?;
        tracing::info!(id = id.as_str(), "Draft saved");
    }

    Ok(())
}
