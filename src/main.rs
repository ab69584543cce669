use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use nano_banana_rs::banana::config::StudioConfig;
use nano_banana_rs::banana::server;
use nano_banana_rs::banana::studio::{append_style, GeneratedImage, Studio};
use nano_banana_rs::banana::workflow::{NodeKind, RunOutcome, WorkflowSession};
use nano_banana_rs::genai::{GenerationClient, ImageData};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML file overriding models, API base and port
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on (defaults to BANANA_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Generate an image from a prompt
    Generate {
        /// The prompt to send
        #[arg(short, long)]
        prompt: String,

        /// Rewrite the prompt before generating
        #[arg(long)]
        optimize: bool,

        /// Style appended to the prompt, e.g. "watercolor"
        #[arg(short, long)]
        style: Option<String>,

        /// Output file (defaults to the generated download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Remix an existing image with an instruction
    Remix {
        /// The instruction to apply
        #[arg(short, long)]
        prompt: String,

        /// Path to the source image
        #[arg(short, long)]
        image: PathBuf,

        /// Rewrite the prompt before generating
        #[arg(long)]
        optimize: bool,

        /// Style appended to the prompt, e.g. "watercolor"
        #[arg(short, long)]
        style: Option<String>,

        /// Output file (defaults to the generated download name)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Rewrite a prompt into a more detailed one
    Optimize {
        #[arg(short, long)]
        prompt: String,
    },
    /// Run the default Input -> Process -> Output workflow once
    Workflow {
        /// Prompt for the input node (defaults to the seeded prompt)
        #[arg(short, long)]
        prompt: Option<String>,

        /// Output file for the resulting image
        #[arg(short, long, default_value = "banana-workflow.png")]
        out: PathBuf,
    },
}

fn load_source_image(path: &Path) -> anyhow::Result<ImageData> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading source image {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    Ok(ImageData::new(ImageData::mime_for_extension(ext), bytes))
}

fn save_image(image: &ImageData, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, &image.bytes).with_context(|| format!("writing {}", out.display()))?;
    println!("Saved {} ({} bytes)", out.display(), image.len());
    Ok(())
}

fn save_record(record: &GeneratedImage, out: Option<PathBuf>) -> anyhow::Result<()> {
    let out = out.unwrap_or_else(|| PathBuf::from(record.download_name()));
    save_image(&record.image, &out)
}

async fn prepare_prompt(
    studio: &Studio,
    prompt: String,
    style: Option<String>,
    optimize: bool,
) -> String {
    let prompt = match style {
        Some(style) => append_style(&prompt, &style),
        None => prompt,
    };
    if !optimize {
        return prompt;
    }
    let optimized = studio.optimize(&prompt).await;
    println!("Optimized prompt: {}", optimized);
    optimized
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    let mut config = StudioConfig::from_env()?;
    if let Some(path) = &args.config {
        config = config
            .merge_file(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }

    log::info!(
        "Using image model {} and text model {}",
        config.image_model,
        config.text_model
    );
    let client: Arc<dyn GenerationClient> = Arc::new(config.gemini_client()?);
    let studio = Studio::new(client.clone());

    match args.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            server::serve(client, port)
                .await
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        Commands::Generate {
            prompt,
            optimize,
            style,
            out,
        } => {
            let prompt = prepare_prompt(&studio, prompt, style, optimize).await;
            println!("Generating: {}", prompt);
            let record = studio.text_to_image(&prompt).await?;
            save_record(&record, out)?;
        }
        Commands::Remix {
            prompt,
            image,
            optimize,
            style,
            out,
        } => {
            let source = load_source_image(&image)?;
            let prompt = prepare_prompt(&studio, prompt, style, optimize).await;
            println!("Remixing {}: {}", image.display(), prompt);
            let record = studio.image_to_image(&prompt, Some(&source)).await?;
            save_record(&record, out)?;
        }
        Commands::Optimize { prompt } => {
            println!("{}", studio.optimize(&prompt).await);
        }
        Commands::Workflow { prompt, out } => {
            let session = WorkflowSession::new(client);
            if let Some(prompt) = prompt {
                let mut editor = session.editor().lock().await;
                let input = editor
                    .graph()
                    .nodes_of_kind(NodeKind::Input)
                    .next()
                    .map(|n| n.id.clone())
                    .context("seeded workflow has no input node")?;
                editor.edit_prompt(&input, prompt)?;
            }

            match session.run().await? {
                RunOutcome::Succeeded { output } => {
                    let editor = session.editor().lock().await;
                    let image = editor
                        .graph()
                        .node(&output)
                        .and_then(|n| n.payload.image())
                        .context("output node has no image")?;
                    save_image(image, &out)?;
                }
                RunOutcome::Failed(failure) => {
                    anyhow::bail!("Workflow failed: {}", failure);
                }
            }
        }
    }

    Ok(())
}
