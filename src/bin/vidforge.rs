//! CLI for vidforge - video generation across providers.

use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vidforge::{
    create_video_client, supported_providers, ClientOptions, GenerationOptions, ImageArtifact,
    Provider, GOOGLE_API_KEY_ENV, REPLICATE_API_TOKEN_ENV,
};

#[derive(Parser)]
#[command(name = "vidforge")]
#[command(about = "Generate videos via Replicate or Google Veo")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a text prompt
    Generate(GenerateArgs),

    /// List providers wired for video generation
    Providers,
}

#[derive(Args)]
struct GenerateArgs {
    /// The text prompt describing the video
    prompt: String,

    /// Provider to use (replicate, google)
    #[arg(short, long, default_value = "replicate")]
    provider: String,

    /// Model identifier (required for replicate)
    #[arg(short, long)]
    model: Option<String>,

    /// Video duration in seconds
    #[arg(short, long)]
    duration: Option<u32>,

    /// Resolution (e.g., 480p, 720p)
    #[arg(long)]
    resolution: Option<String>,

    /// Aspect ratio (e.g., 16:9)
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// Conditioning image for image-to-video
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Extra vendor option as key=value (value parsed as JSON when possible)
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, Value)>,

    /// Directory for inline video bytes
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,
}

fn parse_param(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => generate(args, cli.json).await?,
        Commands::Providers => list_providers(cli.json)?,
    }

    Ok(())
}

async fn generate(args: GenerateArgs, json_output: bool) -> anyhow::Result<()> {
    let mut client_options = ClientOptions::new();
    if let Some(model) = args.model {
        client_options = client_options.model(model);
    }
    let client = create_video_client(args.provider.as_str(), client_options)?;

    let mut options = GenerationOptions::new();
    if let Some(d) = args.duration {
        options = options.with_duration(d);
    }
    if let Some(r) = args.resolution {
        options = options.with_resolution(r);
    }
    if let Some(ar) = args.aspect_ratio {
        options = options.with_aspect_ratio(ar);
    }
    if let Some(path) = args.image {
        options = options.with_image(ImageArtifact::from_path(path));
    }
    for (key, value) in args.params {
        options = options.with(key, value);
    }

    if !json_output {
        eprintln!(
            "Generating video via {} ({}), this may take a few minutes...",
            client.name(),
            client.model()
        );
    }
    let response = client.generate_content(&args.prompt, options).await?;

    let mut outputs = Vec::new();
    for (i, video) in response.content().iter().enumerate() {
        let saved = match &video.data {
            Some(_) => {
                let path = args.output_dir.join(format!("video-{i}.mp4"));
                video.save(&path)?;
                Some(path.display().to_string())
            }
            None => None,
        };
        outputs.push(serde_json::json!({
            "url": video.url,
            "saved_to": saved,
        }));
    }

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "provider": response.provider().to_string(),
            "metadata": response.metadata(),
            "videos": outputs,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if outputs.is_empty() {
        println!("{} returned no usable videos", response.provider());
    } else {
        for (i, out) in outputs.iter().enumerate() {
            match (out["url"].as_str(), out["saved_to"].as_str()) {
                (Some(url), Some(path)) => println!("[{i}] {url} (saved to {path})"),
                (Some(url), None) => println!("[{i}] {url}"),
                (None, Some(path)) => println!("[{i}] saved to {path}"),
                (None, None) => println!("[{i}] (empty)"),
            }
        }
    }

    Ok(())
}

fn list_providers(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ProviderInfo {
        kind: &'static str,
        env_var: &'static str,
        configured: bool,
    }

    let providers: Vec<ProviderInfo> = supported_providers()
        .into_iter()
        .map(|p| {
            let env_var = match p {
                Provider::Replicate => REPLICATE_API_TOKEN_ENV,
                Provider::Google => GOOGLE_API_KEY_ENV,
                _ => "",
            };
            ProviderInfo {
                kind: p.as_str(),
                env_var,
                configured: vidforge::Settings::from_env()
                    .validate_for_provider(p.as_str())
                    .is_ok(),
            }
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&providers)?);
    } else {
        println!("Video providers:\n");
        for p in &providers {
            let status = if p.configured { "✓" } else { "✗" };
            println!("  {} {}", status, p.kind);
            println!("    API key: {}", p.env_var);
        }
    }

    Ok(())
}
