use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Client for the FakeML image gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080/api/generate")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the remaining daily quota
    Quota,
    /// Upload an image and save the generated result
    Generate {
        /// Image to upload
        #[arg(short, long)]
        image: PathBuf,
        /// Username rendered onto the image
        #[arg(short = 'n', long)]
        username: String,
        /// Where to write the result. Defaults to the server-suggested name.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Quota => {
            let res = client.get(&cli.url).send().await?;
            print_json(res).await?;
        }
        Commands::Generate {
            image,
            username,
            output,
        } => {
            let file_name = image
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image.jpg")
                .to_string();
            let data = tokio::fs::read(&image).await?;
            let form = Form::new()
                .part("image", Part::bytes(data).file_name(file_name))
                .text("username", username);

            let res = client.post(&cli.url).multipart(form).send().await?;
            if !res.status().is_success() {
                return print_json(res).await;
            }

            for name in ["x-ratelimit-limit", "x-ratelimit-remaining", "x-ratelimit-reset"] {
                if let Some(value) = res.headers().get(name).and_then(|v| v.to_str().ok()) {
                    println!("{}: {}", name, value);
                }
            }

            let target = output
                .or_else(|| suggested_name(&res).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("result.png"));
            let bytes = res.bytes().await?;
            tokio::fs::write(&target, &bytes).await?;
            println!("Saved {} bytes to {}", bytes.len(), target.display());
        }
    }

    Ok(())
}

/// File name from `Content-Disposition: attachment; filename="..."`.
fn suggested_name(res: &reqwest::Response) -> Option<String> {
    let disposition = res
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)?
        .to_str()
        .ok()?;
    let name = disposition.split("filename=").nth(1)?.trim_matches('"');
    (!name.is_empty()).then(|| name.to_string())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;
    if status.is_success() {
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", serde_json::to_string_pretty(&json)?);
    }
    Ok(())
}
