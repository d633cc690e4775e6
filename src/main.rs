use std::io::{self, Read};

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "hancard",
    version,
    about = "Render Chinese text as pinyin + translation cards"
)]
struct Cli {
    /// Text to render; reads stdin when omitted
    text: Option<String>,

    /// Target translation language (overrides settings)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Directory for rendered cards
    #[arg(short = 'o', long = "out", default_value = "cards")]
    out: String,

    /// Run the HTTP server on the given address instead (e.g. 0.0.0.0:7860)
    #[arg(long = "serve")]
    serve: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    hancard::logging::init(cli.verbose)?;

    if let Some(addr) = cli.serve {
        let settings_path = cli.read_settings.as_deref().map(std::path::Path::new);
        let settings = hancard::settings::load_settings(settings_path)?;
        return hancard::server::run_server(settings, addr).await;
    }

    let input = match cli.text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let output = hancard::run(
        hancard::Config {
            lang: cli.lang,
            out_dir: cli.out,
            settings_path: cli.read_settings,
        },
        input,
    )
    .await?;

    println!("{}", output);
    Ok(())
}
