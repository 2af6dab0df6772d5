mod backend;
mod config;
mod gateway;
mod image_input;
mod openai;
mod prompt;
mod unichunk;
mod verdict;

use clap::Parser;

/// Classify the damage severity of a car photo.
#[derive(clap::Parser)]
struct Opts {
    /// Image of the car to assess.
    image: std::path::PathBuf,

    #[clap(long, default_value = "config.toml")]
    config: std::path::PathBuf,

    /// Wrap output lines at this many bytes.
    #[clap(long, default_value_t = 80)]
    width: usize,

    /// Media type declared for the uploaded image.
    #[clap(long)]
    media_type: Option<String>,

    /// Also print a parsed damaged/severity summary.
    #[clap(long)]
    structured: bool,
}

fn report_api_key(key: Option<&str>) -> Result<(), anyhow::Error> {
    match config::check_api_key(key) {
        config::ApiKeyStatus::Missing => {
            return Err(anyhow::format_err!(
                "no API key found: set OPENAI_API_KEY or backend_config.api_key"
            ));
        }
        config::ApiKeyStatus::UnexpectedPrefix => {
            log::warn!("an API key was found, but it doesn't start with sk-proj-; check you're using the right key");
        }
        config::ApiKeyStatus::SurroundingWhitespace => {
            log::warn!("an API key was found, but it has whitespace at the start or end");
        }
        config::ApiKeyStatus::Ok => {
            log::info!("API key found");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    if let Err(e) = dotenv::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {}", e);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("car_damage_classifier=info")).init();

    let opts = Opts::parse();

    let config = config::Config::load(&opts.config, std::env::var("OPENAI_API_KEY").ok())?;
    report_api_key(config.api_key())?;

    let backend = backend::new_backend_from_config(&config.backend, config.backend_config.clone())?;
    let gateway = gateway::Gateway::new(backend, config.parameters.clone(), config.retry_policy());

    let classification = match opts.media_type {
        Some(media_type) => {
            let image = image_input::ImageInput::from_path(&opts.image)?.with_media_type(media_type);
            gateway.classify(&image).await?
        }
        None => gateway.classify_path(&opts.image).await?,
    };
    for line in unichunk::wrap(classification.text(), opts.width) {
        println!("{}", line);
    }

    if opts.structured {
        if let Some(verdict) = classification.verdict() {
            println!();
            println!("Verdict: {}", verdict);
        }
    }

    Ok(())
}
