//! CLI route: configuration assembly and command output.

use crate::cli::parse::{Cli, Commands, ComposeArgs};
use crate::composition::compose;
use crate::config::{ConfigLoader, StorytellerConfig};
use crate::error::ApiError;
use crate::story::{StoryRequest, StoryRequestBody};
use serde_json::json;

/// Load configuration for this invocation and fold in CLI flags.
pub fn load_config(cli: &Cli) -> Result<StorytellerConfig, ApiError> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load(&cli.root)?,
    };
    apply_cli_overrides(cli, &mut config)?;
    Ok(config)
}

/// CLI flags override the config file.
pub fn apply_cli_overrides(cli: &Cli, config: &mut StorytellerConfig) -> Result<(), ApiError> {
    let logging = &mut config.logging;
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        logging.format = format.parse()?;
    }
    if let Some(output) = &cli.log_output {
        logging.output = output.parse()?;
    }
    if let Some(file) = &cli.log_file {
        logging.file = file.clone();
    }

    if let Commands::Serve {
        bind: Some(bind), ..
    } = &cli.command
    {
        config.server.bind = bind.clone();
    }
    if config.server.static_dir.is_relative() {
        config.server.static_dir = cli.root.join(&config.server.static_dir);
    }
    Ok(())
}

/// Validate the arguments as a request and render the composed prompt.
pub fn compose_output(args: &ComposeArgs) -> Result<String, ApiError> {
    let body = StoryRequestBody {
        name: args.name.clone(),
        age: args.age,
        genre: args.genre.clone(),
        language: args.language.clone(),
        prompt: args.prompt.clone(),
        attention_span: args.attention_span,
        reading_level: args.reading_level,
    };
    let request = StoryRequest::try_from(body)?;
    let prompt = compose(&request);

    if args.json {
        let value = json!({
            "language": request.language.code(),
            "max_tokens": prompt.max_tokens,
            "prompt": prompt.text,
        });
        serde_json::to_string_pretty(&value)
            .map_err(|e| ApiError::GenerationFailed(format!("Failed to render JSON: {}", e)))
    } else {
        Ok(format!(
            "language: {}\nmax_tokens: {}\n\n{}",
            request.language.code(),
            prompt.max_tokens,
            prompt.text
        ))
    }
}
