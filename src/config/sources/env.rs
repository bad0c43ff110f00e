//! Environment source: STORYTELLER__SECTION__KEY, e.g. STORYTELLER__TEXT__MODEL.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("STORYTELLER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
