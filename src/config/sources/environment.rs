//! Environment source: `AZSNAP_<SECTION>__<KEY>`, e.g. `AZSNAP_DISPATCH__MAX_WORKERS=4`.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

pub const PREFIX: &str = "AZSNAP";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
