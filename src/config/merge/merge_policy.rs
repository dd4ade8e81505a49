//! Merge rules: built-in defaults at the bottom of the layer stack.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with every documented default applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("cli.program", "az")?
        .set_default("executor.max_attempts", 3)?
        .set_default("executor.retry_delay_secs", 5)?
        .set_default("executor.command_timeout_secs", 600)?
        .set_default("dispatch.max_workers", 10)?
        .set_default("naming.prefix", "RH")?
        .set_default("deletion.confirm_threshold", 100)?
        .set_default("deletion.lock_level", "CanNotDelete")?
        .set_default("paths.log_dir", "logs")?
        .set_default("paths.vm_list", "snapshot_vmlist.txt")?
        .set_default("paths.snapshot_list", "snap_rid_list.txt")
}
