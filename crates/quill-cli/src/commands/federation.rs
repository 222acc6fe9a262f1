use anyhow::{Context, Result};
use quill_core::federation::{FederationFlags, FederationSummary, RemoteInstance, moderation_disclosed};
use quill_infrastructure::QuillConfig;

pub fn summarize(config: &QuillConfig, host: &str, flags: &str, hidden: bool, admin: bool) -> Result<()> {
    if !config.features.federating {
        println!("This instance does not federate");
        return Ok(());
    }

    let federation: FederationFlags =
        serde_json::from_str(flags).context("Failed to parse federation flags")?;
    let instance = RemoteInstance {
        host: host.to_string(),
        federation,
    };

    if !moderation_disclosed(!hidden, admin) {
        println!("{}: moderation details are not disclosed", instance.host);
        return Ok(());
    }

    match instance.summary() {
        FederationSummary::Rejected => println!("{}: all activities rejected", instance.host),
        FederationSummary::NoRestrictions => println!("{}: no restrictions", instance.host),
        FederationSummary::Restricted(items) => {
            println!("{}:", instance.host);
            for item in items {
                println!("  - {item}");
            }
        }
    }
    Ok(())
}
