use anyhow::Result;
use quill_infrastructure::{QuillConfig, QuillPaths};

use super::print_json;

pub fn show(config: &QuillConfig) -> Result<()> {
    match QuillPaths::config_file() {
        Ok(path) => println!("# default config file: {}", path.display()),
        Err(e) => println!("# default config file: unavailable ({e})"),
    }

    let mut redacted = config.clone();
    if redacted.instance.access_token.is_some() {
        redacted.instance.access_token = Some("<redacted>".to_string());
    }
    print_json(&redacted)
}
