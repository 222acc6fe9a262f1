use anyhow::{Result, bail};
use quill_application::Scope;
use quill_application::accounts::{UseAccountOpts, use_account};
use quill_infrastructure::QuillConfig;
use serde_json::json;

use super::{print_json, session};

pub async fn show(config: &QuillConfig, id: &str, with_relationship: bool) -> Result<()> {
    let session = session(config)?;
    let mut hook = use_account(
        &session,
        Some(id),
        UseAccountOpts { with_relationship },
        &Scope::new(),
    );

    let state = hook.settled().await;
    let Some(view) = state.account else {
        match state.error {
            Some(err) => bail!(err),
            None => bail!("account {id} did not resolve"),
        }
    };
    if let Some(err) = &state.error {
        tracing::warn!(error = %err, "relationship unavailable");
    }
    if state.is_unavailable {
        println!("@{} is unavailable", view.account.acct);
        return Ok(());
    }

    print_json(&json!({
        "account": view.account.as_ref(),
        "relationship": view.relationship.as_deref(),
    }))
}
