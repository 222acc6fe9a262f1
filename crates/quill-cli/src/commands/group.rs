use anyhow::{Result, bail};
use quill_application::groups::{use_group, use_join_group, use_leave_group};
use quill_application::{EntityQuery, Scope, Session};
use quill_core::api::paths;
use quill_core::group::Group;
use quill_core::CacheKey;
use quill_infrastructure::QuillConfig;
use serde_json::json;
use std::sync::Arc;

use super::{print_json, session};

fn groups_session(config: &QuillConfig) -> Result<Session> {
    if !config.features.groups {
        bail!("This instance does not support groups (set features.groups = true)");
    }
    session(config)
}

pub async fn show(config: &QuillConfig, id: &str) -> Result<()> {
    let session = groups_session(config)?;
    let mut hook = use_group(&session, Some(id), &Scope::new());

    let state = hook.settled().await;
    let Some(view) = state.group else {
        match state.error {
            Some(err) => bail!(err),
            None => bail!("group {id} did not resolve"),
        }
    };

    print_json(&json!({
        "group": view.group.as_ref(),
        "relationship": view.relationship.as_deref(),
    }))
}

async fn load_group(session: &Session, id: &str) -> Result<Arc<Group>> {
    let query = EntityQuery::new(CacheKey::of::<Group>(id), paths::group(id));
    Ok(session.fetcher().load::<Group>(&query).await?)
}

pub async fn join(config: &QuillConfig, id: &str) -> Result<()> {
    let session = groups_session(config)?;
    let group = load_group(&session, id).await?;

    let membership = use_join_group(&session, &group);
    let relationship = membership.mutate(None).await?;
    membership.invalidate();

    if relationship.requested {
        println!("Requested to join {}", group.display_name);
    } else {
        println!("Joined {}", group.display_name);
    }
    Ok(())
}

pub async fn leave(config: &QuillConfig, id: &str) -> Result<()> {
    let session = groups_session(config)?;
    let group = load_group(&session, id).await?;

    let membership = use_leave_group(&session, &group);
    membership.mutate(None).await?;
    membership.invalidate();

    println!("Left {}", group.display_name);
    Ok(())
}
