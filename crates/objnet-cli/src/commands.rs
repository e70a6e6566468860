use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use objnet_node::{connect, NodeConfig, NodeServer};
use objnet_protocol::Message;
use objnet_store::ObjectManager;
use objnet_types::NetworkObject;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Push(args) => cmd_push(args).await,
        Command::Id(args) => cmd_id(args),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(db) = args.db {
        config.db_path = Some(db);
    }

    let storage = match &config.db_path {
        Some(path) => path.display().to_string(),
        None => "in-memory".into(),
    };
    println!(
        "{} objnet node on {} (storage: {})",
        "✓".green().bold(),
        config.bind_addr.to_string().bold(),
        storage
    );
    NodeServer::new(config)?.serve().await?;
    Ok(())
}

async fn cmd_push(args: PushArgs) -> anyhow::Result<()> {
    let objects = load_objects(&args.file)?;
    let manager = Arc::new(ObjectManager::in_memory());
    for object in &objects {
        let id = manager.put(object)?;
        println!("  {} {} {}", "stored:".green(), id.short_hex().yellow(), object.name());
    }

    let conn = connect(args.peer, manager, Arc::new(NodeConfig::default()))
        .await
        .with_context(|| format!("could not connect to {}", args.peer))?;
    for object in objects {
        conn.send(Message::object(object));
    }
    println!("Announced to {}, answering requests for {}s...", args.peer.to_string().bold(), args.linger);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.linger);
    while tokio::time::Instant::now() < deadline && !conn.is_finished() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    conn.close();
    println!("{} Done.", "✓".green().bold());
    Ok(())
}

fn cmd_id(args: IdArgs) -> anyhow::Result<()> {
    for object in load_objects(&args.file)? {
        println!("{}  {}", object.id()?.to_string().yellow(), object.name());
    }
    Ok(())
}

/// Read a JSON array of objects.
pub fn load_objects(path: &Path) -> anyhow::Result<Vec<NetworkObject>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON array of objects", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_objects_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        let parent = NetworkObject::leaf("parent");
        let child = NetworkObject::new("child", vec![parent.id().unwrap()]);
        std::fs::write(&path, serde_json::to_string(&[&parent, &child]).unwrap()).unwrap();

        let loaded = load_objects(&path).unwrap();
        assert_eq!(loaded, vec![parent, child]);
    }

    #[test]
    fn load_objects_rejects_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("objects.json");
        std::fs::write(&path, r#"[{"name":"x","deps":["not-hex"]}]"#).unwrap();
        assert!(load_objects(&path).is_err());
    }

    #[test]
    fn load_objects_missing_file() {
        let err = load_objects(Path::new("/nonexistent/objects.json")).unwrap_err();
        assert!(err.to_string().contains("could not read"));
    }
}
