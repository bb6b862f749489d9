//! Watch command - mirrors watched paths of a seeded in-memory store.

use std::sync::Arc;

use firetree::{
    Client,
    client::WatchSpec,
    config::Config,
    event::EventKind,
    remote::InMemory,
    store::Store,
};

use crate::cli::WatchArgs;
use crate::output::{OutputFormat, print_json, print_table};

/// Parses an `event:path` watch argument.
fn parse_watch(arg: &str) -> Result<WatchSpec, Box<dyn std::error::Error>> {
    let (event, path) = arg
        .split_once(':')
        .ok_or_else(|| format!("watch '{arg}' must look like event:path"))?;
    Ok(WatchSpec::new(event.parse::<EventKind>()?, path))
}

fn local_config() -> Config {
    Config {
        api_key: "local".to_string(),
        auth_domain: "localhost".to_string(),
        database_url: "memory://local".to_string(),
        ..Default::default()
    }
}

/// Run the watch command
pub async fn run(args: &WatchArgs, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => local_config(),
    };
    let seed = match &args.seed {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => serde_json::Value::Null,
    };
    let specs = args
        .watches
        .iter()
        .map(|arg| parse_watch(arg))
        .collect::<Result<Vec<_>, _>>()?;

    let store = Store::new();
    let client = Client::new(config, Arc::new(InMemory::with_data(seed)), Arc::new(store.clone()))?;
    for spec in &specs {
        client
            .watch_event(spec.name, &spec.path, args.dest.as_deref(), false)
            .await?;
    }

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = client
                .watchers()
                .ids()
                .into_iter()
                .map(|id| vec![id])
                .collect();
            print_table(&["WATCH ID"], &rows);
            println!();
            print_json(&store.state().data.to_json(), format)?;
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "watches": client.watchers().ids(),
                "state": store.state().to_json(),
            });
            print_json(&value, format)?;
        }
    }

    Ok(())
}
