//! Brief commands that drive the pipeline from the terminal.

use std::time::Duration;

use bezz_core::{Brief, BriefInput, BriefStatus};
use bezz_db::BriefStore;
use bezz_pipeline::PipelineOrchestrator;
use tokio::task::JoinHandle;

const WATCH_INTERVAL: Duration = Duration::from_secs(2);

pub(crate) async fn run(
    store: &dyn BriefStore,
    orchestrator: &PipelineOrchestrator,
    owner: &str,
    input: BriefInput,
    watch: bool,
) -> anyhow::Result<()> {
    let (brief, handle) = orchestrator.submit(owner, input).await?;
    println!("brief {} submitted for {}", brief.id, brief.input.company_name);

    let brief = finish(store, &brief.id, handle, watch).await?;
    print_summary(&brief);
    Ok(())
}

pub(crate) async fn retry(
    store: &dyn BriefStore,
    orchestrator: &PipelineOrchestrator,
    id: &str,
    watch: bool,
) -> anyhow::Result<()> {
    let handle = orchestrator.retry_pipeline(id, None).await?;
    println!("brief {id} reset to processing");

    let brief = finish(store, id, handle, watch).await?;
    print_summary(&brief);
    Ok(())
}

pub(crate) async fn status(store: &dyn BriefStore, id: &str, json: bool) -> anyhow::Result<()> {
    let brief = store.get(id).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&brief)?);
    } else {
        print_summary(&brief);
    }
    Ok(())
}

/// Runs live inside this process, so the command always waits for the
/// handle; `watch` adds progress lines.
async fn finish(
    store: &dyn BriefStore,
    id: &str,
    mut handle: JoinHandle<()>,
    watch: bool,
) -> anyhow::Result<Brief> {
    if watch {
        let mut ticker = tokio::time::interval(WATCH_INTERVAL);
        let mut last: Option<BriefStatus> = None;
        loop {
            tokio::select! {
                joined = &mut handle => {
                    joined?;
                    break;
                }
                _ = ticker.tick() => match store.get(id).await {
                    Ok(brief) if last != Some(brief.status) => {
                        println!("  {}", brief.status);
                        last = Some(brief.status);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(brief_id = id, error = %e, "status poll failed; still waiting");
                    }
                },
            }
        }
    } else {
        handle.await?;
    }

    Ok(store.get(id).await?)
}

fn print_summary(brief: &Brief) {
    println!("{} ({}) status: {}", brief.input.company_name, brief.id, brief.status);

    let Some(results) = &brief.results else {
        return;
    };
    if let Some(strategy) = &results.strategy {
        println!("  tagline: {}", strategy.tagline);
        println!("  positioning: {}", strategy.positioning);
    }
    if let Some(names) = &results.brand_names {
        let names: Vec<&str> = names.iter().map(|n| n.name.as_str()).collect();
        println!("  names: {}", if names.is_empty() { "-".to_string() } else { names.join(", ") });
    }
    if let Some(identity) = &results.brand_identity {
        println!("  logo: {}", identity.logo_image_url);
    }
    for ad in brief.ads() {
        println!("  ad {}: {} -> {}", ad.spec.id, ad.spec.headline, ad.image_url);
    }
}
