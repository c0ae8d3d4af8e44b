use sofref_core::config::PluginConfig;
use sofref_runtime::config_store::ConfigStore;
use sofref_runtime::runtime_store::build_services_from_config;
use sofref_widget::element::PluginElement;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// Plays the host page: mounts one element, sets its `sref`, submits the settings
// form, prints the rendered scope once the pipeline settles.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = match env_value("SOFREF_CONFIG") {
        Some(path) => ConfigStore::at_path(path).load_or_default()?,
        None => PluginConfig::default(),
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut element = PluginElement::new(
        build_services_from_config(&cfg),
        cfg.link_base_url.clone(),
        events_tx,
    );
    element.connected();
    element.set_sref(env_value("SOFREF_SREF").as_deref());

    if let Some(form) = element.form_mut() {
        form.set_api_key(env_value("SOFREF_API_KEY").unwrap_or_default());
        form.set_transcription_id(env_value("SOFREF_TRANSCRIPTION_ID").unwrap_or_default());
    }

    match element.submit_settings() {
        Some(handle) => handle.settled().await?,
        None => log::warn!("SOFREF_TRANSCRIPTION_ID is not set; nothing to fetch"),
    }

    if let Some(view) = element.view() {
        println!("{view}");
    }

    if let Some(target) = env_value("SOFREF_SCROLL_TO") {
        element.set_scroll_target(target);
        element.trigger_scroll();
        while let Ok(event) = events_rx.try_recv() {
            println!("{}", serde_json::to_string(&event)?);
        }
    }

    element.disconnected();
    Ok(())
}
