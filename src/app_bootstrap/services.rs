use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::backends::streaming_api::StreamingApiAdapter;
use crate::backends::CatalogSearchAdapter;
use crate::config::Config;
use crate::console_view::ConsoleView;
use crate::protocol::Message;
use crate::search::search_manager::SearchManager;

pub struct BackgroundServicesConfig {
    pub bus_sender: broadcast::Sender<Message>,
    pub config: Config,
}

pub fn spawn_background_services(services_config: BackgroundServicesConfig) {
    let BackgroundServicesConfig { bus_sender, config } = services_config;

    let search_manager_bus_receiver = bus_sender.subscribe();
    let search_manager_bus_sender = bus_sender.clone();
    thread::spawn(move || {
        let adapter: Arc<dyn CatalogSearchAdapter> = Arc::new(StreamingApiAdapter::new(
            Duration::from_millis(config.backend.connect_timeout_ms),
            Duration::from_millis(config.backend.read_timeout_ms),
        ));
        let mut search_manager = SearchManager::new(
            search_manager_bus_receiver,
            search_manager_bus_sender,
            adapter,
            &config,
        );
        search_manager.ping_backend();
        search_manager.run();
    });

    let console_view_bus_receiver = bus_sender.subscribe();
    thread::spawn(move || {
        let mut console_view = ConsoleView::new(console_view_bus_receiver);
        console_view.run();
    });
}
