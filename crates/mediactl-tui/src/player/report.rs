use mediactl_proto::protocol::TimelineReport;
use tracing::{debug, warn};

use crate::client::ServerClient;

/// Where progress reports go. Reports are fire-and-forget: implementations
/// must return immediately and swallow their own failures.
pub trait ProgressSink: Send + Sync {
    fn report(&self, report: TimelineReport);
}

pub struct ServerProgressSink {
    client: ServerClient,
}

impl ServerProgressSink {
    pub fn new(client: ServerClient) -> Self {
        Self { client }
    }
}

impl ProgressSink for ServerProgressSink {
    fn report(&self, report: TimelineReport) {
        let client = self.client.clone();
        tokio::spawn(async move {
            debug!(
                "PlayerManager: timeline key={} state={} time={}",
                report.rating_key,
                report.state.as_str(),
                report.time_ms
            );
            if let Err(e) = client.report_timeline(&report).await {
                warn!("PlayerManager: progress report failed: {:#}", e);
            }
        });
    }
}
