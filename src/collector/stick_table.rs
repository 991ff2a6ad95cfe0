use log::debug;

use super::core::PeriodicCollector;
use crate::channel::{dump_table_command, ChannelResult, ControlChannel, LIST_TABLES_COMMAND};
use crate::error::Result;
use crate::table::{parse_table_dump, parse_table_list, Generation};

/// Walks every stick-table over the control channel and builds a generation
pub struct StickTableCollector<C: ControlChannel> {
    channel: C,
    name: String,
}

impl<C: ControlChannel> StickTableCollector<C> {
    /// Create a new collector on top of `channel`
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            name: "stick_table_collector".to_string(),
        }
    }

    /// Set the collector name used in logs
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// List the tables, then dump each one in listing order.
    ///
    /// The first channel failure aborts the whole cycle. A table whose dump
    /// fails the sanity check still gets an (empty) entry.
    pub async fn collect_generation(&self) -> ChannelResult<Generation> {
        let listing = self.channel.exchange(LIST_TABLES_COMMAND).await?;
        let names = parse_table_list(&listing);
        debug!("{}: found {} tables: {:?}", self.name, names.len(), names);

        let mut tables = Vec::with_capacity(names.len());
        for name in &names {
            let dump = self.channel.exchange(&dump_table_command(name)).await?;
            let snapshot = parse_table_dump(name, &dump);
            debug!(
                "{}: table {} has {} entries ({} samples)",
                self.name,
                name,
                snapshot.entry_count,
                snapshot.conn_rate_samples.len()
            );
            tables.push(snapshot);
        }

        Ok(Generation::new(tables))
    }
}

#[async_trait::async_trait]
impl<C: ControlChannel> PeriodicCollector for StickTableCollector<C> {
    async fn collect(&self) -> Result<Generation> {
        Ok(self.collect_generation().await?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::ScriptedChannel;
    use crate::channel::ChannelError;
    use crate::error::ExporterError;

    const LISTING: &str = "# table: monitoring, type: ip, size:32, used:0\n\
        # table: fe_https, type: ip, size:1048576, used:1\n\
        # table: fe_http, type: ip, size:1048576, used:1\n\
        \n";

    const MONITORING: &str = "# table: monitoring, type: ip, size:32, used:0\n\n";

    const FE_HTTPS: &str = "# table: fe_https, type: ip, size:1048576, used:1\n\
        0x55d1c8d0b3c0: key=10.1.1.1 use=0 exp=2000 conn_rate(3000)=12 http_req_rate(10000)=30\n\n";

    #[tokio::test]
    async fn test_collects_every_table_in_order() {
        let fe_http = FE_HTTPS.replace("fe_https", "fe_http");
        let channel = ScriptedChannel::new(vec![
            Ok(LISTING.to_string()),
            Ok(MONITORING.to_string()),
            Ok(FE_HTTPS.to_string()),
            Ok(fe_http),
        ]);
        let collector = StickTableCollector::new(channel);

        let generation = collector.collect().await.unwrap();

        let names: Vec<_> = generation.tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["monitoring", "fe_https", "fe_http"]);
        assert_eq!(generation.table("fe_https").unwrap().conn_rate_samples, vec![12.0]);
        assert_eq!(
            collector.channel().commands(),
            vec!["show table", "show table monitoring", "show table fe_https", "show table fe_http"]
        );
    }

    #[tokio::test]
    async fn test_mismatch_does_not_abort_cycle() {
        let channel = ScriptedChannel::new(vec![
            Ok(LISTING.to_string()),
            Ok(MONITORING.to_string()),
            Ok(FE_HTTPS.to_string()),
            // Asked for fe_http, got someone else's header
            Ok(FE_HTTPS.to_string()),
        ]);
        let collector = StickTableCollector::new(channel);

        let generation = collector.collect().await.unwrap();

        assert_eq!(generation.len(), 3);
        let fe_http = generation.table("fe_http").unwrap();
        assert!(fe_http.is_mismatch());
        assert_eq!(fe_http.entry_count, 0);
        assert!(fe_http.conn_rate_samples.is_empty());
        assert!(fe_http.http_request_rate_samples.is_empty());
        assert!(!generation.table("fe_https").unwrap().is_mismatch());
    }

    #[tokio::test]
    async fn test_channel_failure_aborts_cycle() {
        let channel = ScriptedChannel::new(vec![
            Ok(LISTING.to_string()),
            Ok(MONITORING.to_string()),
            Err(ScriptedChannel::read_error()),
        ]);
        let collector = StickTableCollector::new(channel);

        let err = collector.collect().await.unwrap_err();

        assert!(matches!(err, ExporterError::Channel(ChannelError::Read(_))));
        // Nothing is asked after the failure
        assert_eq!(collector.channel().commands().len(), 3);
    }

    #[tokio::test]
    async fn test_listing_failure_aborts_cycle() {
        let channel = ScriptedChannel::new(vec![Err(ChannelError::Write {
            command: "show table".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe"),
        })]);
        let collector = StickTableCollector::new(channel).with_name("haproxy");

        let err = collector.collect().await.unwrap_err();
        assert!(err.is_channel());
        assert_eq!(collector.name(), "haproxy");
    }

    #[tokio::test]
    async fn test_no_tables() {
        let collector = StickTableCollector::new(ScriptedChannel::new(vec![Ok(String::new())]));

        let generation = collector.collect().await.unwrap();
        assert!(generation.is_empty());
    }
}
