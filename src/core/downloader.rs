//! Tile fetching for ozimap
//!
//! Requests every tile of a grid from the static map endpoint with bounded
//! parallelism and hands each completed tile to a single consumer.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use log::debug;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};

use crate::core::config::ProgressCallback;
use crate::core::error::{Error, Result};
use crate::core::grid::TileRequest;
use crate::core::source::SourceConfig;

/// Global HTTP client shared by all tile requests
static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .tcp_keepalive(Duration::from_secs(60))
        .pool_idle_timeout(Duration::from_secs(90))
        .pool_max_idle_per_host(20)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(format!("ozimap/{}", env!("OZIMAP_VERSION")))
        .build()
        .expect("Failed to create HTTP client")
});

/// Fetches tiles for one [`SourceConfig`]
pub struct TileDownloader<'a> {
    source: &'a SourceConfig,
    client: &'a Client,
}

impl<'a> TileDownloader<'a> {
    pub fn new(source: &'a SourceConfig) -> Self {
        Self {
            source,
            client: &*GLOBAL_CLIENT,
        }
    }

    /// Fetch the raw image bytes of one tile
    pub async fn fetch_tile(&self, tile: &TileRequest) -> Result<Bytes> {
        let url = self.source.to_request_url(tile);
        debug!("Tile {},{}: GET {}", tile.row, tile.column, url);

        self.get(&url).await.map_err(|err| Error::TileFetchFailed {
            row: tile.row,
            column: tile.column,
            message: err.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Bytes> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("Server returned {status}")));
        }

        Ok(response.bytes().await?)
    }

    /// Fetch every tile, passing each to `on_tile` as soon as it arrives
    ///
    /// Tiles complete in any order. The first failure, from a fetch or from
    /// `on_tile`, is returned and the outstanding requests are dropped.
    pub async fn fetch_all<I, F>(
        &self,
        tiles: I,
        max_connections: usize,
        progress: Option<&ProgressCallback>,
        mut on_tile: F,
    ) -> Result<()>
    where
        I: ExactSizeIterator<Item = TileRequest>,
        F: FnMut(TileRequest, Bytes) -> Result<()>,
    {
        let total = tiles.len();
        let connections = calculate_optimal_connections(total, max_connections);
        debug!("Fetching {total} tiles over {connections} connections");

        let stream = futures::stream::iter(tiles)
            .map(|tile| async move {
                let bytes = self.fetch_tile(&tile).await?;
                Ok::<_, Error>((tile, bytes))
            })
            .buffer_unordered(connections);

        tokio::pin!(stream);

        let mut done = 0u64;
        while let Some(result) = stream.next().await {
            let (tile, bytes) = result?;
            on_tile(tile, bytes)?;

            done += 1;
            if let Some(progress) = progress {
                progress(done, total as u64);
            }
        }

        Ok(())
    }
}

/// Number of concurrent requests for `tile_count` tiles
pub fn calculate_optimal_connections(tile_count: usize, max_connections: usize) -> usize {
    let cpu_count = num_cpus::get();

    tile_count.min(max_connections).min(cpu_count * 2).max(1)
}
