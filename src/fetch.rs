//! Downloads the source CSV files into the local cache directory.

use crate::config::Source;
use log::info;
use rayon::prelude::*;
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        source: reqwest::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of one download.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub path: PathBuf,
    pub bytes: usize,
}

/// GET `url` and return the body. Non-2xx statuses are errors.
pub fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let request_error = |source| FetchError::Request {
        url: url.to_string(),
        source,
    };
    let resp = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(request_error)?;
    Ok(resp.bytes().map_err(request_error)?.to_vec())
}

/// Download one source and write the body verbatim to `data_dir`,
/// replacing any earlier copy.
pub fn download(client: &Client, source: &Source, data_dir: &Path) -> Result<Fetched, FetchError> {
    let body = fetch_bytes(client, &source.url)?;
    let path = data_dir.join(&source.file_name);
    fs::write(&path, &body).map_err(|e| FetchError::Write {
        path: path.clone(),
        source: e,
    })?;
    info!("Fetched {} -> {} ({} bytes)", source.url, path.display(), body.len());
    Ok(Fetched {
        path,
        bytes: body.len(),
    })
}

/// Download every source. The first failure aborts the whole fetch.
pub fn download_all(
    sources: &[&Source],
    data_dir: &Path,
    parallel: bool,
) -> Result<Vec<Fetched>, FetchError> {
    fs::create_dir_all(data_dir).map_err(|e| FetchError::Write {
        path: data_dir.to_path_buf(),
        source: e,
    })?;
    let client = Client::new();

    if parallel {
        sources
            .par_iter()
            .map(|source| download(&client, source, data_dir))
            .collect()
    } else {
        sources
            .iter()
            .map(|source| download(&client, source, data_dir))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const BODY: &str = "Alpha-2 code,English short name lower case\nNA,Namibia\n";

    #[test]
    fn download_writes_body_verbatim_and_overwrites() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/codes.csv");
            then.status(200).body(BODY);
        });

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("codes.csv");
        std::fs::write(&target, "stale").unwrap();

        let source = Source::new(&server.url("/codes.csv"), "codes.csv");
        let fetched = download(&Client::new(), &source, dir.path()).unwrap();

        assert_eq!(fetched.path, target);
        assert_eq!(fetched.bytes, BODY.len());
        assert_eq!(std::fs::read_to_string(&target).unwrap(), BODY);
    }

    #[test]
    fn non_success_status_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.csv");
            then.status(404).body("not here");
        });

        let dir = tempfile::tempdir().unwrap();
        let source = Source::new(&server.url("/missing.csv"), "missing.csv");
        let err = download(&Client::new(), &source, dir.path()).unwrap_err();

        assert!(matches!(err, FetchError::Request { .. }));
        assert!(!dir.path().join("missing.csv").exists());
    }

    #[test]
    fn parallel_and_sequential_fetch_the_same_files() {
        let server = MockServer::start();
        for name in ["a.csv", "b.csv", "c.csv"] {
            server.mock(|when, then| {
                when.method(GET).path(format!("/{name}"));
                then.status(200).body(name);
            });
        }
        let sources: Vec<Source> = ["a.csv", "b.csv", "c.csv"]
            .iter()
            .map(|n| Source::new(&server.url(format!("/{n}")), n))
            .collect();
        let refs: Vec<&Source> = sources.iter().collect();

        for parallel in [false, true] {
            let dir = tempfile::tempdir().unwrap();
            let fetched = download_all(&refs, dir.path(), parallel).unwrap();
            assert_eq!(fetched.len(), 3);
            for name in ["a.csv", "b.csv", "c.csv"] {
                assert_eq!(std::fs::read_to_string(dir.path().join(name)).unwrap(), name);
            }
        }
    }
}
