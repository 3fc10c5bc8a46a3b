use std::path::Path;
use std::time::Duration;

use crate::predict::error::PredictError;
use crate::predict::tle_loader::parse_multi_tle;

pub const CUBESAT_FEED_URL: &str = "http://www.celestrak.com/NORAD/elements/cubesat.txt";

/// Downloads a three-line element feed and replaces `dest` with it.
///
/// The existing file is left untouched when the download fails or the body
/// holds no element sets.
pub async fn download_tles(url: &str, dest: &Path, timeout: Duration) -> Result<usize, PredictError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PredictError::Download(e.to_string()))?;

    let body = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| PredictError::Download(e.to_string()))?
        .text()
        .await
        .map_err(|e| PredictError::Download(e.to_string()))?;

    let count = parse_multi_tle(&body).len();
    if count == 0 {
        return Err(PredictError::Download(format!("no element sets at {}", url)));
    }

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(dest, body).await?;
    log::info!("Downloaded {} element sets from {} to {}", count, url, dest.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::tle_loader::tests::FIREBIRD_TLE;
    use axum::{routing::get, Router};

    async fn serve(body: &'static str) -> String {
        let app = Router::new()
            .route("/cubesat.txt", get(move || async move { body }))
            .route(
                "/missing.txt",
                get(|| async { (axum::http::StatusCode::NOT_FOUND, "gone") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn writes_feed_to_destination() {
        let base = serve(FIREBIRD_TLE).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("tle.txt");

        let count = download_tles(&format!("{base}/cubesat.txt"), &dest, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), FIREBIRD_TLE);
    }

    #[tokio::test]
    async fn keeps_old_file_on_http_error() {
        let base = serve(FIREBIRD_TLE).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tle.txt");
        std::fs::write(&dest, "previous").unwrap();

        let result =
            download_tles(&format!("{base}/missing.txt"), &dest, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(PredictError::Download(_))));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
    }

    #[tokio::test]
    async fn rejects_body_without_element_sets() {
        let base = serve("<html>maintenance</html>").await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("tle.txt");

        let result =
            download_tles(&format!("{base}/cubesat.txt"), &dest, Duration::from_secs(5)).await;
        assert!(matches!(result, Err(PredictError::Download(_))));
        assert!(!dest.exists());
    }
}
