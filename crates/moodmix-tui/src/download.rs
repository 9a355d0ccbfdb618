//! Saving playlist images and the merged mix to disk.
//!
//! Each request runs in its own task and reports a `DownloadOutcome` on the
//! channel the app drains; playback never waits on a download.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::{error, info};

use moodmix_proto::playlist::{Image, ImageKind};

use crate::api::ApiClient;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Saved { label: String, path: PathBuf },
    Failed { label: String, error: String },
}

impl DownloadOutcome {
    pub fn label(&self) -> &str {
        match self {
            Self::Saved { label, .. } | Self::Failed { label, .. } => label,
        }
    }
}

pub struct Downloader {
    client: ApiClient,
    dir: PathBuf,
    tx: mpsc::Sender<DownloadOutcome>,
}

impl Downloader {
    pub fn new(client: ApiClient, dir: PathBuf, tx: mpsc::Sender<DownloadOutcome>) -> Self {
        Self { client, dir, tx }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save one carousel image.  The original is copied from its local path,
    /// generated images are fetched.
    pub fn save_image(&self, image: &Image, session: Option<&str>) {
        let label = format!("{} image", image.kind.label());
        let image = image.clone();
        let session = session.map(str::to_string);
        let client = self.client.clone();
        let dir = self.dir.clone();
        self.spawn(label, async move {
            do_save_image(&client, &dir, &image, session.as_deref(), Local::now()).await
        });
    }

    /// Save the merged playlist audio.
    pub fn save_mix(&self, audio_url: &str, session: Option<&str>) {
        let url = audio_url.to_string();
        let session = session.map(str::to_string);
        let client = self.client.clone();
        let dir = self.dir.clone();
        self.spawn("mix".to_string(), async move {
            if url.is_empty() {
                anyhow::bail!("this playlist has no audio");
            }
            let (bytes, _) = client
                .fetch_bytes(&url)
                .await
                .with_context(|| format!("fetching {}", url))?;
            let name = mix_file_name(session.as_deref(), Local::now());
            write_file(&dir, &name, &bytes).await
        });
    }

    fn spawn<F>(&self, label: String, work: F)
    where
        F: std::future::Future<Output = anyhow::Result<PathBuf>> + Send + 'static,
    {
        let tx = self.tx.clone();
        info!("Starting download of {}", label);
        tokio::spawn(async move {
            let outcome = match work.await {
                Ok(path) => {
                    info!("Download complete: {:?}", path);
                    DownloadOutcome::Saved { label, path }
                }
                Err(e) => {
                    error!("Download of {} failed: {:#}", label, e);
                    DownloadOutcome::Failed {
                        label,
                        error: format!("{:#}", e),
                    }
                }
            };
            let _ = tx.send(outcome).await;
        });
    }
}

async fn do_save_image(
    client: &ApiClient,
    dir: &Path,
    image: &Image,
    session: Option<&str>,
    now: DateTime<Local>,
) -> anyhow::Result<PathBuf> {
    match image.kind {
        ImageKind::Original => {
            let src = Path::new(&image.url);
            let bytes = tokio::fs::read(src)
                .await
                .with_context(|| format!("reading {:?}", src))?;
            let ext = extension_for(None, &image.url);
            let name = image_file_name(image.kind, session, ext, now);
            write_file(dir, &name, &bytes).await
        }
        ImageKind::Youtube | ImageKind::Lp => {
            let (bytes, content_type) = client
                .fetch_bytes(&image.url)
                .await
                .with_context(|| format!("fetching {}", image.url))?;
            let ext = extension_for(content_type.as_deref(), &image.url);
            let name = image_file_name(image.kind, session, ext, now);
            write_file(dir, &name, &bytes).await
        }
    }
}

async fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating {:?}", dir))?;
    let path = dir.join(name);
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("writing {:?}", path))?;
    Ok(path)
}

/// `{kind}_{session}.{ext}`, or a timestamp when there is no session
/// (fallback playlists).
pub fn image_file_name(
    kind: ImageKind,
    session: Option<&str>,
    ext: &str,
    now: DateTime<Local>,
) -> String {
    format!("{}_{}.{}", kind.label(), stem(session, now), ext)
}

pub fn mix_file_name(session: Option<&str>, now: DateTime<Local>) -> String {
    format!("playlist_{}.mp3", stem(session, now))
}

fn stem(session: Option<&str>, now: DateTime<Local>) -> String {
    match session {
        Some(s) if !s.is_empty() => sanitize(s),
        _ => now.format("%Y%m%d-%H%M%S").to_string(),
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// File extension from the response content type, else from the URL path,
/// else `jpg`.
pub fn extension_for(content_type: Option<&str>, url: &str) -> &'static str {
    let from_mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match from_mime.as_deref() {
        Some("image/png") => return "png",
        Some("image/jpeg") | Some("image/jpg") => return "jpg",
        Some("image/webp") => return "webp",
        Some("image/gif") => return "gif",
        _ => {}
    }
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path
        .rsplit_once('.')
        .filter(|(_, ext)| !ext.contains('/'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "png",
        Some("webp") => "webp",
        Some("gif") => "gif",
        _ => "jpg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::header, response::IntoResponse, routing::get, Router};
    use chrono::TimeZone;
    use moodmix_proto::config::ApiConfig;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 13, 4, 5).unwrap()
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client(base_url: String) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url,
            request_timeout_secs: 5,
            max_retries: 0,
            retry_backoff_ms: 10,
        })
        .unwrap()
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            image_file_name(ImageKind::Lp, Some("abc-123"), "png", fixed_now()),
            "lp_abc-123.png"
        );
        assert_eq!(
            image_file_name(ImageKind::Original, None, "jpg", fixed_now()),
            "original_20240501-130405.jpg"
        );
        assert_eq!(mix_file_name(Some("a/b"), fixed_now()), "playlist_a_b.mp3");
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("image/png; charset=x"), "/x"), "png");
        assert_eq!(extension_for(None, "http://h/a/cover.WEBP?v=1"), "webp");
        assert_eq!(extension_for(None, "http://h.example/download/image/s"), "jpg");
        assert_eq!(extension_for(Some("application/octet-stream"), "/img.gif"), "gif");
    }

    #[tokio::test]
    async fn test_save_original_copies_local_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let src = src_dir.path().join("photo.png");
        std::fs::write(&src, b"png-bytes").unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let dl = Downloader::new(
            client("http://127.0.0.1:1".into()),
            out_dir.path().join("nested"),
            tx,
        );
        dl.save_image(
            &Image {
                kind: ImageKind::Original,
                url: src.to_string_lossy().into_owned(),
            },
            Some("s-9"),
        );
        match rx.recv().await.unwrap() {
            DownloadOutcome::Saved { path, .. } => {
                assert_eq!(path, out_dir.path().join("nested").join("original_s-9.png"));
                assert_eq!(std::fs::read(path).unwrap(), b"png-bytes");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_save_remote_image_and_mix() {
        let router = Router::new()
            .route(
                "/download/image/s-1",
                get(|| async { ([(header::CONTENT_TYPE, "image/png")], b"lp".to_vec()).into_response() }),
            )
            .route("/download/s-1", get(|| async { b"mp3".to_vec() }));
        let base = serve(router).await;
        let out_dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let dl = Downloader::new(client(base.clone()), out_dir.path().to_path_buf(), tx);

        dl.save_image(
            &Image {
                kind: ImageKind::Lp,
                url: format!("{}/download/image/s-1", base),
            },
            Some("s-1"),
        );
        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            DownloadOutcome::Saved {
                label: "lp image".into(),
                path: out_dir.path().join("lp_s-1.png"),
            }
        );

        dl.save_mix(&format!("{}/download/s-1", base), Some("s-1"));
        let second = rx.recv().await.unwrap();
        assert_eq!(second.label(), "mix");
        assert_eq!(std::fs::read(out_dir.path().join("playlist_s-1.mp3")).unwrap(), b"mp3");
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let out_dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let dl = Downloader::new(client("http://127.0.0.1:1".into()), out_dir.path().to_path_buf(), tx);

        dl.save_mix("", None);
        assert!(matches!(rx.recv().await.unwrap(), DownloadOutcome::Failed { .. }));

        dl.save_image(
            &Image {
                kind: ImageKind::Youtube,
                url: "http://127.0.0.1:1/nope".into(),
            },
            None,
        );
        match rx.recv().await.unwrap() {
            DownloadOutcome::Failed { label, .. } => assert_eq!(label, "youtube image"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
