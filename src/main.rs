use anyhow::{bail, Context, Result};
use media_picker::{MediaHandle, MediaType};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("media_picker=info".parse()?),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: media-picker <path>...");
    }

    for path in &paths {
        let media = MediaHandle::from_path(path)
            .with_context(|| format!("Failed to open media: {}", path))?;
        describe(path, &media).await;
    }

    Ok(())
}

async fn describe(path: &str, media: &MediaHandle) {
    let kind = match media.media_type() {
        MediaType::Image => "image",
        MediaType::Video => "video",
        MediaType::Files => "file",
    };
    println!("{path}");
    println!("  type:      {kind}");

    let probe = media.clone();
    let duration = tokio::task::spawn_blocking(move || probe.duration())
        .await
        .ok()
        .flatten();
    if let Some(seconds) = duration {
        println!("  duration:  {seconds:.2}s");
    }

    match media.data().await {
        Some(data) => println!("  size:      {} bytes", data.len()),
        None => println!("  size:      unreadable"),
    }

    match media.thumbnail_url().await {
        Some(url) => println!("  thumbnail: {url}"),
        None => println!("  thumbnail: none"),
    }
}
