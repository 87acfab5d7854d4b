use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cask_blob::{Blob, Manifest};
use cask_kv::FileByteStore;
use cask_store::{ContentStore, KvChunkStore};
use colored::Colorize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::cli::*;
use crate::config::{CaskConfig, CHUNK_DIR};

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::Put(args) => cmd_put(args, &cli.format).await,
        Command::Cat(args) => cmd_cat(args).await,
        Command::Truncate(args) => cmd_truncate(args, &cli.format).await,
        Command::Stat(args) => cmd_stat(args, &cli.format).await,
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let config = init_store(&args)?;
    println!("{} Initialized cask store in {}", "✓".green().bold(), args.dir.display().to_string().bold());
    println!("  Type: {}", config.blob_type.cyan());
    println!("  Chunk size: {} bytes, fanout {}", config.blob.chunk_size, config.blob.fanout);
    Ok(())
}

async fn cmd_put(args: PutArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (config, store) = open_store(&args.dir)?;
    let mut file = tokio::fs::File::open(&args.file)
        .await
        .with_context(|| format!("opening {}", args.file.display()))?;
    let manifest = put_reader(store, &config, &mut file).await?;

    match &args.output {
        Some(path) => {
            write_manifest(path, &manifest).await?;
            match format {
                OutputFormat::Text => println!(
                    "{} Stored {} bytes as {}",
                    "✓".green().bold(),
                    manifest.size,
                    manifest.root.short_hex().yellow()
                ),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
            }
        }
        None => println!("{}", serde_json::to_string_pretty(&manifest)?),
    }
    Ok(())
}

async fn cmd_cat(args: CatArgs) -> anyhow::Result<()> {
    let (_, store) = open_store(&args.dir)?;
    let manifest = read_manifest(&args.manifest).await?;
    let mut blob = Blob::open(store, &manifest)?;
    let mut out = tokio::io::stdout();
    copy_range(&mut blob, args.offset, args.length, &mut out).await?;
    out.flush().await?;
    Ok(())
}

async fn cmd_truncate(args: TruncateArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (_, store) = open_store(&args.dir)?;
    let manifest = read_manifest(&args.manifest).await?;
    let mut blob = Blob::open(store, &manifest)?;
    blob.truncate(args.size).await?;
    let saved = blob.save().await?;
    write_manifest(&args.manifest, &saved).await?;

    match format {
        OutputFormat::Text => println!(
            "{} Resized {} -> {} bytes ({})",
            "✓".green().bold(),
            manifest.size,
            saved.size,
            saved.root.short_hex().yellow()
        ),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&saved)?),
    }
    Ok(())
}

async fn cmd_stat(args: StatArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let manifest = read_manifest(&args.manifest).await?;
    match format {
        OutputFormat::Text => {
            println!("Type: {}", manifest.typ.cyan());
            println!("Root: {}", manifest.root.to_hex().yellow());
            println!("Size: {} bytes", manifest.size.to_string().bold());
            println!("Chunk size: {}", manifest.chunk_size);
            println!("Fanout: {}", manifest.fanout);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&manifest)?),
    }
    Ok(())
}

/// Create the store directory and its `cask.toml`.
fn init_store(args: &InitArgs) -> anyhow::Result<CaskConfig> {
    let path = CaskConfig::path(&args.dir);
    anyhow::ensure!(!path.exists(), "{} already exists", path.display());

    let mut config = CaskConfig::default();
    if let Some(typ) = &args.blob_type {
        config.blob_type = typ.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.blob.chunk_size = chunk_size;
    }
    if let Some(fanout) = args.fanout {
        config.blob.fanout = fanout;
    }
    config.validate()?;

    FileByteStore::open(args.dir.join(CHUNK_DIR))?;
    config.save(&args.dir)?;
    debug!(dir = %args.dir.display(), ?config, "initialized store");
    Ok(config)
}

fn open_store(dir: &Path) -> anyhow::Result<(CaskConfig, Arc<dyn ContentStore>)> {
    let config = CaskConfig::load(dir)?;
    let kv = FileByteStore::open(dir.join(CHUNK_DIR))?;
    Ok((config, Arc::new(KvChunkStore::new(Arc::new(kv)))))
}

/// Stream `reader` into a new blob and save it.
async fn put_reader<R>(
    store: Arc<dyn ContentStore>,
    config: &CaskConfig,
    reader: &mut R,
) -> anyhow::Result<Manifest>
where
    R: AsyncRead + Unpin,
{
    let mut blob = Blob::open(store, &Manifest::with_config(config.blob_type.clone(), &config.blob))?;
    let mut buf = vec![0u8; config.blob.chunk_size as usize];
    let mut off: i64 = 0;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        blob.io().write_at(&buf[..n], off).await?;
        off += n as i64;
    }
    let manifest = blob.save().await?;
    debug!(root = ?manifest.root, size = manifest.size, "stored blob");
    Ok(manifest)
}

/// Copy `length` bytes (default: to the end) starting at `offset` into `out`.
async fn copy_range<W>(blob: &mut Blob, offset: u64, length: Option<u64>, out: &mut W) -> anyhow::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let end = match length {
        Some(len) => offset.saturating_add(len).min(blob.size()),
        None => blob.size(),
    };
    let mut buf = vec![0u8; blob.manifest().chunk_size as usize];
    let mut off = offset;
    while off < end {
        let want = (end - off).min(buf.len() as u64) as usize;
        let pos = i64::try_from(off).context("offset out of range")?;
        let read = blob.io().read_at(&mut buf[..want], pos).await?;
        out.write_all(&buf[..read.n]).await?;
        off += read.n as u64;
        if read.eof || read.n == 0 {
            break;
        }
    }
    Ok(off.saturating_sub(offset))
}

async fn read_manifest(path: &Path) -> anyhow::Result<Manifest> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading manifest {}", path.display()))?;
    let manifest: Manifest = serde_json::from_slice(&data)
        .with_context(|| format!("parsing manifest {}", path.display()))?;
    manifest.validate()?;
    Ok(manifest)
}

async fn write_manifest(path: &Path, manifest: &Manifest) -> anyhow::Result<()> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing manifest {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cask_blob::MIN_CHUNK_SIZE;

    fn init_args(dir: &Path) -> InitArgs {
        InitArgs {
            dir: dir.to_path_buf(),
            blob_type: Some("test".into()),
            chunk_size: Some(MIN_CHUNK_SIZE),
            fanout: Some(2),
        }
    }

    fn sample() -> Vec<u8> {
        (0..3 * MIN_CHUNK_SIZE as usize + 123).map(|i| (i % 241) as u8).collect()
    }

    #[test]
    fn init_writes_config_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("store");
        let config = init_store(&init_args(&dir)).unwrap();
        assert_eq!(config.blob.fanout, 2);
        assert!(dir.join(CHUNK_DIR).is_dir());
        assert_eq!(CaskConfig::load(&dir).unwrap(), config);

        assert!(init_store(&init_args(&dir)).is_err());
    }

    #[test]
    fn init_rejects_bad_tuning() {
        let tmp = tempfile::tempdir().unwrap();
        let mut args = init_args(tmp.path());
        args.fanout = Some(1);
        assert!(init_store(&args).is_err());
        assert!(!CaskConfig::path(tmp.path()).exists());
    }

    #[test]
    fn open_store_requires_init() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(open_store(tmp.path()).is_err());
    }

    #[tokio::test]
    async fn put_then_copy_range() {
        let tmp = tempfile::tempdir().unwrap();
        init_store(&init_args(tmp.path())).unwrap();
        let (config, store) = open_store(tmp.path()).unwrap();

        let data = sample();
        let manifest = put_reader(store.clone(), &config, &mut data.as_slice()).await.unwrap();
        assert_eq!(manifest.typ, "test");
        assert_eq!(manifest.size, data.len() as u64);

        let mut blob = Blob::open(store.clone(), &manifest).unwrap();
        let mut out = Vec::new();
        assert_eq!(copy_range(&mut blob, 0, None, &mut out).await.unwrap(), data.len() as u64);
        assert_eq!(out, data);

        let mut out = Vec::new();
        copy_range(&mut blob, 4000, Some(200), &mut out).await.unwrap();
        assert_eq!(out, &data[4000..4200]);

        // ranges past the end are clipped
        let mut out = Vec::new();
        let n = copy_range(&mut blob, data.len() as u64 - 3, Some(100), &mut out).await.unwrap();
        assert_eq!(n, 3);
        let mut out = Vec::new();
        assert_eq!(copy_range(&mut blob, data.len() as u64 + 10, None, &mut out).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn identical_puts_share_root() {
        let tmp = tempfile::tempdir().unwrap();
        init_store(&init_args(tmp.path())).unwrap();
        let (config, store) = open_store(tmp.path()).unwrap();
        let data = sample();
        let a = put_reader(store.clone(), &config, &mut data.as_slice()).await.unwrap();
        let b = put_reader(store, &config, &mut data.as_slice()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn manifest_file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        init_store(&init_args(tmp.path())).unwrap();
        let (config, store) = open_store(tmp.path()).unwrap();
        let manifest = put_reader(store, &config, &mut &b"hello, world\n"[..]).await.unwrap();

        let path = tmp.path().join("m.json");
        write_manifest(&path, &manifest).await.unwrap();
        assert_eq!(read_manifest(&path).await.unwrap(), manifest);

        tokio::fs::write(&path, b"{}").await.unwrap();
        assert!(read_manifest(&path).await.is_err());
    }

    #[tokio::test]
    async fn truncate_through_store() {
        let tmp = tempfile::tempdir().unwrap();
        init_store(&init_args(tmp.path())).unwrap();
        let (config, store) = open_store(tmp.path()).unwrap();
        let data = sample();
        let manifest = put_reader(store.clone(), &config, &mut data.as_slice()).await.unwrap();

        let mut blob = Blob::open(store.clone(), &manifest).unwrap();
        blob.truncate(10).await.unwrap();
        let saved = blob.save().await.unwrap();

        let mut blob = Blob::open(store, &saved).unwrap();
        let mut out = Vec::new();
        copy_range(&mut blob, 0, None, &mut out).await.unwrap();
        assert_eq!(out, &data[..10]);
    }
}
