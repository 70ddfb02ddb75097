//! Images task
//!
//! Dev: pass-through copy. Prod: lossy JPEG recompression inside the
//! configured quality band, lossless PNG re-encode at maximum compression,
//! pass-through for everything else (GIF, SVG). Optimized results are
//! cached across runs keyed by source content hash, so an unchanged image
//! is never recompressed twice.

use super::{copy_file, write_file, Mode, TaskError};
use crate::pipeline::{TaskContext, TaskReport};
use crate::select::{dest_path, pattern_base, select};
use crate::serve::Reload;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub fn run(ctx: &TaskContext, mode: Mode) -> TaskReport {
    let task = match mode {
        Mode::Dev => "images",
        Mode::Prod => "images:prod",
    };
    let paths = ctx.config.paths.images.clone();
    let dest = ctx.abs(&paths.dest);

    if mode == Mode::Dev {
        return super::copy_category(ctx, task, &paths.src, &dest, Reload::Css);
    }

    let start = Instant::now();
    let cache = ctx.abs(&ctx.config.images.cache_dir);
    let mut outputs = Vec::new();
    let mut failures = Vec::new();
    let mut warnings = Vec::new();
    let mut seen = HashSet::new();

    for pattern in &paths.src {
        let base = ctx.root.join(pattern_base(pattern));
        for file in select(&ctx.root, std::slice::from_ref(pattern)) {
            let out = dest_path(&file, &base, &dest);
            if !seen.insert(out.clone()) {
                continue;
            }
            match optimize(&file, &out, &cache, ctx.config.images.jpeg_quality, &mut warnings) {
                Ok(()) => outputs.push(out),
                Err(err) => failures.push(format!("{}: {}", file.display(), err)),
            }
        }
    }

    let duration = start.elapsed();
    let report = if failures.is_empty() {
        TaskReport::success(task, outputs, duration)
    } else {
        TaskReport::failed(task, failures.join("; "), duration).with_outputs(outputs)
    };
    report.with_warnings(warnings)
}

/// Optimize one image into `out`, going through the content-hash cache.
/// Pass-through formats skip the cache: a verbatim copy is cheaper than
/// the cached lookup.
fn optimize(
    file: &Path,
    out: &Path,
    cache: &Path,
    jpeg_quality: u8,
    warnings: &mut Vec<String>,
) -> Result<(), TaskError> {
    let ext = extension(file);
    let bytes = std::fs::read(file)?;

    let optimized = match ext.as_deref() {
        Some("jpg") | Some("jpeg") => {
            let cached = cache_entry(cache, file, &bytes, jpeg_quality);
            if cached.is_file() {
                copy_file(&cached, out)?;
                return Ok(());
            }
            Some((cached, recompress_jpeg(&bytes, jpeg_quality)?))
        }
        Some("png") => {
            let cached = cache_entry(cache, file, &bytes, jpeg_quality);
            if cached.is_file() {
                copy_file(&cached, out)?;
                return Ok(());
            }
            Some((cached, recompress_png(&bytes)?))
        }
        // Line-art containers we do not decode stay byte-identical.
        _ => None,
    };

    match optimized {
        Some((cached, optimized)) => {
            // Recompression is not guaranteed to shrink small inputs; keep
            // the smaller of the two.
            let best = if optimized.len() < bytes.len() { &optimized } else { &bytes };
            write_file(out, best)?;
            // The output is already in place; a cache miss next run only
            // costs a recompression.
            if let Err(err) = write_file(&cached, best) {
                warnings.push(format!("cache write failed for {}: {}", file.display(), err));
            }
        }
        None => write_file(out, &bytes)?,
    }
    Ok(())
}

/// Cache path for a source file: content hash plus the encoder settings
/// that shaped the result.
fn cache_entry(cache: &Path, file: &Path, bytes: &[u8], jpeg_quality: u8) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.update([jpeg_quality]);
    let hash = hasher.finalize();
    let ext = extension(file).unwrap_or_else(|| "bin".to_string());
    cache.join(format!("{:x}.{}", hash, ext))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

/// Lossy JPEG re-encode within the quality band.
fn recompress_jpeg(bytes: &[u8], quality: u8) -> Result<Vec<u8>, TaskError> {
    let img = image::load_from_memory(bytes).map_err(|err| TaskError::Image(err.to_string()))?;
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(&img).map_err(|err| TaskError::Image(err.to_string()))?;
    Ok(out)
}

/// Lossless PNG re-encode at maximum compression.
fn recompress_png(bytes: &[u8]) -> Result<Vec<u8>, TaskError> {
    let img = image::load_from_memory(bytes).map_err(|err| TaskError::Image(err.to_string()))?;
    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(img.as_bytes(), img.width(), img.height(), img.color())
        .map_err(|err| TaskError::Image(err.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use crate::pipeline::TaskContext;
    use image::{DynamicImage, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }));
        img.save(path).unwrap();
    }

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 128])
        }));
        img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
    }

    fn ctx(root: &Path) -> TaskContext {
        TaskContext::new(default_config(), root.to_path_buf())
    }

    #[test]
    fn test_dev_images_are_copied_verbatim() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/assets/images/photo.png");
        write_png(&src, 16, 16);

        let report = run(&ctx(temp.path()), Mode::Dev);
        assert!(report.is_success());
        let out = temp.path().join("dist/assets/images/photo.png");
        assert_eq!(fs::read(&src).unwrap(), fs::read(&out).unwrap());
    }

    #[test]
    fn test_prod_output_is_valid_and_cached() {
        let temp = TempDir::new().unwrap();
        write_jpeg(&temp.path().join("src/assets/images/photo.jpg"), 64, 64);
        write_png(&temp.path().join("src/assets/images/icon.png"), 32, 32);

        let report = run(&ctx(temp.path()), Mode::Prod);
        assert!(report.is_success());
        assert_eq!(report.outputs.len(), 2);

        // Outputs decode back
        for out in &report.outputs {
            image::open(out).unwrap();
        }

        // The optimizer cache was populated, one entry per source
        let cache_entries = fs::read_dir(temp.path().join(".sitekit-cache")).unwrap().count();
        assert_eq!(cache_entries, 2);

        // A second run is served from the cache and stays byte-identical
        let first: Vec<Vec<u8>> =
            report.outputs.iter().map(|p| fs::read(p).unwrap()).collect();
        let report2 = run(&ctx(temp.path()), Mode::Prod);
        assert!(report2.is_success());
        let second: Vec<Vec<u8>> =
            report2.outputs.iter().map(|p| fs::read(p).unwrap()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_prod_passes_through_unknown_formats() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src/assets/images/art.svg");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        let report = run(&ctx(temp.path()), Mode::Prod);
        assert!(report.is_success());
        let out = temp.path().join("dist/assets/images/art.svg");
        assert_eq!(fs::read(&src).unwrap(), fs::read(&out).unwrap());
        // verbatim copies never enter the optimizer cache
        assert!(!temp.path().join(".sitekit-cache").exists());
    }

    #[test]
    fn test_cache_write_failure_is_a_warning_not_a_failure() {
        let temp = TempDir::new().unwrap();
        write_png(&temp.path().join("src/assets/images/icon.png"), 8, 8);
        // occupy the cache path with a file so the cache dir cannot exist
        fs::write(temp.path().join(".sitekit-cache"), b"in the way").unwrap();

        let report = run(&ctx(temp.path()), Mode::Prod);
        assert!(report.is_success(), "{:?}", report.status);
        assert!(!report.warnings.is_empty());
        assert!(temp.path().join("dist/assets/images/icon.png").is_file());
    }

    #[test]
    fn test_corrupt_image_fails_locally() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("src/assets/images");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("broken.png"), b"not a png").unwrap();
        write_png(&dir.join("good.png"), 8, 8);

        let report = run(&ctx(temp.path()), Mode::Prod);
        assert!(!report.is_success());
        // The good sibling still got written
        assert!(temp.path().join("dist/assets/images/good.png").is_file());
    }
}
