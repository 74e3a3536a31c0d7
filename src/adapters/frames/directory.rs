use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, ImageReader, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::application::ports::{Frame, FrameSource};

const JPEG_QUALITY: u8 = 80;
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Lee una imagen del disco y la deja en JPEG. Los JPEG se suben tal cual;
/// el resto se recodifica con calidad 80.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    // Las dimensiones salen de los mismos bytes que se suben, no de otra lectura.
    if matches!(image::guess_format(&bytes), Ok(ImageFormat::Jpeg)) {
        let (width, height) = ImageReader::with_format(Cursor::new(&bytes), ImageFormat::Jpeg)
            .into_dimensions()
            .with_context(|| format!("decoding header of {}", path.display()))?;
        return Ok(Frame { jpeg: bytes, width, height });
    }

    let img = image::load_from_memory(&bytes)
        .with_context(|| format!("decoding {}", path.display()))?;
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame { jpeg: encode_jpeg(&rgb)?, width, height })
}

pub(crate) fn encode_jpeg(rgb: &RgbImage) -> Result<Vec<u8>> {
    let mut jpeg = Vec::new();
    let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY);
    enc.encode(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)?;
    Ok(jpeg)
}

/// Reproduce las imágenes de un directorio (orden alfabético) al ritmo indicado,
/// como si vinieran de una cámara.
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    next: usize,
    looped: bool,
    interval: Duration,
    last: Option<Instant>,
}

impl DirectoryFrameSource {
    pub fn open(dir: &Path, fps: u32, looped: bool) -> Result<Self> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("reading frames dir {}", dir.display()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        let interval = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(fps))
        };
        let source = Self { files, next: 0, looped, interval, last: None };
        if source.is_empty() {
            return Err(anyhow!("no jpg/png frames in {}", dir.display()));
        }
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next >= self.files.len() {
            if !self.looped {
                return Ok(None);
            }
            self.next = 0;
        }

        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }
        self.last = Some(Instant::now());

        let path = &self.files[self.next];
        self.next += 1;
        load_frame(path).map(Some)
    }
}
