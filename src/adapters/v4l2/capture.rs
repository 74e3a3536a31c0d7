use anyhow::{anyhow, bail, Context, Result};
use image::{Rgb, RgbImage};
use v4l::format::FourCC;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::Device;

use crate::adapters::frames::directory::encode_jpeg;
use crate::application::ports::{Frame, FrameSource};

const STREAM_BUFFERS: u32 = 4;

/// Parámetros pedidos al driver; el formato final puede diferir.
pub struct CaptureConfig {
    pub camera_path: String,
    pub fourcc: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Cámara V4L2 como [`FrameSource`]. MJPG se entrega sin tocar,
/// YUYV pasa a RGB y se comprime.
pub struct V4l2FrameSource {
    stream: Stream<'static>,
    pixel_format: PixelFormat,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PixelFormat {
    Mjpg,
    Yuyv,
}

fn parse_fourcc(code: &str) -> Result<FourCC> {
    let bytes: [u8; 4] = code
        .as_bytes()
        .try_into()
        .map_err(|_| anyhow!("FourCC debe tener 4 caracteres: {code:?}"))?;
    Ok(FourCC::new(&bytes))
}

fn pixel_format(fourcc: FourCC) -> Result<PixelFormat> {
    match fourcc.str().map_err(|_| anyhow!("FourCC inválido"))? {
        "MJPG" => Ok(PixelFormat::Mjpg),
        "YUYV" => Ok(PixelFormat::Yuyv),
        other => bail!("formato de cámara {other} no soportado"),
    }
}

impl V4l2FrameSource {
    pub fn open(cfg: &CaptureConfig) -> Result<Self> {
        let dev = Device::with_path(&cfg.camera_path)
            .with_context(|| format!("opening camera {}", cfg.camera_path))?;

        let mut wanted = dev.format()?;
        wanted.fourcc = parse_fourcc(&cfg.fourcc)?;
        wanted.width = cfg.width;
        wanted.height = cfg.height;
        let negotiated = dev.set_format(&wanted)?;
        let pixel_format = pixel_format(negotiated.fourcc)?;

        let mut params = dev.params()?;
        params.interval.numerator = 1;
        params.interval.denominator = cfg.fps.max(1);
        if let Err(e) = dev.set_params(&params) {
            tracing::warn!("el driver rechazó {} FPS: {}", cfg.fps, e);
        }

        // El stream toma prestado el dispositivo durante toda la sesión.
        let dev: &'static Device = Box::leak(Box::new(dev));
        let stream = Stream::with_buffers(dev, v4l::buffer::Type::VideoCapture, STREAM_BUFFERS)?;

        tracing::info!(
            "📷 {}: {}x{} {:?}",
            cfg.camera_path, negotiated.width, negotiated.height, pixel_format
        );
        Ok(Self {
            stream,
            pixel_format,
            width: negotiated.width,
            height: negotiated.height,
        })
    }
}

impl FrameSource for V4l2FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let (data, _) = self.stream.next()?;
        let jpeg = match self.pixel_format {
            PixelFormat::Mjpg => data.to_vec(),
            PixelFormat::Yuyv => encode_jpeg(&yuyv_to_rgb(data, self.width, self.height))?,
        };
        Ok(Some(Frame { jpeg, width: self.width, height: self.height }))
    }
}

/// YUYV 4:2:2, BT.601. Cada grupo `[Y0, U, Y1, V]` da dos píxeles.
fn yuyv_to_rgb(yuyv: &[u8], w: u32, h: u32) -> RgbImage {
    let mut out = RgbImage::new(w, h);
    let pixels = (w as usize) * (h as usize);

    for (pair, chunk) in yuyv.chunks_exact(4).enumerate() {
        let u = f32::from(chunk[1]) - 128.0;
        let v = f32::from(chunk[3]) - 128.0;
        for (offset, luma) in [chunk[0], chunk[2]].into_iter().enumerate() {
            let idx = pair * 2 + offset;
            if idx >= pixels {
                return out;
            }
            let y = f32::from(luma);
            let px = Rgb([
                (y + 1.402 * v).clamp(0.0, 255.0) as u8,
                (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8,
                (y + 1.772 * u).clamp(0.0, 255.0) as u8,
            ]);
            out.put_pixel(idx as u32 % w, idx as u32 / w, px);
        }
    }
    out
}
