use anyhow::Result;
use clap::Parser;
use clap_num::maybe_hex;
use clap_verbosity::Verbosity;
use gsv0::{Config, FileTransport, Printer, Source, UsbTransport};
use image::{imageops::FilterType, DynamicImage, GrayImage, ImageReader};
use std::{
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

#[derive(Parser)]
struct Cli {
    /// Path to the image to be printed, or `-` for stdin.
    file: PathBuf,

    /// Path to the device file. Skips USB discovery.
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// Image height limit in pixels.
    #[arg(long, default_value_t = 3000)]
    vlimit: usize,

    /// Desired image width in pixels.
    #[arg(short, long, default_value_t = 512)]
    width: u32,

    /// Don't rotate/rescale the image.
    #[arg(long)]
    noedit: bool,

    /// Luma cutoff between ink and blank paper.
    #[arg(short = 'T', long, default_value_t = 0x80, value_parser = maybe_hex::<u8>)]
    threshold: u8,

    /// Invert the printed image.
    #[arg(short, long)]
    invert: bool,

    #[command(flatten)]
    verbose: Verbosity,
}

/// A grayscale image binarized on the fly: samples at or above the
/// threshold count as blank paper.
struct ThresholdImage {
    img: GrayImage,
    cutoff: u8,
    invert: bool,
}

impl Source for ThresholdImage {
    fn width(&self) -> usize {
        self.img.width() as usize
    }

    fn height(&self) -> usize {
        self.img.height() as usize
    }

    fn pixel(&self, x: usize, y: usize) -> bool {
        (self.img.get_pixel(x as u32, y as u32).0[0] >= self.cutoff) ^ self.invert
    }
}

fn prepare(cli: &Cli, img: DynamicImage) -> GrayImage {
    let mut img = img.into_luma8();
    log::info!("image: {}x{}", img.width(), img.height());

    if cli.noedit {
        return img;
    }

    // a landscape image fits the roll better sideways
    if img.width() > img.height() && img.width() > cli.width {
        log::trace!("rotating...");
        img = DynamicImage::ImageLuma8(img).rotate90().into_luma8();
    }

    if img.width() != cli.width {
        log::trace!("resizing...");
        let height = (img.height() as f32 * cli.width as f32 / img.width() as f32) as u32;
        img = DynamicImage::ImageLuma8(img)
            .resize_exact(cli.width, height, FilterType::Lanczos3)
            .into_luma8();
    }

    img
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::builder()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    let data = if cli.file == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        data
    } else {
        std::fs::read(&cli.file)?
    };

    log::trace!("parsing...");
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;

    let img = prepare(&cli, img);
    log::info!("prepared: {}x{}", img.width(), img.height());

    let source = ThresholdImage {
        img,
        cutoff: cli.threshold,
        invert: cli.invert,
    };

    let config = Config {
        vlimit: cli.vlimit,
        ..Config::default()
    };

    let mut printer = if let Some(dev) = &cli.device {
        Printer::with_config(FileTransport::open(dev)?, config)
    } else {
        log::trace!("searching for printer...");
        Printer::with_config(UsbTransport::find()?, config)
    };

    printer.print(&source)?;
    Ok(())
}
