//! Locate the tapes in a drawing and write one SVG per tape.
//!
//! Usage: `cargo run --example tapes --features tracing -- drawing.svg [out_dir]`

use std::path::PathBuf;

use taep::{Config, PreviewStyle, RasterImage, RasterSize, Rasterizer, RenderedTape};

/// Stand-in rasterizer that records sizes without rendering.
struct SizeOnly;

impl Rasterizer for SizeOnly {
    fn rasterize(
        &self,
        _document: &taep::Document,
        size: RasterSize,
    ) -> Result<RasterImage, taep::RasterError> {
        Ok(RasterImage {
            width: size.width,
            height: size.height,
            png: Vec::new(),
        })
    }
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .map(|path| std::fs::read_to_string(&path).expect("Failed to read file"))
        .unwrap_or_else(|| {
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="50mm" viewBox="0 0 100 50">
  <circle cx="40" cy="20" r="15" fill="black"/>
  <g id="tape1" transform="rotate(10 10 10)">
    <path id="marker1" d="M 10 20 L 90 20" stroke="#cc0301" stroke-width="12"/>
  </g>
</svg>"##
                .to_string()
        });
    let out_dir = PathBuf::from(args.next().unwrap_or_else(|| "tapes-out".to_string()));

    let config = Config::default();
    let extraction = taep::extract_tapes(&input, &config)?;
    for rejection in &extraction.located.rejections {
        eprintln!("{rejection}");
    }

    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");
    for (i, (segment, tape)) in extraction
        .located
        .segments
        .iter()
        .zip(&extraction.tapes)
        .enumerate()
    {
        println!("{segment}");
        let file = out_dir.join(format!("tape_{}.svg", i + 1));
        let svg = tape.document.to_svg_string()?;
        std::fs::write(&file, svg).expect("Failed to write tape");
        println!("  -> {}", file.display());
    }

    let rendered: Vec<RenderedTape> = taep::render_tapes(&extraction, &SizeOnly, &config)?;
    for tape in &rendered {
        println!(
            "tape {}: {}x{} px",
            tape.index, tape.image.width, tape.image.height
        );
    }

    let doc = taep::Document::parse(&input)?;
    if let Some(view_box) = doc.page().view_box {
        let preview = taep::compose_preview(view_box, &rendered, PreviewStyle::Assembly);
        let file = out_dir.join("assembly.svg");
        std::fs::write(&file, preview.to_svg_string()?).expect("Failed to write preview");
        println!("assembly overview -> {}", file.display());
    }

    Ok(())
}
